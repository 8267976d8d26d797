use image::{ImageEncoder, RgbaImage};
use rand::Rng;

use crate::foundation::core::ImagePayload;
use crate::foundation::error::{BoothError, BoothResult};
use crate::template::layout::{centered_square_crop, panel_rect, photo_rect, scatter_circles};
use crate::template::overlay::render_overlay;
use crate::template::raster::{
    composite_premul_over, fill_circle, fill_rect, fill_vertical_gradient, shadow_rect,
};
use crate::template::spec::{Rgb8, TemplateSpec};

/// Composites a captured photo onto the branded template.
///
/// Stateless per invocation apart from the caller-provided RNG feeding the
/// decorative layer; the output is always exactly the spec's canvas size
/// regardless of input dimensions.
#[derive(Clone, Debug)]
pub struct TemplateCompositor {
    spec: TemplateSpec,
}

impl TemplateCompositor {
    /// Build a compositor over a validated spec.
    pub fn new(spec: TemplateSpec) -> BoothResult<Self> {
        spec.validate()?;
        Ok(Self { spec })
    }

    pub fn spec(&self) -> &TemplateSpec {
        &self.spec
    }

    /// Run the full pipeline: gradient, decorative circles, panel with drop
    /// shadow, square-cropped photo inset, caption/emblem overlay, JPEG
    /// encode.
    ///
    /// Pass a seeded RNG for reproducible output; production callers use
    /// [`TemplateCompositor::render_with_entropy`] for a fresh source per
    /// call.
    #[tracing::instrument(skip_all)]
    pub fn render<R: Rng + ?Sized>(
        &self,
        input: &ImagePayload,
        rng: &mut R,
    ) -> BoothResult<ImagePayload> {
        let spec = &self.spec;
        let source = input.decode()?;

        let mut canvas = RgbaImage::new(spec.canvas.width, spec.canvas.height);
        fill_vertical_gradient(&mut canvas, spec.background.top, spec.background.bottom);

        for circle in scatter_circles(rng, &spec.circles, spec.canvas) {
            fill_circle(&mut canvas, &circle, spec.circles.color, spec.circles.alpha);
        }

        let panel = panel_rect(spec);
        shadow_rect(
            &mut canvas,
            panel,
            spec.photo.shadow_radius,
            spec.photo.shadow_offset_y,
            spec.photo.shadow_alpha,
        );
        fill_rect(&mut canvas, panel, Rgb8::new(255, 255, 255));

        let (cx, cy, side) = centered_square_crop(source.width(), source.height());
        let cropped = image::imageops::crop_imm(&source, cx, cy, side, side).to_image();
        let scaled = image::imageops::resize(
            &cropped,
            spec.photo.side,
            spec.photo.side,
            image::imageops::FilterType::Triangle,
        );
        let photo = photo_rect(spec);
        image::imageops::replace(&mut canvas, &scaled, photo.x0 as i64, photo.y0 as i64);

        let overlay = render_overlay(spec)?;
        composite_premul_over(&mut canvas, &overlay)?;

        self.encode_jpeg(&canvas)
    }

    /// Render with a fresh OS-seeded random source.
    pub fn render_with_entropy(&self, input: &ImagePayload) -> BoothResult<ImagePayload> {
        self.render(input, &mut rand::rng())
    }

    fn encode_jpeg(&self, canvas: &RgbaImage) -> BoothResult<ImagePayload> {
        let rgb = image::DynamicImage::ImageRgba8(canvas.clone()).to_rgb8();
        let mut buf = Vec::new();
        {
            let mut cursor = std::io::Cursor::new(&mut buf);
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut cursor,
                self.spec.jpeg_quality,
            );
            encoder
                .write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| BoothError::compose(format!("encode final jpeg: {e}")))?;
        }
        Ok(ImagePayload::from_bytes(buf))
    }
}

impl Default for TemplateCompositor {
    fn default() -> Self {
        Self {
            spec: TemplateSpec::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Frame;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn payload(width: u32, height: u32, px: impl Fn(u32, u32) -> [u8; 4]) -> ImagePayload {
        let mut rgba8 = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                rgba8.extend_from_slice(&px(x, y));
            }
        }
        ImagePayload::encode_png(Frame::new(width, height, rgba8).unwrap()).unwrap()
    }

    fn quick_compositor() -> TemplateCompositor {
        // Small shadow keeps the blur pass cheap in debug test runs; output
        // dimensions and crop behavior are unaffected.
        let mut spec = TemplateSpec::default();
        spec.photo.shadow_radius = 2;
        TemplateCompositor::new(spec).unwrap()
    }

    #[test]
    fn output_is_canvas_sized_for_any_input_aspect() {
        let compositor = quick_compositor();
        let mut rng = StdRng::seed_from_u64(1);
        for (w, h) in [(200, 100), (100, 300), (64, 64)] {
            let input = payload(w, h, |_, _| [90, 120, 200, 255]);
            let out = compositor.render(&input, &mut rng).unwrap();
            assert_eq!(out.dimensions().unwrap(), (1080, 1350));
        }
    }

    #[test]
    fn default_branding_renders_at_full_size() {
        let compositor = TemplateCompositor::default();
        let input = payload(32, 32, |_, _| [200, 50, 50, 255]);
        let out = compositor.render(&input, &mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(out.dimensions().unwrap(), (1080, 1350));
    }

    #[test]
    fn photo_inset_uses_the_centered_square_crop() {
        // 40x20 input, left half red, right half blue: the centered 20x20
        // crop spans x 10..30, so the inset is half red, half blue.
        let input = payload(40, 20, |x, _| {
            if x < 20 {
                [255, 0, 0, 255]
            } else {
                [0, 0, 255, 255]
            }
        });
        let compositor = quick_compositor();
        let out = compositor
            .render(&input, &mut StdRng::seed_from_u64(3))
            .unwrap();
        let img = out.decode().unwrap();

        // Sample well inside each half of the 900 px inset at (90,150).
        let left = img.get_pixel(90 + 200, 150 + 450).0;
        let right = img.get_pixel(90 + 700, 150 + 450).0;
        assert!(left[0] > 180 && left[2] < 80, "left sample {left:?}");
        assert!(right[2] > 180 && right[0] < 80, "right sample {right:?}");
    }

    #[test]
    fn same_seed_reproduces_output_exactly() {
        let compositor = quick_compositor();
        let input = payload(48, 48, |x, y| [(x * 5) as u8, (y * 5) as u8, 7, 255]);
        let a = compositor
            .render(&input, &mut StdRng::seed_from_u64(9))
            .unwrap();
        let b = compositor
            .render(&input, &mut StdRng::seed_from_u64(9))
            .unwrap();
        let c = compositor
            .render(&input, &mut StdRng::seed_from_u64(10))
            .unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(a.as_bytes(), c.as_bytes());
    }

    #[test]
    fn undecodable_input_is_a_compose_error() {
        let compositor = quick_compositor();
        let err = compositor
            .render(
                &ImagePayload::from_bytes(vec![0xDE, 0xAD, 0xBE, 0xEF]),
                &mut StdRng::seed_from_u64(0),
            )
            .unwrap_err();
        assert!(matches!(err, BoothError::Compose(_)));
    }

    #[test]
    fn rejects_invalid_spec() {
        let mut spec = TemplateSpec::default();
        spec.canvas.width = 0;
        assert!(TemplateCompositor::new(spec).is_err());
    }
}
