use image::RgbaImage;
use kurbo::Rect;

use crate::foundation::error::{BoothError, BoothResult};
use crate::template::layout::CircleSpec;
use crate::template::spec::Rgb8;

/// Fill the whole canvas with a vertical linear gradient.
pub fn fill_vertical_gradient(img: &mut RgbaImage, top: Rgb8, bottom: Rgb8) {
    let (w, h) = img.dimensions();
    let denom = h.saturating_sub(1).max(1);
    for y in 0..h {
        let t = y as f32 / denom as f32;
        let px = image::Rgba([
            lerp_u8(top.r, bottom.r, t),
            lerp_u8(top.g, bottom.g, t),
            lerp_u8(top.b, bottom.b, t),
            255,
        ]);
        for x in 0..w {
            img.put_pixel(x, y, px);
        }
    }
}

/// Blend a filled circle onto the canvas at the given constant alpha.
pub fn fill_circle(img: &mut RgbaImage, circle: &CircleSpec, color: Rgb8, alpha: f32) {
    let (w, h) = img.dimensions();
    let r = circle.radius;
    let x_min = (circle.center.x - r).floor().max(0.0) as u32;
    let x_max = ((circle.center.x + r).ceil() as i64).clamp(0, i64::from(w)) as u32;
    let y_min = (circle.center.y - r).floor().max(0.0) as u32;
    let y_max = ((circle.center.y + r).ceil() as i64).clamp(0, i64::from(h)) as u32;

    let a = alpha_to_u8(alpha);
    let r2 = r * r;
    for y in y_min..y_max {
        for x in x_min..x_max {
            let dx = (f64::from(x) + 0.5) - circle.center.x;
            let dy = (f64::from(y) + 0.5) - circle.center.y;
            if dx * dx + dy * dy <= r2 {
                blend_px(img.get_pixel_mut(x, y), color, a);
            }
        }
    }
}

/// Fill an axis-aligned rectangle, clipped to the canvas.
pub fn fill_rect(img: &mut RgbaImage, rect: Rect, color: Rgb8) {
    let (x0, y0, x1, y1) = clip_rect(img, rect);
    for y in y0..y1 {
        for x in x0..x1 {
            *img.get_pixel_mut(x, y) = image::Rgba([color.r, color.g, color.b, 255]);
        }
    }
}

/// Soft drop shadow: a blurred black rectangle blended under the panel.
///
/// The rectangle is offset vertically, rasterized into a coverage mask and
/// blurred with a separable gaussian whose sigma is half the radius (canvas
/// `shadowBlur` convention).
pub fn shadow_rect(img: &mut RgbaImage, rect: Rect, radius: u32, offset_y: u32, alpha: f32) {
    let (w, h) = img.dimensions();
    let shifted = Rect::new(
        rect.x0,
        rect.y0 + f64::from(offset_y),
        rect.x1,
        rect.y1 + f64::from(offset_y),
    );

    let mut mask = vec![0u8; (w as usize) * (h as usize)];
    let (x0, y0, x1, y1) = clip_rect(img, shifted);
    for y in y0..y1 {
        let row = (y as usize) * (w as usize);
        mask[row + x0 as usize..row + x1 as usize].fill(255);
    }

    if radius > 0 {
        let sigma = (radius as f32) / 2.0;
        mask = blur_mask(&mask, w, h, radius, sigma);
    }

    let black = Rgb8::new(0, 0, 0);
    let shadow_a = alpha.clamp(0.0, 1.0);
    for y in 0..h {
        for x in 0..w {
            let coverage = mask[(y as usize) * (w as usize) + x as usize];
            if coverage == 0 {
                continue;
            }
            let a = alpha_to_u8(shadow_a * (f32::from(coverage) / 255.0));
            blend_px(img.get_pixel_mut(x, y), black, a);
        }
    }
}

/// Composite a premultiplied RGBA8 overlay (e.g. a rasterized SVG layer)
/// over the opaque canvas.
pub fn composite_premul_over(img: &mut RgbaImage, src_premul: &[u8]) -> BoothResult<()> {
    let (w, h) = img.dimensions();
    let expected = (w as usize) * (h as usize) * 4;
    if src_premul.len() != expected {
        return Err(BoothError::compose(
            "overlay buffer must match canvas width*height*4",
        ));
    }

    for (dst, src) in img.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let sa = u16::from(src[3]);
        if sa == 0 {
            continue;
        }
        let inv = 255 - sa;
        for i in 0..3 {
            dst[i] = u16::from(src[i])
                .saturating_add(mul_div255(u16::from(dst[i]), inv))
                .min(255) as u8;
        }
        // Canvas stays opaque.
        dst[3] = 255;
    }
    Ok(())
}

/// Single-channel separable gaussian blur for shadow masks.
fn blur_mask(src: &[u8], width: u32, height: u32, radius: u32, sigma: f32) -> Vec<u8> {
    let kernel = gaussian_kernel_q16(radius, sigma);
    let mut tmp = vec![0u8; src.len()];
    let mut out = vec![0u8; src.len()];

    let w = width as i32;
    let h = height as i32;
    let r = (kernel.len() / 2) as i32;

    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u64;
            for (i, &k) in kernel.iter().enumerate() {
                let sx = (x + i as i32 - r).clamp(0, w - 1);
                acc += u64::from(src[(y * w + sx) as usize]) * u64::from(k);
            }
            tmp[(y * w + x) as usize] = (acc >> 16).min(255) as u8;
        }
    }
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0u64;
            for (i, &k) in kernel.iter().enumerate() {
                let sy = (y + i as i32 - r).clamp(0, h - 1);
                acc += u64::from(tmp[(sy * w + x) as usize]) * u64::from(k);
            }
            out[(y * w + x) as usize] = (acc >> 16).min(255) as u8;
        }
    }
    out
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> Vec<u32> {
    let r = radius as i32;
    let sigma = f64::from(sigma.max(1e-3));
    let denom = 2.0 * sigma * sigma;

    let mut weights_f = Vec::with_capacity((2 * r + 1) as usize);
    let mut sum = 0.0f64;
    for i in -r..=r {
        let x = f64::from(i);
        let wf = (-x * x / denom).exp();
        weights_f.push(wf);
        sum += wf;
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| (((wf / sum) * 65536.0).round() as i64).clamp(0, 65536) as u32)
        .collect();

    // Push rounding error into the center tap so the kernel sums to 1.0.
    let acc: i64 = weights.iter().map(|&q| i64::from(q)).sum();
    let mid = weights.len() / 2;
    weights[mid] = (i64::from(weights[mid]) + (65536 - acc)).clamp(0, 65536) as u32;
    weights
}

fn blend_px(dst: &mut image::Rgba<u8>, color: Rgb8, a: u8) {
    if a == 0 {
        return;
    }
    let a = u16::from(a);
    let inv = 255 - a;
    dst.0[0] = (mul_div255(u16::from(color.r), a) + mul_div255(u16::from(dst.0[0]), inv)).min(255) as u8;
    dst.0[1] = (mul_div255(u16::from(color.g), a) + mul_div255(u16::from(dst.0[1]), inv)).min(255) as u8;
    dst.0[2] = (mul_div255(u16::from(color.b), a) + mul_div255(u16::from(dst.0[2]), inv)).min(255) as u8;
    dst.0[3] = 255;
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a = f32::from(a);
    let b = f32::from(b);
    (a + (b - a) * t).round().clamp(0.0, 255.0) as u8
}

fn mul_div255(x: u16, y: u16) -> u16 {
    ((u32::from(x) * u32::from(y) + 127) / 255) as u16
}

fn alpha_to_u8(alpha: f32) -> u8 {
    ((alpha.clamp(0.0, 1.0) * 255.0).round() as i32).clamp(0, 255) as u8
}

fn clip_rect(img: &RgbaImage, rect: Rect) -> (u32, u32, u32, u32) {
    let (w, h) = img.dimensions();
    let x0 = rect.x0.floor().max(0.0) as u32;
    let y0 = rect.y0.floor().max(0.0) as u32;
    let x1 = (rect.x1.ceil() as i64).clamp(0, i64::from(w)) as u32;
    let y1 = (rect.y1.ceil() as i64).clamp(0, i64::from(h)) as u32;
    (x0.min(x1), y0.min(y1), x1, y1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn gradient_hits_both_end_colors() {
        let mut img = RgbaImage::new(4, 8);
        let top = Rgb8::new(245, 158, 11);
        let bottom = Rgb8::new(239, 68, 68);
        fill_vertical_gradient(&mut img, top, bottom);

        assert_eq!(img.get_pixel(0, 0).0, [245, 158, 11, 255]);
        assert_eq!(img.get_pixel(3, 7).0, [239, 68, 68, 255]);
        // Monotone in the green channel.
        assert!(img.get_pixel(0, 3).0[1] <= img.get_pixel(0, 0).0[1]);
    }

    #[test]
    fn circle_blends_at_its_alpha_and_clips() {
        let mut img = RgbaImage::new(10, 10);
        fill_rect(&mut img, Rect::new(0.0, 0.0, 10.0, 10.0), Rgb8::new(0, 0, 0));
        // Center overlapping the edge must not panic.
        let circle = CircleSpec {
            center: Point::new(0.0, 5.0),
            radius: 3.0,
        };
        fill_circle(&mut img, &circle, Rgb8::new(255, 255, 255), 0.1);

        // 10% white over black.
        let inside = img.get_pixel(0, 5).0;
        assert_eq!(inside[0], 26);
        // Far corner untouched.
        assert_eq!(img.get_pixel(9, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn shadow_is_darkest_under_the_rect_and_soft_outside() {
        let mut img = RgbaImage::new(40, 40);
        fill_rect(
            &mut img,
            Rect::new(0.0, 0.0, 40.0, 40.0),
            Rgb8::new(200, 200, 200),
        );
        shadow_rect(&mut img, Rect::new(10.0, 10.0, 30.0, 30.0), 4, 2, 0.3);

        let center = img.get_pixel(20, 22).0[0];
        let fringe = img.get_pixel(8, 22).0[0];
        let far = img.get_pixel(0, 0).0[0];
        assert!(center < fringe, "center {center} fringe {fringe}");
        assert!(fringe <= far, "fringe {fringe} far {far}");
        assert_eq!(far, 200);
    }

    #[test]
    fn overlay_length_is_validated() {
        let mut img = RgbaImage::new(2, 2);
        assert!(composite_premul_over(&mut img, &[0u8; 15]).is_err());
        assert!(composite_premul_over(&mut img, &[0u8; 16]).is_ok());
    }

    #[test]
    fn opaque_overlay_pixel_replaces_destination() {
        let mut img = RgbaImage::new(1, 1);
        fill_rect(&mut img, Rect::new(0.0, 0.0, 1.0, 1.0), Rgb8::new(10, 20, 30));
        composite_premul_over(&mut img, &[200, 100, 50, 255]).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [200, 100, 50, 255]);
    }

    #[test]
    fn gaussian_kernel_sums_to_one() {
        let k = gaussian_kernel_q16(5, 2.5);
        assert_eq!(k.len(), 11);
        assert_eq!(k.iter().map(|&q| u64::from(q)).sum::<u64>(), 65536);
    }
}
