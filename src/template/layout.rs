use kurbo::{Point, Rect};
use rand::Rng;

use crate::template::spec::{CanvasSize, CircleLayerSpec, TemplateSpec};

/// Largest centered square that fits a `width x height` image, as
/// `(x, y, side)` of the crop origin and side length.
pub fn centered_square_crop(width: u32, height: u32) -> (u32, u32, u32) {
    let side = width.min(height);
    ((width - side) / 2, (height - side) / 2, side)
}

/// One decorative circle, in canvas pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleSpec {
    pub center: Point,
    pub radius: f64,
}

/// Draw the decorative layer's placement from `rng`: centers uniform over
/// the full canvas, radii uniform in `[min_radius, max_radius]`.
pub fn scatter_circles<R: Rng + ?Sized>(
    rng: &mut R,
    layer: &CircleLayerSpec,
    canvas: CanvasSize,
) -> Vec<CircleSpec> {
    (0..layer.count)
        .map(|_| CircleSpec {
            center: Point::new(
                rng.random_range(0.0..canvas.width as f64),
                rng.random_range(0.0..canvas.height as f64),
            ),
            radius: rng.random_range(layer.min_radius..=layer.max_radius),
        })
        .collect()
}

/// Destination region of the photo inset: horizontally centered square of
/// `photo.side`, `photo.top` below the canvas top.
pub fn photo_rect(spec: &TemplateSpec) -> Rect {
    let side = f64::from(spec.photo.side);
    let x0 = (f64::from(spec.canvas.width) - side) / 2.0;
    let y0 = f64::from(spec.photo.top);
    Rect::new(x0, y0, x0 + side, y0 + side)
}

/// White backing panel: the photo region grown by `panel_margin` on the
/// left/top/right and by `panel_apron` below (caption space).
pub fn panel_rect(spec: &TemplateSpec) -> Rect {
    let photo = photo_rect(spec);
    let m = f64::from(spec.photo.panel_margin);
    Rect::new(
        photo.x0 - m,
        photo.y0 - m,
        photo.x1 + m,
        photo.y1 + f64::from(spec.photo.panel_apron),
    )
}

/// Baseline anchor of the title line, centered below the photo.
pub fn title_anchor(spec: &TemplateSpec) -> Point {
    Point::new(
        f64::from(spec.canvas.width) / 2.0,
        photo_rect(spec).y1 + f64::from(spec.captions.title_offset),
    )
}

/// Baseline anchor of the subtitle line, centered below the title.
pub fn subtitle_anchor(spec: &TemplateSpec) -> Point {
    Point::new(
        f64::from(spec.canvas.width) / 2.0,
        photo_rect(spec).y1 + f64::from(spec.captions.subtitle_offset),
    )
}

/// Baseline anchors of the top-left and top-right corner emblems.
pub fn emblem_anchors(spec: &TemplateSpec) -> [Point; 2] {
    let y = f64::from(spec.emblems.baseline_y);
    [
        Point::new(f64::from(spec.emblems.inset_x), y),
        Point::new(
            f64::from(spec.canvas.width.saturating_sub(spec.emblems.inset_x)),
            y,
        ),
    ]
}
