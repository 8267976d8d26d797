use crate::foundation::error::{BoothError, BoothResult};
use crate::template::layout::{emblem_anchors, subtitle_anchor, title_anchor};
use crate::template::spec::TemplateSpec;

/// Build the caption/emblem layer as an SVG document.
///
/// Text goes through the SVG pipeline (system-font resolution, shaping)
/// instead of a hand-rolled glyph rasterizer; the document is transparent
/// everywhere except the glyphs, so it composites straight over the canvas.
pub fn caption_svg(spec: &TemplateSpec) -> String {
    let w = spec.canvas.width;
    let h = spec.canvas.height;
    let cap = &spec.captions;

    let title_at = title_anchor(spec);
    let subtitle_at = subtitle_anchor(spec);
    let [left, right] = emblem_anchors(spec);

    let title = xml_escape(&cap.title);
    let subtitle = xml_escape(&cap.subtitle);
    let glyph = xml_escape(&spec.emblems.glyph);
    let em = &spec.emblems;

    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            "\n",
            r#"  <text x="{tx}" y="{ty}" font-family="sans-serif" font-weight="bold" font-size="{ts}" fill="{tc}" text-anchor="middle">{title}</text>"#,
            "\n",
            r#"  <text x="{sx}" y="{sy}" font-family="sans-serif" font-style="italic" font-size="{ss}" fill="{sc}" text-anchor="middle">{subtitle}</text>"#,
            "\n",
            r#"  <text x="{elx}" y="{ey}" font-family="serif" font-size="{es}" text-anchor="middle">{glyph}</text>"#,
            "\n",
            r#"  <text x="{erx}" y="{ey}" font-family="serif" font-size="{es}" text-anchor="middle">{glyph}</text>"#,
            "\n</svg>\n",
        ),
        w = w,
        h = h,
        tx = title_at.x,
        ty = title_at.y,
        ts = cap.title_size,
        tc = cap.title_color.css(),
        title = title,
        sx = subtitle_at.x,
        sy = subtitle_at.y,
        ss = cap.subtitle_size,
        sc = cap.subtitle_color.css(),
        subtitle = subtitle,
        elx = left.x,
        erx = right.x,
        ey = left.y,
        es = em.size,
        glyph = glyph,
    )
}

/// Rasterize the caption/emblem layer to a canvas-sized premultiplied RGBA8
/// buffer.
pub fn render_overlay(spec: &TemplateSpec) -> BoothResult<Vec<u8>> {
    let svg = caption_svg(spec);

    let mut opts = usvg::Options::default();
    opts.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_data(svg.as_bytes(), &opts)
        .map_err(|e| BoothError::compose(format!("parse overlay svg: {e}")))?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(spec.canvas.width, spec.canvas.height)
        .ok_or_else(|| BoothError::compose("failed to allocate overlay pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );
    Ok(pixmap.take())
}

fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
