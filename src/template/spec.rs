use serde::{Deserialize, Serialize};

use crate::foundation::error::{BoothError, BoothResult};

/// Straight-alpha RGB color, serialized as `#RRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `#RRGGBB` form, as used in serialized specs and SVG attributes.
    pub fn css(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.css())
    }
}

impl<'de> Deserialize<'de> for Rgb8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

fn parse_hex(s: &str) -> Result<Rgb8, String> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    if s.len() != 6 {
        return Err("color must be #RRGGBB (case-insensitive)".to_owned());
    }

    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }

    Ok(Rgb8 {
        r: hex_byte(&s[0..2])?,
        g: hex_byte(&s[2..4])?,
        b: hex_byte(&s[4..6])?,
    })
}

/// Output canvas dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

/// Vertical background gradient, top color to bottom color.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GradientSpec {
    pub top: Rgb8,
    pub bottom: Rgb8,
}

/// The randomized decorative circle layer.
///
/// Count and alpha are the layer's contract; placement and radius come from
/// the per-call RNG.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircleLayerSpec {
    pub count: u32,
    pub min_radius: f64,
    pub max_radius: f64,
    pub color: Rgb8,
    pub alpha: f32,
}

/// Photo inset placement and its white backing panel.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhotoSpec {
    /// Side of the square destination region.
    pub side: u32,
    /// Vertical offset of the photo from the canvas top.
    pub top: u32,
    /// Panel margin beyond the photo on the left/top/right edges.
    pub panel_margin: u32,
    /// Panel apron below the photo (caption space).
    pub panel_apron: u32,
    pub shadow_radius: u32,
    pub shadow_offset_y: u32,
    pub shadow_alpha: f32,
}

/// The two caption lines below the photo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaptionSpec {
    pub title: String,
    pub title_size: f32,
    pub title_color: Rgb8,
    /// Title baseline offset below the photo's bottom edge.
    pub title_offset: u32,
    pub subtitle: String,
    pub subtitle_size: f32,
    pub subtitle_color: Rgb8,
    /// Subtitle baseline offset below the photo's bottom edge.
    pub subtitle_offset: u32,
}

/// Decorative glyphs near the top corners.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmblemSpec {
    pub glyph: String,
    pub size: f32,
    /// Horizontal inset of each glyph's anchor from its corner.
    pub inset_x: u32,
    /// Baseline y of both glyphs.
    pub baseline_y: u32,
}

/// Full template description: branding is data, the pipeline is code.
///
/// Deserializable from JSON so a booth can be re-themed without a rebuild;
/// every field defaults to the shipped taco branding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSpec {
    pub canvas: CanvasSize,
    pub background: GradientSpec,
    pub circles: CircleLayerSpec,
    pub photo: PhotoSpec,
    pub captions: CaptionSpec,
    pub emblems: EmblemSpec,
    /// JPEG output quality in `[1, 100]`.
    pub jpeg_quality: u8,
}

impl Default for TemplateSpec {
    fn default() -> Self {
        Self {
            canvas: CanvasSize {
                width: 1080,
                height: 1350,
            },
            background: GradientSpec {
                top: Rgb8::new(0xF5, 0x9E, 0x0B),
                bottom: Rgb8::new(0xEF, 0x44, 0x44),
            },
            circles: CircleLayerSpec {
                count: 20,
                min_radius: 20.0,
                max_radius: 70.0,
                color: Rgb8::new(0xFF, 0xFF, 0xFF),
                alpha: 0.1,
            },
            photo: PhotoSpec {
                side: 900,
                top: 150,
                panel_margin: 20,
                panel_apron: 160,
                shadow_radius: 20,
                shadow_offset_y: 10,
                shadow_alpha: 0.3,
            },
            captions: CaptionSpec {
                title: "TACO TUESDAY".to_owned(),
                title_size: 60.0,
                title_color: Rgb8::new(0x1F, 0x29, 0x37),
                title_offset: 80,
                subtitle: "#TacoLife".to_owned(),
                subtitle_size: 30.0,
                subtitle_color: Rgb8::new(0xEF, 0x44, 0x44),
                subtitle_offset: 130,
            },
            emblems: EmblemSpec {
                glyph: "\u{1F32E}".to_owned(),
                size: 100.0,
                inset_x: 150,
                baseline_y: 140,
            },
            jpeg_quality: 90,
        }
    }
}

impl TemplateSpec {
    pub fn validate(&self) -> BoothResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(BoothError::validation("canvas width/height must be > 0"));
        }
        if self.photo.side == 0 || self.photo.side > self.canvas.width {
            return Err(BoothError::validation(
                "photo side must be > 0 and fit the canvas width",
            ));
        }
        if self.circles.min_radius <= 0.0 || self.circles.min_radius > self.circles.max_radius {
            return Err(BoothError::validation(
                "circle radii must satisfy 0 < min <= max",
            ));
        }
        if !(0.0..=1.0).contains(&self.circles.alpha)
            || !(0.0..=1.0).contains(&self.photo.shadow_alpha)
        {
            return Err(BoothError::validation("alpha values must be in [0, 1]"));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(BoothError::validation("jpeg_quality must be in [1, 100]"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_spec_validates_and_matches_branding() {
        let spec = TemplateSpec::default();
        spec.validate().unwrap();
        assert_eq!(spec.canvas.width, 1080);
        assert_eq!(spec.canvas.height, 1350);
        assert_eq!(spec.circles.count, 20);
        assert_eq!(spec.captions.title, "TACO TUESDAY");
    }

    #[test]
    fn json_roundtrip_and_partial_override() {
        let spec = TemplateSpec::default();
        let s = serde_json::to_string(&spec).unwrap();
        let de: TemplateSpec = serde_json::from_str(&s).unwrap();
        assert_eq!(de, spec);

        // Partial documents fall back to the defaults field by field.
        let de: TemplateSpec =
            serde_json::from_str(r##"{"captions": {
                "title": "MOVIE NIGHT", "title_size": 60.0,
                "title_color": "#111111", "title_offset": 80,
                "subtitle": "#reel", "subtitle_size": 30.0,
                "subtitle_color": "#EF4444", "subtitle_offset": 130
            }}"##)
            .unwrap();
        assert_eq!(de.captions.title, "MOVIE NIGHT");
        assert_eq!(de.canvas.width, 1080);
    }

    #[test]
    fn parses_hex_colors_case_insensitively() {
        let c: Rgb8 = serde_json::from_str("\"#f59e0b\"").unwrap();
        assert_eq!(c, Rgb8::new(0xF5, 0x9E, 0x0B));
        assert!(serde_json::from_str::<Rgb8>("\"#12345\"").is_err());
        assert!(serde_json::from_str::<Rgb8>("\"#zzzzzz\"").is_err());
    }

    #[test]
    fn validate_rejects_bad_specs() {
        let mut spec = TemplateSpec::default();
        spec.jpeg_quality = 0;
        assert!(spec.validate().is_err());

        let mut spec = TemplateSpec::default();
        spec.photo.side = 2000;
        assert!(spec.validate().is_err());

        let mut spec = TemplateSpec::default();
        spec.circles.min_radius = 80.0;
        assert!(spec.validate().is_err());
    }
}
