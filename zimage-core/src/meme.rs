//! # Memes
//!
//! Outlined caption text over an image. Each [`TextBlock`] is laid out as a unit, then placed at the
//! top, at the bottom, or at fixed coordinates. Placement always accounts for the outline, so a
//! bottom caption never spills off the canvas.

use std::path::{Path, PathBuf};

use crate::{
    buffer::PixelBuffer,
    color::Color,
    raster::{self, Coverage},
    text::{self, FontDescriptor, HorizontalAlign},
    util::{Point, Rect},
};

/// Fraction of the canvas height kept clear above top and below bottom captions.
pub const MARGIN_FRACTION: f64 = 0.05;

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextPosition {
    #[default]
    Top,
    Bottom,
    /// Top-left of the block, outline included, in canvas pixels.
    Custom { x: i32, y: i32 },
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TextBlock {
    /// May contain `'\n'` for multiple lines.
    pub text: String,
    pub position: TextPosition,
    pub font: FontDescriptor,
    pub size: u32,
    pub fill: Color,
    pub outline: Color,
    pub outline_width: u32,
    pub align: HorizontalAlign,
    /// Painted behind the whole block.
    pub background: Option<Color>,
}
impl Default for TextBlock {
    fn default() -> Self {
        Self {
            text: String::new(),
            position: TextPosition::Top,
            font: FontDescriptor::family("Impact"),
            size: 36,
            fill: Color::WHITE,
            outline: Color::BLACK,
            outline_width: 2,
            align: HorizontalAlign::Center,
            background: None,
        }
    }
}
impl TextBlock {
    #[must_use]
    pub fn new(text: impl Into<String>, position: TextPosition) -> Self {
        Self {
            text: text.into(),
            position,
            ..Self::default()
        }
    }
}

/// The classic layout: upper-case captions at the top and bottom.
#[must_use]
pub fn classic(top: &str, bottom: &str) -> Vec<TextBlock> {
    vec![
        TextBlock::new(top.to_uppercase(), TextPosition::Top),
        TextBlock::new(bottom.to_uppercase(), TextPosition::Bottom),
    ]
}

#[derive(Clone, Debug)]
pub struct MemeSpec {
    pub source: PixelBuffer,
    /// Drawn in order, later blocks over earlier ones.
    pub blocks: Vec<TextBlock>,
}

/// Masks of a laid out block, relative to the block's own origin.
struct RenderedBlock {
    fill: Coverage,
    outline: Option<Coverage>,
    /// Everything the block may paint.
    extent: Rect,
}
impl RenderedBlock {
    fn render(block: &TextBlock, canvas: (u32, u32)) -> Self {
        let fill = text::layout(&block.text, &block.font, block.size, block.align).coverage;
        // Any wider and the outline alone covers the canvas from any visible glyph.
        let outline_width = block.outline_width.min(canvas.0.max(canvas.1));
        let outline = (outline_width > 0 && block.outline.a() > 0)
            .then(|| fill.dilate(outline_width));
        let extent = outline.as_ref().map_or(fill.rect(), Coverage::rect);
        Self {
            fill,
            outline,
            extent,
        }
    }
    fn translate(&mut self, dx: i32, dy: i32) {
        self.fill.translate(dx, dy);
        if let Some(outline) = &mut self.outline {
            outline.translate(dx, dy);
        }
        self.extent = self.extent.translate(dx, dy);
    }
}

/// Clear space above top captions and below bottom captions.
#[must_use]
pub fn margin(canvas_height: u32) -> u32 {
    (f64::from(canvas_height) * MARGIN_FRACTION).round() as u32
}

/// Top-left corner for a block of `size` on a canvas of `canvas` size.
#[must_use]
pub fn place(position: TextPosition, (width, height): (u32, u32), canvas: (u32, u32)) -> Point {
    let (canvas_w, canvas_h) = (i64::from(canvas.0), i64::from(canvas.1));
    let margin = i64::from(margin(canvas.1));
    // Centered, rounding left. Wider blocks overhang equally on both sides.
    let centered_x = (canvas_w - i64::from(width)).div_euclid(2);
    let (x, y) = match position {
        TextPosition::Top => (centered_x, margin),
        TextPosition::Bottom => (centered_x, canvas_h - margin - i64::from(height)),
        TextPosition::Custom { x, y } => (i64::from(x), i64::from(y)),
    };
    Point::new(az::saturating_cast(x), az::saturating_cast(y))
}

/// Draw every block of `spec` onto a copy of its source.
#[must_use]
pub fn compose(spec: &MemeSpec) -> PixelBuffer {
    let mut out = spec.source.clone_full();
    let canvas = (out.width(), out.height());
    for block in &spec.blocks {
        let mut rendered = RenderedBlock::render(block, canvas);
        let target = place(
            block.position,
            (rendered.extent.width, rendered.extent.height),
            canvas,
        );
        rendered.translate(
            target.x.saturating_sub(rendered.extent.x),
            target.y.saturating_sub(rendered.extent.y),
        );
        log::debug!("meme block {:?} at {:?}", block.text, rendered.extent);
        if let Some(background) = block.background {
            let mut area = Coverage::new(rendered.extent);
            raster::fill_rect(&mut area, rendered.extent);
            out.composite_coverage(&area, background);
        }
        if let Some(outline) = &rendered.outline {
            out.composite_coverage(outline, block.outline);
        }
        out.composite_coverage(&rendered.fill, block.fill);
    }
    out
}

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A reusable meme: the image it was made for and its text blocks.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemeTemplate {
    pub image_path: PathBuf,
    pub template_name: String,
    #[serde(default)]
    pub template_category: String,
    #[serde(rename = "text_boxes")]
    pub blocks: Vec<TextBlock>,
}
impl MemeTemplate {
    /// A template with the classic placeholder captions.
    #[must_use]
    pub fn classic(image_path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            image_path: image_path.into(),
            template_name: name.into(),
            template_category: "Classic".into(),
            blocks: classic("Top text", "Bottom text"),
        }
    }
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TemplateError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod test {
    use super::{compose, margin, place, MemeSpec, MemeTemplate, TemplateError, TextBlock, TextPosition};
    use crate::{
        buffer::{ChannelFormat, PixelBuffer},
        color::Color,
        text::FontDescriptor,
        util::Point,
    };
    const BG: Color = Color::rgb(10, 200, 30);
    fn canvas(width: u32, height: u32) -> PixelBuffer {
        PixelBuffer::create(width, height, ChannelFormat::Rgb, BG).unwrap()
    }
    fn builtin(text: &str, position: TextPosition, size: u32) -> TextBlock {
        TextBlock {
            font: FontDescriptor::Builtin,
            size,
            ..TextBlock::new(text, position)
        }
    }
    /// Rows in `range` that contain any changed pixel.
    fn touched_rows(out: &PixelBuffer, range: std::ops::Range<u32>) -> Vec<u32> {
        range
            .filter(|&y| (0..out.width()).any(|x| out.get(x.into(), y.into()) != Ok(BG)))
            .collect()
    }
    #[test]
    fn margin_rounds() {
        assert_eq!(margin(100), 5);
        assert_eq!(margin(30), 2);
        assert_eq!(margin(10), 1);
    }
    #[test]
    fn placement() {
        assert_eq!(place(TextPosition::Top, (40, 10), (100, 200)), Point::new(30, 10));
        assert_eq!(
            place(TextPosition::Bottom, (41, 10), (100, 200)),
            Point::new(29, 180)
        );
        assert_eq!(
            place(TextPosition::Custom { x: -3, y: 7 }, (1, 1), (10, 10)),
            Point::new(-3, 7)
        );
    }
    #[test]
    fn bottom_never_below_canvas() {
        let height = 64;
        for size in (4..=height).step_by(6) {
            let spec = MemeSpec {
                source: canvas(200, height),
                blocks: vec![builtin("Wg|", TextPosition::Bottom, size)],
            };
            let out = compose(&spec);
            let keep_clear = height - margin(height);
            assert!(
                touched_rows(&out, keep_clear..height).is_empty(),
                "size {size} drew into the bottom margin"
            );
            assert!(!touched_rows(&out, 0..keep_clear).is_empty());
        }
    }
    #[test]
    fn outline_bottom_never_below_canvas() {
        let font = FontDescriptor::family("sans-serif");
        if crate::repositories::fonts::faces().load(&font).is_err() {
            return;
        }
        let height = 64;
        let keep_clear = height - margin(height);
        for size in 1..=height {
            let spec = MemeSpec {
                source: canvas(200, height),
                blocks: vec![TextBlock {
                    font: font.clone(),
                    size,
                    ..TextBlock::new("WGJQ|gjpqy", TextPosition::Bottom)
                }],
            };
            let out = compose(&spec);
            assert!(
                touched_rows(&out, keep_clear..height).is_empty(),
                "size {size} drew into the bottom margin"
            );
        }
    }
    #[test]
    fn outline_under_fill() {
        let spec = MemeSpec {
            source: canvas(60, 40),
            blocks: vec![TextBlock {
                outline_width: 1,
                ..builtin("I", TextPosition::Custom { x: 0, y: 0 }, 8)
            }],
        };
        let out = compose(&spec);
        // Outline grows the block by one on each side: the stem of 'I' lands at column 2 + 1.
        assert_eq!(out.get(3, 2), Ok(Color::WHITE));
        assert_eq!(out.get(4, 2), Ok(Color::BLACK));
        assert_eq!(out.get(2, 2), Ok(Color::BLACK));
        assert_eq!(out.get(20, 20), Ok(BG));
    }
    #[test]
    fn huge_outline_is_bounded() {
        let spec = MemeSpec {
            source: canvas(60, 40),
            blocks: vec![TextBlock {
                outline_width: u32::MAX,
                ..builtin("I", TextPosition::Custom { x: 0, y: 0 }, 8)
            }],
        };
        let out = compose(&spec);
        // The outline grows the block by 60 on each side, pushing the fill off the canvas.
        assert_eq!(out.get(59, 39), Ok(Color::BLACK));
        assert_eq!(out.get(30, 20), Ok(Color::BLACK));
        // Further than 60 from any ink.
        assert_eq!(out.get(0, 0), Ok(BG));
    }
    #[test]
    fn background_fills_block() {
        let spec = MemeSpec {
            source: canvas(60, 40),
            blocks: vec![TextBlock {
                outline_width: 0,
                background: Some(Color::rgb(1, 2, 3)),
                ..builtin("AB", TextPosition::Custom { x: 5, y: 5 }, 8)
            }],
        };
        let out = compose(&spec);
        // Block is two 6x8 cells; the spacing column is background.
        assert_eq!(out.get(5 + 11, 5), Ok(Color::rgb(1, 2, 3)));
        assert_eq!(out.get(5 + 12, 5), Ok(BG));
        assert_eq!(out.get(5, 5 + 8), Ok(BG));
    }
    #[test]
    fn template_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drake.json");
        let template = MemeTemplate::classic("templates/drake.png", "Drake");
        template.save(&path).unwrap();
        assert_eq!(MemeTemplate::load(&path).unwrap(), template);
        assert_eq!(template.blocks[0].text, "TOP TEXT");
        assert_eq!(template.blocks[1].position, TextPosition::Bottom);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(MemeTemplate::load(&path), Err(TemplateError::Json(_))));
    }
}
