//! # Text
//!
//! Lays out multi-line text into a [`Coverage`] mask. Text is split into lines on `'\n'`, and each
//! line is aligned horizontally within the widest one.
//!
//! Two kinds of face are supported: TrueType/OpenType faces found through [`crate::repositories::fonts`],
//! shaped with `rustybuzz` and filled by [`outline`], and the [`builtin`] bitmap face. A face that
//! cannot be found or parsed falls back to the builtin one, text never fails to draw.

pub mod builtin;
mod outline;

use crate::raster::Coverage;

/// Which face to draw text with.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FontDescriptor {
    /// The builtin 5x7 bitmap face.
    #[default]
    Builtin,
    /// A system or user-installed family, by name. `serif`, `sans-serif`, and `monospace` pick the
    /// system's generic family.
    Family {
        name: String,
        #[serde(default)]
        bold: bool,
        #[serde(default)]
        italic: bool,
    },
    /// A font file on disk, and the face index within it.
    File {
        path: std::path::PathBuf,
        #[serde(default)]
        index: u32,
    },
}
impl FontDescriptor {
    #[must_use]
    pub fn family(name: impl Into<String>) -> Self {
        Self::Family {
            name: name.into(),
            bold: false,
            italic: false,
        }
    }
}
impl std::fmt::Display for FontDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Builtin => f.write_str("builtin"),
            Self::Family { name, bold, italic } => {
                f.write_str(name)?;
                if *bold {
                    f.write_str(" bold")?;
                }
                if *italic {
                    f.write_str(" italic")?;
                }
                Ok(())
            }
            Self::File { path, index } => write!(f, "{}#{index}", path.display()),
        }
    }
}

#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    strum::AsRefStr,
    strum::EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum HorizontalAlign {
    Left,
    #[default]
    Center,
    Right,
}
impl HorizontalAlign {
    /// Offset of a line of `width` within a block of `block_width`.
    #[must_use]
    pub fn offset(self, block_width: u32, width: u32) -> u32 {
        let slack = block_width.saturating_sub(width);
        match self {
            Self::Left => 0,
            Self::Center => slack / 2,
            Self::Right => slack,
        }
    }
}

/// Rendered text, positioned with the top-left of the block at the origin.
#[derive(Clone, Debug)]
pub struct TextLayout {
    /// Glyph coverage. Its rect contains the nominal block and any ink overhanging it.
    pub coverage: Coverage,
    /// Distance from the block top to the first baseline.
    pub ascent: u32,
    /// Distance between consecutive baselines.
    pub line_height: u32,
    pub lines: usize,
}

/// Lay out `text` with the given face and pixel size.
#[must_use]
pub fn layout(text: &str, font: &FontDescriptor, size: u32, align: HorizontalAlign) -> TextLayout {
    let lines: Vec<&str> = text.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    if *font != FontDescriptor::Builtin {
        match crate::repositories::fonts::faces().load(font) {
            Ok(face) => {
                if let Some(layout) = outline::layout(face.data(), face.index(), &lines, size, align) {
                    return layout;
                }
                log::warn!("font {font} could not be parsed, using the builtin face");
            }
            Err(err) => log::warn!("font {font} unavailable ({err}), using the builtin face"),
        }
    }
    builtin::layout(&lines, size, align)
}

#[cfg(test)]
mod test {
    use super::{layout, FontDescriptor, HorizontalAlign};
    #[test]
    fn missing_font_falls_back() {
        let font = FontDescriptor::File {
            path: "/definitely/not/a/font.ttf".into(),
            index: 0,
        };
        let fallback = layout("Hi", &font, 16, HorizontalAlign::Left);
        let builtin = layout("Hi", &FontDescriptor::Builtin, 16, HorizontalAlign::Left);
        assert_eq!(fallback.coverage, builtin.coverage);
    }
    #[test]
    fn empty_text_has_no_ink() {
        let text = layout("", &FontDescriptor::Builtin, 24, HorizontalAlign::Center);
        assert!(text.coverage.is_blank());
        assert_eq!(text.lines, 1);
    }
    #[test]
    fn align_offsets() {
        assert_eq!(HorizontalAlign::Left.offset(10, 4), 0);
        assert_eq!(HorizontalAlign::Center.offset(10, 3), 3);
        assert_eq!(HorizontalAlign::Right.offset(10, 4), 6);
        assert_eq!(HorizontalAlign::Right.offset(2, 4), 0);
    }
    #[test]
    fn descriptor_from_toml() {
        #[derive(serde::Deserialize)]
        struct Wrap {
            font: FontDescriptor,
        }
        let wrap: Wrap = toml::from_str("font = { kind = \"family\", name = \"Impact\" }").unwrap();
        assert_eq!(wrap.font, FontDescriptor::family("Impact"));
    }
}
