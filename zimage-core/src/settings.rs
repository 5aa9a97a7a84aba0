//! User defaults for every tool. Persistence is up to the embedding application.

use crate::{
    batch::NamingPolicy,
    collage::Orientation,
    color::Color,
    draw::BlurKind,
    io::{OutputFormat, DEFAULT_QUALITY},
    meme::TextBlock,
    resample::{ResampleFilter, ResizeSpec},
    text::FontDescriptor,
};

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub brush_size: u32,
    pub brush_color: Color,
    /// Fill of new, blank documents.
    pub background_color: Color,
    pub blur_radius: u32,
    pub blur_kind: BlurKind,
    pub font_size: u32,
    pub font: FontDescriptor,
}
impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            brush_size: 3,
            brush_color: Color::BLACK,
            background_color: Color::WHITE,
            blur_radius: 10,
            blur_kind: BlurKind::Gaussian,
            font_size: 24,
            font: FontDescriptor::Builtin,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ResizeSettings {
    pub filter: ResampleFilter,
    pub quality: u8,
    /// `None` keeps each source's format.
    pub format: Option<OutputFormat>,
    pub suffix: String,
    pub aspect_lock: bool,
}
impl Default for ResizeSettings {
    fn default() -> Self {
        Self {
            filter: ResampleFilter::Bilinear,
            quality: DEFAULT_QUALITY,
            format: None,
            suffix: NamingPolicy::default().suffix,
            aspect_lock: true,
        }
    }
}
impl ResizeSettings {
    /// A resize to the given dimensions, with everything else from these settings.
    #[must_use]
    pub fn spec(&self, width: Option<u32>, height: Option<u32>) -> ResizeSpec {
        ResizeSpec {
            width,
            height,
            aspect_lock: self.aspect_lock,
            filter: self.filter,
            format: self.format,
            quality: self.quality,
        }
    }
    #[must_use]
    pub fn naming(&self) -> NamingPolicy {
        NamingPolicy {
            suffix: self.suffix.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// `None` uses the available parallelism.
    pub workers: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CollageSettings {
    pub spacing: u32,
    pub background: Color,
    pub orientation: Orientation,
}
impl Default for CollageSettings {
    fn default() -> Self {
        Self {
            spacing: 10,
            background: Color::WHITE,
            orientation: Orientation::Horizontal,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MemeSettings {
    pub font_size: u32,
    pub fill: Color,
    pub outline: Color,
    pub outline_width: u32,
    pub font: FontDescriptor,
}
impl Default for MemeSettings {
    fn default() -> Self {
        let block = TextBlock::default();
        Self {
            font_size: block.size,
            fill: block.fill,
            outline: block.outline,
            outline_width: block.outline_width,
            font: block.font,
        }
    }
}
impl MemeSettings {
    /// A text block styled by these settings.
    #[must_use]
    pub fn block(&self, text: impl Into<String>, position: crate::meme::TextPosition) -> TextBlock {
        TextBlock {
            font: self.font.clone(),
            size: self.font_size,
            fill: self.fill,
            outline: self.outline,
            outline_width: self.outline_width,
            ..TextBlock::new(text, position)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// One of `error`, `warn`, `info`, `debug`, `trace`, or `off`.
    pub log_level: String,
    pub editor: EditorSettings,
    pub resize: ResizeSettings,
    pub batch: BatchSettings,
    pub collage: CollageSettings,
    pub meme: MemeSettings,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            editor: EditorSettings::default(),
            resize: ResizeSettings::default(),
            batch: BatchSettings::default(),
            collage: CollageSettings::default(),
            meme: MemeSettings::default(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Settings;
    use crate::{color::Color, io::OutputFormat, resample::ResampleFilter};
    #[test]
    fn toml_round_trip() {
        let mut settings = Settings::default();
        settings.resize.format = Some(OutputFormat::Jpeg);
        settings.resize.filter = ResampleFilter::Area;
        settings.editor.brush_color = Color::new(1, 2, 3, 4);
        settings.batch.workers = Some(2);
        let text = toml::to_string_pretty(&settings).unwrap();
        let back: Settings = toml::from_str(&text).unwrap();
        assert_eq!(back, settings);
    }
    #[test]
    fn partial_file_fills_defaults() {
        let back: Settings = toml::from_str(
            r##"
            [editor]
            brush_size = 9
            [collage]
            orientation = "vertical"
            "##,
        )
        .unwrap();
        assert_eq!(back.editor.brush_size, 9);
        assert_eq!(back.editor.brush_color, Color::BLACK);
        assert_eq!(back.resize.quality, 90);
        assert_eq!(back.resize.suffix, "_resized");
        assert_eq!(back.log_level, "info");
    }
}
