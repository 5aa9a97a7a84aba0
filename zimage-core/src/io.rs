//! # Codec
//!
//! Conversion between encoded image files and [`PixelBuffer`]s, through the `image` crate. Decoding
//! accepts anything `image` can sniff, encoding is limited to [`OutputFormat`].

use std::path::{Path, PathBuf};

use crate::buffer::{ChannelFormat, PixelBuffer};

/// JPEG quality used when none is given.
pub const DEFAULT_QUALITY: u8 = 90;

/// Extensions recognized as images when scanning directories, lowercase with the dot.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".bmp", ".gif", ".webp", ".tiff", ".tif",
];

#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    strum::AsRefStr,
    strum::EnumIter,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum OutputFormat {
    Png,
    #[strum(serialize = "jpeg", serialize = "jpg")]
    Jpeg,
    Bmp,
    #[strum(serialize = "tiff", serialize = "tif")]
    Tiff,
}
impl OutputFormat {
    /// Match a file extension, without the dot, ignoring case.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        extension.parse().ok()
    }
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        Self::from_extension(path.extension()?.to_str()?)
    }
    /// Canonical extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }
    #[must_use]
    pub fn supports_alpha(self) -> bool {
        matches!(self, Self::Png | Self::Tiff)
    }
    fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Tiff => image::ImageFormat::Tiff,
        }
    }
    fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Bmp => Some(Self::Bmp),
            image::ImageFormat::Tiff => Some(Self::Tiff),
            _ => None,
        }
    }
}

fn describe(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map_or_else(|| "<memory>".to_owned(), |p| p.display().to_string())
}

#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    #[error("could not decode {}", describe(.path))]
    Decode {
        path: Option<PathBuf>,
        #[source]
        source: image::ImageError,
    },
    #[error("could not encode {}", describe(.path))]
    Encode {
        path: Option<PathBuf>,
        #[source]
        source: image::ImageError,
    },
}
impl CodecError {
    fn with_path(self, path: &Path) -> Self {
        match self {
            Self::Decode { source, .. } => Self::Decode {
                path: Some(path.to_owned()),
                source,
            },
            Self::Encode { source, .. } => Self::Encode {
                path: Some(path.to_owned()),
                source,
            },
        }
    }
}

/// Guess the encodable format of some file contents, if it is one.
#[must_use]
pub fn sniff(bytes: &[u8]) -> Option<OutputFormat> {
    image::guess_format(bytes)
        .ok()
        .and_then(OutputFormat::from_image_format)
}

/// Decode an image from memory. Images with any alpha channel decode to RGBA, others to RGB.
pub fn decode(bytes: &[u8]) -> Result<PixelBuffer, CodecError> {
    let decode_err = |source| CodecError::Decode { path: None, source };
    let image = image::load_from_memory(bytes).map_err(decode_err)?;
    let (width, height) = (image.width(), image.height());
    let buffer = if image.color().has_alpha() {
        PixelBuffer::from_raw(width, height, ChannelFormat::Rgba, image.into_rgba8().into_raw())
    } else {
        PixelBuffer::from_raw(width, height, ChannelFormat::Rgb, image.into_rgb8().into_raw())
    };
    buffer.map_err(|err| {
        decode_err(image::ImageError::Parameter(
            image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::Generic(err.to_string()),
            ),
        ))
    })
}

pub fn decode_path(path: impl AsRef<Path>) -> Result<PixelBuffer, CodecError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|err| CodecError::Decode {
        path: Some(path.to_owned()),
        source: image::ImageError::IoError(err),
    })?;
    decode(&bytes).map_err(|err| err.with_path(path))
}

/// Encode a buffer. Alpha is dropped for formats that cannot store it, `quality` is used by JPEG only
/// and clamped to `1..=100`.
pub fn encode(buffer: &PixelBuffer, format: OutputFormat, quality: u8) -> Result<Vec<u8>, CodecError> {
    let encode_err = |source| CodecError::Encode { path: None, source };
    let buffer = if format.supports_alpha() {
        std::borrow::Cow::Borrowed(buffer)
    } else {
        std::borrow::Cow::Owned(buffer.to_format(ChannelFormat::Rgb))
    };
    let (width, height) = (buffer.width(), buffer.height());
    let raw = buffer.as_bytes().to_vec();
    // Lengths are guaranteed by the buffer, so these never fail.
    let image = match buffer.format() {
        ChannelFormat::Rgb => image::RgbImage::from_raw(width, height, raw).map(image::DynamicImage::from),
        ChannelFormat::Rgba => {
            image::RgbaImage::from_raw(width, height, raw).map(image::DynamicImage::from)
        }
    };
    let image = image.ok_or_else(|| {
        encode_err(image::ImageError::Parameter(
            image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ),
        ))
    })?;
    let mut out = std::io::Cursor::new(Vec::new());
    match format {
        OutputFormat::Jpeg => {
            let encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
            image.write_with_encoder(encoder).map_err(encode_err)?;
        }
        other => image
            .write_to(&mut out, other.image_format())
            .map_err(encode_err)?,
    }
    Ok(out.into_inner())
}

/// Encode and write to `path`, replacing any existing file.
pub fn encode_to_path(
    buffer: &PixelBuffer,
    path: impl AsRef<Path>,
    format: OutputFormat,
    quality: u8,
) -> Result<u64, CodecError> {
    let path = path.as_ref();
    let bytes = encode(buffer, format, quality).map_err(|err| err.with_path(path))?;
    std::fs::write(path, &bytes).map_err(|err| CodecError::Encode {
        path: Some(path.to_owned()),
        source: image::ImageError::IoError(err),
    })?;
    Ok(bytes.len() as u64)
}

/// Whether the path has one of the [`IMAGE_EXTENSIONS`].
#[must_use]
pub fn is_image_path(path: impl AsRef<Path>) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known[1..].eq_ignore_ascii_case(ext))
        })
}
