//! # Collages
//!
//! Packs images side by side or stacked, separated by a fixed gap, over a background.

use crate::{
    buffer::{BufferError, ChannelFormat, PixelBuffer},
    color::Color,
    util::Point,
};

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
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Orientation {
    /// Left to right.
    #[default]
    Horizontal,
    /// Top to bottom.
    Vertical,
}

#[derive(Clone, Debug)]
pub struct CollageSpec {
    /// Placed in order along the main axis.
    pub sources: Vec<PixelBuffer>,
    pub orientation: Orientation,
    /// Gap between neighbors, in pixels.
    pub spacing: u32,
    /// Fill behind and between the sources. `None` is white, or transparent if any source has alpha.
    pub background: Option<Color>,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CollageError {
    #[error("a collage needs at least one image")]
    EmptyCollage,
    #[error("collage would be too large: {0}")]
    Buffer(#[from] BufferError),
}

/// Compose the collage described by `spec`.
///
/// Sources are centered on the cross axis, rounding towards the top/left.
pub fn compose(spec: &CollageSpec) -> Result<PixelBuffer, CollageError> {
    if spec.sources.is_empty() {
        return Err(CollageError::EmptyCollage);
    }
    let horizontal = spec.orientation == Orientation::Horizontal;
    // (main, cross) extents of each source.
    let extent = |s: &PixelBuffer| {
        if horizontal {
            (u64::from(s.width()), u64::from(s.height()))
        } else {
            (u64::from(s.height()), u64::from(s.width()))
        }
    };
    let gaps = u64::from(spec.spacing) * (spec.sources.len() as u64 - 1);
    let main = spec.sources.iter().map(|s| extent(s).0).sum::<u64>() + gaps;
    let cross = spec.sources.iter().map(|s| extent(s).1).max().unwrap_or(0);
    let (width, height) = if horizontal { (main, cross) } else { (cross, main) };
    let too_large = || BufferError::InvalidDimensions {
        width: az::saturating_cast(width),
        height: az::saturating_cast(height),
    };
    let width = u32::try_from(width).map_err(|_| too_large())?;
    let height = u32::try_from(height).map_err(|_| too_large())?;

    let any_alpha = spec.sources.iter().any(|s| s.format().has_alpha());
    let translucent_bg = spec.background.is_some_and(|c| !c.is_opaque());
    let format = if any_alpha || translucent_bg {
        ChannelFormat::Rgba
    } else {
        ChannelFormat::Rgb
    };
    let background = spec.background.unwrap_or(match format {
        ChannelFormat::Rgb => Color::WHITE,
        ChannelFormat::Rgba => Color::TRANSPARENT,
    });
    let mut out = PixelBuffer::create(width, height, format, background)?;

    let mut offset = 0u64;
    for source in &spec.sources {
        let (size, cross_size) = extent(source);
        // Both fit in the output, and so in i32 once the output fits in memory.
        let main_at: i32 = az::saturating_cast(offset);
        let cross_at: i32 = az::saturating_cast((cross - cross_size) / 2);
        let at = if horizontal {
            Point::new(main_at, cross_at)
        } else {
            Point::new(cross_at, main_at)
        };
        out.blit_over(source, at);
        offset += size + u64::from(spec.spacing);
    }
    log::debug!(
        "composed {} image {} collage of {width}x{height}",
        spec.sources.len(),
        spec.orientation.as_ref()
    );
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::{compose, CollageError, CollageSpec, Orientation};
    use crate::{
        buffer::{ChannelFormat, PixelBuffer},
        color::Color,
    };
    fn solid(width: u32, height: u32, color: Color) -> PixelBuffer {
        PixelBuffer::create(width, height, ChannelFormat::Rgb, color).unwrap()
    }
    const RED: Color = Color::rgb(255, 0, 0);
    const GREEN: Color = Color::rgb(0, 255, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);
    #[test]
    fn horizontal_sizes_and_centering() {
        let spec = CollageSpec {
            sources: vec![solid(10, 20, RED), solid(30, 20, GREEN), solid(10, 40, BLUE)],
            orientation: Orientation::Horizontal,
            spacing: 5,
            background: None,
        };
        let out = compose(&spec).unwrap();
        assert_eq!((out.width(), out.height()), (60, 40));
        assert_eq!(out.format(), ChannelFormat::Rgb);
        // Short images are centered vertically.
        assert_eq!(out.get(0, 9), Ok(Color::WHITE));
        assert_eq!(out.get(0, 10), Ok(RED));
        assert_eq!(out.get(9, 29), Ok(RED));
        assert_eq!(out.get(0, 30), Ok(Color::WHITE));
        // Gap, then the next image.
        assert_eq!(out.get(12, 15), Ok(Color::WHITE));
        assert_eq!(out.get(15, 10), Ok(GREEN));
        assert_eq!(out.get(50, 0), Ok(BLUE));
        assert_eq!(out.get(59, 39), Ok(BLUE));
    }
    #[test]
    fn vertical_floor_centering() {
        let spec = CollageSpec {
            sources: vec![solid(2, 2, RED), solid(5, 1, GREEN)],
            orientation: Orientation::Vertical,
            spacing: 0,
            background: Some(Color::BLACK),
        };
        let out = compose(&spec).unwrap();
        assert_eq!((out.width(), out.height()), (5, 3));
        // (5 - 2) / 2 == 1
        assert_eq!(out.get(0, 0), Ok(Color::BLACK));
        assert_eq!(out.get(1, 0), Ok(RED));
        assert_eq!(out.get(3, 1), Ok(Color::BLACK));
        assert_eq!(out.get(4, 2), Ok(GREEN));
    }
    #[test]
    fn alpha_sources_get_transparent_background() {
        let translucent =
            PixelBuffer::create(2, 2, ChannelFormat::Rgba, Color::new(0, 0, 0, 0)).unwrap();
        let spec = CollageSpec {
            sources: vec![translucent, solid(2, 4, RED)],
            orientation: Orientation::Horizontal,
            spacing: 1,
            background: None,
        };
        let out = compose(&spec).unwrap();
        assert_eq!(out.format(), ChannelFormat::Rgba);
        assert_eq!(out.get(2, 0), Ok(Color::TRANSPARENT));
        assert_eq!(out.get(3, 0), Ok(RED));
    }
    #[test]
    fn empty_is_error() {
        let spec = CollageSpec {
            sources: Vec::new(),
            orientation: Orientation::Vertical,
            spacing: 3,
            background: None,
        };
        assert_eq!(compose(&spec), Err(CollageError::EmptyCollage));
    }
}
