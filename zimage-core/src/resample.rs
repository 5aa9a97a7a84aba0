//! # Resampling
//!
//! Every filter is expressed as a pair of per-axis weight tables: each output column (or row) is a
//! weighted sum of a few source columns (or rows). Output rows are computed in parallel.

use rayon::prelude::*;

use crate::{
    buffer::{ChannelFormat, PixelBuffer},
    io::OutputFormat,
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
pub enum ResampleFilter {
    /// Nearest source pixel. Blocky, but never invents colors.
    Nearest,
    /// Linear interpolation between the four nearest pixel centers.
    #[default]
    Bilinear,
    /// Exact average of every source pixel under the output pixel. Best for shrinking.
    Area,
}

/// How to resize a single image. Dimensions left as `None` are derived from the source.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ResizeSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Derive a missing dimension from the source aspect ratio, instead of keeping it as is.
    pub aspect_lock: bool,
    pub filter: ResampleFilter,
    /// Output format. `None` keeps the source's own format.
    pub format: Option<OutputFormat>,
    /// JPEG quality, 1 to 100.
    pub quality: u8,
}
impl Default for ResizeSpec {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            aspect_lock: true,
            filter: ResampleFilter::default(),
            format: None,
            quality: crate::io::DEFAULT_QUALITY,
        }
    }
}
impl ResizeSpec {
    #[must_use]
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResizeError {
    #[error("invalid target dimensions {width:?}x{height:?}")]
    InvalidDimensions {
        width: Option<u32>,
        height: Option<u32>,
    },
}

/// Work out the output size for a source of `original` size.
pub fn resolve_dimensions(
    (orig_w, orig_h): (u32, u32),
    spec: &ResizeSpec,
) -> Result<(u32, u32), ResizeError> {
    let invalid = ResizeError::InvalidDimensions {
        width: spec.width,
        height: spec.height,
    };
    // Zero is never valid, whatever the lock says.
    if spec.width == Some(0) || spec.height == Some(0) {
        return Err(invalid);
    }
    // other * target / original, rounded, at least one.
    let scale = |other: u32, target: u32, original: u32| -> u32 {
        let num = u64::from(other) * u64::from(target);
        let den = u64::from(original.max(1));
        let rounded = (num + den / 2) / den;
        az::saturating_cast::<u64, u32>(rounded).max(1)
    };
    match (spec.width, spec.height) {
        (Some(w), Some(h)) => Ok((w, h)),
        (Some(w), None) if spec.aspect_lock => Ok((w, scale(orig_h, w, orig_w))),
        (Some(w), None) => Ok((w, orig_h)),
        (None, Some(h)) if spec.aspect_lock => Ok((scale(orig_w, h, orig_h), h)),
        (None, Some(h)) => Ok((orig_w, h)),
        (None, None) => Err(invalid),
    }
}

/// Source indices and weights contributing to one output coordinate.
type Taps = smallvec::SmallVec<[(usize, f32); 4]>;

fn taps(filter: ResampleFilter, src: u32, dst: u32) -> Vec<Taps> {
    let ratio = f64::from(src) / f64::from(dst);
    let last = src as usize - 1;
    (0..dst)
        .map(|o| {
            let mut taps = Taps::new();
            match filter {
                ResampleFilter::Nearest => {
                    let s = ((f64::from(o) + 0.5) * ratio).floor() as usize;
                    taps.push((s.min(last), 1.0));
                }
                ResampleFilter::Bilinear => {
                    // Pixel centers aligned, clamped at the edges.
                    let center = ((f64::from(o) + 0.5) * ratio - 0.5).max(0.0);
                    let s0 = (center.floor() as usize).min(last);
                    let s1 = (s0 + 1).min(last);
                    let frac = (center - s0 as f64).clamp(0.0, 1.0) as f32;
                    if s1 == s0 || frac == 0.0 {
                        taps.push((s0, 1.0));
                    } else {
                        taps.push((s0, 1.0 - frac));
                        taps.push((s1, frac));
                    }
                }
                ResampleFilter::Area => {
                    let start = f64::from(o) * ratio;
                    let end = f64::from(o + 1) * ratio;
                    let first = start.floor() as usize;
                    let past = (end.ceil() as usize).min(last + 1);
                    for s in first..past {
                        let overlap = end.min(s as f64 + 1.0) - start.max(s as f64);
                        if overlap > 0.0 {
                            taps.push((s, (overlap / ratio) as f32));
                        }
                    }
                }
            }
            taps
        })
        .collect()
}

/// Resize `source` according to `spec`.
///
/// Alpha is dropped afterwards if the requested output format cannot carry it.
pub fn resize(source: &PixelBuffer, spec: &ResizeSpec) -> Result<PixelBuffer, ResizeError> {
    let (width, height) = resolve_dimensions((source.width(), source.height()), spec)?;
    let resized = if (width, height) == (source.width(), source.height()) {
        source.clone_full()
    } else {
        resample(source, width, height, spec.filter).map_err(|_| {
            ResizeError::InvalidDimensions {
                width: Some(width),
                height: Some(height),
            }
        })?
    };
    log::debug!(
        "resized {}x{} to {width}x{height} ({})",
        source.width(),
        source.height(),
        spec.filter.as_ref()
    );
    Ok(match spec.format {
        Some(format) if !format.supports_alpha() => resized.to_format(ChannelFormat::Rgb),
        _ => resized,
    })
}

fn resample(
    source: &PixelBuffer,
    width: u32,
    height: u32,
    filter: ResampleFilter,
) -> Result<PixelBuffer, crate::buffer::BufferError> {
    let channels = source.channels();
    let alpha = source.format().has_alpha();
    let src = source.as_bytes();
    let src_stride = source.width() as usize * channels;
    let x_taps = taps(filter, source.width(), width);
    let y_taps = taps(filter, source.height(), height);
    let stride = width as usize * channels;
    let mut data = vec![0u8; stride * height as usize];

    data.par_chunks_mut(stride)
        .zip(y_taps.par_iter())
        .for_each(|(row, ys)| {
            for (out, xs) in row.chunks_exact_mut(channels).zip(&x_taps) {
                // Premultiplied accumulation, alpha last.
                let mut acc = [0.0f32; 4];
                for &(sy, wy) in ys {
                    let line = &src[sy * src_stride..];
                    for &(sx, wx) in xs {
                        let px = &line[sx * channels..sx * channels + channels];
                        let w = wy * wx;
                        let a = if alpha { f32::from(px[3]) / 255.0 } else { 1.0 };
                        acc[0] += f32::from(px[0]) * a * w;
                        acc[1] += f32::from(px[1]) * a * w;
                        acc[2] += f32::from(px[2]) * a * w;
                        acc[3] += a * w;
                    }
                }
                let quantize = |v: f32| v.round().clamp(0.0, 255.0) as u8;
                if alpha {
                    let a = acc[3];
                    if a <= 0.0 {
                        out.fill(0);
                    } else {
                        out[0] = quantize(acc[0] / a);
                        out[1] = quantize(acc[1] / a);
                        out[2] = quantize(acc[2] / a);
                        out[3] = quantize(a * 255.0);
                    }
                } else {
                    out[0] = quantize(acc[0]);
                    out[1] = quantize(acc[1]);
                    out[2] = quantize(acc[2]);
                }
            }
        });
    PixelBuffer::from_raw(width, height, source.format(), data)
}
