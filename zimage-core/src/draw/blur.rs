//! Region blurs. Every variant is built from separable, canvas-clipped box averages over
//! premultiplied color.

use crate::{buffer::PixelBuffer, color::Color, util::Rect};

pub const MIN_RADIUS: u32 = 1;
pub const MAX_RADIUS: u32 = 20;

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
pub enum BlurKind {
    /// Average of the square window.
    Box,
    /// Three box passes, approximating a gaussian.
    #[default]
    Gaussian,
    /// Horizontal average only.
    Motion,
}
impl BlurKind {
    fn passes(self) -> u32 {
        match self {
            Self::Box | Self::Motion => 1,
            Self::Gaussian => 3,
        }
    }
}

/// Premultiplied working plane.
struct Plane {
    width: usize,
    height: usize,
    px: Vec<[f32; 4]>,
}
impl Plane {
    fn from_buffer(buffer: &PixelBuffer) -> Self {
        let mut px = Vec::with_capacity(buffer.width() as usize * buffer.height() as usize);
        for y in 0..i64::from(buffer.height()) {
            for x in 0..i64::from(buffer.width()) {
                let c = buffer.get(x, y).unwrap_or_default();
                let a = f32::from(c.a()) / 255.0;
                px.push([
                    f32::from(c.r()) * a,
                    f32::from(c.g()) * a,
                    f32::from(c.b()) * a,
                    f32::from(c.a()),
                ]);
            }
        }
        Self {
            width: buffer.width() as usize,
            height: buffer.height() as usize,
            px,
        }
    }
    fn color(&self, x: usize, y: usize) -> Color {
        let [r, g, b, a] = self.px[y * self.width + x];
        if a <= 0.0 {
            return Color::TRANSPARENT;
        }
        let unmul = 255.0 / a;
        let q = |v: f32| (v * unmul).round().clamp(0.0, 255.0) as u8;
        Color::new(q(r), q(g), q(b), a.round().clamp(0.0, 255.0) as u8)
    }
    /// Box average along one axis, windows clipped to the plane.
    fn box_pass(&mut self, radius: usize, horizontal: bool) {
        let (lines, len) = if horizontal {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        };
        let index = |line: usize, i: usize| {
            if horizontal {
                line * self.width + i
            } else {
                i * self.width + line
            }
        };
        let mut prefix = vec![[0.0f64; 4]; len + 1];
        let mut out = self.px.clone();
        for line in 0..lines {
            for i in 0..len {
                let px = self.px[index(line, i)];
                let prev = prefix[i];
                prefix[i + 1] = [0, 1, 2, 3].map(|c| prev[c] + f64::from(px[c]));
            }
            for i in 0..len {
                let lo = i.saturating_sub(radius);
                let hi = (i + radius + 1).min(len);
                let count = (hi - lo) as f64;
                out[index(line, i)] =
                    [0, 1, 2, 3].map(|c| ((prefix[hi][c] - prefix[lo][c]) / count) as f32);
            }
        }
        self.px = out;
    }
}

/// Blur `region` of `source`, sampling from the unmodified source.
///
/// Returns the clipped region and its blurred pixels, or `None` if the clipped region is under
/// two pixels wide or tall. `radius` is clamped to [`MIN_RADIUS`]`..=`[`MAX_RADIUS`].
#[must_use]
pub fn blur_region(
    source: &PixelBuffer,
    region: Rect,
    kind: BlurKind,
    radius: u32,
) -> Option<(Rect, PixelBuffer)> {
    let region = region.intersect(&source.rect());
    if region.width <= 1 || region.height <= 1 {
        return None;
    }
    let radius = radius.clamp(MIN_RADIUS, MAX_RADIUS);
    // Every pass reads up to `radius` further out, so the region stays exact after all of them.
    let (work_rect, work) = source.extract(region.inflate(radius * kind.passes()))?;
    let mut plane = Plane::from_buffer(&work);
    for _ in 0..kind.passes() {
        plane.box_pass(radius as usize, true);
        if kind != BlurKind::Motion {
            plane.box_pass(radius as usize, false);
        }
    }
    let mut out =
        PixelBuffer::create(region.width, region.height, source.format(), Color::TRANSPARENT).ok()?;
    let dx = (region.left() - work_rect.left()) as usize;
    let dy = (region.top() - work_rect.top()) as usize;
    for y in 0..region.height as usize {
        for x in 0..region.width as usize {
            let color = plane.color(x + dx, y + dy);
            out.write(x as u32, y as u32, color);
        }
    }
    log::trace!("{} blur r={radius} over {region:?}", kind.as_ref());
    Some((region, out))
}
