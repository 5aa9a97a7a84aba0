//! # Pixel buffers
//!
//! The unit every other component reads and writes: an owned, contiguous, row-major grid of 8-bit
//! pixels in either RGB or RGBA layout. Buffers are never empty - both dimensions are at least one.

use crate::{
    blend,
    color::Color,
    raster::Coverage,
    util::{Point, Rect},
};

#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    strum::AsRefStr,
    strum::EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
pub enum ChannelFormat {
    Rgb,
    Rgba,
}
impl ChannelFormat {
    /// Bytes per pixel.
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Rgba => 4,
        }
    }
    #[must_use]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("({x}, {y}) is outside of the {width}x{height} buffer")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },
    #[error("{width}x{height} is not a valid buffer size")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("expected {expected} bytes of pixel data, found {found}")]
    LengthMismatch { expected: usize, found: usize },
}

#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: ChannelFormat,
    data: Vec<u8>,
}
impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Pixel data is far too noisy to print.
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
impl PixelBuffer {
    fn byte_len(width: u32, height: u32, format: ChannelFormat) -> Result<usize, BufferError> {
        if width == 0 || height == 0 {
            return Err(BufferError::InvalidDimensions { width, height });
        }
        usize::try_from(width)
            .ok()
            .zip(usize::try_from(height).ok())
            .and_then(|(w, h)| w.checked_mul(h)?.checked_mul(format.channels()))
            .ok_or(BufferError::InvalidDimensions { width, height })
    }
    /// Create a buffer with every pixel set to `fill`. Alpha of `fill` is dropped for [`ChannelFormat::Rgb`].
    pub fn create(
        width: u32,
        height: u32,
        format: ChannelFormat,
        fill: Color,
    ) -> Result<Self, BufferError> {
        let len = Self::byte_len(width, height, format)?;
        let mut this = Self {
            width,
            height,
            format,
            data: vec![0; len],
        };
        this.fill(fill);
        Ok(this)
    }
    /// Wrap existing row-major pixel data.
    pub fn from_raw(
        width: u32,
        height: u32,
        format: ChannelFormat,
        data: Vec<u8>,
    ) -> Result<Self, BufferError> {
        let expected = Self::byte_len(width, height, format)?;
        if data.len() != expected {
            return Err(BufferError::LengthMismatch {
                expected,
                found: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }
    #[must_use]
    pub fn format(&self) -> ChannelFormat {
        self.format
    }
    #[must_use]
    pub fn channels(&self) -> usize {
        self.format.channels()
    }
    /// The full extent of the buffer, at the origin.
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::sized(self.width, self.height)
    }
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
    /// Byte offset of an in-bounds pixel.
    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels()
    }
    fn check(&self, x: i64, y: i64) -> Result<(u32, u32), BufferError> {
        if self.rect().contains(x, y) {
            // In range of the buffer, and thus of u32.
            Ok((x as u32, y as u32))
        } else {
            Err(BufferError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }
    fn read(&self, x: u32, y: u32) -> Color {
        let at = self.offset(x, y);
        match self.format {
            ChannelFormat::Rgb => Color::rgb(self.data[at], self.data[at + 1], self.data[at + 2]),
            ChannelFormat::Rgba => Color::new(
                self.data[at],
                self.data[at + 1],
                self.data[at + 2],
                self.data[at + 3],
            ),
        }
    }
    /// Overwrite an in-bounds pixel.
    pub(crate) fn write(&mut self, x: u32, y: u32, color: Color) {
        let at = self.offset(x, y);
        let channels = self.channels();
        self.data[at..at + channels].copy_from_slice(&color.0[..channels]);
    }
    /// Read a pixel. RGB pixels report full alpha.
    pub fn get(&self, x: i64, y: i64) -> Result<Color, BufferError> {
        let (x, y) = self.check(x, y)?;
        Ok(self.read(x, y))
    }
    /// Overwrite a pixel. RGB buffers drop the alpha channel.
    pub fn set(&mut self, x: i64, y: i64, color: Color) -> Result<(), BufferError> {
        let (x, y) = self.check(x, y)?;
        self.write(x, y, color);
        Ok(())
    }
    pub fn fill(&mut self, color: Color) {
        match self.format {
            ChannelFormat::Rgba => {
                bytemuck::cast_slice_mut::<u8, [u8; 4]>(&mut self.data).fill(color.0);
            }
            ChannelFormat::Rgb => {
                let rgb = [color.r(), color.g(), color.b()];
                for px in self.data.chunks_exact_mut(3) {
                    px.copy_from_slice(&rgb);
                }
            }
        }
    }
    /// Independent deep copy. No storage is shared with `self`.
    #[must_use]
    pub fn clone_full(&self) -> Self {
        self.clone()
    }
    /// Copy the pixels of `src_rect` in `src` to `dst_origin` in self, replacing what was there.
    ///
    /// The rectangle is clipped against both buffers, only the in-bounds intersection is copied
    /// and this never fails. Channel formats are converted per pixel. Returns the written area of
    /// `self`, which may be empty.
    pub fn copy_region(&mut self, src: &PixelBuffer, src_rect: Rect, dst_origin: Point) -> Rect {
        let (src_area, dst_area) = self.clip_transfer(src, src_rect, dst_origin);
        if dst_area.is_empty() {
            return dst_area;
        }
        let width = dst_area.width as usize;
        for row in 0..dst_area.height {
            let sy = src_area.y as u32 + row;
            let dy = dst_area.y as u32 + row;
            if src.format == self.format {
                let from = src.offset(src_area.x as u32, sy);
                let to = self.offset(dst_area.x as u32, dy);
                let len = width * self.channels();
                self.data[to..to + len].copy_from_slice(&src.data[from..from + len]);
            } else {
                for col in 0..dst_area.width {
                    let color = src.read(src_area.x as u32 + col, sy);
                    self.write(dst_area.x as u32 + col, dy, color);
                }
            }
        }
        dst_area
    }
    /// Composite all of `src` over self with its top-left at `origin`. Clipped, never fails.
    pub fn blit_over(&mut self, src: &PixelBuffer, origin: Point) -> Rect {
        let (src_area, dst_area) = self.clip_transfer(src, src.rect(), origin);
        for row in 0..dst_area.height {
            for col in 0..dst_area.width {
                let color = src.read(src_area.x as u32 + col, src_area.y as u32 + row);
                let (x, y) = (dst_area.x as u32 + col, dst_area.y as u32 + row);
                let dst = self.read(x, y);
                self.write(x, y, blend::over(dst, color));
            }
        }
        dst_area
    }
    /// Clip a transfer of `src_rect` from `src` to `dst_origin` in self.
    /// Returns the matching (source, destination) areas, equal in size.
    fn clip_transfer(&self, src: &PixelBuffer, src_rect: Rect, dst_origin: Point) -> (Rect, Rect) {
        let src_area = src_rect.intersect(&src.rect());
        // Where the clipped source lands in self
        let shift_x = i64::from(dst_origin.x) - src_rect.left();
        let shift_y = i64::from(dst_origin.y) - src_rect.top();
        let landed = Rect::from_edges(
            src_area.left() + shift_x,
            src_area.top() + shift_y,
            src_area.right() + shift_x,
            src_area.bottom() + shift_y,
        );
        let dst_area = landed.intersect(&self.rect());
        let src_area = Rect::from_edges(
            dst_area.left() - shift_x,
            dst_area.top() - shift_y,
            dst_area.right() - shift_x,
            dst_area.bottom() - shift_y,
        );
        (src_area, dst_area)
    }
    /// Copy out the part of `rect` inside this buffer.
    ///
    /// Returns the clipped rectangle with its pixels, or `None` if nothing of `rect` is in bounds.
    #[must_use]
    pub fn extract(&self, rect: Rect) -> Option<(Rect, PixelBuffer)> {
        let area = rect.intersect(&self.rect());
        if area.is_empty() {
            return None;
        }
        let mut out = Self {
            width: area.width,
            height: area.height,
            format: self.format,
            data: vec![0; area.width as usize * area.height as usize * self.channels()],
        };
        out.copy_region(self, area, Point::ORIGIN);
        Some((area, out))
    }
    /// Convert to another channel format. Adding alpha makes every pixel opaque, removing it drops
    /// the alpha channel without compositing.
    #[must_use]
    pub fn to_format(&self, format: ChannelFormat) -> PixelBuffer {
        if format == self.format {
            return self.clone();
        }
        let data = match format {
            ChannelFormat::Rgb => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
            ChannelFormat::Rgba => self
                .data
                .chunks_exact(3)
                .flat_map(|px| [px[0], px[1], px[2], 255])
                .collect(),
        };
        Self {
            width: self.width,
            height: self.height,
            format,
            data,
        }
    }
    /// Paint `color` through a coverage mask, positioned by the mask's own rect.
    pub fn composite_coverage(&mut self, coverage: &Coverage, color: Color) {
        let area = coverage.rect().intersect(&self.rect());
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                let c = coverage.get(x, y);
                if c == 0 {
                    continue;
                }
                let (px, py) = (x as u32, y as u32);
                let dst = self.read(px, py);
                self.write(px, py, blend::over(dst, blend::modulate(color, c)));
            }
        }
    }
}
