//! # Coverage rasterization
//!
//! Shapes are never drawn straight into a [`PixelBuffer`](crate::buffer::PixelBuffer). They are first
//! rasterized into a [`Coverage`] mask, which is then composited in a single pass. This way a brush
//! stamped hundreds of times along a stroke still blends exactly once per pixel.
//!
//! Writes outside of a mask's rect are dropped, which is how every primitive clips.

use crate::util::{Point, Rect};

/// An 8-bit alpha mask positioned in buffer space.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Coverage {
    rect: Rect,
    data: Vec<u8>,
}
impl Coverage {
    #[must_use]
    pub fn new(rect: Rect) -> Self {
        Self {
            rect,
            data: vec![0; rect.width as usize * rect.height as usize],
        }
    }
    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }
    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if self.rect.contains(x, y) {
            let col = (x - self.rect.left()) as usize;
            let row = (y - self.rect.top()) as usize;
            Some(row * self.rect.width as usize + col)
        } else {
            None
        }
    }
    /// Coverage at a point, zero outside of the mask.
    #[must_use]
    pub fn get(&self, x: i64, y: i64) -> u8 {
        self.index(x, y).map_or(0, |idx| self.data[idx])
    }
    /// Raise the coverage at a point to at least `value`.
    pub fn max_at(&mut self, x: i64, y: i64, value: u8) {
        if let Some(idx) = self.index(x, y) {
            let px = &mut self.data[idx];
            *px = (*px).max(value);
        }
    }
    /// Mutable row of the mask, by row index relative to the mask top.
    pub(crate) fn row_mut(&mut self, row: u32) -> &mut [u8] {
        let width = self.rect.width as usize;
        let start = row as usize * width;
        &mut self.data[start..start + width]
    }
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&c| c == 0)
    }
    /// Tight bounds of all nonzero coverage. Empty if blank.
    #[must_use]
    pub fn ink_bounds(&self) -> Rect {
        let width = self.rect.width as usize;
        let mut bounds = Rect::new(self.rect.x, self.rect.y, 0, 0);
        if width == 0 {
            return bounds;
        }
        for (row, line) in self.data.chunks_exact(width).enumerate() {
            let Some(first) = line.iter().position(|&c| c != 0) else {
                continue;
            };
            // Some first implies some last.
            let last = line.iter().rposition(|&c| c != 0).unwrap_or(first);
            let top = self.rect.top() + row as i64;
            let left = self.rect.left() + first as i64;
            let span = Rect::from_edges(left, top, self.rect.left() + last as i64 + 1, top + 1);
            bounds = bounds.union(&span);
        }
        bounds
    }
    pub fn translate(&mut self, dx: i32, dy: i32) {
        self.rect = self.rect.translate(dx, dy);
    }
    /// Grow the mask by a disk of `radius`, as a max filter. The result is larger by `radius` on each side.
    #[must_use]
    pub fn dilate(&self, radius: u32) -> Coverage {
        if radius == 0 {
            return self.clone();
        }
        let mut out = Coverage::new(self.rect.inflate(radius));
        let disk: Vec<(i64, i64)> = (-i64::from(radius)..=i64::from(radius))
            .filter_map(|dy| disk_half_width(radius, dy).map(|half| (dy, half)))
            .collect();
        let width = self.rect.width as usize;
        if width == 0 {
            return out;
        }
        for (row, line) in self.data.chunks_exact(width).enumerate() {
            let y = self.rect.top() + row as i64;
            for (col, &c) in line.iter().enumerate() {
                if c == 0 {
                    continue;
                }
                let x = self.rect.left() + col as i64;
                for &(dy, half) in &disk {
                    for dx in -half..=half {
                        out.max_at(x + dx, y + dy, c);
                    }
                }
            }
        }
        out
    }
}

/// Half width of row `dy` of the dilation disk of `radius`, or `None` past its top and bottom.
fn disk_half_width(radius: u32, dy: i64) -> Option<i64> {
    let r = i128::from(radius);
    // Slightly over r^2 for a rounder silhouette at small radii.
    let rest = r * r + r / 2 - i128::from(dy) * i128::from(dy);
    if rest < 0 {
        return None;
    }
    let mut half = (rest as f64).sqrt() as i128;
    while half * half > rest {
        half -= 1;
    }
    while (half + 1) * (half + 1) <= rest {
        half += 1;
    }
    // At most `radius`.
    i64::try_from(half).ok()
}

/// A round brush footprint, centered on the stamped pixel.
///
/// Stamps are rasterized row by row and clipped to the target mask, so cost follows the mask
/// rather than the brush.
#[derive(Copy, Clone, Debug)]
pub struct Brush {
    /// Offsets covered on both axes, inclusive.
    lo: i32,
    hi: i32,
    center: f64,
    radius_sq: f64,
    /// Largest distance of any offset from the stamped pixel, in whole pixels.
    reach: u32,
}
impl Brush {
    /// A round brush `width` pixels across. Width 0 is treated as 1, which is a single pixel.
    #[must_use]
    pub fn round(width: u32) -> Self {
        let width = width.max(1);
        // Both at most i32::MAX for any u32 width.
        let lo = -(((width - 1) / 2) as i32);
        let hi = (width / 2) as i32;
        Self {
            lo,
            hi,
            center: (f64::from(lo) + f64::from(hi)) / 2.0,
            radius_sq: (f64::from(width) / 2.0).powi(2),
            reach: width / 2 + 1,
        }
    }
    fn covers(&self, dx: i64, dy: i64) -> bool {
        (dx as f64 - self.center).powi(2) + (dy as f64 - self.center).powi(2) <= self.radius_sq
    }
    /// Covered `dx` range of footprint row `dy`, inclusive.
    fn span(&self, dy: i64) -> Option<(i64, i64)> {
        let rest = self.radius_sq - (dy as f64 - self.center).powi(2);
        if rest < 0.0 {
            return None;
        }
        let (lo, hi) = (i64::from(self.lo), i64::from(self.hi));
        let half = rest.sqrt();
        let mut left = ((self.center - half).ceil() as i64).clamp(lo, hi);
        let mut right = ((self.center + half).floor() as i64).clamp(lo, hi);
        // Settle float rounding at the edges.
        if left > lo && self.covers(left - 1, dy) {
            left -= 1;
        }
        if left <= right && !self.covers(left, dy) {
            left += 1;
        }
        if right < hi && self.covers(right + 1, dy) {
            right += 1;
        }
        if right >= left && !self.covers(right, dy) {
            right -= 1;
        }
        (left <= right).then_some((left, right))
    }
    /// How far outside of the stroked path the brush may paint.
    #[must_use]
    pub fn reach(&self) -> u32 {
        self.reach
    }
    pub fn stamp(&self, coverage: &mut Coverage, at: Point) {
        let rect = coverage.rect();
        let (ax, ay) = (i64::from(at.x), i64::from(at.y));
        let top = (rect.top() - ay).max(i64::from(self.lo));
        let bottom = (rect.bottom() - 1 - ay).min(i64::from(self.hi));
        for dy in top..=bottom {
            let Some((left, right)) = self.span(dy) else {
                continue;
            };
            let left = (ax + left).max(rect.left());
            let right = (ax + right).min(rect.right() - 1);
            for x in left..=right {
                coverage.max_at(x, ay + dy, 255);
            }
        }
    }
    /// Stamp along the Bresenham line from `a` to `b`, inclusive.
    pub fn line(&self, coverage: &mut Coverage, a: Point, b: Point) {
        if coverage.rect().is_empty() {
            return;
        }
        // Never walk further than the mask, however far away the endpoints are.
        let window = coverage.rect().inflate(self.reach + 1);
        let Some((a, b)) = clip_segment(a, b, window) else {
            return;
        };
        let (mut x, mut y) = (i64::from(a.x), i64::from(a.y));
        let (x1, y1) = (i64::from(b.x), i64::from(b.y));
        let dx = (x1 - x).abs();
        let dy = -(y1 - y).abs();
        let sx = if x < x1 { 1 } else { -1 };
        let sy = if y < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            // In range, clipped above.
            self.stamp(coverage, Point::new(x as i32, y as i32));
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }
    /// Stamp along every segment of a polyline. A single point leaves a single stamp.
    pub fn polyline(&self, coverage: &mut Coverage, points: &[Point]) {
        match points {
            [] => (),
            [only] => self.stamp(coverage, *only),
            _ => {
                for pair in points.windows(2) {
                    self.line(coverage, pair[0], pair[1]);
                }
            }
        }
    }
    /// Stroke the outline of `rect`, centered on its edge pixels.
    pub fn rect_outline(&self, coverage: &mut Coverage, rect: Rect) {
        if rect.is_empty() {
            return;
        }
        let right: i32 = az::saturating_cast(rect.right() - 1);
        let bottom: i32 = az::saturating_cast(rect.bottom() - 1);
        let corners = [
            Point::new(rect.x, rect.y),
            Point::new(right, rect.y),
            Point::new(right, bottom),
            Point::new(rect.x, bottom),
            Point::new(rect.x, rect.y),
        ];
        self.polyline(coverage, &corners);
    }
    /// Stroke the ellipse inscribed in `bounds`.
    pub fn ellipse_outline(&self, coverage: &mut Coverage, bounds: Rect) {
        if bounds.is_empty() {
            return;
        }
        let geom = EllipseGeometry::from_bounds(bounds);
        // Approximate perimeter (Ramanujan), sampled twice per pixel so no gaps open up.
        let (a, b) = (geom.rx, geom.ry);
        let perimeter = std::f64::consts::PI
            * (3.0 * (a + b) - ((3.0 * a + b) * (a + 3.0 * b)).sqrt());
        let samples: u32 = az::saturating_cast((perimeter * 2.0).ceil());
        let samples = samples.clamp(8, 1 << 16);
        let points: Vec<Point> = (0..=samples)
            .map(|i| {
                let t = f64::from(i) / f64::from(samples) * std::f64::consts::TAU;
                Point::new(
                    az::saturating_cast((geom.cx + a * t.cos()).round()),
                    az::saturating_cast((geom.cy + b * t.sin()).round()),
                )
            })
            .collect();
        self.polyline(coverage, &points);
    }
}

/// Center and radii of the ellipse inscribed in a pixel rect, in pixel-center coordinates.
struct EllipseGeometry {
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
}
impl EllipseGeometry {
    fn from_bounds(bounds: Rect) -> Self {
        let rx = (f64::from(bounds.width) - 1.0) / 2.0;
        let ry = (f64::from(bounds.height) - 1.0) / 2.0;
        Self {
            cx: bounds.left() as f64 + rx,
            cy: bounds.top() as f64 + ry,
            rx,
            ry,
        }
    }
}

/// Set full coverage on every pixel of `rect`.
pub fn fill_rect(coverage: &mut Coverage, rect: Rect) {
    let area = rect.intersect(&coverage.rect());
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            coverage.max_at(x, y, 255);
        }
    }
}

/// Set full coverage on every pixel whose center lies inside the ellipse inscribed in `bounds`.
pub fn fill_ellipse(coverage: &mut Coverage, bounds: Rect) {
    if bounds.is_empty() {
        return;
    }
    let geom = EllipseGeometry::from_bounds(bounds);
    // Measured to the outer edge of the boundary pixels.
    let (rx, ry) = (geom.rx + 0.5, geom.ry + 0.5);
    let rows = bounds.intersect(&Rect::new(
        bounds.x,
        coverage.rect().y,
        bounds.width,
        coverage.rect().height,
    ));
    for y in rows.top()..rows.bottom() {
        let dy = (y as f64 - geom.cy) / ry;
        let t = 1.0 - dy * dy;
        if t < 0.0 {
            continue;
        }
        let half = rx * t.sqrt();
        let left: i64 = az::saturating_cast((geom.cx - half).ceil());
        let right: i64 = az::saturating_cast((geom.cx + half).floor());
        let span = Rect::from_edges(left, y, right + 1, y + 1).intersect(&coverage.rect());
        for x in span.left()..span.right() {
            coverage.max_at(x, y, 255);
        }
    }
}

/// Liang-Barsky clip of a segment against `window`. Endpoints are rounded back onto the pixel grid.
fn clip_segment(a: Point, b: Point, window: Rect) -> Option<(Point, Point)> {
    if window.is_empty() {
        return None;
    }
    if window.contains(a.x.into(), a.y.into()) && window.contains(b.x.into(), b.y.into()) {
        return Some((a, b));
    }
    let (x0, y0) = (f64::from(a.x), f64::from(a.y));
    let (dx, dy) = (f64::from(b.x) - x0, f64::from(b.y) - y0);
    let (min_x, max_x) = (window.left() as f64, (window.right() - 1) as f64);
    let (min_y, max_y) = (window.top() as f64, (window.bottom() - 1) as f64);
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;
    for (p, q) in [
        (-dx, x0 - min_x),
        (dx, max_x - x0),
        (-dy, y0 - min_y),
        (dy, max_y - y0),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    let at = |t: f64| {
        Point::new(
            az::saturating_cast((x0 + dx * t).round()),
            az::saturating_cast((y0 + dy * t).round()),
        )
    };
    Some((at(t0), at(t1)))
}

#[cfg(test)]
mod test {
    use super::{disk_half_width, fill_ellipse, fill_rect, Brush, Coverage};
    use crate::util::{Point, Rect};

    fn count(coverage: &Coverage) -> usize {
        let r = coverage.rect();
        (r.top()..r.bottom())
            .flat_map(|y| (r.left()..r.right()).map(move |x| (x, y)))
            .filter(|&(x, y)| coverage.get(x, y) != 0)
            .count()
    }
    #[test]
    fn unit_brush_is_one_pixel() {
        let mut cov = Coverage::new(Rect::sized(5, 5));
        Brush::round(1).polyline(&mut cov, &[Point::new(2, 2)]);
        assert_eq!(count(&cov), 1);
        assert_eq!(cov.get(2, 2), 255);
        // Width zero behaves like one.
        let mut cov = Coverage::new(Rect::sized(5, 5));
        Brush::round(0).stamp(&mut cov, Point::new(0, 0));
        assert_eq!(count(&cov), 1);
    }
    #[test]
    fn bresenham_diagonal() {
        let mut cov = Coverage::new(Rect::sized(8, 8));
        Brush::round(1).line(&mut cov, Point::new(0, 0), Point::new(7, 7));
        assert_eq!(count(&cov), 8);
        assert!((0..8).all(|i| cov.get(i, i) == 255));
    }
    #[test]
    fn far_line_is_clipped() {
        let mut cov = Coverage::new(Rect::sized(10, 10));
        Brush::round(3).line(
            &mut cov,
            Point::new(-1_000_000_000, 5),
            Point::new(1_000_000_000, 5),
        );
        // Whole rows 4..=6 are covered.
        assert_eq!(count(&cov), 30);
    }
    #[test]
    fn rect_outline_is_hollow() {
        let mut cov = Coverage::new(Rect::sized(10, 10));
        Brush::round(1).rect_outline(&mut cov, Rect::new(2, 2, 5, 4));
        assert_eq!(cov.get(2, 2), 255);
        assert_eq!(cov.get(6, 5), 255);
        assert_eq!(cov.get(4, 3), 0);
        // Perimeter of a 5x4 rect.
        assert_eq!(count(&cov), 14);
    }
    #[test]
    fn filled_ellipse_within_bounds() {
        let bounds = Rect::new(1, 1, 7, 5);
        let mut cov = Coverage::new(Rect::sized(10, 10));
        fill_ellipse(&mut cov, bounds);
        assert_eq!(cov.ink_bounds(), bounds);
        // Corners of the bounding box stay empty.
        assert_eq!(cov.get(1, 1), 0);
        assert_eq!(cov.get(4, 3), 255);
    }
    #[test]
    fn ellipse_outline_touches_extremes() {
        let bounds = Rect::new(0, 0, 9, 9);
        let mut cov = Coverage::new(Rect::sized(9, 9));
        Brush::round(1).ellipse_outline(&mut cov, bounds);
        assert_eq!(cov.get(4, 0), 255);
        assert_eq!(cov.get(0, 4), 255);
        assert_eq!(cov.get(8, 4), 255);
        assert_eq!(cov.get(4, 4), 0);
    }
    #[test]
    fn dilate_grows() {
        let mut cov = Coverage::new(Rect::new(3, 3, 1, 1));
        fill_rect(&mut cov, Rect::new(0, 0, 10, 10));
        let grown = cov.dilate(2);
        assert_eq!(grown.rect(), Rect::new(1, 1, 5, 5));
        assert_eq!(grown.get(3, 1), 255);
        assert_eq!(grown.get(1, 3), 255);
        assert_eq!(grown.get(5, 5), 0);
        assert_eq!(grown.ink_bounds(), Rect::new(1, 1, 5, 5));
    }
    #[test]
    fn wide_brush_stays_in_mask() {
        let mut cov = Coverage::new(Rect::new(-2, 3, 4, 2));
        Brush::round(u32::MAX).stamp(&mut cov, Point::new(1_000, -1_000));
        assert_eq!(count(&cov), 8);
        // Disk rows are exact.
        let mut cov = Coverage::new(Rect::sized(5, 5));
        Brush::round(5).stamp(&mut cov, Point::new(2, 2));
        assert_eq!(count(&cov), 21);
        assert_eq!(cov.get(0, 0), 0);
        assert_eq!(cov.get(0, 1), 255);
    }
    #[test]
    fn large_disk_rows() {
        assert_eq!(disk_half_width(40_000, 0), Some(40_000));
        assert_eq!(disk_half_width(40_000, -40_000), Some(141));
        assert_eq!(disk_half_width(40_000, 40_001), None);
        assert_eq!(disk_half_width(u32::MAX, 0), Some(i64::from(u32::MAX)));
        assert_eq!(disk_half_width(2, 2), Some(1));
    }
}
