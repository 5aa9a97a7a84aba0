//! Utility types, used throughout the crate.
//! Integer geometry in buffer space: +X right, +Y down, origin at the top-left pixel.

/// A pixel coordinate. May lie outside of any buffer, consumers clip.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}
impl Point {
    pub const ORIGIN: Self = Self { x: 0, y: 0 };
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
impl From<[i32; 2]> for Point {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle of whole pixels. `x..x+width`, `y..y+height`.
///
/// A rectangle with zero width or height is empty, but keeps its position.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}
impl Rect {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
    /// Rectangle of the given size at the origin.
    #[must_use]
    pub const fn sized(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }
    /// Smallest rectangle containing both corner pixels, in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
        let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
        Self::from_edges(
            i64::from(x0),
            i64::from(y0),
            i64::from(x1) + 1,
            i64::from(y1) + 1,
        )
    }
    /// Build from exclusive edges, saturating into range. Inverted edges produce an empty rect.
    #[must_use]
    pub fn from_edges(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        let clamp = |v: i64| -> i32 { az::saturating_cast(v) };
        let left = clamp(left);
        let top = clamp(top);
        let width = right.saturating_sub(i64::from(left)).max(0);
        let height = bottom.saturating_sub(i64::from(top)).max(0);
        Self {
            x: left,
            y: top,
            width: az::saturating_cast(width),
            height: az::saturating_cast(height),
        }
    }
    #[must_use]
    pub fn left(&self) -> i64 {
        i64::from(self.x)
    }
    #[must_use]
    pub fn top(&self) -> i64 {
        i64::from(self.y)
    }
    /// Exclusive right edge.
    #[must_use]
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }
    /// Exclusive bottom edge.
    #[must_use]
    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }
    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
    #[must_use]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.left() && x < self.right() && y >= self.top() && y < self.bottom()
    }
    /// Overlapping area of both rects. Empty if they do not touch.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let left = self.left().max(other.left());
        let top = self.top().max(other.top());
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Self::from_edges(left, top, right.max(left), bottom.max(top))
    }
    /// Smallest rect covering both. Empty rects do not contribute.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        match (self.is_empty(), other.is_empty()) {
            (true, _) => *other,
            (_, true) => *self,
            _ => Self::from_edges(
                self.left().min(other.left()),
                self.top().min(other.top()),
                self.right().max(other.right()),
                self.bottom().max(other.bottom()),
            ),
        }
    }
    /// Grow outward on every side.
    #[must_use]
    pub fn inflate(&self, by: u32) -> Self {
        let by = i64::from(by);
        Self::from_edges(
            self.left() - by,
            self.top() - by,
            self.right() + by,
            self.bottom() + by,
        )
    }
    #[must_use]
    pub fn translate(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            ..*self
        }
    }
}
