//! Geometric value types used throughout layout.
//!
//! All types are immutable: arithmetic returns new values and never mutates
//! in place. Components are `f64`; infinity is a meaningful measure input
//! (unbounded available space), NaN is always a caller error and is rejected
//! at the layout entry points.

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a size from a width and height.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// An unbounded size, used as the available size for unconstrained measurement.
    pub fn unbounded() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY)
    }

    /// Return this size with a different width.
    pub fn with_width(self, width: f64) -> Self {
        Self { width, ..self }
    }

    /// Return this size with a different height.
    pub fn with_height(self, height: f64) -> Self {
        Self { height, ..self }
    }

    /// Shrink by a thickness on all sides, clamping at zero.
    pub fn deflate(self, thickness: Thickness) -> Self {
        Self::new(
            (self.width - thickness.horizontal()).max(0.0),
            (self.height - thickness.vertical()).max(0.0),
        )
    }

    /// Grow by a thickness on all sides.
    pub fn inflate(self, thickness: Thickness) -> Self {
        Self::new(
            self.width + thickness.horizontal(),
            self.height + thickness.vertical(),
        )
    }

    /// Clamp each component to be no larger than `constraint`'s.
    pub fn constrain(self, constraint: Size) -> Self {
        Self::new(
            self.width.min(constraint.width),
            self.height.min(constraint.height),
        )
    }

    /// Whether either component is NaN.
    pub fn has_nan(self) -> bool {
        self.width.is_nan() || self.height.is_nan()
    }
}

/// An x/y position.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a point from coordinates.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Return this point shifted by an offset.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Per-side spacing around a node (margins).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Thickness {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Thickness {
    /// Create a thickness with independent sides.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self { left, top, right, bottom }
    }

    /// Create a uniform thickness.
    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// Create a thickness symmetric on each axis.
    pub fn symmetric(horizontal: f64, vertical: f64) -> Self {
        Self::new(horizontal, vertical, horizontal, vertical)
    }

    /// Total horizontal thickness.
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    /// Total vertical thickness.
    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// An axis-aligned rectangle: an origin plus a size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a rect from an origin and size.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Create a rect at the origin with the given size.
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Create a rect from an origin point and size.
    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// The origin of the rect.
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The size of the rect.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// The right edge (x + width).
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// The bottom edge (y + height).
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Return this rect shifted by an offset.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Check if a point is inside the rect.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    /// Compute intersection with another rect.
    pub fn intersect(&self, other: &Rect) -> Option<Rect> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());
        if x2 >= x1 && y2 >= y1 {
            Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
        } else {
            None
        }
    }

    /// Compute union (bounding box) with another rect.
    pub fn union(&self, other: &Rect) -> Rect {
        let x1 = self.x.min(other.x);
        let y1 = self.y.min(other.y);
        let x2 = self.right().max(other.right());
        let y2 = self.bottom().max(other.bottom());
        Rect::new(x1, y1, x2 - x1, y2 - y1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_deflate_clamps_at_zero() {
        let size = Size::new(10.0, 10.0);
        let deflated = size.deflate(Thickness::uniform(8.0));
        assert_eq!(deflated, Size::new(0.0, 0.0));
    }

    #[test]
    fn test_size_inflate_deflate_round_trip() {
        let size = Size::new(100.0, 50.0);
        let margin = Thickness::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(size.inflate(margin).deflate(margin), size);
    }

    #[test]
    fn test_size_constrain() {
        let size = Size::new(150.0, 30.0);
        let constrained = size.constrain(Size::new(100.0, 100.0));
        assert_eq!(constrained, Size::new(100.0, 30.0));
    }

    #[test]
    fn test_thickness_totals() {
        let t = Thickness::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(t.horizontal(), 4.0);
        assert_eq!(t.vertical(), 6.0);
        assert_eq!(Thickness::symmetric(5.0, 7.0).horizontal(), 10.0);
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(10.0, 20.0, 100.0, 50.0);
        assert!(rect.contains(50.0, 40.0));
        assert!(!rect.contains(5.0, 40.0));
        assert!(!rect.contains(50.0, 100.0));
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(50.0, 50.0, 100.0, 100.0);
        let intersection = a.intersect(&b).unwrap();
        assert!((intersection.x - 50.0).abs() < 0.001);
        assert!((intersection.y - 50.0).abs() < 0.001);
        assert!((intersection.width - 50.0).abs() < 0.001);
        assert!((intersection.height - 50.0).abs() < 0.001);
        assert!(a.intersect(&Rect::new(200.0, 200.0, 10.0, 10.0)).is_none());
    }

    #[test]
    fn test_rect_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(20.0, 5.0, 10.0, 10.0);
        let union = a.union(&b);
        assert_eq!(union, Rect::new(0.0, 0.0, 30.0, 15.0));
    }
}
