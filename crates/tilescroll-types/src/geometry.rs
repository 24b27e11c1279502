//! Integer points, sizes, and axis-aligned rectangles.
//!
//! The same [`Rect`] type is used for pixel rectangles and for rectangles of
//! tile cells; which unit applies is stated by the API that takes or returns
//! it.

/// An integer point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub const fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub const fn is_empty(self) -> bool {
        self.w == 0 || self.h == 0
    }
}

/// An axis-aligned rectangle with a signed origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    pub const fn from_size(size: Size) -> Self {
        Self::new(0, 0, size.w, size.h)
    }

    /// Exclusive right edge.
    pub const fn right(&self) -> i32 {
        self.x.saturating_add_unsigned(self.w)
    }

    /// Exclusive bottom edge.
    pub const fn bottom(&self) -> i32 {
        self.y.saturating_add_unsigned(self.h)
    }

    pub const fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub const fn size(&self) -> Size {
        Size::new(self.w, self.h)
    }

    pub const fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.x && p.x < self.right() && p.y >= self.y && p.y < self.bottom()
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    /// Overlap of two rectangles, or `None` if they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right > x && bottom > y {
            Some(Rect::new(x, y, (right - x) as u32, (bottom - y) as u32))
        } else {
            None
        }
    }

    pub const fn translate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x.saturating_add(dx), self.y.saturating_add(dy), self.w, self.h)
    }

    /// The parts of `self` not covered by `other`, as up to four disjoint
    /// rectangles.
    pub fn subtract(&self, other: &Rect) -> Vec<Rect> {
        let Some(hole) = self.intersection(other) else {
            return vec![*self];
        };
        let pieces = [
            // Above and below the hole, full width.
            Rect::new(self.x, self.y, self.w, (hole.y - self.y) as u32),
            Rect::new(self.x, hole.bottom(), self.w, (self.bottom() - hole.bottom()) as u32),
            // Either side, hole height.
            Rect::new(self.x, hole.y, (hole.x - self.x) as u32, hole.h),
            Rect::new(hole.right(), hole.y, (self.right() - hole.right()) as u32, hole.h),
        ];
        pieces.into_iter().filter(|r| !r.is_empty()).collect()
    }

    /// Move `self` so it lies inside `bounds`.
    ///
    /// If `self` is larger than `bounds` along an axis it is centred on
    /// `bounds` along that axis.
    pub fn clamp_within(&self, bounds: &Rect) -> Rect {
        let x = if self.w >= bounds.w {
            bounds.x + (bounds.w as i32 - self.w as i32) / 2
        } else {
            self.x.clamp(bounds.x, bounds.right() - self.w as i32)
        };
        let y = if self.h >= bounds.h {
            bounds.y + (bounds.h as i32 - self.h as i32) / 2
        } else {
            self.y.clamp(bounds.y, bounds.bottom() - self.h as i32)
        };
        Rect::new(x, y, self.w, self.h)
    }

    /// Iterate every integer point in the rectangle, row-major.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let (x0, x1) = (self.x, self.right());
        (self.y..self.bottom()).flat_map(move |y| (x0..x1).map(move |x| Point::new(x, y)))
    }
}
