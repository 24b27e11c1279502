//! Dirty-region tracking for the ring-addressed offscreen buffer.
//!
//! The offscreen buffer is a fixed grid of tile slots. World tile `(x, y)` is
//! stored in slot `(x mod width, y mod height)`, so moving the camera never
//! shifts pixels: the anchor slides and the slots vacated on one edge are
//! reused for the tiles exposed on the opposite edge.
//!
//! [`DirtyRegionTracker::move_to`] turns an anchor change into the set of
//! world tile rectangles that must be redrawn. [`RingGrid::split`] cuts a
//! world rectangle at the ring seam into pieces that are contiguous in
//! buffer-local coordinates.

use tilescroll_types::geometry::{Point, Rect, Size};

/// Ring addressing for a grid of `width x height` slots.
///
/// Used both in tile units (slot lookup for redraws) and in pixel units
/// (reading the visible window back out of the buffer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingGrid {
    size: Size,
}

/// A world rectangle and the buffer-local rectangle it is stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RingPiece {
    pub world: Rect,
    pub local: Rect,
}

impl RingGrid {
    pub fn new(size: Size) -> Self {
        Self { size }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Slot holding world position `p`.
    pub fn slot(&self, p: Point) -> Point {
        Point::new(
            p.x.rem_euclid(self.size.w as i32),
            p.y.rem_euclid(self.size.h as i32),
        )
    }

    /// Cut `world` (no larger than the grid) into at most four pieces that do
    /// not cross the ring seam.
    pub fn split(&self, world: Rect) -> Vec<RingPiece> {
        debug_assert!(world.w <= self.size.w && world.h <= self.size.h);
        let xs = split_axis(world.x, world.w, self.size.w);
        let ys = split_axis(world.y, world.h, self.size.h);
        let mut pieces = Vec::with_capacity(xs.len() * ys.len());
        for &(wy, ly, h) in &ys {
            for &(wx, lx, w) in &xs {
                pieces.push(RingPiece {
                    world: Rect::new(wx, wy, w, h),
                    local: Rect::new(lx, ly, w, h),
                });
            }
        }
        pieces
    }
}

/// Split one axis span into `(world_start, local_start, len)` runs.
fn split_axis(start: i32, len: u32, ring: u32) -> Vec<(i32, i32, u32)> {
    if len == 0 {
        return Vec::new();
    }
    let local = start.rem_euclid(ring as i32);
    let first = (ring - local as u32).min(len);
    let mut runs = vec![(start, local, first)];
    if first < len {
        runs.push((start + first as i32, 0, len - first));
    }
    runs
}

/// Tiles to redraw after an anchor change, in world tile coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirtyRegion {
    pub rects: Vec<Rect>,
    /// The whole buffer window is stale.
    pub full: bool,
}

impl DirtyRegion {
    pub fn empty() -> Self {
        Self::default()
    }

    fn full(window: Rect) -> Self {
        Self {
            rects: vec![window],
            full: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Number of tile cells covered.
    pub fn cell_count(&self) -> u64 {
        self.rects.iter().map(Rect::area).sum()
    }

    /// Dirty rectangles cut at the ring seam.
    pub fn pieces(&self, grid: &RingGrid) -> Vec<RingPiece> {
        self.rects.iter().flat_map(|r| grid.split(*r)).collect()
    }
}

/// Tracks the buffer anchor and reports what a move invalidates.
#[derive(Debug, Clone)]
pub struct DirtyRegionTracker {
    grid: RingGrid,
    anchor: Option<Point>,
}

impl DirtyRegionTracker {
    /// A tracker for a buffer of `extent` tiles. The first move is always a
    /// full redraw.
    pub fn new(extent: Size) -> Self {
        Self {
            grid: RingGrid::new(extent),
            anchor: None,
        }
    }

    pub fn grid(&self) -> &RingGrid {
        &self.grid
    }

    pub fn extent(&self) -> Size {
        self.grid.size()
    }

    /// World tile coordinate of the buffer's top-left slot.
    pub fn anchor(&self) -> Option<Point> {
        self.anchor
    }

    /// World tile rectangle currently held by the buffer.
    pub fn window(&self) -> Option<Rect> {
        self.anchor.map(|a| self.window_at(a))
    }

    fn window_at(&self, anchor: Point) -> Rect {
        let ext = self.grid.size();
        Rect::new(anchor.x, anchor.y, ext.w, ext.h)
    }

    /// Force the next [`move_to`](Self::move_to) to redraw everything.
    pub fn invalidate(&mut self) {
        self.anchor = None;
    }

    /// Move the anchor and return the newly exposed tiles.
    ///
    /// A move of at least the buffer extent along either axis (or the first
    /// move after [`invalidate`](Self::invalidate)) marks the whole window
    /// dirty. Otherwise the exposed columns span the full window height and
    /// the exposed rows exclude those columns, so no cell is reported twice.
    pub fn move_to(&mut self, anchor: Point) -> DirtyRegion {
        let window = self.window_at(anchor);
        let Some(old) = self.anchor.replace(anchor) else {
            return DirtyRegion::full(window);
        };
        let dx = anchor.x.saturating_sub(old.x);
        let dy = anchor.y.saturating_sub(old.y);
        if dx == 0 && dy == 0 {
            return DirtyRegion::empty();
        }
        let ext = self.grid.size();
        if dx.unsigned_abs() >= ext.w || dy.unsigned_abs() >= ext.h {
            log::debug!("scrolling too quickly ({dx}, {dy}); redraw forced");
            return DirtyRegion::full(window);
        }

        let mut rects = Vec::with_capacity(2);
        let adx = dx.unsigned_abs();
        let ady = dy.unsigned_abs();

        // Columns: full window height.
        let (mut col_x, mut col_w) = (window.x, window.w);
        if dx > 0 {
            rects.push(Rect::new(window.right() - dx, window.y, adx, window.h));
            col_w -= adx;
        } else if dx < 0 {
            rects.push(Rect::new(window.x, window.y, adx, window.h));
            col_x += adx as i32;
            col_w -= adx;
        }

        // Rows: only the columns not already covered above.
        if dy > 0 {
            rects.push(Rect::new(col_x, window.bottom() - dy, col_w, ady));
        } else if dy < 0 {
            rects.push(Rect::new(col_x, window.y, col_w, ady));
        }

        DirtyRegion { rects, full: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn cells(rects: &[Rect]) -> Vec<Point> {
        let mut v: Vec<Point> = rects.iter().flat_map(|r| r.points()).collect();
        v.sort_by_key(|p| (p.y, p.x));
        v
    }

    #[test]
    fn first_move_is_full() {
        let mut t = DirtyRegionTracker::new(Size::new(4, 3));
        let r = t.move_to(Point::new(2, 5));
        assert!(r.full);
        assert_eq!(r.rects, vec![Rect::new(2, 5, 4, 3)]);
    }

    #[test]
    fn zero_delta_is_empty() {
        let mut t = DirtyRegionTracker::new(Size::new(4, 3));
        t.move_to(Point::new(0, 0));
        assert!(t.move_to(Point::new(0, 0)).is_empty());
    }

    #[test]
    fn right_edge_column() {
        let mut t = DirtyRegionTracker::new(Size::new(4, 3));
        t.move_to(Point::new(0, 0));
        let r = t.move_to(Point::new(1, 0));
        assert_eq!(r.rects, vec![Rect::new(4, 0, 1, 3)]);
    }

    #[test]
    fn left_edge_column() {
        let mut t = DirtyRegionTracker::new(Size::new(4, 3));
        t.move_to(Point::new(2, 2));
        let r = t.move_to(Point::new(1, 2));
        assert_eq!(r.rects, vec![Rect::new(1, 2, 1, 3)]);
    }

    #[test]
    fn top_and_bottom_rows() {
        let mut t = DirtyRegionTracker::new(Size::new(4, 3));
        t.move_to(Point::new(0, 0));
        assert_eq!(t.move_to(Point::new(0, 1)).rects, vec![Rect::new(0, 3, 4, 1)]);
        assert_eq!(t.move_to(Point::new(0, 0)).rects, vec![Rect::new(0, 0, 4, 1)]);
    }

    #[test]
    fn diagonal_reports_corner_once() {
        let mut t = DirtyRegionTracker::new(Size::new(4, 3));
        t.move_to(Point::new(0, 0));
        let r = t.move_to(Point::new(1, 1));
        assert_eq!(
            r.rects,
            vec![Rect::new(4, 1, 1, 3), Rect::new(1, 3, 3, 1)]
        );
        assert_eq!(r.cell_count(), 6);
    }

    #[test]
    fn teleport_is_full() {
        let mut t = DirtyRegionTracker::new(Size::new(4, 3));
        t.move_to(Point::new(0, 0));
        let r = t.move_to(Point::new(0, 3));
        assert!(r.full);
        assert_eq!(r.cell_count(), 12);
    }

    #[test]
    fn invalidate_forces_full() {
        let mut t = DirtyRegionTracker::new(Size::new(4, 3));
        t.move_to(Point::new(0, 0));
        t.invalidate();
        assert!(t.move_to(Point::new(0, 0)).full);
    }

    #[test]
    fn split_without_seam() {
        let grid = RingGrid::new(Size::new(4, 4));
        let pieces = grid.split(Rect::new(4, 8, 2, 2));
        assert_eq!(
            pieces,
            vec![RingPiece {
                world: Rect::new(4, 8, 2, 2),
                local: Rect::new(0, 0, 2, 2)
            }]
        );
    }

    #[test]
    fn split_across_seam() {
        let grid = RingGrid::new(Size::new(4, 4));
        let pieces = grid.split(Rect::new(3, -1, 2, 2));
        assert_eq!(pieces.len(), 4);
        assert_eq!(pieces[0].local, Rect::new(3, 3, 1, 1));
        assert_eq!(pieces[0].world, Rect::new(3, -1, 1, 1));
        assert_eq!(pieces[3].local, Rect::new(0, 0, 1, 1));
        assert_eq!(pieces[3].world, Rect::new(4, 0, 1, 1));
    }

    #[test]
    fn slot_negative_wraps() {
        let grid = RingGrid::new(Size::new(4, 3));
        assert_eq!(grid.slot(Point::new(-1, -1)), Point::new(3, 2));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn small_moves_expose_exactly_the_new_cells(
                w in 2u32..8,
                h in 2u32..8,
                start in (-20i32..20, -20i32..20),
                moves in proptest::collection::vec((-7i32..8, -7i32..8), 1..12),
            ) {
                let mut t = DirtyRegionTracker::new(Size::new(w, h));
                let mut anchor = Point::new(start.0, start.1);
                t.move_to(anchor);
                for (mx, my) in moves {
                    let old: HashSet<Point> =
                        Rect::new(anchor.x, anchor.y, w, h).points().collect();
                    anchor = Point::new(anchor.x + mx, anchor.y + my);
                    let region = t.move_to(anchor);
                    let new_window = Rect::new(anchor.x, anchor.y, w, h);
                    let dirty = cells(&region.rects);

                    let unique: HashSet<Point> = dirty.iter().copied().collect();
                    prop_assert_eq!(unique.len(), dirty.len(), "cells reported twice");

                    if region.full {
                        prop_assert!(mx.unsigned_abs() >= w || my.unsigned_abs() >= h);
                        prop_assert_eq!(dirty.len() as u64, new_window.area());
                    } else {
                        let expected: HashSet<Point> =
                            new_window.points().filter(|p| !old.contains(p)).collect();
                        prop_assert_eq!(unique, expected);
                    }
                }
            }

            #[test]
            fn split_pieces_cover_rect_and_stay_in_grid(
                w in 1u32..10,
                h in 1u32..10,
                x in -50i32..50,
                y in -50i32..50,
                rw in 1u32..10,
                rh in 1u32..10,
            ) {
                let grid = RingGrid::new(Size::new(w, h));
                let rect = Rect::new(x, y, rw.min(w), rh.min(h));
                let pieces = grid.split(rect);
                let bounds = Rect::from_size(grid.size());
                let mut covered = 0u64;
                for piece in &pieces {
                    prop_assert!(bounds.contains_rect(&piece.local));
                    prop_assert_eq!(grid.slot(piece.world.origin()), piece.local.origin());
                    covered += piece.world.area();
                }
                prop_assert_eq!(covered, rect.area());
            }
        }
    }

    #[test]
    fn extreme_jump_is_full() {
        let mut t = DirtyRegionTracker::new(Size::new(4, 3));
        t.move_to(Point::new(i32::MIN + 1, 0));
        let r = t.move_to(Point::new(i32::MAX - 10, 0));
        assert!(r.full);
    }
}
