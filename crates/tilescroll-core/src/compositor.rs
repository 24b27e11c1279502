//! Drawing tiles into the offscreen buffer.
//!
//! Every dirty cell is first cleared, then drawn bottom-up: each visible
//! layer's tile followed by that layer's shapes. A cell where every layer is
//! empty gets the adapter's default tile instead. Each `(x, y, layer)` is
//! fetched from the adapter exactly once per pass.

use tilescroll_types::color::Color;
use tilescroll_types::error::Result;
use tilescroll_types::geometry::{Point, Rect, Size};
use tilescroll_types::pixmap::{Pixmap, with_clip};

use crate::animation::AnimationTracker;
use crate::data::{DefaultTile, MapData, Shape, ShapeStyle, Tile, TileCoord, TileImage};
use crate::dirty::{RingGrid, RingPiece};

/// Draws map cells into a pixmap.
#[derive(Debug, Clone, Copy)]
pub struct TileCompositor {
    tile: Size,
    clear: Color,
}

impl TileCompositor {
    /// `clear` fills dirty cells before tiles are drawn into them.
    pub fn new(tile: Size, clear: Color) -> Self {
        Self { tile, clear }
    }

    pub fn tile_size(&self) -> Size {
        self.tile
    }

    /// Pixel rectangle of a world tile rectangle.
    pub fn tiles_to_pixels(&self, tiles: Rect) -> Rect {
        Rect::new(
            tiles.x * self.tile.w as i32,
            tiles.y * self.tile.h as i32,
            tiles.w * self.tile.w,
            tiles.h * self.tile.h,
        )
    }

    /// Pixel origin of a tile position.
    pub fn cell_origin(&self, cell: Point) -> Point {
        Point::new(cell.x * self.tile.w as i32, cell.y * self.tile.h as i32)
    }

    /// Fetch the image at `coord`, resolving animations to their current
    /// frame.
    pub fn fetch<A: MapData>(
        data: &A,
        animations: &mut AnimationTracker<A::Pixmap>,
        coord: TileCoord,
    ) -> Option<TileImage<A::Pixmap>> {
        match data.tile(coord.x, coord.y, coord.layer)? {
            Tile::Static(image) => Some(image),
            Tile::Animated(sequence) => Some(animations.resolve(coord, &sequence)),
        }
    }

    /// Redraw the world tile rectangles `rects` into the ring buffer.
    ///
    /// Returns the number of cells redrawn.
    pub fn redraw<A: MapData>(
        &self,
        buffer: &mut A::Pixmap,
        grid: &RingGrid,
        data: &A,
        animations: &mut AnimationTracker<A::Pixmap>,
        rects: &[Rect],
    ) -> Result<usize> {
        let layers = data.visible_layers();
        let fallback = data.default_tile();
        let mut cells = 0;
        for rect in rects {
            for piece in grid.split(*rect) {
                cells += self.redraw_piece(buffer, &piece, data, layers, &fallback, animations)?;
            }
        }
        Ok(cells)
    }

    fn redraw_piece<A: MapData>(
        &self,
        buffer: &mut A::Pixmap,
        piece: &RingPiece,
        data: &A,
        layers: &[u32],
        fallback: &DefaultTile<A::Pixmap>,
        animations: &mut AnimationTracker<A::Pixmap>,
    ) -> Result<usize> {
        buffer.fill(self.tiles_to_pixels(piece.local), self.clear)?;
        let shapes = data.shapes(self.tiles_to_pixels(piece.world));
        let mut cells = 0;
        for cell in piece.world.points() {
            let slot = Point::new(
                piece.local.x + (cell.x - piece.world.x),
                piece.local.y + (cell.y - piece.world.y),
            );
            let dst = self.cell_origin(slot);
            self.draw_cell(buffer, data, layers, fallback, animations, cell, dst, &shapes)?;
            cells += 1;
        }
        Ok(cells)
    }

    /// Clear and redraw individual cells (used for animation frame changes).
    pub fn redraw_cells<A: MapData>(
        &self,
        buffer: &mut A::Pixmap,
        grid: &RingGrid,
        data: &A,
        animations: &mut AnimationTracker<A::Pixmap>,
        cells: &[Point],
    ) -> Result<()> {
        let layers = data.visible_layers();
        let fallback = data.default_tile();
        for &cell in cells {
            let dst = self.cell_origin(grid.slot(cell));
            buffer.fill(Rect::new(dst.x, dst.y, self.tile.w, self.tile.h), self.clear)?;
            let shapes = data.shapes(self.tiles_to_pixels(Rect::new(cell.x, cell.y, 1, 1)));
            self.draw_cell(buffer, data, layers, &fallback, animations, cell, dst, &shapes)?;
        }
        Ok(())
    }

    /// Draw every layer of one cell at pixel `dst` of `target`.
    #[allow(clippy::too_many_arguments)]
    fn draw_cell<A: MapData>(
        &self,
        target: &mut A::Pixmap,
        data: &A,
        layers: &[u32],
        fallback: &DefaultTile<A::Pixmap>,
        animations: &mut AnimationTracker<A::Pixmap>,
        cell: Point,
        dst: Point,
        shapes: &[Shape],
    ) -> Result<()> {
        let column: Vec<(u32, TileImage<A::Pixmap>)> = layers
            .iter()
            .filter_map(|&layer| {
                Self::fetch(data, animations, TileCoord::new(cell.x, cell.y, layer))
                    .map(|image| (layer, image))
            })
            .collect();

        if column.is_empty() {
            match fallback {
                DefaultTile::Clear => {}
                DefaultTile::Fill(color) => {
                    target.fill(Rect::new(dst.x, dst.y, self.tile.w, self.tile.h), *color)?;
                }
                DefaultTile::Image(image) => self.draw_image(target, image, dst)?,
            }
        }

        let mut tiles = column.iter().peekable();
        for &layer in layers {
            if let Some((_, image)) = tiles.next_if(|(l, _)| *l == layer) {
                self.draw_image(target, image, dst)?;
            }
            self.draw_shapes(target, shapes, layer, cell, dst)?;
        }
        Ok(())
    }

    /// Draw one layer of a cell (tile, then that layer's shapes). Used to
    /// repaint tiles over foreign surfaces.
    pub fn draw_layer<P: Pixmap>(
        &self,
        target: &mut P,
        image: Option<&TileImage<P>>,
        layer: u32,
        cell: Point,
        dst: Point,
        shapes: &[Shape],
    ) -> Result<()> {
        if let Some(image) = image {
            self.draw_image(target, image, dst)?;
        }
        self.draw_shapes(target, shapes, layer, cell, dst)
    }

    /// Blit a tile image at `dst`, cropped to one tile.
    pub fn draw_image<P: Pixmap>(
        &self,
        target: &mut P,
        image: &TileImage<P>,
        dst: Point,
    ) -> Result<()> {
        let src = Rect::new(
            image.src.x,
            image.src.y,
            image.src.w.min(self.tile.w),
            image.src.h.min(self.tile.h),
        );
        target.blit(image.tileset.image(), src, dst)
    }

    /// Draw the part of each `layer` shape that falls inside `cell`.
    fn draw_shapes<P: Pixmap>(
        &self,
        target: &mut P,
        shapes: &[Shape],
        layer: u32,
        cell: Point,
        dst: Point,
    ) -> Result<()> {
        let cell_px = self.tiles_to_pixels(Rect::new(cell.x, cell.y, 1, 1));
        let dx = dst.x - cell_px.x;
        let dy = dst.y - cell_px.y;
        for shape in shapes {
            if shape.layer != layer || !shape.rect.intersects(&cell_px) {
                continue;
            }
            let rect = shape.rect.translate(dx, dy);
            with_clip(target, cell_px.translate(dx, dy), |t| match shape.style {
                ShapeStyle::Fill(color) => t.fill(rect, color),
                ShapeStyle::Outline { color, width } => t.stroke_rect(rect, width, color),
            })?;
        }
        Ok(())
    }
}
