//! Foreign surfaces and the tiles repainted over them.
//!
//! Surfaces are drawn after the buffer has been copied out. Where a surface
//! overlaps a cell that has tiles (or shapes) on a higher layer, those layers
//! are repainted so they cover the surface. A layer is repainted only inside
//! the area covered by surfaces below it, each pixel at most once, so
//! translucent tiles elsewhere in the cell keep the single blend they got in
//! the buffer.

use std::collections::HashMap;

use tilescroll_types::error::Result;
use tilescroll_types::geometry::{Point, Rect};
use tilescroll_types::pixmap::Pixmap;

use tilescroll_types::pixmap::with_clip;

use super::BufferedRenderer;
use crate::compositor::TileCompositor;
use crate::data::{MapData, Shape, TileCoord, TileImage};

/// A caller-owned image drawn with the map at a layer.
pub struct ForeignSurface<'a, P> {
    pub image: &'a P,
    /// Destination in view pixels. Scaled if its size differs from the image.
    pub rect: Rect,
    pub layer: u32,
}

impl<'a, P> ForeignSurface<'a, P> {
    pub fn new(image: &'a P, rect: Rect, layer: u32) -> Self {
        Self { image, rect, layer }
    }
}

enum Op<'s, 'a, P> {
    Surface(&'s ForeignSurface<'a, P>),
    Tile {
        cell: Point,
        image: Option<TileImage<P>>,
        shapes: Vec<Shape>,
        /// Disjoint world pixel areas to repaint.
        clips: Vec<Rect>,
    },
}

struct DrawOp<'s, 'a, P> {
    layer: u32,
    /// Tiles sort before surfaces of the same layer.
    priority: u8,
    order: usize,
    op: Op<'s, 'a, P>,
}

impl<A: MapData> BufferedRenderer<A> {
    /// Draw `surfaces` and the tiles that must cover them onto `target`,
    /// where the view's top-left corner is at `origin`.
    pub(super) fn draw_overlay(
        &mut self,
        target: &mut A::Pixmap,
        origin: Point,
        surfaces: &[ForeignSurface<'_, A::Pixmap>],
    ) -> Result<()> {
        let mut ops: Vec<DrawOp<'_, '_, A::Pixmap>> = surfaces
            .iter()
            .enumerate()
            .map(|(order, surface)| DrawOp {
                layer: surface.layer,
                priority: 1,
                order,
                op: Op::Surface(surface),
            })
            .collect();

        let damage = self.damaged_cells(surfaces);
        let mut order = ops.len();
        for (cell, hits) in damage {
            let cell_px = self
                .compositor
                .tiles_to_pixels(Rect::new(cell.x, cell.y, 1, 1));
            let shapes = self.data.shapes(cell_px);
            for &layer in &self.layers {
                let clips = disjoint(
                    hits.iter()
                        .filter(|(_, below)| *below < layer)
                        .map(|(rect, _)| *rect),
                );
                if clips.is_empty() {
                    continue;
                }
                let image = TileCompositor::fetch(
                    self.data.as_ref(),
                    &mut self.animations,
                    TileCoord::new(cell.x, cell.y, layer),
                );
                let shapes: Vec<Shape> =
                    shapes.iter().filter(|s| s.layer == layer).copied().collect();
                if image.is_none() && shapes.is_empty() {
                    continue;
                }
                ops.push(DrawOp {
                    layer,
                    priority: 0,
                    order,
                    op: Op::Tile {
                        cell,
                        image,
                        shapes,
                        clips,
                    },
                });
                order += 1;
            }
        }

        ops.sort_by_key(|op| (op.layer, op.priority, op.order));

        let view = self.view.origin();
        let (dx, dy) = (origin.x - view.x, origin.y - view.y);
        for draw in &ops {
            match &draw.op {
                Op::Surface(surface) => {
                    let rect = surface.rect.translate(origin.x, origin.y);
                    let image_rect = surface.image.rect();
                    if rect.size() == image_rect.size() {
                        target.blit(surface.image, image_rect, rect.origin())?;
                    } else {
                        target.blit_scaled(surface.image, image_rect, rect)?;
                    }
                }
                Op::Tile {
                    cell,
                    image,
                    shapes,
                    clips,
                } => {
                    let dst = self.compositor.cell_origin(*cell).offset(dx, dy);
                    for clip in clips {
                        with_clip(target, clip.translate(dx, dy), |t| {
                            self.compositor.draw_layer(
                                t,
                                image.as_ref(),
                                draw.layer,
                                *cell,
                                dst,
                                shapes,
                            )
                        })?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Visible cells overlapped by a surface below the top tile layer, with
    /// the overlapped part of the cell (world pixels) and the surface layer
    /// for each hit. Sorted row-major.
    fn damaged_cells(
        &self,
        surfaces: &[ForeignSurface<'_, A::Pixmap>],
    ) -> Vec<(Point, Vec<(Rect, u32)>)> {
        let Some(&top) = self.layers.iter().max() else {
            return Vec::new();
        };
        let (tw, th) = (self.tile.w as i32, self.tile.h as i32);
        let mut hits: HashMap<Point, Vec<(Rect, u32)>> = HashMap::new();
        for surface in surfaces.iter().filter(|s| s.layer < top) {
            let world = surface.rect.translate(self.view.x, self.view.y);
            let Some(hit) = world.intersection(&self.view) else {
                continue;
            };
            for ty in hit.y.div_euclid(th)..=(hit.bottom() - 1).div_euclid(th) {
                for tx in hit.x.div_euclid(tw)..=(hit.right() - 1).div_euclid(tw) {
                    let cell = Point::new(tx, ty);
                    let cell_px = self.compositor.tiles_to_pixels(Rect::new(tx, ty, 1, 1));
                    if let Some(part) = hit.intersection(&cell_px) {
                        hits.entry(cell).or_default().push((part, surface.layer));
                    }
                }
            }
        }
        let mut cells: Vec<(Point, Vec<(Rect, u32)>)> = hits.into_iter().collect();
        cells.sort_by_key(|(p, _)| (p.y, p.x));
        cells
    }
}

/// Union of `rects` as non-overlapping rectangles.
fn disjoint(rects: impl IntoIterator<Item = Rect>) -> Vec<Rect> {
    let mut out: Vec<Rect> = Vec::new();
    for rect in rects {
        let mut pieces = vec![rect];
        for taken in &out {
            pieces = pieces.iter().flat_map(|p| p.subtract(taken)).collect();
        }
        out.extend(pieces);
    }
    out
}
