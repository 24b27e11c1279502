//! Buffered scrolling renderer.
//!
//! [`BufferedRenderer`] owns an offscreen buffer a little larger than the
//! (zoom-adjusted) view, addressed as a ring of tile slots. Camera moves only
//! redraw the tiles that scrolled into the buffer; animation ticks only
//! redraw the cells whose frame changed. [`BufferedRenderer::composite`]
//! copies the visible window out of the ring, scales it for zoom and
//! interleaves foreign surfaces (sprites) with the tile layers.
//!
//! # Coordinates
//!
//! - *World* pixels: map space, origin at the map's top-left tile.
//! - *View* pixels: relative to the top-left of the view rectangle, before
//!   zoom. Foreign surface rectangles are given in view pixels.
//! - *Screen* pixels: view pixels scaled by the zoom ratio, relative to the
//!   destination rectangle.
//!
//! The renderer is single-threaded and synchronous. The map adapter is shared
//! read-only through an `Rc`.

mod overlay;

pub use overlay::ForeignSurface;

use std::rc::Rc;
use std::time::Duration;

use tilescroll_types::config::{RendererOptions, validate_zoom};
use tilescroll_types::error::{RenderError, Result};
use tilescroll_types::geometry::{Point, Rect, Size};
use tilescroll_types::pixmap::{PixelFormat, Pixmap, with_clip};

use crate::animation::AnimationTracker;
use crate::camera::Camera;
use crate::compositor::TileCompositor;
use crate::data::{MapData, TileCoord};
use crate::dirty::{DirtyRegionTracker, RingGrid};

/// Largest buffer side in pixels.
const MAX_BUFFER_SIDE: u32 = 16_384;
/// Camera positions are kept within this many pixels of the origin.
const WORLD_LIMIT: i32 = i32::MAX / 4;

/// Buffer geometry for a viewport, zoom and tile size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    /// World pixels visible at once (viewport divided by zoom).
    view: Size,
    /// Buffer size in tiles: the view rounded up plus one tile of overscan.
    extent: Size,
}

impl Layout {
    /// Fails with [`RenderError::Config`] when the buffer would exceed
    /// [`MAX_BUFFER_SIDE`] pixels along either axis.
    fn new(viewport: Size, zoom: f32, tile: Size) -> Result<Self> {
        let view = Size::new(
            ((viewport.w as f32 / zoom) as u32).max(1),
            ((viewport.h as f32 / zoom) as u32).max(1),
        );
        let extent = Size::new(
            view.w.div_ceil(tile.w).saturating_add(1),
            view.h.div_ceil(tile.h).saturating_add(1),
        );
        let fits = |tiles: u32, side: u32| {
            tiles
                .checked_mul(side)
                .is_some_and(|px| px <= MAX_BUFFER_SIDE)
        };
        if !fits(extent.w, tile.w) || !fits(extent.h, tile.h) {
            return Err(RenderError::Config(format!(
                "zoom {zoom} needs a {}x{} tile buffer of {}x{} px tiles, \
                 over the {MAX_BUFFER_SIDE} px limit",
                extent.w, extent.h, tile.w, tile.h
            )));
        }
        Ok(Self { view, extent })
    }
}

/// Freshly allocated pixmaps for a [`Layout`].
struct Buffers<P> {
    layout: Layout,
    buffer: P,
    zoom_buffer: Option<P>,
}

impl<P: Pixmap> Buffers<P> {
    fn allocate(viewport: Size, zoom: f32, tile: Size, format: PixelFormat) -> Result<Self> {
        let layout = Layout::new(viewport, zoom, tile)?;
        let buffer = P::create(
            layout.extent.w * tile.w,
            layout.extent.h * tile.h,
            format,
        )?;
        let zoom_buffer = if layout.view != viewport {
            Some(P::create(layout.view.w, layout.view.h, format)?)
        } else {
            None
        };
        Ok(Self {
            layout,
            buffer,
            zoom_buffer,
        })
    }
}

/// Scrolling tile-map renderer over a [`MapData`] adapter.
pub struct BufferedRenderer<A: MapData> {
    data: Rc<A>,
    options: RendererOptions,
    viewport: Size,
    zoom: f32,
    tile: Size,
    map_size: Size,
    layers: Vec<u32>,
    /// World pixel rectangle shown by `composite`.
    view: Rect,
    buffer: A::Pixmap,
    zoom_buffer: Option<A::Pixmap>,
    tracker: DirtyRegionTracker,
    animations: AnimationTracker<A::Pixmap>,
    compositor: TileCompositor,
}

impl<A: MapData> BufferedRenderer<A> {
    /// Allocate the buffer and draw the initial view at the map origin.
    ///
    /// Fails with [`RenderError::Config`] for an empty viewport, an empty
    /// tile size, a non-positive zoom, a buffer too large for the zoom, or
    /// both `alpha` and `colorkey` set.
    pub fn new(data: Rc<A>, viewport: Size, options: RendererOptions) -> Result<Self> {
        options.validate()?;
        check_viewport(viewport)?;
        let tile = data.tile_size();
        check_tile_size(tile)?;

        let format = options.buffer_format();
        let buffers = Buffers::allocate(viewport, options.zoom, tile, format)?;
        data.prepare(format)?;
        log_allocation(&buffers.layout, tile, options.zoom);

        let mut renderer = Self {
            map_size: data.map_size(),
            layers: data.visible_layers().to_vec(),
            zoom: options.zoom,
            viewport,
            tile,
            view: Rect::from_size(buffers.layout.view),
            buffer: buffers.buffer,
            zoom_buffer: buffers.zoom_buffer,
            tracker: DirtyRegionTracker::new(buffers.layout.extent),
            animations: AnimationTracker::new(),
            compositor: TileCompositor::new(tile, options.buffer_clear_color()),
            data,
            options,
        };
        renderer.view = renderer.constrain(renderer.view);
        renderer.sync()?;
        Ok(renderer)
    }

    // -- Camera ------------------------------------------------------------

    /// Move the view so its top-left corner is at world pixel `top_left`.
    ///
    /// No tiles are fetched if the buffer anchor does not change.
    pub fn set_camera(&mut self, top_left: Point) -> Result<()> {
        self.refresh()?;
        self.place(top_left)
    }

    /// Center the view on world pixel `point`.
    pub fn center(&mut self, point: Point) -> Result<()> {
        self.refresh()?;
        let top_left = centered(self.view.size(), point);
        self.place(top_left)
    }

    /// Move the view center by `(dx, dy)` world pixels.
    pub fn scroll(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.refresh()?;
        let top_left = centered(self.view.size(), self.view_center().offset(dx, dy));
        self.place(top_left)
    }

    fn place(&mut self, top_left: Point) -> Result<()> {
        let x = top_left.x.clamp(-WORLD_LIMIT, WORLD_LIMIT - self.view.w as i32);
        let y = top_left.y.clamp(-WORLD_LIMIT, WORLD_LIMIT - self.view.h as i32);
        let view = Rect::new(x, y, self.view.w, self.view.h);
        self.view = self.constrain(view);
        self.sync()
    }

    fn constrain(&self, view: Rect) -> Rect {
        if self.options.clamp_camera {
            view.clamp_within(&self.map_rect())
        } else {
            view
        }
    }

    fn view_center(&self) -> Point {
        Point::new(
            self.view.x + (self.view.w / 2) as i32,
            self.view.y + (self.view.h / 2) as i32,
        )
    }

    // -- Time --------------------------------------------------------------

    /// Advance animations to `now` and redraw the cells whose frame changed.
    ///
    /// Each animation steps at most one frame per call. Animations outside
    /// the buffer are paused and not redrawn.
    pub fn tick(&mut self, now: Duration) -> Result<()> {
        self.refresh()?;
        self.sync()?;
        let Some(window) = self.tracker.window() else {
            return Ok(());
        };
        let changed = self.animations.advance(now, window);
        if changed.is_empty() {
            return Ok(());
        }
        let mut cells: Vec<Point> = changed.iter().map(|c| Point::new(c.x, c.y)).collect();
        cells.dedup();
        log::trace!("{} animated cells changed frame", cells.len());
        self.compositor.redraw_cells(
            &mut self.buffer,
            self.tracker.grid(),
            self.data.as_ref(),
            &mut self.animations,
            &cells,
        )
    }

    // -- Configuration -----------------------------------------------------

    /// Change the zoom factor, keeping the view center.
    ///
    /// A zoom so small that the buffer would be too large is rejected with
    /// [`RenderError::Config`] and leaves the renderer unchanged.
    /// Reallocates and fully redraws only when the buffer extent changes.
    pub fn set_zoom(&mut self, zoom: f32) -> Result<()> {
        validate_zoom(zoom)?;
        self.refresh()?;
        if zoom == self.zoom {
            return Ok(());
        }
        let center = self.view_center();
        let layout = Layout::new(self.viewport, zoom, self.tile)?;
        if layout.extent != self.tracker.extent() {
            log::debug!("zoom {zoom} changes buffer extent; reallocating");
            return self.rebuild(self.viewport, zoom, self.tile, center);
        }

        if layout.view != self.view.size() {
            self.zoom_buffer = if layout.view != self.viewport {
                let format = self.options.buffer_format();
                Some(A::Pixmap::create(layout.view.w, layout.view.h, format)?)
            } else {
                None
            };
        }
        self.zoom = zoom;
        self.view = Rect::new(0, 0, layout.view.w, layout.view.h);
        self.place(centered(layout.view, center))
    }

    /// Reallocate for a new viewport size and fully redraw.
    pub fn resize(&mut self, viewport: Size) -> Result<()> {
        check_viewport(viewport)?;
        self.refresh()?;
        let center = self.view_center();
        self.rebuild(viewport, self.zoom, self.tile, center)
    }

    /// Swap in new map data, forget animation state and fully redraw.
    pub fn reload(&mut self, data: Rc<A>) -> Result<()> {
        let tile = data.tile_size();
        check_tile_size(tile)?;
        let center = self.view_center();
        self.data = data;
        self.map_size = self.data.map_size();
        self.layers = self.data.visible_layers().to_vec();
        self.rebuild(self.viewport, self.zoom, tile, center)?;
        log::info!("map data reloaded");
        Ok(())
    }

    /// Check that the adapter still reports the tile and map size the
    /// renderer was configured with.
    pub fn verify_adapter(&self) -> Result<()> {
        let found = self.data.tile_size();
        if found != self.tile {
            return Err(RenderError::AdapterInconsistency {
                what: "tile size",
                expected: self.tile,
                found,
            });
        }
        let found = self.data.map_size();
        if found != self.map_size {
            return Err(RenderError::AdapterInconsistency {
                what: "map size",
                expected: self.map_size,
                found,
            });
        }
        Ok(())
    }

    /// Recover from adapter changes made behind the renderer's back.
    fn refresh(&mut self) -> Result<()> {
        if let Err(err) = self.verify_adapter() {
            log::warn!("{err}; reconfiguring renderer");
            let tile = self.data.tile_size();
            check_tile_size(tile)?;
            let center = self.view_center();
            self.map_size = self.data.map_size();
            self.layers = self.data.visible_layers().to_vec();
            self.rebuild(self.viewport, self.zoom, tile, center)?;
        } else if self.layers != self.data.visible_layers() {
            log::debug!("visible layers changed; full redraw");
            self.layers = self.data.visible_layers().to_vec();
            self.tracker.invalidate();
        }
        Ok(())
    }

    /// Allocate new buffers, then redraw everything around `center`.
    ///
    /// On allocation failure the renderer is left untouched.
    fn rebuild(&mut self, viewport: Size, zoom: f32, tile: Size, center: Point) -> Result<()> {
        let format = self.options.buffer_format();
        let buffers = Buffers::allocate(viewport, zoom, tile, format)?;
        self.data.prepare(format)?;
        log_allocation(&buffers.layout, tile, zoom);

        self.viewport = viewport;
        self.zoom = zoom;
        self.tile = tile;
        self.buffer = buffers.buffer;
        self.zoom_buffer = buffers.zoom_buffer;
        self.tracker = DirtyRegionTracker::new(buffers.layout.extent);
        self.animations.clear();
        self.compositor = TileCompositor::new(tile, self.options.buffer_clear_color());
        self.view = Rect::new(0, 0, buffers.layout.view.w, buffers.layout.view.h);
        self.place(centered(buffers.layout.view, center))
    }

    /// Bring the buffer up to date with the view.
    fn sync(&mut self) -> Result<()> {
        let anchor = Point::new(
            self.view.x.div_euclid(self.tile.w as i32),
            self.view.y.div_euclid(self.tile.h as i32),
        );
        let region = self.tracker.move_to(anchor);
        if region.is_empty() {
            return Ok(());
        }
        if let Some(window) = self.tracker.window() {
            self.data.prepare_tiles(window);
        }
        let result = self.compositor.redraw(
            &mut self.buffer,
            self.tracker.grid(),
            self.data.as_ref(),
            &mut self.animations,
            &region.rects,
        );
        match result {
            Ok(cells) => {
                log::trace!("redrew {cells} cells (full: {})", region.full);
                Ok(())
            }
            Err(err) => {
                self.tracker.invalidate();
                Err(err)
            }
        }
    }

    // -- Output ------------------------------------------------------------

    /// Draw the view into `dest_rect` of `dest`, with `surfaces` interleaved
    /// between the tile layers.
    ///
    /// Surfaces are drawn in ascending layer order, keeping the caller's
    /// order within a layer. A surface is drawn above tiles of its own layer
    /// and below tiles of higher layers. In alpha and colorkey modes
    /// `dest_rect` is cleared first; opaque mode overwrites it.
    pub fn composite(
        &mut self,
        dest: &mut A::Pixmap,
        dest_rect: Rect,
        surfaces: &[ForeignSurface<'_, A::Pixmap>],
    ) -> Result<()> {
        self.refresh()?;
        self.sync()?;

        let format = self.options.buffer_format();
        if format.is_transparent() {
            let clear = format.clear_color();
            with_clip(dest, dest_rect, |d| d.fill(dest_rect, clear))?;
        }

        let Some(mut zoom_buffer) = self.zoom_buffer.take() else {
            return with_clip(dest, dest_rect, |d| {
                self.render_view(d, dest_rect.origin(), surfaces)
            });
        };
        let result = self.render_zoomed(&mut zoom_buffer, dest, dest_rect, surfaces);
        self.zoom_buffer = Some(zoom_buffer);
        result
    }

    fn render_zoomed(
        &mut self,
        zoom_buffer: &mut A::Pixmap,
        dest: &mut A::Pixmap,
        dest_rect: Rect,
        surfaces: &[ForeignSurface<'_, A::Pixmap>],
    ) -> Result<()> {
        let format = self.options.buffer_format();
        if format.is_transparent() {
            zoom_buffer.fill_all(format.clear_color())?;
        }
        self.render_view(zoom_buffer, Point::default(), surfaces)?;
        let zoomed: &A::Pixmap = zoom_buffer;
        with_clip(dest, dest_rect, |d| d.blit_scaled(zoomed, zoomed.rect(), dest_rect))
    }

    /// Copy the view out of the ring buffer to `origin` of `target`, then
    /// draw the overlay.
    fn render_view(
        &mut self,
        target: &mut A::Pixmap,
        origin: Point,
        surfaces: &[ForeignSurface<'_, A::Pixmap>],
    ) -> Result<()> {
        let pixels = RingGrid::new(self.buffer.size());
        for piece in pixels.split(self.view) {
            let dst = origin.offset(piece.world.x - self.view.x, piece.world.y - self.view.y);
            target.blit(&self.buffer, piece.local, dst)?;
        }
        if surfaces.is_empty() {
            return Ok(());
        }
        self.draw_overlay(target, origin, surfaces)
    }

    // -- Queries -----------------------------------------------------------

    /// World pixel rectangle currently shown.
    pub fn view_rect(&self) -> Rect {
        self.view
    }

    /// Translation from world pixels to view pixels.
    pub fn center_offset(&self) -> Point {
        Point::new(-self.view.x, -self.view.y)
    }

    /// Map extent in world pixels.
    pub fn map_rect(&self) -> Rect {
        Rect::new(
            0,
            0,
            self.map_size.w.saturating_mul(self.tile.w),
            self.map_size.h.saturating_mul(self.tile.h),
        )
    }

    /// Snapshot of the current world-to-screen transform.
    pub fn camera(&self) -> Camera {
        Camera::new(self.view, self.viewport)
    }

    /// World point to screen point, including zoom.
    pub fn translate_point(&self, point: Point) -> Point {
        self.camera().point_to_screen(point)
    }

    /// World rectangle to screen rectangle, including zoom.
    pub fn translate_rect(&self, rect: Rect) -> Rect {
        self.camera().world_to_screen(rect)
    }

    pub fn translate_points(&self, points: &[Point]) -> Vec<Point> {
        let camera = self.camera();
        points.iter().map(|p| camera.point_to_screen(*p)).collect()
    }

    pub fn translate_rects(&self, rects: &[Rect]) -> Vec<Rect> {
        let camera = self.camera();
        rects.iter().map(|r| camera.world_to_screen(*r)).collect()
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    pub fn data(&self) -> &Rc<A> {
        &self.data
    }

    /// Buffer size in tiles.
    pub fn buffer_extent(&self) -> Size {
        self.tracker.extent()
    }

    /// World tile rectangle held by the buffer.
    pub fn buffer_window(&self) -> Option<Rect> {
        self.tracker.window()
    }

    /// Current frame of the animated tile at `coord`, if it is tracked.
    pub fn animation_frame(&self, coord: TileCoord) -> Option<usize> {
        self.animations.frame_index(coord)
    }
}

fn check_viewport(viewport: Size) -> Result<()> {
    if viewport.is_empty() {
        return Err(RenderError::Config(format!(
            "viewport must be positive, got {}x{}",
            viewport.w, viewport.h
        )));
    }
    Ok(())
}

fn check_tile_size(tile: Size) -> Result<()> {
    if tile.is_empty() {
        return Err(RenderError::Config(format!(
            "tile size must be positive, got {}x{}",
            tile.w, tile.h
        )));
    }
    Ok(())
}

/// Top-left corner of a `size` rectangle centered on `center`.
fn centered(size: Size, center: Point) -> Point {
    Point::new(
        center.x.saturating_sub((size.w / 2) as i32),
        center.y.saturating_sub((size.h / 2) as i32),
    )
}

fn log_allocation(layout: &Layout, tile: Size, zoom: f32) {
    log::info!(
        "tile buffer allocated: {}x{} tiles ({}x{} px), view {}x{}, zoom {zoom}",
        layout.extent.w,
        layout.extent.h,
        layout.extent.w * tile.w,
        layout.extent.h * tile.h,
        layout.view.w,
        layout.view.h,
    );
}
