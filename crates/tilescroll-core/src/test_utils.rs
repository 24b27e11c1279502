//! Shared test utilities for the renderer tests.
//!
//! Provides a [`MockMap`] adapter that counts tile fetches and a
//! [`RecordingPixmap`] that records all draw calls for assertion.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use tilescroll_types::color::Color;
use tilescroll_types::error::Result;
use tilescroll_types::geometry::{Point, Rect, Size};
use tilescroll_types::pixmap::{PixelFormat, Pixmap, Transparency};
use tilescroll_types::soft::SoftPixmap;

use crate::data::{DefaultTile, MapData, Shape, Tile, TileCoord, TileImage, Tileset};

type Generator<P> = Box<dyn Fn(TileCoord) -> Option<Tile<P>>>;

/// In-memory map adapter with fetch instrumentation.
pub struct MockMap<P = SoftPixmap> {
    pub tile_size: Cell<Size>,
    pub map_size: Cell<Size>,
    pub layers: Vec<u32>,
    pub default: DefaultTile<P>,
    pub shapes: Vec<Shape>,
    tiles: RefCell<HashMap<TileCoord, Tile<P>>>,
    generator: Option<Generator<P>>,
    fetches: RefCell<HashMap<TileCoord, usize>>,
    prepared: Cell<usize>,
    announced: Cell<Option<Rect>>,
}

impl<P: Pixmap> MockMap<P> {
    /// A map where every position is empty.
    pub fn empty(tile: Size, map: Size, layers: &[u32]) -> Self {
        Self {
            tile_size: Cell::new(tile),
            map_size: Cell::new(map),
            layers: layers.to_vec(),
            default: DefaultTile::Clear,
            shapes: Vec::new(),
            tiles: RefCell::new(HashMap::new()),
            generator: None,
            fetches: RefCell::new(HashMap::new()),
            prepared: Cell::new(0),
            announced: Cell::new(None),
        }
    }

    /// Place `tile` at `coord`, replacing any generated tile.
    pub fn set(&self, coord: TileCoord, tile: Tile<P>) {
        self.tiles.borrow_mut().insert(coord, tile);
    }

    /// Total fetches since creation or the last reset.
    pub fn fetch_count(&self) -> usize {
        self.fetches.borrow().values().sum()
    }

    /// Fetch count per coordinate.
    pub fn fetches(&self) -> HashMap<TileCoord, usize> {
        self.fetches.borrow().clone()
    }

    pub fn reset_fetches(&self) {
        self.fetches.borrow_mut().clear();
    }

    /// Number of `prepare` calls.
    pub fn prepared(&self) -> usize {
        self.prepared.get()
    }

    /// Last tile view passed to `prepare_tiles`.
    pub fn announced(&self) -> Option<Rect> {
        self.announced.get()
    }
}

impl MockMap<SoftPixmap> {
    /// A map filled on every layer with solid tiles colored by position.
    pub fn checker(tile: Size, map: Size, layers: &[u32]) -> Self {
        let mut m = Self::empty(tile, map, layers);
        m.generator = Some(Box::new(move |c| {
            Some(solid_tile(tile, Self::color_at(c.x, c.y, c.layer)))
        }));
        m
    }

    /// Color of the checker tile at a position.
    pub fn color_at(x: i32, y: i32, layer: u32) -> Color {
        Color::rgb(
            (x.rem_euclid(16) * 16) as u8,
            (y.rem_euclid(16) * 16) as u8,
            (50 + layer * 100).min(255) as u8,
        )
    }
}

impl<P: Pixmap> MapData for MockMap<P> {
    type Pixmap = P;

    fn tile_size(&self) -> Size {
        self.tile_size.get()
    }

    fn map_size(&self) -> Size {
        self.map_size.get()
    }

    fn visible_layers(&self) -> &[u32] {
        &self.layers
    }

    fn tile(&self, x: i32, y: i32, layer: u32) -> Option<Tile<P>> {
        let coord = TileCoord::new(x, y, layer);
        *self.fetches.borrow_mut().entry(coord).or_insert(0) += 1;
        let map = self.map_size.get();
        if x < 0 || y < 0 || x >= map.w as i32 || y >= map.h as i32 {
            return None;
        }
        if let Some(tile) = self.tiles.borrow().get(&coord) {
            return Some(tile.clone());
        }
        self.generator.as_ref().and_then(|g| g(coord))
    }

    fn default_tile(&self) -> DefaultTile<P> {
        self.default.clone()
    }

    fn shapes(&self, area: Rect) -> Vec<Shape> {
        self.shapes
            .iter()
            .filter(|s| s.rect.intersects(&area))
            .copied()
            .collect()
    }

    fn prepare(&self, _format: PixelFormat) -> Result<()> {
        self.prepared.set(self.prepared.get() + 1);
        Ok(())
    }

    fn prepare_tiles(&self, view: Rect) {
        self.announced.set(Some(view));
    }
}

/// Wrap `image` as a static tile covering the whole image.
pub fn tile_from<P: Pixmap>(image: P, mode: Transparency) -> Tile<P> {
    let tileset = Tileset::new("mock", image, mode).expect("tileset");
    Tile::Static(TileImage::whole(tileset))
}

/// An opaque single-color tile.
pub fn solid_tile(tile: Size, color: Color) -> Tile<SoftPixmap> {
    let image = SoftPixmap::solid(tile.w, tile.h, color).expect("solid pixmap");
    tile_from(image, Transparency::Opaque)
}

/// A recorded draw call from [`RecordingPixmap`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCall {
    Fill { rect: Rect, color: Color },
    Blit { src: String, src_rect: Rect, dst: Point },
    BlitScaled { src: String, src_rect: Rect, dst_rect: Rect },
}

/// A pixmap that stores no pixels and records every draw call.
pub struct RecordingPixmap {
    pub label: String,
    pub calls: Vec<DrawCall>,
    size: Size,
    format: PixelFormat,
    transparency: Transparency,
    clip: Option<Rect>,
}

impl RecordingPixmap {
    pub fn labelled(label: &str, w: u32, h: u32) -> Self {
        Self {
            label: label.to_string(),
            calls: Vec::new(),
            size: Size::new(w, h),
            format: PixelFormat::Rgba,
            transparency: Transparency::Alpha,
            clip: None,
        }
    }

    /// Labels of blitted sources, in call order.
    pub fn blit_sources(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Blit { src, .. } | DrawCall::BlitScaled { src, .. } => Some(src.as_str()),
                DrawCall::Fill { .. } => None,
            })
            .collect()
    }

    /// Count of `Fill` calls.
    pub fn fill_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Fill { .. }))
            .count()
    }
}

impl Pixmap for RecordingPixmap {
    fn create(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        Ok(Self {
            label: "buffer".to_string(),
            calls: Vec::new(),
            size: Size::new(width, height),
            format,
            transparency: format.transparency(),
            clip: None,
        })
    }

    fn size(&self) -> Size {
        self.size
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn transparency(&self) -> Transparency {
        self.transparency
    }

    fn set_transparency(&mut self, mode: Transparency) -> Result<()> {
        self.transparency = mode;
        Ok(())
    }

    fn fill(&mut self, rect: Rect, color: Color) -> Result<()> {
        self.calls.push(DrawCall::Fill { rect, color });
        Ok(())
    }

    fn blit(&mut self, src: &Self, src_rect: Rect, dst: Point) -> Result<()> {
        self.calls.push(DrawCall::Blit {
            src: src.label.clone(),
            src_rect,
            dst,
        });
        Ok(())
    }

    fn blit_scaled(&mut self, src: &Self, src_rect: Rect, dst_rect: Rect) -> Result<()> {
        self.calls.push(DrawCall::BlitScaled {
            src: src.label.clone(),
            src_rect,
            dst_rect,
        });
        Ok(())
    }

    fn clip(&self) -> Option<Rect> {
        self.clip
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }
}
