//! Map data contract.
//!
//! The renderer reads everything it draws through the [`MapData`] trait. An
//! implementation wraps whatever map format the application uses; the
//! renderer never parses files or decodes images itself.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use tilescroll_types::color::Color;
use tilescroll_types::error::{RenderError, Result};
use tilescroll_types::geometry::{Rect, Size};
use tilescroll_types::pixmap::{PixelFormat, Pixmap, Transparency};

/// One cell in one layer of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
    pub layer: u32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32, layer: u32) -> Self {
        Self { x, y, layer }
    }
}

/// A source image shared by many tiles, with its transparency mode.
pub struct Tileset<P> {
    name: String,
    image: Rc<P>,
}

impl<P: Pixmap> Tileset<P> {
    /// Wrap `image`, applying `mode` to it once for all tiles cut from it.
    pub fn new(name: impl Into<String>, mut image: P, mode: Transparency) -> Result<Rc<Self>> {
        image.set_transparency(mode)?;
        Ok(Self::from_shared(name, Rc::new(image)))
    }

    /// Wrap an image whose transparency mode is already set, such as one
    /// returned by [`ImageCache`](crate::cache::ImageCache).
    pub fn from_shared(name: impl Into<String>, image: Rc<P>) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            image,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn image(&self) -> &P {
        &self.image
    }

    pub fn transparency(&self) -> Transparency {
        self.image.transparency()
    }
}

impl<P> fmt::Debug for Tileset<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tileset").field("name", &self.name).finish()
    }
}

/// A tile-sized region of a tileset.
pub struct TileImage<P> {
    pub tileset: Rc<Tileset<P>>,
    /// Source rectangle inside the tileset image, in pixels.
    pub src: Rect,
}

impl<P> TileImage<P> {
    pub fn new(tileset: Rc<Tileset<P>>, src: Rect) -> Self {
        Self { tileset, src }
    }
}

impl<P: Pixmap> TileImage<P> {
    /// A tile covering the whole tileset image.
    pub fn whole(tileset: Rc<Tileset<P>>) -> Self {
        let src = tileset.image().rect();
        Self { tileset, src }
    }
}

impl<P> Clone for TileImage<P> {
    fn clone(&self) -> Self {
        Self {
            tileset: Rc::clone(&self.tileset),
            src: self.src,
        }
    }
}

impl<P> fmt::Debug for TileImage<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileImage")
            .field("tileset", &self.tileset.name)
            .field("src", &self.src)
            .finish()
    }
}

/// One frame of an animation.
pub struct AnimationFrame<P> {
    pub image: TileImage<P>,
    pub duration: Duration,
}

impl<P> AnimationFrame<P> {
    pub fn new(image: TileImage<P>, duration: Duration) -> Self {
        Self { image, duration }
    }
}

/// A named, non-empty, cyclic sequence of timed frames.
pub struct AnimationSequence<P> {
    name: String,
    frames: Vec<AnimationFrame<P>>,
}

impl<P> AnimationSequence<P> {
    /// Build a sequence. Fails if `frames` is empty.
    pub fn new(name: impl Into<String>, frames: Vec<AnimationFrame<P>>) -> Result<Rc<Self>> {
        let name = name.into();
        if frames.is_empty() {
            return Err(RenderError::Config(format!(
                "animation '{name}' has no frames"
            )));
        }
        Ok(Rc::new(Self { name, frames }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Never true for a sequence built with [`AnimationSequence::new`].
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`, wrapping around the end of the sequence.
    pub fn frame(&self, index: usize) -> &AnimationFrame<P> {
        &self.frames[index % self.frames.len()]
    }
}

impl<P> fmt::Debug for AnimationSequence<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationSequence")
            .field("name", &self.name)
            .field("frames", &self.frames.len())
            .finish()
    }
}

/// What the map holds at one coordinate.
pub enum Tile<P> {
    Static(TileImage<P>),
    Animated(Rc<AnimationSequence<P>>),
}

impl<P> Clone for Tile<P> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(image) => Self::Static(image.clone()),
            Self::Animated(seq) => Self::Animated(Rc::clone(seq)),
        }
    }
}

impl<P> fmt::Debug for Tile<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(image) => f.debug_tuple("Static").field(image).finish(),
            Self::Animated(seq) => f.debug_tuple("Animated").field(seq).finish(),
        }
    }
}

/// What to draw in a cell where every visible layer is empty.
///
/// With [`DefaultTile::Clear`] such cells keep the buffer's clear color, which
/// shows as seams when the map has holes; maps with holes should declare a
/// fill or image instead.
pub enum DefaultTile<P> {
    Clear,
    Fill(Color),
    Image(TileImage<P>),
}

impl<P> Clone for DefaultTile<P> {
    fn clone(&self) -> Self {
        match self {
            Self::Clear => Self::Clear,
            Self::Fill(color) => Self::Fill(*color),
            Self::Image(image) => Self::Image(image.clone()),
        }
    }
}

/// How an axis-aligned shape is painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeStyle {
    Fill(Color),
    Outline { color: Color, width: u32 },
}

/// An axis-aligned rectangle drawn into the map at a layer (experimental).
///
/// Shapes are rendered into the offscreen buffer with the tiles of their
/// layer, so they always end up beneath foreign surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub layer: u32,
    /// World pixel rectangle.
    pub rect: Rect,
    pub style: ShapeStyle,
}

/// Read-only source of tiles for the renderer.
///
/// Implementations must keep `tile_size` and `map_size` constant between
/// reloads; the renderer treats a change as an inconsistency and reconfigures.
pub trait MapData {
    /// Concrete pixel storage used by the tile images.
    type Pixmap: Pixmap;

    /// Pixel size of one tile. Both dimensions must be positive.
    fn tile_size(&self) -> Size;

    /// Map extent in tiles.
    fn map_size(&self) -> Size;

    /// Layers to draw, in ascending draw order.
    fn visible_layers(&self) -> &[u32];

    /// Tile at a coordinate, or `None` where the layer is empty or the
    /// coordinate is outside the map.
    fn tile(&self, x: i32, y: i32, layer: u32) -> Option<Tile<Self::Pixmap>>;

    /// Drawn where every visible layer is empty.
    fn default_tile(&self) -> DefaultTile<Self::Pixmap> {
        DefaultTile::Clear
    }

    /// Shapes whose world pixel rectangle intersects `area`.
    fn shapes(&self, area: Rect) -> Vec<Shape> {
        let _ = area;
        Vec::new()
    }

    /// Pre-process images for the buffer format. Called once per buffer
    /// allocation, never per frame.
    fn prepare(&self, format: PixelFormat) -> Result<()> {
        let _ = format;
        Ok(())
    }

    /// Advance notice of the tile rectangle about to be drawn.
    ///
    /// A redraw follows immediately. Implementations must not hold on to
    /// the rectangle.
    fn prepare_tiles(&self, view: Rect) {
        let _ = view;
    }

    /// Map extent in pixels, anchored at the origin.
    fn map_rect(&self) -> Rect {
        let tile = self.tile_size();
        let map = self.map_size();
        Rect::new(0, 0, map.w * tile.w, map.h * tile.h)
    }
}
