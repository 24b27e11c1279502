//! Procedurally generated demo map.
//!
//! Three layers: terrain (with animated water), decorations drawn with
//! per-pixel alpha, and colorkeyed roofs. Houses get an outline shape on the
//! decoration layer, so it shows between the ground and the roofs.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tilescroll_core::cache::ImageCache;
use tilescroll_core::color::Color;
use tilescroll_core::data::{
    AnimationFrame, AnimationSequence, DefaultTile, MapData, Shape, ShapeStyle, Tile, TileImage,
    Tileset,
};
use tilescroll_core::error::{RenderError, Result};
use tilescroll_core::geometry::{Point, Rect, Size};
use tilescroll_core::pixmap::{PixelFormat, Pixmap, Transparency};

use crate::config::MapConfig;

pub const GROUND: u32 = 0;
pub const DECOR: u32 = 1;
pub const ROOF: u32 = 2;

const LAYERS: [u32; 3] = [GROUND, DECOR, ROOF];
const ROOF_KEY: Color = Color::rgb(255, 0, 255);
const VOID: Color = Color::rgb(20, 24, 40);
const WATER_FRAME: Duration = Duration::from_millis(300);
/// Cells per side of the coarse noise lattice.
const NOISE_CELL: i32 = 8;
/// Cells per side of the blocks that may hold one house.
const HOUSE_BLOCK: i32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terrain {
    Water,
    Sand,
    Grass,
    Dirt,
    Rock,
}

impl Terrain {
    fn from_height(h: u32) -> Self {
        match h {
            0..70 => Self::Water,
            70..90 => Self::Sand,
            90..170 => Self::Grass,
            170..200 => Self::Dirt,
            _ => Self::Rock,
        }
    }

    /// Column in the ground sheet. Water is animated and has its own sheet.
    fn sheet_index(self) -> Option<i32> {
        match self {
            Self::Water => None,
            Self::Sand => Some(0),
            Self::Grass => Some(1),
            Self::Dirt => Some(2),
            Self::Rock => Some(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decor {
    Tree,
    Flower,
}

/// Source images in their authoring formats.
struct Sheets<P> {
    ground: P,
    water: P,
    decor: P,
    roof: P,
}

/// Tilesets converted for the current buffer format.
struct Prepared<P> {
    ground: Rc<Tileset<P>>,
    water: Rc<AnimationSequence<P>>,
    decor: Rc<Tileset<P>>,
    roof: Rc<Tileset<P>>,
}

pub struct DemoMap<P: Pixmap> {
    tile: Size,
    size: Size,
    seed: u32,
    terrain: Vec<Terrain>,
    decor: Vec<Option<Decor>>,
    /// House footprints in tiles.
    houses: Vec<Rect>,
    sheets: Sheets<P>,
    cache: Rc<ImageCache<P>>,
    prepared: RefCell<Prepared<P>>,
}

impl<P: Pixmap> DemoMap<P> {
    /// Generate a map and prepare its tiles for an opaque RGB buffer.
    pub fn generate(config: &MapConfig, cache: Rc<ImageCache<P>>) -> Result<Self> {
        if config.tile_size == 0 || config.width == 0 || config.height == 0 {
            return Err(RenderError::Config(
                "map dimensions and tile size must be positive".into(),
            ));
        }
        let tile = Size::new(config.tile_size, config.tile_size);
        let size = Size::new(config.width, config.height);
        let seed = config.seed;

        let cells = Rect::from_size(size);
        let terrain: Vec<Terrain> = cells
            .points()
            .map(|p| Terrain::from_height(height(seed, p.x, p.y)))
            .collect();
        let decor = cells
            .points()
            .zip(&terrain)
            .map(|(p, t)| match (t, hash(seed ^ 0x5bd1_e995, p.x, p.y) % 16) {
                (Terrain::Grass, 0) => Some(Decor::Tree),
                (Terrain::Grass, 1) | (Terrain::Dirt, 1) => Some(Decor::Flower),
                _ => None,
            })
            .collect();
        let houses = place_houses(seed, size);

        let sheets = Sheets::draw(tile)?;
        let prepared = sheets.prepare(tile, &cache, PixelFormat::Rgb)?;
        log::info!(
            "generated {}x{} map (seed {seed}, {} houses)",
            size.w,
            size.h,
            houses.len()
        );
        Ok(Self {
            tile,
            size,
            seed,
            terrain,
            decor,
            houses,
            sheets,
            cache,
            prepared: RefCell::new(prepared),
        })
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn cache(&self) -> &Rc<ImageCache<P>> {
        &self.cache
    }

    pub fn terrain(&self, x: i32, y: i32) -> Option<Terrain> {
        self.index(x, y).map(|i| self.terrain[i])
    }

    pub fn houses(&self) -> &[Rect] {
        &self.houses
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        Rect::from_size(self.size)
            .contains_point(Point::new(x, y))
            .then(|| y as usize * self.size.w as usize + x as usize)
    }

    fn roof_at(&self, x: i32, y: i32) -> Option<i32> {
        let p = Point::new(x, y);
        let house = self.houses.iter().find(|h| h.contains_point(p))?;
        // Left edge, middle, right edge.
        Some(if x == house.x {
            0
        } else if x == house.right() - 1 {
            2
        } else {
            1
        })
    }

    fn cut(&self, tileset: &Rc<Tileset<P>>, column: i32) -> TileImage<P> {
        let src = Rect::new(column * self.tile.w as i32, 0, self.tile.w, self.tile.h);
        TileImage::new(Rc::clone(tileset), src)
    }
}

impl<P: Pixmap> MapData for DemoMap<P> {
    type Pixmap = P;

    fn tile_size(&self) -> Size {
        self.tile
    }

    fn map_size(&self) -> Size {
        self.size
    }

    fn visible_layers(&self) -> &[u32] {
        &LAYERS
    }

    fn tile(&self, x: i32, y: i32, layer: u32) -> Option<Tile<P>> {
        let i = self.index(x, y)?;
        let prepared = self.prepared.borrow();
        match layer {
            GROUND => match self.terrain[i].sheet_index() {
                Some(column) => Some(Tile::Static(self.cut(&prepared.ground, column))),
                None => Some(Tile::Animated(Rc::clone(&prepared.water))),
            },
            DECOR => {
                let column = match self.decor[i]? {
                    Decor::Tree => 0,
                    Decor::Flower => 1,
                };
                Some(Tile::Static(self.cut(&prepared.decor, column)))
            }
            ROOF => {
                let column = self.roof_at(x, y)?;
                Some(Tile::Static(self.cut(&prepared.roof, column)))
            }
            _ => None,
        }
    }

    fn default_tile(&self) -> DefaultTile<P> {
        DefaultTile::Fill(VOID)
    }

    fn shapes(&self, area: Rect) -> Vec<Shape> {
        let (tw, th) = (self.tile.w as i32, self.tile.h as i32);
        self.houses
            .iter()
            .map(|h| Rect::new(h.x * tw - 2, h.y * th - 2, h.w * tw as u32 + 4, h.h * th as u32 + 4))
            .filter(|r| r.intersects(&area))
            .map(|rect| Shape {
                layer: DECOR,
                rect,
                style: ShapeStyle::Outline {
                    color: Color::rgb(60, 40, 20),
                    width: 2,
                },
            })
            .collect()
    }

    fn prepare(&self, format: PixelFormat) -> Result<()> {
        let prepared = self.sheets.prepare(self.tile, &self.cache, format)?;
        *self.prepared.borrow_mut() = prepared;
        Ok(())
    }
}

impl<P: Pixmap> Sheets<P> {
    fn draw(tile: Size) -> Result<Self> {
        let (w, h) = (tile.w as i32, tile.h as i32);
        let cell = |i: i32| Rect::new(i * w, 0, tile.w, tile.h);
        let inset = |r: Rect, by: u32| {
            Rect::new(
                r.x + by as i32,
                r.y + by as i32,
                r.w.saturating_sub(by * 2),
                r.h.saturating_sub(by * 2),
            )
        };

        let mut ground = P::create(tile.w * 4, tile.h, PixelFormat::Rgb)?;
        let ground_colors = [
            (Color::rgb(214, 196, 130), Color::rgb(196, 176, 112)),
            (Color::rgb(76, 150, 64), Color::rgb(64, 132, 54)),
            (Color::rgb(130, 96, 60), Color::rgb(112, 82, 50)),
            (Color::rgb(128, 128, 128), Color::rgb(96, 96, 96)),
        ];
        for (i, (base, edge)) in ground_colors.into_iter().enumerate() {
            let r = cell(i as i32);
            ground.fill(r, base)?;
            ground.stroke_rect(r, 1, edge)?;
        }

        let mut water = P::create(tile.w * 3, tile.h, PixelFormat::Rgb)?;
        for i in 0..3 {
            let r = cell(i);
            water.fill(r, Color::rgb(40, 80, 170))?;
            let crest = Rect::new(r.x, r.y + (h / 4) * (i + 1) - 1, tile.w, 2);
            water.fill(crest, Color::rgb(90, 140, 220))?;
        }

        let mut decor = P::create(tile.w * 2, tile.h, PixelFormat::Rgba)?;
        let tree = inset(cell(0), tile.w / 8);
        decor.fill(tree, Color::rgba(20, 90, 30, 220))?;
        decor.stroke_rect(tree, 1, Color::rgb(10, 50, 15))?;
        let flower = inset(cell(1), tile.w * 3 / 8);
        decor.fill(flower, Color::rgba(230, 60, 120, 200))?;
        decor.set_transparency(Transparency::Alpha)?;

        let mut roof = P::create(tile.w * 3, tile.h, PixelFormat::ColorKeyed(ROOF_KEY))?;
        let tiles = Rect::new(0, 0, tile.w * 3, tile.h);
        roof.fill(inset(tiles, 1), Color::rgb(170, 50, 40))?;
        for row in (2..h).step_by(4) {
            roof.fill(Rect::new(1, row, tile.w * 3 - 2, 1), Color::rgb(130, 35, 30))?;
        }
        roof.set_transparency(Transparency::ColorKey(ROOF_KEY))?;

        Ok(Self {
            ground,
            water,
            decor,
            roof,
        })
    }

    fn prepare(&self, tile: Size, cache: &ImageCache<P>, format: PixelFormat) -> Result<Prepared<P>> {
        let ground = Tileset::from_shared(
            "ground",
            cache.get_or_convert("ground", &self.ground, format)?,
        );
        let water_sheet = Tileset::from_shared(
            "water",
            cache.get_or_convert("water", &self.water, format)?,
        );
        // Transparent sheets keep their own format; converting them to an
        // opaque buffer format would lose the transparent pixels.
        let decor = Tileset::from_shared(
            "decor",
            cache.get_or_convert("decor", &self.decor, self.decor.format())?,
        );
        let roof = Tileset::from_shared(
            "roof",
            cache.get_or_convert("roof", &self.roof, self.roof.format())?,
        );

        let frames = (0..3)
            .map(|i| {
                let src = Rect::new(i * tile.w as i32, 0, tile.w, tile.h);
                AnimationFrame::new(TileImage::new(Rc::clone(&water_sheet), src), WATER_FRAME)
            })
            .collect();
        let water = AnimationSequence::new("water", frames)?;
        Ok(Prepared {
            ground,
            water,
            decor,
            roof,
        })
    }
}

/// Integer hash of a lattice point.
fn hash(seed: u32, x: i32, y: i32) -> u32 {
    let mut h = seed
        .wrapping_mul(0x9e37_79b9)
        .wrapping_add((x as u32).wrapping_mul(0x85eb_ca6b))
        .wrapping_add((y as u32).wrapping_mul(0xc2b2_ae35));
    h ^= h >> 16;
    h = h.wrapping_mul(0x7feb_352d);
    h ^= h >> 15;
    h = h.wrapping_mul(0x846c_a68b);
    h ^ (h >> 16)
}

/// Value noise in `0..256`, bilinear between lattice points.
fn height(seed: u32, x: i32, y: i32) -> u32 {
    let (gx, gy) = (x.div_euclid(NOISE_CELL), y.div_euclid(NOISE_CELL));
    let (fx, fy) = (x.rem_euclid(NOISE_CELL), y.rem_euclid(NOISE_CELL));
    let corner = |dx: i32, dy: i32| (hash(seed, gx + dx, gy + dy) & 0xff) as i32;
    let n = NOISE_CELL;
    let top = corner(0, 0) * (n - fx) + corner(1, 0) * fx;
    let bottom = corner(0, 1) * (n - fx) + corner(1, 1) * fx;
    ((top * (n - fy) + bottom * fy) / (n * n)) as u32
}

/// At most one 3x2 house per block, inside the map.
fn place_houses(seed: u32, size: Size) -> Vec<Rect> {
    let mut houses = Vec::new();
    for by in 0..(size.h as i32 / HOUSE_BLOCK) {
        for bx in 0..(size.w as i32 / HOUSE_BLOCK) {
            let h = hash(seed ^ 0x27d4_eb2f, bx, by);
            if h % 3 != 0 {
                continue;
            }
            let x = bx * HOUSE_BLOCK + 2 + (h >> 8) as i32 % (HOUSE_BLOCK - 6);
            let y = by * HOUSE_BLOCK + 2 + (h >> 16) as i32 % (HOUSE_BLOCK - 5);
            houses.push(Rect::new(x, y, 3, 2));
        }
    }
    houses
}
