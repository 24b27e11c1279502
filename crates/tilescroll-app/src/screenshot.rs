//! Headless screenshot tool.
//!
//! Renders the demo map in software in several states and saves PNG files
//! to `screenshots/`. Takes the same optional config path as the demo.
//!
//! Usage:
//!   cargo run -p tilescroll-app --bin tilescroll-screenshot [config.toml]
//!
//! Output:
//!   screenshots/01_origin.png    -- Top-left corner of the map
//!   screenshots/02_hero.png      -- Centred on a sprite among the houses
//!   screenshots/03_zoomed.png    -- Same view at twice the zoom
//!   screenshots/04_water.png     -- After the water animation advanced

use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use tilescroll_app::config::DemoConfig;
use tilescroll_app::map::{DECOR, DemoMap};
use tilescroll_core::cache::ImageCache;
use tilescroll_core::color::Color;
use tilescroll_core::geometry::{Point, Rect, Size};
use tilescroll_core::pixmap::{PixelFormat, Pixmap};
use tilescroll_core::soft::SoftPixmap;
use tilescroll_core::{BufferedRenderer, CameraGroup, Sprite};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DemoConfig::from_env()?;
    let (w, h) = (config.window.width, config.window.height);
    let out_dir = Path::new("screenshots");
    fs::create_dir_all(out_dir)?;

    let cache = Rc::new(ImageCache::<SoftPixmap>::new());
    let map = Rc::new(DemoMap::generate(&config.map, Rc::clone(&cache))?);
    let focus = map
        .houses()
        .first()
        .map(|house| {
            let tile = config.map.tile_size as i32;
            Point::new(house.x * tile, house.bottom() * tile)
        })
        .unwrap_or(Point::new(w as i32, h as i32));

    let mut renderer =
        BufferedRenderer::new(Rc::clone(&map), Size::new(w, h), config.renderer.clone())?;
    let mut frame = SoftPixmap::create(w, h, PixelFormat::Rgb)?;
    let dest = frame.rect();

    // 1. Origin.
    renderer.composite(&mut frame, dest, &[])?;
    save_png(&out_dir.join("01_origin.png"), w, h, &frame.to_rgba_bytes())?;
    log::info!("Saved 01_origin.png");

    // 2. Hero between the ground and the roofs.
    let mut hero = SoftPixmap::create(12, 12, PixelFormat::Rgba)?;
    hero.fill(Rect::new(2, 2, 8, 8), Color::rgb(240, 220, 60))?;
    hero.stroke_rect(hero.rect(), 2, Color::rgb(40, 30, 10))?;
    let mut group = CameraGroup::new();
    group.add(Sprite::new(
        Rc::new(hero),
        Rect::new(focus.x, focus.y - 6, 12, 12),
        DECOR,
    ));
    renderer.center(focus)?;
    group.draw(&mut renderer, &mut frame, dest)?;
    save_png(&out_dir.join("02_hero.png"), w, h, &frame.to_rgba_bytes())?;
    log::info!("Saved 02_hero.png");

    // 3. Zoomed in on the same spot.
    renderer.set_zoom(2.0)?;
    group.draw(&mut renderer, &mut frame, dest)?;
    save_png(&out_dir.join("03_zoomed.png"), w, h, &frame.to_rgba_bytes())?;
    log::info!("Saved 03_zoomed.png");

    // 4. Water one frame later.
    renderer.set_zoom(1.0)?;
    renderer.tick(Duration::ZERO)?;
    renderer.tick(Duration::from_millis(350))?;
    group.draw(&mut renderer, &mut frame, dest)?;
    save_png(&out_dir.join("04_water.png"), w, h, &frame.to_rgba_bytes())?;
    log::info!("Saved 04_water.png");

    let (hits, misses) = cache.stats();
    log::info!("Image cache: {hits} hits, {misses} conversions");
    log::info!("All screenshots saved to {}", out_dir.display());
    Ok(())
}

fn save_png(path: &Path, width: u32, height: u32, rgba: &[u8]) -> anyhow::Result<()> {
    let file = fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    let mut encoder = png::Encoder::new(writer, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(rgba)?;
    Ok(())
}
