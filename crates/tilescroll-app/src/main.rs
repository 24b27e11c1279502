//! tilescroll desktop demo.
//!
//! Scrolls a generated map around a hero sprite. Arrows or WASD move,
//! `+`/`-` zoom, `R` regenerates the map with the next seed, Escape quits.
//! The window is resizable.

use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;

use tilescroll_app::config::DemoConfig;
use tilescroll_app::input::{Action, Controls};
use tilescroll_app::map::{DECOR, DemoMap};
use tilescroll_backend_sdl::{SdlPixmap, SdlWindow};
use tilescroll_core::cache::ImageCache;
use tilescroll_core::color::Color;
use tilescroll_core::geometry::{Point, Rect};
use tilescroll_core::pixmap::{PixelFormat, Pixmap};
use tilescroll_core::{BufferedRenderer, CameraGroup, Sprite};

const FRAME_TIME: Duration = Duration::from_millis(16);
const HERO_SIZE: u32 = 12;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = DemoConfig::from_env()?;
    log::info!(
        "Starting tilescroll ({}x{}, map {}x{})",
        config.window.width,
        config.window.height,
        config.map.width,
        config.map.height,
    );

    let mut window = SdlWindow::new(
        &config.window.title,
        config.window.width,
        config.window.height,
    )?;
    let cache = Rc::new(ImageCache::<SdlPixmap>::new());
    let map = Rc::new(DemoMap::generate(&config.map, Rc::clone(&cache))?);
    let mut renderer = BufferedRenderer::new(map, window.size(), config.renderer.clone())?;

    let mut frame = new_frame(&window)?;
    let mut hero_image = SdlPixmap::create(HERO_SIZE, HERO_SIZE, PixelFormat::Rgba)?;
    hero_image.fill(Rect::new(2, 2, HERO_SIZE - 4, HERO_SIZE - 4), Color::rgb(240, 220, 60))?;
    hero_image.stroke_rect(hero_image.rect(), 2, Color::rgb(40, 30, 10))?;
    let start_pos = renderer.map_rect().size();
    let mut group = CameraGroup::new();
    let hero = group.add(Sprite::new(
        Rc::new(hero_image),
        Rect::new(
            start_pos.w as i32 / 2,
            start_pos.h as i32 / 2,
            HERO_SIZE,
            HERO_SIZE,
        ),
        DECOR,
    ));

    let mut controls = Controls::new();
    let start = Instant::now();
    'running: loop {
        for event in window.poll_events() {
            match controls.handle(event, renderer.zoom()) {
                Action::Quit => break 'running,
                Action::Continue => {},
                Action::Zoom(zoom) => {
                    if let Err(e) = renderer.set_zoom(zoom) {
                        log::warn!("zoom {zoom} rejected: {e}");
                    }
                },
                Action::Reload => {
                    config.map.seed = config.map.seed.wrapping_add(1);
                    cache.invalidate();
                    let map = DemoMap::generate(&config.map, Rc::clone(&cache))?;
                    renderer.reload(Rc::new(map))?;
                },
                Action::Resize(size) => {
                    renderer.resize(size)?;
                    frame = new_frame(&window)?;
                },
            }
        }

        let (dx, dy) = controls.direction(config.window.scroll_speed);
        let bounds = renderer.map_rect();
        if let Some(sprite) = group.get_mut(hero) {
            sprite.rect = sprite.rect.translate(dx, dy).clamp_within(&bounds);
            let focus = Point::new(
                sprite.rect.x + sprite.rect.w as i32 / 2,
                sprite.rect.y + sprite.rect.h as i32 / 2,
            );
            renderer.center(focus)?;
        }

        renderer.tick(start.elapsed())?;
        let dest = frame.rect();
        group.draw(&mut renderer, &mut frame, dest)?;
        window.present(&frame)?;
        std::thread::sleep(FRAME_TIME);
    }

    log::info!("tilescroll shutting down");
    Ok(())
}

fn new_frame(window: &SdlWindow) -> Result<SdlPixmap> {
    let size = window.size();
    Ok(SdlPixmap::create(size.w, size.h, PixelFormat::Rgb)?)
}
