//! SDL2 backend for tilescroll.
//!
//! [`SdlPixmap`] implements `Pixmap` over SDL2 software surfaces, so the
//! renderer's buffer, tilesets and sprites all live in SDL memory and blits
//! go through `SDL_BlitSurface`. [`SdlWindow`] presents a finished frame and
//! turns SDL events into [`InputEvent`]s.

mod pixmap;

use sdl2::EventPump;
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;
use sdl2::video::Window;

use tilescroll_types::error::{RenderError, Result};
use tilescroll_types::geometry::Size;

pub use pixmap::SdlPixmap;

/// Keys the demo reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    ZoomIn,
    ZoomOut,
    Reload,
    Cancel,
}

/// Input events produced by [`SdlWindow::poll_events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Quit,
    Press(Key),
    Release(Key),
    Resized(Size),
}

/// A window that displays [`SdlPixmap`] frames through its window surface.
pub struct SdlWindow {
    window: Window,
    event_pump: EventPump,
    _sdl: sdl2::Sdl,
}

impl SdlWindow {
    /// Create a new SDL2 window.
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
        let sdl = sdl2::init().map_err(|e| RenderError::Backend(e.to_string()))?;
        let video = sdl
            .video()
            .map_err(|e| RenderError::Backend(e.to_string()))?;
        let window = video
            .window(title, width, height)
            .position_centered()
            .resizable()
            .build()
            .map_err(|e| RenderError::Backend(e.to_string()))?;
        let event_pump = sdl
            .event_pump()
            .map_err(|e| RenderError::Backend(e.to_string()))?;

        log::info!("SDL2 window initialized: {width}x{height}");

        Ok(Self {
            window,
            event_pump,
            _sdl: sdl,
        })
    }

    /// Current drawable size.
    pub fn size(&self) -> Size {
        let (w, h) = self.window.size();
        Size::new(w, h)
    }

    /// Copy `frame` to the window and show it.
    pub fn present(&mut self, frame: &SdlPixmap) -> Result<()> {
        let mut target = self
            .window
            .surface(&self.event_pump)
            .map_err(|e| RenderError::Backend(e.to_string()))?;
        frame
            .surface()
            .blit(None, &mut target, None)
            .map_err(|e| RenderError::Backend(e.to_string()))?;
        target
            .update_window()
            .map_err(|e| RenderError::Backend(e.to_string()))
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();
        for event in self.event_pump.poll_iter() {
            if let Some(e) = map_sdl_event(event) {
                events.push(e);
            }
        }
        events
    }
}

/// Map an SDL2 event to a tilescroll input event.
fn map_sdl_event(event: Event) -> Option<InputEvent> {
    match event {
        Event::Quit { .. } => Some(InputEvent::Quit),
        Event::KeyDown {
            keycode: Some(key),
            repeat: false,
            ..
        } => map_key(key).map(InputEvent::Press),
        Event::KeyUp {
            keycode: Some(key), ..
        } => map_key(key).map(InputEvent::Release),
        Event::Window {
            win_event: WindowEvent::SizeChanged(w, h),
            ..
        } => Some(InputEvent::Resized(Size::new(w.max(1) as u32, h.max(1) as u32))),
        _ => None,
    }
}

fn map_key(key: Keycode) -> Option<Key> {
    match key {
        Keycode::Up | Keycode::W => Some(Key::Up),
        Keycode::Down | Keycode::S => Some(Key::Down),
        Keycode::Left | Keycode::A => Some(Key::Left),
        Keycode::Right | Keycode::D => Some(Key::Right),
        Keycode::Equals | Keycode::Plus | Keycode::KpPlus => Some(Key::ZoomIn),
        Keycode::Minus | Keycode::KpMinus => Some(Key::ZoomOut),
        Keycode::R => Some(Key::Reload),
        Keycode::Escape => Some(Key::Cancel),
        _ => None,
    }
}
