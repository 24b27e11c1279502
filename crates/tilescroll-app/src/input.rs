use std::collections::HashSet;

use tilescroll_backend_sdl::{InputEvent, Key};
use tilescroll_core::geometry::Size;

/// Zoom multiplier per key press.
pub const ZOOM_STEP: f32 = 1.25;
pub const MIN_ZOOM: f32 = 0.25;
pub const MAX_ZOOM: f32 = 8.0;

/// What the main loop should do in response to one event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Continue,
    Quit,
    Zoom(f32),
    Reload,
    Resize(Size),
}

/// Tracks held direction keys between frames.
#[derive(Debug, Default)]
pub struct Controls {
    held: HashSet<Key>,
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Update held keys and translate `event` into an action.
    ///
    /// `zoom` is the renderer's current zoom level.
    pub fn handle(&mut self, event: InputEvent, zoom: f32) -> Action {
        match event {
            InputEvent::Quit | InputEvent::Press(Key::Cancel) => Action::Quit,
            InputEvent::Press(Key::ZoomIn) => Action::Zoom((zoom * ZOOM_STEP).min(MAX_ZOOM)),
            InputEvent::Press(Key::ZoomOut) => Action::Zoom((zoom / ZOOM_STEP).max(MIN_ZOOM)),
            InputEvent::Press(Key::Reload) => Action::Reload,
            InputEvent::Press(key) => {
                self.held.insert(key);
                Action::Continue
            },
            InputEvent::Release(key) => {
                self.held.remove(&key);
                Action::Continue
            },
            InputEvent::Resized(size) => Action::Resize(size),
        }
    }

    /// Movement for this frame at `speed` pixels per axis.
    pub fn direction(&self, speed: i32) -> (i32, i32) {
        let axis = |neg: Key, pos: Key| {
            (self.held.contains(&pos) as i32 - self.held.contains(&neg) as i32) * speed
        };
        (axis(Key::Left, Key::Right), axis(Key::Up, Key::Down))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_combine() {
        let mut c = Controls::new();
        c.handle(InputEvent::Press(Key::Right), 1.0);
        c.handle(InputEvent::Press(Key::Up), 1.0);
        assert_eq!(c.direction(3), (3, -3));
        c.handle(InputEvent::Press(Key::Left), 1.0);
        assert_eq!(c.direction(3), (0, -3));
        c.handle(InputEvent::Release(Key::Up), 1.0);
        c.handle(InputEvent::Release(Key::Right), 1.0);
        assert_eq!(c.direction(2), (-2, 0));
    }

    #[test]
    fn zoom_is_bounded() {
        let mut c = Controls::new();
        assert_eq!(c.handle(InputEvent::Press(Key::ZoomIn), 2.0), Action::Zoom(2.5));
        assert_eq!(
            c.handle(InputEvent::Press(Key::ZoomIn), MAX_ZOOM),
            Action::Zoom(MAX_ZOOM)
        );
        assert_eq!(
            c.handle(InputEvent::Press(Key::ZoomOut), MIN_ZOOM),
            Action::Zoom(MIN_ZOOM)
        );
    }

    #[test]
    fn escape_quits() {
        let mut c = Controls::new();
        assert_eq!(c.handle(InputEvent::Press(Key::Cancel), 1.0), Action::Quit);
        assert_eq!(c.handle(InputEvent::Quit, 1.0), Action::Quit);
        assert_eq!(c.direction(5), (0, 0));
    }
}
