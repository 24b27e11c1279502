//! World-to-screen transforms and a layered sprite group.

use std::rc::Rc;

use tilescroll_types::error::Result;
use tilescroll_types::geometry::{Point, Rect, Size};
use tilescroll_types::pixmap::Pixmap;

use crate::data::MapData;
use crate::renderer::{BufferedRenderer, ForeignSurface};

/// The renderer's view at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World pixel rectangle shown.
    pub view: Rect,
    /// Screen pixels per world pixel, per axis.
    pub ratio: (f32, f32),
}

impl Camera {
    /// Camera showing `view` on a `viewport`-sized screen area.
    pub fn new(view: Rect, viewport: Size) -> Self {
        let ratio = (
            viewport.w as f32 / view.w.max(1) as f32,
            viewport.h as f32 / view.h.max(1) as f32,
        );
        Self { view, ratio }
    }

    /// World rectangle to view pixels (unzoomed), as expected by
    /// [`ForeignSurface::rect`].
    pub fn world_to_view(&self, rect: Rect) -> Rect {
        rect.translate(-self.view.x, -self.view.y)
    }

    /// World rectangle to screen pixels, zoom applied.
    pub fn world_to_screen(&self, rect: Rect) -> Rect {
        let (rx, ry) = self.ratio;
        let p = self.point_to_screen(rect.origin());
        Rect::new(
            p.x,
            p.y,
            (rect.w as f32 * rx).round() as u32,
            (rect.h as f32 * ry).round() as u32,
        )
    }

    /// World point to screen pixels, zoom applied.
    pub fn point_to_screen(&self, point: Point) -> Point {
        let (rx, ry) = self.ratio;
        Point::new(
            ((point.x - self.view.x) as f32 * rx).round() as i32,
            ((point.y - self.view.y) as f32 * ry).round() as i32,
        )
    }

    pub fn is_visible(&self, rect: &Rect) -> bool {
        self.view.intersects(rect)
    }
}

/// An image placed in the world at a layer.
pub struct Sprite<P> {
    pub image: Rc<P>,
    /// World pixel rectangle.
    pub rect: Rect,
    pub layer: u32,
}

impl<P> Sprite<P> {
    pub fn new(image: Rc<P>, rect: Rect, layer: u32) -> Self {
        Self { image, rect, layer }
    }
}

/// Sprites drawn together with the map.
///
/// Within a layer, sprites draw in insertion order.
pub struct CameraGroup<P> {
    sprites: Vec<Sprite<P>>,
}

impl<P: Pixmap> CameraGroup<P> {
    pub fn new() -> Self {
        Self {
            sprites: Vec::new(),
        }
    }

    /// Add a sprite and return its index.
    pub fn add(&mut self, sprite: Sprite<P>) -> usize {
        self.sprites.push(sprite);
        self.sprites.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Option<Sprite<P>> {
        (index < self.sprites.len()).then(|| self.sprites.remove(index))
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Sprite<P>> {
        self.sprites.get_mut(index)
    }

    pub fn sprites(&self) -> &[Sprite<P>] {
        &self.sprites
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Composite the map with every visible sprite into `dest_rect`.
    ///
    /// Returns the screen rectangles of the sprites drawn, relative to
    /// `dest`.
    pub fn draw<A>(
        &self,
        renderer: &mut BufferedRenderer<A>,
        dest: &mut P,
        dest_rect: Rect,
    ) -> Result<Vec<Rect>>
    where
        A: MapData<Pixmap = P>,
    {
        let camera = renderer.camera();
        let visible: Vec<&Sprite<P>> = self
            .sprites
            .iter()
            .filter(|s| camera.is_visible(&s.rect))
            .collect();
        let surfaces: Vec<ForeignSurface<'_, P>> = visible
            .iter()
            .map(|s| {
                ForeignSurface::new(s.image.as_ref(), camera.world_to_view(s.rect), s.layer)
            })
            .collect();
        renderer.composite(dest, dest_rect, &surfaces)?;
        Ok(visible
            .iter()
            .map(|s| {
                camera
                    .world_to_screen(s.rect)
                    .translate(dest_rect.x, dest_rect.y)
            })
            .collect())
    }
}

impl<P: Pixmap> Default for CameraGroup<P> {
    fn default() -> Self {
        Self::new()
    }
}
