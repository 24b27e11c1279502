//! Pixmap trait definitions.
//!
//! A [`Pixmap`] is a pixel rectangle that is both an image source and a render
//! target. The renderer only talks to pixel storage through this trait, so a
//! backend plugs in by implementing it for its surface type.
//!
//! The core methods are required. The extended primitives have default
//! implementations built from the core methods; backends may override them
//! with native versions.

use crate::color::Color;
use crate::error::Result;
use crate::geometry::{Point, Rect, Size};

/// How a pixmap's pixels combine with the destination when blitted.
///
/// The mode is a property of the source image (usually a whole tileset) and
/// is chosen once when the image is loaded, not per draw call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Transparency {
    /// Source pixels overwrite the destination.
    #[default]
    Opaque,
    /// Source pixels are blended using their alpha channel.
    Alpha,
    /// Source pixels equal to the key color are skipped; all others overwrite.
    ColorKey(Color),
}

/// Storage format requested when allocating a pixmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PixelFormat {
    /// Opaque RGB storage.
    #[default]
    Rgb,
    /// RGBA storage with a per-pixel alpha channel.
    Rgba,
    /// RGB storage where one color is reserved as transparent.
    ColorKeyed(Color),
}

impl PixelFormat {
    /// Transparency mode a pixmap of this format is blitted with.
    pub const fn transparency(self) -> Transparency {
        match self {
            Self::Rgb => Transparency::Opaque,
            Self::Rgba => Transparency::Alpha,
            Self::ColorKeyed(key) => Transparency::ColorKey(key),
        }
    }

    /// Color that represents "nothing drawn here" for this format.
    pub const fn clear_color(self) -> Color {
        match self {
            Self::Rgb => Color::BLACK,
            Self::Rgba => Color::TRANSPARENT,
            Self::ColorKeyed(key) => key,
        }
    }

    /// Whether a pixmap of this format can leave destination pixels visible.
    pub const fn is_transparent(self) -> bool {
        !matches!(self, Self::Rgb)
    }
}

/// Pixel storage and drawing primitives.
///
/// # Core Methods (required)
///
/// `create`, `size`, `format`, `transparency`, `set_transparency`, `fill`,
/// `blit`, `blit_scaled`, `clip`, and `set_clip`.
///
/// # Extended Primitives (optional, with defaults)
///
/// `stroke_rect` and `convert` are built from the core methods.
///
/// All drawing is clipped to the pixmap bounds and to the current clip
/// rectangle.
pub trait Pixmap: Sized {
    // -----------------------------------------------------------------------
    // Core methods (required -- no default implementations)
    // -----------------------------------------------------------------------

    /// Allocate a pixmap filled with the format's clear color.
    fn create(width: u32, height: u32, format: PixelFormat) -> Result<Self>;

    /// Pixel dimensions.
    fn size(&self) -> Size;

    /// Storage format this pixmap was created with.
    fn format(&self) -> PixelFormat;

    /// Mode used when this pixmap is the source of a blit.
    fn transparency(&self) -> Transparency;

    /// Change the mode used when this pixmap is the source of a blit.
    fn set_transparency(&mut self, mode: Transparency) -> Result<()>;

    /// Overwrite every pixel of `rect` with `color` (no blending).
    fn fill(&mut self, rect: Rect, color: Color) -> Result<()>;

    /// Copy `src_rect` of `src` to `dst`, honoring `src.transparency()`.
    fn blit(&mut self, src: &Self, src_rect: Rect, dst: Point) -> Result<()>;

    /// Copy `src_rect` of `src` stretched to cover `dst_rect`.
    fn blit_scaled(&mut self, src: &Self, src_rect: Rect, dst_rect: Rect) -> Result<()>;

    /// Current clip rectangle, `None` for the whole pixmap.
    fn clip(&self) -> Option<Rect>;

    /// Restrict subsequent drawing to `clip` (`None` resets to the whole pixmap).
    fn set_clip(&mut self, clip: Option<Rect>);

    // -----------------------------------------------------------------------
    // Extended primitives (optional, with defaults)
    // -----------------------------------------------------------------------

    /// Bounds as a rectangle at the origin.
    fn rect(&self) -> Rect {
        Rect::from_size(self.size())
    }

    /// Fill the whole pixmap (within the clip) with `color`.
    fn fill_all(&mut self, color: Color) -> Result<()> {
        let rect = self.rect();
        self.fill(rect, color)
    }

    /// Draw the outline of a rectangle.
    ///
    /// `stroke_width` is drawn inward from the given bounds.
    fn stroke_rect(&mut self, rect: Rect, stroke_width: u32, color: Color) -> Result<()> {
        let sw = stroke_width.min(rect.w / 2 + 1).min(rect.h / 2 + 1);
        if sw == 0 || rect.is_empty() {
            return Ok(());
        }
        let Rect { x, y, w, h } = rect;
        self.fill(Rect::new(x, y, w, sw), color)?;
        self.fill(Rect::new(x, y + h as i32 - sw as i32, w, sw), color)?;
        let inner_h = h.saturating_sub(sw * 2);
        self.fill(Rect::new(x, y + sw as i32, sw, inner_h), color)?;
        self.fill(
            Rect::new(x + w as i32 - sw as i32, y + sw as i32, sw, inner_h),
            color,
        )?;
        Ok(())
    }

    /// Copy this pixmap into a new one with a different storage format.
    ///
    /// The copy keeps this pixmap's transparency mode.
    fn convert(&self, format: PixelFormat) -> Result<Self> {
        let size = self.size();
        let mut out = Self::create(size.w, size.h, format)?;
        out.blit(self, self.rect(), Point::default())?;
        out.set_transparency(self.transparency())?;
        Ok(out)
    }
}

/// Run `f` with the clip of `target` restricted to `clip`, then restore it.
pub fn with_clip<P, T>(
    target: &mut P,
    clip: Rect,
    f: impl FnOnce(&mut P) -> Result<T>,
) -> Result<T>
where
    P: Pixmap,
{
    let previous = target.clip();
    let effective = match previous {
        Some(prev) => prev.intersection(&clip).unwrap_or(Rect::new(clip.x, clip.y, 0, 0)),
        None => clip,
    };
    target.set_clip(Some(effective));
    let result = f(target);
    target.set_clip(previous);
    result
}
