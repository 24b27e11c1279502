//! [`Pixmap`] over an SDL2 software surface.

use sdl2::pixels::{Color as SdlColor, PixelFormatEnum};
use sdl2::rect::Rect as SdlRect;
use sdl2::render::BlendMode;
use sdl2::surface::{Surface, SurfaceRef};

use tilescroll_types::color::Color;
use tilescroll_types::error::{RenderError, Result};
use tilescroll_types::geometry::{Point, Rect, Size};
use tilescroll_types::pixmap::{PixelFormat, Pixmap, Transparency};

/// An SDL2 surface used as tile source, offscreen buffer or frame.
///
/// RGB and colorkeyed pixmaps use `RGB888` storage, RGBA pixmaps use
/// `ARGB8888`. Transparency maps to SDL's per-surface blend mode and color
/// key, so it is applied once per surface rather than per blit.
pub struct SdlPixmap {
    surface: Surface<'static>,
    format: PixelFormat,
    transparency: Transparency,
    clip: Option<Rect>,
}

impl SdlPixmap {
    /// Build an RGBA pixmap from tightly packed RGBA bytes.
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self> {
        let row_bytes = width as usize * 4;
        if rgba.len() != row_bytes * height as usize {
            return Err(RenderError::Backend(format!(
                "expected {} bytes for {width}x{height} RGBA, got {}",
                row_bytes * height as usize,
                rgba.len()
            )));
        }
        let mut pm = Self::create(width, height, PixelFormat::Rgba)?;
        let pitch = pm.surface.pitch() as usize;
        pm.surface.with_lock_mut(|pixels| {
            for (y, row) in rgba.chunks_exact(row_bytes).enumerate() {
                let line = &mut pixels[y * pitch..y * pitch + row_bytes];
                for (dst, src) in line.chunks_exact_mut(4).zip(row.chunks_exact(4)) {
                    let packed = pack_argb([src[0], src[1], src[2], src[3]]);
                    dst.copy_from_slice(&packed.to_ne_bytes());
                }
            }
        });
        Ok(pm)
    }

    /// Copy the pixels out as tightly packed RGBA bytes.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        let Size { w, h } = self.size();
        let pitch = self.surface.pitch() as usize;
        let opaque = !matches!(self.format, PixelFormat::Rgba);
        let mut out = Vec::with_capacity(w as usize * h as usize * 4);
        self.surface.with_lock(|pixels| {
            for y in 0..h as usize {
                let line = &pixels[y * pitch..y * pitch + w as usize * 4];
                for px in line.chunks_exact(4) {
                    let mut rgba = unpack_argb(u32::from_ne_bytes([px[0], px[1], px[2], px[3]]));
                    if opaque {
                        rgba[3] = 255;
                    }
                    out.extend_from_slice(&rgba);
                }
            }
        });
        out
    }

    /// Underlying surface, for presenting to a window.
    pub fn surface(&self) -> &SurfaceRef {
        &self.surface
    }
}

impl Pixmap for SdlPixmap {
    fn create(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let surface = Surface::new(width, height, sdl_format(format)).map_err(backend_err)?;
        let mut pm = Self {
            surface,
            format,
            transparency: Transparency::Opaque,
            clip: None,
        };
        pm.fill(pm.rect(), format.clear_color())?;
        pm.set_transparency(format.transparency())?;
        Ok(pm)
    }

    fn size(&self) -> Size {
        Size::new(self.surface.width(), self.surface.height())
    }

    fn format(&self) -> PixelFormat {
        self.format
    }

    fn transparency(&self) -> Transparency {
        self.transparency
    }

    fn set_transparency(&mut self, mode: Transparency) -> Result<()> {
        let (key, blend) = match mode {
            Transparency::Opaque => (None, BlendMode::None),
            Transparency::Alpha => (None, BlendMode::Blend),
            Transparency::ColorKey(key) => (Some(key), BlendMode::None),
        };
        let keyed = match key {
            Some(key) => self.surface.set_color_key(true, sdl_color(key)),
            None => self.surface.set_color_key(false, SdlColor::BLACK),
        };
        keyed.map_err(backend_err)?;
        self.surface.set_blend_mode(blend).map_err(backend_err)?;
        self.transparency = mode;
        Ok(())
    }

    fn fill(&mut self, rect: Rect, color: Color) -> Result<()> {
        let Some(rect) = sdl_rect(rect) else {
            return Ok(());
        };
        self.surface
            .fill_rect(rect, sdl_color(color))
            .map_err(backend_err)
    }

    fn blit(&mut self, src: &Self, src_rect: Rect, dst: Point) -> Result<()> {
        let Some(from) = sdl_rect(src_rect) else {
            return Ok(());
        };
        let to = SdlRect::new(dst.x, dst.y, src_rect.w, src_rect.h);
        src.surface
            .blit(from, &mut self.surface, to)
            .map_err(backend_err)?;
        Ok(())
    }

    fn blit_scaled(&mut self, src: &Self, src_rect: Rect, dst_rect: Rect) -> Result<()> {
        let (Some(from), Some(to)) = (sdl_rect(src_rect), sdl_rect(dst_rect)) else {
            return Ok(());
        };
        src.surface
            .blit_scaled(from, &mut self.surface, to)
            .map_err(backend_err)?;
        Ok(())
    }

    fn clip(&self) -> Option<Rect> {
        self.clip
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
        // SDL cannot express an empty clip; a 1x1 rect off the surface
        // clips everything.
        let sdl_clip = clip.map(|c| sdl_rect(c).unwrap_or(SdlRect::new(-1, -1, 1, 1)));
        self.surface.set_clip_rect(sdl_clip);
    }
}

fn sdl_format(format: PixelFormat) -> PixelFormatEnum {
    match format {
        PixelFormat::Rgba => PixelFormatEnum::ARGB8888,
        PixelFormat::Rgb | PixelFormat::ColorKeyed(_) => PixelFormatEnum::RGB888,
    }
}

fn sdl_color(c: Color) -> SdlColor {
    SdlColor::RGBA(c.r, c.g, c.b, c.a)
}

/// SDL rects cannot be empty; `None` means nothing to draw.
fn sdl_rect(r: Rect) -> Option<SdlRect> {
    (!r.is_empty()).then(|| SdlRect::new(r.x, r.y, r.w, r.h))
}

fn backend_err(e: impl ToString) -> RenderError {
    RenderError::Backend(e.to_string())
}

/// RGBA bytes to a packed `0xAARRGGBB` value.
fn pack_argb([r, g, b, a]: [u8; 4]) -> u32 {
    u32::from_be_bytes([a, r, g, b])
}

/// Packed `0xAARRGGBB` (or `0x00RRGGBB`) value to RGBA bytes.
fn unpack_argb(v: u32) -> [u8; 4] {
    let [a, r, g, b] = v.to_be_bytes();
    [r, g, b, a]
}
