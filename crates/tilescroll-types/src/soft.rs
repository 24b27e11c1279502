//! Software pixmap.
//!
//! [`SoftPixmap`] keeps pixels in a `Vec<Color>`. It needs no graphics
//! backend, so it serves headless rendering (screenshots) and tests.

use crate::color::{Color, blend_over};
use crate::error::{RenderError, Result};
use crate::geometry::{Point, Rect, Size};
use crate::pixmap::{PixelFormat, Pixmap, Transparency};

/// Largest side accepted by [`SoftPixmap::create`].
const MAX_DIMENSION: u32 = 16_384;

/// RGBA pixel buffer implementing [`Pixmap`] in software.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftPixmap {
    size: Size,
    format: PixelFormat,
    transparency: Transparency,
    clip: Option<Rect>,
    pixels: Vec<Color>,
}

impl SoftPixmap {
    /// Build a pixmap from raw pixels (row-major, `width * height` entries).
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Result<Self> {
        if pixels.len() != width as usize * height as usize {
            return Err(RenderError::Backend(format!(
                "pixel data has {} entries, expected {}x{}",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            size: Size::new(width, height),
            format: PixelFormat::Rgba,
            transparency: Transparency::Alpha,
            clip: None,
            pixels,
        })
    }

    /// A pixmap of one solid color.
    pub fn solid(width: u32, height: u32, color: Color) -> Result<Self> {
        let mut pm = Self::create(width, height, PixelFormat::Rgba)?;
        pm.pixels.fill(color);
        Ok(pm)
    }

    /// Color at `(x, y)`, or `None` outside the pixmap.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Color> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// Pixels as packed RGBA8888 bytes.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| c.to_bytes()).collect()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as u32 >= self.size.w || y as u32 >= self.size.h {
            None
        } else {
            Some(y as usize * self.size.w as usize + x as usize)
        }
    }

    /// Drawable area: bounds intersected with the clip.
    fn drawable(&self) -> Option<Rect> {
        let bounds = Rect::from_size(self.size);
        match self.clip {
            Some(clip) => bounds.intersection(&clip),
            None => Some(bounds),
        }
    }

    fn put(&mut self, i: usize, src: Color, mode: Transparency) {
        match mode {
            Transparency::Opaque => self.pixels[i] = src.with_alpha(255),
            Transparency::Alpha => self.pixels[i] = blend_over(src, self.pixels[i]),
            Transparency::ColorKey(key) => {
                if src.with_alpha(255) != key.with_alpha(255) {
                    self.pixels[i] = src.with_alpha(255);
                }
            }
        }
    }
}

impl Pixmap for SoftPixmap {
    fn create(width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(RenderError::Backend(format!(
                "pixmap {width}x{height} exceeds {MAX_DIMENSION}x{MAX_DIMENSION}"
            )));
        }
        Ok(Self {
            size: Size::new(width, height),
            format,
            transparency: format.transparency(),
            clip: None,
            pixels: vec![format.clear_color(); width as usize * height as usize],
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
        let Some(area) = self.drawable().and_then(|d| d.intersection(&rect)) else {
            return Ok(());
        };
        let w = self.size.w as usize;
        for y in area.y..area.bottom() {
            let row = y as usize * w;
            self.pixels[row + area.x as usize..row + area.right() as usize].fill(color);
        }
        Ok(())
    }

    fn blit(&mut self, src: &Self, src_rect: Rect, dst: Point) -> Result<()> {
        let Some(src_rect) = Rect::from_size(src.size).intersection(&src_rect) else {
            return Ok(());
        };
        let target = Rect::new(dst.x, dst.y, src_rect.w, src_rect.h);
        let Some(area) = self.drawable().and_then(|d| d.intersection(&target)) else {
            return Ok(());
        };
        let mode = src.transparency;
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let sx = src_rect.x + (x - dst.x);
                let sy = src_rect.y + (y - dst.y);
                if let (Some(si), Some(di)) = (src.index(sx, sy), self.index(x, y)) {
                    self.put(di, src.pixels[si], mode);
                }
            }
        }
        Ok(())
    }

    fn blit_scaled(&mut self, src: &Self, src_rect: Rect, dst_rect: Rect) -> Result<()> {
        if src_rect.is_empty() || dst_rect.is_empty() {
            return Ok(());
        }
        let Some(area) = self.drawable().and_then(|d| d.intersection(&dst_rect)) else {
            return Ok(());
        };
        let mode = src.transparency;
        // Nearest neighbour, sampling at pixel centres.
        for y in area.y..area.bottom() {
            let v = (y - dst_rect.y) as u64 * src_rect.h as u64 / dst_rect.h as u64;
            let sy = src_rect.y + v as i32;
            for x in area.x..area.right() {
                let u = (x - dst_rect.x) as u64 * src_rect.w as u64 / dst_rect.w as u64;
                let sx = src_rect.x + u as i32;
                if let (Some(si), Some(di)) = (src.index(sx, sy), self.index(x, y)) {
                    self.put(di, src.pixels[si], mode);
                }
            }
        }
        Ok(())
    }

    fn clip(&self) -> Option<Rect> {
        self.clip
    }

    fn set_clip(&mut self, clip: Option<Rect>) {
        self.clip = clip;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixmap::with_clip;

    const KEY: Color = Color::rgb(255, 0, 255);

    #[test]
    fn create_is_clear() {
        let pm = SoftPixmap::create(4, 4, PixelFormat::Rgba).unwrap();
        assert!(pm.pixels().iter().all(|c| *c == Color::TRANSPARENT));
        let pm = SoftPixmap::create(2, 2, PixelFormat::ColorKeyed(KEY)).unwrap();
        assert_eq!(pm.pixel(1, 1), Some(KEY));
    }

    #[test]
    fn fill_clips_to_bounds() {
        let mut pm = SoftPixmap::create(4, 4, PixelFormat::Rgb).unwrap();
        pm.fill(Rect::new(2, 2, 10, 10), Color::WHITE).unwrap();
        assert_eq!(pm.pixel(3, 3), Some(Color::WHITE));
        assert_eq!(pm.pixel(1, 1), Some(Color::BLACK));
    }

    #[test]
    fn fill_respects_clip() {
        let mut pm = SoftPixmap::create(4, 4, PixelFormat::Rgb).unwrap();
        with_clip(&mut pm, Rect::new(0, 0, 2, 2), |pm| {
            pm.fill_all(Color::WHITE)
        })
        .unwrap();
        assert_eq!(pm.pixel(1, 1), Some(Color::WHITE));
        assert_eq!(pm.pixel(2, 2), Some(Color::BLACK));
        assert_eq!(pm.clip(), None);
    }

    #[test]
    fn blit_opaque_copies() {
        let mut src = SoftPixmap::solid(2, 2, Color::rgb(9, 9, 9)).unwrap();
        src.set_transparency(Transparency::Opaque).unwrap();
        let mut dst = SoftPixmap::create(4, 4, PixelFormat::Rgb).unwrap();
        dst.blit(&src, src.rect(), Point::new(1, 1)).unwrap();
        assert_eq!(dst.pixel(1, 1), Some(Color::rgb(9, 9, 9)));
        assert_eq!(dst.pixel(3, 3), Some(Color::BLACK));
    }

    #[test]
    fn blit_colorkey_skips_key() {
        let mut src = SoftPixmap::from_pixels(2, 1, vec![KEY, Color::WHITE]).unwrap();
        src.set_transparency(Transparency::ColorKey(KEY)).unwrap();
        let mut dst = SoftPixmap::solid(2, 1, Color::rgb(1, 2, 3)).unwrap();
        dst.blit(&src, src.rect(), Point::default()).unwrap();
        assert_eq!(dst.pixel(0, 0), Some(Color::rgb(1, 2, 3)));
        assert_eq!(dst.pixel(1, 0), Some(Color::WHITE));
    }

    #[test]
    fn blit_alpha_blends() {
        let src = SoftPixmap::solid(1, 1, Color::rgba(255, 255, 255, 0)).unwrap();
        let mut dst = SoftPixmap::solid(1, 1, Color::rgb(5, 5, 5)).unwrap();
        dst.blit(&src, src.rect(), Point::default()).unwrap();
        assert_eq!(dst.pixel(0, 0), Some(Color::rgb(5, 5, 5)));
    }

    #[test]
    fn blit_negative_destination_clips() {
        let src = SoftPixmap::from_pixels(
            2,
            2,
            vec![Color::BLACK, Color::WHITE, Color::WHITE, Color::WHITE],
        )
        .unwrap();
        let mut dst = SoftPixmap::create(2, 2, PixelFormat::Rgb).unwrap();
        dst.blit(&src, src.rect(), Point::new(-1, -1)).unwrap();
        assert_eq!(dst.pixel(0, 0), Some(Color::WHITE));
        assert_eq!(dst.pixel(1, 1), Some(Color::BLACK));
    }

    #[test]
    fn blit_scaled_doubles() {
        let src = SoftPixmap::from_pixels(2, 1, vec![Color::BLACK, Color::WHITE]).unwrap();
        let mut dst = SoftPixmap::create(4, 2, PixelFormat::Rgba).unwrap();
        dst.blit_scaled(&src, src.rect(), dst.rect()).unwrap();
        assert_eq!(dst.pixel(1, 1), Some(Color::BLACK));
        assert_eq!(dst.pixel(2, 0), Some(Color::WHITE));
    }

    #[test]
    fn stroke_rect_outline_only() {
        let mut pm = SoftPixmap::create(5, 5, PixelFormat::Rgb).unwrap();
        pm.stroke_rect(pm.rect(), 1, Color::WHITE).unwrap();
        assert_eq!(pm.pixel(0, 2), Some(Color::WHITE));
        assert_eq!(pm.pixel(4, 4), Some(Color::WHITE));
        assert_eq!(pm.pixel(2, 2), Some(Color::BLACK));
    }

    #[test]
    fn convert_keeps_pixels_and_mode() {
        let mut src = SoftPixmap::from_pixels(1, 1, vec![KEY]).unwrap();
        src.set_transparency(Transparency::ColorKey(KEY)).unwrap();
        let out = src.convert(PixelFormat::Rgba).unwrap();
        assert_eq!(out.transparency(), Transparency::ColorKey(KEY));
        assert_eq!(out.format(), PixelFormat::Rgba);
    }

    #[test]
    fn from_pixels_checks_length() {
        assert!(SoftPixmap::from_pixels(2, 2, vec![Color::BLACK]).is_err());
    }
}
