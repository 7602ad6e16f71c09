//! Image primitives.
//!
//! The pipeline uses a lightweight owned RGB image type (`OwnedImage`) that is
//! optimized for repeated cropping/upscaling of screenshot panels.
//!
//! Crops borrow a view (`Image<'a>`) instead of copying pixels; the copy only
//! happens once, when the preprocessor materializes the region it is about to
//! hand to the OCR engine.

use std::path::Path;

use anyhow::{Context, Result};

/// Owned RGB image (no alpha).
#[derive(Clone, Debug)]
pub struct OwnedImage {
    width: u32,
    height: u32,
    data: Vec<Color>,
}

impl OwnedImage {
    /// Build an `OwnedImage` from RGBA bytes (alpha is discarded).
    ///
    /// The buffer is expected to be tightly packed: `width * height * 4` bytes.
    pub fn from_rgba(width: usize, bytes: &[u8]) -> Self {
        let height = bytes.len() / width / 4;
        let data = bytes
            .chunks_exact(4)
            .map(|v| Color::new(v[0], v[1], v[2]))
            .collect::<Vec<_>>();

        Self {
            width: width as u32,
            height: height as u32,
            data,
        }
    }

    /// Decode a screenshot file (PNG/JPEG) into an `OwnedImage`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("decode image {}", path.display()))?
            .to_rgba8();
        Ok(Self::from_rgba(img.width() as usize, img.as_raw()))
    }

    /// Build a uniformly colored image. Mostly useful in tests.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self {
            width,
            height,
            data: vec![color; (width * height) as usize],
        }
    }

    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.data[(x + y * self.width) as usize]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        self.data[(x + y * self.width) as usize] = color;
    }

    /// Paint an axis-aligned rectangle. Out-of-bounds parts are clipped.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Color) {
        let x2 = x.saturating_add(w).min(self.width);
        let y2 = y.saturating_add(h).min(self.height);
        for py in y.min(self.height)..y2 {
            for px in x.min(self.width)..x2 {
                self.data[(px + py * self.width) as usize] = color;
            }
        }
    }

    pub fn map_pixels(&mut self, f: impl Fn(&mut Color)) {
        for v in &mut self.data {
            f(v);
        }
    }

    /// Resize this image to the given height (preserving aspect ratio).
    ///
    /// Uses `fast_image_resize` (SIMD-optimized); CatmullRom keeps glyph edges
    /// smooth enough for OCR after large upscale factors.
    pub fn resize_h(&mut self, height: u32) {
        if self.height == height {
            return;
        }

        let height = height.max(1);
        let width = (self.width as u64 * height as u64 / self.height.max(1) as u64) as u32;

        let src = fast_image_resize::images::Image::from_vec_u8(
            self.width,
            self.height,
            self.as_image().get_bytes(),
            fast_image_resize::PixelType::U8x3,
        )
        .expect("fast_image_resize: source buffer size mismatch");

        let mut dst =
            fast_image_resize::images::Image::new(width, height, fast_image_resize::PixelType::U8x3);

        let mut resizer = fast_image_resize::Resizer::new();
        let options = fast_image_resize::ResizeOptions::new().resize_alg(
            fast_image_resize::ResizeAlg::Interpolation(fast_image_resize::FilterType::CatmullRom),
        );

        resizer
            .resize(&src, &mut dst, &Some(options))
            .expect("fast_image_resize: resize failed");

        let bytes: Vec<u8> = dst.into_vec();
        let mut data = Vec::with_capacity((width * height) as usize);
        for px in bytes.chunks_exact(3) {
            data.push(Color::new(px[0], px[1], px[2]));
        }

        self.width = width;
        self.height = height;
        self.data = data;
    }

    #[inline]
    pub fn resized_h(mut self, height: u32) -> Self {
        self.resize_h(height);
        self
    }

    /// Create a borrowed view of this entire image.
    pub fn as_image(&self) -> Image<'_> {
        Image {
            x1: 0,
            y1: 0,
            x2: self.width,
            y2: self.height,
            true_width: self.width,
            data: &self.data,
        }
    }
}

// ----------

/// Borrowed image view into an `OwnedImage`.
#[derive(Clone, Copy)]
pub struct Image<'a> {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    true_width: u32,
    data: &'a [Color],
}

impl<'a> Image<'a> {
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    #[inline(always)]
    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    #[inline(always)]
    fn pixel(&self, x: u32, y: u32) -> &Color {
        &self.data[(x + y * self.true_width) as usize]
    }

    /// Create an arbitrary subimage (relative coordinates, clamped).
    pub fn sub_image(&self, x: u32, y: u32, width: u32, height: u32) -> Self {
        let x = x.min(self.width());
        let y = y.min(self.height());
        let width = width.min(self.width() - x);
        let height = height.min(self.height() - y);

        Self {
            x1: self.x1 + x,
            y1: self.y1 + y,
            x2: self.x1 + x + width,
            y2: self.y1 + y + height,
            true_width: self.true_width,
            data: self.data,
        }
    }

    pub fn to_owned_image(self) -> OwnedImage {
        let mut data = Vec::with_capacity((self.width() * self.height()) as usize);
        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                data.push(*self.pixel(x, y));
            }
        }

        OwnedImage {
            width: self.width(),
            height: self.height(),
            data,
        }
    }

    /// Tightly packed RGB bytes (the layout the OCR engine consumes).
    pub fn get_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0; (self.width() * self.height() * 3) as usize];
        let mut i = 0;
        for y in self.y1..self.y2 {
            for x in self.x1..self.x2 {
                let clr = self.pixel(x, y);
                bytes[i] = clr.r;
                bytes[i + 1] = clr.g;
                bytes[i + 2] = clr.b;
                i += 3;
            }
        }
        bytes
    }
}

// ----------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[repr(C)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::new(255, 255, 255);
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Perceptual brightness (ITU-R BT.601 luma).
    pub fn luma(&self) -> u8 {
        let r = self.r as u32;
        let g = self.g as u32;
        let b = self.b as u32;
        ((299 * r + 587 * g + 114 * b) / 1000) as u8
    }

    /// HSV-style saturation in `0.0..=1.0` (0 for black).
    pub fn saturation(&self) -> f32 {
        let max = self.r.max(self.g).max(self.b) as f32;
        let min = self.r.min(self.g).min(self.b) as f32;
        if max == 0.0 {
            return 0.0;
        }
        (max - min) / max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luma_matches_reference_weights() {
        assert_eq!(Color::WHITE.luma(), 255);
        assert_eq!(Color::BLACK.luma(), 0);
        // Green carries the largest weight, blue the smallest.
        assert!(Color::new(0, 255, 0).luma() > Color::new(255, 0, 0).luma());
        assert!(Color::new(255, 0, 0).luma() > Color::new(0, 0, 255).luma());
    }

    #[test]
    fn saturation_range() {
        assert_eq!(Color::new(128, 128, 128).saturation(), 0.0);
        assert_eq!(Color::BLACK.saturation(), 0.0);
        assert_eq!(Color::new(255, 0, 0).saturation(), 1.0);
        let mid = Color::new(200, 100, 100).saturation();
        assert!(mid > 0.0 && mid < 1.0);
    }

    #[test]
    fn sub_image_clamps_to_bounds() {
        let img = OwnedImage::filled(10, 10, Color::WHITE);
        let view = img.as_image().sub_image(8, 8, 20, 20);
        assert_eq!(view.width(), 2);
        assert_eq!(view.height(), 2);
    }

    #[test]
    fn sub_image_copies_the_right_pixels() {
        let mut img = OwnedImage::filled(4, 4, Color::WHITE);
        img.set_pixel(2, 1, Color::BLACK);

        let crop = img.as_image().sub_image(2, 1, 2, 2).to_owned_image();
        assert_eq!(crop.width(), 2);
        assert_eq!(crop.height(), 2);
        assert_eq!(crop.pixel(0, 0), Color::BLACK);
        assert_eq!(crop.pixel(1, 1), Color::WHITE);
    }

    #[test]
    fn fill_rect_clips() {
        let mut img = OwnedImage::filled(4, 4, Color::BLACK);
        img.fill_rect(3, 3, 10, 10, Color::WHITE);
        assert_eq!(img.pixel(3, 3), Color::WHITE);
        assert_eq!(img.pixel(2, 2), Color::BLACK);
    }

    #[test]
    fn resize_h_preserves_aspect() {
        let img = OwnedImage::filled(40, 20, Color::WHITE).resized_h(60);
        assert_eq!(img.height(), 60);
        assert_eq!(img.width(), 120);
    }
}
