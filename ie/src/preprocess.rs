//! Region preprocessing: crop, upscale, binarize.
//!
//! Screenshot panels mix text of several colors drawn over illustrated icon
//! art; a naive grayscale threshold blackens the art along with the glyphs
//! and breaks the OCR engine's line segmentation. Two strategies are
//! provided:
//!
//! - [`Binarization::LumaContrast`] keeps the grayscale image but pushes
//!   every pixel away from mid-gray, sharpening the separation OCR engines
//!   expect while keeping anti-aliased edges informative.
//! - [`Binarization::TextIsolation`] classifies each pixel as text or not
//!   ([`is_text_pixel`]) and hard-binarizes: text black, everything else
//!   white. Needed when text sits directly on multicolor icon graphics.
//!
//! Everything here is a pure function of its inputs.

use crate::image::{Color, OwnedImage};
use crate::region::Region;

/// Pixel-level strategy that separates text from background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binarization {
    LumaContrast,
    TextIsolation,
}

/// Fractions of the crop that reliably contain no text (icon art on the
/// right edge, tooltips on the bottom) and are blanked after binarization.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PanelMask {
    pub right: f64,
    pub bottom: f64,
}

/// Preprocessing configuration for one recognition run.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Preprocess {
    pub binarization: Binarization,
    /// Minimum working height the crop is upscaled to. Higher targets read
    /// smaller glyphs at the cost of latency; crops are never downscaled.
    pub target_height: u32,
    /// Floor on the upscale factor even when the crop is already tall.
    pub min_scale: u32,
    pub mask: Option<PanelMask>,
}

impl Preprocess {
    /// Defaults for user-drawn regions: each region is small and tightly
    /// cropped around text, so gentle grayscale contrast is enough.
    pub fn per_region() -> Self {
        Self {
            binarization: Binarization::LumaContrast,
            target_height: 300,
            min_scale: 1,
            mask: None,
        }
    }

    /// Defaults for the whole item panel: text overlaps icon art, so isolate
    /// text pixels outright and blank the icon column on the right.
    pub fn full_panel() -> Self {
        Self {
            binarization: Binarization::TextIsolation,
            target_height: 1200,
            min_scale: 2,
            mask: Some(PanelMask {
                right: 0.33,
                bottom: 0.0,
            }),
        }
    }
}

impl Default for Preprocess {
    fn default() -> Self {
        Self::per_region()
    }
}

/// Crop `region` out of `image` and return an OCR-ready buffer.
pub fn preprocess(image: &OwnedImage, region: &Region, config: &Preprocess) -> OwnedImage {
    let rect = region.denormalize(image.width(), image.height());
    let mut crop = image
        .as_image()
        .sub_image(rect.x, rect.y, rect.w, rect.h)
        .to_owned_image();

    let scale = upscale_factor(crop.height(), config.target_height, config.min_scale);
    if scale > 1 {
        let target = crop.height() * scale;
        crop.resize_h(target);
    }

    match config.binarization {
        Binarization::LumaContrast => crop.map_pixels(|c| *c = contrast_push(*c)),
        Binarization::TextIsolation => crop.map_pixels(|c| {
            *c = if is_text_pixel(*c) {
                Color::BLACK
            } else {
                Color::WHITE
            }
        }),
    }

    if let Some(mask) = config.mask {
        blank_masked_edges(&mut crop, mask);
    }

    crop
}

/// Integer upscale factor bringing `height` to at least `target`; never
/// below `min_scale` and never under 1 (no downscaling).
pub fn upscale_factor(height: u32, target: u32, min_scale: u32) -> u32 {
    let height = height.max(1);
    target.div_ceil(height).max(min_scale).max(1)
}

/// Push a pixel's gray value away from mid-gray by a fixed offset.
///
/// Keeps the image grayscale rather than binary so anti-aliased glyph edges
/// survive for the engine's own thresholding.
pub fn contrast_push(c: Color) -> Color {
    let gray = c.luma();
    let enhanced = if gray < 128 {
        gray.saturating_sub(30)
    } else {
        gray.saturating_add(30)
    };
    Color::new(enhanced, enhanced, enhanced)
}

/// Text/background classifier for panel pixels.
///
/// Text is either a bright low-saturation overlay (white numerals) or a
/// moderately bright saturated glyph (colored skill names over icon art).
pub fn is_text_pixel(c: Color) -> bool {
    let brightness = c.luma();
    let saturation = c.saturation();
    (brightness > 150 && saturation < 0.40) || (brightness > 40 && saturation > 0.15)
}

fn blank_masked_edges(image: &mut OwnedImage, mask: PanelMask) {
    let (w, h) = (image.width(), image.height());

    let right = (mask.right.clamp(0.0, 1.0) * w as f64).round() as u32;
    if right > 0 {
        image.fill_rect(w - right, 0, right, h, Color::WHITE);
    }

    let bottom = (mask.bottom.clamp(0.0, 1.0) * h as f64).round() as u32;
    if bottom > 0 {
        image.fill_rect(0, h - bottom, w, bottom, Color::WHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::RecognitionMode;

    fn full_region() -> Region {
        Region {
            id: "r_1".into(),
            label: "전체".into(),
            nx: 0.0,
            ny: 0.0,
            nw: 1.0,
            nh: 1.0,
            mode: RecognitionMode::Block,
        }
    }

    #[test]
    fn upscale_factor_never_downscales() {
        assert_eq!(upscale_factor(100, 300, 1), 3);
        assert_eq!(upscale_factor(150, 300, 1), 2);
        assert_eq!(upscale_factor(400, 300, 1), 1);
        // Full-panel profile keeps a factor floor of 2.
        assert_eq!(upscale_factor(700, 1200, 2), 2);
        assert_eq!(upscale_factor(100, 1200, 2), 12);
        assert_eq!(upscale_factor(0, 300, 1), 300);
    }

    #[test]
    fn contrast_push_separates_around_mid_gray() {
        assert_eq!(contrast_push(Color::new(100, 100, 100)).r, 70);
        assert_eq!(contrast_push(Color::new(200, 200, 200)).r, 230);
        // Saturating at the ends.
        assert_eq!(contrast_push(Color::new(10, 10, 10)).r, 0);
        assert_eq!(contrast_push(Color::new(240, 240, 240)).r, 255);
        // Output is grayscale regardless of input hue.
        let pushed = contrast_push(Color::new(200, 40, 40));
        assert_eq!(pushed.r, pushed.g);
        assert_eq!(pushed.g, pushed.b);
    }

    #[test]
    fn classifier_accepts_bright_and_colored_text() {
        // White numeric overlay.
        assert!(is_text_pixel(Color::new(255, 255, 255)));
        assert!(is_text_pixel(Color::new(200, 200, 190)));
        // Colored skill-name glyph over icon art.
        assert!(is_text_pixel(Color::new(200, 120, 40)));
        assert!(is_text_pixel(Color::new(80, 160, 220)));
    }

    #[test]
    fn classifier_rejects_dark_background() {
        assert!(!is_text_pixel(Color::BLACK));
        assert!(!is_text_pixel(Color::new(30, 30, 30)));
        // Dark but desaturated: neither branch fires.
        assert!(!is_text_pixel(Color::new(60, 60, 60)));
    }

    #[test]
    fn preprocess_upscales_and_binarizes() {
        let img = OwnedImage::filled(60, 30, Color::new(220, 130, 30));
        let out = preprocess(&img, &full_region(), &Preprocess::full_panel());

        // 30 px tall -> factor 40 to reach 1200.
        assert_eq!(out.height(), 1200);
        // Saturated orange is classified as text -> black.
        assert_eq!(out.pixel(0, 0), Color::BLACK);
    }

    #[test]
    fn preprocess_masks_the_icon_column() {
        let img = OwnedImage::filled(100, 50, Color::new(220, 130, 30));
        let config = Preprocess {
            target_height: 50,
            ..Preprocess::full_panel()
        };
        let out = preprocess(&img, &full_region(), &config);

        // Left side keeps the classified text pixels, right third is blanked.
        assert_eq!(out.pixel(0, 0), Color::BLACK);
        assert_eq!(out.pixel(out.width() - 1, 0), Color::WHITE);
        assert_eq!(out.pixel(out.width() - 1, out.height() - 1), Color::WHITE);
    }

    #[test]
    fn preprocess_respects_the_region_rect() {
        let mut img = OwnedImage::filled(100, 100, Color::BLACK);
        // Bright block only inside the top-left quadrant.
        img.fill_rect(0, 0, 50, 50, Color::WHITE);

        let region = Region {
            nw: 0.5,
            nh: 0.5,
            ..full_region()
        };
        let config = Preprocess {
            binarization: Binarization::TextIsolation,
            target_height: 50,
            min_scale: 1,
            mask: None,
        };
        let out = preprocess(&img, &region, &config);
        assert_eq!(out.height(), 50);
        // The whole crop was the white block -> all classified text.
        assert_eq!(out.pixel(0, 0), Color::BLACK);
        assert_eq!(out.pixel(out.width() - 1, out.height() - 1), Color::BLACK);
    }
}
