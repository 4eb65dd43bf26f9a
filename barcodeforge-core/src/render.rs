//! Raster rendering
//!
//! Bar pattern + style → RGB raster → PNG with pHYs DPI metadata.
//! No human-readable text is drawn.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use std::io::Cursor;
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::encoding::BarPattern;

const METERS_PER_INCH: f64 = 0.0254;

pub const WHITE: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);
pub const BLACK: Rgb<u8> = Rgb([0x00, 0x00, 0x00]);

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] png::EncodingError),

    #[error("PNG decoding failed: {0}")]
    Decode(#[from] png::DecodingError),

    #[error("Raster size overflows for {modules} modules")]
    Overflow { modules: usize },

    #[error("Resolution {0} DPI cannot be stored in PNG metadata")]
    ResolutionOverflow(u32),
}

/// Parse `#RRGGBB`, `RRGGBB`, `#RGB`, `RGB`, `black` or `white`.
pub fn parse_color(value: &str) -> Option<Rgb<u8>> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "black" => return Some(BLACK),
        "white" => return Some(WHITE),
        _ => {}
    }

    let hex = value.strip_prefix('#').unwrap_or(value);
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
        }
        3 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some(Rgb([channel(0)?, channel(1)?, channel(2)?]))
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStyle {
    pub module_width: u32,
    pub bar_height: u32,
    pub quiet_zone: u32,
    pub vertical_margin: u32,
    pub foreground: Rgb<u8>,
    pub background: Rgb<u8>,
}

impl RenderStyle {
    pub fn from_config(config: &PipelineConfig, foreground: Rgb<u8>) -> Self {
        Self {
            module_width: config.module_width,
            bar_height: config.bar_height,
            quiet_zone: config.quiet_zone,
            vertical_margin: config.vertical_margin,
            foreground,
            background: WHITE,
        }
    }

    /// Pixel size of an unscaled render; `None` if it does not fit in u32.
    pub fn native_size(&self, pattern: &BarPattern) -> Option<(u32, u32)> {
        let modules = u32::try_from(pattern.len())
            .ok()?
            .checked_add(self.quiet_zone.checked_mul(2)?)?;
        let width = modules.checked_mul(self.module_width)?;
        let height = self
            .bar_height
            .checked_add(self.vertical_margin.checked_mul(2)?)?;
        Some((width, height))
    }
}

/// Callers bound the native size before calling; this only guards overflow.
pub fn rasterize(pattern: &BarPattern, style: &RenderStyle) -> Result<RgbImage, RenderError> {
    let (width, height) = style
        .native_size(pattern)
        .ok_or(RenderError::Overflow { modules: pattern.len() })?;
    let mut image = RgbImage::from_pixel(width, height, style.background);

    let top = style.vertical_margin;
    for (i, &dark) in pattern.modules().iter().enumerate() {
        if !dark {
            continue;
        }
        let left = (style.quiet_zone + i as u32) * style.module_width;
        for x in left..left + style.module_width {
            for y in top..top + style.bar_height {
                image.put_pixel(x, y, style.foreground);
            }
        }
    }

    Ok(image)
}

/// Stretch to exactly `width` x `height`; aspect ratio is not preserved.
pub fn resize_exact(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Lanczos3)
}

/// Pixels per meter, or `None` when the value does not fit the pHYs field.
pub fn dpi_to_ppm(dpi: u32) -> Option<u32> {
    let ppm = (dpi as f64 / METERS_PER_INCH).round();
    (ppm <= u32::MAX as f64).then_some(ppm as u32)
}

fn ppm_to_dpi(ppm: u32) -> u32 {
    (ppm as f64 * METERS_PER_INCH).round() as u32
}

/// Encode as 8-bit RGB PNG with the same DPI on both axes.
pub fn encode_png(image: &RgbImage, dpi: u32) -> Result<Vec<u8>, RenderError> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let ppm = dpi_to_ppm(dpi).ok_or(RenderError::ResolutionOverflow(dpi))?;
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));
        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.as_raw())?;
        writer.finish()?;
    }
    Ok(out)
}

/// Dimensions and DPI read back from PNG bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngInfo {
    pub width: u32,
    pub height: u32,
    pub dpi: Option<(u32, u32)>,
}

pub fn read_png_info(bytes: &[u8]) -> Result<PngInfo, RenderError> {
    let reader = png::Decoder::new(Cursor::new(bytes)).read_info()?;
    let info = reader.info();
    let dpi = info
        .pixel_dims
        .filter(|dims| matches!(dims.unit, png::Unit::Meter))
        .map(|dims| (ppm_to_dpi(dims.xppu), ppm_to_dpi(dims.yppu)));

    Ok(PngInfo {
        width: info.width,
        height: info.height,
        dpi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{Ean13Encoder, Encoder};

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#ff0000"), Some(Rgb([255, 0, 0])));
        assert_eq!(parse_color("00FF00"), Some(Rgb([0, 255, 0])));
        assert_eq!(parse_color("#00f"), Some(Rgb([0, 0, 255])));
        assert_eq!(parse_color("Black"), Some(BLACK));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#gg0000"), None);
        assert_eq!(parse_color("teal"), None);
    }

    #[test]
    fn test_rasterize_geometry_and_colors() {
        let pattern = Ean13Encoder.encode("123456789012").unwrap();
        let style = RenderStyle::from_config(&PipelineConfig::default(), Rgb([10, 20, 30]));
        let image = rasterize(&pattern, &style).unwrap();

        assert_eq!(image.dimensions(), ((95 + 20) * 2, 120 + 20));
        // Quiet zone and margins stay background.
        assert_eq!(*image.get_pixel(0, 70), WHITE);
        assert_eq!(*image.get_pixel(30, 0), WHITE);
        // First module of the start guard is dark.
        assert_eq!(*image.get_pixel(20, 70), Rgb([10, 20, 30]));
        assert_eq!(*image.get_pixel(21, 70), Rgb([10, 20, 30]));
        // Second module of the start guard is light.
        assert_eq!(*image.get_pixel(22, 70), WHITE);
    }

    #[test]
    fn test_native_size_overflow_is_none() {
        let pattern = Ean13Encoder.encode("123456789012").unwrap();
        let mut style = RenderStyle::from_config(&PipelineConfig::default(), BLACK);
        style.quiet_zone = u32::MAX / 2 + 1;
        assert_eq!(style.native_size(&pattern), None);

        let mut style = RenderStyle::from_config(&PipelineConfig::default(), BLACK);
        style.module_width = u32::MAX;
        assert_eq!(style.native_size(&pattern), None);
        assert!(matches!(
            rasterize(&pattern, &style),
            Err(RenderError::Overflow { modules: 95 })
        ));
    }

    #[test]
    fn test_dpi_to_ppm_checked() {
        assert_eq!(dpi_to_ppm(300), Some(11811));
        assert_eq!(dpi_to_ppm(4_000_000_000), None);
        let image = RgbImage::from_pixel(1, 1, WHITE);
        assert!(matches!(
            encode_png(&image, 4_000_000_000),
            Err(RenderError::ResolutionOverflow(4_000_000_000))
        ));
    }

    #[test]
    fn test_png_dpi_roundtrip() {
        let image = RgbImage::from_pixel(4, 3, WHITE);
        let bytes = encode_png(&image, 300).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let info = read_png_info(&bytes).unwrap();
        assert_eq!(info, PngInfo { width: 4, height: 3, dpi: Some((300, 300)) });
    }

    #[test]
    fn test_resize_exact_ignores_aspect_ratio() {
        let image = RgbImage::from_pixel(230, 140, WHITE);
        let resized = resize_exact(&image, 400, 200);
        assert_eq!(resized.dimensions(), (400, 200));
    }
}
