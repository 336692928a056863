//!
//! Graphics backend contract (M8, second collaborator): a `RasterSink`
//! trait the core's `trace_bitmap` output is handed to, plus one concrete
//! implementation.
//!
//! `Palette` reproduces `get_palette_color` from the original `map2fig.c`:
//! a six-stop blue-cyan-yellow-red piecewise-linear ramp. `PngRasterSink`
//! is grounded in the teacher's `framewriter.rs`, which already writes
//! frames out through the `png` crate; here the encoder writes 8-bit RGBA
//! instead of 16-bit grayscale, since the raster is color-mapped first.
//!
use std::cell::RefCell;
use std::io::Write;

use crate::error::RenderError;
use crate::mollweide::RasterResult;

/// An RGB color with components in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

const LEVELS: [f64; 6] = [0.0, 0.15, 0.40, 0.70, 0.90, 1.00];
const COLORS: [Color; 6] = [
    Color { red: 0.0, green: 0.0, blue: 0.5 },
    Color { red: 0.0, green: 0.0, blue: 1.0 },
    Color { red: 0.0, green: 1.0, blue: 1.0 },
    Color { red: 1.0, green: 1.0, blue: 0.0 },
    Color { red: 1.0, green: 0.33, blue: 0.0 },
    Color { red: 0.5, green: 0.0, blue: 0.0 },
];

/// The fixed blue-cyan-yellow-red ramp `map2fig` has always used.
#[derive(Clone, Copy, Debug, Default)]
pub struct Palette;

impl Palette {
    /// Maps a normalized level in `[0, 1]` to a color by piecewise-linear
    /// interpolation between `LEVELS`/`COLORS`; clamps outside that range.
    pub fn color_at(&self, level: f64) -> Color {
        if level <= LEVELS[0] {
            return COLORS[0];
        }
        if level >= LEVELS[LEVELS.len() - 1] {
            return COLORS[COLORS.len() - 1];
        }
        let idx1 = LEVELS.iter().position(|&l| level <= l).unwrap_or(LEVELS.len() - 1);
        let idx0 = idx1 - 1;
        let span = LEVELS[idx1] - LEVELS[idx0];
        let t = (level - LEVELS[idx0]) / span;
        Color {
            red: COLORS[idx0].red + (COLORS[idx1].red - COLORS[idx0].red) * t,
            green: COLORS[idx0].green + (COLORS[idx1].green - COLORS[idx0].green) * t,
            blue: COLORS[idx0].blue + (COLORS[idx1].blue - COLORS[idx0].blue) * t,
        }
    }
}

/// Rendering options threaded down from the CLI front-end.
#[derive(Clone, Debug, Default)]
pub struct DrawOptions {
    pub title: Option<String>,
    pub measure_unit: Option<String>,
    pub draw_color_bar: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// A rendering backend that consumes a rasterized map and a palette.
pub trait RasterSink {
    fn draw(&self, raster: &RasterResult, palette: &Palette, options: &DrawOptions) -> Result<(), RenderError>;
}

const COLOR_BAR_HEIGHT: u32 = 24;
const TITLE_HEIGHT: u32 = 28;

/// Renders an RGBA PNG, matching `map2fig.c`'s `isinf` => transparent,
/// `isnan`/`<= -1.63e30` => opaque gray, else palette-mapped pixel
/// semantics. Title and color bar are drawn as flat bands above/below the
/// map raster rather than rendered glyphs, since this crate has no font
/// rasterizer dependency; the bands still carry the requested geometry.
pub struct PngRasterSink<W: Write> {
    writer: RefCell<W>,
}

impl<W: Write> PngRasterSink<W> {
    pub fn new(writer: W) -> Self {
        PngRasterSink { writer: RefCell::new(writer) }
    }
}

fn value_to_rgba(value: f64, min: f64, max: f64, palette: &Palette) -> [u8; 4] {
    if value.is_infinite() && value > 0.0 {
        return [255, 255, 255, 0];
    }
    if value.is_nan() || value <= crate::mollweide::UNSEEN_SENTINEL {
        return [128, 128, 128, 255];
    }
    let range = max - min;
    let normalized = if range > 0.0 { (value - min) / range } else { 0.0 };
    let color = palette.color_at(normalized);
    [
        (255.0 * color.red).clamp(0.0, 255.0) as u8,
        (255.0 * color.green).clamp(0.0, 255.0) as u8,
        (255.0 * color.blue).clamp(0.0, 255.0) as u8,
        255,
    ]
}

impl<W: Write> RasterSink for PngRasterSink<W> {
    fn draw(&self, raster: &RasterResult, palette: &Palette, options: &DrawOptions) -> Result<(), RenderError> {
        let min = options.min.or(raster.min).unwrap_or(0.0);
        let max = options.max.or(raster.max).unwrap_or(0.0);

        let title_band = if options.title.is_some() { TITLE_HEIGHT } else { 0 };
        let bar_band = if options.draw_color_bar { COLOR_BAR_HEIGHT } else { 0 };
        let height = raster.height + title_band + bar_band;
        let width = raster.width;

        let mut rgba = vec![0u8; (width as usize) * (height as usize) * 4];

        for row in 0..title_band {
            for col in 0..width {
                let idx = ((row * width + col) * 4) as usize;
                rgba[idx..idx + 4].copy_from_slice(&[32, 32, 32, 255]);
            }
        }

        for v in 0..raster.height {
            for u in 0..width {
                let value = raster.get(u, v);
                let rgba_px = value_to_rgba(value, min, max, palette);
                let row = title_band + v;
                let idx = ((row * width + u) * 4) as usize;
                rgba[idx..idx + 4].copy_from_slice(&rgba_px);
            }
        }

        for row in (title_band + raster.height)..height {
            for col in 0..width {
                let level = col as f64 / width.max(1) as f64;
                let color = palette.color_at(level);
                let idx = ((row * width + col) * 4) as usize;
                rgba[idx] = (255.0 * color.red) as u8;
                rgba[idx + 1] = (255.0 * color.green) as u8;
                rgba[idx + 2] = (255.0 * color.blue) as u8;
                rgba[idx + 3] = 255;
            }
        }

        let mut borrowed = self.writer.borrow_mut();
        let mut encoder = png::Encoder::new(&mut *borrowed, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| RenderError::Encoding(e.to_string()))?;
        writer
            .write_image_data(&rgba)
            .map_err(|e| RenderError::Encoding(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn palette_endpoints_match_original_stops() {
        let p = Palette;
        assert_eq!(p.color_at(0.0), Color { red: 0.0, green: 0.0, blue: 0.5 });
        assert_eq!(p.color_at(1.0), Color { red: 0.5, green: 0.0, blue: 0.0 });
        assert_eq!(p.color_at(-1.0), p.color_at(0.0));
        assert_eq!(p.color_at(2.0), p.color_at(1.0));
    }

    #[test]
    fn palette_interpolates_between_stops() {
        let p = Palette;
        let mid = p.color_at(0.15);
        assert_eq!(mid, Color { red: 0.0, green: 0.0, blue: 1.0 });
    }

    #[test]
    fn value_to_rgba_marks_infinity_transparent_and_sentinel_gray() {
        let palette = Palette;
        assert_eq!(value_to_rgba(f64::INFINITY, 0.0, 1.0, &palette), [255, 255, 255, 0]);
        assert_eq!(value_to_rgba(f64::NAN, 0.0, 1.0, &palette), [128, 128, 128, 255]);
        assert_eq!(value_to_rgba(-2.0e30, 0.0, 1.0, &palette), [128, 128, 128, 255]);
    }
}
