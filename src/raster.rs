use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::{ImageFormat, Rgba, RgbaImage};
use imageproc::filter::gaussian_blur_f32;
use reqwest::blocking::Client;
use tracing::warn;

use crate::render::{Align, Color, DrawOp, Rect, Weight};

const FONT_REGULAR_FILE: &str = "Figtree-Regular.ttf";
const FONT_REGULAR_URL: &str =
    "https://fonts.gstatic.com/s/figtree/v9/_Xmz-HUzqDCFdgfMsYiV_F7wfS-Bs_d_QF5e.ttf";
const FONT_BOLD_FILE: &str = "Figtree-Bold.ttf";
const FONT_BOLD_URL: &str =
    "https://fonts.gstatic.com/s/figtree/v9/_Xmz-HUzqDCFdgfMsYiV_F7wfS-Bs_eYR15e.ttf";

#[derive(Debug)]
pub enum RasterError {
    Font(String),
    Network(String),
    Io(io::Error),
    Encode(String),
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RasterError::Font(message) => write!(f, "Font error: {message}"),
            RasterError::Network(message) => write!(f, "Network error: {message}"),
            RasterError::Io(err) => write!(f, "IO error: {err}"),
            RasterError::Encode(message) => write!(f, "Image encoding error: {message}"),
        }
    }
}

impl std::error::Error for RasterError {}

impl From<io::Error> for RasterError {
    fn from(err: io::Error) -> Self {
        RasterError::Io(err)
    }
}

/// Replays drawing commands onto a pixel canvas. Holds the two Figtree
/// faces; they get downloaded once and cached under ~/.cache.
pub struct Rasterizer {
    regular: FontArc,
    bold: FontArc,
}

impl Rasterizer {
    pub fn new() -> Result<Self, RasterError> {
        let cache_dir = font_cache_dir()
            .ok_or_else(|| RasterError::Font("Home directory not found".to_string()))?;
        ensure_cache_dir(&cache_dir)?;

        let regular_path = cache_dir.join(FONT_REGULAR_FILE);
        let bold_path = cache_dir.join(FONT_BOLD_FILE);

        if !regular_path.exists() {
            if let Err(err) = fetch_to_file(FONT_REGULAR_URL, &regular_path) {
                warn!("failed to fetch {FONT_REGULAR_FILE}: {err}");
            }
        }
        if !bold_path.exists() {
            if let Err(err) = fetch_to_file(FONT_BOLD_URL, &bold_path) {
                warn!("failed to fetch {FONT_BOLD_FILE}: {err}");
            }
        }

        let regular = read_font(&regular_path);
        let bold = read_font(&bold_path);

        match (regular, bold) {
            (Some(regular), Some(bold)) => Ok(Self { regular, bold }),
            (Some(regular), None) => Ok(Self {
                bold: regular.clone(),
                regular,
            }),
            (None, Some(bold)) => Ok(Self {
                regular: bold.clone(),
                bold,
            }),
            (None, None) => Err(RasterError::Font(
                "Could not download or parse the Figtree font files".to_string(),
            )),
        }
    }

    pub fn render(&self, ops: &[DrawOp], width: u32, height: u32) -> RgbaImage {
        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255]));
        for op in ops {
            match op {
                DrawOp::Clear { color } => {
                    canvas = RgbaImage::from_pixel(width, height, rgba(*color));
                }
                DrawOp::RoundRect { rect, radius, color } => {
                    fill_round_rect(&mut canvas, *rect, *radius, rgba(*color));
                }
                DrawOp::StrokeRoundRect {
                    rect,
                    radius,
                    stroke,
                    color,
                } => {
                    stroke_round_rect(&mut canvas, *rect, *radius, *stroke, rgba(*color));
                }
                DrawOp::Glow {
                    rect,
                    radius,
                    spread,
                    color,
                } => {
                    draw_glow(&mut canvas, *rect, *radius, *spread, rgba(*color));
                }
                DrawOp::Text {
                    text,
                    x,
                    y,
                    size,
                    color,
                    align,
                    weight,
                } => {
                    let font = match weight {
                        Weight::Regular => &self.regular,
                        Weight::Bold => &self.bold,
                    };
                    let text_width = measure_text_width(font, *size, text);
                    let anchor = match align {
                        Align::Left => *x,
                        Align::Center => *x - text_width / 2.0,
                        Align::Right => *x - text_width,
                    };
                    draw_text(&mut canvas, font, *size, rgba(*color), anchor, *y, text);
                }
            }
        }
        canvas
    }

    pub fn write_png(
        &self,
        ops: &[DrawOp],
        width: u32,
        height: u32,
        path: &Path,
    ) -> Result<(), RasterError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let canvas = self.render(ops, width, height);
        canvas
            .save_with_format(path, ImageFormat::Png)
            .map_err(|err| RasterError::Encode(err.to_string()))
    }
}

fn read_font(path: &Path) -> Option<FontArc> {
    fs::read(path)
        .ok()
        .and_then(|bytes| FontArc::try_from_vec(bytes).ok())
}

fn fetch_to_file(url: &str, path: &Path) -> Result<(), RasterError> {
    let client = Client::builder()
        .user_agent("streakwall")
        .build()
        .map_err(|err| RasterError::Network(err.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|err| RasterError::Network(err.to_string()))?;
    if !response.status().is_success() {
        return Err(RasterError::Network(format!(
            "Failed to fetch {} (status {})",
            url,
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .map_err(|err| RasterError::Network(err.to_string()))?;
    fs::write(path, &bytes)?;
    Ok(())
}

fn ensure_cache_dir(path: &Path) -> Result<(), RasterError> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o700))?;
        }
    }
    Ok(())
}

fn font_cache_dir() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".cache").join("streakwall").join("fonts"))
}

fn rgba(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, color.a])
}

fn draw_text(
    canvas: &mut RgbaImage,
    font: &FontArc,
    font_size: f32,
    color: Rgba<u8>,
    x: f32,
    baseline_y: f32,
    text: &str,
) {
    let scale = PxScale::from(font_size);
    let scaled_font = font.as_scaled(scale);

    let mut caret_x = x;
    let mut prev_glyph: Option<GlyphId> = None;

    for ch in text.chars() {
        let glyph_id = scaled_font.glyph_id(ch);
        if let Some(prev) = prev_glyph {
            caret_x += scaled_font.kern(prev, glyph_id);
        }

        let glyph = glyph_id.with_scale_and_position(scale, point(caret_x, baseline_y));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                blend_pixel_with_coverage(canvas, px, py, color, coverage);
            });
        }

        caret_x += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }
}

fn measure_text_width(font: &FontArc, font_size: f32, text: &str) -> f32 {
    let scale = PxScale::from(font_size);
    let scaled_font = font.as_scaled(scale);
    let mut width = 0.0f32;
    let mut prev_glyph: Option<GlyphId> = None;

    for ch in text.chars() {
        let glyph_id = scaled_font.glyph_id(ch);
        if let Some(prev) = prev_glyph {
            width += scaled_font.kern(prev, glyph_id);
        }
        width += scaled_font.h_advance(glyph_id);
        prev_glyph = Some(glyph_id);
    }

    width
}

fn fill_round_rect(canvas: &mut RgbaImage, rect: Rect, radius: f32, color: Rgba<u8>) {
    if rect.w <= 0.0 || rect.h <= 0.0 {
        return;
    }
    let x0 = rect.x.floor() as i32;
    let y0 = rect.y.floor() as i32;
    let x1 = (rect.x + rect.w).ceil() as i32;
    let y1 = (rect.y + rect.h).ceil() as i32;

    for py in y0..y1 {
        for px in x0..x1 {
            if point_in_rounded_rect(
                px as f32 + 0.5,
                py as f32 + 0.5,
                rect.x,
                rect.y,
                rect.w,
                rect.h,
                radius,
            ) {
                blend_pixel(canvas, px, py, color);
            }
        }
    }
}

/// Stroke centered on the rect edge, half inside and half outside,
/// the way a stroked path paints.
fn stroke_round_rect(canvas: &mut RgbaImage, rect: Rect, radius: f32, stroke: f32, color: Rgba<u8>) {
    if rect.w <= 0.0 || rect.h <= 0.0 || stroke <= 0.0 {
        return;
    }
    let half = stroke / 2.0;
    let outer = Rect {
        x: rect.x - half,
        y: rect.y - half,
        w: rect.w + stroke,
        h: rect.h + stroke,
    };
    let inner = Rect {
        x: rect.x + half,
        y: rect.y + half,
        w: rect.w - stroke,
        h: rect.h - stroke,
    };
    let outer_radius = radius + half;
    let inner_radius = (radius - half).max(0.0);

    let x0 = outer.x.floor() as i32;
    let y0 = outer.y.floor() as i32;
    let x1 = (outer.x + outer.w).ceil() as i32;
    let y1 = (outer.y + outer.h).ceil() as i32;

    for py in y0..y1 {
        for px in x0..x1 {
            let cx = px as f32 + 0.5;
            let cy = py as f32 + 0.5;
            if !point_in_rounded_rect(cx, cy, outer.x, outer.y, outer.w, outer.h, outer_radius) {
                continue;
            }
            if !point_in_rounded_rect(cx, cy, inner.x, inner.y, inner.w, inner.h, inner_radius) {
                blend_pixel(canvas, px, py, color);
            }
        }
    }
}

/// Soft halo behind a cell. The shape is stamped on a scratch layer
/// with uniform color and shaped alpha, blurred, then composited.
fn draw_glow(canvas: &mut RgbaImage, rect: Rect, radius: f32, spread: f32, color: Rgba<u8>) {
    if rect.w <= 0.0 || rect.h <= 0.0 || spread <= 0.0 {
        return;
    }
    let margin = (spread * 2.0).ceil() as i32;
    let layer_w = rect.w.ceil() as i32 + margin * 2;
    let layer_h = rect.h.ceil() as i32 + margin * 2;
    if layer_w <= 0 || layer_h <= 0 {
        return;
    }

    let Rgba([r, g, b, _]) = color;
    let mut layer = RgbaImage::from_pixel(layer_w as u32, layer_h as u32, Rgba([r, g, b, 0]));
    fill_round_rect(
        &mut layer,
        Rect {
            x: margin as f32,
            y: margin as f32,
            w: rect.w,
            h: rect.h,
        },
        radius,
        Rgba([r, g, b, 255]),
    );

    let blurred = gaussian_blur_f32(&layer, spread / 2.0);
    let origin_x = rect.x.round() as i32 - margin;
    let origin_y = rect.y.round() as i32 - margin;
    for (dx, dy, pixel) in blurred.enumerate_pixels() {
        blend_pixel(canvas, origin_x + dx as i32, origin_y + dy as i32, *pixel);
    }
}

fn point_in_rounded_rect(
    px: f32,
    py: f32,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    radius: f32,
) -> bool {
    if width <= 0.0 || height <= 0.0 {
        return false;
    }

    let r = radius.max(0.0).min(width / 2.0).min(height / 2.0);
    if r <= 0.0 {
        return px >= x && px < x + width && py >= y && py < y + height;
    }

    let nearest_x = px.clamp(x + r, x + width - r);
    let nearest_y = py.clamp(y + r, y + height - r);
    let dx = px - nearest_x;
    let dy = py - nearest_y;
    dx * dx + dy * dy <= r * r
}

fn blend_pixel_with_coverage(
    canvas: &mut RgbaImage,
    x: i32,
    y: i32,
    color: Rgba<u8>,
    coverage: f32,
) {
    let mut src = color;
    src.0[3] = ((src.0[3] as f32) * coverage.clamp(0.0, 1.0)).round() as u8;
    blend_pixel(canvas, x, y, src);
}

fn blend_pixel(canvas: &mut RgbaImage, x: i32, y: i32, src: Rgba<u8>) {
    if x < 0 || y < 0 {
        return;
    }

    let width = canvas.width() as i32;
    let height = canvas.height() as i32;
    if x >= width || y >= height {
        return;
    }

    let dst = canvas.get_pixel_mut(x as u32, y as u32);
    let src_alpha = src.0[3] as f32 / 255.0;
    if src_alpha <= 0.0 {
        return;
    }

    let dst_alpha = dst.0[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);

    if out_alpha <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }

    for channel in 0..3 {
        let src_channel = src.0[channel] as f32 / 255.0;
        let dst_channel = dst.0[channel] as f32 / 255.0;
        let out_channel =
            (src_channel * src_alpha + dst_channel * dst_alpha * (1.0 - src_alpha)) / out_alpha;
        dst.0[channel] = (out_channel * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    dst.0[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
}
