//! Spatial overlay renderer
//!
//! Composites the discovered-attribute markers onto the analyzed image.
//! Rendering is a pure function of the base raster and the attribute
//! list: the same inputs always produce the same pixels, so the session
//! layer can re-invoke it after every attribute append without any
//! hidden state.
//!
//! Draw order, later layers occluding earlier ones:
//!
//! 1. clear the canvas
//! 2. base image stretched to exactly fill the target dimensions
//! 3. one marker per attribute that carries a location, in sequence
//!    order: dashed circular outline, radial glow fading from the tier
//!    color to transparent, a fixed-length crosshair, and a `#<n>` label
//!    to the right of the circle
//! 4. four decorative corner brackets
//!
//! Marker geometry maps normalized coordinates verbatim: center is
//! `(x * width, y * height)`, pixel radius is `radius * min(width,
//! height)`. Labels number only the attributes that have a location, so
//! `#1` is the first visible marker even when earlier attributes were
//! location-less.

use crate::types::{Attribute, Location};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::imageops::FilterType;
use image::{imageops, DynamicImage, Rgba, RgbaImage};

/// Default canvas width in pixels
pub const DEFAULT_WIDTH: u32 = 640;
/// Default canvas height in pixels
pub const DEFAULT_HEIGHT: u32 = 480;

/// Marker color for intensity 8 and above (magenta)
const TIER_HIGH: Rgba<u8> = Rgba([0xff, 0x00, 0xff, 0xff]);
/// Marker color for intensity 5–7 (cyan)
const TIER_MID: Rgba<u8> = Rgba([0x00, 0xf5, 0xff, 0xff]);
/// Marker color below intensity 5 (violet)
const TIER_LOW: Rgba<u8> = Rgba([0x8b, 0x5c, 0xf6, 0xff]);
/// Corner bracket color (cyan accent)
const ACCENT: Rgba<u8> = Rgba([0x00, 0xf5, 0xff, 0xff]);

/// Glow alpha at the marker center (~25 % opacity)
const GLOW_CENTER_ALPHA: f64 = 64.0;
/// Dash pattern of the circular outline: 5 px on, 5 px off
const DASH_ON: f64 = 5.0;
const DASH_OFF: f64 = 5.0;
/// Outline stroke width
const OUTLINE_WIDTH: f64 = 2.0;
/// Crosshair arm length from center, constant regardless of radius
const CROSSHAIR_ARM: f64 = 10.0;
const CROSSHAIR_WIDTH: f64 = 1.0;
/// Gap between circle edge and label
const LABEL_OFFSET: f64 = 10.0;
/// Corner bracket leg length
const CORNER_SIZE: f64 = 30.0;
const CORNER_WIDTH: f64 = 2.0;

/// Select the marker color tier for an intensity score
pub fn tier_color(intensity: u8) -> Rgba<u8> {
    if intensity >= 8 {
        TIER_HIGH
    } else if intensity >= 5 {
        TIER_MID
    } else {
        TIER_LOW
    }
}

/// Map a normalized location onto pixel space: returns
/// `(center_x, center_y, radius)` for the given canvas dimensions.
pub fn marker_geometry(location: &Location, width: u32, height: u32) -> (f64, f64, f64) {
    let w = f64::from(width);
    let h = f64::from(height);
    (
        location.x * w,
        location.y * h,
        location.radius * w.min(h),
    )
}

/// Fixed-size overlay canvas renderer
#[derive(Debug, Clone, Copy)]
pub struct OverlayRenderer {
    width: u32,
    height: u32,
}

impl OverlayRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Redraw the full canvas from scratch.
    ///
    /// `attributes` is the session's ordered attribute list; entries
    /// without a location contribute no marker but are counted nowhere
    /// here; label numbering is over located attributes only.
    pub fn render(&self, base: &DynamicImage, attributes: &[Attribute]) -> RgbaImage {
        // Stretch-fit: aspect ratio is intentionally not preserved
        let mut canvas = imageops::resize(base, self.width, self.height, FilterType::Triangle);

        let mut marker_number = 0usize;
        for attribute in attributes {
            let Some(location) = &attribute.location else {
                continue;
            };
            marker_number += 1;
            self.draw_marker(&mut canvas, location, attribute.intensity, marker_number);
        }

        self.draw_corner_brackets(&mut canvas);
        canvas
    }

    fn draw_marker(
        &self,
        canvas: &mut RgbaImage,
        location: &Location,
        intensity: u8,
        number: usize,
    ) {
        let (cx, cy, radius) = marker_geometry(location, self.width, self.height);
        let color = tier_color(intensity);

        // A zero radius degenerates the circle and glow to nothing but
        // keeps the crosshair and label
        if radius > 0.0 {
            draw_dashed_circle(canvas, cx, cy, radius, color, OUTLINE_WIDTH);
            draw_radial_glow(canvas, cx, cy, radius, color);
        }

        draw_line(
            canvas,
            cx - CROSSHAIR_ARM,
            cy,
            cx + CROSSHAIR_ARM,
            cy,
            color,
            CROSSHAIR_WIDTH,
        );
        draw_line(
            canvas,
            cx,
            cy - CROSSHAIR_ARM,
            cx,
            cy + CROSSHAIR_ARM,
            color,
            CROSSHAIR_WIDTH,
        );

        let label = format!("#{}", number);
        let label_x = (cx + radius + LABEL_OFFSET).round() as i32;
        let label_y = (cy - 4.0).round() as i32;
        draw_text(canvas, label_x, label_y, &label, color);
    }

    fn draw_corner_brackets(&self, canvas: &mut RgbaImage) {
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        let s = CORNER_SIZE;

        // Top-left
        draw_line(canvas, 0.0, s, 0.0, 0.0, ACCENT, CORNER_WIDTH);
        draw_line(canvas, 0.0, 0.0, s, 0.0, ACCENT, CORNER_WIDTH);
        // Top-right
        draw_line(canvas, w - s, 0.0, w - 1.0, 0.0, ACCENT, CORNER_WIDTH);
        draw_line(canvas, w - 1.0, 0.0, w - 1.0, s, ACCENT, CORNER_WIDTH);
        // Bottom-left
        draw_line(canvas, 0.0, h - s, 0.0, h - 1.0, ACCENT, CORNER_WIDTH);
        draw_line(canvas, 0.0, h - 1.0, s, h - 1.0, ACCENT, CORNER_WIDTH);
        // Bottom-right
        draw_line(canvas, w - s, h - 1.0, w - 1.0, h - 1.0, ACCENT, CORNER_WIDTH);
        draw_line(canvas, w - 1.0, h - s, w - 1.0, h - 1.0, ACCENT, CORNER_WIDTH);
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

// ============================================
// Drawing primitives
// ============================================

fn clamp_i32(value: i32, min_value: i32, max_value: i32) -> i32 {
    value.max(min_value).min(max_value)
}

/// Source-over alpha blend of one pixel
fn blend_pixel(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let a = f64::from(src[3]) / 255.0;
    if a <= 0.0 {
        return dst;
    }
    let inv = 1.0 - a;
    let channel = |d: u8, s: u8| {
        (f64::from(d) * inv + f64::from(s) * a)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    let out_a = (f64::from(dst[3]) + f64::from(src[3]) * inv)
        .round()
        .clamp(0.0, 255.0) as u8;
    Rgba([
        channel(dst[0], src[0]),
        channel(dst[1], src[1]),
        channel(dst[2], src[2]),
        out_a,
    ])
}

fn blend_at(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= img.width() as i32 || y >= img.height() as i32 {
        return;
    }
    let dst = *img.get_pixel(x as u32, y as u32);
    img.put_pixel(x as u32, y as u32, blend_pixel(dst, color));
}

/// Fill a solid disc by scanning its clamped bounding box
fn draw_disc(img: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    if radius <= 0.1 {
        blend_at(img, cx.round() as i32, cy.round() as i32, color);
        return;
    }
    let min_x = clamp_i32((cx - radius).floor() as i32, 0, img.width() as i32 - 1);
    let max_x = clamp_i32((cx + radius).ceil() as i32, 0, img.width() as i32 - 1);
    let min_y = clamp_i32((cy - radius).floor() as i32, 0, img.height() as i32 - 1);
    let max_y = clamp_i32((cy + radius).ceil() as i32, 0, img.height() as i32 - 1);
    let r2 = radius * radius;
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            if dx * dx + dy * dy <= r2 {
                blend_at(img, x, y, color);
            }
        }
    }
}

/// Stroke a line as a run of overlapping discs
fn draw_line(img: &mut RgbaImage, x1: f64, y1: f64, x2: f64, y2: f64, color: Rgba<u8>, width: f64) {
    let dx = x2 - x1;
    let dy = y2 - y1;
    let distance = (dx * dx + dy * dy).sqrt();
    let steps = distance.max(1.0).ceil() as i32;
    let radius = (width.max(1.0) / 2.0).max(0.6);
    for step in 0..=steps {
        let t = f64::from(step) / f64::from(steps.max(1));
        draw_disc(img, x1 + dx * t, y1 + dy * t, radius, color);
    }
}

/// Stroke a dashed circle outline, walking the circumference in 1 px
/// arc-length steps and toggling by the dash pattern
fn draw_dashed_circle(
    img: &mut RgbaImage,
    cx: f64,
    cy: f64,
    radius: f64,
    color: Rgba<u8>,
    width: f64,
) {
    let circumference = std::f64::consts::TAU * radius;
    let steps = circumference.ceil().max(8.0) as i32;
    let stroke = (width.max(1.0) / 2.0).max(0.6);
    let period = DASH_ON + DASH_OFF;
    for step in 0..steps {
        let arc = circumference * f64::from(step) / f64::from(steps);
        if arc % period >= DASH_ON {
            continue;
        }
        let angle = std::f64::consts::TAU * f64::from(step) / f64::from(steps);
        let x = cx + radius * angle.cos();
        let y = cy + radius * angle.sin();
        draw_disc(img, x, y, stroke, color);
    }
}

/// Fill the marker circle with a glow fading linearly from the tier
/// color at the center to fully transparent at the radius
fn draw_radial_glow(img: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    let min_x = clamp_i32((cx - radius).floor() as i32, 0, img.width() as i32 - 1);
    let max_x = clamp_i32((cx + radius).ceil() as i32, 0, img.width() as i32 - 1);
    let min_y = clamp_i32((cy - radius).floor() as i32, 0, img.height() as i32 - 1);
    let max_y = clamp_i32((cy + radius).ceil() as i32, 0, img.height() as i32 - 1);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > radius {
                continue;
            }
            let alpha = (GLOW_CENTER_ALPHA * (1.0 - dist / radius)).round() as u8;
            if alpha == 0 {
                continue;
            }
            blend_at(img, x, y, Rgba([color[0], color[1], color[2], alpha]));
        }
    }
}

/// Render text with the 8×8 bitmap font, top-left anchored
fn draw_text(img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>) {
    let mut cursor_x = x;
    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += 8;
            continue;
        };
        for (row_idx, row) in glyph.iter().enumerate() {
            for col_idx in 0..8 {
                if (row >> col_idx) & 1 == 1 {
                    blend_at(img, cursor_x + col_idx, y + row_idx as i32, color);
                }
            }
        }
        cursor_x += 8;
    }
}
