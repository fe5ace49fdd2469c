use std::f64::consts::TAU;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use super::font::{self, glyph, text_width};
use super::ClassCounts;
use crate::color::{class_color, outline_color, to_pixel};
use crate::data::model::Diagnosis;
use crate::error::PipelineError;

pub const WIDTH: u32 = 640;
pub const HEIGHT: u32 = 480;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([40, 40, 40]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);

// ---------------------------------------------------------------------------
// Canvas – minimal raster drawing on top of `image`
// ---------------------------------------------------------------------------

struct Canvas {
    img: RgbImage,
}

impl Canvas {
    fn new() -> Self {
        Self {
            img: RgbImage::from_pixel(WIDTH, HEIGHT, WHITE),
        }
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < WIDTH && (y as u32) < HEIGHT {
            self.img.put_pixel(x as u32, y as u32, color);
        }
    }

    fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        for y in y0.min(y1)..y0.max(y1) {
            for x in x0.min(x1)..x0.max(x1) {
                self.put(x, y, color);
            }
        }
    }

    fn outline_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>) {
        self.fill_rect(x0, y0, x1, y0 + 1, color);
        self.fill_rect(x0, y1 - 1, x1, y1, color);
        self.fill_rect(x0, y0, x0 + 1, y1, color);
        self.fill_rect(x1 - 1, y0, x1, y1, color);
    }

    /// Draw `text` with its top-left corner at (x, y).
    fn text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let s = scale as i64;
        for (i, c) in text.chars().enumerate() {
            let origin = x + i as i64 * font::ADVANCE as i64 * s;
            for (row, bits) in glyph(c).iter().enumerate() {
                for col in 0..5 {
                    if bits & (0b10000 >> col) != 0 {
                        let px = origin + col * s;
                        let py = y + row as i64 * s;
                        self.fill_rect(px, py, px + s, py + s, color);
                    }
                }
            }
        }
    }

    /// Draw `text` horizontally centred on `cx`.
    fn text_centered(&mut self, cx: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let w = text_width(text, scale) as i64;
        self.text(cx - w / 2, y, text, scale, color);
    }

    fn encode_png(self) -> Result<Vec<u8>, PipelineError> {
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(self.img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .map_err(|e| PipelineError::Render(format!("encoding PNG: {e}")))?;
        Ok(buf)
    }
}

/// A round step (1, 2 or 5 × 10^k) giving at most ~5 gridlines up to `max`.
fn tick_step(max: usize) -> usize {
    let mut magnitude = 1;
    loop {
        for m in [1, 2, 5] {
            let step = m * magnitude;
            if max.div_ceil(step) <= 5 {
                return step;
            }
        }
        magnitude *= 10;
    }
}

// ---------------------------------------------------------------------------
// Bar chart
// ---------------------------------------------------------------------------

/// Render a class-frequency bar chart as PNG bytes.
pub fn bar_chart_png(counts: &ClassCounts, title: &str) -> Result<Vec<u8>, PipelineError> {
    let (left, right, top, bottom) = (90i64, 610i64, 70i64, 400i64);
    let mut canvas = Canvas::new();
    canvas.text_centered(WIDTH as i64 / 2, 20, title, 2, INK);

    let max = counts.max().max(1);
    let step = tick_step(max);
    let y_max = max.div_ceil(step) * step;
    let y_of = |v: usize| bottom - ((v as f64 / y_max as f64) * (bottom - top) as f64).round() as i64;

    // Gridlines and y tick labels
    let mut tick = 0;
    while tick <= y_max {
        let y = y_of(tick);
        canvas.fill_rect(left, y, right, y + 1, GRID);
        let label = tick.to_string();
        let w = text_width(&label, 2) as i64;
        canvas.text(left - 10 - w, y - 7, &label, 2, INK);
        tick += step;
    }

    // Bars
    let slot = (right - left) / Diagnosis::ALL.len() as i64;
    let bar_w = slot * 3 / 5;
    for (i, class) in Diagnosis::ALL.iter().enumerate() {
        let n = counts.get(*class);
        let cx = left + slot * i as i64 + slot / 2;
        let (x0, x1) = (cx - bar_w / 2, cx + bar_w / 2);
        let y0 = y_of(n);
        let fill = class_color(*class);
        if n > 0 {
            canvas.fill_rect(x0, y0, x1, bottom, to_pixel(fill));
            canvas.outline_rect(x0, y0, x1, bottom, to_pixel(outline_color(fill)));
        }
        canvas.text_centered(cx, y0 - 22, &n.to_string(), 2, INK);
        canvas.text_centered(cx, bottom + 12, class.name(), 2, INK);
    }

    // Axes
    canvas.fill_rect(left, top, left + 2, bottom + 1, INK);
    canvas.fill_rect(left, bottom, right, bottom + 2, INK);
    canvas.text_centered((left + right) / 2, 445, "Predicted Group", 2, INK);
    canvas.text(12, top - 28, "Count", 2, INK);

    canvas.encode_png()
}

// ---------------------------------------------------------------------------
// Pie chart
// ---------------------------------------------------------------------------

/// Render a class-proportion pie chart (classes with zero count omitted).
pub fn pie_chart_png(counts: &ClassCounts, title: &str) -> Result<Vec<u8>, PipelineError> {
    let (cx, cy, r) = (250i64, 260i64, 170i64);
    let mut canvas = Canvas::new();
    canvas.text_centered(WIDTH as i64 / 2, 20, title, 2, INK);

    let slices = counts.present();
    let total = counts.total();
    if total == 0 {
        canvas.text_centered(WIDTH as i64 / 2, cy, "No predictions", 2, INK);
        return canvas.encode_png();
    }

    // Cumulative end angles, counter-clockwise from the positive x axis.
    let mut ends = Vec::with_capacity(slices.len());
    let mut acc = 0.0;
    for (_, n) in &slices {
        acc += *n as f64 / total as f64;
        ends.push(acc * TAU);
    }

    for y in (cy - r)..=(cy + r) {
        for x in (cx - r)..=(cx + r) {
            let (dx, dy) = ((x - cx) as f64, (cy - y) as f64);
            let d2 = dx * dx + dy * dy;
            if d2 > (r * r) as f64 {
                continue;
            }
            let angle = dy.atan2(dx).rem_euclid(TAU);
            let k = ends.iter().position(|&e| angle < e).unwrap_or(slices.len() - 1);
            let fill = class_color(slices[k].0);
            let edge = d2 > ((r - 2) * (r - 2)) as f64;
            let color = if edge { outline_color(fill) } else { fill };
            canvas.put(x, y, to_pixel(color));
        }
    }

    // Percentage labels at the middle of each slice
    let mut start = 0.0;
    for ((_, n), &end) in slices.iter().zip(&ends) {
        let mid = (start + end) / 2.0;
        let lx = cx + (0.6 * r as f64 * mid.cos()).round() as i64;
        let ly = cy - (0.6 * r as f64 * mid.sin()).round() as i64;
        let pct = format!("{:.1}%", 100.0 * *n as f64 / total as f64);
        canvas.text_centered(lx, ly - 7, &pct, 2, INK);
        start = end;
    }

    // Legend
    for (i, (class, _)) in slices.iter().enumerate() {
        let y = 150 + i as i64 * 40;
        let fill = class_color(*class);
        canvas.fill_rect(470, y, 494, y + 24, to_pixel(fill));
        canvas.outline_rect(470, y, 494, y + 24, to_pixel(outline_color(fill)));
        canvas.text(506, y + 5, class.name(), 2, INK);
    }

    canvas.encode_png()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> RgbImage {
        image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .unwrap()
            .to_rgb8()
    }

    #[test]
    fn test_tick_step() {
        assert_eq!(tick_step(1), 1);
        assert_eq!(tick_step(5), 1);
        assert_eq!(tick_step(7), 2);
        assert_eq!(tick_step(20), 5);
        assert_eq!(tick_step(240), 50);
    }

    #[test]
    fn test_bar_chart_is_png_of_expected_size() {
        let counts = ClassCounts::from_predictions(&[Diagnosis::Cn, Diagnosis::Ad, Diagnosis::Ad]);
        let png = bar_chart_png(&counts, "Prediction Result Distribution").unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        let img = decode(&png);
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
    }

    #[test]
    fn test_pie_chart_uses_class_colours() {
        let counts = ClassCounts::from_predictions(&[Diagnosis::Mci; 4]);
        let img = decode(&pie_chart_png(&counts, "Prediction Result Proportion").unwrap());
        // A single class fills the whole disc; sample well inside it,
        // away from the centred percentage label.
        let px = img.get_pixel(250, 150);
        assert_eq!(*px, to_pixel(class_color(Diagnosis::Mci)));
    }

    #[test]
    fn test_pie_chart_without_predictions() {
        let png = pie_chart_png(&ClassCounts::default(), "Empty").unwrap();
        assert_eq!(decode(&png).dimensions(), (WIDTH, HEIGHT));
    }
}
