use image::{Rgb, RgbImage};
use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::metrics::TimeSeries;

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 1000;

const MARGIN: u32 = 60;
const MARKER: i64 = 3;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([60, 60, 60]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
pub const TOTAL_COLOR: Rgb<u8> = Rgb([31, 119, 180]);
pub const UNIQUE_COLOR: Rgb<u8> = Rgb([255, 127, 14]);

/// Pixel bounds of one panel's plotting area.
#[derive(Debug, Clone, Copy)]
struct Panel {
    left: i64,
    top: i64,
    right: i64,
    bottom: i64,
}

impl Panel {
    fn stacked(index: u32, count: u32) -> Self {
        let band = HEIGHT / count;
        Panel {
            left: MARGIN as i64,
            top: (band * index + MARGIN / 2) as i64,
            right: (WIDTH - MARGIN / 2) as i64,
            bottom: (band * (index + 1) - MARGIN) as i64,
        }
    }
}

/// Two stacked panels, views on top and clones below. Each plots total and
/// unique per day with point markers; the y axis starts at zero.
pub fn render(views: &TimeSeries, clones: &TimeSeries) -> RgbImage {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
    for (i, series) in [views, clones].into_iter().enumerate() {
        let panel = Panel::stacked(i as u32, 2);
        draw_panel(&mut img, panel, series);
    }
    img
}

/// Renders and saves as PNG.
pub fn write_chart(path: &Path, views: &TimeSeries, clones: &TimeSeries) -> Result<()> {
    render(views, clones).save(path)?;
    info!(path = %path.display(), days = views.len().max(clones.len()), "Wrote chart");
    Ok(())
}

fn draw_panel(img: &mut RgbImage, panel: Panel, series: &TimeSeries) {
    let points: Vec<(u64, u64)> = series.iter().map(|(_, c)| (c.total, c.unique)).collect();
    let slots = points.len().max(2) as i64 - 1;
    let x_at = |i: usize| panel.left + (panel.right - panel.left) * i as i64 / slots;

    for i in 0..points.len() {
        let x = x_at(i);
        draw_line(img, (x, panel.top), (x, panel.bottom), GRID);
    }
    draw_line(img, (panel.left, panel.bottom), (panel.right, panel.bottom), AXIS);
    draw_line(img, (panel.left, panel.top), (panel.left, panel.bottom), AXIS);

    if points.is_empty() {
        return;
    }

    let peak = points.iter().map(|(t, u)| (*t).max(*u)).max().unwrap_or(0).max(1) as i64;
    let y_at = |v: u64| panel.bottom - (panel.bottom - panel.top) * v as i64 / peak;

    let lines: [(fn(&(u64, u64)) -> u64, Rgb<u8>); 2] =
        [(|p| p.0, TOTAL_COLOR), (|p| p.1, UNIQUE_COLOR)];

    for (value, color) in lines {
        let coords: Vec<(i64, i64)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (x_at(i), y_at(value(p))))
            .collect();

        for pair in coords.windows(2) {
            draw_line(img, pair[0], pair[1], color);
        }
        for &c in &coords {
            draw_marker(img, c, color);
        }
    }
}

fn plot(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn draw_marker(img: &mut RgbImage, (cx, cy): (i64, i64), color: Rgb<u8>) {
    for dy in -MARKER..=MARKER {
        for dx in -MARKER..=MARKER {
            plot(img, cx + dx, cy + dy, color);
        }
    }
}

/// Bresenham.
fn draw_line(img: &mut RgbImage, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb<u8>) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let (mut x, mut y, mut err) = (x0, y0, dx + dy);

    loop {
        plot(img, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
