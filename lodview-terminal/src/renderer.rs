//! ASCII surface for terminal rendering

use crossterm::{
    style::{Color as TermColor, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use lodview_core::{Color, Surface};
use nalgebra::Point2;
use std::collections::HashSet;
use std::io::Write;

/// Character luminosity ramp for shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &['.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide, so the surface
/// exposes two vertical units per cell row.
const CELL_ASPECT: f32 = 2.0;

/// A character grid that the rasterizer paints into
pub struct AsciiSurface {
    width: usize,
    height: usize,
    char_buffer: Vec<char>,
    color_buffer: Vec<Color>,
}

impl AsciiSurface {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            char_buffer: vec![' '; size],
            color_buffer: vec![Color::BLACK; size],
        }
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Color::BLACK);
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<(char, Color)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y * self.width + x;
        Some((self.char_buffer[idx], self.color_buffer[idx]))
    }

    /// Number of non-blank cells
    pub fn covered(&self) -> usize {
        self.char_buffer.iter().filter(|&&c| c != ' ').count()
    }

    fn to_cell(p: &Point2<f32>) -> (f32, f32) {
        (p.x, p.y / CELL_ASPECT)
    }

    fn fill_triangle(&mut self, v0: (f32, f32), v1: (f32, f32), v2: (f32, f32), character: char, color: Color) {
        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x as f32 + 0.5, y as f32 + 0.5);
                // Either winding counts as inside
                if let Some((w0, w1, w2)) = barycentric(v0, v1, v2, p) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let idx = y as usize * self.width + x as usize;
                        self.char_buffer[idx] = character;
                        self.color_buffer[idx] = color;
                    }
                }
            }
        }
    }

    /// Blend `color` into a covered cell; blank cells stay blank
    fn blend_cell(&mut self, x: usize, y: usize, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = y * self.width + x;
        if self.char_buffer[idx] == ' ' {
            return;
        }
        let a = color.a as f32 / 255.0;
        let old = self.color_buffer[idx];
        let mix = |o: u8, n: u8| (o as f32 * (1.0 - a) + n as f32 * a).round() as u8;
        self.color_buffer[idx] = Color::rgb(mix(old.r, color.r), mix(old.g, color.g), mix(old.b, color.b));
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let c = self.color_buffer[idx];
                writer.queue(SetForegroundColor(TermColor::Rgb { r: c.r, g: c.g, b: c.b }))?;
                writer.queue(Print(self.char_buffer[idx]))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl Surface for AsciiSurface {
    fn size(&self) -> (f32, f32) {
        (self.width as f32, self.height as f32 * CELL_ASPECT)
    }

    fn fill_polygon(&mut self, points: &[Point2<f32>], color: Color) {
        if points.len() < 3 {
            return;
        }
        let ramp_index = (color.luminance() * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
        let character = LUMINOSITY_RAMP[ramp_index.min(LUMINOSITY_RAMP.len() - 1)];

        // Fan triangulation
        let origin = Self::to_cell(&points[0]);
        for pair in points[1..].windows(2) {
            self.fill_triangle(origin, Self::to_cell(&pair[0]), Self::to_cell(&pair[1]), character, color);
        }
    }

    fn stroke_polygon(&mut self, points: &[Point2<f32>], color: Color, _width: f32) {
        // Lines are always one cell wide here; shared corners blend once
        let bounds = (self.width as f64, self.height as f64);
        let mut cells: HashSet<(usize, usize)> = HashSet::new();
        for (i, start) in points.iter().enumerate() {
            let end = &points[(i + 1) % points.len()];
            let (start, end) = (Self::to_cell(start), Self::to_cell(end));
            let Some(((x0, y0), (x1, y1))) = clip_segment(
                (start.0 as f64, start.1 as f64),
                (end.0 as f64, end.1 as f64),
                bounds,
            ) else {
                continue;
            };
            let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
            for s in 0..=steps {
                let t = s as f64 / steps as f64;
                let x = (x0 + (x1 - x0) * t).floor();
                let y = (y0 + (y1 - y0) * t).floor();
                if x >= 0.0 && y >= 0.0 && x < bounds.0 && y < bounds.1 {
                    cells.insert((x as usize, y as usize));
                }
            }
        }
        for (x, y) in cells {
            self.blend_cell(x, y, color);
        }
    }
}

/// Clip the segment `a`-`b` to `[0, width] x [0, height]` (Liang-Barsky).
/// Returns `None` when no part of it is inside. Runs in f64 so endpoints far
/// off screen still clip to the right cell.
fn clip_segment(
    a: (f64, f64),
    b: (f64, f64),
    (width, height): (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    if !(a.0.is_finite() && a.1.is_finite() && b.0.is_finite() && b.1.is_finite()) {
        return None;
    }
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, a.0), (dx, width - a.0), (-dy, a.1), (dy, height - a.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
            if t0 > t1 {
                return None;
            }
        }
    }
    Some((
        (a.0 + dx * t0, a.1 + dy * t0),
        (a.0 + dx * t1, a.1 + dy * t1),
    ))
}

/// Calculate barycentric coordinates for a point in a triangle. The weights
/// are normalized so that a clockwise triangle gives positive weights too.
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_size_accounts_for_cell_aspect() {
        let surface = AsciiSurface::new(80, 24);
        assert_eq!(surface.size(), (80.0, 48.0));
    }

    #[test]
    fn test_fill_covers_cells() {
        let mut surface = AsciiSurface::new(10, 10);
        let square = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 20.0),
            Point2::new(0.0, 20.0),
        ];
        surface.fill_polygon(&square, Color::rgb(255, 255, 255));
        assert_eq!(surface.covered(), 100);
        assert_eq!(surface.cell(3, 3), Some(('@', Color::rgb(255, 255, 255))));
    }

    #[test]
    fn test_fill_accepts_either_winding() {
        let mut clockwise = AsciiSurface::new(10, 10);
        let mut counter = AsciiSurface::new(10, 10);
        let a = Point2::new(1.0, 1.0);
        let b = Point2::new(9.0, 2.0);
        let c = Point2::new(4.0, 18.0);
        clockwise.fill_polygon(&[a, b, c], Color::RED);
        counter.fill_polygon(&[a, c, b], Color::RED);
        assert!(clockwise.covered() > 0);
        assert_eq!(clockwise.covered(), counter.covered());
    }

    #[test]
    fn test_stroke_only_tints_covered_cells() {
        let mut surface = AsciiSurface::new(10, 10);
        let triangle = [Point2::new(0.0, 0.0), Point2::new(9.0, 0.0), Point2::new(0.0, 18.0)];
        surface.stroke_polygon(&triangle, Color::BLACK.with_alpha(1.0), 1.0);
        assert_eq!(surface.covered(), 0);

        surface.fill_polygon(&triangle, Color::rgb(200, 200, 200));
        surface.stroke_polygon(&triangle, Color::BLACK.with_alpha(0.5), 1.0);
        let (_, edge) = surface.cell(0, 0).unwrap();
        assert_eq!(edge, Color::rgb(100, 100, 100));
    }

    #[test]
    fn test_stroke_far_outside_stays_in_bounds() {
        let mut surface = AsciiSurface::new(10, 10);
        let full = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 20.0),
            Point2::new(0.0, 20.0),
        ];
        surface.fill_polygon(&full, Color::rgb(200, 200, 200));

        // Without clipping this would step about 1e9 times
        let huge = [
            Point2::new(-1e9, 1.0),
            Point2::new(1e9, 1.0),
            Point2::new(0.0, 1e9),
        ];
        surface.stroke_polygon(&huge, Color::BLACK.with_alpha(0.5), 1.0);
        for x in 0..10 {
            assert_eq!(surface.cell(x, 0).unwrap().1, Color::rgb(100, 100, 100));
        }
        assert_eq!(surface.cell(5, 5).unwrap().1, Color::rgb(200, 200, 200));
    }

    #[test]
    fn test_segment_outside_is_dropped() {
        assert_eq!(clip_segment((-5.0, -5.0), (-1.0, 20.0), (10.0, 10.0)), None);
        let ((x0, y0), (x1, y1)) = clip_segment((-10.0, 5.0), (20.0, 5.0), (10.0, 10.0)).unwrap();
        assert!(x0.abs() < 1e-4 && (x1 - 10.0).abs() < 1e-4);
        assert_eq!((y0, y1), (5.0, 5.0));
    }

    #[test]
    fn test_clear() {
        let mut surface = AsciiSurface::new(4, 4);
        surface.fill_polygon(
            &[Point2::new(0.0, 0.0), Point2::new(4.0, 0.0), Point2::new(0.0, 8.0)],
            Color::RED,
        );
        assert!(surface.covered() > 0);
        surface.clear();
        assert_eq!(surface.covered(), 0);
    }

    #[test]
    fn test_draw_writes_every_cell() {
        let surface = AsciiSurface::new(3, 2);
        let mut out = Vec::new();
        surface.draw(&mut out).unwrap();
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("\r\n"));
    }
}
