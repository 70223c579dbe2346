//! Raster canvas with the drawing operations the primitives are built from.
//!
//! Coordinates are pixels, origin top-left, y down. Angles are degrees
//! measured clockwise from 3 o'clock.

use image::{GrayAlphaImage, Rgb, RgbImage, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_ellipse_mut, draw_filled_rect_mut,
    draw_hollow_ellipse_mut, draw_line_segment_mut, draw_polygon_mut,
};
use imageproc::point::Point;
use imageproc::rect::Rect;

use crate::color::Color;

/// Luma below this is ink when stamping bitmaps.
pub const BITMAP_THRESHOLD: u8 = 128;

/// Coordinates reach the rasterizer clamped to this distance from the origin.
const COORD_LIMIT: f64 = 1_048_576.0;

pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Color) -> Self {
        Canvas {
            image: RgbImage::from_pixel(width, height, background.to_rgb()),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Largest size or radius drawn: twice the longer side.
    pub fn max_extent(&self) -> i32 {
        i32::try_from(self.width().max(self.height()))
            .unwrap_or(i32::MAX)
            .saturating_mul(2)
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Whether `(x, y)` lies on the canvas: `0 <= x < width`, `0 <= y < height`.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        (0.0..f64::from(self.width())).contains(&x) && (0.0..f64::from(self.height())).contains(&y)
    }

    pub fn point(&mut self, x: f64, y: f64, color: Color) {
        if self.contains(x, y) {
            self.image.put_pixel(x as u32, y as u32, color.to_rgb());
        }
    }

    pub fn filled_circle(&mut self, cx: f64, cy: f64, radius: i32, color: Color) {
        draw_filled_circle_mut(&mut self.image, px(cx, cy), radius.max(0), color.to_rgb());
    }

    /// Ellipse with radii `rx`, `ry`. The outline grows inward, `width` pixels thick.
    pub fn ellipse(
        &mut self,
        cx: f64,
        cy: f64,
        rx: i32,
        ry: i32,
        fill: Option<Color>,
        outline: Option<Color>,
        width: i32,
    ) {
        let center = px(cx, cy);
        if let Some(fill) = fill {
            draw_filled_ellipse_mut(&mut self.image, center, rx.max(0), ry.max(0), fill.to_rgb());
        }
        if let Some(outline) = outline {
            for k in 0..width.max(1) {
                let (rx, ry) = (rx - k, ry - k);
                if rx < 0 || ry < 0 {
                    break;
                }
                draw_hollow_ellipse_mut(&mut self.image, center, rx, ry, outline.to_rgb());
            }
        }
    }

    /// Segment `width` pixels wide.
    pub fn line(&mut self, from: (f64, f64), to: (f64, f64), width: i32, color: Color) {
        if width <= 1 {
            let (from, to) = (bounded(from), bounded(to));
            draw_line_segment_mut(
                &mut self.image,
                (from.0 as f32, from.1 as f32),
                (to.0 as f32, to.1 as f32),
                color.to_rgb(),
            );
            return;
        }
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len = dx.hypot(dy);
        if len == 0.0 {
            self.filled_circle(from.0, from.1, width / 2, color);
            return;
        }
        let half = f64::from(width) / 2.0;
        let (nx, ny) = (-dy / len * half, dx / len * half);
        self.fill_polygon(
            &[
                (from.0 + nx, from.1 + ny),
                (to.0 + nx, to.1 + ny),
                (to.0 - nx, to.1 - ny),
                (from.0 - nx, from.1 - ny),
            ],
            color,
        );
    }

    /// Open chain of segments through `points`.
    pub fn polyline(&mut self, points: &[(f64, f64)], width: i32, color: Color) {
        match points {
            [] => {}
            [only] => self.point(only.0, only.1, color),
            _ => {
                for pair in points.windows(2) {
                    self.line(pair[0], pair[1], width, color);
                }
            }
        }
    }

    /// Closed polygon: optional fill, then the outline `width` pixels wide.
    pub fn polygon(
        &mut self,
        points: &[(f64, f64)],
        fill: Option<Color>,
        outline: Option<Color>,
        width: i32,
    ) {
        if let Some(fill) = fill {
            self.fill_polygon(points, fill);
        }
        if let Some(outline) = outline {
            self.polyline(points, width, outline);
            if let (Some(first), Some(last)) = (points.first(), points.last()) {
                if points.len() > 2 {
                    self.line(*last, *first, width, outline);
                }
            }
        }
    }

    pub fn fill_polygon(&mut self, points: &[(f64, f64)], color: Color) {
        let mut poly: Vec<Point<i32>> = points
            .iter()
            .map(|&(x, y)| {
                let (x, y) = px(x, y);
                Point::new(x, y)
            })
            .collect();
        poly.dedup();
        // the rasterizer rejects closed rings
        while poly.len() > 1 && poly.first() == poly.last() {
            poly.pop();
        }
        match poly.len() {
            0 => {}
            1 => self.point(f64::from(poly[0].x), f64::from(poly[0].y), color),
            2 => draw_line_segment_mut(
                &mut self.image,
                (poly[0].x as f32, poly[0].y as f32),
                (poly[1].x as f32, poly[1].y as f32),
                color.to_rgb(),
            ),
            _ => draw_polygon_mut(&mut self.image, &poly, color.to_rgb()),
        }
    }

    /// Filled rectangle covering `[x0, x0 + w] x [y0, y0 + h]` inclusive.
    pub fn filled_rect(&mut self, x0: f64, y0: f64, w: u32, h: u32, color: Color) {
        let (x0, y0) = px(x0, y0);
        let rect = Rect::at(x0, y0).of_size(w.saturating_add(1), h.saturating_add(1));
        draw_filled_rect_mut(&mut self.image, rect, color.to_rgb());
    }

    /// Arc of the ellipse with radii `rx`, `ry` centred at `(cx, cy)`.
    pub fn arc(&mut self, cx: f64, cy: f64, rx: f64, ry: f64, start: f64, end: f64, color: Color) {
        let points = arc_points(cx, cy, rx, ry, start, end);
        self.polyline(&points, 1, color);
    }

    /// Filled circular sector.
    pub fn pieslice(&mut self, cx: f64, cy: f64, radius: f64, start: f64, end: f64, color: Color) {
        let mut points = vec![(cx, cy)];
        points.extend(arc_points(cx, cy, radius, radius, start, end));
        self.fill_polygon(&points, color);
    }

    /// Circular arc closed by its chord.
    pub fn chord(
        &mut self,
        cx: f64,
        cy: f64,
        radius: f64,
        start: f64,
        end: f64,
        fill: Option<Color>,
        outline: Option<Color>,
    ) {
        let points = arc_points(cx, cy, radius, radius, start, end);
        self.polygon(&points, fill, outline, 1);
    }

    /// Paint `color` wherever `mask` is dark and opaque, with the mask's
    /// top-left corner at `(x, y)`.
    pub fn stamp(&mut self, x: i64, y: i64, mask: &GrayAlphaImage, color: Color) {
        let ink = color.to_rgb();
        for (mx, my, pixel) in mask.enumerate_pixels() {
            let [luma, alpha] = pixel.0;
            if luma >= BITMAP_THRESHOLD || alpha < BITMAP_THRESHOLD {
                continue;
            }
            let (tx, ty) = (x + i64::from(mx), y + i64::from(my));
            if tx >= 0 && ty >= 0 && tx < i64::from(self.width()) && ty < i64::from(self.height()) {
                self.image.put_pixel(tx as u32, ty as u32, ink);
            }
        }
    }

    /// Alpha-composite `layer` over the canvas with its origin at the canvas origin.
    pub fn overlay(&mut self, layer: &RgbaImage) {
        let (w, h) = (self.width(), self.height());
        for (x, y, pixel) in layer.enumerate_pixels() {
            if x >= w || y >= h {
                continue;
            }
            let [r, g, b, a] = pixel.0;
            if a == 0 {
                continue;
            }
            let dst = self.image.get_pixel_mut(x, y);
            let a = u32::from(a);
            let blend = |src: u8, dst: u8| {
                ((u32::from(src) * a + u32::from(dst) * (255 - a) + 127) / 255) as u8
            };
            *dst = Rgb([blend(r, dst[0]), blend(g, dst[1]), blend(b, dst[2])]);
        }
    }
}

fn bounded((x, y): (f64, f64)) -> (f64, f64) {
    (x.clamp(-COORD_LIMIT, COORD_LIMIT), y.clamp(-COORD_LIMIT, COORD_LIMIT))
}

fn px(x: f64, y: f64) -> (i32, i32) {
    let (x, y) = bounded((x, y));
    (x.round() as i32, y.round() as i32)
}

/// Sweep from `start` to `end` degrees. An end below the start wraps forward by
/// whole turns; sweeps are capped at one full turn.
pub fn normalize_sweep(start: f64, end: f64) -> (f64, f64) {
    let mut end = end;
    if end < start {
        end += ((start - end) / 360.0).ceil() * 360.0;
    }
    (start, end.min(start + 360.0))
}

/// Points along the elliptical arc, enough for a smooth outline at this radius.
pub fn arc_points(cx: f64, cy: f64, rx: f64, ry: f64, start: f64, end: f64) -> Vec<(f64, f64)> {
    let (start, end) = normalize_sweep(start, end);
    let sweep = end - start;
    let circumference = std::f64::consts::TAU * rx.abs().max(ry.abs());
    let steps = ((sweep / 360.0) * circumference / 2.0).ceil().max(8.0) as usize;
    (0..=steps)
        .map(|i| {
            let theta = (start + sweep * i as f64 / steps as f64).to_radians();
            (cx + rx * theta.cos(), cy + ry * theta.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::{LumaA, Rgba};

    const RED: Color = Color::rgb(255, 0, 0);

    fn blank() -> Canvas {
        Canvas::new(40, 30, Color::WHITE)
    }

    fn is(canvas: &Canvas, x: u32, y: u32, color: Color) -> bool {
        *canvas.image().get_pixel(x, y) == color.to_rgb()
    }

    #[test]
    fn bounds_are_half_open() {
        let c = blank();
        assert!(c.contains(0.0, 0.0));
        assert!(c.contains(39.9, 29.0));
        assert!(!c.contains(40.0, 0.0));
        assert!(!c.contains(-0.1, 5.0));
    }

    #[test]
    fn sweep_wraps_and_caps() {
        assert_eq!(normalize_sweep(0.0, 90.0), (0.0, 90.0));
        assert_eq!(normalize_sweep(300.0, 30.0), (300.0, 390.0));
        assert_eq!(normalize_sweep(0.0, 720.0), (0.0, 360.0));
    }

    #[test]
    fn arc_starts_at_three_oclock_and_turns_clockwise() {
        let pts = arc_points(0.0, 0.0, 10.0, 10.0, 0.0, 90.0);
        let first = pts[0];
        let last = pts[pts.len() - 1];
        assert_relative_eq!(first.0, 10.0, epsilon = 1e-9);
        assert_relative_eq!(first.1, 0.0, epsilon = 1e-9);
        // 90 degrees clockwise on screen is straight down
        assert_relative_eq!(last.0, 0.0, epsilon = 1e-9);
        assert_relative_eq!(last.1, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn thick_line_covers_its_width() {
        let mut c = blank();
        c.line((5.0, 15.0), (35.0, 15.0), 5, RED);
        assert!(is(&c, 20, 15, RED));
        assert!(is(&c, 20, 13, RED));
        assert!(is(&c, 20, 17, RED));
        assert!(is(&c, 20, 20, Color::WHITE));
    }

    #[test]
    fn degenerate_polygons_do_not_panic() {
        let mut c = blank();
        c.fill_polygon(&[], RED);
        c.fill_polygon(&[(3.0, 3.0), (3.0, 3.0), (3.0, 3.0)], RED);
        c.fill_polygon(&[(1.0, 1.0), (8.0, 1.0), (1.0, 1.0)], RED);
        c.fill_polygon(&[(1.0, 1.0), (8.0, 1.0), (8.0, 8.0), (1.0, 1.0)], RED);
        c.line((4.0, 4.0), (4.0, 4.0), 3, RED);
        assert!(is(&c, 3, 3, RED));
    }

    #[test]
    fn rectangle_is_inclusive() {
        let mut c = blank();
        c.filled_rect(10.0, 10.0, 4, 2, RED);
        assert!(is(&c, 14, 12, RED));
        assert!(is(&c, 15, 12, Color::WHITE));
    }

    #[test]
    fn stamp_paints_dark_opaque_pixels_only() {
        let mut mask = GrayAlphaImage::from_pixel(2, 2, LumaA([255, 255]));
        mask.put_pixel(0, 0, LumaA([0, 255]));
        mask.put_pixel(1, 1, LumaA([0, 0]));
        let mut c = blank();
        c.stamp(38, 28, &mask, RED);
        assert!(is(&c, 38, 28, RED));
        assert!(is(&c, 39, 28, Color::WHITE));
        assert!(is(&c, 39, 29, Color::WHITE));
        // off-canvas parts are clipped
        c.stamp(-1, -1, &mask, RED);
    }

    #[test]
    fn overlay_blends_by_alpha() {
        let mut layer = RgbaImage::new(50, 50);
        layer.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        layer.put_pixel(1, 0, Rgba([0, 0, 0, 128]));
        let mut c = blank();
        c.overlay(&layer);
        assert_eq!(c.image().get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(c.image().get_pixel(1, 0).0, [127, 127, 127]);
        assert_eq!(c.image().get_pixel(2, 0).0, [255, 255, 255]);
    }
}
