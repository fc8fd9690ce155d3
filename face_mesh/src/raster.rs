use image::{GrayImage, Luma, Rgba as Pixel, RgbaImage};
use imageproc::drawing::{draw_polygon_mut, Blend, Canvas};
use imageproc::point::Point as PixelPoint;

use crate::canvas::{Canvas2d, FillRule, Point, Rgba};

/// Maximum length in pixels of one flattened curve segment.
const FLATTEN_TOLERANCE: f32 = 2.0;
const MAX_CURVE_SEGMENTS: usize = 64;

/// A [`Canvas2d`] that paints into an RGBA image.
///
/// Fills are aliased and cover the outline pixels of each subpath. Every
/// subpath counts once towards the fill rule, signed by its orientation for
/// [`FillRule::NonZero`].
pub struct ImageCanvas {
    image: RgbaImage,
    subpaths: Vec<Vec<Point>>,
    fill_style: Rgba,
}

impl ImageCanvas {
    pub fn new(image: RgbaImage) -> Self {
        Self {
            image,
            subpaths: vec![],
            fill_style: Rgba::new(0, 0, 0, 1.0),
        }
    }

    /// A fully transparent canvas.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(RgbaImage::new(width, height))
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    fn current_point(&self) -> Option<Point> {
        self.subpaths.last().and_then(|p| p.last()).copied()
    }
}

/// Snaps a subpath to pixel coordinates. `None` when nothing is left to fill.
fn polygon(path: &[Point]) -> Option<Vec<PixelPoint<i32>>> {
    let mut poly: Vec<PixelPoint<i32>> = Vec::with_capacity(path.len());
    for p in path {
        let snapped = PixelPoint::new(p.x.round() as i32, p.y.round() as i32);
        if poly.last() != Some(&snapped) {
            poly.push(snapped);
        }
    }
    // draw_polygon_mut closes the ring itself and rejects a repeated start
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }
    (poly.len() >= 3).then_some(poly)
}

/// +1 for clockwise in image coordinates, -1 otherwise.
fn orientation(path: &[Point]) -> i32 {
    let twice_area: f32 = path
        .iter()
        .zip(path.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    if twice_area >= 0.0 {
        1
    } else {
        -1
    }
}

fn to_pixel(color: Rgba) -> Pixel<u8> {
    let alpha = (color.a.clamp(0.0, 1.0) * 255.0).round() as u8;
    Pixel([color.r, color.g, color.b, alpha])
}

fn distance(a: Point, b: Point) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

impl Canvas2d for ImageCanvas {
    fn begin_path(&mut self) {
        self.subpaths.clear();
    }

    fn move_to(&mut self, x: f32, y: f32) {
        self.subpaths.push(vec![Point::new(x, y)]);
    }

    fn quadratic_curve_to(&mut self, cpx: f32, cpy: f32, x: f32, y: f32) {
        let control = Point::new(cpx, cpy);
        let end = Point::new(x, y);
        let Some(start) = self.current_point() else {
            // with no current point the control point starts the subpath
            self.subpaths.push(vec![control, end]);
            return;
        };
        let length = distance(start, control) + distance(control, end);
        let steps = ((length / FLATTEN_TOLERANCE).ceil() as usize).clamp(1, MAX_CURVE_SEGMENTS);
        if let Some(path) = self.subpaths.last_mut() {
            for step in 1..=steps {
                let t = step as f32 / steps as f32;
                let mt = 1.0 - t;
                path.push(Point::new(
                    mt * mt * start.x + 2.0 * mt * t * control.x + t * t * end.x,
                    mt * mt * start.y + 2.0 * mt * t * control.y + t * t * end.y,
                ));
            }
        }
    }

    fn close_path(&mut self) {
        // fills close every subpath implicitly; a new subpath starts where this one began
        if let Some(first) = self.subpaths.last().and_then(|p| p.first()).copied() {
            self.subpaths.push(vec![first]);
        }
    }

    fn set_fill_style(&mut self, color: Rgba) {
        self.fill_style = color;
    }

    // fills never stroke
    fn set_line_width(&mut self, _width: f32) {}

    fn fill(&mut self, rule: FillRule) {
        let (width, height) = self.image.dimensions();
        let mut winding = vec![0i32; width as usize * height as usize];
        for path in &self.subpaths {
            let Some(poly) = polygon(path) else {
                continue;
            };
            let mut mask = GrayImage::new(width, height);
            draw_polygon_mut(&mut mask, &poly, Luma([u8::MAX]));
            let direction = match rule {
                FillRule::EvenOdd => 1,
                FillRule::NonZero => orientation(path),
            };
            for (x, y, px) in mask.enumerate_pixels() {
                if px[0] > 0 {
                    winding[y as usize * width as usize + x as usize] += direction;
                }
            }
        }

        let color = to_pixel(self.fill_style);
        let mut canvas = Blend(std::mem::take(&mut self.image));
        for (i, count) in winding.into_iter().enumerate() {
            let inside = match rule {
                FillRule::EvenOdd => count % 2 != 0,
                FillRule::NonZero => count != 0,
            };
            if inside {
                let i = i as u32;
                canvas.draw_pixel(i % width, i / width, color);
            }
        }
        self.image = canvas.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPAQUE_RED: Rgba = Rgba::new(255, 0, 0, 1.0);

    fn line_to(canvas: &mut ImageCanvas, x: f32, y: f32) {
        canvas.quadratic_curve_to(x, y, x, y);
    }

    fn square(canvas: &mut ImageCanvas, x0: f32, y0: f32, x1: f32, y1: f32) {
        canvas.move_to(x0, y0);
        line_to(canvas, x1, y0);
        line_to(canvas, x1, y1);
        line_to(canvas, x0, y1);
        canvas.close_path();
    }

    fn square_reversed(canvas: &mut ImageCanvas, x0: f32, y0: f32, x1: f32, y1: f32) {
        canvas.move_to(x0, y0);
        line_to(canvas, x0, y1);
        line_to(canvas, x1, y1);
        line_to(canvas, x1, y0);
        canvas.close_path();
    }

    #[test]
    fn fills_square() {
        let mut canvas = ImageCanvas::blank(20, 20);
        canvas.begin_path();
        square(&mut canvas, 2.0, 2.0, 10.0, 10.0);
        canvas.set_fill_style(OPAQUE_RED);
        canvas.fill(FillRule::EvenOdd);
        let img = canvas.into_image();
        assert_eq!(img.get_pixel(5, 5).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(2, 2).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(11, 11).0, [0, 0, 0, 0]);
        assert_eq!(img.get_pixel(15, 5).0, [0, 0, 0, 0]);
    }

    #[test]
    fn even_odd_leaves_hole() {
        let mut canvas = ImageCanvas::blank(20, 20);
        canvas.begin_path();
        square(&mut canvas, 0.0, 0.0, 20.0, 20.0);
        square(&mut canvas, 5.0, 5.0, 15.0, 15.0);
        canvas.set_fill_style(OPAQUE_RED);
        canvas.fill(FillRule::EvenOdd);
        let img = canvas.image();
        assert_eq!(img.get_pixel(2, 2).0[3], 255);
        assert_eq!(img.get_pixel(10, 10).0[3], 0);

        canvas.fill(FillRule::NonZero);
        assert_eq!(canvas.image().get_pixel(10, 10).0[3], 255);
    }

    #[test]
    fn non_zero_cuts_hole_for_opposite_winding() {
        let mut canvas = ImageCanvas::blank(20, 20);
        canvas.begin_path();
        square(&mut canvas, 0.0, 0.0, 19.0, 19.0);
        square_reversed(&mut canvas, 5.0, 5.0, 15.0, 15.0);
        canvas.set_fill_style(OPAQUE_RED);
        canvas.fill(FillRule::NonZero);
        let img = canvas.image();
        assert_eq!(img.get_pixel(2, 2).0[3], 255);
        assert_eq!(img.get_pixel(10, 10).0[3], 0);
    }

    #[test]
    fn translucent_fill_blends() {
        let base = RgbaImage::from_pixel(4, 4, Pixel([0, 0, 255, 255]));
        let mut canvas = ImageCanvas::new(base);
        canvas.begin_path();
        square(&mut canvas, 0.0, 0.0, 4.0, 4.0);
        canvas.set_fill_style(Rgba::new(255, 0, 0, 0.5));
        canvas.fill(FillRule::EvenOdd);
        let px = canvas.image().get_pixel(1, 1).0;
        assert!(px[3] >= 254, "{px:?}");
        assert!((126..=129).contains(&px[0]), "{px:?}");
        assert!((126..=129).contains(&px[2]), "{px:?}");
    }

    #[test]
    fn begin_path_discards_previous_path() {
        let mut canvas = ImageCanvas::blank(10, 10);
        square(&mut canvas, 0.0, 0.0, 10.0, 10.0);
        canvas.begin_path();
        canvas.set_fill_style(OPAQUE_RED);
        canvas.fill(FillRule::EvenOdd);
        assert!(canvas.image().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn degenerate_paths_paint_nothing() {
        let mut canvas = ImageCanvas::blank(10, 10);
        canvas.begin_path();
        canvas.move_to(3.0, 3.0);
        line_to(&mut canvas, 3.2, 3.1);
        canvas.close_path();
        canvas.set_fill_style(OPAQUE_RED);
        canvas.fill(FillRule::EvenOdd);
        assert!(canvas.image().pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn curves_are_flattened_through_the_control_hull() {
        let mut canvas = ImageCanvas::blank(40, 40);
        canvas.begin_path();
        canvas.move_to(0.0, 30.0);
        canvas.quadratic_curve_to(20.0, -10.0, 40.0, 30.0);
        canvas.close_path();
        canvas.set_fill_style(OPAQUE_RED);
        canvas.fill(FillRule::EvenOdd);
        let img = canvas.image();
        // apex of the curve sits at y = 10
        assert_eq!(img.get_pixel(20, 15).0[3], 255);
        assert_eq!(img.get_pixel(20, 5).0[3], 0);
    }
}
