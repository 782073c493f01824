//! Binary regions and the morphology applied to them.
//!
//! A [`Region`] is a foreground mask with the same dimensions as the raster it
//! was derived from. Pixels outside the image are never part of a region, so
//! erosion shrinks regions that touch the frame and dilation is clipped to it.

use image::math::Rect;
use image::{GrayImage, Luma};
use imageproc::point::Point;
use imageproc::region_labelling::{Connectivity, connected_components};

const FOREGROUND: Luma<u8> = Luma([255]);

/// A set of integer offsets relative to an anchor at `(0, 0)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    offsets: Vec<(i32, i32)>,
}

impl StructuringElement {
    /// All offsets with `dx^2 + dy^2 <= radius^2`, in row-major order.
    ///
    /// Non-integer radii are meaningful: a radius of 3.5 also contains the
    /// offsets at distance `sqrt(10)` and `sqrt(12)` that a radius of 3 does
    /// not. A non-positive radius gives the single anchor pixel.
    pub fn circle(radius: f32) -> Self {
        let radius = radius.max(0.0);
        let reach = radius.floor() as i32;
        let r2 = radius * radius;

        let mut offsets = Vec::new();
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                if (dx * dx + dy * dy) as f32 <= r2 {
                    offsets.push((dx, dy));
                }
            }
        }

        Self { offsets }
    }

    pub fn offsets(&self) -> &[(i32, i32)] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

/// A foreground mask. Stored as a gray image holding `0` or `255`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    mask: GrayImage,
}

impl Region {
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            mask: GrayImage::new(width, height),
        }
    }

    pub fn full(width: u32, height: u32) -> Self {
        Self {
            mask: GrayImage::from_pixel(width, height, FOREGROUND),
        }
    }

    /// Any non-zero pixel of `mask` is foreground.
    pub fn from_mask(mut mask: GrayImage) -> Self {
        for p in mask.pixels_mut() {
            if p.0[0] != 0 {
                *p = FOREGROUND;
            }
        }
        Self { mask }
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        Self {
            mask: GrayImage::from_fn(width, height, |x, y| {
                if f(x, y) { FOREGROUND } else { Luma([0]) }
            }),
        }
    }

    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    pub fn height(&self) -> u32 {
        self.mask.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions()
    }

    /// `false` for coordinates outside the image.
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0
            && y >= 0
            && x < self.width() as i64
            && y < self.height() as i64
            && self.mask.get_pixel(x as u32, y as u32).0[0] != 0
    }

    pub fn insert(&mut self, x: u32, y: u32) {
        self.mask.put_pixel(x, y, FOREGROUND);
    }

    pub fn area(&self) -> usize {
        self.mask.as_raw().iter().filter(|&&v| v != 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.mask.as_raw().iter().all(|&v| v == 0)
    }

    /// Iterates foreground pixels in row-major order.
    pub fn points(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.mask
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0[0] != 0)
            .map(|(x, y, _)| (x, y))
    }

    /// Mean pixel position, or `None` for an empty region.
    pub fn centroid(&self) -> Option<Point<f64>> {
        let (mut sx, mut sy, mut n) = (0f64, 0f64, 0usize);
        for (x, y) in self.points() {
            sx += x as f64;
            sy += y as f64;
            n += 1;
        }
        if n == 0 {
            return None;
        }
        Some(Point::new(sx / n as f64, sy / n as f64))
    }

    /// Smallest axis-aligned rectangle containing every foreground pixel.
    pub fn bounding_box(&self) -> Option<Rect> {
        let mut points = self.points();
        let (x0, y0) = points.next()?;
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (x0, x0, y0, y0);
        for (x, y) in points {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        Some(Rect {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
        })
    }

    pub fn is_superset_of(&self, other: &Region) -> bool {
        other
            .points()
            .all(|(x, y)| self.contains(x as i64, y as i64))
    }

    pub fn union(&self, other: &Region) -> Region {
        let mut out = self.clone();
        for (x, y) in other.points() {
            if x < out.width() && y < out.height() {
                out.insert(x, y);
            }
        }
        out
    }

    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    pub fn into_mask(self) -> GrayImage {
        self.mask
    }

    /// Minkowski sum with `se`, clipped to the image.
    pub fn dilate(&self, se: &StructuringElement) -> Region {
        let (w, h) = self.dimensions();
        let mut out = Region::empty(w, h);
        for (x, y) in self.points() {
            for &(dx, dy) in se.offsets() {
                let nx = x as i64 + dx as i64;
                let ny = y as i64 + dy as i64;
                if nx >= 0 && ny >= 0 && nx < w as i64 && ny < h as i64 {
                    out.insert(nx as u32, ny as u32);
                }
            }
        }
        out
    }

    /// Keeps pixels whose whole `se` neighborhood lies inside the region.
    pub fn erode(&self, se: &StructuringElement) -> Region {
        let (w, h) = self.dimensions();
        let mut out = Region::empty(w, h);
        for (x, y) in self.points() {
            let inside = se
                .offsets()
                .iter()
                .all(|&(dx, dy)| self.contains(x as i64 + dx as i64, y as i64 + dy as i64));
            if inside {
                out.insert(x, y);
            }
        }
        out
    }

    /// Erosion followed by dilation with a disk of `radius`.
    pub fn opening_circle(&self, radius: f32) -> Region {
        let se = StructuringElement::circle(radius);
        self.erode(&se).dilate(&se)
    }

    /// Dilation with a disk of `radius`.
    pub fn dilation_circle(&self, radius: f32) -> Region {
        self.dilate(&StructuringElement::circle(radius))
    }

    /// Fills every background hole: background pixels that are not
    /// 4-connected to the image frame through other background pixels.
    pub fn fill_up(&self) -> Region {
        let (w, h) = self.dimensions();
        if w == 0 || h == 0 {
            return self.clone();
        }

        let mut background = self.mask.clone();
        for p in background.pixels_mut() {
            p.0[0] = if p.0[0] == 0 { 255 } else { 0 };
        }
        let labels = connected_components(&background, Connectivity::Four, Luma([0u8]));

        let mut touches_frame = std::collections::HashSet::new();
        for x in 0..w {
            touches_frame.insert(labels.get_pixel(x, 0).0[0]);
            touches_frame.insert(labels.get_pixel(x, h - 1).0[0]);
        }
        for y in 0..h {
            touches_frame.insert(labels.get_pixel(0, y).0[0]);
            touches_frame.insert(labels.get_pixel(w - 1, y).0[0]);
        }

        let mut out = self.clone();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label.0[0];
            if label != 0 && !touches_frame.contains(&label) {
                out.insert(x, y);
            }
        }
        out
    }

    /// Region pixels with at least one 4-neighbor outside the region.
    ///
    /// The image frame counts as outside, so a region touching the border has
    /// boundary pixels along it.
    pub fn inner_boundary(&self) -> Region {
        let (w, h) = self.dimensions();
        let mut out = Region::empty(w, h);
        for (x, y) in self.points() {
            let (x, y) = (x as i64, y as i64);
            let on_edge = [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
                .into_iter()
                .any(|(nx, ny)| !self.contains(nx, ny));
            if on_edge {
                out.insert(x as u32, y as u32);
            }
        }
        out
    }
}
