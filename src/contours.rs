use image::math::Rect;
use imageproc::point::Point;
use num_traits::AsPrimitive;

use crate::rect::bounding_box;

/// An ordered chain of sub-pixel edge points.
///
/// The length is computed once on construction and the contour is not
/// modified afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    points: Vec<Point<f32>>,
    closed: bool,
    length: f64,
}

impl Contour {
    /// Creates a contour, computing its length.
    ///
    /// A closed contour includes the segment from the last point back to the
    /// first in its length.
    pub fn new(points: Vec<Point<f32>>, closed: bool) -> Self {
        let length = polyline_length(&points, closed);
        Self {
            points,
            closed,
            length,
        }
    }

    pub fn points(&self) -> &[Point<f32>] {
        &self.points
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    /// Axis-aligned bounds of the contour points, or `None` if it has none.
    pub fn bounding_box(&self) -> Option<Rect> {
        bounding_box(&self.points)
    }
}

/// Calculates the length of a polyline.
///
/// The length is the sum of Euclidean distances between consecutive points.
/// When `closed` is true the distance between the last and first point is
/// included, the way a perimeter is measured.
///
/// # Type Parameters
///
/// * `T`: The numeric type of the point coordinates. It must be a type that can
///   be converted to `f64` for distance calculations, such as `i32` or `f32`.
///
/// # Arguments
///
/// * `points`: The vertices of the polyline, in order.
/// * `closed`: Whether the polyline wraps around to its first point.
///
/// # Returns
///
/// The length as an `f64`. Polylines with 0 or 1 point have a length of `0.0`.
pub fn polyline_length<T>(points: &[Point<T>], closed: bool) -> f64
where
    T: Copy + AsPrimitive<f64>,
{
    if points.len() < 2 {
        return 0.0;
    }

    let segment = |(p1, p2): (&Point<T>, &Point<T>)| -> f64 {
        let dx: f64 = p2.x.as_() - p1.x.as_();
        let dy: f64 = p2.y.as_() - p1.y.as_();
        dx.hypot(dy)
    };

    let open: f64 = points.iter().zip(points.iter().skip(1)).map(segment).sum();
    if closed {
        open + segment((&points[points.len() - 1], &points[0]))
    } else {
        open
    }
}

/// Sorts contours by length in descending order.
///
/// For performance, this function takes ownership of the input vector and uses
/// an unstable sort, so contours of equal length keep no particular order.
///
/// # Arguments
///
/// * `contours`: A `Vec<Contour>` which will be consumed by the function.
///
/// # Returns
///
/// The same contours, longest first.
pub fn sort_by_length_owned(mut contours: Vec<Contour>) -> Vec<Contour> {
    contours.sort_unstable_by(|a, b| b.length.total_cmp(&a.length));
    contours
}

/// Filters a vector of contours in-place by length.
///
/// Contours whose length falls outside `min_length..=max_length` are removed.
/// Order of the remaining contours is preserved.
///
/// # Arguments
///
/// * `contours`: A mutable reference to the contours to be filtered.
/// * `min_length`: The smallest length kept.
/// * `max_length`: The largest length kept.
///
/// # Panics
///
/// Panics if `min_length` is negative or greater than `max_length`, or if
/// either bound is NaN.
pub fn retain_by_length_in_place(contours: &mut Vec<Contour>, min_length: f64, max_length: f64) {
    assert!(
        min_length >= 0.0 && min_length <= max_length,
        "length range must satisfy 0 <= min_length <= max_length"
    );

    contours.retain(|contour| (min_length..=max_length).contains(&contour.length));
}
