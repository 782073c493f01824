use image::math::Rect;
use imageproc::point::Point;
use num_traits::{Num, ToPrimitive};

/// Calculates the axis-aligned bounding box of a set of points.
///
/// The function iterates through the points to find the minimum and maximum x
/// and y coordinates, then constructs an `image::math::Rect` that encloses all
/// of them. The result counts covered pixels, matching
/// [`Region::bounding_box`](crate::region::Region::bounding_box): a point at
/// `x` occupies pixel `floor(x)`, so a single point gives a 1 x 1 rectangle and
/// the width is `floor(max) - floor(min) + 1`.
///
/// This function is generic over numeric types that implement `PartialOrd`,
/// making it suitable for both integer and floating-point coordinates.
///
/// # Arguments
///
/// * `points` - The points to enclose. `T` must be a numeric type that supports
///   partial ordering and conversion to `f64`.
///
/// # Returns
///
/// `None` if `points` is empty, otherwise the smallest pixel-aligned `Rect`
/// covering every point. Pixels left of or above the origin are clipped.
///
/// # Examples
///
/// ```
/// use imageproc::point::Point;
/// use boundary_trace::rect::bounding_box;
///
/// let diamond = [
///     Point { x: 50.0, y: 10.0 },
///     Point { x: 90.0, y: 50.0 },
///     Point { x: 50.0, y: 90.0 },
///     Point { x: 10.0, y: 50.0 },
/// ];
///
/// let bbox = bounding_box(&diamond).unwrap();
///
/// assert_eq!(bbox.x, 10);
/// assert_eq!(bbox.y, 10);
/// assert_eq!(bbox.width, 81);
/// assert_eq!(bbox.height, 81);
/// ```
pub fn bounding_box<T>(points: &[Point<T>]) -> Option<Rect>
where
    T: Copy + PartialOrd + Num + ToPrimitive,
{
    let p0 = points.first()?;
    let mut min_x = p0.x;
    let mut max_x = p0.x;
    let mut min_y = p0.y;
    let mut max_y = p0.y;

    // Manual comparison is used here because `T` only has a `PartialOrd`.
    for p in &points[1..] {
        if p.x < min_x {
            min_x = p.x;
        }
        if p.x > max_x {
            max_x = p.x;
        }
        if p.y < min_y {
            min_y = p.y;
        }
        if p.y > max_y {
            max_y = p.y;
        }
    }

    let lower = |v: T| v.to_f64().map_or(0, |f| f.floor().max(0.0) as u32);
    // One past the last covered pixel.
    let upper = |v: T| v.to_f64().map_or(0, |f| (f.floor() + 1.0).max(0.0) as u32);

    let x = lower(min_x);
    let y = lower(min_y);

    Some(Rect {
        x,
        y,
        width: upper(max_x).saturating_sub(x),
        height: upper(max_y).saturating_sub(y),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_for_rotated_rect() {
        // A diamond shape, which is a rotated square.
        let vertices = [
            Point { x: 50, y: 10 },
            Point { x: 90, y: 50 },
            Point { x: 50, y: 90 },
            Point { x: 10, y: 50 },
        ];
        let expected = Rect {
            x: 10,
            y: 10,
            width: 81,
            height: 81,
        };
        assert_eq!(bounding_box(&vertices), Some(expected));
    }

    #[test]
    fn test_order_does_not_matter() {
        let vertices = [
            Point { x: 20, y: 30 },
            Point { x: 120, y: 30 },
            Point { x: 120, y: 80 },
            Point { x: 20, y: 80 },
        ];
        let shuffled = [vertices[2], vertices[0], vertices[3], vertices[1]];
        assert_eq!(bounding_box(&vertices), bounding_box(&shuffled));
    }

    #[test]
    fn test_fractional_points_cover_their_pixels() {
        let points = [Point { x: 3.2f32, y: 4.9 }, Point { x: 7.1, y: 5.0 }];
        let expected = Rect {
            x: 3,
            y: 4,
            width: 5,
            height: 2,
        };
        assert_eq!(bounding_box(&points), Some(expected));
    }

    #[test]
    fn test_negative_coordinates_clamp_to_zero() {
        let points = [
            Point { x: -10.0, y: -20.0 },
            Point { x: 50.0, y: 30.0 },
        ];
        let expected = Rect {
            x: 0,
            y: 0,
            width: 51,
            height: 31,
        };
        assert_eq!(bounding_box(&points), Some(expected));
    }

    #[test]
    fn test_empty_and_single_point() {
        assert_eq!(bounding_box::<i32>(&[]), None);

        let single = [Point { x: 100, y: 100 }];
        let expected = Rect {
            x: 100,
            y: 100,
            width: 1,
            height: 1,
        };
        assert_eq!(bounding_box(&single), Some(expected));
    }

    #[test]
    fn test_matches_region_bounding_box() {
        use crate::region::Region;

        let region = Region::from_fn(30, 20, |x, y| {
            ((4..17).contains(&x) && (6..9).contains(&y)) || (x == 22 && y == 15)
        });
        let points: Vec<Point<u32>> = region.points().map(|(x, y)| Point::new(x, y)).collect();
        assert_eq!(bounding_box(&points), region.bounding_box());

        let lone = Region::from_fn(10, 10, |x, y| x == 3 && y == 7);
        assert_eq!(bounding_box(&[Point::new(3u32, 7)]), lone.bounding_box());
    }
}
