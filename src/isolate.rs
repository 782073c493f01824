//! Segmentation of the target object from a smoothed intensity image.

use image::GrayImage;
use imageproc::contrast::otsu_level;
use log::{debug, warn};

use crate::components::ConnectedComponentSet;
use crate::config::{Polarity, RegionPolicy};
use crate::region::Region;

/// Everything the isolator produced, including intermediates useful for
/// debugging a degenerate result.
#[derive(Debug, Clone)]
pub struct Isolation {
    /// Separability threshold, or `None` for a constant image.
    pub level: Option<u8>,
    /// The mask after opening and hole filling.
    pub filled: Region,
    pub components: ConnectedComponentSet,
    /// The selected object.
    pub selected: Region,
    /// `true` when no component existed and `selected` is the filled mask.
    pub used_fallback: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegionIsolator {
    pub polarity: Polarity,
    pub opening_radius: f32,
}

impl RegionIsolator {
    pub fn new(policy: &RegionPolicy) -> Self {
        Self {
            polarity: policy.polarity,
            opening_radius: policy.opening_radius,
        }
    }

    /// Thresholds, cleans and labels `smoothed`, then selects the largest
    /// component.
    ///
    /// Never fails: an empty segmentation yields an empty selection with
    /// `used_fallback` set.
    pub fn isolate(&self, smoothed: &GrayImage) -> Isolation {
        let (region, level) = binary_threshold(smoothed, self.polarity);
        debug!(
            "threshold level {:?} ({:?}) selected {} px",
            level,
            self.polarity,
            region.area()
        );

        let opened = region.opening_circle(self.opening_radius);
        let filled = opened.fill_up();
        let components = ConnectedComponentSet::label(&filled);
        debug!("{} connected components", components.len());

        let (selected, used_fallback) = match components.largest() {
            Some(largest) => {
                debug!(
                    "selected component: area {} centroid ({:.1}, {:.1})",
                    largest.area, largest.centroid.x, largest.centroid.y
                );
                (largest.to_region(), false)
            }
            None => {
                warn!("segmentation found no components, keeping the filled mask");
                (filled.clone(), true)
            }
        };

        Isolation {
            level,
            filled,
            components,
            selected,
            used_fallback,
        }
    }
}

impl Default for RegionIsolator {
    fn default() -> Self {
        Self::new(&RegionPolicy::default())
    }
}

/// Splits `image` at its maximum-separability (Otsu) level.
///
/// A constant image has no second population, so the result is an empty
/// region and no level.
pub fn binary_threshold(image: &GrayImage, polarity: Polarity) -> (Region, Option<u8>) {
    let (w, h) = image.dimensions();
    let raw = image.as_raw();
    let (Some(&min), Some(&max)) = (raw.iter().min(), raw.iter().max()) else {
        return (Region::empty(w, h), None);
    };
    if min == max {
        return (Region::empty(w, h), None);
    }

    let level = otsu_level(image);
    let region = Region::from_fn(w, h, |x, y| {
        let v = image.get_pixel(x, y).0[0];
        match polarity {
            Polarity::Dark => v <= level,
            Polarity::Bright => v > level,
        }
    });

    (region, Some(level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn scene(background: u8, object: u8) -> GrayImage {
        GrayImage::from_fn(60, 60, |x, y| {
            let in_big = (10..40).contains(&x) && (10..40).contains(&y);
            let in_small = (48..56).contains(&x) && (48..56).contains(&y);
            Luma([if in_big || in_small { object } else { background }])
        })
    }

    #[test]
    fn uniform_input_falls_back_without_error() {
        let img = GrayImage::from_pixel(32, 32, Luma([128]));
        let isolation = RegionIsolator::default().isolate(&img);
        assert!(isolation.level.is_none());
        assert!(isolation.components.is_empty());
        assert!(isolation.used_fallback);
        assert_eq!(isolation.selected, isolation.filled);
        assert!(isolation.selected.is_empty());

        let black = GrayImage::new(16, 16);
        let isolation = RegionIsolator::default().isolate(&black);
        assert!(isolation.used_fallback);
        assert!(isolation.selected.is_empty());
    }

    #[test]
    fn dark_polarity_selects_largest_dark_object() {
        let isolation = RegionIsolator::default().isolate(&scene(220, 30));
        assert!(!isolation.used_fallback);
        assert_eq!(isolation.components.len(), 2);

        let selected = &isolation.selected;
        assert!(selected.contains(25, 25));
        assert!(!selected.contains(52, 52));
        let bbox = selected.bounding_box().unwrap();
        assert_eq!((bbox.x, bbox.y, bbox.width, bbox.height), (10, 10, 30, 30));
    }

    #[test]
    fn bright_polarity_selects_bright_object() {
        let isolator = RegionIsolator {
            polarity: Polarity::Bright,
            ..RegionIsolator::default()
        };
        let isolation = isolator.isolate(&scene(30, 220));
        assert!(isolation.selected.contains(25, 25));
        assert!(!isolation.selected.contains(2, 2));
    }

    #[test]
    fn dark_polarity_on_bright_object_selects_background() {
        // The dark population is the frame around the square; filling its
        // hole swallows the square too. Opening only nibbles the image corners.
        let img = GrayImage::from_fn(50, 50, |x, y| {
            let inside = (15..35).contains(&x) && (15..35).contains(&y);
            Luma([if inside { 255 } else { 0 }])
        });
        let isolation = RegionIsolator::default().isolate(&img);
        assert!(!isolation.used_fallback);
        assert!(isolation.selected.contains(25, 25));
        assert!(isolation.selected.area() >= 2450);
    }

    #[test]
    fn holes_are_filled_and_specks_removed() {
        let img = GrayImage::from_fn(60, 60, |x, y| {
            let ring = (10..40).contains(&x)
                && (10..40).contains(&y)
                && !((20..30).contains(&x) && (20..30).contains(&y));
            let speck = x == 50 && y == 50;
            Luma([if ring || speck { 0 } else { 255 }])
        });
        let isolation = RegionIsolator::default().isolate(&img);
        assert_eq!(isolation.components.len(), 1);
        assert!(isolation.selected.contains(25, 25));
        assert!(!isolation.selected.contains(50, 50));
    }
}
