//! The narrow search band around an object's outline.

use log::debug;

use crate::region::Region;

/// Builds the search band for the edge tracer: the inner boundary of the
/// selected region dilated by a disk of `radius`.
///
/// Interior edges of the object are never inside the band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryBandBuilder {
    pub radius: f32,
}

impl BoundaryBandBuilder {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }

    pub fn build(&self, selected: &Region) -> Region {
        let boundary = selected.inner_boundary();
        let band = boundary.dilation_circle(self.radius);
        debug!(
            "boundary {} px, band {} px (radius {})",
            boundary.area(),
            band.area(),
            self.radius
        );
        band
    }
}

impl Default for BoundaryBandBuilder {
    fn default() -> Self {
        Self::new(crate::config::BAND_RADIUS)
    }
}
