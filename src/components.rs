//! Connected-component partitioning of a region.

use image::Luma;
use imageproc::point::Point;
use imageproc::region_labelling::{Connectivity, connected_components};

use crate::region::Region;

/// One connected piece of a region, kept as a pixel list.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub points: Vec<(u32, u32)>,
    pub area: usize,
    pub centroid: Point<f64>,
    width: u32,
    height: u32,
}

impl Component {
    /// Materializes the component as a full-size region.
    pub fn to_region(&self) -> Region {
        let mut region = Region::empty(self.width, self.height);
        for &(x, y) in &self.points {
            region.insert(x, y);
        }
        region
    }
}

/// Disjoint 8-connected components whose union is the labeled region.
///
/// Components are stored in label order, which is the row-major order of
/// each component's first pixel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConnectedComponentSet {
    components: Vec<Component>,
}

impl ConnectedComponentSet {
    /// Labels `region` with 8-connectivity.
    pub fn label(region: &Region) -> Self {
        let (w, h) = region.dimensions();
        if region.is_empty() {
            return Self::default();
        }

        let labels = connected_components(region.mask(), Connectivity::Eight, Luma([0u8]));

        let mut components: Vec<Component> = Vec::new();
        let mut sums: Vec<(f64, f64)> = Vec::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label.0[0] as usize;
            if label == 0 {
                continue;
            }
            let i = label - 1;
            while components.len() <= i {
                components.push(Component {
                    points: Vec::new(),
                    area: 0,
                    centroid: Point::new(0.0, 0.0),
                    width: w,
                    height: h,
                });
                sums.push((0.0, 0.0));
            }
            components[i].points.push((x, y));
            components[i].area += 1;
            sums[i].0 += x as f64;
            sums[i].1 += y as f64;
        }

        for (c, (sx, sy)) in components.iter_mut().zip(sums) {
            if c.area > 0 {
                c.centroid = Point::new(sx / c.area as f64, sy / c.area as f64);
            }
        }
        components.retain(|c| c.area > 0);

        Self { components }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    pub fn areas(&self) -> Vec<usize> {
        self.components.iter().map(|c| c.area).collect()
    }

    /// The component with the largest area.
    ///
    /// Equal areas are resolved by the smallest centroid row, then the
    /// smallest centroid column, so the choice does not depend on labeling
    /// order.
    pub fn largest(&self) -> Option<&Component> {
        self.components.iter().min_by(|a, b| {
            b.area
                .cmp(&a.area)
                .then_with(|| a.centroid.y.total_cmp(&b.centroid.y))
                .then_with(|| a.centroid.x.total_cmp(&b.centroid.x))
        })
    }

    pub fn into_components(self) -> Vec<Component> {
        self.components
    }
}
