//! Noise suppression ahead of segmentation and edge tracing.

use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;

use crate::border::mirror_index;
use crate::config::BlurKernel;
use crate::region::StructuringElement;

/// Interchangeable smoothing strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Smoothing {
    /// Median over a circular neighborhood, mirrored at the image border.
    CircularMedian,
    /// Gaussian blur with `sigma = 0.2 * kernel`.
    Gaussian,
}

impl Smoothing {
    /// Applies the strategy with the given kernel.
    ///
    /// A kernel of size 1 returns an exact copy of the input.
    pub fn apply(self, image: &GrayImage, kernel: BlurKernel) -> GrayImage {
        if kernel.is_noop() || image.width() == 0 || image.height() == 0 {
            return image.clone();
        }

        match self {
            Smoothing::CircularMedian => median_circle(image, kernel.median_radius()),
            Smoothing::Gaussian => gaussian_blur_f32(image, 0.2 * kernel.get() as f32),
        }
    }
}

/// Median filter over a disk of integer `radius` with mirrored borders.
pub fn median_circle(image: &GrayImage, radius: u32) -> GrayImage {
    if radius == 0 {
        return image.clone();
    }

    let (w, h) = image.dimensions();
    let disk = StructuringElement::circle(radius as f32);
    let offsets = disk.offsets();
    let mid = offsets.len() / 2;

    let mut window = Vec::with_capacity(offsets.len());
    let mut out = GrayImage::new(w, h);

    for y in 0..h as isize {
        for x in 0..w as isize {
            window.clear();
            for &(dx, dy) in offsets {
                let sx = mirror_index(x + dx as isize, w as usize) as u32;
                let sy = mirror_index(y + dy as isize, h as usize) as u32;
                window.push(image.get_pixel(sx, sy).0[0]);
            }
            let (_, median, _) = window.select_nth_unstable(mid);
            out.put_pixel(x as u32, y as u32, Luma([*median]));
        }
    }

    out
}
