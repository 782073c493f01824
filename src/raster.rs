//! The in-memory 8-bit raster that moves through the pipeline.

use image::{DynamicImage, GrayImage};

use crate::error::{PipelineError, Result};

/// A rectangular grid of interleaved 8-bit samples.
///
/// The sample count always equals `width * height * channels`. Channel counts
/// other than 1, 3 and 4 are representable (a gray+alpha image has 2) and are
/// handled by the channel normalizer's fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    channels: u8,
    samples: Vec<u8>,
}

impl Raster {
    /// Builds a raster from interleaved samples.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidRaster`] if `channels` is zero or the
    /// sample count does not match the dimensions.
    pub fn new(width: u32, height: u32, channels: u8, samples: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * channels as usize;
        if channels == 0 || samples.len() != expected {
            return Err(PipelineError::InvalidRaster {
                width,
                height,
                channels,
                expected,
                actual: samples.len(),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            samples,
        })
    }

    /// Wraps a single-channel image without copying.
    pub fn from_gray(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            channels: 1,
            samples: image.into_raw(),
        }
    }

    /// Converts a decoded image, keeping its channel layout where it is 8-bit.
    ///
    /// Higher bit depths are reduced to 8-bit gray, RGB or RGBA depending on
    /// the color type of the source.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyImage`] if the image has no pixels.
    pub fn from_dynamic(image: DynamicImage) -> Result<Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(PipelineError::EmptyImage);
        }

        let (width, height) = (image.width(), image.height());
        let (channels, samples) = match image {
            DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
            DynamicImage::ImageLumaA8(buf) => (2, buf.into_raw()),
            DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
            DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
            other => {
                let color = other.color();
                if color.has_alpha() {
                    (4, other.to_rgba8().into_raw())
                } else if color.has_color() {
                    (3, other.to_rgb8().into_raw())
                } else {
                    (1, other.to_luma8().into_raw())
                }
            }
        };

        Self::new(width, height, channels, samples)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Copies channel `index` out into its own plane.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.channels()`.
    pub fn plane(&self, index: u8) -> Vec<u8> {
        assert!(index < self.channels, "channel index out of range");
        self.samples
            .iter()
            .skip(index as usize)
            .step_by(self.channels as usize)
            .copied()
            .collect()
    }

    /// Returns the raster as a gray image if it has exactly one channel.
    pub fn into_gray_image(self) -> Option<GrayImage> {
        if self.channels != 1 {
            return None;
        }
        GrayImage::from_raw(self.width, self.height, self.samples)
    }

    /// Borrowing variant of [`Raster::into_gray_image`].
    pub fn to_gray_image(&self) -> Option<GrayImage> {
        self.clone().into_gray_image()
    }

    /// Converts back to a [`DynamicImage`] for encoding.
    ///
    /// Returns `None` for channel counts the `image` crate cannot represent.
    pub fn into_dynamic(self) -> Option<DynamicImage> {
        let (w, h) = (self.width, self.height);
        match self.channels {
            1 => GrayImage::from_raw(w, h, self.samples).map(DynamicImage::ImageLuma8),
            2 => image::GrayAlphaImage::from_raw(w, h, self.samples)
                .map(DynamicImage::ImageLumaA8),
            3 => image::RgbImage::from_raw(w, h, self.samples).map(DynamicImage::ImageRgb8),
            4 => image::RgbaImage::from_raw(w, h, self.samples).map(DynamicImage::ImageRgba8),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{LumaA, Rgb, RgbImage};

    #[test]
    fn new_rejects_mismatched_sample_count() {
        let err = Raster::new(4, 4, 3, vec![0; 47]).unwrap_err();
        match err {
            PipelineError::InvalidRaster {
                expected, actual, ..
            } => {
                assert_eq!(expected, 48);
                assert_eq!(actual, 47);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(Raster::new(4, 4, 0, Vec::new()).is_err());
        assert!(Raster::new(4, 4, 5, vec![0; 80]).is_ok());
    }

    #[test]
    fn from_dynamic_keeps_channel_layout() {
        let rgb = RgbImage::from_pixel(3, 2, Rgb([10, 20, 30]));
        let raster = Raster::from_dynamic(DynamicImage::ImageRgb8(rgb)).unwrap();
        assert_eq!(raster.dimensions(), (3, 2));
        assert_eq!(raster.channels(), 3);
        assert_eq!(raster.plane(1), vec![20; 6]);

        let gray_alpha = image::GrayAlphaImage::from_pixel(2, 2, LumaA([7, 200]));
        let raster = Raster::from_dynamic(DynamicImage::ImageLumaA8(gray_alpha)).unwrap();
        assert_eq!(raster.channels(), 2);
        assert_eq!(raster.plane(0), vec![7; 4]);
    }

    #[test]
    fn from_dynamic_reduces_high_bit_depth() {
        let img = DynamicImage::new_rgb16(5, 5);
        let raster = Raster::from_dynamic(img).unwrap();
        assert_eq!(raster.channels(), 3);
        assert_eq!(raster.samples().len(), 75);
    }

    #[test]
    fn empty_image_is_rejected() {
        let img = DynamicImage::new_luma8(0, 10);
        assert!(matches!(
            Raster::from_dynamic(img),
            Err(PipelineError::EmptyImage)
        ));
    }

    #[test]
    fn gray_round_trip_only_for_single_channel() {
        let gray = GrayImage::from_pixel(4, 3, image::Luma([9]));
        let raster = Raster::from_gray(gray.clone());
        assert_eq!(raster.to_gray_image(), Some(gray));

        let rgb = Raster::new(1, 1, 3, vec![1, 2, 3]).unwrap();
        assert!(rgb.into_gray_image().is_none());
    }
}
