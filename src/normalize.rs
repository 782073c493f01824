//! Reduction of arbitrary-channel rasters to single-channel intensity.

use image::GrayImage;
use log::debug;

use crate::config::ChannelFallback;
use crate::raster::Raster;

/// Converts a raster to single-channel intensity.
///
/// * 1 channel: returned unchanged.
/// * 3 channels: RGB luma, `0.299 R + 0.587 G + 0.114 B`.
/// * 4 channels: alpha plane dropped, the remaining planes recombined and
///   converted as RGB.
/// * anything else: resolved by `fallback`, which never fails.
///
/// Width and height are always preserved.
pub fn to_intensity(raster: &Raster, fallback: ChannelFallback) -> GrayImage {
    let (width, height) = raster.dimensions();
    let channels = raster.channels();

    let samples = match channels {
        1 => raster.samples().to_vec(),
        3 => rgb_to_gray(raster.samples()),
        4 => {
            let planes: Vec<Vec<u8>> = (0..4).map(|c| raster.plane(c)).collect();
            let rgb = compose3(&planes[0], &planes[1], &planes[2]);
            rgb_to_gray(&rgb)
        }
        _ => {
            debug!("unsupported channel count {channels}, applying {fallback:?}");
            match fallback {
                ChannelFallback::FirstChannel => raster.plane(0),
            }
        }
    };

    // Sample counts are guaranteed by the raster invariant.
    GrayImage::from_raw(width, height, samples)
        .unwrap_or_else(|| GrayImage::new(width, height))
}

fn compose3(r: &[u8], g: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(r.len() * 3);
    for ((&r, &g), &b) in r.iter().zip(g).zip(b) {
        out.extend_from_slice(&[r, g, b]);
    }
    out
}

fn rgb_to_gray(rgb: &[u8]) -> Vec<u8> {
    rgb.chunks_exact(3)
        .map(|px| {
            let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
            y.round().clamp(0.0, 255.0) as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(channels: u8, pixel: &[u8]) -> Raster {
        let (w, h) = (5, 3);
        let samples = pixel.repeat(w * h);
        Raster::new(w as u32, h as u32, channels, samples).unwrap()
    }

    #[test]
    fn supported_channel_counts_give_single_channel() {
        let cases = [
            raster(1, &[42]),
            raster(3, &[10, 200, 30]),
            raster(4, &[10, 200, 30, 0]),
        ];

        for input in &cases {
            let gray = to_intensity(input, ChannelFallback::FirstChannel);
            assert_eq!(gray.dimensions(), (5, 3));
            assert_eq!(gray.as_raw().len(), 15);
        }
    }

    #[test]
    fn single_channel_passes_through() {
        let samples: Vec<u8> = (0..15).collect();
        let input = Raster::new(5, 3, 1, samples.clone()).unwrap();
        let gray = to_intensity(&input, ChannelFallback::FirstChannel);
        assert_eq!(gray.into_raw(), samples);
    }

    #[test]
    fn rgb_uses_luma_weights() {
        let gray = to_intensity(&raster(3, &[255, 0, 0]), ChannelFallback::FirstChannel);
        assert_eq!(gray.get_pixel(0, 0).0[0], 76);

        let gray = to_intensity(&raster(3, &[0, 255, 0]), ChannelFallback::FirstChannel);
        assert_eq!(gray.get_pixel(0, 0).0[0], 150);

        let gray = to_intensity(&raster(3, &[255, 255, 255]), ChannelFallback::FirstChannel);
        assert_eq!(gray.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn alpha_is_ignored() {
        let opaque = to_intensity(&raster(4, &[10, 200, 30, 255]), ChannelFallback::FirstChannel);
        let clear = to_intensity(&raster(4, &[10, 200, 30, 0]), ChannelFallback::FirstChannel);
        let rgb = to_intensity(&raster(3, &[10, 200, 30]), ChannelFallback::FirstChannel);
        assert_eq!(opaque, clear);
        assert_eq!(opaque, rgb);
    }

    #[test]
    fn unusual_channel_counts_use_first_channel() {
        let two = to_intensity(&raster(2, &[17, 99]), ChannelFallback::FirstChannel);
        assert!(two.pixels().all(|p| p.0[0] == 17));

        let five = to_intensity(&raster(5, &[3, 4, 5, 6, 7]), ChannelFallback::FirstChannel);
        assert_eq!(five.dimensions(), (5, 3));
        assert!(five.pixels().all(|p| p.0[0] == 3));
    }
}
