//! Per-invocation parameters and the fixed policies of the region pipeline.

/// Which side of the separability threshold is treated as the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Dark object on a light background: gray values `<= level`.
    #[default]
    Dark,
    /// Bright object on a dark background: gray values `> level`.
    Bright,
}

/// How rasters with an unusual channel count become single-channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelFallback {
    /// Use the first channel unchanged.
    #[default]
    FirstChannel,
}

pub const DEFAULT_POLARITY: Polarity = Polarity::Dark;
pub const DEFAULT_CHANNEL_FALLBACK: ChannelFallback = ChannelFallback::FirstChannel;
pub const OPENING_RADIUS: f32 = 3.5;
pub const BAND_RADIUS: f32 = 5.0;
pub const TRACER_SIGMA: f32 = 1.0;
pub const MIN_CONTOUR_LENGTH: f32 = 20.0;
pub const MAX_CONTOUR_LENGTH: f32 = 99_999.0;

/// A positive, odd smoothing kernel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlurKernel(u32);

impl BlurKernel {
    /// Corrects a requested size the way interactive input is corrected:
    /// zero becomes 1 and even sizes are bumped to the next odd value.
    ///
    /// ```
    /// use boundary_trace::config::BlurKernel;
    ///
    /// assert_eq!(BlurKernel::from_requested(4).get(), 5);
    /// assert_eq!(BlurKernel::from_requested(5).get(), 5);
    /// assert_eq!(BlurKernel::from_requested(0).get(), 1);
    /// ```
    pub fn from_requested(size: u32) -> Self {
        let size = size.max(1);
        if size % 2 == 0 {
            Self(size + 1)
        } else {
            Self(size)
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Radius of the circular median window.
    ///
    /// The kernel size is the disk radius itself, so a kernel of 5 covers
    /// every pixel within 5 px of the center.
    pub fn median_radius(self) -> u32 {
        self.0
    }

    /// Smoothing is skipped entirely for kernels of size 1.
    pub fn is_noop(self) -> bool {
        self.0 <= 1
    }
}

impl Default for BlurKernel {
    fn default() -> Self {
        Self(5)
    }
}

/// Parameters supplied once per invocation.
///
/// `low_threshold <= high_threshold` is not required; the tracer swaps an
/// inverted pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingParameters {
    pub low_threshold: u8,
    pub high_threshold: u8,
    pub blur_kernel: BlurKernel,
}

impl ProcessingParameters {
    pub fn new(low_threshold: u8, high_threshold: u8, blur_kernel: u32) -> Self {
        Self {
            low_threshold,
            high_threshold,
            blur_kernel: BlurKernel::from_requested(blur_kernel),
        }
    }
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self::new(70, 150, 5)
    }
}

/// Scene assumptions and fixed radii of the region-based backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionPolicy {
    pub polarity: Polarity,
    pub channel_fallback: ChannelFallback,
    pub opening_radius: f32,
    pub band_radius: f32,
    pub tracer_sigma: f32,
    pub min_contour_length: f32,
    pub max_contour_length: f32,
}

impl Default for RegionPolicy {
    fn default() -> Self {
        Self {
            polarity: DEFAULT_POLARITY,
            channel_fallback: DEFAULT_CHANNEL_FALLBACK,
            opening_radius: OPENING_RADIUS,
            band_radius: BAND_RADIUS,
            tracer_sigma: TRACER_SIGMA,
            min_contour_length: MIN_CONTOUR_LENGTH,
            max_contour_length: MAX_CONTOUR_LENGTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_correction_and_radius() {
        for (requested, expected) in [(0, 1), (1, 1), (2, 3), (3, 3), (30, 31), (31, 31)] {
            assert_eq!(BlurKernel::from_requested(requested).get(), expected);
        }
        assert_eq!(BlurKernel::from_requested(3).median_radius(), 3);
        assert_eq!(BlurKernel::from_requested(4).median_radius(), 5);
        assert!(BlurKernel::from_requested(1).is_noop());
        assert!(!BlurKernel::from_requested(3).is_noop());
    }

    #[test]
    fn defaults_match_interactive_defaults() {
        let params = ProcessingParameters::default();
        assert_eq!(params.low_threshold, 70);
        assert_eq!(params.high_threshold, 150);
        assert_eq!(params.blur_kernel.get(), 5);

        let policy = RegionPolicy::default();
        assert_eq!(policy.polarity, Polarity::Dark);
        assert_eq!(policy.opening_radius, 3.5);
        assert_eq!(policy.band_radius, 5.0);
        assert_eq!(policy.min_contour_length, 20.0);
    }
}
