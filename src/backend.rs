//! The two processing backends and the invocation boundary around them.
//!
//! [`Backend::Simple`] smooths with a Gaussian and emits the hysteresis edge
//! map of the whole frame. [`Backend::RegionBased`] isolates the dominant
//! object first and traces sub-pixel edges only in a narrow band around its
//! outline.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::str::FromStr;

use image::GrayImage;
use log::{debug, info};

use crate::band::BoundaryBandBuilder;
use crate::config::{ProcessingParameters, RegionPolicy};
use crate::contours::{Contour, sort_by_length_owned};
use crate::error::{PipelineError, Result};
use crate::isolate::{Isolation, RegionIsolator};
use crate::normalize::to_intensity;
use crate::raster::Raster;
use crate::rasterize::paint_contours;
use crate::region::Region;
use crate::smoothing::Smoothing;
use crate::subpix::{GradientNorm, SubPixelEdgeTracer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Simple,
    RegionBased,
}

/// A backend name that is not one of the accepted spellings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backend `{0}` (expected simple|opencv or region|halcon)")]
pub struct ParseBackendError(pub String);

impl FromStr for Backend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" | "opencv" => Ok(Backend::Simple),
            "region" | "halcon" => Ok(Backend::RegionBased),
            _ => Err(ParseBackendError(s.to_string())),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Simple => "simple",
            Backend::RegionBased => "region",
        })
    }
}

/// Everything one backend run produced.
#[derive(Debug, Clone)]
pub struct TraceOutcome {
    /// Single-channel result: 255 on traced edges, 0 elsewhere.
    pub output: GrayImage,
    /// The normalized intensity image the run started from.
    pub intensity: GrayImage,
    pub contours: Vec<Contour>,
    /// Region-based runs only.
    pub isolation: Option<Isolation>,
    /// Region-based runs only.
    pub band: Option<Region>,
}

impl Backend {
    pub const ALL: [Backend; 2] = [Backend::Simple, Backend::RegionBased];

    /// Whether this backend was compiled into the build.
    pub fn is_available(self) -> bool {
        match self {
            Backend::Simple => cfg!(feature = "simple"),
            Backend::RegionBased => cfg!(feature = "region"),
        }
    }

    /// Runs the backend with the default [`RegionPolicy`] and returns the
    /// single-channel result raster.
    ///
    /// # Errors
    ///
    /// [`PipelineError::BackendUnavailable`] if the backend is not compiled in,
    /// [`PipelineError::BackendInternal`] if processing panicked.
    pub fn process_image(self, raster: &Raster, params: &ProcessingParameters) -> Result<Raster> {
        self.process_with_policy(raster, params, &RegionPolicy::default())
    }

    pub fn process_with_policy(
        self,
        raster: &Raster,
        params: &ProcessingParameters,
        policy: &RegionPolicy,
    ) -> Result<Raster> {
        let outcome = self.trace(raster, params, policy)?;
        Ok(Raster::from_gray(outcome.output))
    }

    /// Like [`Backend::process_with_policy`] but keeps the contours and
    /// intermediate regions for inspection.
    pub fn trace(
        self,
        raster: &Raster,
        params: &ProcessingParameters,
        policy: &RegionPolicy,
    ) -> Result<TraceOutcome> {
        if !self.is_available() {
            return Err(PipelineError::BackendUnavailable(self));
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| match self {
            Backend::Simple => run_simple(raster, params, policy),
            Backend::RegionBased => run_region(raster, params, policy),
        }))
        .map_err(|payload| PipelineError::BackendInternal(panic_message(payload.as_ref())))?;

        let painted = outcome.output.pixels().filter(|p| p.0[0] != 0).count();
        info!(
            "{self} backend: {}x{} input, {} contours, {painted} edge pixels",
            raster.width(),
            raster.height(),
            outcome.contours.len()
        );
        Ok(outcome)
    }
}

fn run_simple(
    raster: &Raster,
    params: &ProcessingParameters,
    policy: &RegionPolicy,
) -> TraceOutcome {
    let intensity = to_intensity(raster, policy.channel_fallback);
    let smoothed = Smoothing::Gaussian.apply(&intensity, params.blur_kernel);

    let trace = SubPixelEdgeTracer::new(0.0)
        .with_norm(GradientNorm::L1)
        .detect(
            &smoothed,
            None,
            params.low_threshold as f32,
            params.high_threshold as f32,
        );

    TraceOutcome {
        output: trace.edge_map(),
        intensity,
        contours: trace.link(),
        isolation: None,
        band: None,
    }
}

fn run_region(
    raster: &Raster,
    params: &ProcessingParameters,
    policy: &RegionPolicy,
) -> TraceOutcome {
    let intensity = to_intensity(raster, policy.channel_fallback);
    let smoothed = Smoothing::CircularMedian.apply(&intensity, params.blur_kernel);

    let isolation = RegionIsolator::new(policy).isolate(&smoothed);
    let band = BoundaryBandBuilder::new(policy.band_radius).build(&isolation.selected);

    let tracer = SubPixelEdgeTracer::new(policy.tracer_sigma).with_length_range(
        policy.min_contour_length as f64,
        policy.max_contour_length as f64,
    );
    let contours = sort_by_length_owned(tracer.trace(
        &smoothed,
        Some(&band),
        params.low_threshold as f32,
        params.high_threshold as f32,
    ));
    if let Some(bbox) = contours.first().and_then(Contour::bounding_box) {
        debug!(
            "longest contour spans {}x{} at ({}, {})",
            bbox.width, bbox.height, bbox.x, bbox.y
        );
    }

    let (w, h) = intensity.dimensions();
    TraceOutcome {
        output: paint_contours(&contours, w, h),
        intensity,
        contours,
        isolation: Some(isolation),
        band: Some(band),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
