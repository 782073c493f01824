//! Outer-boundary extraction for the dominant object in a still image.
//!
//! Two backends share one set of building blocks:
//!
//! - [`Backend::Simple`]: gray, Gaussian blur, hysteresis edge map of the whole
//!   frame.
//! - [`Backend::RegionBased`]: gray, circular median, Otsu segmentation,
//!   morphological cleanup, largest component, a search band around its
//!   outline, and sub-pixel edge tracing restricted to that band.
//!
//! Both return a single-channel raster with edges at 255 on a 0 background.
//!
//! ```no_run
//! use std::path::Path;
//! use boundary_trace::{Backend, FileImageSource, Pipeline, PngFileSink, ProcessingParameters};
//!
//! let pipeline = Pipeline::new(Backend::RegionBased, ProcessingParameters::default());
//! pipeline.run_file(&FileImageSource, Path::new("part.png"), &PngFileSink::new("edges.png"))?;
//! # Ok::<(), boundary_trace::PipelineError>(())
//! ```

mod border;
mod colors;

pub mod backend;
pub mod band;
pub mod components;
pub mod config;
pub mod contours;
pub mod error;
pub mod isolate;
pub mod normalize;
pub mod pipeline;
pub mod raster;
pub mod rasterize;
pub mod rect;
pub mod region;
pub mod smoothing;
pub mod subpix;

pub use backend::{Backend, ParseBackendError, TraceOutcome};
pub use config::{BlurKernel, Polarity, ProcessingParameters, RegionPolicy};
pub use contours::Contour;
pub use error::{PipelineError, Result};
pub use pipeline::{FileImageSource, ImageSource, Pipeline, PngFileSink, RasterSink, process_batch};
pub use raster::Raster;
pub use region::Region;
