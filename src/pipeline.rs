//! Loading, running and storing: the edges of the pipeline.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageFormat};
use log::{info, warn};
use rayon::prelude::*;

use crate::backend::{Backend, TraceOutcome};
use crate::config::{ProcessingParameters, RegionPolicy};
use crate::error::{PipelineError, Result};
use crate::raster::Raster;

/// Something that turns a path into a [`Raster`].
pub trait ImageSource {
    fn load(&self, path: &Path) -> Result<Raster>;
}

/// Decodes files with [`image::open`], format guessed from the extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileImageSource;

impl ImageSource for FileImageSource {
    fn load(&self, path: &Path) -> Result<Raster> {
        let image = image::open(path)?;
        Raster::from_dynamic(image)
    }
}

/// Something that stores a result raster.
pub trait RasterSink {
    fn write(&self, raster: &Raster) -> Result<()>;
}

/// Writes rasters as PNG to a fixed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngFileSink {
    pub path: PathBuf,
}

impl PngFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RasterSink for PngFileSink {
    fn write(&self, raster: &Raster) -> Result<()> {
        let image = match raster.clone().into_dynamic() {
            Some(image) => image,
            None => {
                warn!(
                    "{}-channel raster has no PNG layout, writing its first channel",
                    raster.channels()
                );
                let (w, h) = raster.dimensions();
                let plane = GrayImage::from_raw(w, h, raster.plane(0))
                    .ok_or(PipelineError::EmptyImage)?;
                DynamicImage::ImageLuma8(plane)
            }
        };

        image
            .save_with_format(&self.path, ImageFormat::Png)
            .map_err(PipelineError::Write)?;
        info!("wrote {}", self.path.display());
        Ok(())
    }
}

/// A backend together with its parameters, ready to run on many inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub backend: Backend,
    pub params: ProcessingParameters,
    pub policy: RegionPolicy,
}

impl Pipeline {
    pub fn new(backend: Backend, params: ProcessingParameters) -> Self {
        Self {
            backend,
            params,
            policy: RegionPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: RegionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn run(&self, raster: &Raster) -> Result<Raster> {
        self.backend
            .process_with_policy(raster, &self.params, &self.policy)
    }

    /// Runs and keeps the intermediates, for overlays and inspection.
    pub fn trace(&self, raster: &Raster) -> Result<TraceOutcome> {
        self.backend.trace(raster, &self.params, &self.policy)
    }

    /// Loads `input`, processes it and hands the result to `sink`.
    ///
    /// Backend availability is checked before anything is decoded.
    pub fn run_file<S, K>(&self, source: &S, input: &Path, sink: &K) -> Result<Raster>
    where
        S: ImageSource + ?Sized,
        K: RasterSink + ?Sized,
    {
        if !self.backend.is_available() {
            return Err(PipelineError::BackendUnavailable(self.backend));
        }

        let raster = source.load(input)?;
        info!(
            "loaded {} ({}x{}, {} channels)",
            input.display(),
            raster.width(),
            raster.height(),
            raster.channels()
        );

        let result = self.run(&raster)?;
        sink.write(&result)?;
        Ok(result)
    }
}

/// Processes independent rasters in parallel.
///
/// Results come back in input order; one failure does not affect the others.
pub fn process_batch(pipeline: &Pipeline, rasters: &[Raster]) -> Vec<Result<Raster>> {
    rasters.par_iter().map(|raster| pipeline.run(raster)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemorySink {
        written: Mutex<Vec<Raster>>,
    }

    impl RasterSink for MemorySink {
        fn write(&self, raster: &Raster) -> Result<()> {
            self.written.lock().unwrap().push(raster.clone());
            Ok(())
        }
    }

    struct FixedSource(Raster);

    impl ImageSource for FixedSource {
        fn load(&self, _path: &Path) -> Result<Raster> {
            Ok(self.0.clone())
        }
    }

    fn scene(offset: u32) -> Raster {
        Raster::from_gray(GrayImage::from_fn(80, 80, |x, y| {
            let inside = (20 + offset..50 + offset).contains(&x) && (20..50).contains(&y);
            Luma([if inside { 10 } else { 240 }])
        }))
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("boundary-trace-{}-{name}", std::process::id()))
    }

    #[test]
    fn batch_returns_one_result_per_input_in_order() {
        let pipeline = Pipeline::new(Backend::RegionBased, ProcessingParameters::new(50, 150, 3));
        let rasters: Vec<Raster> = (0..4).map(|i| scene(i * 5)).collect();

        let results = process_batch(&pipeline, &rasters);
        assert_eq!(results.len(), 4);
        for (i, result) in results.iter().enumerate() {
            let result = result.as_ref().unwrap();
            assert_eq!(result.dimensions(), (80, 80));
            assert_eq!(result, &pipeline.run(&rasters[i]).unwrap());
        }
        assert_ne!(
            results[0].as_ref().unwrap(),
            results[3].as_ref().unwrap()
        );
    }

    #[test]
    fn run_file_hands_result_to_sink() {
        let pipeline = Pipeline::new(Backend::Simple, ProcessingParameters::default());
        let sink = MemorySink::default();
        let result = pipeline
            .run_file(&FixedSource(scene(0)), Path::new("unused.png"), &sink)
            .unwrap();

        let written = sink.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0], result);
        assert!(result.samples().iter().any(|&v| v == 255));
    }

    #[test]
    fn missing_file_is_a_decode_error() {
        let err = FileImageSource
            .load(Path::new("/nonexistent/boundary-trace/input.png"))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn png_round_trip_through_disk() {
        let path = temp_path("round-trip.png");
        let original = Backend::Simple
            .process_image(&scene(0), &ProcessingParameters::default())
            .unwrap();

        PngFileSink::new(&path).write(&original).unwrap();
        let loaded = FileImageSource.load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, original);
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let raster = Raster::from_gray(GrayImage::new(4, 4));
        let err = PngFileSink::new("/nonexistent/boundary-trace/out.png")
            .write(&raster)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Write(_)));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn unusual_channel_counts_write_first_channel() {
        let path = temp_path("five-channels.png");
        let samples: Vec<u8> = (0..2 * 2 * 5).map(|i| i as u8).collect();
        let raster = Raster::new(2, 2, 5, samples).unwrap();

        PngFileSink::new(&path).write(&raster).unwrap();
        let loaded = FileImageSource.load(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.channels(), 1);
        assert_eq!(loaded.samples(), &[0, 5, 10, 15]);
    }
}
