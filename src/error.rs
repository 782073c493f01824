use crate::backend::Backend;

/// Errors surfaced at the invocation boundary of the pipeline.
///
/// Degenerate results (an empty segmentation, zero surviving contours) are not
/// represented here: they flow through to an all-background output raster.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The input image could not be read or decoded.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// The decoder succeeded but produced no pixels.
    #[error("decoded image is empty")]
    EmptyImage,

    /// Sample buffer length does not match `width * height * channels`.
    #[error(
        "invalid raster: {width}x{height}x{channels} needs {expected} samples, got {actual}"
    )]
    InvalidRaster {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        actual: usize,
    },

    /// The selected backend was not compiled into this build.
    #[error("{0} backend unavailable")]
    BackendUnavailable(Backend),

    /// The backend failed while processing; no output was produced.
    #[error("backend internal error: {0}")]
    BackendInternal(String),

    /// Writing the result raster failed.
    #[error("failed to write result: {0}")]
    Write(#[source] image::ImageError),
}

impl PipelineError {
    /// Process exit code used by the batch CLI for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Decode(_) | PipelineError::EmptyImage => 2,
            PipelineError::BackendUnavailable(_) => 4,
            PipelineError::InvalidRaster { .. }
            | PipelineError::BackendInternal(_)
            | PipelineError::Write(_) => 5,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_failure_class() {
        assert_eq!(PipelineError::EmptyImage.exit_code(), 2);
        assert_eq!(
            PipelineError::BackendUnavailable(Backend::Simple).exit_code(),
            4
        );
        assert_eq!(
            PipelineError::BackendInternal("boom".to_string()).exit_code(),
            5
        );
    }

    #[test]
    fn messages_carry_diagnostics() {
        let err = PipelineError::BackendInternal("index out of bounds".to_string());
        assert_eq!(err.to_string(), "backend internal error: index out of bounds");

        let err = PipelineError::BackendUnavailable(Backend::RegionBased);
        assert_eq!(err.to_string(), "region backend unavailable");
    }
}
