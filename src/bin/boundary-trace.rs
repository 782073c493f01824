use std::path::PathBuf;
use std::process::ExitCode;

use boundary_trace::rasterize::draw_overlay;
use boundary_trace::{
    Backend, FileImageSource, ImageSource, Pipeline, PipelineError, PngFileSink, Polarity,
    ProcessingParameters, Raster, RasterSink, RegionPolicy,
};
use clap::Parser;
use flexi_logger::Logger;
use log::{error, info, warn};

/// Extract the outer boundary of the dominant object in an image
#[derive(Parser, Debug)]
#[command(name = "boundary-trace", version)]
#[command(about = "Trace the outer boundary of the dominant object", long_about = None)]
struct Args {
    /// Processing backend: simple (alias opencv) or region (alias halcon)
    #[arg(long)]
    backend: String,

    /// Input image file path
    #[arg(long)]
    input: PathBuf,

    /// Output PNG path
    #[arg(long, default_value = "canny_preview.png")]
    output: PathBuf,

    /// Hysteresis low threshold
    #[arg(long, default_value_t = 70)]
    low: u8,

    /// Hysteresis high threshold
    #[arg(long, default_value_t = 150)]
    high: u8,

    /// Smoothing kernel size; even values are rounded up to the next odd one
    #[arg(long, default_value_t = 5)]
    blur: u32,

    /// Foreground polarity assumed by the region backend
    #[arg(long, value_enum, default_value = "dark")]
    polarity: PolarityArg,

    /// Also write the traced contours drawn in color over the input
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Display the result (not supported by this build)
    #[arg(long)]
    show: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PolarityArg {
    Dark,
    Bright,
}

impl From<PolarityArg> for Polarity {
    fn from(arg: PolarityArg) -> Self {
        match arg {
            PolarityArg::Dark => Polarity::Dark,
            PolarityArg::Bright => Polarity::Bright,
        }
    }
}

const EXIT_USAGE: u8 = 1;
const EXIT_INVALID_BACKEND: u8 = 3;

/// Parses the command line, printing clap's message on failure.
///
/// `--help` and `--version` come back as `Err(0)`, usage errors as
/// `Err(EXIT_USAGE)`.
fn parse_args<I, T>(argv: I) -> Result<Args, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Args::try_parse_from(argv).map_err(|e| {
        let _ = e.print();
        if e.use_stderr() { EXIT_USAGE } else { 0 }
    })
}

fn parse_backend(name: &str) -> Result<Backend, u8> {
    name.parse::<Backend>().map_err(|e| {
        error!("{e}");
        EXIT_INVALID_BACKEND
    })
}

fn main() -> ExitCode {
    let args = match parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(code) => return ExitCode::from(code),
    };

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let _logger = match Logger::try_with_env_or_str(level).and_then(|logger| logger.start()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("logger initialization failed: {e}");
            None
        }
    };

    let backend = match parse_backend(&args.backend) {
        Ok(backend) => backend,
        Err(code) => return ExitCode::from(code),
    };

    match run(&args, backend) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(args: &Args, backend: Backend) -> Result<(), PipelineError> {
    let params = ProcessingParameters::new(args.low, args.high, args.blur);
    let policy = RegionPolicy {
        polarity: args.polarity.into(),
        ..RegionPolicy::default()
    };
    let pipeline = Pipeline::new(backend, params).with_policy(policy);
    info!(
        "{backend} backend, thresholds [{}, {}], blur {}",
        params.low_threshold,
        params.high_threshold,
        params.blur_kernel.get()
    );

    let sink = PngFileSink::new(&args.output);
    match &args.overlay {
        None => {
            pipeline.run_file(&FileImageSource, &args.input, &sink)?;
        }
        Some(overlay_path) => {
            if !backend.is_available() {
                return Err(PipelineError::BackendUnavailable(backend));
            }
            let raster = FileImageSource.load(&args.input)?;
            let outcome = pipeline.trace(&raster)?;
            let overlay = draw_overlay(&outcome.intensity, &outcome.contours);
            sink.write(&Raster::from_gray(outcome.output))?;
            overlay.save(overlay_path).map_err(PipelineError::Write)?;
            info!("wrote overlay {}", overlay_path.display());
        }
    }

    if args.show {
        warn!(
            "--show ignored: no display support, open {} instead",
            args.output.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_is_a_usage_error() {
        let code = parse_args(["boundary-trace", "--backend", "region"]).unwrap_err();
        assert_eq!(code, EXIT_USAGE);
    }

    #[test]
    fn help_exits_cleanly() {
        assert_eq!(parse_args(["boundary-trace", "--help"]).unwrap_err(), 0);
    }

    #[test]
    fn unknown_polarity_is_a_usage_error() {
        let argv = [
            "boundary-trace",
            "--backend",
            "region",
            "--input",
            "part.png",
            "--polarity",
            "grey",
        ];
        assert_eq!(parse_args(argv).unwrap_err(), EXIT_USAGE);
    }

    #[test]
    fn defaults_fill_optional_flags() {
        let args = parse_args(["boundary-trace", "--backend", "sobel", "--input", "part.png"])
            .unwrap();
        assert_eq!(args.backend, "sobel");
        assert_eq!(args.output, PathBuf::from("canny_preview.png"));
        assert_eq!((args.low, args.high, args.blur), (70, 150, 5));
        assert!(matches!(args.polarity, PolarityArg::Dark));
        assert!(args.overlay.is_none());
        assert!(!args.show);
    }

    #[test]
    fn unknown_backend_exits_with_three() {
        assert_eq!(parse_backend("sobel").unwrap_err(), 3);
        assert_eq!(parse_backend("").unwrap_err(), EXIT_INVALID_BACKEND);
    }

    #[test]
    fn backend_aliases_resolve() {
        assert_eq!(parse_backend("opencv"), Ok(Backend::Simple));
        assert_eq!(parse_backend(" HALCON "), Ok(Backend::RegionBased));
    }
}
