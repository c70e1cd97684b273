#![warn(unused_extern_crates)]
use anyhow::Result;
use clap::Parser;
use facesplice::batch::{self, BatchConfig};
use facesplice::config::{COLOR_CORRECT_BLUR_FRAC, FEATHER_AMOUNT, SCALE_FACTOR};
use facesplice::descriptor::PASTE_SPLICE;
use facesplice::{Pipeline, PtsLandmarks, SpliceConfig};
use num_cpus::get as get_cpu_count;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Splice donor faces into the faces of recipient images.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CmdArgs {
    /// Directory of donor face images
    #[arg(short, long, value_name = "DIR", default_value = batch::DONOR_DIR)]
    donor: PathBuf,

    /// Directory of images to splice faces into
    #[arg(short, long, value_name = "DIR", default_value = batch::RECIPIENT_DIR)]
    recipient: PathBuf,

    /// Existing directory the spliced images are written to
    #[arg(short, long, value_name = "DIR", default_value = batch::OUTPUT_DIR)]
    output: PathBuf,

    /// Directory of `.pts` landmark files. Defaults to alongside each image
    #[arg(long, value_name = "DIR")]
    landmarks: Option<PathBuf>,

    /// File listing the pairs that failed
    #[arg(long, value_name = "FILE", default_value = batch::LOG_FILE)]
    log_file: PathBuf,

    /// Odd blur kernel used to feather the face mask
    #[arg(long, default_value_t = FEATHER_AMOUNT)]
    feather: u32,

    /// Colour correction blur as a fraction of the distance between the eyes
    #[arg(long, default_value_t = COLOR_CORRECT_BLUR_FRAC)]
    color_blur_fraction: f64,

    /// Rescale images by this factor when loading them
    #[arg(long, default_value_t = SCALE_FACTOR)]
    scale_factor: f32,

    /// Max worker threads. Defaults to the number of CPUs
    #[arg(short, long)]
    max_threads: Option<usize>,

    /// Print the operation descriptor and exit
    #[arg(long)]
    describe: bool,
}

fn main() -> ExitCode {
    let filter = EnvFilter::from_default_env();
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(filter)
        .init();

    let args = CmdArgs::parse();

    if args.describe {
        println!("{PASTE_SPLICE}");
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            error!("{e:?}");
            ExitCode::from(1)
        }
    }
}

/// Runs the batch, returning whether every pair was spliced.
fn run(args: CmdArgs) -> Result<bool> {
    let config = SpliceConfig {
        feather: args.feather,
        color_blur_fraction: args.color_blur_fraction,
        scale_factor: args.scale_factor,
    };
    let provider = PtsLandmarks::new(args.landmarks).with_scale(config.scale_factor as f64);
    let pipeline = Arc::new(Pipeline::new(Box::new(provider), config)?);

    let total_threads = get_cpu_count();
    let threads = args.max_threads.unwrap_or(total_threads).min(total_threads);

    let batch_config = BatchConfig {
        donor_dir: args.donor,
        recipient_dir: args.recipient,
        output_dir: args.output,
        log_file: args.log_file,
        threads,
    };
    let report = batch::run(pipeline, &batch_config)?;

    if !report.is_success() {
        warn!(
            "{} of {} pairs failed, see {:?}",
            report.failed.len(),
            report.total(),
            batch_config.log_file
        );
    } else {
        info!("All {} pairs spliced", report.total());
    }

    Ok(report.is_success())
}
