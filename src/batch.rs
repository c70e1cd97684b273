use crate::error::{Result, SpliceError};
use crate::pipeline::Pipeline;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tracing::{Level, debug, error, info, span, warn};

pub const DONOR_DIR: &str = "./GAN_Faces";
pub const RECIPIENT_DIR: &str = "./MediFor_Images";
pub const OUTPUT_DIR: &str = "./GAN_MediFor";
pub const LOG_FILE: &str = "./log.txt";

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub donor_dir: PathBuf,
    pub recipient_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Truncated at the start of a run; one line per failed pair.
    pub log_file: PathBuf,
    pub threads: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            donor_dir: DONOR_DIR.into(),
            recipient_dir: RECIPIENT_DIR.into(),
            output_dir: OUTPUT_DIR.into(),
            log_file: LOG_FILE.into(),
            threads: 1,
        }
    }
}

/// One donor/recipient pair and where its splice goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub donor: PathBuf,
    pub recipient: PathBuf,
    pub output: PathBuf,
}

impl Job {
    pub fn name(&self) -> String {
        self.output
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    /// Failed output names with their errors, sorted by name.
    pub failed: Vec<(String, SpliceError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Regular files in `dir`, sorted by name.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(SpliceError::MissingDirectory(dir.to_path_buf()));
    }
    let io_err = |source| SpliceError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if entry.file_type().map_err(io_err)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    Ok(files)
}

/// `<donor>--<recipient>.png`, each name cut at its first dot.
pub fn output_name(donor: &Path, recipient: &Path) -> String {
    format!("{}--{}.png", base_name(donor), base_name(recipient))
}

fn base_name(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.split_once('.') {
        Some((base, _)) if !base.is_empty() => base.to_string(),
        _ => name,
    }
}

/// Every donor paired with every recipient, donors outermost.
pub fn plan(config: &BatchConfig) -> Result<Vec<Job>> {
    let donors = list_images(&config.donor_dir)?;
    let recipients = list_images(&config.recipient_dir)?;
    if !config.output_dir.is_dir() {
        return Err(SpliceError::MissingDirectory(config.output_dir.clone()));
    }

    Ok(donors
        .iter()
        .flat_map(|donor| {
            recipients.iter().map(move |recipient| Job {
                donor: donor.clone(),
                recipient: recipient.clone(),
                output: config.output_dir.join(output_name(donor, recipient)),
            })
        })
        .collect())
}

/// Splices every pair on a pool of worker threads. A failed pair is logged
/// and skipped; only setup problems stop the batch.
pub fn run(pipeline: Arc<Pipeline>, config: &BatchConfig) -> Result<BatchReport> {
    let span = span!(Level::INFO, "batch");
    let _guard = span.enter();

    let jobs = plan(config)?;
    let mut log = File::create(&config.log_file).map_err(|source| SpliceError::Io {
        path: config.log_file.clone(),
        source,
    })?;
    info!("Splicing {} pairs", jobs.len());

    let mut pending: HashMap<PathBuf, Job> = jobs
        .iter()
        .map(|job| (job.output.clone(), job.clone()))
        .collect();

    let (job_tx, job_rx) = flume::unbounded::<Job>();
    let (result_tx, result_rx) = flume::unbounded::<(Job, Result<()>)>();
    let workers = config.threads.clamp(1, jobs.len().max(1));
    for job in jobs {
        // Receivers outlive this loop, so sending cannot fail.
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let pipeline = Arc::clone(&pipeline);
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            thread::spawn(move || {
                for job in jobs.iter() {
                    debug!("worker {worker}: {}", job.name());
                    let result = splice_job(&pipeline, &job);
                    if results.send((job, result)).is_err() {
                        break;
                    }
                }
            })
        })
        .collect();
    drop(result_tx);

    let mut report = BatchReport::default();
    let mut record = |job: Job, result: Result<()>| -> Result<()> {
        match result {
            Ok(()) => {
                info!(
                    "{}, {}, {}",
                    job.donor.display(),
                    job.recipient.display(),
                    job.output.display()
                );
                report.succeeded += 1;
            }
            Err(e) => {
                warn!("{}: {e}", job.name());
                writeln!(log, "Issue with: {}", job.name()).map_err(|source| SpliceError::Io {
                    path: config.log_file.clone(),
                    source,
                })?;
                report.failed.push((job.name(), e));
            }
        }
        Ok(())
    };

    for (job, result) in result_rx.iter() {
        pending.remove(&job.output);
        record(job, result)?;
    }

    for handle in handles {
        if handle.join().is_err() {
            error!("Splice worker panicked");
        }
    }

    let mut lost: Vec<Job> = pending.into_values().collect();
    lost.sort_by(|a, b| a.output.cmp(&b.output));
    for job in lost {
        record(job, Err(SpliceError::Aborted("no result from worker".into())))?;
    }

    report.failed.sort_by(|a, b| a.0.cmp(&b.0));
    info!(
        "{} of {} pairs spliced",
        report.succeeded,
        report.total()
    );
    Ok(report)
}

/// Runs one pair, turning a panic anywhere in the pipeline into an error for
/// that pair alone.
fn splice_job(pipeline: &Pipeline, job: &Job) -> Result<()> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        pipeline.splice(&job.recipient, &job.donor, &job.output)
    }))
    .unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        error!("Splice of {} panicked: {reason}", job.name());
        Err(SpliceError::Aborted(format!("panicked: {reason}")))
    })
}
