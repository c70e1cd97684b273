use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpliceError {
    #[error("no face detected in {}", path.display())]
    NoFaceDetected { path: PathBuf },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image error at {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("malformed landmarks in {} (line {line}): {reason}", path.display())]
    Landmarks {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("splice did not finish: {0}")]
    Aborted(String),
}

impl SpliceError {
    /// Whether a batch may skip the failing pair and keep going.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            SpliceError::MissingDirectory(_) | SpliceError::InvalidConfig(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SpliceError>;
