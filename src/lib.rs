pub mod batch;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod pipeline;
pub mod shapes;

pub use config::SpliceConfig;
pub use error::{Result, SpliceError};
pub use pipeline::{LandmarkProvider, Landmarks, LoadedImage, Pipeline, PtsLandmarks};
