use std::path::PathBuf;

use thiserror::Error;

use crate::host::HostError;

/// A rotation was requested that has no well-defined answer.
///
/// Seeing one of these means the view configuration is malformed, so a run
/// that hits it is aborted rather than retried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("direction ({0}, {1}, {2}) has zero length")]
    ZeroLength(f64, f64, f64),
    #[error("direction ({0}, {1}, {2}) has a non-finite component")]
    NonFinite(f64, f64, f64),
}

/// Invalid input or settings, detected before any capture happens.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("input model `{}` does not exist", .0.display())]
    MissingInput(PathBuf),
    #[error("cannot infer the model format of `{}`; pass `--src-format` explicitly", .0.display())]
    UnknownModelFormat(PathBuf),
    #[error("output path `{}` exists and is not a directory", .0.display())]
    OutputNotDirectory(PathBuf),
    #[error("could not create output directory `{}`: {source}", .path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    InvalidValue { key: String, value: String, reason: String },
}

impl ConfigError {
    pub fn invalid_value(key: &str, value: impl ToString, reason: impl ToString) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors that abort a whole capture run.
///
/// Failures exporting a single view are not in here: those are recorded on the
/// view's `CaptureResult` and the run moves on.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot orient view `{view}`: {source}")]
    Geometry {
        view: String,
        #[source]
        source: GeometryError,
    },
    #[error("could not prepare the camera: {0}")]
    Camera(#[source] HostError),
}
