//! The boundary between the capture core and the 3D application doing the
//! actual importing and drawing.
//!
//! Everything the core needs from a host is expressed by these traits, and
//! every handle is passed in explicitly. A host adapter for an external CAD
//! application implements them; [`preview`] is the one shipped in-process.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use nalgebra::Point3;
use thiserror::Error;

use crate::{
    orientation::Orientation,
    types::{Background, ImageFormat, ModelFormat},
};

pub mod preview;
mod raster;

/// Something the host could not do.
#[derive(Error, Debug)]
pub enum HostError {
    #[error("{format} import is not supported by this host")]
    UnsupportedFormat { format: ModelFormat },
    #[error("failed to import `{}`: {reason}", .path.display())]
    Import { path: PathBuf, reason: String },
    #[error("the document has nothing to frame")]
    EmptyScene,
    #[error("failed to render frame: {0}")]
    Render(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// What a host reports after flushing its pending redraws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSignal {
    /// The viewport shows the current camera state.
    Rendered,
    /// The host cannot tell when drawing finishes.
    NoSignal,
}

/// Parameters for writing the current frame to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub width: u32,
    pub height: u32,
    pub background: Background,
    pub format: ImageFormat,
}

/// A running host able to open documents.
pub trait HostApplication {
    fn new_document(&mut self, name: &str) -> Result<Box<dyn Document>, HostError>;
}

/// A host document holding the imported model and the view onto it.
pub trait Document {
    fn name(&self) -> &str;

    /// Import a STEP file into this document.
    fn import_step(&mut self, path: &Path) -> Result<(), HostError>;

    /// Import a triangle mesh file into this document.
    fn import_mesh(&mut self, path: &Path) -> Result<(), HostError>;

    fn active_viewport(&mut self) -> &mut dyn Viewport;
}

/// The camera of a viewport. Owned by the host.
pub trait Camera {
    fn position(&self) -> Result<Point3<f64>, HostError>;

    fn set_position(&mut self, position: &Point3<f64>) -> Result<(), HostError>;

    /// Replace the camera rotation.
    fn set_orientation(&mut self, orientation: &Orientation) -> Result<(), HostError>;
}

#[async_trait::async_trait(?Send)]
pub trait Viewport {
    fn active_camera(&mut self) -> &mut dyn Camera;

    /// Zoom and move the camera so the whole model is visible.
    fn fit_all(&mut self) -> Result<(), HostError>;

    /// Switch to the host's own axonometric view.
    fn use_builtin_isometric_view(&mut self) -> Result<(), HostError>;

    /// Flush pending redraws and wait for the viewport to catch up.
    ///
    /// `timeout` is how long the caller will wait. Hosts with a blocking wait of
    /// their own should give up after it; the caller also drops the future once
    /// it passes, so a host may simply never resolve when it has lost track of
    /// a frame.
    async fn flush_and_wait(&mut self, timeout: Duration) -> Result<FrameSignal, HostError>;

    /// Write the current frame to `path`.
    fn export_frame(&mut self, path: &Path, options: &ExportOptions) -> Result<(), HostError>;
}
