//! An in-process host that renders triangle meshes on the CPU.
//!
//! It lets the capture pipeline run end to end without an external CAD
//! application. Frames are drawn synchronously, so a flush always reports a
//! finished frame.

use std::{path::Path, time::Duration};

use log::{debug, info};
use nalgebra::Point3;

use super::{
    raster::{rasterize, Projection},
    Camera, Document, ExportOptions, FrameSignal, HostApplication, HostError, Viewport,
};
use crate::{
    orientation::{camera_forward, isometric_orientation, Orientation},
    types::{ImageFormat, ModelFormat},
};

/// Extra room around the bounding sphere when fitting, as a factor of its diameter.
const FIT_MARGIN: f64 = 1.1;

#[derive(Debug, Default)]
pub struct PreviewHost;

impl HostApplication for PreviewHost {
    fn new_document(&mut self, name: &str) -> Result<Box<dyn Document>, HostError> {
        debug!("creating preview document `{name}`");
        Ok(Box::new(PreviewDocument::new(name)))
    }
}

pub struct PreviewDocument {
    name: String,
    viewport: PreviewViewport,
}

impl PreviewDocument {
    pub fn new(name: &str) -> Self {
        PreviewDocument {
            name: name.to_string(),
            viewport: PreviewViewport::default(),
        }
    }
}

impl Document for PreviewDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn import_step(&mut self, _path: &Path) -> Result<(), HostError> {
        // B-rep tessellation needs a real CAD kernel.
        Err(HostError::UnsupportedFormat {
            format: ModelFormat::Step,
        })
    }

    fn import_mesh(&mut self, path: &Path) -> Result<(), HostError> {
        let triangles = read_stl(path)?;
        info!("imported {} triangles from `{}`", triangles.len(), path.display());
        self.viewport.triangles.extend(triangles);
        Ok(())
    }

    fn active_viewport(&mut self) -> &mut dyn Viewport {
        &mut self.viewport
    }
}

fn read_stl(path: &Path) -> Result<Vec<[Point3<f64>; 3]>, HostError> {
    let mut file = std::fs::File::open(path)?;
    let mesh = stl_io::read_stl(&mut file).map_err(|err| HostError::Import {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;

    Ok(mesh
        .faces
        .iter()
        .map(|face| {
            face.vertices.map(|i| {
                let v = mesh.vertices[i];
                Point3::new(v[0] as f64, v[1] as f64, v[2] as f64)
            })
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewCamera {
    pub position: Point3<f64>,
    pub orientation: Orientation,
    /// See [`Projection::view_size`].
    pub view_size: f64,
}

impl Default for PreviewCamera {
    fn default() -> Self {
        PreviewCamera {
            position: Point3::new(0.0, 0.0, 10.0),
            orientation: Orientation::identity(),
            view_size: 10.0,
        }
    }
}

impl Camera for PreviewCamera {
    fn position(&self) -> Result<Point3<f64>, HostError> {
        Ok(self.position)
    }

    fn set_position(&mut self, position: &Point3<f64>) -> Result<(), HostError> {
        self.position = *position;
        Ok(())
    }

    fn set_orientation(&mut self, orientation: &Orientation) -> Result<(), HostError> {
        self.orientation = *orientation;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct PreviewViewport {
    camera: PreviewCamera,
    triangles: Vec<[Point3<f64>; 3]>,
    frames: u64,
}

impl PreviewViewport {
    pub fn camera(&self) -> &PreviewCamera {
        &self.camera
    }

    /// Frames flushed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Center and radius of a sphere enclosing every vertex.
    fn bounding_sphere(&self) -> Option<(Point3<f64>, f64)> {
        let mut points = self.triangles.iter().flatten();
        let first = points.next()?;
        let (min, max) = points.fold((first.coords, first.coords), |(min, max), p| {
            (min.inf(&p.coords), max.sup(&p.coords))
        });
        let center = Point3::from((min + max) / 2.0);
        Some((center, (max - min).norm() / 2.0))
    }
}

#[async_trait::async_trait(?Send)]
impl Viewport for PreviewViewport {
    fn active_camera(&mut self) -> &mut dyn Camera {
        &mut self.camera
    }

    fn fit_all(&mut self) -> Result<(), HostError> {
        let (center, radius) = self.bounding_sphere().ok_or(HostError::EmptyScene)?;

        // Keep the current distance unless it would put the camera inside the model.
        let forward = self.camera.orientation * camera_forward();
        let distance = (self.camera.position - center).norm().max(radius * 2.0);
        self.camera.position = center - forward * distance;
        self.camera.view_size = (radius * 2.0 * FIT_MARGIN).max(f64::EPSILON);
        Ok(())
    }

    fn use_builtin_isometric_view(&mut self) -> Result<(), HostError> {
        self.camera.orientation = isometric_orientation();
        Ok(())
    }

    async fn flush_and_wait(&mut self, _timeout: Duration) -> Result<FrameSignal, HostError> {
        self.frames += 1;
        Ok(FrameSignal::Rendered)
    }

    fn export_frame(&mut self, path: &Path, options: &ExportOptions) -> Result<(), HostError> {
        if options.width == 0 || options.height == 0 {
            return Err(HostError::Render(format!(
                "frame size {}x{} is empty",
                options.width, options.height
            )));
        }

        let projection = Projection {
            position: self.camera.position,
            orientation: self.camera.orientation,
            view_size: self.camera.view_size,
        };
        let frame = rasterize(
            &self.triangles,
            &projection,
            options.width,
            options.height,
            options.background.to_rgba(),
        );

        match options.format {
            ImageFormat::Png => frame.save_with_format(path, image::ImageFormat::Png)?,
            ImageFormat::Jpeg => image::DynamicImage::ImageRgba8(frame)
                .to_rgb8()
                .save_with_format(path, image::ImageFormat::Jpeg)?,
        }
        debug!("wrote frame to `{}`", path.display());
        Ok(())
    }
}
