//! Bringing a model file into a host document.
//!
//! The format only decides which host import is called. Everything after the
//! import is shared.

use std::path::Path;

use crate::{
    error::ConfigError,
    host::{Document, HostError},
    types::ModelFormat,
};

pub trait ModelLoader {
    fn format(&self) -> ModelFormat;

    fn load(&self, path: &Path, document: &mut dyn Document) -> Result<(), HostError>;
}

/// Loads STEP B-rep models.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepLoader;

impl ModelLoader for StepLoader {
    fn format(&self) -> ModelFormat {
        ModelFormat::Step
    }

    fn load(&self, path: &Path, document: &mut dyn Document) -> Result<(), HostError> {
        document.import_step(path)
    }
}

/// Loads triangle meshes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshLoader;

impl ModelLoader for MeshLoader {
    fn format(&self) -> ModelFormat {
        ModelFormat::Mesh
    }

    fn load(&self, path: &Path, document: &mut dyn Document) -> Result<(), HostError> {
        document.import_mesh(path)
    }
}

pub fn loader_for(format: ModelFormat) -> Box<dyn ModelLoader> {
    match format {
        ModelFormat::Step => Box::new(StepLoader),
        ModelFormat::Mesh => Box::new(MeshLoader),
    }
}

/// Work out the model format from the file extension.
pub fn detect_format(path: &Path) -> Result<ModelFormat, ConfigError> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ModelFormat::from_extension)
        .ok_or_else(|| ConfigError::UnknownModelFormat(path.to_path_buf()))
}

/// Name of the host document a model is imported into, e.g. `Violin_step_render`.
pub fn document_name(path: &Path, format: ModelFormat) -> String {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "model".to_string());
    format!("{stem}_{format}_render")
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::host::Viewport;

    #[derive(Default)]
    struct ImportLog {
        imports: Vec<(ModelFormat, PathBuf)>,
    }

    impl Document for ImportLog {
        fn name(&self) -> &str {
            "log"
        }

        fn import_step(&mut self, path: &Path) -> Result<(), HostError> {
            self.imports.push((ModelFormat::Step, path.to_path_buf()));
            Ok(())
        }

        fn import_mesh(&mut self, path: &Path) -> Result<(), HostError> {
            self.imports.push((ModelFormat::Mesh, path.to_path_buf()));
            Ok(())
        }

        fn active_viewport(&mut self) -> &mut dyn Viewport {
            unimplemented!("loaders never touch the viewport")
        }
    }

    #[test]
    fn test_loaders_call_matching_import() {
        let mut document = ImportLog::default();
        for (format, file) in [(ModelFormat::Step, "a.step"), (ModelFormat::Mesh, "b.stl")] {
            let loader = loader_for(format);
            assert_eq!(loader.format(), format);
            loader.load(Path::new(file), &mut document).unwrap();
        }
        assert_eq!(
            document.imports,
            vec![
                (ModelFormat::Step, PathBuf::from("a.step")),
                (ModelFormat::Mesh, PathBuf::from("b.stl")),
            ]
        );
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(Path::new("models/Violin.STP")).unwrap(), ModelFormat::Step);
        assert_eq!(detect_format(Path::new("Flywheel.stl")).unwrap(), ModelFormat::Mesh);
        assert!(matches!(
            detect_format(Path::new("README")),
            Err(ConfigError::UnknownModelFormat(_))
        ));
        assert!(detect_format(Path::new("part.obj")).is_err());
    }

    #[test]
    fn test_document_name() {
        assert_eq!(
            document_name(Path::new("data/inputs/Violin.step"), ModelFormat::Step),
            "Violin_step_render"
        );
        assert_eq!(
            document_name(Path::new("Flywheel.stl"), ModelFormat::Mesh),
            "Flywheel_mesh_render"
        );
    }
}
