use anyhow::{anyhow, Result};

use crate::config::find_option;

/// Configuration backed by a TOML document.
///
/// Keys the document does not mention resolve to their defaults.
#[derive(Debug)]
pub struct FileConfig {
    pub root: toml_edit::DocumentMut,
}

impl FileConfig {
    fn source() -> String {
        crate::config_file::config_file()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|_| "config file".to_string())
    }
}

fn value_to_string(value: &toml_edit::Value) -> String {
    match value {
        toml_edit::Value::String(s) => s.value().to_string(),
        other => other.clone().decorated("", "").to_string(),
    }
}

impl crate::config::Config for FileConfig {
    fn get(&self, key: &str) -> Result<String> {
        let (val, _) = self.get_with_source(key)?;
        Ok(val)
    }

    fn get_with_source(&self, key: &str) -> Result<(String, String)> {
        if let Some(value) = self.root.get(key).and_then(|item| item.as_value()) {
            return Ok((value_to_string(value), Self::source()));
        }

        match find_option(key) {
            Some(option) => Ok((option.default_value.to_string(), "default".to_string())),
            None => Err(anyhow!("Key '{key}' not found")),
        }
    }

    fn set(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => {
                // Replacing the item keeps the key and the comments above it.
                self.root[key] = toml_edit::value(value);
            }
            None => {
                self.root.remove(key);
            }
        }
        Ok(())
    }

    fn check_writable(&self, _key: &str) -> Result<()> {
        let path = crate::config_file::config_file()?;
        match std::fs::metadata(&path) {
            Ok(meta) if meta.permissions().readonly() => {
                Err(anyhow!("config file `{}` is read-only", path.display()))
            }
            _ => Ok(()),
        }
    }

    fn write(&self) -> Result<()> {
        let path = crate::config_file::config_file()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, self.root.to_string())?;
        log::debug!("wrote configuration to `{}`", path.display());
        Ok(())
    }

    fn config_to_string(&self) -> Result<String> {
        Ok(self.root.to_string().trim().to_string())
    }
}
