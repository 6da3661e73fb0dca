use anyhow::Result;
use thiserror::Error;

use crate::config_file::get_env_var;

/// Layers `MULTIVIEW_<KEY>` environment variables over another configuration.
pub struct EnvConfig<'a> {
    pub config: &'a mut (dyn crate::config::Config + 'a),
}

impl EnvConfig<'_> {
    pub fn inherit_env(config: &mut dyn crate::config::Config) -> EnvConfig<'_> {
        EnvConfig { config }
    }
}

#[derive(Error, Debug)]
pub enum ReadOnlyEnvVarError {
    #[error("read-only value in: {0}")]
    Variable(String),
}

/// The environment variable that overrides `key`, e.g. `MULTIVIEW_IMAGE_WIDTH`.
pub fn env_var_name(key: &str) -> String {
    format!("MULTIVIEW_{}", heck::AsShoutySnakeCase(key))
}

impl crate::config::Config for EnvConfig<'_> {
    fn get(&self, key: &str) -> Result<String> {
        let (val, _) = self.get_with_source(key)?;
        Ok(val)
    }

    fn get_with_source(&self, key: &str) -> Result<(String, String)> {
        let var = env_var_name(key);
        let val = get_env_var(&var);
        if !val.is_empty() {
            return Ok((val, var));
        }

        self.config.get_with_source(key)
    }

    fn set(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        self.config.set(key, value)
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        let var = env_var_name(key);
        if !get_env_var(&var).is_empty() {
            return Err(ReadOnlyEnvVarError::Variable(var).into());
        }

        self.config.check_writable(key)
    }

    fn write(&self) -> Result<()> {
        self.config.write()
    }

    fn config_to_string(&self) -> Result<String> {
        self.config.config_to_string()
    }
}
