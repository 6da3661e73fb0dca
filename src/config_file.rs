use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::config_from_file::FileConfig;

const CONFIG_DIR_ENV: &str = "MULTIVIEW_CONFIG_DIR";

/// Returns the value of the environment variable, or an empty string when unset.
pub fn get_env_var(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}

/// The directory holding `config.toml`.
///
/// `MULTIVIEW_CONFIG_DIR` wins, then the platform config directory
/// (`$XDG_CONFIG_HOME/multiview` or `~/.config/multiview` on Linux).
pub fn config_dir() -> Result<PathBuf> {
    let dir = get_env_var(CONFIG_DIR_ENV);
    if !dir.is_empty() {
        return Ok(PathBuf::from(dir));
    }

    dirs::config_dir()
        .map(|dir| dir.join("multiview"))
        .ok_or_else(|| anyhow!("could not find a configuration directory; set {CONFIG_DIR_ENV}"))
}

pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn parse_default_config() -> Result<FileConfig> {
    parse_config(&config_file()?)
}

/// Load the configuration at `path`, or a blank one with every default when
/// the file does not exist yet.
pub fn parse_config(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(crate::config::new_config(crate::config::new_blank_root()?));
    }

    let contents = std::fs::read_to_string(path).with_context(|| format!("reading `{}`", path.display()))?;
    let root = contents
        .parse::<toml_edit::DocumentMut>()
        .with_context(|| format!("parsing `{}`", path.display()))?;
    Ok(crate::config::new_config(root))
}
