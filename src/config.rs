use std::fmt::Write;

use anyhow::Result;

use crate::{error::ConfigError, types::Background, view_plan::MAX_RANDOM_VIEWS};

/// This trait describes interaction with the configuration for `multiview`.
pub trait Config: Send + Sync {
    /// Returns a value from the configuration by its key.
    fn get(&self, key: &str) -> Result<String>;
    /// Returns a value from the configuration by its key, with the source.
    fn get_with_source(&self, key: &str) -> Result<(String, String)>;
    /// Sets a value in the configuration by its key.
    fn set(&mut self, key: &str, value: Option<&str>) -> Result<()>;

    /// Check if the configuration can be written to.
    fn check_writable(&self, key: &str) -> Result<()>;

    /// Write the configuration.
    fn write(&self) -> Result<()>;

    /// Return the string representation of the config.
    fn config_to_string(&self) -> Result<String>;
}

/// What a setting's value must parse as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// One of the option's allowed values.
    Choice,
    PositiveInteger,
    Integer,
    /// A number of views, up to [`MAX_RANDOM_VIEWS`].
    ViewCount,
    /// A real number greater than one.
    Scale,
    Color,
}

pub struct ConfigOption<'a> {
    pub key: &'a str,
    pub description: &'a str,
    pub comment: &'a str,
    pub default_value: &'a str,
    pub allowed_values: &'a [&'a str],
    pub kind: ValueKind,
}

pub static CONFIG_OPTIONS: &[ConfigOption] = &[
    ConfigOption {
        key: "image_width",
        description: "the width of captured frames in pixels",
        comment: "Width of every captured frame, in pixels.",
        default_value: "1024",
        allowed_values: &[],
        kind: ValueKind::PositiveInteger,
    },
    ConfigOption {
        key: "image_height",
        description: "the height of captured frames in pixels",
        comment: "Height of every captured frame, in pixels.",
        default_value: "768",
        allowed_values: &[],
        kind: ValueKind::PositiveInteger,
    },
    ConfigOption {
        key: "background",
        description: "the fill color behind the model",
        comment: "Fill color behind the model: white, black, transparent or #rrggbb.",
        default_value: "white",
        allowed_values: &[],
        kind: ValueKind::Color,
    },
    ConfigOption {
        key: "distance_scale",
        description: "how far the camera is pulled back before capturing",
        comment: "Factor applied to the initial camera position before the first view. Must be greater than 1.0.",
        default_value: "1.8",
        allowed_values: &[],
        kind: ValueKind::Scale,
    },
    ConfigOption {
        key: "settle_delay_ms",
        description: "the wait after a redraw when the host cannot confirm it",
        comment: "Milliseconds to wait for a redraw when the host gives no completion signal.",
        default_value: "500",
        allowed_values: &[],
        kind: ValueKind::Integer,
    },
    ConfigOption {
        key: "settle_timeout_ms",
        description: "the longest wait for the host to confirm a redraw",
        comment: "Milliseconds to wait for the host to confirm a redraw before capturing anyway.",
        default_value: "2000",
        allowed_values: &[],
        kind: ValueKind::Integer,
    },
    ConfigOption {
        key: "random_views",
        description: "the number of random views after the presets",
        comment: "How many random views to capture after the seven preset views.",
        default_value: "10",
        allowed_values: &[],
        kind: ValueKind::ViewCount,
    },
    ConfigOption {
        key: "image_format",
        description: "the encoding of captured frames",
        comment: "Encoding of captured frames.",
        default_value: "png",
        allowed_values: crate::types::ImageFormat::variants(),
        kind: ValueKind::Choice,
    },
    ConfigOption {
        key: "format",
        description: "the formatting style for command output",
        comment: "What formatting multiview should use when printing text.",
        default_value: "table",
        allowed_values: crate::types::FormatOutput::variants(),
        kind: ValueKind::Choice,
    },
];

pub fn find_option(target_key: &str) -> Option<&'static ConfigOption<'static>> {
    CONFIG_OPTIONS.iter().find(|option| option.key == target_key)
}

pub fn validate_key(target_key: &str) -> Result<()> {
    match find_option(target_key) {
        Some(_) => Ok(()),
        None => Err(ConfigError::InvalidKey(target_key.to_string()).into()),
    }
}

pub fn validate_value(target_key: &str, value: &str) -> Result<()> {
    let option = find_option(target_key).ok_or_else(|| ConfigError::InvalidKey(target_key.to_string()))?;

    let reason = match option.kind {
        ValueKind::Choice if !option.allowed_values.contains(&value) => {
            Some(format!("valid values: {:?}", option.allowed_values))
        }
        ValueKind::Choice => None,
        ValueKind::PositiveInteger => match value.parse::<u32>() {
            Ok(0) => Some("must be positive".to_string()),
            Ok(_) => None,
            Err(err) => Some(err.to_string()),
        },
        ValueKind::Integer => value.parse::<u64>().err().map(|err| err.to_string()),
        ValueKind::ViewCount => match value.parse::<usize>() {
            Ok(count) if count > MAX_RANDOM_VIEWS => Some(format!("must be at most {MAX_RANDOM_VIEWS}")),
            Ok(_) => None,
            Err(err) => Some(err.to_string()),
        },
        ValueKind::Scale => match value.parse::<f64>() {
            Ok(scale) if scale.is_finite() && scale > 1.0 => None,
            Ok(_) => Some("must be greater than 1.0".to_string()),
            Err(err) => Some(err.to_string()),
        },
        ValueKind::Color => value.parse::<Background>().err().map(|err| err.to_string()),
    };

    match reason {
        Some(reason) => Err(ConfigError::invalid_value(target_key, value, reason).into()),
        None => Ok(()),
    }
}

/// Parse the value of `key` the way the render command uses it.
pub fn parse_value<T>(key: &str, value: &str, source: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|err| ConfigError::invalid_value(key, value, format!("{err} (from {source})")))
}

pub fn new_config(root: toml_edit::DocumentMut) -> crate::config_from_file::FileConfig {
    crate::config_from_file::FileConfig { root }
}

pub fn new_blank_root() -> Result<toml_edit::DocumentMut> {
    let mut s = String::new();
    for option in CONFIG_OPTIONS {
        writeln!(s, "# {}", option.comment)?;
        if !option.allowed_values.is_empty() {
            writeln!(s, "# Supported values: {}", option.allowed_values.join(", "))?;
        }
        writeln!(s, "{} = \"{}\"\n", option.key, option.default_value)?;
    }

    Ok(s.parse::<toml_edit::DocumentMut>()?)
}

#[cfg(test)]
pub fn new_from_string(s: &str) -> Result<impl Config> {
    let root = s.parse::<toml_edit::DocumentMut>()?;
    Ok(new_config(root))
}

#[cfg(test)]
pub fn new_blank_config() -> Result<impl Config> {
    let root = new_blank_root()?;
    Ok(new_config(root))
}
