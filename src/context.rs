use std::str::FromStr;

use anyhow::Result;

use crate::{config::Config, types::FormatOutput};

pub struct Context<'a> {
    pub config: &'a mut (dyn Config + Send + Sync + 'a),
    pub io: crate::iostreams::IoStreams,
    pub debug: bool,
}

impl Context<'_> {
    pub fn new(config: &mut (dyn Config + Send + Sync)) -> Context {
        Context {
            config,
            io: crate::iostreams::IoStreams::system(),
            debug: false,
        }
    }

    /// Return the configured output format or override the default with the value passed in,
    /// if it is some.
    pub fn format(&self, format: &Option<FormatOutput>) -> Result<FormatOutput> {
        if let Some(format) = format {
            Ok(format.clone())
        } else {
            let value = self.config.get("format")?;
            Ok(FormatOutput::from_str(&value).unwrap_or_default())
        }
    }

    /// The value of a setting: the flag when given, otherwise the configured
    /// value (environment, config file, then default).
    pub fn setting<T>(&self, flag: Option<T>, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        if let Some(value) = flag {
            return Ok(value);
        }

        let (value, source) = self.config.get_with_source(key)?;
        Ok(crate::config::parse_value(key, &value, &source)?)
    }
}
