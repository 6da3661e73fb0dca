use std::io::{IsTerminal, Write};

use anyhow::Result;

use crate::{colors::ColorScheme, types::FormatOutput};

pub struct IoStreams {
    pub out: Box<dyn Write + Send + Sync>,
    pub err_out: Box<dyn Write + Send + Sync>,

    color_enabled: bool,
    stdout_tty: bool,
    stderr_tty: bool,
}

impl IoStreams {
    pub fn system() -> Self {
        let stdout_tty = std::io::stdout().is_terminal();
        let stderr_tty = std::io::stderr().is_terminal();

        IoStreams {
            out: Box::new(std::io::stdout()),
            err_out: Box::new(std::io::stderr()),
            color_enabled: env_color_enabled(stdout_tty),
            stdout_tty,
            stderr_tty,
        }
    }

    /// Streams backed by temporary files, returned alongside their paths.
    #[cfg(test)]
    pub fn test() -> (Self, std::path::PathBuf, std::path::PathBuf) {
        let (stdout, stdout_path) = tempfile::NamedTempFile::new().unwrap().keep().unwrap();
        let (stderr, stderr_path) = tempfile::NamedTempFile::new().unwrap().keep().unwrap();

        let io = IoStreams {
            out: Box::new(stdout),
            err_out: Box::new(stderr),
            color_enabled: false,
            stdout_tty: false,
            stderr_tty: false,
        };
        (io, stdout_path, stderr_path)
    }

    pub fn is_stderr_tty(&self) -> bool {
        self.stderr_tty
    }

    pub fn color_scheme(&self) -> ColorScheme {
        ColorScheme::new(self.color_enabled)
    }

    /// Print every item of `values` as a table row, or all of them as a JSON or YAML list.
    pub fn write_output_for_vec<T>(&mut self, format: &FormatOutput, values: &[T]) -> Result<()>
    where
        T: serde::Serialize + tabled::Tabled,
    {
        match format {
            FormatOutput::Table => {
                let mut table = tabled::Table::new(values);
                table.with(tabled::settings::Style::sharp());
                writeln!(self.out, "{table}")?;
            }
            FormatOutput::Json => {
                let value = serde_json::to_value(values)?;
                let json = if self.color_enabled && self.stdout_tty {
                    colored_json::to_colored_json(&value, colored_json::ColorMode::On)?
                } else {
                    serde_json::to_string_pretty(&value)?
                };
                writeln!(self.out, "{json}")?;
            }
            FormatOutput::Yaml => write!(self.out, "{}", serde_yaml::to_string(values)?)?,
        }
        Ok(())
    }
}

/// Color is on for terminals unless `NO_COLOR` is set or `CLICOLOR` is "0".
/// `CLICOLOR_FORCE` turns it on regardless.
fn env_color_enabled(is_tty: bool) -> bool {
    let force = crate::config_file::get_env_var("CLICOLOR_FORCE");
    if !force.is_empty() && force != "0" {
        return true;
    }
    if !crate::config_file::get_env_var("NO_COLOR").is_empty() {
        return false;
    }
    crate::config_file::get_env_var("CLICOLOR") != "0" && is_tty
}
