use parse_display::{Display, FromStr};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, FromStr, Display, clap::ValueEnum)]
#[display(style = "kebab-case")]
#[derive(Default)]
pub enum FormatOutput {
    Json,
    Yaml,
    #[default]
    Table,
}

impl FormatOutput {
    pub const fn variants() -> &'static [&'static str] {
        &["table", "json", "yaml"]
    }
}

/// Encoding of the captured frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromStr, Display, clap::ValueEnum)]
#[display(style = "kebab-case")]
#[derive(Default)]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    pub const fn variants() -> &'static [&'static str] {
        &["png", "jpeg"]
    }

    /// The file extension used for captured frames.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
        }
    }
}

/// How a model file is brought into a host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromStr, Display, clap::ValueEnum)]
#[display(style = "kebab-case")]
pub enum ModelFormat {
    /// STEP B-rep files (`.step`, `.stp`).
    Step,
    /// Triangle meshes (`.stl`).
    Mesh,
}

impl ModelFormat {
    /// Guess the format from a file extension.
    pub fn from_extension(ext: &str) -> Option<ModelFormat> {
        match ext.to_ascii_lowercase().as_str() {
            "step" | "stp" => Some(ModelFormat::Step),
            "stl" => Some(ModelFormat::Mesh),
            _ => None,
        }
    }
}

/// Fill color behind the model in captured frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Background {
    #[default]
    White,
    Black,
    Transparent,
    Rgb(u8, u8, u8),
}

impl Background {
    pub fn to_rgba(self) -> [u8; 4] {
        match self {
            Background::White => [255, 255, 255, 255],
            Background::Black => [0, 0, 0, 255],
            Background::Transparent => [255, 255, 255, 0],
            Background::Rgb(r, g, b) => [r, g, b, 255],
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("`{0}` is not a background color; use white, black, transparent or #rrggbb")]
pub struct ParseBackgroundError(String);

impl std::str::FromStr for Background {
    type Err = ParseBackgroundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseBackgroundError(s.to_string());
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Ok(Background::White),
            "black" => Ok(Background::Black),
            "transparent" => Ok(Background::Transparent),
            hex => {
                let hex = hex.strip_prefix('#').ok_or_else(err)?;
                if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(err());
                }
                let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| err());
                Ok(Background::Rgb(channel(0)?, channel(2)?, channel(4)?))
            }
        }
    }
}

impl std::fmt::Display for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Background::White => write!(f, "white"),
            Background::Black => write!(f, "black"),
            Background::Transparent => write!(f, "transparent"),
            Background::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
        }
    }
}
