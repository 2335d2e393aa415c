use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtlasError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid atlas dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error(
        "'{key}' needs {width}x{height} (including padding/extrude) but bins are only {bin_width}x{bin_height}"
    )]
    OversizedItem {
        key: String,
        width: u32,
        height: u32,
        bin_width: u32,
        bin_height: u32,
    },
    #[error("Nothing to pack")]
    Empty,
    #[error("None of the {failed} input images could be decoded")]
    NoDecodableImages { failed: usize },
    #[error("Encoding error: {0}")]
    Encode(String),
}

impl AtlasError {
    pub(crate) fn unknown(kind: &str, name: &str, known: &[&str]) -> Self {
        AtlasError::Configuration(format!(
            "unknown {kind} '{name}' (expected one of: {})",
            known.join(", ")
        ))
    }
}

pub type Result<T> = std::result::Result<T, AtlasError>;
