use thiserror::Error;

#[derive(Debug, Error)]
pub enum MosaicError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Invalid canvas dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("Document has no layers to import")]
    EmptyDocument,
    #[error(
        "Atlas would exceed the maximum size {max_width}x{max_height} ({placed}/{total} layers placed)"
    )]
    AtlasOverflow {
        max_width: u32,
        max_height: u32,
        placed: usize,
        total: usize,
    },
}

pub type Result<T> = std::result::Result<T, MosaicError>;
