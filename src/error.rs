use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Every pixel of the image was fully transparent, or the image had no pixels at all.
    #[error("image has no visible pixels")]
    EmptyImage,

    /// The requested number of palette boxes was zero.
    #[error("invalid target box count {0}, at least 1 is required")]
    InvalidTarget(usize),

    /// The histogram channel precision was outside 1..=8 bits.
    #[error("invalid channel precision of {0} bits, must be between 1 and 8")]
    InvalidPrecision(u8),

    #[error("failed to load image {}", path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write swatch strip {}", path.display())]
    SwatchWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
