use std::path::PathBuf;

/// An error type for the stitching module.
#[derive(thiserror::Error, Debug)]
pub enum StitchError {
    /// Error reading a directory or writing an output file.
    #[error("Failed to access {0}")]
    Io(PathBuf, #[source] std::io::Error),

    /// Error decoding or encoding an image.
    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// The directory contains no image with the requested extension.
    #[error("No .{1} images found in {0}")]
    EmptySet(PathBuf, String),

    /// A frame does not match the size of the first frame of the sequence.
    #[error("Frame {0} is {1}x{2}, expected {3}x{4}")]
    SizeMismatch(PathBuf, u32, u32, u32, u32),
}
