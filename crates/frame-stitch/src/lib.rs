#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Horizontal concatenation of frames.
pub mod compose;

/// Error types for stitching.
pub mod error;

/// Ordered image sets on disk.
pub mod image_set;

/// Frame sequence stitching.
pub mod stitcher;

pub use compose::compose_row;
pub use error::StitchError;
pub use image_set::ImageSet;
pub use stitcher::{StitchConfig, Stitcher};
