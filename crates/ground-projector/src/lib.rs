#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Ground projector
//!
//! Maps image pixels to metric coordinates on a flat ground plane, given the
//! camera intrinsics, optional Brown-Conrady lens distortion and the camera
//! height (optionally with a full camera-to-world orientation).
//!
//! ## Example
//!
//! ```rust
//! use ground_projector::{GroundProjector, ProjectionError};
//!
//! let projector = GroundProjector::from_parameters(
//!     701.12, 701.12, 610.83, 380.34, &[], 0.7633,
//! )?;
//!
//! // a pixel below the horizon lands in front of the camera
//! let point = projector.project([610.83, 600.0])?;
//! assert!(point.y > 0.0);
//!
//! // the principal point looks at the horizon
//! assert!(matches!(
//!     projector.project([610.83, 380.34]),
//!     Err(ProjectionError::NoIntersection { .. })
//! ));
//! # Ok::<(), ProjectionError>(())
//! ```

/// Pinhole camera model and lens distortion.
pub mod camera;

/// Serializable projector configuration.
pub mod config;

/// Error types for the projector.
pub mod error;

/// Camera placement relative to the ground plane.
pub mod pose;

/// Pixel to ground-plane projection.
pub mod projector;

pub use camera::{
    CameraIntrinsics, CameraModel, PolynomialDistortion, TermCriteria, UNDISTORT_RESIDUAL_TOL,
};
pub use config::{PoseConfig, ProjectorConfig};
pub use error::{ProjectionError, ProjectionResult};
pub use pose::CameraPose;
pub use projector::{GroundPoint, GroundProjector, PARALLEL_TOLERANCE};
