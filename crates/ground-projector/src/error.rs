use thiserror::Error;

/// Error types for ground projection.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// The camera description cannot produce a valid projector
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The ray through the pixel never reaches the ground plane in front of the camera
    #[error("Ray through pixel ({u}, {v}) does not intersect the ground plane")]
    NoIntersection {
        /// Horizontal pixel coordinate
        u: f64,
        /// Vertical pixel coordinate
        v: f64,
    },

    /// The iterative undistortion of the pixel diverged
    #[error("Failed to undistort pixel ({u}, {v})")]
    UndistortFailed {
        /// Horizontal pixel coordinate
        u: f64,
        /// Vertical pixel coordinate
        v: f64,
    },

    /// The ground point lies at or behind the image plane
    #[error("Ground point ({x}, {y}) is not visible from the camera")]
    NotVisible {
        /// Ground x coordinate
        x: f64,
        /// Ground y coordinate
        y: f64,
    },

    /// Pixel coordinates must be finite
    #[error("Pixel {index} has non-finite coordinates ({u}, {v})")]
    MalformedInput {
        /// Position of the offending pixel in the input
        index: usize,
        /// Horizontal pixel coordinate
        u: f64,
        /// Vertical pixel coordinate
        v: f64,
    },

    /// Failed to read a configuration file
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse a configuration document
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;
