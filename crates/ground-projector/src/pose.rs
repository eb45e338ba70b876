use glam::{DMat3, DVec3};

use crate::error::{ProjectionError, ProjectionResult};

/// Tolerance used to accept a matrix as a proper rotation.
const ROTATION_TOL: f64 = 1e-6;

/// Camera-to-world rotation of a level camera.
///
/// Camera x (right) maps to world x, camera z (forward) to world y and
/// camera y (down) to world -z.
pub const LEVEL_ROTATION: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, -1.0, 0.0]];

/// Placement of the camera relative to the ground plane `z = 0`.
///
/// World frame: x right, y forward, z up, with the plane at `z = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraPose {
    /// Optical axis parallel to the ground, image rows parallel to the horizon.
    Level {
        /// Height of the optical centre above the plane, in metres
        height: f64,
    },
    /// Arbitrary orientation.
    Oriented {
        /// Row-major rotation mapping camera-frame directions to world-frame directions
        rotation: [[f64; 3]; 3],
        /// World position of the optical centre
        position: [f64; 3],
    },
}

impl CameraPose {
    /// A level camera at the given height.
    pub fn level(height: f64) -> Self {
        Self::Level { height }
    }

    /// A camera with an explicit camera-to-world rotation and optical centre.
    pub fn oriented(rotation: [[f64; 3]; 3], position: [f64; 3]) -> Self {
        Self::Oriented { rotation, position }
    }

    /// Height of the optical centre above the plane.
    pub fn height(&self) -> f64 {
        match self {
            Self::Level { height } => *height,
            Self::Oriented { position, .. } => position[2],
        }
    }

    /// Row-major camera-to-world rotation.
    pub fn rotation(&self) -> [[f64; 3]; 3] {
        match self {
            Self::Level { .. } => LEVEL_ROTATION,
            Self::Oriented { rotation, .. } => *rotation,
        }
    }

    /// World position of the optical centre.
    pub fn position(&self) -> [f64; 3] {
        match self {
            Self::Level { height } => [0.0, 0.0, *height],
            Self::Oriented { position, .. } => *position,
        }
    }

    /// Validate the pose and convert it into glam types.
    pub(crate) fn to_world_frame(self) -> ProjectionResult<(DMat3, DVec3)> {
        let height = self.height();
        if !height.is_finite() || height <= 0.0 {
            return Err(ProjectionError::InvalidConfiguration(format!(
                "camera height must be positive, got {height}"
            )));
        }

        let position = DVec3::from_array(self.position());
        if !position.is_finite() {
            return Err(ProjectionError::InvalidConfiguration(format!(
                "camera position must be finite, got {position}"
            )));
        }

        let rotation = DMat3::from_cols_array_2d(&self.rotation()).transpose();
        if !rotation.is_finite() {
            return Err(ProjectionError::InvalidConfiguration(
                "rotation must be finite".to_string(),
            ));
        }
        let orthonormal = (rotation.transpose() * rotation).abs_diff_eq(DMat3::IDENTITY, ROTATION_TOL);
        let det = rotation.determinant();
        if !orthonormal || (det - 1.0).abs() > ROTATION_TOL {
            return Err(ProjectionError::InvalidConfiguration(format!(
                "rotation must be orthonormal with determinant 1, got determinant {det}"
            )));
        }

        Ok((rotation, position))
    }
}
