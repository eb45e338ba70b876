use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::{CameraIntrinsics, CameraModel, PolynomialDistortion, TermCriteria};
use crate::error::{ProjectionError, ProjectionResult};
use crate::pose::CameraPose;
use crate::projector::GroundProjector;

/// Camera placement as written in a configuration file.
///
/// Either `height` alone (level camera), or `rotation` with `position`
/// (or with `height`, placing the camera above the world origin).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseConfig {
    /// Height of the camera above the ground
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Row-major camera-to-world rotation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<[[f64; 3]; 3]>,
    /// World position of the optical centre
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 3]>,
}

impl PoseConfig {
    /// Resolve the configuration into a camera pose.
    pub fn to_pose(&self) -> ProjectionResult<CameraPose> {
        match (self.height, self.rotation, self.position) {
            (Some(height), None, None) => Ok(CameraPose::level(height)),
            (None, Some(rotation), Some(position)) => Ok(CameraPose::oriented(rotation, position)),
            (Some(height), Some(rotation), None) => {
                Ok(CameraPose::oriented(rotation, [0.0, 0.0, height]))
            }
            (Some(height), Some(rotation), Some(position)) => {
                if height != position[2] {
                    return Err(ProjectionError::InvalidConfiguration(format!(
                        "pose height {height} disagrees with position z {}",
                        position[2]
                    )));
                }
                Ok(CameraPose::oriented(rotation, position))
            }
            _ => Err(ProjectionError::InvalidConfiguration(
                "pose needs a height, or a rotation with a position or height".to_string(),
            )),
        }
    }
}

impl From<CameraPose> for PoseConfig {
    fn from(pose: CameraPose) -> Self {
        match pose {
            CameraPose::Level { height } => Self {
                height: Some(height),
                ..Default::default()
            },
            CameraPose::Oriented { rotation, position } => Self {
                height: None,
                rotation: Some(rotation),
                position: Some(position),
            },
        }
    }
}

/// Full description of a ground projector.
///
/// ```json
/// {
///   "intrinsics": { "fx": 701.12, "fy": 701.12, "cx": 610.83, "cy": 380.3405 },
///   "distortion": [-0.175609, 0.0273627, 0.000324635, 0.00135292],
///   "pose": { "height": 0.7633 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectorConfig {
    /// Pinhole intrinsics
    pub intrinsics: CameraIntrinsics,
    /// Distortion coefficients in OpenCV order, empty for undistorted images
    #[serde(default)]
    pub distortion: Vec<f64>,
    /// Camera placement
    pub pose: PoseConfig,
    /// Undistortion termination criteria
    #[serde(default)]
    pub undistort: TermCriteria,
}

impl ProjectorConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> ProjectionResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> ProjectionResult<Self> {
        let path = path.as_ref();
        log::debug!("loading projector configuration from {}", path.display());
        let file = std::fs::File::open(path)?;
        Ok(serde_json::from_reader(std::io::BufReader::new(file))?)
    }

    /// Serialize the configuration as pretty-printed JSON.
    pub fn to_json_string(&self) -> ProjectionResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the projector described by this configuration.
    pub fn build(&self) -> ProjectionResult<GroundProjector> {
        let distortion = PolynomialDistortion::from_coefficients(&self.distortion)?;
        let camera = CameraModel::new(self.intrinsics, distortion)?.with_criteria(self.undistort)?;
        GroundProjector::new(camera, self.pose.to_pose()?)
    }
}
