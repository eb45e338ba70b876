use glam::{DMat3, DVec3};

use crate::camera::{CameraIntrinsics, CameraModel, PolynomialDistortion};
use crate::error::{ProjectionError, ProjectionResult};
use crate::pose::CameraPose;

/// Rays whose vertical world component is at most this are treated as parallel to the ground.
pub const PARALLEL_TOLERANCE: f64 = 1e-9;

/// A point on the ground plane, in the unit of the camera height.
///
/// For a level camera `x` points right and `y` forward from the foot of the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPoint {
    /// World x coordinate
    pub x: f64,
    /// World y coordinate
    pub y: f64,
}

impl GroundPoint {
    /// Create a ground point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The point as a world coordinate with `z = 0`.
    pub fn to_world(&self) -> [f64; 3] {
        [self.x, self.y, 0.0]
    }

    /// Euclidean distance from the world origin.
    pub fn range(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// Projects image pixels onto the ground plane `z = 0`.
///
/// Immutable after construction; all calls are pure and the projector can be
/// shared between threads.
#[derive(Debug, Clone)]
pub struct GroundProjector {
    camera: CameraModel,
    pose: CameraPose,
    // camera-to-world rotation
    rotation: DMat3,
    center: DVec3,
}

impl GroundProjector {
    /// Create a projector from a camera model and its pose.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::InvalidConfiguration`] for a non-positive height or
    /// an improper rotation.
    pub fn new(camera: CameraModel, pose: CameraPose) -> ProjectionResult<Self> {
        let (rotation, center) = pose.to_world_frame()?;
        log::debug!(
            "ground projector: {:?}, distortion: {}, height: {}",
            camera.intrinsics(),
            camera.has_distortion(),
            pose.height()
        );
        Ok(Self {
            camera,
            pose,
            rotation,
            center,
        })
    }

    /// Create a level-camera projector from raw parameters.
    ///
    /// # Arguments
    ///
    /// * `fx`, `fy` - The focal lengths in pixels
    /// * `cx`, `cy` - The principal point in pixels
    /// * `distortion` - Distortion coefficients in OpenCV order, empty if the images are undistorted
    /// * `height` - Height of the camera above the ground
    pub fn from_parameters(
        fx: f64,
        fy: f64,
        cx: f64,
        cy: f64,
        distortion: &[f64],
        height: f64,
    ) -> ProjectionResult<Self> {
        let camera = CameraModel::new(
            CameraIntrinsics::new(fx, fy, cx, cy),
            PolynomialDistortion::from_coefficients(distortion)?,
        )?;
        Self::new(camera, CameraPose::level(height))
    }

    /// The camera model.
    pub fn camera(&self) -> &CameraModel {
        &self.camera
    }

    /// The camera pose.
    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    /// Project a single pixel onto the ground plane.
    ///
    /// # Errors
    ///
    /// * [`ProjectionError::MalformedInput`] if a coordinate is not finite.
    /// * [`ProjectionError::NoIntersection`] if the ray is parallel to the plane or
    ///   points away from it.
    /// * [`ProjectionError::UndistortFailed`] if the pixel is too far outside the
    ///   calibrated field of view to be undistorted.
    pub fn project(&self, pixel: [f64; 2]) -> ProjectionResult<GroundPoint> {
        check_finite(0, pixel)?;
        self.intersect(pixel)
    }

    /// Project a batch of pixels onto the ground plane.
    ///
    /// The output has the same length and order as the input. Pixels without an
    /// intersection, or that cannot be undistorted, are reported in place and do not
    /// affect the others.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::MalformedInput`] for the first non-finite pixel; nothing
    /// is projected in that case.
    pub fn project_batch(
        &self,
        pixels: &[[f64; 2]],
    ) -> ProjectionResult<Vec<ProjectionResult<GroundPoint>>> {
        for (index, &pixel) in pixels.iter().enumerate() {
            check_finite(index, pixel)?;
        }

        let points = pixels
            .iter()
            .map(|&pixel| self.intersect(pixel))
            .collect::<Vec<_>>();

        log::debug!(
            "projected {} pixels, {} without intersection",
            points.len(),
            points.iter().filter(|p| p.is_err()).count()
        );

        Ok(points)
    }

    /// Ground-sample helper: pixels per metre at an image row.
    ///
    /// # Arguments
    ///
    /// * `row` - The image row, defaults to the principal point row `cy`.
    ///
    /// # Returns
    ///
    /// `1 / (H * tan(atan((row - cy) / fy)))`, or `+inf` when the footprint is zero.
    ///
    /// Assumes a level camera and ignores distortion: for an oriented pose only the
    /// height of the optical centre is used, so the value is a rough estimate at best.
    pub fn ground_sample_distance(&self, row: Option<f64>) -> f64 {
        let CameraIntrinsics { fy, cy, .. } = *self.camera.intrinsics();
        let row = row.unwrap_or(cy);
        let pitch = ((row - cy) / fy).atan();
        let footprint = self.pose.height() * pitch.tan();
        if footprint == 0.0 {
            f64::INFINITY
        } else {
            1.0 / footprint
        }
    }

    /// Project a ground point into the raw image.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::NotVisible`] when the point is at or behind the image plane.
    pub fn ground_to_pixel(&self, point: GroundPoint) -> ProjectionResult<[f64; 2]> {
        let world = DVec3::from_array(point.to_world());
        let in_camera = self.rotation.transpose() * (world - self.center);
        self.camera
            .project_camera_point(in_camera)
            .map(|(u, v)| [u, v])
            .ok_or(ProjectionError::NotVisible {
                x: point.x,
                y: point.y,
            })
    }

    /// Row of the horizon in the undistorted image at column `u` (defaults to `cx`).
    ///
    /// Returns `None` when the horizon does not cross that column, e.g. for a camera
    /// looking straight down.
    pub fn horizon_row(&self, u: Option<f64>) -> Option<f64> {
        let u = u.unwrap_or(self.camera.intrinsics().cx);
        let k_inv = self.camera.inverse_intrinsic_matrix();
        let up = self.rotation.row(2);

        // vertical world component of K⁻¹ [u, v, 1] as a + b v
        let coefficient = |col: usize| {
            up.x * k_inv[0][col] + up.y * k_inv[1][col] + up.z * k_inv[2][col]
        };
        let a = coefficient(0) * u + coefficient(2);
        let b = coefficient(1);
        if b.abs() <= PARALLEL_TOLERANCE {
            return None;
        }
        Some(-a / b)
    }

    fn intersect(&self, pixel: [f64; 2]) -> ProjectionResult<GroundPoint> {
        let [u, v] = pixel;
        let ray = self.rotation * self.camera.back_project(u, v)?;
        if !ray.is_finite() {
            return Err(ProjectionError::UndistortFailed { u, v });
        }

        if ray.z.abs() <= PARALLEL_TOLERANCE {
            return Err(ProjectionError::NoIntersection { u, v });
        }

        let t = -self.center.z / ray.z;
        // the plane is behind the ray: pixel above the horizon
        if t <= 0.0 {
            return Err(ProjectionError::NoIntersection { u, v });
        }

        // z is exactly zero on the plane
        let hit = self.center + t * ray;
        Ok(GroundPoint::new(hit.x, hit.y))
    }
}

fn check_finite(index: usize, [u, v]: [f64; 2]) -> ProjectionResult<()> {
    if u.is_finite() && v.is_finite() {
        Ok(())
    } else {
        Err(ProjectionError::MalformedInput { index, u, v })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn field_projector() -> ProjectionResult<GroundProjector> {
        GroundProjector::from_parameters(701.12, 701.12, 610.83, 380.34, &[], 0.7633)
    }

    #[test]
    fn test_principal_point_is_horizon() -> ProjectionResult<()> {
        let projector = field_projector()?;
        assert!(matches!(
            projector.project([610.83, 380.34]),
            Err(ProjectionError::NoIntersection { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_level_camera_closed_form() -> ProjectionResult<()> {
        let projector = field_projector()?;
        let (u, v) = (657.0, 563.0);
        let point = projector.project([u, v])?;

        // t = H / dy, ground = (t dx, t)
        let dx = (u - 610.83) / 701.12;
        let dy = (v - 380.34) / 701.12;
        let t = 0.7633 / dy;
        assert_relative_eq!(point.x, t * dx, epsilon = 1e-9);
        assert_relative_eq!(point.y, t, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_near_rows_are_closer() -> ProjectionResult<()> {
        let projector = field_projector()?;
        let near = projector.project([610.83, 600.0])?;
        let far = projector.project([610.83, 500.0])?;
        assert!(near.y.is_finite() && far.y.is_finite());
        assert!(near.y < far.y);
        assert_relative_eq!(near.y, 2.4363, epsilon = 1e-3);
        assert_relative_eq!(far.y, 4.4724, epsilon = 1e-3);
        Ok(())
    }

    #[test]
    fn test_above_horizon_has_no_intersection() -> ProjectionResult<()> {
        let projector = field_projector()?;
        assert!(matches!(
            projector.project([610.83, 100.0]),
            Err(ProjectionError::NoIntersection { u, v }) if u == 610.83 && v == 100.0
        ));
        Ok(())
    }

    #[test]
    fn test_malformed_input() -> ProjectionResult<()> {
        let projector = field_projector()?;
        assert!(matches!(
            projector.project([f64::NAN, 500.0]),
            Err(ProjectionError::MalformedInput { index: 0, .. })
        ));
        assert!(matches!(
            projector.project_batch(&[[600.0, 500.0], [600.0, f64::INFINITY]]),
            Err(ProjectionError::MalformedInput { index: 1, .. })
        ));
        Ok(())
    }

    #[test]
    fn test_ground_sample_distance() -> ProjectionResult<()> {
        let projector = field_projector()?;
        assert_eq!(projector.ground_sample_distance(None), f64::INFINITY);
        assert_eq!(projector.ground_sample_distance(Some(380.34)), f64::INFINITY);

        // 45 degrees below the optical axis
        let gsd = projector.ground_sample_distance(Some(380.34 + 701.12));
        assert_relative_eq!(gsd, 1.0 / 0.7633, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn test_horizon_row() -> ProjectionResult<()> {
        let projector = field_projector()?;
        assert_relative_eq!(
            projector.horizon_row(None).unwrap_or(f64::NAN),
            380.34,
            epsilon = 1e-9
        );

        // looking straight down: optical axis along world -z
        let nadir = [[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]];
        let camera = CameraModel::pinhole(CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0))?;
        let projector = GroundProjector::new(camera, CameraPose::oriented(nadir, [0.0, 0.0, 2.0]))?;
        assert_eq!(projector.horizon_row(None), None);
        Ok(())
    }

    #[test]
    fn test_nadir_camera() -> ProjectionResult<()> {
        let nadir = [[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]];
        let camera = CameraModel::pinhole(CameraIntrinsics::new(500.0, 500.0, 320.0, 240.0))?;
        let projector =
            GroundProjector::new(camera, CameraPose::oriented(nadir, [1.0, 2.0, 2.0]))?;

        // the principal point sits right under the camera
        let below = projector.project([320.0, 240.0])?;
        assert_relative_eq!(below.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(below.y, 2.0, epsilon = 1e-12);

        // image right is world +x, image down is world -y
        let offset = projector.project([370.0, 290.0])?;
        assert_relative_eq!(offset.x, 1.2, epsilon = 1e-12);
        assert_relative_eq!(offset.y, 1.8, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_ground_point_range() {
        let point = GroundPoint::new(3.0, 4.0);
        assert_eq!(point.range(), 5.0);
        assert_eq!(point.to_world(), [3.0, 4.0, 0.0]);
    }

    #[test]
    fn test_far_distorted_pixels_are_rejected() -> ProjectionResult<()> {
        let projector = GroundProjector::from_parameters(
            701.12,
            701.12,
            610.83,
            380.3405,
            &[-0.175609, 0.0273627, 0.000324635, 0.00135292],
            0.7633,
        )?;
        for pixel in [[3000.0, 2000.0], [-1500.0, 1500.0], [2500.0, 900.0]] {
            assert!(matches!(
                projector.project(pixel),
                Err(ProjectionError::UndistortFailed { .. })
            ));
        }
        Ok(())
    }

    #[test]
    fn test_ground_to_pixel_not_visible() -> ProjectionResult<()> {
        let projector = field_projector()?;
        assert!(matches!(
            projector.ground_to_pixel(GroundPoint::new(0.5, -2.0)),
            Err(ProjectionError::NotVisible { .. })
        ));
        Ok(())
    }
}
