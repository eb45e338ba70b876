use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, ProjectionResult};

/// Represents the intrinsic parameters of a pinhole camera.
///
/// # Fields
///
/// * `fx` - The focal length in the x direction, in pixels
/// * `fy` - The focal length in the y direction, in pixels
/// * `cx` - The x coordinate of the principal point
/// * `cy` - The y coordinate of the principal point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    /// The focal length in the x direction
    pub fx: f64,
    /// The focal length in the y direction
    pub fy: f64,
    /// The x coordinate of the principal point
    pub cx: f64,
    /// The y coordinate of the principal point
    pub cy: f64,
}

impl CameraIntrinsics {
    /// Create camera intrinsics from focal lengths and principal point.
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Create camera intrinsics from a 3x3 intrinsics matrix.
    pub fn from_matrix(k: &[[f64; 3]; 3]) -> ProjectionResult<Self> {
        if k[0][1] != 0.0 || k[1][0] != 0.0 || k[2][0] != 0.0 || k[2][1] != 0.0 || k[2][2] != 1.0
        {
            return Err(ProjectionError::InvalidConfiguration(
                "Intrinsics matrix must have form [[fx, 0, cx], [0, fy, cy], [0, 0, 1]]".to_string(),
            ));
        }

        Ok(Self {
            fx: k[0][0],
            fy: k[1][1],
            cx: k[0][2],
            cy: k[1][2],
        })
    }

    /// Convert to a row-major 3x3 intrinsics matrix.
    pub fn to_matrix(&self) -> [[f64; 3]; 3] {
        [
            [self.fx, 0.0, self.cx],
            [0.0, self.fy, self.cy],
            [0.0, 0.0, 1.0],
        ]
    }

    fn validate(&self) -> ProjectionResult<()> {
        if ![self.fx, self.fy, self.cx, self.cy]
            .iter()
            .all(|v| v.is_finite())
        {
            return Err(ProjectionError::InvalidConfiguration(format!(
                "intrinsics must be finite, got {self:?}"
            )));
        }
        if self.fx <= 0.0 || self.fy <= 0.0 {
            return Err(ProjectionError::InvalidConfiguration(format!(
                "focal lengths must be positive, got fx={} fy={}",
                self.fx, self.fy
            )));
        }
        Ok(())
    }
}

/// Represents polynomial distortion parameters using the Brown-Conrady model.
///
/// The radial part is the rational model `(1 + k1 r² + k2 r⁴ + k3 r⁶) / (1 + k4 r² + k5 r⁴ + k6 r⁶)`,
/// which reduces to the plain polynomial model when `k4..k6` are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PolynomialDistortion {
    /// The first radial distortion coefficient
    pub k1: f64,
    /// The second radial distortion coefficient
    pub k2: f64,
    /// The third radial distortion coefficient
    pub k3: f64,
    /// The fourth radial distortion coefficient
    pub k4: f64,
    /// The fifth radial distortion coefficient
    pub k5: f64,
    /// The sixth radial distortion coefficient
    pub k6: f64,
    /// The first tangential distortion coefficient
    pub p1: f64,
    /// The second tangential distortion coefficient
    pub p2: f64,
}

impl PolynomialDistortion {
    /// Create distortion parameters with radial and tangential coefficients.
    pub fn radial_tangential(k1: f64, k2: f64, p1: f64, p2: f64) -> Self {
        Self {
            k1,
            k2,
            p1,
            p2,
            ..Default::default()
        }
    }

    /// Build distortion parameters from a coefficient list in OpenCV order.
    ///
    /// # Arguments
    ///
    /// * `coefficients` - `[]`, `[k1, k2, p1, p2]`, `[k1, k2, p1, p2, k3]` or
    ///   `[k1, k2, p1, p2, k3, k4, k5, k6]`.
    ///
    /// # Returns
    ///
    /// `None` when the list is empty, meaning the images are already undistorted.
    pub fn from_coefficients(coefficients: &[f64]) -> ProjectionResult<Option<Self>> {
        if let Some(bad) = coefficients.iter().find(|c| !c.is_finite()) {
            return Err(ProjectionError::InvalidConfiguration(format!(
                "distortion coefficients must be finite, got {bad}"
            )));
        }

        let c = |i: usize| coefficients.get(i).copied().unwrap_or(0.0);
        match coefficients.len() {
            0 => Ok(None),
            4 | 5 | 8 => Ok(Some(Self {
                k1: c(0),
                k2: c(1),
                p1: c(2),
                p2: c(3),
                k3: c(4),
                k4: c(5),
                k5: c(6),
                k6: c(7),
            })),
            n => Err(ProjectionError::InvalidConfiguration(format!(
                "expected 0, 4, 5 or 8 distortion coefficients, got {n}"
            ))),
        }
    }

    /// Check if there is any distortion.
    pub fn has_distortion(&self) -> bool {
        [
            self.k1, self.k2, self.k3, self.k4, self.k5, self.k6, self.p1, self.p2,
        ]
        .iter()
        .any(|&k| k != 0.0)
    }

    /// Apply the distortion to a point in normalized image coordinates.
    pub fn distort_normalized(&self, x: f64, y: f64) -> (f64, f64) {
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        // radial distortion
        let kr = (1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6)
            / (1.0 + self.k4 * r2 + self.k5 * r4 + self.k6 * r6);

        // tangential distortion
        let xd = x * kr + 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let yd = y * kr + self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;

        (xd, yd)
    }
}

/// Largest re-distortion error, in normalized coordinates, accepted from an
/// undistortion that ran out of iterations.
pub const UNDISTORT_RESIDUAL_TOL: f64 = 1e-8;

/// Termination criteria of the iterative undistortion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TermCriteria {
    /// Maximum number of refinement iterations
    pub max_iter: usize,
    /// Convergence threshold on the per-iteration update, in normalized coordinates
    pub eps: f64,
}

impl Default for TermCriteria {
    fn default() -> Self {
        Self {
            max_iter: 30,
            eps: 1e-12,
        }
    }
}

/// A pinhole camera with optional lens distortion.
///
/// The intrinsic matrix and its inverse are computed once at construction.
#[derive(Debug, Clone)]
pub struct CameraModel {
    intrinsics: CameraIntrinsics,
    distortion: Option<PolynomialDistortion>,
    criteria: TermCriteria,
    k: DMat3,
    k_inv: DMat3,
}

impl CameraModel {
    /// Create a camera model.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::InvalidConfiguration`] when a focal length is not positive
    /// or a parameter is not finite.
    pub fn new(
        intrinsics: CameraIntrinsics,
        distortion: Option<PolynomialDistortion>,
    ) -> ProjectionResult<Self> {
        intrinsics.validate()?;
        if let Some(d) = &distortion {
            Self::check_distortion(d)?;
        }

        // column-major in glam
        let k = DMat3::from_cols_array_2d(&intrinsics.to_matrix()).transpose();
        let k_inv = k.inverse();

        Ok(Self {
            intrinsics,
            distortion: distortion.filter(|d| d.has_distortion()),
            criteria: TermCriteria::default(),
            k,
            k_inv,
        })
    }

    fn check_distortion(d: &PolynomialDistortion) -> ProjectionResult<()> {
        PolynomialDistortion::from_coefficients(&[
            d.k1, d.k2, d.p1, d.p2, d.k3, d.k4, d.k5, d.k6,
        ])
        .map(|_| ())
    }

    /// Create a camera model without distortion.
    pub fn pinhole(intrinsics: CameraIntrinsics) -> ProjectionResult<Self> {
        Self::new(intrinsics, None)
    }

    /// Replace the termination criteria of the iterative undistortion.
    pub fn with_criteria(mut self, criteria: TermCriteria) -> ProjectionResult<Self> {
        if criteria.max_iter == 0 || criteria.eps.is_nan() || criteria.eps < 0.0 {
            return Err(ProjectionError::InvalidConfiguration(format!(
                "undistortion needs at least one iteration and a non-negative eps, got {criteria:?}"
            )));
        }
        self.criteria = criteria;
        Ok(self)
    }

    /// The camera intrinsics.
    pub fn intrinsics(&self) -> &CameraIntrinsics {
        &self.intrinsics
    }

    /// The distortion parameters, if the camera has any.
    pub fn distortion(&self) -> Option<&PolynomialDistortion> {
        self.distortion.as_ref()
    }

    /// Check if the camera has distortion.
    pub fn has_distortion(&self) -> bool {
        self.distortion.is_some()
    }

    /// The undistortion termination criteria.
    pub fn criteria(&self) -> TermCriteria {
        self.criteria
    }

    /// The row-major 3x3 intrinsic matrix.
    pub fn intrinsic_matrix(&self) -> [[f64; 3]; 3] {
        self.k.transpose().to_cols_array_2d()
    }

    /// The row-major inverse of the intrinsic matrix.
    pub fn inverse_intrinsic_matrix(&self) -> [[f64; 3]; 3] {
        self.k_inv.transpose().to_cols_array_2d()
    }

    /// Remove lens distortion from a pixel, staying in pixel space.
    ///
    /// Identity when the camera has no distortion. An iterate that stops short of the
    /// termination criteria is still accepted when it re-distorts to the input within
    /// [`UNDISTORT_RESIDUAL_TOL`].
    ///
    /// # Errors
    ///
    /// Returns [`ProjectionError::UndistortFailed`] when the iteration diverges, which
    /// happens for pixels far outside the calibrated field of view.
    pub fn undistort_pixel(&self, u: f64, v: f64) -> ProjectionResult<(f64, f64)> {
        let Some(distortion) = &self.distortion else {
            return Ok((u, v));
        };

        // normalize the coordinates
        let normalized = self.k_inv * DVec3::new(u, v, 1.0);
        let (x, y) = (normalized.x, normalized.y);

        // initial guess: assume no distortion
        let (mut xu, mut yu) = (x, y);
        let mut converged = false;

        for _ in 0..self.criteria.max_iter {
            let (xd, yd) = distortion.distort_normalized(xu, yu);
            let dx = x - xd;
            let dy = y - yd;
            xu += dx;
            yu += dy;

            if dx.abs() <= self.criteria.eps && dy.abs() <= self.criteria.eps {
                converged = true;
                break;
            }
        }

        if !xu.is_finite() || !yu.is_finite() {
            return Err(ProjectionError::UndistortFailed { u, v });
        }

        if !converged {
            let (xd, yd) = distortion.distort_normalized(xu, yu);
            let residual = (x - xd).hypot(y - yd);
            if residual.is_nan() || residual > UNDISTORT_RESIDUAL_TOL {
                log::warn!(
                    "undistortion of ({u}, {v}) diverged, residual {residual} after {} iterations",
                    self.criteria.max_iter
                );
                return Err(ProjectionError::UndistortFailed { u, v });
            }
            log::debug!("undistortion of ({u}, {v}) stopped with residual {residual}");
        }

        // denormalize the coordinates
        let pixel = self.k * DVec3::new(xu, yu, 1.0);
        Ok((pixel.x, pixel.y))
    }

    /// Apply lens distortion to an ideal pixel.
    ///
    /// Identity when the camera has no distortion.
    pub fn distort_pixel(&self, u: f64, v: f64) -> (f64, f64) {
        let Some(distortion) = &self.distortion else {
            return (u, v);
        };

        let normalized = self.k_inv * DVec3::new(u, v, 1.0);
        let (xd, yd) = distortion.distort_normalized(normalized.x, normalized.y);
        let pixel = self.k * DVec3::new(xd, yd, 1.0);
        (pixel.x, pixel.y)
    }

    /// Back-project a raw pixel into an unnormalized camera-frame ray direction.
    ///
    /// The camera frame has x right, y down and z forward; the returned direction
    /// has `z = 1`. Fails like [`CameraModel::undistort_pixel`].
    pub fn back_project(&self, u: f64, v: f64) -> ProjectionResult<DVec3> {
        let (u, v) = self.undistort_pixel(u, v)?;
        Ok(self.k_inv * DVec3::new(u, v, 1.0))
    }

    /// Project a camera-frame point into the raw (distorted) image.
    ///
    /// Returns `None` for points at or behind the image plane.
    pub fn project_camera_point(&self, point: DVec3) -> Option<(f64, f64)> {
        if point.z.is_nan() || point.z <= 0.0 {
            return None;
        }
        let pixel = self.k * (point / point.z);
        Some(self.distort_pixel(pixel.x, pixel.y))
    }
}
