//! Pinhole camera model with OpenCV-ordered Brown–Conrady distortion.

use nalgebra::{Matrix3, Point2, Point3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum CameraModelError {
    #[error("camera intrinsics contain a non-finite entry at ({row}, {col})")]
    NonFiniteIntrinsics { row: usize, col: usize },
    #[error("camera distortion contains a non-finite coefficient at index {index}")]
    NonFiniteDistortion { index: usize },
}

/// Five-coefficient radial/tangential distortion.
///
/// Coefficients follow the OpenCV ordering `[k1, k2, p1, p2, k3]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BrownConrady5 {
    pub k1: f64,
    pub k2: f64,
    pub p1: f64,
    pub p2: f64,
    pub k3: f64,
}

const UNDISTORT_ITERS: usize = 8;

impl BrownConrady5 {
    pub fn from_coefficients(c: [f64; 5]) -> Self {
        Self {
            k1: c[0],
            k2: c[1],
            p1: c[2],
            p2: c[3],
            k3: c[4],
        }
    }

    pub fn coefficients(&self) -> [f64; 5] {
        [self.k1, self.k2, self.p1, self.p2, self.k3]
    }

    pub fn is_zero(&self) -> bool {
        self.coefficients().iter().all(|&c| c == 0.0)
    }

    /// Apply distortion to undistorted normalized coordinates.
    pub fn distort(&self, n: &Vector2<f64>) -> Vector2<f64> {
        let (x, y) = (n.x, n.y);
        let r2 = x * x + y * y;
        let r4 = r2 * r2;
        let r6 = r4 * r2;

        let radial = 1.0 + self.k1 * r2 + self.k2 * r4 + self.k3 * r6;
        let x_tan = 2.0 * self.p1 * x * y + self.p2 * (r2 + 2.0 * x * x);
        let y_tan = self.p1 * (r2 + 2.0 * y * y) + 2.0 * self.p2 * x * y;

        Vector2::new(x * radial + x_tan, y * radial + y_tan)
    }

    /// Invert [`distort`](Self::distort) by fixed-point iteration.
    pub fn undistort(&self, n_dist: &Vector2<f64>) -> Vector2<f64> {
        if self.is_zero() {
            return *n_dist;
        }
        let mut n = *n_dist;
        for _ in 0..UNDISTORT_ITERS {
            let err = self.distort(&n) - n_dist;
            n -= err;
        }
        n
    }
}

/// Camera intrinsics `K` plus lens distortion.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraCalibration {
    pub intrinsics: Matrix3<f64>,
    pub distortion: BrownConrady5,
}

impl CameraCalibration {
    /// Build a calibration, rejecting NaN/inf entries.
    pub fn new(intrinsics: Matrix3<f64>, distortion: [f64; 5]) -> Result<Self, CameraModelError> {
        for row in 0..3 {
            for col in 0..3 {
                if !intrinsics[(row, col)].is_finite() {
                    return Err(CameraModelError::NonFiniteIntrinsics { row, col });
                }
            }
        }
        if let Some(index) = distortion.iter().position(|c| !c.is_finite()) {
            return Err(CameraModelError::NonFiniteDistortion { index });
        }
        Ok(Self {
            intrinsics,
            distortion: BrownConrady5::from_coefficients(distortion),
        })
    }

    /// Pixel -> undistorted normalized coordinates. `None` if `K` is singular.
    pub fn undistort_pixel(&self, pixel: Point2<f64>) -> Option<Vector2<f64>> {
        let k_inv = self.intrinsics.try_inverse()?;
        let v = k_inv * Vector3::new(pixel.x, pixel.y, 1.0);
        if v.z.abs() < 1e-12 {
            return None;
        }
        let n = Vector2::new(v.x / v.z, v.y / v.z);
        Some(self.distortion.undistort(&n))
    }

    /// Project a camera-frame point to distorted pixel coordinates.
    pub fn project(&self, p_cam: &Point3<f64>) -> Point2<f64> {
        let n = Vector2::new(p_cam.x / p_cam.z, p_cam.y / p_cam.z);
        let d = self.distortion.distort(&n);
        let v = self.intrinsics * Vector3::new(d.x, d.y, 1.0);
        Point2::new(v.x / v.z, v.y / v.z)
    }
}
