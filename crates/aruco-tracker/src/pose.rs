//! Pose strategies.
//!
//! A tracker either knows its camera ([`PoseMode::Calibrated`]) and reports
//! full rigid transforms, or it does not and reports a 2-D proxy: identity
//! rotation with the marker's image centroid in the x/y translation slots and
//! its apparent pixel size in the z slot. The proxy is not a 3-D pose.

use aruco_tracker_core::CameraCalibration;
use nalgebra::{Matrix3, Matrix4, Point2, Rotation3, Vector3};
use serde::Serialize;

use crate::detect::DetectedMarker;

/// Homogeneous 4x4 transform reported per marker.
pub type Pose = Matrix4<f64>;

/// Rotation parameters plus translation, as returned by a [`PoseSolver`].
///
/// `rotation` holds x-y-z angles in radians, composed as
/// `Rx(rotation.x) * Ry(rotation.y) * Rz(rotation.z)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SolvedPose {
    pub rotation: Vector3<f64>,
    pub translation: Vector3<f64>,
}

#[derive(thiserror::Error, Debug)]
pub enum PoseSolveError {
    #[error("marker {id}: camera intrinsics are not invertible")]
    SingularIntrinsics { id: u32 },

    #[error("marker {id}: corners are degenerate, no plane homography")]
    DegenerateCorners { id: u32 },

    #[error("pose solver failed: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

/// Solves a square marker's pose from its four image corners.
///
/// Only invoked for calibrated trackers.
pub trait PoseSolver: Send {
    fn solve(
        &self,
        marker: &DetectedMarker,
        marker_size: f64,
        camera: &CameraCalibration,
    ) -> Result<SolvedPose, PoseSolveError>;
}

/// How poses are produced; fixed when the configuration is resolved.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PoseMode {
    Uncalibrated,
    Calibrated(CameraCalibration),
}

impl PoseMode {
    #[inline]
    pub fn is_calibrated(&self) -> bool {
        matches!(self, PoseMode::Calibrated(_))
    }

    pub fn camera(&self) -> Option<&CameraCalibration> {
        match self {
            PoseMode::Calibrated(camera) => Some(camera),
            PoseMode::Uncalibrated => None,
        }
    }

    /// One pose per marker, index-aligned with `markers`.
    pub fn estimate(
        &self,
        markers: &[DetectedMarker],
        marker_size: f64,
        solver: &dyn PoseSolver,
    ) -> Result<Vec<Pose>, PoseSolveError> {
        match self {
            PoseMode::Uncalibrated => Ok(markers.iter().map(proxy_pose).collect()),
            PoseMode::Calibrated(camera) => markers
                .iter()
                .map(|m| -> Result<Pose, PoseSolveError> {
                    let solved = solver.solve(m, marker_size, camera)?;
                    Ok(rigid_transform(
                        &rotation_from_euler_xyz(&solved.rotation),
                        &solved.translation,
                    ))
                })
                .collect(),
        }
    }
}

/// Uncalibrated 2-D proxy: centroid in `(0,3)`/`(1,3)`, apparent size in `(2,3)`.
pub fn proxy_pose(marker: &DetectedMarker) -> Pose {
    let c: Point2<f64> = marker.centroid();
    let mut pose = Pose::identity();
    pose[(0, 3)] = c.x;
    pose[(1, 3)] = c.y;
    pose[(2, 3)] = marker.apparent_size();
    pose
}

/// `Rx(a) * Ry(b) * Rz(c)` for `angles = (a, b, c)` in radians.
pub fn rotation_from_euler_xyz(angles: &Vector3<f64>) -> Matrix3<f64> {
    let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), angles.x);
    let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), angles.y);
    let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), angles.z);
    (rx * ry * rz).into_inner()
}

/// Inverse of [`rotation_from_euler_xyz`] for a proper rotation matrix.
///
/// At gimbal lock (`|b| = pi/2`) the z angle is set to zero.
pub fn euler_xyz_from_rotation(r: &Matrix3<f64>) -> Vector3<f64> {
    let sb = r[(0, 2)].clamp(-1.0, 1.0);
    let b = sb.asin();
    if sb.abs() < 1.0 - 1e-12 {
        let a = (-r[(1, 2)]).atan2(r[(2, 2)]);
        let c = (-r[(0, 1)]).atan2(r[(0, 0)]);
        Vector3::new(a, b, c)
    } else {
        let a = r[(2, 1)].atan2(r[(1, 1)]);
        Vector3::new(a, b, 0.0)
    }
}

/// Rotation in the upper-left block, translation in the last column,
/// bottom row `[0, 0, 0, 1]`.
pub fn rigid_transform(rotation: &Matrix3<f64>, translation: &Vector3<f64>) -> Pose {
    let mut pose = Pose::identity();
    pose.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
    pose.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    pose
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::RowVector4;

    fn marker_at(id: u32, cx: f64, cy: f64, half: f64) -> DetectedMarker {
        DetectedMarker::new(
            id,
            [
                Point2::new(cx - half, cy - half),
                Point2::new(cx + half, cy - half),
                Point2::new(cx + half, cy + half),
                Point2::new(cx - half, cy + half),
            ],
        )
    }

    struct FixedSolver(SolvedPose);

    impl PoseSolver for FixedSolver {
        fn solve(
            &self,
            _marker: &DetectedMarker,
            _marker_size: f64,
            _camera: &CameraCalibration,
        ) -> Result<SolvedPose, PoseSolveError> {
            Ok(self.0)
        }
    }

    struct FailingSolver;

    impl PoseSolver for FailingSolver {
        fn solve(
            &self,
            marker: &DetectedMarker,
            _marker_size: f64,
            _camera: &CameraCalibration,
        ) -> Result<SolvedPose, PoseSolveError> {
            Err(PoseSolveError::DegenerateCorners { id: marker.id })
        }
    }

    fn camera() -> CameraCalibration {
        CameraCalibration::new(
            Matrix3::new(560.0, 0.0, 320.0, 0.0, 560.0, 240.0, 0.0, 0.0, 1.0),
            [0.0; 5],
        )
        .expect("finite")
    }

    #[test]
    fn proxy_pose_holds_centroid_and_size() {
        let pose = proxy_pose(&marker_at(7, 100.0, 50.0, 10.0));
        assert_eq!(pose.fixed_view::<3, 3>(0, 0), Matrix3::identity());
        assert_relative_eq!(pose[(0, 3)], 100.0);
        assert_relative_eq!(pose[(1, 3)], 50.0);
        assert_relative_eq!(pose[(2, 3)], (800.0f64).sqrt());
        assert_eq!(pose.row(3), RowVector4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn euler_xyz_matches_explicit_product() {
        let (a, b, c) = (0.3f64, -0.4f64, 1.1f64);
        let rx = Matrix3::new(1.0, 0.0, 0.0, 0.0, a.cos(), -a.sin(), 0.0, a.sin(), a.cos());
        let ry = Matrix3::new(b.cos(), 0.0, b.sin(), 0.0, 1.0, 0.0, -b.sin(), 0.0, b.cos());
        let rz = Matrix3::new(c.cos(), -c.sin(), 0.0, c.sin(), c.cos(), 0.0, 0.0, 0.0, 1.0);
        let r = rotation_from_euler_xyz(&Vector3::new(a, b, c));
        assert_relative_eq!(r, rx * ry * rz, epsilon = 1e-12);
    }

    #[test]
    fn euler_xyz_round_trips() {
        for angles in [
            Vector3::new(0.1, 0.2, 0.3),
            Vector3::new(-2.5, 1.2, -0.7),
            Vector3::new(3.0, -0.01, 2.9),
        ] {
            let r = rotation_from_euler_xyz(&angles);
            let back = euler_xyz_from_rotation(&r);
            assert_relative_eq!(rotation_from_euler_xyz(&back), r, epsilon = 1e-9);
        }
    }

    #[test]
    fn gimbal_lock_still_reproduces_rotation() {
        let angles = Vector3::new(0.4, std::f64::consts::FRAC_PI_2, 0.2);
        let r = rotation_from_euler_xyz(&angles);
        let back = euler_xyz_from_rotation(&r);
        assert_relative_eq!(back.z, 0.0);
        assert_relative_eq!(rotation_from_euler_xyz(&back), r, epsilon = 1e-6);
    }

    #[test]
    fn rigid_transform_layout() {
        let r = rotation_from_euler_xyz(&Vector3::new(0.0, 0.0, 0.5));
        let t = Vector3::new(1.0, 2.0, 3.0);
        let pose = rigid_transform(&r, &t);
        assert_eq!(pose.fixed_view::<3, 3>(0, 0), r);
        assert_eq!(pose.fixed_view::<3, 1>(0, 3), t);
        assert_eq!(pose.row(3), RowVector4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn uncalibrated_mode_never_calls_solver() {
        let markers = [marker_at(1, 10.0, 10.0, 2.0), marker_at(2, 40.0, 20.0, 4.0)];
        let poses = PoseMode::Uncalibrated
            .estimate(&markers, 50.0, &FailingSolver)
            .expect("proxy poses");
        assert_eq!(poses.len(), 2);
        assert_relative_eq!(poses[1][(0, 3)], 40.0);
    }

    #[test]
    fn calibrated_mode_composes_solver_output() {
        let solved = SolvedPose {
            rotation: Vector3::new(0.1, 0.0, 0.0),
            translation: Vector3::new(5.0, -3.0, 400.0),
        };
        let mode = PoseMode::Calibrated(camera());
        assert!(mode.is_calibrated());
        let poses = mode
            .estimate(&[marker_at(4, 320.0, 240.0, 20.0)], 50.0, &FixedSolver(solved))
            .expect("poses");
        assert_eq!(poses.len(), 1);
        assert_relative_eq!(
            poses[0].fixed_view::<3, 3>(0, 0).into_owned(),
            rotation_from_euler_xyz(&solved.rotation)
        );
        assert_relative_eq!(poses[0][(2, 3)], 400.0);
        assert_eq!(poses[0].row(3), RowVector4::new(0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn calibrated_mode_propagates_solver_failure() {
        let err = PoseMode::Calibrated(camera())
            .estimate(&[marker_at(9, 0.0, 0.0, 1.0)], 50.0, &FailingSolver)
            .unwrap_err();
        assert!(matches!(err, PoseSolveError::DegenerateCorners { id: 9 }));
    }
}
