//! Built-in square-marker pose solver.

use aruco_tracker_core::{homography_from_4pt, CameraCalibration};
use nalgebra::{Matrix3, Point2, Vector3};

use crate::detect::DetectedMarker;
use crate::pose::{euler_xyz_from_rotation, PoseSolveError, PoseSolver, SolvedPose};

/// Closed-form pose of a planar square marker.
///
/// The marker is centred at the origin of its own frame, lying in `Z = 0`,
/// with corners `(-s/2, s/2)`, `(s/2, s/2)`, `(s/2, -s/2)`, `(-s/2, -s/2)`
/// matching the detector's top-left, top-right, bottom-right, bottom-left
/// order. Corners are undistorted into normalized camera coordinates, the
/// plane homography `H ~ [r1 r2 t]` is fitted, and the rotation is projected
/// back onto SO(3).
#[derive(Clone, Copy, Debug, Default)]
pub struct PlanarSquareSolver;

/// Marker corners in the marker frame for edge length `size`.
pub fn marker_object_points(size: f64) -> [Point2<f64>; 4] {
    let h = 0.5 * size;
    [
        Point2::new(-h, h),
        Point2::new(h, h),
        Point2::new(h, -h),
        Point2::new(-h, -h),
    ]
}

impl PoseSolver for PlanarSquareSolver {
    fn solve(
        &self,
        marker: &DetectedMarker,
        marker_size: f64,
        camera: &CameraCalibration,
    ) -> Result<SolvedPose, PoseSolveError> {
        let id = marker.id;
        let mut normalized = [Point2::origin(); 4];
        for (dst, corner) in normalized.iter_mut().zip(&marker.corners) {
            let n = camera
                .undistort_pixel(*corner)
                .ok_or(PoseSolveError::SingularIntrinsics { id })?;
            *dst = Point2::from(n);
        }

        let object = marker_object_points(marker_size);
        let h = homography_from_4pt(&object, &normalized)
            .ok_or(PoseSolveError::DegenerateCorners { id })?
            .h;

        let h1 = h.column(0).into_owned();
        let h2 = h.column(1).into_owned();
        let h3 = h.column(2).into_owned();

        let norm = 0.5 * (h1.norm() + h2.norm());
        if norm < 1e-12 || !norm.is_finite() {
            return Err(PoseSolveError::DegenerateCorners { id });
        }
        // H is normalised so that h33 = 1; a positive scale keeps t.z > 0.
        let lambda = 1.0 / norm;

        let r1 = h1 * lambda;
        let r2 = h2 * lambda;
        let r3 = r1.cross(&r2);
        let rotation = nearest_rotation(&Matrix3::from_columns(&[r1, r2, r3]))
            .ok_or(PoseSolveError::DegenerateCorners { id })?;
        let translation: Vector3<f64> = h3 * lambda;

        log::trace!(
            "marker {id}: t = [{:.3}, {:.3}, {:.3}]",
            translation.x,
            translation.y,
            translation.z
        );

        Ok(SolvedPose {
            rotation: euler_xyz_from_rotation(&rotation),
            translation,
        })
    }
}

/// Closest proper rotation in the Frobenius sense (polar decomposition).
fn nearest_rotation(m: &Matrix3<f64>) -> Option<Matrix3<f64>> {
    let svd = m.svd(true, true);
    let u = svd.u?;
    let v_t = svd.v_t?;
    let r = u * v_t;
    if r.determinant() < 0.0 {
        let mut u_flipped = u;
        u_flipped.column_mut(2).neg_mut();
        Some(u_flipped * v_t)
    } else {
        Some(r)
    }
}
