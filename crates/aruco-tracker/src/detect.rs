//! Marker detection seam.
//!
//! The tracker does not locate markers itself. A [`MarkerDetector`] receives
//! each raster frame together with the configured dictionary and returns the
//! markers it found, in whatever order it likes; the tracker preserves that
//! order. Ids are not guaranteed to be unique within a frame.

use aruco_tracker_core::GrayImageView;
use aruco_tracker_dictionary::Dictionary;
use nalgebra::{Point2, Vector2};
use serde::Serialize;

/// Failure reported by a detection backend, propagated unchanged.
#[derive(thiserror::Error, Debug)]
#[error("marker detection failed: {source}")]
pub struct DetectError {
    #[source]
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl DetectError {
    pub fn new(source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// One marker found in one frame.
///
/// Corners are pixel coordinates in the detector's fixed winding order
/// (top-left, top-right, bottom-right, bottom-left of the marker pattern).
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DetectedMarker {
    pub id: u32,
    pub corners: [Point2<f64>; 4],
}

impl DetectedMarker {
    pub fn new(id: u32, corners: [Point2<f64>; 4]) -> Self {
        Self { id, corners }
    }

    /// Mean of the four corners.
    pub fn centroid(&self) -> Point2<f64> {
        let sum = self
            .corners
            .iter()
            .fold(Vector2::<f64>::zeros(), |acc, p| acc + p.coords);
        Point2::from(sum / 4.0)
    }

    /// Norm of the componentwise corner spread `max - min`.
    pub fn apparent_size(&self) -> f64 {
        let mut min = self.corners[0].coords;
        let mut max = min;
        for p in &self.corners[1..] {
            min = min.inf(&p.coords);
            max = max.sup(&p.coords);
        }
        (max - min).norm()
    }
}

/// Locates fiducial markers in a grayscale frame.
pub trait MarkerDetector: Send {
    fn detect(
        &mut self,
        frame: &GrayImageView<'_>,
        dictionary: &Dictionary,
    ) -> Result<Vec<DetectedMarker>, DetectError>;
}

impl<F> MarkerDetector for F
where
    F: FnMut(&GrayImageView<'_>, &Dictionary) -> Result<Vec<DetectedMarker>, DetectError> + Send,
{
    fn detect(
        &mut self,
        frame: &GrayImageView<'_>,
        dictionary: &Dictionary,
    ) -> Result<Vec<DetectedMarker>, DetectError> {
        self(frame, dictionary)
    }
}

/// Pin a closure's signature so it can be used as a [`MarkerDetector`].
pub fn detector_fn<F>(f: F) -> F
where
    F: FnMut(&GrayImageView<'_>, &Dictionary) -> Result<Vec<DetectedMarker>, DetectError> + Send,
{
    f
}
