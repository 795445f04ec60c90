use std::path::PathBuf;

use aruco_tracker_core::CameraModelError;

use crate::detect::DetectError;
use crate::pose::PoseSolveError;
use crate::state::StateError;
use crate::VideoSource;

/// Errors returned by the tracker.
///
/// Every error surfaces at the call that caused it; nothing is retried
/// or logged internally.
#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    #[error("unknown marker dictionary `{name}`")]
    Lookup { name: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Detection(#[from] DetectError),

    #[error(transparent)]
    PoseSolve(#[from] PoseSolveError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Malformed configuration or calibration data.
#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("camera projection matrix must be 3x3, got {shape}")]
    IntrinsicsShape { shape: String },

    #[error("{field} entry {index} must be a real number, got {found}")]
    NonRealEntry {
        field: &'static str,
        index: String,
        found: &'static str,
    },

    #[error("camera distortion must have 5 coefficients, got {len}")]
    DistortionLength { len: usize },

    #[error("marker size must be a positive finite number, got {value}")]
    MarkerSize { value: f64 },

    #[error("unknown capture property `{name}`")]
    UnknownCaptureProperty { name: String },

    #[error("invalid tracker options: {0}")]
    Options(#[source] serde_json::Error),

    #[error(transparent)]
    Camera(#[from] CameraModelError),

    #[error("malformed calibration file {}: {reason}", path.display())]
    CalibrationFile { path: PathBuf, reason: String },
}

/// Capture device failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("failed to open video source {video_source}")]
    OpenFailed { video_source: VideoSource },

    #[error("capture device failed to deliver frame {frame_number}")]
    ReadFailed { frame_number: u64 },

    #[error("no capture device is attached; pass frames to `get_frame_from`")]
    NoCaptureDevice,
}

impl TrackerError {
    pub fn is_state_error(&self) -> bool {
        matches!(self, TrackerError::State(_))
    }
}
