//! Fiducial-marker optical tracker.
//!
//! Configure once, start tracking, pull frames of per-marker poses, stop,
//! close. Each frame is produced by the same pipeline:
//!
//! 1. grab a raster from the [`CaptureDevice`] (or take one from the caller),
//! 2. run the pluggable [`MarkerDetector`] with the configured [`Dictionary`],
//! 3. stamp the frame once with wall-clock time,
//! 4. turn every marker into a 4x4 pose according to the [`PoseMode`],
//! 5. advance the frame counter.
//!
//! Calibrated trackers report rigid transforms from the [`PoseSolver`]
//! (the built-in [`PlanarSquareSolver`] by default). Uncalibrated trackers
//! report a 2-D proxy: the marker's pixel centroid and apparent size in the
//! translation column.
//!
//! ```no_run
//! use aruco_tracker::{
//!     detector_fn, ArucoTracker, DetectedMarker, InMemoryCapture, TrackerConfiguration,
//!     TrackerOptions, VideoSource,
//! };
//! use aruco_tracker_core::GrayImage;
//!
//! # fn main() -> Result<(), aruco_tracker::TrackerError> {
//! let config = TrackerConfiguration::resolve(
//!     TrackerOptions::default().with_video_source(VideoSource::Device(0)),
//! )?;
//! let detector = detector_fn(|_frame, _dict| Ok(Vec::<DetectedMarker>::new()));
//! let mut tracker = ArucoTracker::builder(config, detector)
//!     .capture(InMemoryCapture::new([GrayImage::filled(640, 480, 0)]))
//!     .open()?;
//! tracker.start_tracking()?;
//! let (ids, stamps, numbers, poses, quality) = tracker.get_frame()?.into_parts();
//! # let _ = (ids, stamps, numbers, poses, quality);
//! tracker.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//! - `image` (default): [`ImageFileCapture`] and conversions from `image` buffers.
//! - `tracing`: spans on the frame pipeline and `aruco_tracker_core::init_tracing`.

mod calibration;
mod capture;
mod config;
mod detect;
mod error;
mod frame;
#[cfg(feature = "image")]
mod image_capture;
mod pose;
mod solver;
mod state;
mod tracker;

pub use aruco_tracker_dictionary::{builtin_dictionary, Dictionary, DEFAULT_DICTIONARY};

pub use calibration::load_calibration;
pub use capture::{CaptureDevice, CaptureHandle, CaptureProperty, InMemoryCapture, VideoSource};
pub use config::{TrackerConfiguration, TrackerOptions, DEFAULT_MARKER_SIZE};
pub use detect::{detector_fn, DetectError, DetectedMarker, MarkerDetector};
pub use error::{DeviceError, TrackerError, ValidationError};
pub use frame::{TrackingFrame, TrackingRecord};
#[cfg(feature = "image")]
pub use image_capture::ImageFileCapture;
pub use pose::{
    euler_xyz_from_rotation, proxy_pose, rigid_transform, rotation_from_euler_xyz, Pose, PoseMode,
    PoseSolveError, PoseSolver, SolvedPose,
};
pub use solver::{marker_object_points, PlanarSquareSolver};
pub use state::{StateError, TrackerEvent, TrackerState};
pub use tracker::{ArucoTracker, ArucoTrackerBuilder, ToolDescriptions};
