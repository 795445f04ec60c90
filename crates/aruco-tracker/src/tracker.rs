//! The tracker: lifecycle plus the per-frame pipeline.

use std::time::{SystemTime, UNIX_EPOCH};

use aruco_tracker_core::GrayImageView;
use serde::Serialize;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::capture::{CaptureDevice, CaptureHandle, VideoSource};
use crate::config::TrackerConfiguration;
use crate::detect::MarkerDetector;
use crate::error::{DeviceError, TrackerError};
use crate::frame::TrackingFrame;
use crate::pose::PoseSolver;
use crate::solver::PlanarSquareSolver;
use crate::state::{StateMachine, TrackerEvent, TrackerState};

/// Static description of what the tracker is attached to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolDescriptions {
    pub video_source: VideoSource,
    pub dictionary: &'static str,
    pub calibrated: bool,
}

/// Collects the tracker's collaborators before the capture device is opened.
pub struct ArucoTrackerBuilder {
    config: TrackerConfiguration,
    detector: Box<dyn MarkerDetector>,
    capture: Option<Box<dyn CaptureDevice>>,
    solver: Box<dyn PoseSolver>,
}

impl ArucoTrackerBuilder {
    /// Capture device to open on the configured video source.
    ///
    /// Without one, image files are read from disk when the `image` feature
    /// is enabled. Ignored when the video source is [`VideoSource::None`].
    pub fn capture(mut self, device: impl CaptureDevice + 'static) -> Self {
        self.capture = Some(Box::new(device));
        self
    }

    /// Replace the built-in [`PlanarSquareSolver`].
    pub fn pose_solver(mut self, solver: impl PoseSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    /// Open the capture device and return a tracker in the `Ready` state.
    pub fn open(self) -> Result<ArucoTracker, TrackerError> {
        let mut state = StateMachine::new();
        let source = self.config.video_source();

        let capture = if source.has_device() {
            let device = self
                .capture
                .or_else(default_capture)
                .ok_or_else(|| DeviceError::OpenFailed {
                    video_source: source.clone(),
                })?;
            let mut handle = CaptureHandle::open(device, source)?;
            for &(property, value) in self.config.capture_properties() {
                if !handle.set_property(property, value) {
                    log::warn!(
                        "capture device did not accept {} = {value}",
                        property.name()
                    );
                }
            }
            Some(handle)
        } else {
            None
        };

        state.apply(TrackerEvent::Open)?;
        log::debug!(
            "tracker ready on {} ({})",
            source,
            if self.config.is_calibrated() {
                "calibrated"
            } else {
                "uncalibrated"
            }
        );

        Ok(ArucoTracker {
            config: self.config,
            detector: self.detector,
            solver: self.solver,
            capture,
            state,
            frame_number: 0,
        })
    }
}

#[cfg(feature = "image")]
fn default_capture() -> Option<Box<dyn CaptureDevice>> {
    Some(Box::new(crate::image_capture::ImageFileCapture::new()))
}

#[cfg(not(feature = "image"))]
fn default_capture() -> Option<Box<dyn CaptureDevice>> {
    None
}

/// Fiducial-marker tracker.
///
/// Calls must be serialized; every mutating call takes `&mut self`. The
/// tracker is `Send`, so share it across threads behind a `Mutex`.
///
/// ```no_run
/// use aruco_tracker::{detector_fn, ArucoTracker, TrackerConfiguration};
/// use serde_json::json;
///
/// # fn main() -> Result<(), aruco_tracker::TrackerError> {
/// let config = TrackerConfiguration::from_value(&json!({
///     "video source": "frames/",
///     "marker size": 50.0,
/// }))?;
/// let detector = detector_fn(|_frame, _dict| Ok(Vec::new()));
/// let mut tracker = ArucoTracker::new(config, detector)?;
/// tracker.start_tracking()?;
/// let frame = tracker.get_frame()?;
/// println!("{} markers", frame.len());
/// tracker.stop_tracking()?;
/// tracker.close()?;
/// # Ok(())
/// # }
/// ```
pub struct ArucoTracker {
    config: TrackerConfiguration,
    detector: Box<dyn MarkerDetector>,
    solver: Box<dyn PoseSolver>,
    capture: Option<CaptureHandle>,
    state: StateMachine,
    frame_number: u64,
}

impl ArucoTracker {
    pub fn builder(
        config: TrackerConfiguration,
        detector: impl MarkerDetector + 'static,
    ) -> ArucoTrackerBuilder {
        ArucoTrackerBuilder {
            config,
            detector: Box::new(detector),
            capture: None,
            solver: Box::new(PlanarSquareSolver),
        }
    }

    /// Build with the default capture device and pose solver.
    pub fn new(
        config: TrackerConfiguration,
        detector: impl MarkerDetector + 'static,
    ) -> Result<Self, TrackerError> {
        Self::builder(config, detector).open()
    }

    pub fn start_tracking(&mut self) -> Result<(), TrackerError> {
        self.state.apply(TrackerEvent::StartTracking)?;
        Ok(())
    }

    pub fn stop_tracking(&mut self) -> Result<(), TrackerError> {
        self.state.apply(TrackerEvent::StopTracking)?;
        Ok(())
    }

    /// Grab a frame from the capture device and report every marker in it.
    ///
    /// Only valid while tracking. The frame counter advances only when the
    /// whole call succeeds.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "debug", skip(self), fields(frame_number = self.frame_number))
    )]
    pub fn get_frame(&mut self) -> Result<TrackingFrame, TrackerError> {
        self.state
            .require("get_frame", |s| s == TrackerState::Tracking)?;
        let capture = self
            .capture
            .as_mut()
            .ok_or(DeviceError::NoCaptureDevice)?;
        let image = capture.read().ok_or(DeviceError::ReadFailed {
            frame_number: self.frame_number,
        })?;
        self.track(&image.view())
    }

    /// Like [`get_frame`](Self::get_frame), on a frame supplied by the caller.
    #[cfg_attr(
        feature = "tracing",
        instrument(
            level = "debug",
            skip(self, frame),
            fields(frame_number = self.frame_number, width = frame.width, height = frame.height)
        )
    )]
    pub fn get_frame_from(&mut self, frame: &GrayImageView<'_>) -> Result<TrackingFrame, TrackerError> {
        self.state
            .require("get_frame", |s| s == TrackerState::Tracking)?;
        self.track(frame)
    }

    fn track(&mut self, image: &GrayImageView<'_>) -> Result<TrackingFrame, TrackerError> {
        let markers = self.detector.detect(image, self.config.dictionary())?;
        let time_stamp = unix_seconds();
        let poses = self.config.pose_mode().estimate(
            &markers,
            self.config.marker_size(),
            self.solver.as_ref(),
        )?;

        let mut frame = TrackingFrame::with_capacity(markers.len());
        for (marker, pose) in markers.iter().zip(poses) {
            frame.push(marker.id, time_stamp, self.frame_number, pose);
        }
        log::trace!(
            "frame {}: {} marker(s)",
            self.frame_number,
            frame.len()
        );
        self.frame_number += 1;
        Ok(frame)
    }

    /// Release the capture device. Closing a closed tracker is a no-op.
    pub fn close(&mut self) -> Result<(), TrackerError> {
        self.state.apply(TrackerEvent::Close)?;
        if let Some(mut capture) = self.capture.take() {
            capture.release();
        }
        Ok(())
    }

    pub fn get_tool_descriptions(&self) -> Result<ToolDescriptions, TrackerError> {
        self.state
            .require("get_tool_descriptions", TrackerState::is_open)?;
        Ok(ToolDescriptions {
            video_source: self.config.video_source().clone(),
            dictionary: self.config.dictionary().name,
            calibrated: self.config.is_calibrated(),
        })
    }

    pub fn state(&self) -> TrackerState {
        self.state.state()
    }

    pub fn is_calibrated(&self) -> bool {
        self.config.is_calibrated()
    }

    /// Number the next successful frame will carry.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    pub fn configuration(&self) -> &TrackerConfiguration {
        &self.config
    }
}

impl std::fmt::Debug for ArucoTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArucoTracker")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("frame_number", &self.frame_number)
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}

fn unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
