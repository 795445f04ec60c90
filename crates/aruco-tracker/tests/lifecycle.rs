mod common;

use aruco_tracker::{
    ArucoTracker, DeviceError, TrackerConfiguration, TrackerError, TrackerOptions, TrackerState,
    VideoSource,
};
use common::{CaptureCounters, CountingCapture, ScriptedDetector};
use serde_json::json;

fn open_tracker(counters: &CaptureCounters) -> ArucoTracker {
    ArucoTracker::builder(
        TrackerConfiguration::default(),
        ScriptedDetector::new(Vec::new()),
    )
    .capture(CountingCapture::new(counters))
    .open()
    .expect("open")
}

fn assert_state_error(result: Result<impl std::fmt::Debug, TrackerError>) {
    match result {
        Err(err) => assert!(err.is_state_error(), "expected a state error, got {err:?}"),
        Ok(v) => panic!("expected a state error, got Ok({v:?})"),
    }
}

#[test]
fn full_lifecycle() {
    let counters = CaptureCounters::default();
    let mut tracker = open_tracker(&counters);
    assert_eq!(tracker.state(), TrackerState::Ready);
    assert_eq!(counters.opens(), 1);

    tracker.start_tracking().expect("start");
    assert_eq!(tracker.state(), TrackerState::Tracking);
    tracker.get_frame().expect("frame");
    tracker.stop_tracking().expect("stop");
    assert_eq!(tracker.state(), TrackerState::Ready);

    tracker.start_tracking().expect("restart");
    tracker.close().expect("close while tracking");
    assert_eq!(tracker.state(), TrackerState::Closed);
    assert_eq!(counters.releases(), 1);
}

#[test]
fn invalid_transitions_are_state_errors() {
    let counters = CaptureCounters::default();
    let mut tracker = open_tracker(&counters);

    assert_state_error(tracker.stop_tracking());
    assert_state_error(tracker.get_frame());
    assert_eq!(tracker.frame_number(), 0);
    assert_eq!(counters.reads(), 0, "no capture while ready");

    tracker.start_tracking().expect("start");
    assert_state_error(tracker.start_tracking());
    assert_eq!(tracker.state(), TrackerState::Tracking);
}

#[test]
fn close_is_idempotent_and_terminal() {
    let counters = CaptureCounters::default();
    let mut tracker = open_tracker(&counters);
    tracker.close().expect("close");
    tracker.close().expect("close again");
    assert_eq!(counters.releases(), 1);

    assert_state_error(tracker.start_tracking());
    assert_state_error(tracker.stop_tracking());
    assert_state_error(tracker.get_frame());
    assert_state_error(tracker.get_tool_descriptions());
    assert_eq!(tracker.state(), TrackerState::Closed);
}

#[test]
fn dropping_releases_device_once() {
    let counters = CaptureCounters::default();
    {
        let mut tracker = open_tracker(&counters);
        tracker.start_tracking().expect("start");
    }
    assert_eq!(counters.releases(), 1);

    let counters = CaptureCounters::default();
    {
        let mut tracker = open_tracker(&counters);
        tracker.close().expect("close");
    }
    assert_eq!(counters.releases(), 1);
}

#[test]
fn open_failure_fails_construction_and_releases() {
    let counters = CaptureCounters::default();
    let mut capture = CountingCapture::new(&counters);
    capture.fail_open = true;
    let config = TrackerConfiguration::resolve(
        TrackerOptions::default().with_video_source(VideoSource::Device(4)),
    )
    .expect("config");

    let err = ArucoTracker::builder(config, ScriptedDetector::new(Vec::new()))
        .capture(capture)
        .open()
        .unwrap_err();
    assert!(matches!(
        err,
        TrackerError::Device(DeviceError::OpenFailed {
            video_source: VideoSource::Device(4)
        })
    ));
    assert_eq!(counters.opens(), 1);
    assert_eq!(counters.releases(), 1);
}

#[test]
fn configuration_errors_happen_before_the_device_is_touched() {
    let err = TrackerConfiguration::from_value(&json!({"aruco dictionary": "DICT_NOPE"}))
        .unwrap_err();
    assert!(matches!(err, TrackerError::Lookup { .. }));
}

#[cfg(feature = "image")]
#[test]
fn default_capture_cannot_open_camera_indices() {
    let err = ArucoTracker::new(
        TrackerConfiguration::default(),
        ScriptedDetector::new(Vec::new()),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        TrackerError::Device(DeviceError::OpenFailed { .. })
    ));
}

#[test]
fn tool_descriptions_report_source() {
    let counters = CaptureCounters::default();
    let config = TrackerConfiguration::from_value(&json!({
        "video source": "data/output.avi",
        "aruco dictionary": "DICT_5X5_100",
        "camera projection matrix": common::intrinsics_json(),
    }))
    .expect("config");
    let mut tracker = ArucoTracker::builder(config, ScriptedDetector::new(Vec::new()))
        .capture(CountingCapture::new(&counters))
        .open()
        .expect("open");

    let desc = tracker.get_tool_descriptions().expect("ready");
    assert_eq!(desc.video_source, VideoSource::Path("data/output.avi".into()));
    assert_eq!(desc.dictionary, "DICT_5X5_100");
    assert!(desc.calibrated);

    tracker.start_tracking().expect("start");
    assert_eq!(tracker.get_tool_descriptions().expect("tracking"), desc);
}

#[test]
fn capture_properties_are_applied_on_open() {
    let counters = CaptureCounters::default();
    let config = TrackerConfiguration::from_value(&json!({
        "capture properties": {"CAP_PROP_FRAME_WIDTH": 640, "CAP_PROP_FPS": 30},
    }))
    .expect("config");
    let _tracker = ArucoTracker::builder(config, ScriptedDetector::new(Vec::new()))
        .capture(CountingCapture::new(&counters))
        .open()
        .expect("open");
    assert_eq!(counters.properties(), 2);
}

#[test]
fn no_device_source_skips_capture() {
    let counters = CaptureCounters::default();
    let config = TrackerConfiguration::from_value(&json!({"video source": "none"})).expect("config");
    let mut tracker = ArucoTracker::builder(config, ScriptedDetector::new(Vec::new()))
        .capture(CountingCapture::new(&counters))
        .open()
        .expect("open");
    tracker.close().expect("close");
    assert_eq!(counters.opens(), 0);
    assert_eq!(counters.releases(), 0);
}
