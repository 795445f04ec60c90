//! Capture devices.
//!
//! A [`CaptureDevice`] is opened exactly once, when the tracker is built,
//! and released exactly once through the owning [`CaptureHandle`], either
//! explicitly on `close()` or when the handle is dropped. That includes the
//! path where opening fails.

use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use aruco_tracker_core::GrayImage;
use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, ValidationError};

/// Where frames come from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "VideoSourceRepr", into = "VideoSourceRepr")]
pub enum VideoSource {
    /// Camera device index; `Device(0)` is the first available device.
    Device(u32),
    /// Video file, image file, or directory of images.
    Path(PathBuf),
    /// No capture device: frames are handed to the tracker by the caller.
    None,
}

impl Default for VideoSource {
    fn default() -> Self {
        Self::FIRST_DEVICE
    }
}

impl VideoSource {
    /// Sentinel for "first available device".
    pub const FIRST_DEVICE: VideoSource = VideoSource::Device(0);

    pub fn has_device(&self) -> bool {
        !matches!(self, VideoSource::None)
    }
}

impl fmt::Display for VideoSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoSource::Device(index) => write!(f, "device {index}"),
            VideoSource::Path(path) => write!(f, "{}", path.display()),
            VideoSource::None => f.write_str("none"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum VideoSourceRepr {
    Index(u32),
    Name(String),
}

impl From<VideoSourceRepr> for VideoSource {
    fn from(repr: VideoSourceRepr) -> Self {
        match repr {
            VideoSourceRepr::Index(index) => VideoSource::Device(index),
            VideoSourceRepr::Name(name) if name.eq_ignore_ascii_case("none") => VideoSource::None,
            VideoSourceRepr::Name(name) => VideoSource::Path(PathBuf::from(name)),
        }
    }
}

impl From<VideoSource> for VideoSourceRepr {
    fn from(source: VideoSource) -> Self {
        match source {
            VideoSource::Device(index) => VideoSourceRepr::Index(index),
            VideoSource::Path(path) => VideoSourceRepr::Name(path.to_string_lossy().into_owned()),
            VideoSource::None => VideoSourceRepr::Name("none".to_owned()),
        }
    }
}

/// Device properties that may be requested before tracking starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CaptureProperty {
    FrameWidth,
    FrameHeight,
    Fps,
    Brightness,
    Contrast,
    Exposure,
}

impl CaptureProperty {
    pub fn name(self) -> &'static str {
        match self {
            CaptureProperty::FrameWidth => "CAP_PROP_FRAME_WIDTH",
            CaptureProperty::FrameHeight => "CAP_PROP_FRAME_HEIGHT",
            CaptureProperty::Fps => "CAP_PROP_FPS",
            CaptureProperty::Brightness => "CAP_PROP_BRIGHTNESS",
            CaptureProperty::Contrast => "CAP_PROP_CONTRAST",
            CaptureProperty::Exposure => "CAP_PROP_EXPOSURE",
        }
    }
}

impl FromStr for CaptureProperty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let prop = match s {
            "CAP_PROP_FRAME_WIDTH" => CaptureProperty::FrameWidth,
            "CAP_PROP_FRAME_HEIGHT" => CaptureProperty::FrameHeight,
            "CAP_PROP_FPS" => CaptureProperty::Fps,
            "CAP_PROP_BRIGHTNESS" => CaptureProperty::Brightness,
            "CAP_PROP_CONTRAST" => CaptureProperty::Contrast,
            "CAP_PROP_EXPOSURE" => CaptureProperty::Exposure,
            _ => {
                return Err(ValidationError::UnknownCaptureProperty {
                    name: s.to_owned(),
                })
            }
        };
        Ok(prop)
    }
}

/// Frame source.
///
/// Implementations block in [`read`](Self::read) until a frame is available;
/// any timeout is theirs to implement.
pub trait CaptureDevice: Send {
    /// Attempt to open `source`. Called once.
    fn open(&mut self, source: &VideoSource) -> bool;

    /// Grab the next frame, `None` on failure or end of stream.
    fn read(&mut self) -> Option<GrayImage>;

    /// Release the device. Called once.
    fn release(&mut self);

    /// Request a device property. Returns whether the device accepted it.
    fn set_property(&mut self, _property: CaptureProperty, _value: f64) -> bool {
        false
    }
}

/// Owns an opened device and releases it exactly once.
pub struct CaptureHandle {
    device: Option<Box<dyn CaptureDevice>>,
}

impl CaptureHandle {
    /// Open `device` on `source`. On failure the device is released before
    /// the error is returned.
    pub fn open(
        mut device: Box<dyn CaptureDevice>,
        source: &VideoSource,
    ) -> Result<Self, DeviceError> {
        let opened = device.open(source);
        let handle = Self {
            device: Some(device),
        };
        if !opened {
            return Err(DeviceError::OpenFailed {
                video_source: source.clone(),
            });
        }
        log::debug!("opened video source {source}");
        Ok(handle)
    }

    pub fn read(&mut self) -> Option<GrayImage> {
        self.device.as_mut()?.read()
    }

    pub fn set_property(&mut self, property: CaptureProperty, value: f64) -> bool {
        self.device
            .as_mut()
            .is_some_and(|d| d.set_property(property, value))
    }

    pub fn is_released(&self) -> bool {
        self.device.is_none()
    }

    /// Release the device; later calls are no-ops.
    pub fn release(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.release();
            log::debug!("capture device released");
        }
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for CaptureHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureHandle")
            .field("released", &self.is_released())
            .finish()
    }
}

/// Device backed by frames queued in memory.
///
/// Useful for feeding frames decoded elsewhere, or for replaying a fixed
/// clip. With `looping`, frames are served round-robin forever.
#[derive(Clone, Debug, Default)]
pub struct InMemoryCapture {
    frames: VecDeque<GrayImage>,
    looping: bool,
    opened: bool,
    properties: Vec<(CaptureProperty, f64)>,
}

impl InMemoryCapture {
    pub fn new(frames: impl IntoIterator<Item = GrayImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn push_frame(&mut self, frame: GrayImage) {
        self.frames.push_back(frame);
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn properties(&self) -> &[(CaptureProperty, f64)] {
        &self.properties
    }
}

impl CaptureDevice for InMemoryCapture {
    fn open(&mut self, source: &VideoSource) -> bool {
        self.opened = source.has_device();
        self.opened
    }

    fn read(&mut self) -> Option<GrayImage> {
        if !self.opened {
            return None;
        }
        let frame = self.frames.pop_front()?;
        if self.looping {
            self.frames.push_back(frame.clone());
        }
        Some(frame)
    }

    fn release(&mut self) {
        self.opened = false;
        self.frames.clear();
    }

    fn set_property(&mut self, property: CaptureProperty, value: f64) -> bool {
        self.properties.push((property, value));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingDevice {
        open_ok: bool,
        releases: Arc<AtomicUsize>,
    }

    impl CaptureDevice for CountingDevice {
        fn open(&mut self, _source: &VideoSource) -> bool {
            self.open_ok
        }

        fn read(&mut self) -> Option<GrayImage> {
            Some(GrayImage::filled(2, 2, 0))
        }

        fn release(&mut self) {
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn failed_open_releases_device() {
        let releases = Arc::new(AtomicUsize::new(0));
        let device = CountingDevice {
            open_ok: false,
            releases: releases.clone(),
        };
        let err = CaptureHandle::open(Box::new(device), &VideoSource::Device(3)).unwrap_err();
        assert_eq!(
            err,
            DeviceError::OpenFailed {
                video_source: VideoSource::Device(3)
            }
        );
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handle_releases_once() {
        let releases = Arc::new(AtomicUsize::new(0));
        let device = CountingDevice {
            open_ok: true,
            releases: releases.clone(),
        };
        let mut handle =
            CaptureHandle::open(Box::new(device), &VideoSource::FIRST_DEVICE).expect("open");
        assert!(handle.read().is_some());
        handle.release();
        handle.release();
        assert!(handle.is_released());
        assert!(handle.read().is_none());
        drop(handle);
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn in_memory_capture_serves_frames_in_order() {
        let mut cap = InMemoryCapture::new([GrayImage::filled(1, 1, 1), GrayImage::filled(1, 1, 2)]);
        assert!(cap.read().is_none(), "unopened device must not deliver frames");
        assert!(cap.open(&VideoSource::FIRST_DEVICE));
        assert_eq!(cap.read().map(|f| f.data[0]), Some(1));
        assert_eq!(cap.read().map(|f| f.data[0]), Some(2));
        assert!(cap.read().is_none());
    }

    #[test]
    fn in_memory_capture_loops() {
        let mut cap = InMemoryCapture::new([GrayImage::filled(1, 1, 7)]).looping(true);
        assert!(cap.open(&VideoSource::Path("clip".into())));
        for _ in 0..5 {
            assert_eq!(cap.read().map(|f| f.data[0]), Some(7));
        }
        assert_eq!(cap.remaining(), 1);
    }

    #[test]
    fn video_source_from_json() {
        let s: VideoSource = serde_json::from_str("2").expect("index");
        assert_eq!(s, VideoSource::Device(2));
        let s: VideoSource = serde_json::from_str("\"data/output.avi\"").expect("path");
        assert_eq!(s, VideoSource::Path(PathBuf::from("data/output.avi")));
        let s: VideoSource = serde_json::from_str("\"none\"").expect("none");
        assert_eq!(s, VideoSource::None);
        assert!(serde_json::from_str::<VideoSource>("-1").is_err());
    }

    #[test]
    fn capture_property_names_round_trip() {
        for prop in [
            CaptureProperty::FrameWidth,
            CaptureProperty::FrameHeight,
            CaptureProperty::Fps,
            CaptureProperty::Brightness,
            CaptureProperty::Contrast,
            CaptureProperty::Exposure,
        ] {
            assert_eq!(prop.name().parse::<CaptureProperty>().expect("known"), prop);
        }
        assert!("CAP_PROP_ZOOMZOOM".parse::<CaptureProperty>().is_err());
    }
}
