#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use aruco_tracker::{
    CaptureDevice, CaptureProperty, DetectError, DetectedMarker, Dictionary, MarkerDetector,
    VideoSource,
};
use aruco_tracker_core::{GrayImage, GrayImageView};
use nalgebra::Point2;

/// Axis-aligned marker centred at `(cx, cy)` with edge `2 * half`, corners
/// in top-left, top-right, bottom-right, bottom-left order.
pub fn square_marker(id: u32, cx: f64, cy: f64, half: f64) -> DetectedMarker {
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

/// Replays a fixed script of detection results, one entry per call.
/// Once the script runs out, every call reports no markers.
pub struct ScriptedDetector {
    script: VecDeque<Result<Vec<DetectedMarker>, String>>,
    pub calls: Arc<AtomicUsize>,
}

impl ScriptedDetector {
    pub fn new(script: impl IntoIterator<Item = Result<Vec<DetectedMarker>, String>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Same markers on every call.
    pub fn repeating(markers: Vec<DetectedMarker>, calls: usize) -> Self {
        Self::new((0..calls).map(|_| Ok(markers.clone())))
    }
}

impl MarkerDetector for ScriptedDetector {
    fn detect(
        &mut self,
        _frame: &GrayImageView<'_>,
        _dictionary: &Dictionary,
    ) -> Result<Vec<DetectedMarker>, DetectError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(Ok(markers)) => Ok(markers),
            Some(Err(msg)) => Err(DetectError::new(msg)),
            None => Ok(Vec::new()),
        }
    }
}

/// Counters shared between a test and its [`CountingCapture`].
#[derive(Clone, Default)]
pub struct CaptureCounters {
    pub opens: Arc<AtomicUsize>,
    pub reads: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
    pub properties: Arc<AtomicUsize>,
}

impl CaptureCounters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn properties(&self) -> usize {
        self.properties.load(Ordering::SeqCst)
    }
}

/// Capture device that delivers blank frames and counts every call.
/// `fail_open` refuses to open; `fail_reads` lists the read indices that fail.
pub struct CountingCapture {
    pub counters: CaptureCounters,
    pub fail_open: bool,
    pub fail_reads: Vec<usize>,
}

impl CountingCapture {
    pub fn new(counters: &CaptureCounters) -> Self {
        Self {
            counters: counters.clone(),
            fail_open: false,
            fail_reads: Vec::new(),
        }
    }
}

impl CaptureDevice for CountingCapture {
    fn open(&mut self, _source: &VideoSource) -> bool {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        !self.fail_open
    }

    fn read(&mut self) -> Option<GrayImage> {
        let index = self.counters.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.contains(&index) {
            None
        } else {
            Some(GrayImage::filled(64, 48, 128))
        }
    }

    fn release(&mut self) {
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn set_property(&mut self, _property: CaptureProperty, _value: f64) -> bool {
        self.counters.properties.fetch_add(1, Ordering::SeqCst);
        true
    }
}

pub fn intrinsics_json() -> serde_json::Value {
    serde_json::json!([[560.0, 0.0, 320.0], [0.0, 560.0, 240.0], [0.0, 0.0, 1.0]])
}
