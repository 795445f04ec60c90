use serde::Serialize;

use crate::pose::Pose;

/// One frame of tracking results.
///
/// All five sequences have one entry per detected marker, in detector order.
/// Timestamps and frame numbers are shared by every entry of a frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TrackingFrame {
    /// Marker ids. Not guaranteed unique.
    pub port_handles: Vec<u32>,
    /// Seconds since the UNIX epoch, taken once per frame.
    pub time_stamps: Vec<f64>,
    pub frame_numbers: Vec<u64>,
    pub tracking: Vec<Pose>,
    /// Always NaN; no quality metric is computed.
    pub tracking_quality: Vec<f64>,
}

/// One marker's entry in a [`TrackingFrame`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackingRecord<'a> {
    pub port_handle: u32,
    pub time_stamp: f64,
    pub frame_number: u64,
    pub pose: &'a Pose,
    pub quality: f64,
}

impl TrackingFrame {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            port_handles: Vec::with_capacity(n),
            time_stamps: Vec::with_capacity(n),
            frame_numbers: Vec::with_capacity(n),
            tracking: Vec::with_capacity(n),
            tracking_quality: Vec::with_capacity(n),
        }
    }

    pub(crate) fn push(&mut self, id: u32, time_stamp: f64, frame_number: u64, pose: Pose) {
        self.port_handles.push(id);
        self.time_stamps.push(time_stamp);
        self.frame_numbers.push(frame_number);
        self.tracking.push(pose);
        self.tracking_quality.push(f64::NAN);
    }

    pub fn len(&self) -> usize {
        self.port_handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.port_handles.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = TrackingRecord<'_>> + '_ {
        (0..self.len()).map(move |i| TrackingRecord {
            port_handle: self.port_handles[i],
            time_stamp: self.time_stamps[i],
            frame_number: self.frame_numbers[i],
            pose: &self.tracking[i],
            quality: self.tracking_quality[i],
        })
    }

    /// `(port_handles, time_stamps, frame_numbers, tracking, tracking_quality)`.
    #[allow(clippy::type_complexity)]
    pub fn into_parts(self) -> (Vec<u32>, Vec<f64>, Vec<u64>, Vec<Pose>, Vec<f64>) {
        (
            self.port_handles,
            self.time_stamps,
            self.frame_numbers,
            self.tracking,
            self.tracking_quality,
        )
    }
}
