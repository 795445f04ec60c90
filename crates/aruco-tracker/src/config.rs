//! Tracker configuration.
//!
//! Options arrive as a loosely typed JSON bundle ([`TrackerOptions`]) and are
//! resolved exactly once into an immutable [`TrackerConfiguration`]. The
//! tracker never looks at the raw bundle again.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use aruco_tracker_core::CameraCalibration;
use aruco_tracker_dictionary::{builtin_dictionary, Dictionary, DEFAULT_DICTIONARY};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calibration::load_calibration;
use crate::capture::{CaptureProperty, VideoSource};
use crate::error::{TrackerError, ValidationError};
use crate::pose::PoseMode;

/// Default marker edge length, in the caller's length unit (millimetres by
/// convention).
pub const DEFAULT_MARKER_SIZE: f64 = 50.0;

const INTRINSICS_FIELD: &str = "camera projection matrix";
const DISTORTION_FIELD: &str = "camera distortion";

/// Raw option bundle. Every key is optional; unknown keys are ignored.
///
/// Keys use the spaced spelling (`"video source"`, `"marker size"`, ...);
/// snake_case aliases are accepted as well.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TrackerOptions {
    #[serde(rename = "video source", alias = "video_source")]
    pub video_source: Option<VideoSource>,
    #[serde(rename = "aruco dictionary", alias = "dictionary")]
    pub dictionary: Option<String>,
    #[serde(rename = "marker size", alias = "marker_size")]
    pub marker_size: Option<f64>,
    #[serde(rename = "camera projection matrix", alias = "camera_intrinsics")]
    pub camera_intrinsics: Option<Value>,
    #[serde(rename = "camera distortion", alias = "camera_distortion")]
    pub camera_distortion: Option<Value>,
    /// Calibration file; explicit intrinsics/distortion keys take precedence.
    pub calibration: Option<PathBuf>,
    #[serde(rename = "capture properties", alias = "capture_properties")]
    pub capture_properties: BTreeMap<String, f64>,
}

impl TrackerOptions {
    pub fn with_video_source(mut self, source: VideoSource) -> Self {
        self.video_source = Some(source);
        self
    }

    pub fn with_dictionary(mut self, name: impl Into<String>) -> Self {
        self.dictionary = Some(name.into());
        self
    }

    pub fn with_marker_size(mut self, size: f64) -> Self {
        self.marker_size = Some(size);
        self
    }

    pub fn with_intrinsics(mut self, k: Matrix3<f64>) -> Self {
        let rows: Vec<Value> = k
            .row_iter()
            .map(|row| Value::from(row.iter().copied().collect::<Vec<f64>>()))
            .collect();
        self.camera_intrinsics = Some(Value::Array(rows));
        self
    }

    pub fn with_distortion(mut self, coefficients: [f64; 5]) -> Self {
        self.camera_distortion = Some(Value::from(coefficients.to_vec()));
        self
    }

    pub fn with_calibration_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.calibration = Some(path.into());
        self
    }

    pub fn with_capture_property(mut self, name: impl Into<String>, value: f64) -> Self {
        self.capture_properties.insert(name.into(), value);
        self
    }
}

/// Validated, immutable tracker parameters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackerConfiguration {
    video_source: VideoSource,
    dictionary: Dictionary,
    marker_size: f64,
    pose_mode: PoseMode,
    capture_properties: Vec<(CaptureProperty, f64)>,
}

impl Default for TrackerConfiguration {
    fn default() -> Self {
        Self {
            video_source: VideoSource::default(),
            dictionary: DEFAULT_DICTIONARY,
            marker_size: DEFAULT_MARKER_SIZE,
            pose_mode: PoseMode::Uncalibrated,
            capture_properties: Vec::new(),
        }
    }
}

impl TrackerConfiguration {
    /// Resolve an option bundle. Missing keys take their defaults.
    pub fn resolve(options: TrackerOptions) -> Result<Self, TrackerError> {
        let video_source = options.video_source.unwrap_or_default();

        let dictionary = match options.dictionary {
            Some(name) => builtin_dictionary(&name).ok_or(TrackerError::Lookup { name })?,
            None => DEFAULT_DICTIONARY,
        };

        let marker_size = options.marker_size.unwrap_or(DEFAULT_MARKER_SIZE);
        if !marker_size.is_finite() || marker_size <= 0.0 {
            return Err(ValidationError::MarkerSize { value: marker_size }.into());
        }

        let from_file = options.calibration.map(load_calibration).transpose()?;
        let intrinsics = match &options.camera_intrinsics {
            Some(value) => Some(parse_intrinsics(value)?),
            None => from_file.map(|cal| cal.intrinsics),
        };

        // Distortion is only consulted once intrinsics are known.
        let pose_mode = match intrinsics {
            Some(k) => {
                let distortion = match &options.camera_distortion {
                    Some(value) => parse_distortion(value)?,
                    None => from_file
                        .map(|cal| cal.distortion.coefficients())
                        .unwrap_or([0.0; 5]),
                };
                PoseMode::Calibrated(
                    CameraCalibration::new(k, distortion).map_err(ValidationError::from)?,
                )
            }
            None => PoseMode::Uncalibrated,
        };

        let capture_properties = options
            .capture_properties
            .iter()
            .map(|(name, value)| name.parse::<CaptureProperty>().map(|prop| (prop, *value)))
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let config = Self {
            video_source,
            dictionary,
            marker_size,
            pose_mode,
            capture_properties,
        };
        log::debug!(
            "resolved tracker configuration: source={}, dictionary={}, marker_size={}, calibrated={}",
            config.video_source,
            config.dictionary.name,
            config.marker_size,
            config.is_calibrated()
        );
        Ok(config)
    }

    /// Resolve a JSON object bundle.
    pub fn from_value(value: &Value) -> Result<Self, TrackerError> {
        let options = TrackerOptions::deserialize(value).map_err(ValidationError::Options)?;
        Self::resolve(options)
    }

    /// Load a JSON option bundle from disk.
    ///
    /// A relative `calibration` path is taken relative to the bundle's
    /// directory.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, TrackerError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&raw)?;
        let mut options = TrackerOptions::deserialize(&value).map_err(ValidationError::Options)?;
        if let (Some(cal), Some(dir)) = (options.calibration.as_mut(), path.parent()) {
            if cal.is_relative() {
                *cal = dir.join(&*cal);
            }
        }
        Self::resolve(options)
    }

    pub fn video_source(&self) -> &VideoSource {
        &self.video_source
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn marker_size(&self) -> f64 {
        self.marker_size
    }

    pub fn pose_mode(&self) -> &PoseMode {
        &self.pose_mode
    }

    #[inline]
    pub fn is_calibrated(&self) -> bool {
        self.pose_mode.is_calibrated()
    }

    pub fn capture_properties(&self) -> &[(CaptureProperty, f64)] {
        &self.capture_properties
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn describe_shape(value: &Value) -> String {
    match value {
        Value::Array(rows) => {
            let lens: Vec<String> = rows
                .iter()
                .map(|row| match row {
                    Value::Array(cols) => cols.len().to_string(),
                    _ => "scalar".to_owned(),
                })
                .collect();
            format!("{} rows [{}]", rows.len(), lens.join(", "))
        }
        other => json_type(other).to_owned(),
    }
}

fn parse_intrinsics(value: &Value) -> Result<Matrix3<f64>, ValidationError> {
    let shape_err = || ValidationError::IntrinsicsShape {
        shape: describe_shape(value),
    };
    let rows = value.as_array().ok_or_else(shape_err)?;
    if rows.len() != 3 {
        return Err(shape_err());
    }
    let mut k = Matrix3::zeros();
    for (r, row) in rows.iter().enumerate() {
        let cols = row.as_array().filter(|c| c.len() == 3).ok_or_else(shape_err)?;
        for (c, entry) in cols.iter().enumerate() {
            k[(r, c)] = entry.as_f64().ok_or_else(|| ValidationError::NonRealEntry {
                field: INTRINSICS_FIELD,
                index: format!("({r}, {c})"),
                found: json_type(entry),
            })?;
        }
    }
    Ok(k)
}

/// Accepts `[k1, k2, p1, p2, k3]` or the `1x5` nesting `[[k1, ...]]`.
fn parse_distortion(value: &Value) -> Result<[f64; 5], ValidationError> {
    let entries: Vec<&Value> = match value {
        Value::Array(items) => match items.as_slice() {
            [Value::Array(inner)] => inner.iter().collect(),
            _ => items.iter().collect(),
        },
        scalar => vec![scalar],
    };
    let coefficients = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            entry.as_f64().ok_or_else(|| ValidationError::NonRealEntry {
                field: DISTORTION_FIELD,
                index: i.to_string(),
                found: json_type(entry),
            })
        })
        .collect::<Result<Vec<f64>, _>>()?;
    <[f64; 5]>::try_from(coefficients.as_slice()).map_err(|_| ValidationError::DistortionLength {
        len: coefficients.len(),
    })
}
