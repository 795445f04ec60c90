//! Camera calibration files.
//!
//! Two formats are accepted. A `.json` file holds
//! `{"camera_matrix": [[..],[..],[..]], "distortion": [k1, k2, p1, p2, k3]}`
//! with `distortion` optional. Any other extension is read as plain text:
//! three rows of the 3x3 matrix, then an optional row of five distortion
//! coefficients. Blank lines and `#` comments are skipped.

use std::fs;
use std::path::Path;

use aruco_tracker_core::CameraCalibration;
use nalgebra::Matrix3;
use serde::Deserialize;

use crate::error::{TrackerError, ValidationError};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CalibrationJson {
    camera_matrix: [[f64; 3]; 3],
    #[serde(default)]
    distortion: Option<[f64; 5]>,
}

/// Load intrinsics and distortion from `path`.
pub fn load_calibration(path: impl AsRef<Path>) -> Result<CameraCalibration, TrackerError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    let calibration = if is_json {
        parse_json(&raw, path)?
    } else {
        parse_text(&raw, path)?
    };
    log::debug!("loaded camera calibration from {}", path.display());
    Ok(calibration)
}

fn malformed(path: &Path, reason: impl Into<String>) -> ValidationError {
    ValidationError::CalibrationFile {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn parse_json(raw: &str, path: &Path) -> Result<CameraCalibration, ValidationError> {
    let parsed: CalibrationJson =
        serde_json::from_str(raw).map_err(|e| malformed(path, e.to_string()))?;
    let k = Matrix3::from_fn(|r, c| parsed.camera_matrix[r][c]);
    Ok(CameraCalibration::new(
        k,
        parsed.distortion.unwrap_or([0.0; 5]),
    )?)
}

fn parse_text(raw: &str, path: &Path) -> Result<CameraCalibration, ValidationError> {
    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let row = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|tok| !tok.is_empty())
            .map(|tok| {
                tok.parse::<f64>().map_err(|_| {
                    malformed(path, format!("line {}: `{tok}` is not a number", line_no + 1))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }

    if rows.len() < 3 || rows.len() > 4 {
        return Err(malformed(
            path,
            format!("expected 3 matrix rows and an optional distortion row, got {} rows", rows.len()),
        ));
    }
    for (i, row) in rows[..3].iter().enumerate() {
        if row.len() != 3 {
            return Err(malformed(
                path,
                format!("matrix row {i} has {} values, expected 3", row.len()),
            ));
        }
    }
    let k = Matrix3::from_fn(|r, c| rows[r][c]);

    let distortion = match rows.get(3) {
        Some(row) => <[f64; 5]>::try_from(row.as_slice())
            .map_err(|_| ValidationError::DistortionLength { len: row.len() })?,
        None => [0.0; 5],
    };
    Ok(CameraCalibration::new(k, distortion)?)
}
