//! Core types shared by the ArUco tracker crates.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! know about capture devices, dictionaries or the tracker state machine:
//! - grayscale raster frames ([`GrayImage`], [`GrayImageView`]),
//! - the 4-point homography used by the planar pose solver,
//! - the pinhole camera model with Brown–Conrady distortion,
//! - logger installation helpers.

mod camera;
mod homography;
mod image;
mod logger;

pub use camera::{BrownConrady5, CameraCalibration, CameraModelError};
pub use homography::{homography_from_4pt, Homography};
pub use image::{GrayImage, GrayImageView, ImageShapeError};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
