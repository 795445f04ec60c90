//! Predefined ArUco/AprilTag dictionaries.
//!
//! This crate only names and describes dictionaries: family, bit grid size
//! and number of markers. Decoding marker bits is the job of whatever
//! [`MarkerDetector`](https://docs.rs/aruco-tracker) backend the tracker is
//! given; the backend receives the resolved [`Dictionary`] with every frame.

pub mod builtins;
mod dictionary;

pub use builtins::{builtin_dictionary, builtin_names, DEFAULT_DICTIONARY};
pub use dictionary::{Dictionary, DictionaryFamily};
