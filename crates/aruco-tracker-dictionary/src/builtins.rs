//! Built-in dictionary registry.
//!
//! Names follow the OpenCV `cv2.aruco.DICT_*` constants so that option
//! bundles written for OpenCV-based tooling resolve unchanged.

use crate::{Dictionary, DictionaryFamily};

const fn aruco(name: &'static str, marker_size: usize, marker_count: u32) -> Dictionary {
    Dictionary {
        name,
        family: DictionaryFamily::Aruco,
        marker_size,
        marker_count,
    }
}

const fn apriltag(name: &'static str, marker_size: usize, marker_count: u32) -> Dictionary {
    Dictionary {
        name,
        family: DictionaryFamily::AprilTag,
        marker_size,
        marker_count,
    }
}

pub const DICT_4X4_50: Dictionary = aruco("DICT_4X4_50", 4, 50);
pub const DICT_4X4_100: Dictionary = aruco("DICT_4X4_100", 4, 100);
pub const DICT_4X4_250: Dictionary = aruco("DICT_4X4_250", 4, 250);
pub const DICT_4X4_1000: Dictionary = aruco("DICT_4X4_1000", 4, 1000);
pub const DICT_5X5_50: Dictionary = aruco("DICT_5X5_50", 5, 50);
pub const DICT_5X5_100: Dictionary = aruco("DICT_5X5_100", 5, 100);
pub const DICT_5X5_250: Dictionary = aruco("DICT_5X5_250", 5, 250);
pub const DICT_5X5_1000: Dictionary = aruco("DICT_5X5_1000", 5, 1000);
pub const DICT_6X6_50: Dictionary = aruco("DICT_6X6_50", 6, 50);
pub const DICT_6X6_100: Dictionary = aruco("DICT_6X6_100", 6, 100);
pub const DICT_6X6_250: Dictionary = aruco("DICT_6X6_250", 6, 250);
pub const DICT_6X6_1000: Dictionary = aruco("DICT_6X6_1000", 6, 1000);
pub const DICT_7X7_50: Dictionary = aruco("DICT_7X7_50", 7, 50);
pub const DICT_7X7_100: Dictionary = aruco("DICT_7X7_100", 7, 100);
pub const DICT_7X7_250: Dictionary = aruco("DICT_7X7_250", 7, 250);
pub const DICT_7X7_1000: Dictionary = aruco("DICT_7X7_1000", 7, 1000);

pub const DICT_ARUCO_ORIGINAL: Dictionary = Dictionary {
    name: "DICT_ARUCO_ORIGINAL",
    family: DictionaryFamily::ArucoOriginal,
    marker_size: 5,
    marker_count: 1024,
};

pub const DICT_ARUCO_MIP_36H12: Dictionary = Dictionary {
    name: "DICT_ARUCO_MIP_36h12",
    family: DictionaryFamily::ArucoMip,
    marker_size: 6,
    marker_count: 250,
};

pub const DICT_APRILTAG_16H5: Dictionary = apriltag("DICT_APRILTAG_16h5", 4, 30);
pub const DICT_APRILTAG_25H9: Dictionary = apriltag("DICT_APRILTAG_25h9", 5, 35);
pub const DICT_APRILTAG_36H10: Dictionary = apriltag("DICT_APRILTAG_36h10", 6, 2320);
pub const DICT_APRILTAG_36H11: Dictionary = apriltag("DICT_APRILTAG_36h11", 6, 587);

/// Dictionary used when an option bundle names none.
pub const DEFAULT_DICTIONARY: Dictionary = DICT_4X4_50;

/// Every registered dictionary, in registry order.
pub const BUILTIN_DICTIONARIES: &[Dictionary] = &[
    DICT_4X4_50,
    DICT_4X4_100,
    DICT_4X4_250,
    DICT_4X4_1000,
    DICT_5X5_50,
    DICT_5X5_100,
    DICT_5X5_250,
    DICT_5X5_1000,
    DICT_6X6_50,
    DICT_6X6_100,
    DICT_6X6_250,
    DICT_6X6_1000,
    DICT_7X7_50,
    DICT_7X7_100,
    DICT_7X7_250,
    DICT_7X7_1000,
    DICT_ARUCO_ORIGINAL,
    DICT_APRILTAG_16H5,
    DICT_APRILTAG_25H9,
    DICT_APRILTAG_36H10,
    DICT_APRILTAG_36H11,
    DICT_ARUCO_MIP_36H12,
];

/// Look up a dictionary by its exact registry name.
pub fn builtin_dictionary(name: &str) -> Option<Dictionary> {
    BUILTIN_DICTIONARIES.iter().copied().find(|d| d.name == name)
}

/// Names of all registered dictionaries.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_DICTIONARIES.iter().map(|d| d.name)
}
