//! Dictionary metadata.

use serde::{Serialize, Serializer};

/// Marker family a dictionary belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionaryFamily {
    Aruco,
    ArucoOriginal,
    ArucoMip,
    AprilTag,
}

/// A fixed ArUco/AprilTag-style dictionary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dictionary {
    /// Registry name, e.g. `DICT_4X4_50`.
    pub name: &'static str,
    pub family: DictionaryFamily,
    /// Marker side length (number of inner bits per side).
    pub marker_size: usize,
    /// Number of distinct marker ids.
    pub marker_count: u32,
}

impl Dictionary {
    /// Total number of inner bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    /// Whether `id` is a valid marker id for this dictionary.
    #[inline]
    pub fn contains_id(&self, id: u32) -> bool {
        id < self.marker_count
    }
}

impl Serialize for Dictionary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}
