//! Capture device reading still images from disk.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use ::image::{ImageFormat, ImageReader};
use aruco_tracker_core::GrayImage;

use crate::capture::{CaptureDevice, VideoSource};

/// Serves image files as frames.
///
/// A [`VideoSource::Path`] naming a file yields that one frame; naming a
/// directory yields every decodable image in it, sorted by file name. Device
/// indices cannot be opened.
#[derive(Debug, Default)]
pub struct ImageFileCapture {
    pending: VecDeque<PathBuf>,
}

impl ImageFileCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

fn is_image_file(path: &Path) -> bool {
    path.is_file() && ImageFormat::from_path(path).is_ok()
}

fn list_images(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if is_image_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn decode(path: &Path) -> Option<GrayImage> {
    let img = ImageReader::open(path).ok()?.decode().ok()?;
    Some(GrayImage::from(img.to_luma8()))
}

impl CaptureDevice for ImageFileCapture {
    fn open(&mut self, source: &VideoSource) -> bool {
        let VideoSource::Path(path) = source else {
            return false;
        };
        let files = if path.is_dir() {
            match list_images(path) {
                Ok(files) => files,
                Err(_) => return false,
            }
        } else if is_image_file(path) {
            vec![path.clone()]
        } else {
            return false;
        };
        log::debug!("{} image frame(s) queued from {}", files.len(), path.display());
        self.pending = files.into();
        !self.pending.is_empty()
    }

    fn read(&mut self) -> Option<GrayImage> {
        let path = self.pending.pop_front()?;
        log::trace!("decoding {}", path.display());
        decode(&path)
    }

    fn release(&mut self) {
        self.pending.clear();
    }
}
