//! Readers and writers for HTPA recordings.
//!
//! Every encoding stores the same pair: a `[frames, height,
//! width]` array of temperatures in degrees celsius and one
//! timestamp (seconds) per frame. The encoding is chosen by
//! the file extension, see [`Format::from_extension`].
use std::{fs, path::Path};

use ndarray::{Array3, Axis};

use crate::error::{Error, Result};

mod binary;
mod table;
pub mod txt;

/// Side length of the HTPA32x32d array, assumed when
/// reading text dumps.
pub const DEFAULT_ARRAY_SIZE: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Heimann HTPA text dump (`*.txt`).
    Txt,
    /// One row per frame with a time and a PTAT column.
    Csv,
    /// Little-endian binary container, registered under the
    /// extensions previously used for pickled arrays.
    Binary,
}

impl Format {
    pub const EXTENSIONS: &'static [&'static str] = &["txt", "csv", "pickle", "pkl", "p"];

    /// Looks up the encoding for a file extension
    /// (case-insensitive, leading `.` optional).
    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "txt" => Ok(Format::Txt),
            "csv" => Ok(Format::Csv),
            "pickle" | "pkl" | "p" => Ok(Format::Binary),
            _ => Err(Error::UnsupportedFormat(ext.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::UnsupportedFormat(format!("{}", path.display())))?;
        Self::from_extension(ext)
    }
}

/// A sequence of temperature frames paired 1:1 with
/// timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    frames: Array3<f32>,
    timestamps: Vec<f64>,
}

impl Recording {
    pub fn new(frames: Array3<f32>, timestamps: Vec<f64>) -> Result<Self> {
        if frames.len_of(Axis(0)) != timestamps.len() {
            return Err(Error::shape(format!(
                "{} frames but {} timestamps",
                frames.len_of(Axis(0)),
                timestamps.len()
            )));
        }
        Ok(Recording { frames, timestamps })
    }

    pub fn frames(&self) -> &Array3<f32> {
        &self.frames
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// `(height, width)` of every frame.
    pub fn frame_shape(&self) -> (usize, usize) {
        let (_, height, width) = self.frames.dim();
        (height, width)
    }

    pub fn into_parts(self) -> (Array3<f32>, Vec<f64>) {
        (self.frames, self.timestamps)
    }

    /// Picks frames and timestamps at `indices`, in order.
    /// Indices may repeat.
    ///
    /// Panics if an index is out of bounds.
    pub fn select(&self, indices: &[usize]) -> Recording {
        Recording {
            frames: self.frames.select(Axis(0), indices),
            timestamps: indices.iter().map(|&i| self.timestamps[i]).collect(),
        }
    }

    pub(crate) fn shift_timestamps(&mut self, offset: f64) {
        for t in self.timestamps.iter_mut() {
            *t += offset;
        }
    }
}

/// Reads a recording, picking the decoder from the file
/// extension.
pub fn read_tpa_file<P: AsRef<Path>>(path: P) -> Result<Recording> {
    let path = path.as_ref();
    match Format::from_path(path)? {
        Format::Txt => txt::read(path, DEFAULT_ARRAY_SIZE),
        Format::Csv => table::read(path),
        Format::Binary => binary::read(path),
    }
}

/// Writes a recording, picking the encoder from the file
/// extension. Missing parent directories are created.
pub fn write_tpa_file<P: AsRef<Path>>(path: P, recording: &Recording) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    match format {
        Format::Txt => txt::write(path, recording),
        Format::Csv => table::write(path, recording),
        Format::Binary => binary::write(path, recording),
    }
}
