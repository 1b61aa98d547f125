//! Heimann HTPA text dumps.
//!
//! The first line is a header naming the sensor, e.g.
//! `HTPA32x32d`. Every following line holds one frame: the
//! pixel values as integers in hundredths of a degree,
//! column-major and rotated a quarter turn counter-clockwise
//! with respect to the array we expose, then any number of
//! extra tokens, and the timestamp as the last token
//! (written as `t: <seconds>`).
use std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use lazy_static::lazy_static;
use ndarray::Array3;
use regex::Regex;

use super::Recording;
use crate::error::{Error, Result};

/// Stored values are hundredths of a degree.
const SCALE: f32 = 100.;

lazy_static! {
    static ref HEADER: Regex = Regex::new(r"^HTPA(\d+)x(\d+)").unwrap();
}

/// Array side length announced by the header line, if it is
/// a square array.
fn header_size(header: &str) -> Option<usize> {
    let caps = HEADER.captures(header.trim())?;
    let height: usize = caps[1].parse().ok()?;
    let width: usize = caps[2].parse().ok()?;
    (height == width).then(|| height)
}

/// Decodes one frame line into pixels (row-major, already
/// rotated) and the timestamp.
fn decode_line(line: &str, size: usize) -> std::result::Result<(Vec<f32>, f64), String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let num_pixels = size * size;
    if tokens.len() <= num_pixels {
        return Err(format!(
            "expected at least {} tokens, found {}",
            num_pixels + 1,
            tokens.len()
        ));
    }

    let mut pixels = vec![0f32; num_pixels];
    for (k, token) in tokens[..num_pixels].iter().enumerate() {
        let raw: i64 = token
            .parse()
            .map_err(|_| format!("pixel {} is not an integer: `{}`", k, token))?;
        // token k sits at (k % size, k / size) before the
        // clockwise quarter turn
        let (row, col) = (k / size, size - 1 - k % size);
        pixels[row * size + col] = raw as f32 / SCALE;
    }

    let last = tokens[tokens.len() - 1];
    let timestamp = last
        .parse()
        .map_err(|_| format!("timestamp is not a number: `{}`", last))?;
    Ok((pixels, timestamp))
}

/// Reads a text dump. The array size comes from the header
/// when it names one, else `default_size` is assumed.
pub fn read(path: &Path, default_size: usize) -> Result<Recording> {
    let mut lines = BufReader::new(File::open(path)?).lines();
    let size = match lines.next() {
        Some(header) => header_size(&header?).unwrap_or(default_size),
        None => return Err(Error::codec(path, "empty file")),
    };

    let mut pixels = vec![];
    let mut timestamps = vec![];
    for (idx, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (frame, t) = decode_line(&line, size)
            .map_err(|e| Error::codec(path, format!("line {}: {}", idx + 2, e)))?;
        pixels.extend(frame);
        timestamps.push(t);
    }

    let frames = Array3::from_shape_vec((timestamps.len(), size, size), pixels)
        .map_err(|e| Error::shape(e.to_string()))?;
    Recording::new(frames, timestamps)
}

/// Writes a text dump. Frames must be square.
pub fn write(path: &Path, recording: &Recording) -> Result<()> {
    let (height, width) = recording.frame_shape();
    if height != width {
        return Err(Error::shape(format!(
            "text dumps hold square frames, got {}x{}",
            height, width
        )));
    }
    let size = height;

    let mut out = BufWriter::new(File::create(path)?);
    writeln!(out, "HTPA{}x{}d", size, size)?;
    for (frame, t) in recording
        .frames()
        .outer_iter()
        .zip(recording.timestamps())
    {
        for k in 0..size * size {
            let value = frame[[k / size, size - 1 - k % size]];
            write!(out, "{} ", (value * SCALE).round() as i64)?;
        }
        writeln!(out, "t: {}", t)?;
    }
    out.flush()?;
    Ok(())
}

/// Locates the first line of a text dump that cannot be
/// decoded. Returns its 1-based line number (the header is
/// line 1), or `None` if the whole file decodes.
pub fn first_malformed_line(path: &Path, default_size: usize) -> Result<Option<usize>> {
    let mut lines = BufReader::new(File::open(path)?).lines();
    let size = match lines.next() {
        Some(header) => header_size(&header?).unwrap_or(default_size),
        None => return Ok(None),
    };
    for (idx, line) in lines.enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Err(e) = decode_line(&line, size) {
            tracing::debug!(path = %path.display(), line = idx + 2, "{}", e);
            return Ok(Some(idx + 2));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use ndarray::array;
    use std::fs;

    #[test]
    fn header_announces_size() {
        assert_eq!(header_size("HTPA32x32d"), Some(32));
        assert_eq!(header_size("HTPA8x8d"), Some(8));
        assert_eq!(header_size("HTPA32x16d"), None);
        assert_eq!(header_size("something else"), None);
    }

    #[test]
    fn decodes_column_major_rotated() {
        // column-major 2x2 [[a, c], [b, d]] rotated clockwise is
        // [[b, a], [d, c]]
        let (pixels, t) = decode_line("100 200 300 400 1 2 t: 0.5", 2).unwrap();
        assert_eq!(pixels, vec![2., 1., 4., 3.]);
        assert_eq!(t, 0.5);
    }

    #[test]
    fn writes_what_it_reads() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("aID0.txt");
        fs::write(&path, "HTPA2x2d\n100 200 300 400 t: 0.5\n150 250 350 450 t: 0.6\n")?;

        let rec = read(&path, 32)?;
        assert_eq!(rec.frames().slice(ndarray::s![0, .., ..]), array![[2f32, 1.], [4., 3.]]);
        assert_eq!(rec.timestamps(), &[0.5, 0.6]);

        let copy = dir.path().join("bID0.txt");
        write(&copy, &rec)?;
        assert_eq!(
            fs::read_to_string(&copy)?,
            "HTPA2x2d\n100 200 300 400 t: 0.5\n150 250 350 450 t: 0.6\n"
        );
        Ok(())
    }

    #[test]
    fn rejects_non_square_frames() {
        let rec = Recording::new(Array3::zeros((1, 2, 3)), vec![0.]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let err = write(&dir.path().join("x.txt"), &rec).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn locates_malformed_line() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("bad.txt");
        fs::write(
            &path,
            "HTPA2x2d\n100 200 300 400 t: 0.5\n100 2x0 300 400 t: 0.6\n",
        )?;
        assert_eq!(first_malformed_line(&path, 32)?, Some(3));
        assert!(read(&path, 32).is_err());

        fs::write(&path, "HTPA2x2d\n100 200 300 400 t: 0.5\n")?;
        assert_eq!(first_malformed_line(&path, 32)?, None);
        Ok(())
    }
}
