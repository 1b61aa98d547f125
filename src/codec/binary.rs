//! Binary container.
//!
//! # Layout (little endian)
//!
//! - 0x0: magic: "HTPA"
//! - 0x4: u32 frame count
//! - 0x8: u32 height
//! - 0xc: u32 width
//! - 0x10: f32 pixels, `[frames, height, width]` row-major
//! - then: f64 timestamps, one per frame
use std::{
    convert::TryFrom,
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
};

use byteordered::ByteOrdered;
use ndarray::Array3;

use super::Recording;
use crate::error::{Error, Result};

const MAGIC: &[u8; 4] = b"HTPA";

pub fn write(path: &Path, recording: &Recording) -> Result<()> {
    let (frames, height, width) = recording.frames().dim();
    let dim = |v: usize| {
        u32::try_from(v).map_err(|_| Error::shape(format!("dimension {} exceeds u32", v)))
    };

    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(MAGIC)?;
    let mut out = ByteOrdered::le(out);
    out.write_u32(dim(frames)?)?;
    out.write_u32(dim(height)?)?;
    out.write_u32(dim(width)?)?;
    for &val in recording.frames().iter() {
        out.write_f32(val)?;
    }
    for &t in recording.timestamps() {
        out.write_f64(t)?;
    }
    out.into_inner().flush()?;
    Ok(())
}

pub fn read(path: &Path) -> Result<Recording> {
    let mut rdr = BufReader::new(File::open(path)?);
    let mut magic = [0u8; 4];
    rdr.read_exact(&mut magic).map_err(|e| truncated(path, e))?;
    if &magic != MAGIC {
        return Err(Error::codec(path, "not an HTPA binary recording"));
    }

    let mut rdr = ByteOrdered::le(rdr);
    let mut dim = || -> Result<usize> {
        Ok(rdr.read_u32().map_err(|e| truncated(path, e))? as usize)
    };
    let (frames, height, width) = (dim()?, dim()?, dim()?);
    let num_values = frames
        .checked_mul(height)
        .and_then(|v| v.checked_mul(width))
        .ok_or_else(|| Error::codec(path, "header dimensions overflow"))?;

    let mut pixels = Vec::with_capacity(num_values.min(1 << 20));
    for _ in 0..num_values {
        pixels.push(rdr.read_f32().map_err(|e| truncated(path, e))?);
    }
    let mut timestamps = Vec::with_capacity(frames.min(1 << 20));
    for _ in 0..frames {
        timestamps.push(rdr.read_f64().map_err(|e| truncated(path, e))?);
    }

    let frames = Array3::from_shape_vec((frames, height, width), pixels)
        .map_err(|e| Error::shape(e.to_string()))?;
    Recording::new(frames, timestamps)
}

fn truncated(path: &Path, e: io::Error) -> Error {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        Error::codec(path, "unexpected end of file")
    } else {
        Error::Io(e)
    }
}
