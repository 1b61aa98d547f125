//! CSV tables.
//!
//! - row 1: banner (`HTPA 32x32d`), kept for older readers
//! - row 2: `Time (sec),PTAT,P0000,P0001,...`
//! - one row per frame: timestamp, PTAT placeholder, pixels
//!   in row-major order
use std::{fs::File, io::BufWriter, path::Path};

use csv::{ReaderBuilder, WriterBuilder};
use lazy_static::lazy_static;
use regex::Regex;

use super::Recording;
use crate::{
    error::{Error, Result},
    frames::{flatten_frames, reshape_flattened_frames},
};

const BANNER: &str = "HTPA 32x32d";
const TIME_COLUMN: &str = "Time (sec)";
const PTAT_COLUMN: &str = "PTAT";

lazy_static! {
    static ref PIXEL_COLUMN: Regex = Regex::new(r"^P\d+$").unwrap();
}

pub fn read(path: &Path) -> Result<Recording> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut records = rdr.records();

    // banner
    records
        .next()
        .transpose()?
        .ok_or_else(|| Error::codec(path, "empty file"))?;
    let header = records
        .next()
        .transpose()?
        .ok_or_else(|| Error::codec(path, "missing header row"))?;

    let time_col = header
        .iter()
        .position(|h| h == TIME_COLUMN)
        .ok_or_else(|| Error::codec(path, format!("missing `{}` column", TIME_COLUMN)))?;
    let pixel_cols: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| PIXEL_COLUMN.is_match(h))
        .map(|(i, _)| i)
        .collect();

    let parse_field = |record: &csv::StringRecord, col: usize, row: usize| -> Result<f64> {
        let field = record
            .get(col)
            .ok_or_else(|| Error::codec(path, format!("row {}: missing column {}", row, col)))?;
        field
            .trim()
            .parse()
            .map_err(|_| Error::codec(path, format!("row {}: not a number: `{}`", row, field)))
    };

    let mut pixels = Vec::new();
    let mut timestamps = Vec::new();
    for (idx, record) in records.enumerate() {
        let record = record?;
        let row = idx + 3;
        timestamps.push(parse_field(&record, time_col, row)?);
        for &col in &pixel_cols {
            pixels.push(parse_field(&record, col, row)? as f32);
        }
    }

    let flat = ndarray::Array2::from_shape_vec((timestamps.len(), pixel_cols.len()), pixels)
        .map_err(|e| Error::shape(e.to_string()))?;
    Recording::new(reshape_flattened_frames(flat)?, timestamps)
}

pub fn write(path: &Path, recording: &Recording) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .flexible(true)
        .from_writer(BufWriter::new(File::create(path)?));

    wtr.write_record(&[BANNER])?;

    let (height, width) = recording.frame_shape();
    let mut header = vec![TIME_COLUMN.to_string(), PTAT_COLUMN.to_string()];
    header.extend((0..height * width).map(|i| format!("P{:04}", i)));
    wtr.write_record(&header)?;

    let flat = flatten_frames(recording.frames());
    for (row, t) in flat.outer_iter().zip(recording.timestamps()) {
        let mut fields = Vec::with_capacity(row.len() + 2);
        fields.push(t.to_string());
        fields.push(f32::INFINITY.to_string());
        fields.extend(row.iter().map(|v| v.to_string()));
        wtr.write_record(&fields)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;

    #[test]
    fn reads_legacy_layout() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sID2.csv");
        fs::write(
            &path,
            "HTPA 32x32d\nTime (sec),PTAT,P0000,P0001,P0002,P0003\n\
             0.0,inf,20.5,21.0,22.0,23.25\n0.1,inf,1,2,3,4\n",
        )?;
        let rec = read(&path)?;
        assert_eq!(rec.frame_shape(), (2, 2));
        assert_eq!(rec.timestamps(), &[0.0, 0.1]);
        assert_eq!(rec.frames()[[0, 1, 1]], 23.25);
        assert_eq!(rec.frames()[[1, 1, 0]], 3.0);
        Ok(())
    }

    #[test]
    fn rejects_non_square_pixel_count() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sID2.csv");
        fs::write(
            &path,
            "HTPA 32x32d\nTime (sec),PTAT,P0000,P0001,P0002\n0.0,inf,1,2,3\n",
        )?;
        assert!(matches!(read(&path), Err(Error::ShapeMismatch(_))));
        Ok(())
    }

    #[test]
    fn writes_banner_and_header() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sID2.csv");
        let rec = crate::codec::tests::ramp(1, 2, 0.5, 0.1);
        write(&path, &rec)?;
        let text = fs::read_to_string(&path)?;
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("HTPA 32x32d"));
        assert_eq!(lines.next(), Some("Time (sec),PTAT,P0000,P0001,P0002,P0003"));
        assert_eq!(lines.next(), Some("0.5,inf,20,20.25,20.5,20.75"));
        Ok(())
    }
}
