//! Multi-view samples: the per-view recordings of one
//! session.
//!
//! A sample is either backed by the files it was read from,
//! in which case it is read-only, or by data handed to
//! [`Sample::from_data`], in which case it can be aligned
//! and written to new files.
use std::path::{Path, PathBuf};

use itertools::Itertools;

use crate::{
    codec::{read_tpa_file, write_tpa_file, Recording},
    error::{Error, Result},
    matching::match_timesteps,
    naming::{sample_file_name, view_id_of},
};

#[derive(Debug, Clone)]
enum Backing {
    /// Input files; never written back.
    Files(Vec<PathBuf>),
    /// Owned data with optional destination files.
    Data { destinations: Option<Vec<PathBuf>> },
}

#[derive(Debug, Clone)]
pub struct Sample {
    ids: Vec<String>,
    recordings: Vec<Recording>,
    backing: Backing,
}

impl Sample {
    /// Reads one recording per path. The view id of each path
    /// is the suffix after the last `ID` of its file stem.
    pub fn from_filepaths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let paths: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        let ids = paths
            .iter()
            .map(|p| {
                view_id_of(p).ok_or_else(|| Error::codec(p, "file name carries no `ID` view suffix"))
            })
            .collect::<Result<Vec<_>>>()?;
        let recordings = paths.iter().map(read_tpa_file).collect::<Result<Vec<_>>>()?;
        Ok(Sample {
            ids,
            recordings,
            backing: Backing::Files(paths),
        })
    }

    /// Builds a mutable sample from copies of `recordings`
    /// and `ids`, optionally with one destination path per
    /// view.
    pub fn from_data(
        recordings: &[Recording],
        ids: &[String],
        destinations: Option<Vec<PathBuf>>,
    ) -> Result<Self> {
        if recordings.len() != ids.len() {
            return Err(Error::shape(format!(
                "{} recordings for {} view ids",
                recordings.len(),
                ids.len()
            )));
        }
        if let Some(paths) = &destinations {
            if paths.len() != ids.len() {
                return Err(Error::shape(format!(
                    "{} destination paths for {} view ids",
                    paths.len(),
                    ids.len()
                )));
            }
        }
        Ok(Sample {
            ids: ids.to_vec(),
            recordings: recordings.to_vec(),
            backing: Backing::Data { destinations },
        })
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }

    pub fn timestamps(&self) -> impl Iterator<Item = &[f64]> + Clone {
        self.recordings.iter().map(|r| r.timestamps())
    }

    /// Source files of a file-backed sample, or destinations
    /// of a data-backed one (if set).
    pub fn filepaths(&self) -> Option<&[PathBuf]> {
        match &self.backing {
            Backing::Files(paths) => Some(paths),
            Backing::Data { destinations } => destinations.as_deref(),
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self.backing, Backing::Files(_))
    }

    fn destinations_mut(&mut self, operation: &'static str) -> Result<&mut Option<Vec<PathBuf>>> {
        match &mut self.backing {
            Backing::Files(_) => Err(Error::ReadOnly(operation)),
            Backing::Data { destinations } => Ok(destinations),
        }
    }

    /// Sets the destinations to
    /// `{parent_dir}/{prefix}ID{view_id}.{extension}`.
    pub fn make_filepaths<P: AsRef<Path>>(
        &mut self,
        parent_dir: P,
        prefix: &str,
        extension: &str,
    ) -> Result<()> {
        let paths = self
            .ids
            .iter()
            .map(|id| parent_dir.as_ref().join(sample_file_name(prefix, id, extension)))
            .collect();
        *self.destinations_mut("make_filepaths")? = Some(paths);
        Ok(())
    }

    /// Re-indexes every view by [`match_timesteps`], so all
    /// views end up with the length of the shortest one.
    ///
    /// With `reset_t0`, the earliest first timestamp among the
    /// views is subtracted from every view, keeping the
    /// offsets between views.
    pub fn align_timesteps(&mut self, reset_t0: bool) -> Result<()> {
        self.destinations_mut("align_timesteps")?;

        let indices = match_timesteps(&self.timestamps().collect::<Vec<_>>())?;
        self.recordings = self
            .recordings
            .iter()
            .zip(&indices)
            .map(|(rec, idx)| rec.select(idx))
            .collect();

        if reset_t0 {
            let t0 = self
                .recordings
                .iter()
                .filter_map(|r| r.timestamps().first().copied())
                .fold(f64::INFINITY, f64::min);
            if t0.is_finite() {
                for rec in self.recordings.iter_mut() {
                    rec.shift_timestamps(-t0);
                }
            }
        }
        Ok(())
    }

    /// Writes every view to its destination.
    pub fn write(&self) -> Result<()> {
        let paths = match &self.backing {
            Backing::Files(_) => return Err(Error::ReadOnly("write")),
            Backing::Data {
                destinations: Some(paths),
            } => paths,
            Backing::Data { destinations: None } => {
                return Err(Error::precondition(
                    "sample has no destination paths; call `make_filepaths` first",
                ))
            }
        };
        for (path, rec) in paths.iter().zip(&self.recordings) {
            write_tpa_file(path, rec)?;
        }
        Ok(())
    }

    /// Whether all views have the same number of frames.
    pub fn test_alignment(&self) -> bool {
        self.recordings.iter().map(|r| r.len()).all_equal()
    }

    /// Whether, for every pair of views, timestamps at the
    /// same index differ by at most `max_error` seconds.
    /// Views of different lengths are never synchronized.
    pub fn test_synchronization(&self, max_error: f64) -> bool {
        self.timestamps().tuple_combinations().all(|(a, b)| {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() <= max_error)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tests::ramp;
    use anyhow::Result;

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn unaligned() -> Sample {
        let a = ramp(5, 2, 10.0, 0.1);
        let b = ramp(8, 2, 10.04, 0.07);
        let c = ramp(6, 2, 9.98, 0.09);
        Sample::from_data(&[a, b, c], &ids(&["0", "1", "2"]), None).unwrap()
    }

    #[test]
    fn alignment_equalizes_lengths() -> Result<()> {
        let mut sample = unaligned();
        assert!(!sample.test_alignment());
        sample.align_timesteps(false)?;
        assert!(sample.test_alignment());
        assert!(sample.recordings().iter().all(|r| r.len() == 5));
        assert_eq!(sample.recordings()[0].timestamps()[0], 10.0);
        Ok(())
    }

    #[test]
    fn reset_t0_keeps_offsets() -> Result<()> {
        let mut sample = unaligned();
        sample.align_timesteps(true)?;
        let firsts: Vec<f64> = sample.timestamps().map(|ts| ts[0]).collect();
        let min = firsts.iter().cloned().fold(f64::INFINITY, f64::min);
        assert_eq!(min, 0.0);
        // view 2 started 0.02 s before view 0
        assert!((firsts[0] - 0.02).abs() < 1e-9);
        assert!(sample.test_synchronization(0.1));
        assert!(!sample.test_synchronization(0.001));
        Ok(())
    }

    #[test]
    fn any_aligned_sample_passes_alignment() -> Result<()> {
        for seed in 0..100 {
            let recordings: Vec<Recording> = crate::matching::tests::generated_streams(seed)
                .into_iter()
                .map(|ts| {
                    let frames = ndarray::Array3::zeros((ts.len(), 2, 2));
                    Recording::new(frames, ts)
                })
                .collect::<crate::error::Result<_>>()?;
            let view_ids: Vec<String> = (0..recordings.len()).map(|i| i.to_string()).collect();

            let mut sample = Sample::from_data(&recordings, &view_ids, None)?;
            sample.align_timesteps(true)?;
            assert!(sample.test_alignment(), "seed {}", seed);
            let t0 = sample
                .timestamps()
                .map(|ts| ts[0])
                .fold(f64::INFINITY, f64::min);
            assert_eq!(t0, 0.0, "seed {}", seed);
        }
        Ok(())
    }

    #[test]
    fn from_data_copies_inputs() -> Result<()> {
        let original = vec![ramp(3, 2, 0., 1.), ramp(4, 2, 0., 0.8)];
        let view_ids = ids(&["a", "b"]);
        let mut sample = Sample::from_data(&original, &view_ids, None)?;
        sample.align_timesteps(true)?;
        assert_eq!(original[1].len(), 4);
        assert_eq!(sample.recordings()[1].len(), 3);
        Ok(())
    }

    #[test]
    fn from_data_checks_lengths() {
        let rec = vec![ramp(3, 2, 0., 1.)];
        assert!(matches!(
            Sample::from_data(&rec, &ids(&["a", "b"]), None),
            Err(Error::ShapeMismatch(_))
        ));
        assert!(matches!(
            Sample::from_data(&rec, &ids(&["a"]), Some(vec![])),
            Err(Error::ShapeMismatch(_))
        ));
    }

    #[test]
    fn write_requires_destinations() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut sample = unaligned();
        assert!(matches!(sample.write(), Err(Error::Precondition(_))));

        sample.make_filepaths(dir.path(), "s1_", "pkl")?;
        let paths = sample.filepaths().unwrap().to_vec();
        assert_eq!(paths[2], dir.path().join("s1_ID2.pkl"));
        sample.write()?;

        let back = Sample::from_filepaths(&paths)?;
        assert_eq!(back.ids(), sample.ids());
        assert_eq!(back.recordings(), sample.recordings());
        Ok(())
    }

    #[test]
    fn file_backed_sample_is_read_only() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("sessionA_ID3.txt");
        write_tpa_file(&path, &ramp(2, 2, 0., 0.1))?;

        let mut sample = Sample::from_filepaths(&[&path])?;
        assert_eq!(sample.ids(), &["3".to_string()]);
        assert!(sample.is_read_only());
        assert!(matches!(sample.write(), Err(Error::ReadOnly(_))));
        assert!(matches!(
            sample.align_timesteps(true),
            Err(Error::ReadOnly(_))
        ));
        assert!(matches!(
            sample.make_filepaths(dir.path(), "x", "txt"),
            Err(Error::ReadOnly(_))
        ));
        assert!(sample.test_alignment());
        Ok(())
    }
}
