//! Library to convert and organize recordings from Heimann
//! HTPA thermopile sensor arrays.
//!
//! This crate provides three functionalities:
//!
//! 1. Read and write a recording, i.e. a sequence of
//! temperature frames with one timestamp per frame, in the
//! [supported encodings](codec::Format): HTPA text dumps,
//! CSV tables and a compact binary container.
//!
//! 2. Group per-view recordings of one session into a
//! [`Sample`] and [align](Sample::align_timesteps) the
//! views onto a common frame index via
//! [`match_timesteps`].
//!
//! 3. Run the two stage dataset pipeline: a [`Preparer`]
//! turns a directory of raw multi-view recordings into
//! aligned recordings plus a labels template, and a
//! [`DatasetMaker`] copies every complete, labelled sample
//! into a dataset directory.
//!
//! # Usage
//!
//! Both stages are driven by JSON config files. The
//! [`Preparer`] writes a ready-to-edit config for the
//! [`DatasetMaker`] next to its output.
//!
//! ```rust,no_run
//! # fn run() -> htpa::Result<()> {
//! use htpa::{DatasetMaker, Preparer, RunLog};
//!
//! let mut preparer = Preparer::new(RunLog::verbose("make.log"))?;
//! preparer.config("prepare_config.json")?;
//! preparer.prepare()?;
//!
//! // fill in `processed/labels.json` and
//! // `dataset_destination_dir` in `processed/make_config.json`
//! let mut maker = DatasetMaker::default();
//! maker.config("processed/make_config.json")?;
//! if !maker.make()? {
//!     eprintln!("no sample is complete and labelled");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! File names follow `{prefix}ID{view_id}.{extension}`, see
//! [`naming`].

pub mod codec;
pub mod config;
pub mod error;
pub mod frames;
pub mod labels;
pub mod log;
pub mod manager;
pub mod matching;
pub mod naming;
pub mod sample;

mod dataset;
mod preparer;

#[cfg(feature = "cli")]
pub mod cli;

pub use crate::codec::{read_tpa_file, write_tpa_file, Format, Recording};
pub use crate::dataset::DatasetMaker;
pub use crate::error::{Error, Result};
pub use crate::log::RunLog;
pub use crate::matching::match_timesteps;
pub use crate::preparer::Preparer;
pub use crate::sample::Sample;
