//! Run log handed to the dataset managers.
//!
//! Every message is emitted as a [`tracing`] event. When the
//! log is verbose, it is also printed to stdout and appended
//! as one line to the run log file.
use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use crate::error::Result;

/// Default run log file name used by the `htpa` binary.
pub const DEFAULT_LOG_FILE: &str = "make.log";

#[derive(Debug, Clone, Default)]
pub struct RunLog {
    path: Option<PathBuf>,
}

impl RunLog {
    /// Prints every message and appends it to `path`.
    pub fn verbose<P: Into<PathBuf>>(path: P) -> Self {
        RunLog {
            path: Some(path.into()),
        }
    }

    pub fn is_verbose(&self) -> bool {
        self.path.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Empties the log file, if any.
    pub(crate) fn truncate(&self) -> Result<()> {
        if let Some(path) = &self.path {
            File::create(path)?;
        }
        Ok(())
    }

    pub fn info<S: AsRef<str>>(&self, msg: S) {
        let msg = msg.as_ref();
        tracing::info!("{}", msg);
        self.emit(msg);
    }

    pub fn warn<S: AsRef<str>>(&self, msg: S) {
        let msg = msg.as_ref();
        tracing::warn!("{}", msg);
        self.emit(&format!("[WARNING] {}", msg));
    }

    fn emit(&self, line: &str) {
        let path = match &self.path {
            Some(path) => path,
            None => return,
        };
        println!("{}", line);
        let appended = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| writeln!(f, "{}", line));
        if let Err(e) = appended {
            tracing::error!(path = %path.display(), "could not append to run log: {}", e);
        }
    }
}
