//! Workflow scaffolding shared by the [`Preparer`] and the
//! [`DatasetMaker`]: config loading, the run log, and
//! discovery of complete multi-view sample groups.
//!
//! [`Preparer`]: crate::Preparer
//! [`DatasetMaker`]: crate::DatasetMaker
use std::path::{Path, PathBuf};

use glob::Pattern;
use itertools::Itertools;

use crate::{
    config::{load_document, missing_keys, validate_document, write_template, Document, StageConfig},
    error::{Error, Result},
    log::RunLog,
    naming::{prefix_of, view_id_of},
};

/// Files found under a root directory, grouped by prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Discovery {
    /// One prefix per discovered file.
    pub prefixes: Vec<String>,
    /// Distinct prefixes, sorted.
    pub candidates: Vec<String>,
}

/// Config-driven manager, unconfigured until
/// [`configure`](FileManager::configure) succeeds.
#[derive(Debug)]
pub struct FileManager<C> {
    log: RunLog,
    config: Option<C>,
}

impl<C> Default for FileManager<C> {
    fn default() -> Self {
        FileManager {
            log: RunLog::default(),
            config: None,
        }
    }
}

impl<C: StageConfig> FileManager<C> {
    /// Truncates the run log file if `log` is verbose.
    pub fn new(log: RunLog) -> Result<Self> {
        log.truncate()?;
        Ok(FileManager { log, config: None })
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_some()
    }

    /// Writes a config with every required key of `C`, filled
    /// with the stage defaults, then with `fill`.
    pub fn generate_config_template<P: AsRef<Path>>(
        &self,
        path: P,
        fill: Option<Document>,
    ) -> Result<()> {
        let mut values = C::template_defaults();
        values.extend(fill.unwrap_or_default());
        write_template(path, C::REQUIRED_KEYS, &values)
    }

    /// Loads and validates a config without applying it.
    pub fn load_config<P: AsRef<Path>>(&self, path: P) -> Result<C> {
        let doc = load_document(path)?;
        let missing = missing_keys(&doc, C::REQUIRED_KEYS);
        if !missing.is_empty() {
            self.log.info(format!("Keys required {:?}", C::REQUIRED_KEYS));
            self.log.info(format!("Keys missing {:?}", missing));
        }
        validate_document(&doc, C::REQUIRED_KEYS, C::STAGE_FLAG)
            .and_then(|_| C::from_document(doc))
            .map_err(|e| self.fail(e))
    }

    /// Applies a loaded config. A manager is configured at
    /// most once.
    pub fn configure(&mut self, config: C) -> Result<&C> {
        if self.config.is_some() {
            return Err(self.fail(Error::configuration("manager is already configured")));
        }
        Ok(self.config.insert(config))
    }

    pub fn configured(&self) -> Result<&C> {
        self.config
            .as_ref()
            .ok_or_else(|| self.fail(Error::NotConfigured))
    }

    /// Logs an error on its way out.
    pub(crate) fn fail(&self, err: Error) -> Error {
        self.log.info(err.to_string());
        err
    }

    /// Globs `*ID{view_id}.{extension}` under `root` for every
    /// configured view.
    pub fn discover<P: AsRef<Path>>(&self, root: P) -> Result<Discovery> {
        let config = self.configured()?;
        let root = root.as_ref();
        let escaped_root = root
            .to_str()
            .map(Pattern::escape)
            .ok_or_else(|| Error::configuration(format!("{} is not valid UTF-8", root.display())))?;

        let mut prefixes = vec![];
        for view_id in config.view_ids() {
            let pattern = PathBuf::from(&escaped_root).join(format!(
                "*ID{}.{}",
                Pattern::escape(view_id),
                Pattern::escape(config.extension())
            ));
            let pattern = pattern
                .to_str()
                .ok_or_else(|| Error::configuration("glob pattern is not valid UTF-8"))?
                .to_string();
            for entry in glob::glob(&pattern)? {
                let path = entry.map_err(|e| Error::Io(e.into()))?;
                if view_id_of(&path).as_deref() != Some(view_id.as_str()) {
                    continue;
                }
                if let Some(prefix) = prefix_of(&path) {
                    prefixes.push(prefix);
                }
            }
        }

        let candidates = prefixes.iter().cloned().sorted().dedup().collect();
        Ok(Discovery {
            prefixes,
            candidates,
        })
    }

    /// Drops every candidate appearing fewer times in
    /// `prefixes` than there are configured views.
    pub fn remove_missing_views(
        &self,
        prefixes: &[String],
        candidates: Vec<String>,
    ) -> Result<Vec<String>> {
        let view_count = self.configured()?.view_ids().len();
        let counts = prefixes.iter().counts();
        Ok(candidates
            .into_iter()
            .filter(|prefix| {
                let found = counts.get(prefix).copied().unwrap_or(0);
                if found < view_count {
                    self.log.warn(format!(
                        "Ignoring prefix {} because it misses {} views",
                        prefix,
                        view_count - found
                    ));
                    false
                } else {
                    true
                }
            })
            .collect())
    }

    /// Discovers files under `root` and keeps the complete
    /// groups.
    pub fn complete_samples<P: AsRef<Path>>(&self, root: P) -> Result<(Discovery, Vec<String>)> {
        let found = self.discover(root)?;
        let complete = self.remove_missing_views(&found.prefixes, found.candidates.clone())?;
        Ok((found, complete))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrepareConfig;
    use anyhow::Result;
    use serde_json::json;
    use std::fs;

    fn write_config(dir: &Path, views: &[&str]) -> Result<PathBuf> {
        let path = dir.join("prepare.json");
        fs::write(
            &path,
            serde_json::to_string(&json!({
                "raw_input_dir": dir.join("raw"),
                "processed_destination_dir": dir.join("processed"),
                "view_IDs": views,
                "tpas_extension": "txt",
                "MAKE": 0,
                "PREPARE": 1
            }))?,
        )?;
        Ok(path)
    }

    fn configured(dir: &Path, views: &[&str]) -> Result<FileManager<PrepareConfig>> {
        let mut manager = FileManager::<PrepareConfig>::default();
        let config = manager.load_config(write_config(dir, views)?)?;
        manager.configure(config)?;
        Ok(manager)
    }

    #[test]
    fn refuses_work_before_config() {
        let manager = FileManager::<PrepareConfig>::default();
        assert!(matches!(
            manager.remove_missing_views(&[], vec![]),
            Err(Error::NotConfigured)
        ));
        assert!(matches!(manager.discover("."), Err(Error::NotConfigured)));
    }

    #[test]
    fn configures_once() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut manager = configured(dir.path(), &["0", "1"])?;
        assert!(manager.is_configured());
        let again = manager.load_config(dir.path().join("prepare.json"))?;
        assert!(matches!(
            manager.configure(again),
            Err(Error::Configuration(_))
        ));
        Ok(())
    }

    #[test]
    fn drops_incomplete_groups() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let manager = configured(dir.path(), &["0", "1", "2"])?;
        let prefixes: Vec<String> = ["A", "A", "B", "A", "B"].iter().map(|s| s.to_string()).collect();
        let kept = manager.remove_missing_views(&prefixes, vec!["A".into(), "B".into()])?;
        assert_eq!(kept, vec!["A"]);
        Ok(())
    }

    #[test]
    fn discovers_by_view_suffix() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let manager = configured(dir.path(), &["1", "2"])?;
        let raw = dir.path().join("raw");
        fs::create_dir_all(&raw)?;
        for name in &["s1ID1.txt", "s1ID2.txt", "s2ID1.txt", "s3ID21.txt", "s3ID1.csv", "notes.txt"] {
            fs::write(raw.join(name), "")?;
        }

        let (found, complete) = manager.complete_samples(&raw)?;
        assert_eq!(found.candidates, vec!["s1", "s2"]);
        assert_eq!(found.prefixes.len(), 3);
        assert_eq!(complete, vec!["s1"]);
        Ok(())
    }

    #[test]
    fn template_merges_fill() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("template.json");
        let manager = FileManager::<PrepareConfig>::default();
        let mut fill = Document::new();
        fill.insert("view_IDs".into(), json!(["0"]));
        manager.generate_config_template(&path, Some(fill))?;

        let doc = load_document(&path)?;
        assert_eq!(doc["view_IDs"], json!(["0"]));
        assert_eq!(doc["PREPARE"], json!(1));
        assert_eq!(doc["tpas_extension"], json!(""));
        Ok(())
    }
}
