use std::{fs, path::Path};

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use crate::{
    config::{
        clear_stage_marker, write_stage_marker, Document, MakeConfig, PrepareConfig, Stage,
        MAKE_CONFIG_FILE_NAME,
    },
    error::Result,
    labels::{Labels, LABELS_FILE_NAME},
    log::RunLog,
    manager::FileManager,
    naming::sample_file_name,
    sample::Sample,
};

/// Turns a directory of raw multi-view recordings into
/// aligned recordings with their timestamps starting at 0.
#[derive(Debug, Default)]
pub struct Preparer {
    manager: FileManager<PrepareConfig>,
}

impl Preparer {
    pub fn new(log: RunLog) -> Result<Self> {
        Ok(Preparer {
            manager: FileManager::new(log)?,
        })
    }

    pub fn generate_config_template<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.manager.generate_config_template(path, None)
    }

    pub fn config<P: AsRef<Path>>(&mut self, path: P) -> Result<&PrepareConfig> {
        let config = self.manager.load_config(path)?;
        self.manager.configure(config)
    }

    pub fn is_configured(&self) -> bool {
        self.manager.is_configured()
    }

    /// Aligns every complete sample of the raw directory into
    /// the processed directory, then writes a labels template,
    /// a config template for the dataset stage and, last, the
    /// `ALIGNED` stage marker.
    ///
    /// Returns the prepared prefixes, sorted.
    pub fn prepare(&self) -> Result<Vec<String>> {
        let config = self.manager.configured()?;
        let log = self.manager.log();
        let raw_dir = &config.raw_input_dir;
        let processed_dir = &config.processed_destination_dir;
        fs::create_dir_all(raw_dir)?;
        fs::create_dir_all(processed_dir)?;
        clear_stage_marker(processed_dir)?;

        let (found, prefixes) = self.manager.complete_samples(raw_dir)?;
        log.info(format!(
            "Preparing {} samples out of {} found in {}",
            prefixes.len(),
            found.candidates.len(),
            raw_dir.display()
        ));

        let bar = if log.is_verbose() {
            ProgressBar::new(prefixes.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {wide_bar:cyan/blue} {pos:>7}/{len:7}"),
        );

        for prefix in &prefixes {
            let paths: Vec<_> = config
                .view_ids
                .iter()
                .map(|id| raw_dir.join(sample_file_name(prefix, id, &config.extension)))
                .collect();
            let raw = Sample::from_filepaths(&paths).map_err(|e| self.manager.fail(e))?;

            let mut sample = Sample::from_data(raw.recordings(), raw.ids(), None)?;
            sample.make_filepaths(processed_dir, prefix, &config.extension)?;
            sample.align_timesteps(true)?;
            sample.write()?;
            bar.inc(1);
        }
        bar.finish_and_clear();

        let labels_path = processed_dir.join(LABELS_FILE_NAME);
        Labels::template(prefixes.iter().cloned()).write(&labels_path)?;

        let mut fill = Document::new();
        fill.insert("view_IDs".into(), Value::from(config.view_ids.clone()));
        fill.insert("tpas_extension".into(), Value::from(config.extension.clone()));
        fill.insert(
            "processed_input_dir".into(),
            Value::from(processed_dir.to_string_lossy().into_owned()),
        );
        fill.insert(
            "labels_filepath".into(),
            Value::from(labels_path.to_string_lossy().into_owned()),
        );
        FileManager::<MakeConfig>::default()
            .generate_config_template(processed_dir.join(MAKE_CONFIG_FILE_NAME), Some(fill))?;

        write_stage_marker(processed_dir, Stage::Aligned)?;
        log.info("OK");
        Ok(prefixes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        codec::{read_tpa_file, tests::ramp, write_tpa_file},
        config::{check_stage_marker, load_document, STAGE_MARKER_FILE_NAME},
        error::Error,
    };
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn prepare_requires_config() {
        let preparer = Preparer::default();
        assert!(!preparer.is_configured());
        assert!(matches!(preparer.prepare(), Err(Error::NotConfigured)));
    }

    #[test]
    fn aligns_complete_samples() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let raw = dir.path().join("raw");
        let processed = dir.path().join("processed");
        write_tpa_file(raw.join("s1ID0.pkl"), &ramp(6, 2, 3.0, 0.1))?;
        write_tpa_file(raw.join("s1ID1.pkl"), &ramp(4, 2, 3.02, 0.15))?;
        write_tpa_file(raw.join("s2ID0.pkl"), &ramp(3, 2, 1.0, 0.1))?;

        let config = dir.path().join("prepare.json");
        std::fs::write(
            &config,
            serde_json::to_string(&json!({
                "raw_input_dir": raw,
                "processed_destination_dir": processed,
                "view_IDs": ["0", "1"],
                "tpas_extension": "pkl",
                "MAKE": 0,
                "PREPARE": 1
            }))?,
        )?;

        let mut preparer = Preparer::default();
        preparer.config(&config)?;
        assert_eq!(preparer.prepare()?, vec!["s1"]);

        let view0 = read_tpa_file(processed.join("s1ID0.pkl"))?;
        let view1 = read_tpa_file(processed.join("s1ID1.pkl"))?;
        assert_eq!(view0.len(), 4);
        assert_eq!(view1.len(), 4);
        assert_eq!(view0.timestamps()[0], 0.0);
        assert!(!processed.join("s2ID0.pkl").exists());

        check_stage_marker(&processed, Stage::Aligned)?;
        assert!(processed.join(STAGE_MARKER_FILE_NAME).exists());

        let make = load_document(processed.join(MAKE_CONFIG_FILE_NAME))?;
        assert_eq!(make["view_IDs"], json!(["0", "1"]));
        assert_eq!(make["tpas_extension"], json!("pkl"));
        assert_eq!(make["MAKE"], json!(1));
        assert_eq!(make["PREPARE"], json!(0));
        assert_eq!(make["dataset_destination_dir"], json!(""));
        Ok(())
    }

    fn prepare_config(dir: &Path, raw: &Path, processed: &Path) -> Result<std::path::PathBuf> {
        let config = dir.join("prepare.json");
        std::fs::write(
            &config,
            serde_json::to_string(&json!({
                "raw_input_dir": raw,
                "processed_destination_dir": processed,
                "view_IDs": ["0"],
                "tpas_extension": "pkl",
                "MAKE": 0,
                "PREPARE": 1
            }))?,
        )?;
        Ok(config)
    }

    #[test]
    fn failed_rerun_leaves_no_marker() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let raw = dir.path().join("raw");
        let processed = dir.path().join("processed");
        write_tpa_file(raw.join("s1ID0.pkl"), &ramp(3, 2, 0., 0.1))?;
        std::fs::write(raw.join("s2ID0.pkl"), "not a recording")?;
        std::fs::create_dir_all(&processed)?;
        write_stage_marker(&processed, Stage::Aligned)?;

        let mut preparer = Preparer::default();
        preparer.config(prepare_config(dir.path(), &raw, &processed)?)?;
        assert!(matches!(preparer.prepare(), Err(Error::Codec { .. })));
        assert!(!processed.join(STAGE_MARKER_FILE_NAME).exists());
        Ok(())
    }

    #[test]
    fn refuses_to_overwrite_raw_inputs() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let raw = dir.path().join("raw");
        let rec = ramp(3, 2, 5., 0.1);
        write_tpa_file(raw.join("s1ID0.pkl"), &rec)?;

        let mut preparer = Preparer::default();
        let config = prepare_config(dir.path(), &raw, &raw)?;
        assert!(matches!(
            preparer.config(config),
            Err(Error::Configuration(_))
        ));
        assert!(!preparer.is_configured());
        assert_eq!(read_tpa_file(raw.join("s1ID0.pkl"))?, rec);
        Ok(())
    }
}
