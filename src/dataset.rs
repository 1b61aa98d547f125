use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    config::{
        check_stage_marker, clear_stage_marker, write_stage_marker, Document, MakeConfig, Stage,
    },
    error::{Error, Result},
    labels::{Labels, LABELS_FILE_NAME},
    log::RunLog,
    manager::FileManager,
    naming::sample_file_name,
};

/// Copies every complete, labelled sample of an aligned
/// directory into a dataset directory.
#[derive(Debug, Default)]
pub struct DatasetMaker {
    manager: FileManager<MakeConfig>,
}

impl DatasetMaker {
    pub fn new(log: RunLog) -> Result<Self> {
        Ok(DatasetMaker {
            manager: FileManager::new(log)?,
        })
    }

    pub fn generate_config_template<P: AsRef<Path>>(
        &self,
        path: P,
        fill: Option<Document>,
    ) -> Result<()> {
        self.manager.generate_config_template(path, fill)
    }

    /// Loads the config. The processed directory must carry an
    /// `ALIGNED` stage marker and the labels file must exist.
    pub fn config<P: AsRef<Path>>(&mut self, path: P) -> Result<&MakeConfig> {
        let config = self.manager.load_config(path)?;
        check_stage_marker(&config.processed_input_dir, Stage::Aligned)
            .map_err(|e| self.manager.fail(e))?;
        if !config.labels_filepath.is_file() {
            return Err(self.manager.fail(Error::precondition(format!(
                "labels file {} doesn't exist",
                config.labels_filepath.display()
            ))));
        }
        self.manager.configure(config)
    }

    pub fn is_configured(&self) -> bool {
        self.manager.is_configured()
    }

    /// Builds the dataset. Returns `Ok(false)`, without
    /// touching the destination, when no sample is both
    /// complete and validly labelled.
    pub fn make(&self) -> Result<bool> {
        let config = self.manager.configured()?;
        let log = self.manager.log();

        let (found, complete) = self.manager.complete_samples(&config.processed_input_dir)?;
        let labels = Labels::load(&config.labels_filepath)?;
        let filter = labels.filter(&complete);
        for (prefix, rejection) in &filter.rejected {
            log.warn(format!("Ignoring prefix {} because {}", prefix, rejection));
        }
        log.info(format!(
            "{} prefixes ignored out of initial {}",
            found.candidates.len() - filter.eligible.len(),
            found.candidates.len()
        ));

        if filter.eligible.is_empty() {
            log.warn("No sample is complete and labelled");
            log.info("FAILED");
            return Ok(false);
        }

        let copies: Vec<(PathBuf, PathBuf)> = filter
            .eligible
            .keys()
            .flat_map(|prefix| {
                config.view_ids.iter().map(move |id| {
                    let name = sample_file_name(prefix, id, &config.extension);
                    (
                        config.processed_input_dir.join(&name),
                        config.dataset_destination_dir.join(&name),
                    )
                })
            })
            .collect();

        fs::create_dir_all(&config.dataset_destination_dir)?;
        clear_stage_marker(&config.dataset_destination_dir)?;
        for (src, dst) in &copies {
            fs::copy(src, dst)?;
        }
        Labels::from(&filter.eligible)
            .write(config.dataset_destination_dir.join(LABELS_FILE_NAME))?;
        write_stage_marker(&config.dataset_destination_dir, Stage::DatasetPrepared)?;

        log.info(format!(
            "Copied {} files of {} samples",
            copies.len(),
            filter.eligible.len()
        ));
        log.info("OK");
        Ok(true)
    }
}
