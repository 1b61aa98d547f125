//! JSON configs of the two pipeline stages, and the stage
//! marker files that gate them.
//!
//! A config is a flat JSON object. Loading goes through
//! three checks before the typed struct is built: every
//! required key is present, the `MAKE` and `PREPARE` flags
//! are not both set, and the stage's own flag is set.
use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use serde_derive::*;
use serde_json::{Map, Value};

use crate::{
    codec::Format,
    error::{Error, Result},
};

pub const MAKE_FLAG: &str = "MAKE";
pub const PREPARE_FLAG: &str = "PREPARE";

pub const STAGE_MARKER_FILE_NAME: &str = "tpa.nfo";
pub const MAKE_CONFIG_FILE_NAME: &str = "make_config.json";

pub type Document = Map<String, Value>;

/// Typed config of one pipeline stage.
pub trait StageConfig: Sized {
    const REQUIRED_KEYS: &'static [&'static str];
    /// Flag that must be set for this stage to accept the
    /// config.
    const STAGE_FLAG: &'static str;

    /// Values pre-filled in a generated template.
    fn template_defaults() -> Document;

    /// Builds the typed config from a document that passed
    /// [`validate_document`].
    fn from_document(doc: Document) -> Result<Self>;

    fn view_ids(&self) -> &[String];
    fn extension(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PrepareConfig {
    pub raw_input_dir: PathBuf,
    pub processed_destination_dir: PathBuf,
    #[serde(rename = "view_IDs", deserialize_with = "serde_helpers::view_ids")]
    pub view_ids: Vec<String>,
    #[serde(rename = "tpas_extension", deserialize_with = "serde_helpers::extension")]
    pub extension: String,
}

impl StageConfig for PrepareConfig {
    const REQUIRED_KEYS: &'static [&'static str] = &[
        "raw_input_dir",
        "processed_destination_dir",
        "view_IDs",
        "tpas_extension",
        MAKE_FLAG,
        PREPARE_FLAG,
    ];
    const STAGE_FLAG: &'static str = PREPARE_FLAG;

    fn template_defaults() -> Document {
        stage_flags(false)
    }

    fn from_document(doc: Document) -> Result<Self> {
        let config: PrepareConfig = typed(doc)?;
        require_path("raw_input_dir", &config.raw_input_dir)?;
        require_path("processed_destination_dir", &config.processed_destination_dir)?;
        require_distinct(
            ("raw_input_dir", config.raw_input_dir.as_path()),
            ("processed_destination_dir", config.processed_destination_dir.as_path()),
        )?;
        check_views_and_extension(&config.view_ids, &config.extension)?;
        Ok(config)
    }

    fn view_ids(&self) -> &[String] {
        &self.view_ids
    }

    fn extension(&self) -> &str {
        &self.extension
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MakeConfig {
    pub dataset_destination_dir: PathBuf,
    #[serde(rename = "view_IDs", deserialize_with = "serde_helpers::view_ids")]
    pub view_ids: Vec<String>,
    pub processed_input_dir: PathBuf,
    pub labels_filepath: PathBuf,
    #[serde(rename = "tpas_extension", deserialize_with = "serde_helpers::extension")]
    pub extension: String,
}

impl StageConfig for MakeConfig {
    const REQUIRED_KEYS: &'static [&'static str] = &[
        "dataset_destination_dir",
        "view_IDs",
        "processed_input_dir",
        "labels_filepath",
        "tpas_extension",
        MAKE_FLAG,
        PREPARE_FLAG,
    ];
    const STAGE_FLAG: &'static str = MAKE_FLAG;

    fn template_defaults() -> Document {
        stage_flags(true)
    }

    fn from_document(doc: Document) -> Result<Self> {
        let config: MakeConfig = typed(doc)?;
        require_path("dataset_destination_dir", &config.dataset_destination_dir)?;
        require_path("processed_input_dir", &config.processed_input_dir)?;
        require_path("labels_filepath", &config.labels_filepath)?;
        require_distinct(
            ("processed_input_dir", config.processed_input_dir.as_path()),
            ("dataset_destination_dir", config.dataset_destination_dir.as_path()),
        )?;
        check_views_and_extension(&config.view_ids, &config.extension)?;
        Ok(config)
    }

    fn view_ids(&self) -> &[String] {
        &self.view_ids
    }

    fn extension(&self) -> &str {
        &self.extension
    }
}

fn stage_flags(make: bool) -> Document {
    let mut doc = Document::new();
    doc.insert(MAKE_FLAG.into(), Value::from(u8::from(make)));
    doc.insert(PREPARE_FLAG.into(), Value::from(u8::from(!make)));
    doc
}

fn typed<C: DeserializeOwned>(doc: Document) -> Result<C> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| Error::configuration(e.to_string()))
}

fn require_path(key: &str, path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::configuration(format!("`{}` is empty", key)));
    }
    Ok(())
}

/// A stage never writes into its own input directory.
/// Paths are compared canonicalized when they exist.
fn require_distinct(
    (input_key, input): (&str, &Path),
    (dest_key, dest): (&str, &Path),
) -> Result<()> {
    let resolve = |p: &Path| p.canonicalize().unwrap_or_else(|_| p.components().collect());
    if resolve(input) == resolve(dest) {
        return Err(Error::configuration(format!(
            "`{}` and `{}` must be different directories",
            input_key, dest_key
        )));
    }
    Ok(())
}

fn check_views_and_extension(view_ids: &[String], extension: &str) -> Result<()> {
    if view_ids.is_empty() {
        return Err(Error::configuration("`view_IDs` lists no view"));
    }
    for (idx, id) in view_ids.iter().enumerate() {
        if id.is_empty() || id.contains(crate::naming::VIEW_SEPARATOR) {
            return Err(Error::configuration(format!("invalid view id `{}`", id)));
        }
        if view_ids[..idx].contains(id) {
            return Err(Error::configuration(format!("duplicate view id `{}`", id)));
        }
    }
    Format::from_extension(extension)
        .map_err(|_| Error::configuration(format!("unsupported `tpas_extension`: `{}`", extension)))?;
    Ok(())
}

/// JSON truthiness: non-zero numbers, `true`, and non-empty
/// strings, arrays and objects.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |v| v != 0.),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn flag(doc: &Document, key: &str) -> bool {
    doc.get(key).map_or(false, is_truthy)
}

pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let value: Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;
    match value {
        Value::Object(doc) => Ok(doc),
        _ => Err(Error::configuration(format!(
            "{} does not hold a JSON object",
            path.display()
        ))),
    }
}

/// Keys of `required` absent from `doc`, in order.
pub fn missing_keys(doc: &Document, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|key| !doc.contains_key(**key))
        .map(|key| key.to_string())
        .collect()
}

/// Checks required keys, the stage flag conflict and the
/// stage's own flag.
pub fn validate_document(doc: &Document, required: &[&str], stage_flag: &str) -> Result<()> {
    let missing = missing_keys(doc, required);
    if !missing.is_empty() {
        return Err(Error::configuration(format!(
            "keys missing {:?} (required {:?})",
            missing, required
        )));
    }
    if flag(doc, MAKE_FLAG) && flag(doc, PREPARE_FLAG) {
        return Err(Error::configuration(format!(
            "`{}` and `{}` cannot both be set",
            MAKE_FLAG, PREPARE_FLAG
        )));
    }
    if !flag(doc, stage_flag) {
        return Err(Error::configuration(format!(
            "`{}` must be set for this stage",
            stage_flag
        )));
    }
    Ok(())
}

/// Writes every key of `required`, filled from `fill` or with
/// `""`, plus any extra keys of `fill`.
pub fn write_template<P: AsRef<Path>>(path: P, required: &[&str], fill: &Document) -> Result<()> {
    let mut template: Document = required
        .iter()
        .map(|key| (key.to_string(), Value::String(String::new())))
        .collect();
    for (key, value) in fill {
        template.insert(key.clone(), value.clone());
    }
    write_json(path, &Value::Object(template))
}

fn write_json<P: AsRef<Path>>(path: P, value: &Value) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, value)?;
    out.flush()?;
    Ok(())
}

/// Stages certified by a `tpa.nfo` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Aligned,
    DatasetPrepared,
}

impl Stage {
    pub fn key(self) -> &'static str {
        match self {
            Stage::Aligned => "ALIGNED",
            Stage::DatasetPrepared => "DATASET_PREPARED",
        }
    }
}

pub fn write_stage_marker<P: AsRef<Path>>(dir: P, stage: Stage) -> Result<()> {
    let mut marker = Document::new();
    marker.insert(stage.key().into(), Value::from(1));
    write_json(dir.as_ref().join(STAGE_MARKER_FILE_NAME), &Value::Object(marker))
}

/// Deletes the marker of `dir`, if any, so that the directory
/// is not certified while a stage rewrites it.
pub fn clear_stage_marker<P: AsRef<Path>>(dir: P) -> Result<()> {
    match fs::remove_file(dir.as_ref().join(STAGE_MARKER_FILE_NAME)) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
        _ => Ok(()),
    }
}

/// Fails unless `dir` holds a marker asserting `stage`.
pub fn check_stage_marker<P: AsRef<Path>>(dir: P, stage: Stage) -> Result<()> {
    let path = dir.as_ref().join(STAGE_MARKER_FILE_NAME);
    if !path.exists() {
        return Err(Error::precondition(format!(
            "{} doesn't exist; run the previous stage first",
            path.display()
        )));
    }
    let doc = load_document(&path).map_err(|e| Error::precondition(e.to_string()))?;
    if !flag(&doc, stage.key()) {
        return Err(Error::precondition(format!(
            "{} does not assert `{}`",
            path.display(),
            stage.key()
        )));
    }
    Ok(())
}

mod serde_helpers {
    use serde::de::Error;
    use serde::*;
    use serde_json::Value;

    /// View ids as strings; integers are accepted and
    /// stringified.
    pub fn view_ids<'de, D>(de: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        <Vec<Value> as Deserialize>::deserialize(de)?
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
                other => Err(D::Error::custom(format!(
                    "view id must be a string or an integer, found `{}`",
                    other
                ))),
            })
            .collect()
    }

    pub fn extension<'de, D>(de: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ext = <String as Deserialize>::deserialize(de)?;
        Ok(ext.trim_start_matches('.').to_string())
    }
}
