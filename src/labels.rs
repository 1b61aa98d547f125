//! Labels files: a JSON object mapping each sample prefix to
//! an integer label, or to `""` while still unlabelled.
use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde_json::{Map, Value};

use crate::{
    error::{Error, Result},
    naming::strip_view_suffix,
};

pub const LABELS_FILE_NAME: &str = "labels.json";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Labels {
    entries: Map<String, Value>,
}

/// Why a prefix was kept out of the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Missing,
    Empty,
    NotInteger,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Missing => write!(f, "it has no label entry"),
            Rejection::Empty => write!(f, "its label is empty"),
            Rejection::NotInteger => write!(f, "its label is not an integer"),
        }
    }
}

/// Outcome of [`Labels::filter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelFilter {
    pub eligible: BTreeMap<String, i64>,
    pub rejected: Vec<(String, Rejection)>,
}

impl Labels {
    pub fn from_map(entries: Map<String, Value>) -> Self {
        Labels { entries }
    }

    /// Every prefix mapped to `""`, to be filled by hand.
    pub fn template<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Labels {
            entries: prefixes
                .into_iter()
                .map(|p| (p.into(), Value::String(String::new())))
                .collect(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let value: Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        match value {
            Value::Object(entries) => Ok(Labels { entries }),
            _ => Err(Error::precondition(format!(
                "labels file {} must hold a JSON object",
                path.display()
            ))),
        }
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, &self.entries)?;
        out.flush()?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Re-keys entries by bare prefix. Keys naming a file
    /// (`{prefix}ID{view}`) are reduced to their prefix unless
    /// the key already is one of `prefixes`.
    pub fn normalized(&self, prefixes: &[String]) -> Labels {
        let known: HashSet<&str> = prefixes.iter().map(String::as_str).collect();
        let mut entries = Map::new();
        for (key, value) in &self.entries {
            if known.contains(key.as_str()) {
                entries.insert(key.clone(), value.clone());
            }
        }
        for (key, value) in &self.entries {
            if known.contains(key.as_str()) {
                continue;
            }
            let prefix = strip_view_suffix(key);
            if !entries.contains_key(prefix) {
                entries.insert(prefix.to_string(), value.clone());
            }
        }
        Labels { entries }
    }

    /// Splits `prefixes` into those with a valid integer label
    /// and those without, after key normalization.
    pub fn filter(&self, prefixes: &[String]) -> LabelFilter {
        let labels = self.normalized(prefixes);
        let mut result = LabelFilter::default();
        for prefix in prefixes {
            match labels.get(prefix).map(integer_label) {
                Some(Ok(label)) => {
                    result.eligible.insert(prefix.clone(), label);
                }
                Some(Err(rejection)) => result.rejected.push((prefix.clone(), rejection)),
                None => result.rejected.push((prefix.clone(), Rejection::Missing)),
            }
        }
        result
    }
}

fn integer_label(value: &Value) -> std::result::Result<i64, Rejection> {
    match value {
        Value::String(s) if s.is_empty() => Err(Rejection::Empty),
        Value::Null => Err(Rejection::Empty),
        Value::Number(n) => n.as_i64().ok_or(Rejection::NotInteger),
        _ => Err(Rejection::NotInteger),
    }
}

impl From<&BTreeMap<String, i64>> for Labels {
    fn from(labels: &BTreeMap<String, i64>) -> Self {
        Labels {
            entries: labels
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(*v)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn prefixes(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    fn labels(value: Value) -> Labels {
        match value {
            Value::Object(map) => Labels::from_map(map),
            _ => unreachable!(),
        }
    }

    #[test]
    fn filters_missing_empty_and_non_integer() {
        let labels = labels(json!({"p1": 2, "p2": "", "p3": "x", "p4ID0": 5}));
        let filter = labels.filter(&prefixes(&["p1", "p2", "p3", "p4"]));

        let eligible: Vec<_> = filter.eligible.into_iter().collect();
        assert_eq!(eligible, vec![("p1".to_string(), 2), ("p4".to_string(), 5)]);
        assert_eq!(
            filter.rejected,
            vec![
                ("p2".to_string(), Rejection::Empty),
                ("p3".to_string(), Rejection::NotInteger)
            ]
        );
    }

    #[test]
    fn floats_and_missing_entries_are_rejected() {
        let labels = labels(json!({"a": 1.5, "b": 0, "c": true}));
        let filter = labels.filter(&prefixes(&["a", "b", "c", "d"]));
        assert_eq!(filter.eligible.get("b"), Some(&0));
        assert_eq!(
            filter.rejected,
            vec![
                ("a".to_string(), Rejection::NotInteger),
                ("c".to_string(), Rejection::NotInteger),
                ("d".to_string(), Rejection::Missing),
            ]
        );
    }

    #[test]
    fn exact_prefix_wins_over_legacy_key() {
        let labels = labels(json!({"VIDEO": 1, "VIDEOID0": 7}));
        let normalized = labels.normalized(&prefixes(&["VIDEO"]));
        assert_eq!(normalized.get("VIDEO"), Some(&json!(1)));
        assert_eq!(normalized.len(), 1);
    }

    #[test]
    fn template_round_trip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(LABELS_FILE_NAME);
        Labels::template(vec!["s1", "s2"]).write(&path)?;
        let back = Labels::load(&path)?;
        assert_eq!(back.get("s1"), Some(&json!("")));
        assert_eq!(back.len(), 2);
        Ok(())
    }
}
