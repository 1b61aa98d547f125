//! File naming convention: `{prefix}ID{view_id}.{extension}`.
//!
//! The prefix identifies a recording session, the view id
//! the sensor. Both are split at the last `ID` of the file
//! stem, so view ids must not contain `ID`.
use std::path::Path;

pub const VIEW_SEPARATOR: &str = "ID";

/// Splits `name` into `(prefix, view_id)` at the last `ID`.
pub fn split_view_suffix(name: &str) -> Option<(&str, &str)> {
    name.rfind(VIEW_SEPARATOR)
        .map(|idx| (&name[..idx], &name[idx + VIEW_SEPARATOR.len()..]))
}

fn stem(path: &Path) -> Option<&str> {
    path.file_stem()?.to_str()
}

/// `sessionA_ID3.txt` → `3`
pub fn view_id_of(path: &Path) -> Option<String> {
    split_view_suffix(stem(path)?).map(|(_, view_id)| view_id.to_string())
}

/// `sessionA_ID3.txt` → `sessionA_`
pub fn prefix_of(path: &Path) -> Option<String> {
    split_view_suffix(stem(path)?).map(|(prefix, _)| prefix.to_string())
}

pub fn sample_file_name(prefix: &str, view_id: &str, extension: &str) -> String {
    format!("{}{}{}.{}", prefix, VIEW_SEPARATOR, view_id, extension)
}

/// Drops a trailing `ID...` from a key, as found in labels
/// files keyed by file name instead of prefix.
pub fn strip_view_suffix(key: &str) -> &str {
    split_view_suffix(key).map_or(key, |(prefix, _)| prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_prefix_and_view() {
        let path = Path::new("/data/raw/sessionA_ID3.txt");
        assert_eq!(view_id_of(path).as_deref(), Some("3"));
        assert_eq!(prefix_of(path).as_deref(), Some("sessionA_"));

        let nested = Path::new("20200101_1200_IDLEID121.pkl");
        assert_eq!(view_id_of(nested).as_deref(), Some("121"));
        assert_eq!(prefix_of(nested).as_deref(), Some("20200101_1200_IDLE"));

        assert_eq!(view_id_of(Path::new("no_view.txt")), None);
    }

    #[test]
    fn builds_file_names() {
        assert_eq!(sample_file_name("s1_", "2", "csv"), "s1_ID2.csv");
        let name = sample_file_name("s1_", "2", "csv");
        assert_eq!(prefix_of(Path::new(&name)).as_deref(), Some("s1_"));
    }

    #[test]
    fn strips_legacy_keys() {
        assert_eq!(strip_view_suffix("p4ID0"), "p4");
        assert_eq!(strip_view_suffix("p4"), "p4");
    }
}
