//! Rename tables and exclude-key lists.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use hashbrown::HashSet;
use indexmap::IndexMap;

use crate::error::TrimError;

/// `original_name -> new_name`, read from a two-column CSV with a header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTable {
    names: IndexMap<String, String>,
}

impl RenameTable {
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self, TrimError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| TrimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Every row after the header must have exactly two fields. A name that
    /// appears twice keeps its last mapping.
    pub fn from_reader(reader: impl Read) -> Result<Self, TrimError> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let mut names = IndexMap::new();
        for record in csv.records() {
            let record = record?;
            let line = record.position().map_or(0, |p| p.line());
            match (record.len(), record.get(0), record.get(1)) {
                (2, Some(original), Some(renamed)) => {
                    names.insert(original.to_string(), renamed.to_string());
                }
                (n, _, _) => {
                    return Err(TrimError::Csv {
                        line,
                        reason: format!("expected 2 fields, found {n}"),
                    })
                }
            }
        }
        Ok(RenameTable { names })
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.names.get(original).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RenameTable {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        RenameTable {
            names: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// Keys removed at every depth of the output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExcludeKeys {
    keys: HashSet<String>,
}

impl ExcludeKeys {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TrimError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| TrimError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_lines(text.lines()))
    }

    /// One key per line; whitespace around keys and blank lines are ignored.
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        ExcludeKeys {
            keys: lines
                .into_iter()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_skipped_and_last_mapping_wins() {
        let table = RenameTable::from_reader(
            "from,to\nJ_Bip_C_Hips,hips\nJ_Bip_C_Spine,spine\nJ_Bip_C_Hips,pelvis\n".as_bytes(),
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("J_Bip_C_Hips"), Some("pelvis"));
        assert_eq!(table.get("from"), None);
    }

    #[test]
    fn rows_need_exactly_two_fields() {
        let err = RenameTable::from_reader("a,b\nx,y\nonly_one\n".as_bytes()).unwrap_err();
        assert!(matches!(err, TrimError::Csv { line: 3, .. }), "{err}");
        assert!(RenameTable::from_reader("a,b\nx,y,z\n".as_bytes()).is_err());
    }

    #[test]
    fn non_ascii_names_survive() {
        let table = RenameTable::from_reader("a,b\n頭,head\n".as_bytes()).unwrap();
        assert_eq!(table.get("頭"), Some("head"));
    }

    #[test]
    fn exclude_lines_are_trimmed() {
        let keys = ExcludeKeys::from_lines(["  global_coords ", "", "   ", "children"]);
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("global_coords"));
        assert!(!keys.contains(""));
    }

    #[test]
    fn missing_files_are_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            RenameTable::from_csv_path(dir.path().join("nope.csv")),
            Err(TrimError::Io { .. })
        ));
        assert!(matches!(
            ExcludeKeys::from_path(dir.path().join("nope.txt")),
            Err(TrimError::Io { .. })
        ));
    }
}
