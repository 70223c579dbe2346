//! JSON file helpers shared by every tool.
//!
//! Documents are written UTF-8 with a four-space indent and without escaping
//! non-ASCII characters, so bone names stay readable.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value as JsonValue;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while reading or writing JSON documents.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json in {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialize json: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ApiError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound(path.to_path_buf())
        } else {
            ApiError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// Read and parse a JSON file into an untyped document.
pub fn read_json_file(path: impl AsRef<Path>) -> Result<JsonValue, ApiError> {
    read_typed(path)
}

/// Read and parse a JSON file into `T`.
pub fn read_typed<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, ApiError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| ApiError::io(path, e))?;
    serde_json::from_str(&text).map_err(|source| ApiError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Render `value` as indented JSON text.
pub fn to_pretty_string<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    let mut buf = Vec::with_capacity(4096);
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    // serde_json only ever emits UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write `value` to `path` as indented JSON, replacing any existing file.
pub fn write_json_file<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
) -> Result<(), ApiError> {
    let path = path.as_ref();
    let text = to_pretty_string(value)?;
    fs::write(path, text).map_err(|e| ApiError::io(path, e))
}

/// `*.json` files directly inside `dir`, sorted by file name.
pub fn json_files_in(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, ApiError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| ApiError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ApiError::io(dir, e))?;
        let path = entry.path();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "json");
        if is_json && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `<dir>/<stem of input><suffix>.<extension>`
pub fn derived_path(input: &Path, dir: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!("{stem}{suffix}.{extension}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pretty_output_uses_four_spaces_and_keeps_unicode() {
        let text = to_pretty_string(&json!({"bones": {"頭": 1}})).unwrap();
        assert!(text.contains("\n    \"bones\""));
        assert!(text.contains("頭"));
    }

    #[test]
    fn missing_file_is_reported_as_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_json_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn malformed_file_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").unwrap();
        let err = read_json_file(&path).unwrap_err();
        assert!(matches!(err, ApiError::Malformed { .. }));
        assert!(err.to_string().contains("bad.json"));
    }

    #[test]
    fn json_files_are_listed_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["0002.json", "0001.json", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        let files = json_files_in(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["0001.json", "0002.json"]);
    }

    #[test]
    fn derived_path_appends_suffix() {
        let out = derived_path(Path::new("in/0001.json"), Path::new("out"), "_draw", "png");
        assert_eq!(out, Path::new("out/0001_draw.png"));
    }
}
