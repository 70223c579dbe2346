//! Bone renaming and key filtering for snapshot documents.

use std::fs;
use std::path::{Path, PathBuf};

use bonesketch_api_core::json::{derived_path, json_files_in, read_json_file, write_json_file};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::error::TrimError;
use crate::table::{ExcludeKeys, RenameTable};

/// Folder run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimOptions {
    pub input_dir: PathBuf,
    /// Defaults to `input_dir`.
    pub output_dir: Option<PathBuf>,
    pub suffix: String,
    /// Write `<stem>.json` regardless of `suffix`.
    pub no_suffix: bool,
}

impl Default for TrimOptions {
    fn default() -> Self {
        TrimOptions {
            input_dir: PathBuf::from("."),
            output_dir: None,
            suffix: "_trim".into(),
            no_suffix: false,
        }
    }
}

impl TrimOptions {
    pub fn effective_suffix(&self) -> &str {
        if self.no_suffix {
            ""
        } else {
            &self.suffix
        }
    }

    pub fn effective_output_dir(&self) -> &Path {
        self.output_dir.as_deref().unwrap_or(&self.input_dir)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrimSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl TrimSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Copy of `value` without any object key listed in `exclude`, at any depth.
pub fn strip_keys(value: &JsonValue, exclude: &ExcludeKeys) -> JsonValue {
    match value {
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .filter(|(k, _)| !exclude.contains(k))
                .map(|(k, v)| (k.clone(), strip_keys(v, exclude)))
                .collect(),
        ),
        JsonValue::Array(items) => {
            JsonValue::Array(items.iter().map(|v| strip_keys(v, exclude)).collect())
        }
        other => other.clone(),
    }
}

/// Keep the bones named in `table` under their new names, in source order,
/// then every other top-level section. Excluded keys are dropped everywhere.
pub fn trim_document(
    doc: &JsonValue,
    table: &RenameTable,
    exclude: &ExcludeKeys,
) -> Result<JsonValue, TrimError> {
    let source = doc.as_object().ok_or(TrimError::NoBones)?;
    let bones = source
        .get("bones")
        .and_then(JsonValue::as_object)
        .ok_or(TrimError::NoBones)?;

    let mut renamed = JsonMap::new();
    for (name, record) in bones {
        if let Some(new_name) = table.get(name) {
            renamed.insert(new_name.to_string(), strip_keys(record, exclude));
        }
    }

    let mut out = JsonMap::new();
    out.insert("bones".into(), JsonValue::Object(renamed));
    for (key, value) in source.iter().filter(|(k, _)| k.as_str() != "bones") {
        out.insert(key.clone(), strip_keys(value, exclude));
    }
    Ok(JsonValue::Object(out))
}

pub fn trim_file(
    input: &Path,
    output: &Path,
    table: &RenameTable,
    exclude: &ExcludeKeys,
) -> Result<(), TrimError> {
    let doc = read_json_file(input)?;
    let trimmed = trim_document(&doc, table, exclude)?;
    write_json_file(output, &trimmed)?;
    Ok(())
}

/// Trim every `*.json` file of `options.input_dir`.
///
/// Fails only when the input folder cannot be listed or the output folder
/// cannot be created; per-file failures are logged and collected.
pub fn trim_dir(
    options: &TrimOptions,
    table: &RenameTable,
    exclude: &ExcludeKeys,
) -> Result<TrimSummary, TrimError> {
    let files = json_files_in(&options.input_dir)?;
    let out_dir = options.effective_output_dir();
    fs::create_dir_all(out_dir).map_err(|source| TrimError::OutputDir {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let mut summary = TrimSummary::default();
    for input in files {
        let output = derived_path(&input, out_dir, options.effective_suffix(), "json");
        match trim_file(&input, &output, table, exclude) {
            Ok(()) => {
                info!("wrote '{}'", output.display());
                summary.written.push(output);
            }
            Err(err) => {
                warn!("{}: {err}", input.display());
                summary.failed.push((input, err.to_string()));
            }
        }
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table() -> RenameTable {
        [("J_Bip_C_Spine", "spine"), ("J_Bip_C_Hips", "hips")]
            .into_iter()
            .collect()
    }

    #[test]
    fn bones_are_renamed_in_source_order_and_unmapped_ones_dropped() {
        let doc = json!({
            "camera": {"focal_length": 50.0},
            "bones": {
                "J_Bip_C_Hips": {"screen_coords": [1, 2], "children": ["J_Bip_C_Spine"]},
                "J_Sec_Hair": {"screen_coords": [3, 4]},
                "J_Bip_C_Spine": {"screen_coords": [5, 6]}
            }
        });
        let out = trim_document(&doc, &table(), &ExcludeKeys::default()).unwrap();
        let top: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(top, vec!["bones", "camera"]);
        let bones: Vec<&String> = out["bones"].as_object().unwrap().keys().collect();
        assert_eq!(bones, vec!["hips", "spine"]);
        // child references keep their source names
        assert_eq!(out["bones"]["hips"]["children"], json!(["J_Bip_C_Spine"]));
    }

    #[test]
    fn excluded_keys_go_at_every_depth() {
        let doc = json!({
            "bones": {"J_Bip_C_Hips": {"global_coords": [0, 0, 0], "screen_coords": [1, 2]}},
            "group1": {"vertices": [{"vertex_index": 0, "global_coords": [1, 1, 1]}]},
            "global_coords": 5
        });
        let exclude = ExcludeKeys::from_lines(["global_coords"]);
        let out = trim_document(&doc, &table(), &exclude).unwrap();
        assert_eq!(
            out,
            json!({
                "bones": {"hips": {"screen_coords": [1, 2]}},
                "group1": {"vertices": [{"vertex_index": 0}]}
            })
        );
    }

    #[test]
    fn documents_without_bones_are_rejected() {
        for doc in [json!({"camera": {}}), json!({"bones": [1, 2]}), json!([1])] {
            assert!(matches!(
                trim_document(&doc, &table(), &ExcludeKeys::default()),
                Err(TrimError::NoBones)
            ));
        }
    }

    #[test]
    fn suffix_options() {
        let mut opts = TrimOptions::default();
        assert_eq!(opts.effective_suffix(), "_trim");
        opts.no_suffix = true;
        assert_eq!(opts.effective_suffix(), "");
        assert_eq!(opts.effective_output_dir(), Path::new("."));
    }
}
