use std::fs;

use bonesketch_api_core::json::read_json_file;
use bonesketch_test_fixtures::{snapshots, trim};
use bonesketch_trim_core::{trim_dir, ExcludeKeys, RenameTable, TrimOptions};
use serde_json::json;

fn fixtures() -> (RenameTable, ExcludeKeys) {
    let table = RenameTable::from_csv_path(trim::rename_path("vrm").unwrap()).expect("rename table");
    let exclude_path = trim::exclude_path("vrm").unwrap().expect("exclude list");
    let exclude = ExcludeKeys::from_path(exclude_path).expect("exclude keys");
    (table, exclude)
}

#[test]
fn folder_run_renames_filters_and_reports() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let pose = snapshots::json("vrm-pose").unwrap();
    fs::write(input.path().join("0001.json"), &pose).unwrap();
    fs::write(input.path().join("0002.json"), r#"{"camera": {}}"#).unwrap();
    fs::write(input.path().join("readme.md"), "skip me").unwrap();

    let (table, exclude) = fixtures();
    let options = TrimOptions {
        input_dir: input.path().to_path_buf(),
        output_dir: Some(output.path().join("trimmed")),
        ..Default::default()
    };
    let summary = trim_dir(&options, &table, &exclude).expect("trim run");

    let written = output.path().join("trimmed/0001_trim.json");
    assert_eq!(summary.written, vec![written.clone()]);
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].0.ends_with("0002.json"));

    let doc = read_json_file(&written).unwrap();
    let bones: Vec<&String> = doc["bones"].as_object().unwrap().keys().collect();
    assert_eq!(bones, vec!["hips", "spine"]);
    assert_eq!(
        doc["bones"]["hips"],
        json!({"screen_coords": [320, 240], "tail_screen_coords": [320, 224], "children": ["J_Bip_C_Spine"]})
    );
    assert!(doc["group1"]["vertices"][0].get("global_coords").is_none());
    assert_eq!(doc["camera"]["resolution_x"], json!(640.0));

    let text = fs::read_to_string(&written).unwrap();
    assert!(text.starts_with("{\n    \"bones\""));
}

#[test]
fn no_suffix_writes_next_to_the_input() {
    let input = tempfile::tempdir().unwrap();
    fs::write(input.path().join("pose.json"), snapshots::json("vrm-pose").unwrap()).unwrap();
    let (table, exclude) = fixtures();
    let options = TrimOptions {
        input_dir: input.path().to_path_buf(),
        no_suffix: true,
        ..Default::default()
    };
    let summary = trim_dir(&options, &table, &exclude).unwrap();
    assert_eq!(summary.written, vec![input.path().join("pose.json")]);
    let doc = read_json_file(input.path().join("pose.json")).unwrap();
    assert!(doc["bones"].get("J_Bip_C_Hips").is_none());
    assert!(doc["bones"].get("hips").is_some());
}
