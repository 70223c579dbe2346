use bonesketch_api_core::json::read_typed;
use bonesketch_api_core::{PoseSnapshot, ShapeKeyEntry, OFFSCREEN};
use bonesketch_export_core::{ExportConfig, Exporter, RecordedScene, SceneRecording, SceneSource};
use bonesketch_test_fixtures::scenes;

fn walk_cycle() -> RecordedScene {
    let recording: SceneRecording = scenes::load("walk-cycle").expect("walk-cycle fixture");
    RecordedScene::new(recording).expect("valid recording")
}

fn export_all(dir: &std::path::Path) -> Vec<PoseSnapshot> {
    let exporter = Exporter::new(ExportConfig {
        output_dir: Some(dir.to_path_buf()),
        ..Default::default()
    });
    let mut scene = walk_cycle();
    let summary = exporter.export_range(&mut scene).expect("export range");
    assert!(summary.is_complete(), "failures: {:?}", summary.failed);
    assert_eq!(summary.written.len(), 3);
    summary
        .written
        .iter()
        .map(|path| read_typed(path).expect("snapshot parses"))
        .collect()
}

#[test]
fn writes_one_zero_padded_file_per_frame() {
    let dir = tempfile::tempdir().unwrap();
    export_all(dir.path());
    for name in ["0001.json", "0002.json", "0003.json"] {
        assert!(dir.path().join(name).is_file(), "{name} missing");
    }
}

#[test]
fn first_frame_has_every_section() {
    let dir = tempfile::tempdir().unwrap();
    let snaps = export_all(dir.path());
    let first = &snaps[0];

    let bones = first.bones.as_ref().unwrap();
    let order: Vec<&str> = bones.keys().map(String::as_str).collect();
    assert_eq!(order, vec!["hips", "spine", "head", "leg.L", "leg.R"]);
    assert_eq!(bones["hips"].children, vec!["spine", "leg.L", "leg.R"]);

    // hips sit below the camera height, on the optical axis
    let [x, y] = bones["hips"].screen_coords;
    assert_eq!(x, 320);
    assert!(y > 240);

    let camera = first.camera.as_ref().unwrap();
    assert_eq!((camera.resolution_x, camera.resolution_y), (640.0, 480.0));

    // the lamp mesh is not skinned, so only the body contributes
    assert_eq!(first.vertex_groups["group1"].vertices.len(), 3);
    assert_eq!(first.vertex_groups["group1"].edges.len(), 3);
    assert_eq!(first.vertex_groups["group2"].edges.len(), 1);

    let keys = first.shape_keys.as_ref().unwrap();
    assert_eq!(keys.get("smile"), Some(&ShapeKeyEntry::Weight(0.2)));
    assert!(!keys.contains_key("Basis"));
}

#[test]
fn overrides_apply_to_their_frame_only() {
    let dir = tempfile::tempdir().unwrap();
    let snaps = export_all(dir.path());

    let legs = |snap: &PoseSnapshot| snap.bone("leg.L").unwrap().tail_global_coords;
    assert_eq!(legs(&snaps[0]), [0.2, 0.0, 0.0]);
    assert_eq!(legs(&snaps[1]), [0.6, 0.0, 0.1]);
    assert_eq!(legs(&snaps[2]), [0.2, 0.0, 0.0]);

    let group1 = &snaps[1].vertex_groups["group1"];
    assert_eq!(group1.vertices[0].global_coords, [-0.35, 0.0, 2.0]);
    assert!(!snaps[1].vertex_groups.contains_key("group2"));
    assert_eq!(
        snaps[1].shape_keys.as_ref().unwrap().get("smile"),
        Some(&ShapeKeyEntry::Weight(0.8))
    );
}

#[test]
fn frame_without_camera_keeps_bones_offscreen() {
    let dir = tempfile::tempdir().unwrap();
    let snaps = export_all(dir.path());
    let last = &snaps[2];
    assert!(last.camera.is_none());
    assert_eq!(last.bone("head").unwrap().screen_coords, OFFSCREEN);
}

#[test]
fn output_dir_follows_render_path_without_override() {
    let scene = walk_cycle();
    let exporter = Exporter::default();
    let render = &scene.recording().render;
    assert_eq!(exporter.output_dir(render), std::path::PathBuf::from("renders"));
    assert_eq!(scene.frame_range().total(), 3);
}

#[test]
fn zero_weight_vertices_stay_out_of_written_groups() {
    let recording: SceneRecording = serde_json::from_value(serde_json::json!({
        "frame_end": 1,
        "armature": {"name": "Armature", "bones": [{"name": "root", "head": [0, 0, 0], "tail": [0, 0, 1]}]},
        "meshes": [{
            "name": "Body",
            "armature": "Armature",
            "vertex_groups": ["g"],
            "vertices": [
                {"co": [0, 0, 0], "groups": [{"group": 0, "weight": 1.0}]},
                {"co": [1, 0, 0], "groups": [{"group": 0, "weight": 0.0}]}
            ],
            "edges": [[0, 1]]
        }]
    }))
    .unwrap();
    let mut scene = RecordedScene::new(recording).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let exporter = Exporter::new(ExportConfig {
        vertex_groups: vec!["g".into()],
        output_dir: Some(dir.path().to_path_buf()),
        ..Default::default()
    });

    let path = exporter.export_frame(&mut scene, 1).unwrap();
    let snap: PoseSnapshot = read_typed(&path).unwrap();
    let group = &snap.vertex_groups["g"];
    let indices: Vec<usize> = group.vertices.iter().map(|v| v.vertex_index).collect();
    assert_eq!(indices, vec![0]);
    assert!(group.edges.is_empty());
}
