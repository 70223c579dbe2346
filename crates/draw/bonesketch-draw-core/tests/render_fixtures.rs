use std::fs;

use bonesketch_draw_core::{
    render_path, CustomRegistry, DrawProgram, FontBook, InstructionSet, RenderConfig, Renderer,
    StepStatus,
};
use bonesketch_test_fixtures::{drawings, snapshots};
use serde_json::Value as JsonValue;

fn renderer() -> Renderer {
    Renderer::with_fonts(RenderConfig::default(), FontBook::with_dirs_only(Vec::new()))
}

fn program(name: &str) -> DrawProgram {
    let set: InstructionSet = drawings::load(name).expect("drawing fixture");
    DrawProgram::build(set, &CustomRegistry::with_builtins())
}

fn stick_figure() -> JsonValue {
    snapshots::load("stick-figure").expect("snapshot fixture")
}

#[test]
fn stick_figure_draws_every_instruction_in_order() {
    let out = renderer()
        .render(&stick_figure(), &program("stick-figure"))
        .expect("render");
    assert_eq!(out.image.dimensions(), (640, 480));
    assert_eq!(out.report.drawn(), 7, "{:?}", out.report);

    let px = |x, y| out.image.get_pixel(x, y).0;
    // ground strip
    assert_eq!(px(5, 470), [0xdd, 0xdd, 0xdd]);
    // spine line, hips to head
    assert_eq!(px(320, 200), [0, 0, 128]);
    // head disc at the head bone's tail
    assert_eq!(px(320, 128), [255, 200, 160]);
    // group1 edge drawn after the spine
    assert_eq!(px(330, 160), [220, 20, 60]);
    // conditional point
    assert_eq!(px(320, 240), [0, 0, 0]);
    assert_eq!(px(5, 5), [255, 255, 255]);
}

#[test]
fn all_shapes_reports_skips_and_failures_per_instruction() {
    let out = renderer()
        .render(&stick_figure(), &program("all-shapes"))
        .expect("render");
    let report = &out.report;
    assert_eq!(report.steps.len(), 13);
    assert_eq!(report.drawn(), 11, "{report:?}");
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.failed(), 1);
    assert!(matches!(report.steps[10].status, StepStatus::Failed(_)));
    assert_eq!(report.steps[10].draw_type, "bitmap");
    assert!(matches!(report.steps[11].status, StepStatus::Skipped(_)));

    let px = |x, y| out.image.get_pixel(x, y).0;
    assert_eq!(px(40, 40), [255, 0, 0]);
    assert_eq!(px(120, 40), [255, 255, 0]);
    assert_eq!(px(100, 80), [0, 128, 0]);
    assert_eq!(px(180, 120), [128, 0, 128]);
    assert_eq!(px(100, 180), [0, 0, 0]);
    assert_eq!(px(150, 170), [255, 165, 0]);
    assert_eq!(px(230, 190), [0, 128, 128]);
    // the custom skeleton layer lands on the spine
    assert_eq!(px(320, 200), [128, 128, 128]);
}

#[test]
fn folder_batch_continues_past_bad_files() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    let snapshot = snapshots::json("stick-figure").unwrap();
    fs::write(input.path().join("0001.json"), &snapshot).unwrap();
    fs::write(input.path().join("0002.json"), "{ broken").unwrap();
    fs::write(input.path().join("0003.json"), r#"{"bones": {}}"#).unwrap();
    fs::write(input.path().join("0004.json"), &snapshot).unwrap();
    fs::write(input.path().join("notes.txt"), "ignored").unwrap();

    let summary = render_path(
        &mut renderer(),
        &program("stick-figure"),
        input.path(),
        Some(output.path()),
        "_draw",
    )
    .expect("folder readable");

    assert_eq!(
        summary.written,
        vec![
            output.path().join("0001_draw.png"),
            output.path().join("0004_draw.png")
        ]
    );
    assert_eq!(summary.failed.len(), 2);
    assert!(summary.failed[0].0.ends_with("0002.json"));
    assert!(summary.failed[1].1.contains("CAMERA_RESOLUTION_X"));
    let img = image::open(output.path().join("0001_draw.png")).unwrap();
    assert_eq!((img.width(), img.height()), (640, 480));
}

#[test]
fn single_file_output_naming() {
    let dir = tempfile::tempdir().unwrap();
    let input = snapshots::path("stick-figure").unwrap();
    let prog = program("stick-figure");

    let into_dir = render_path(&mut renderer(), &prog, &input, Some(dir.path()), "_x").unwrap();
    assert_eq!(into_dir.written, vec![dir.path().join("stick_figure_x.png")]);

    let target = dir.path().join("custom-name.png");
    let explicit = render_path(&mut renderer(), &prog, &input, Some(&target), "_x").unwrap();
    assert_eq!(explicit.written, vec![target.clone()]);
    assert!(target.is_file());
}

#[test]
fn missing_snapshot_is_a_per_file_failure() {
    let dir = tempfile::tempdir().unwrap();
    let summary = render_path(
        &mut renderer(),
        &program("stick-figure"),
        &dir.path().join("absent.json"),
        Some(&dir.path().join("out.png")),
        "_draw",
    )
    .unwrap();
    assert!(summary.written.is_empty());
    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].1.contains("not found"));
}
