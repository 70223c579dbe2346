use bonesketch_draw_core::{
    CustomRegistry, DrawProgram, Expression, FontBook, InstructionSet, RenderConfig, Renderer,
};
use bonesketch_api_core::ConstantNamespace;
use bonesketch_test_fixtures::{drawings, snapshots};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::Value as JsonValue;

fn bench_expression_eval(c: &mut Criterion) {
    let data: JsonValue = snapshots::load("stick-figure").expect("snapshot fixture");
    let ns = ConstantNamespace::flatten(&data);
    let expr = Expression::parse(
        "max(8, abs(BONES_HEAD_SCREEN_COORDS_1 - BONES_HEAD_TAIL_SCREEN_COORDS_1) // 2)",
    )
    .expect("expression parses");

    c.bench_function("expression_eval", |b| {
        b.iter(|| expr.eval(black_box(&ns)))
    });
}

fn bench_render_stick_figure(c: &mut Criterion) {
    let data: JsonValue = snapshots::load("stick-figure").expect("snapshot fixture");
    let set: InstructionSet = drawings::load("stick-figure").expect("drawing fixture");
    let program = DrawProgram::build(set, &CustomRegistry::with_builtins());
    let mut renderer =
        Renderer::with_fonts(RenderConfig::default(), FontBook::with_dirs_only(Vec::new()));

    c.bench_function("render_stick_figure", |b| {
        b.iter(|| {
            let out = renderer.render(black_box(&data), &program).expect("render");
            black_box(out.report.drawn())
        })
    });
}

criterion_group!(benches, bench_expression_eval, bench_render_stick_figure);
criterion_main!(benches);
