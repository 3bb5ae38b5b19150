use criterion::{criterion_group, criterion_main, Criterion};
use lrspec::{compiler::Config, export::export, grammar::Grammar};
use std::{env, path::PathBuf};

criterion_main!(benches);
criterion_group!(benches, bench_arithmetic, bench_misc);

fn bench_arithmetic(c: &mut Criterion) {
    bench_compile(c, "arithmetic");
    bench_compile(c, "arithmetic_prec");
}

fn bench_misc(c: &mut Criterion) {
    bench_compile(c, "dangling_else");
    bench_compile(c, "json");
}

fn bench_compile(c: &mut Criterion, grammar_name: &str) {
    let project_root = env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .expect("missing environment variable: `CARGO_MANIFEST_DIR'");
    let grammar = Grammar::from_file(
        project_root.join(format!("tests/grammars/{}.grammar.json", grammar_name)),
    )
    .unwrap();

    let mut group = c.benchmark_group(grammar_name);
    group.bench_function("compile", |b| {
        b.iter(|| Config::new().compile(&grammar).unwrap());
    });
    group.bench_function("compile_skinny", |b| {
        b.iter(|| Config::new().skinny(true).compile(&grammar).unwrap());
    });
    let spec = Config::new().compile(&grammar).unwrap();
    group.bench_function("export", |b| {
        b.iter(|| export(&spec).to_json().unwrap());
    });
    group.finish();
}
