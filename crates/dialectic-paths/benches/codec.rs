//! Codec throughput
//!
//! Construct and deconstruct one path per constructor branch. Cloning a
//! session walks every stored artifact, so both directions sit on that
//! path.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dialectic_paths::{construct_storage_path, deconstruct_storage_path, DeconstructInput};
use dialectic_test_utils::every_branch;

fn bench_construct(c: &mut Criterion) {
    let mut group = c.benchmark_group("construct");
    for (index, context) in every_branch().iter().enumerate() {
        let id = BenchmarkId::new(context.file_type.as_str(), index);
        group.bench_with_input(id, context, |b, context| {
            b.iter(|| construct_storage_path(black_box(context)));
        });
    }
    group.finish();
}

fn bench_deconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("deconstruct");
    for (index, context) in every_branch().iter().enumerate() {
        let Ok(path) = construct_storage_path(context) else {
            continue;
        };
        let input = DeconstructInput::from(&path);
        let id = BenchmarkId::new(context.file_type.as_str(), index);
        group.bench_with_input(id, &input, |b, input| {
            b.iter(|| deconstruct_storage_path(black_box(input)));
        });
    }
    group.finish();
}

fn bench_clone_session(c: &mut Criterion) {
    let inputs: Vec<DeconstructInput> = every_branch()
        .iter()
        .filter_map(|context| construct_storage_path(context).ok())
        .map(|path| DeconstructInput::from(&path))
        .collect();
    c.bench_function("clone_session", |b| {
        b.iter(|| {
            for input in &inputs {
                let info = deconstruct_storage_path(input);
                if let Ok(context) = info.to_path_context(Some("0b1c2d3e")) {
                    black_box(construct_storage_path(&context).ok());
                }
            }
        });
    });
}

criterion_group!(benches, bench_construct, bench_deconstruct, bench_clone_session);
criterion_main!(benches);
