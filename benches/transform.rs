use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use pattermer::{PatternStore, RenameEngine, transform};
use std::hint::black_box;

fn store() -> PatternStore {
    let mut store = PatternStore::new();
    store.add_variable("date", r"\d{4}-\d{2}-\d{2}").unwrap();
    store.add_expression("date", r"\d{8}").unwrap();
    store.add_variable("tag", r"\[\w+\]").unwrap();
    store.add_variable("author", "[A-Za-z]+").unwrap();
    store.reorder_queue(["date", "tag", "author"]);
    store
}

fn filenames(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 3 {
            0 => format!("Author{}_2020-01-{:02} [draft].txt", i, i % 28 + 1),
            1 => format!("scan_{:08}.pdf", 20200101 + i),
            _ => format!("untitled {}.md", i),
        })
        .collect()
}

fn bench_transform(c: &mut Criterion) {
    let store = store();
    let mut group = c.benchmark_group("transform");

    for count in [10, 100, 1000] {
        let files = filenames(count);

        group.bench_with_input(BenchmarkId::new("compile_each_call", count), &files, |b, files| {
            b.iter(|| transform(store.queue(), &store, black_box("%date% %author% %tag%"), files))
        });

        let engine = RenameEngine::compile(store.queue(), &store);
        group.bench_with_input(BenchmarkId::new("precompiled", count), &files, |b, files| {
            b.iter(|| engine.apply(black_box("%date% %author% %tag%"), files))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_transform);
criterion_main!(benches);
