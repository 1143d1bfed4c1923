//! Benchmarks for control → model dispatch.
//!
//! Run with: `cargo bench --package view-binder --bench dispatch_bench`
//!
//! Compares one funnel subscription per relation against the indexed
//! dispatcher as the number of relations on one control grows.

use std::hint::black_box;
use std::rc::Rc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;
use view_binder::{BindConfig, BindingRelation, DispatchMode, MemoryEntity, bind_control_to_model};

fn relations(count: usize) -> Vec<BindingRelation> {
    (0..count)
        .map(|i| {
            // Each relation gets its own event type so one edit fans out to a
            // single observer, isolating the model-side dispatch cost.
            BindingRelation::new(format!("name{i}"), format!("prop{i}"))
                .property_change_event_type(format!("edit{i}"))
        })
        .collect()
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("control_to_model_dispatch");
    for count in [4usize, 32, 256] {
        for (label, mode) in [
            ("per_relation", DispatchMode::PerRelation),
            ("indexed", DispatchMode::Indexed),
        ] {
            let model = Rc::new(MemoryEntity::new("model").silent());
            let control = Rc::new(MemoryEntity::new("control").silent());
            let _set = bind_control_to_model(
                &model,
                &control,
                &relations(count),
                &BindConfig::new().dispatch(mode),
            )
            .expect("valid relations");
            let last = count - 1;
            let prop = format!("prop{last}");
            let event = format!("edit{last}");

            group.bench_with_input(BenchmarkId::new(label, count), &count, |b, _| {
                let mut n = 0i64;
                b.iter(|| {
                    n += 1;
                    control
                        .input_with(&prop, json!(n), event.as_str())
                        .expect("silent entities accept writes");
                    black_box(&model);
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_dispatch);
criterion_main!(benches);
