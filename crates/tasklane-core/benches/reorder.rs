#![allow(missing_docs)]

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tasklane_core::id::TaskId;
use tasklane_core::{move_item, order_assignments};

fn build_ids(len: usize) -> Vec<TaskId> {
    (0..len).map(|_| TaskId::new()).collect()
}

fn move_to_front_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("task_list_reorder");
    for &len in &[16usize, 128, 1024, 8192] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter_batched(
                || build_ids(len),
                |mut ids| {
                    let last = ids.len() - 1;
                    if move_item(&mut ids, last, 0).is_ok() {
                        black_box(order_assignments(&ids));
                    }
                },
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, move_to_front_benchmark);
criterion_main!(benches);
