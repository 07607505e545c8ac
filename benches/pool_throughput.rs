use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dtp_pool::ThreadPool;

fn enqueue_and_wait(c: &mut Criterion) {
    let mut group = c.benchmark_group("pool_enqueue_wait");

    for workers in [1usize, 4, 20] {
        let pool = ThreadPool::new(workers).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, _| {
            b.iter(|| {
                let handles: Vec<_> = (0..64u64)
                    .map(|i| pool.enqueue_task(move || black_box(i).wrapping_mul(31)).unwrap())
                    .collect();
                handles.into_iter().map(|h| h.wait().unwrap()).sum::<u64>()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, enqueue_and_wait);
criterion_main!(benches);
