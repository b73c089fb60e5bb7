use criterion::{BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tokio::runtime::{Builder, Runtime};
use turn_sequencer::sequencer::interleave;
use turn_sequencer::{Sequencer, WakePolicy};

fn runtime(workers: usize) -> Runtime {
    Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_time()
        .build()
        .unwrap()
}

pub fn bench_interleave_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("interleave_throughput");
    let rt = runtime(4);

    for target in [100u64, 1_000, 10_000] {
        group.throughput(Throughput::Elements(target * 2));
        for wake in [WakePolicy::Targeted, WakePolicy::Broadcast] {
            let id = BenchmarkId::new(format!("{wake:?}").to_lowercase(), target);
            group.bench_with_input(id, &target, |b, &n| {
                b.iter(|| {
                    rt.block_on(async {
                        let config = interleave::config(n).with_wake(wake).with_journal(false);
                        let mut sequencer =
                            Sequencer::configure(interleave::roles(), config).unwrap();
                        sequencer.start().unwrap();
                        black_box(sequencer.await_completion(None).await.unwrap())
                    })
                });
            });
        }
    }

    group.finish();
}

pub fn bench_validation(c: &mut Criterion) {
    let mut group = c.benchmark_group("configure_validation");

    for target in [1_000u64, 100_000] {
        group.bench_with_input(BenchmarkId::new("zero_odd_even", target), &target, |b, &n| {
            b.iter(|| black_box(interleave::zero_odd_even(n).unwrap()));
        });
    }

    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    bench_interleave_throughput(c);
    bench_validation(c);
}
