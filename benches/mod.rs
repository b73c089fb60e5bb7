use criterion::{criterion_group, criterion_main};

mod turn_bench;

criterion_group!(
    benches,
    replay_bench::register_benchmarks,
    turn_bench::register_benchmarks
);
criterion_main!(benches);
