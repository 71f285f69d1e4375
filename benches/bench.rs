use core::hint::black_box;
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use lekid::{IdAllocator, NodeId, TimeSource, WallClock};
use std::{
    sync::{Arc, Barrier},
    thread::scope,
    time::Instant,
};

struct FixedMockTime {
    millis: u64,
}

impl TimeSource for FixedMockTime {
    fn current_millis(&self) -> u64 {
        self.millis
    }
}

// Number of IDs generated per benchmark iteration (per-thread for
// multi-threaded). Matches the sequence capacity of a single tick so the
// frozen-clock benchmark never enters the exhaustion spin.
const TOTAL_IDS: usize = 4096;

fn node() -> NodeId {
    NodeId::new(1, 1).expect("in range")
}

/// Hot path: frozen clock, every allocation is a sequence increment.
fn bench_sequential_hot(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocator/sequential/hot");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let allocator = IdAllocator::new(node(), FixedMockTime { millis: 42 });
                for _ in 0..TOTAL_IDS {
                    black_box(allocator.next_id().expect("forward clock"));
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Realistic wall-clock behavior, including the occasional exhaustion spin.
fn bench_sequential_wallclock(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocator/sequential/wallclock");
    group.throughput(Throughput::Elements(TOTAL_IDS as u64));

    group.bench_function(format!("elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let start = Instant::now();

            for _ in 0..iters {
                let allocator = IdAllocator::new(node(), WallClock::default());
                for _ in 0..TOTAL_IDS {
                    black_box(allocator.next_id().expect("forward clock"));
                }
            }

            start.elapsed()
        });
    });

    group.finish();
}

/// Shared allocator across threads contending on the lock.
fn bench_contended_wallclock(c: &mut Criterion) {
    const THREADS: usize = 8;

    let mut group = c.benchmark_group("allocator/contended/wallclock");
    group.throughput(Throughput::Elements((TOTAL_IDS * THREADS) as u64));

    group.bench_function(format!("threads/{THREADS}/elems/{TOTAL_IDS}"), |b| {
        b.iter_custom(|iters| {
            let mut elapsed = std::time::Duration::ZERO;

            for _ in 0..iters {
                let allocator = Arc::new(IdAllocator::new(node(), WallClock::default()));
                let barrier = Arc::new(Barrier::new(THREADS + 1));
                let mut start = Instant::now();

                scope(|s| {
                    for _ in 0..THREADS {
                        let allocator = Arc::clone(&allocator);
                        let barrier = Arc::clone(&barrier);
                        s.spawn(move || {
                            barrier.wait();
                            for _ in 0..TOTAL_IDS {
                                black_box(allocator.next_id().expect("forward clock"));
                            }
                        });
                    }

                    barrier.wait();
                    start = Instant::now();
                    // The scope joins all workers before returning.
                });
                elapsed += start.elapsed();
            }

            elapsed
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_sequential_hot,
    bench_sequential_wallclock,
    bench_contended_wallclock
);
criterion_main!(benches);
