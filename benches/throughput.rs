use circuit_gate::{FailurePolicy, Gate};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::error::Error;
use std::fmt;
use std::time::Duration;

// Custom error type that implements Error trait
#[derive(Debug)]
struct BenchError(String);

impl BenchError {
    fn new(msg: &str) -> Self {
        BenchError(msg.to_string())
    }
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Benchmark error: {}", self.0)
    }
}

impl Error for BenchError {}

fn successful_operation() -> Result<(), BenchError> {
    Ok(())
}

fn failing_operation() -> Result<(), BenchError> {
    Err(BenchError::new("Simulated failure"))
}

fn bench_gate_closed(c: &mut Criterion) {
    let gate = Gate::builder()
        .policy(FailurePolicy::failure_rate(0.5, 10))
        .cool_down(Duration::from_secs(30))
        .build()
        .unwrap();

    c.bench_function("gate_closed_success", |b| {
        b.iter(|| black_box(gate.guard(successful_operation)));
    });
}

fn bench_gate_open_rejection(c: &mut Criterion) {
    let gate = Gate::builder()
        .cool_down(Duration::from_secs(3600))
        .build()
        .unwrap();
    gate.force_open();

    c.bench_function("gate_open_rejection", |b| {
        b.iter(|| black_box(gate.guard(successful_operation)));
    });
}

fn bench_gate_transition(c: &mut Criterion) {
    let gate = Gate::builder()
        .policy(FailurePolicy::consecutive(5))
        .cool_down(Duration::from_secs(30))
        .build()
        .unwrap();

    c.bench_function("gate_transition", |b| {
        b.iter_custom(|iters| {
            let start = std::time::Instant::now();

            for _ in 0..iters {
                // Force closed to ensure consistent starting point
                gate.force_closed();

                // Make 5 failing calls to trip the gate
                for _ in 0..5 {
                    let _ = black_box(gate.guard(failing_operation));
                }

                // One open-gate rejection
                let _ = black_box(gate.guard(successful_operation));
            }

            start.elapsed()
        });
    });
}

fn bench_gate_concurrent(c: &mut Criterion) {
    use std::sync::{Arc, Barrier};
    use std::thread;

    let gate = Gate::builder()
        .policy(FailurePolicy::consecutive(100)) // High to avoid tripping
        .cool_down(Duration::from_secs(30))
        .build()
        .unwrap();

    const THREAD_COUNT: usize = 4;
    const ITERATIONS_PER_THREAD: usize = 1000;

    c.bench_function("gate_concurrent", |b| {
        b.iter(|| {
            let barrier = Arc::new(Barrier::new(THREAD_COUNT + 1));
            let mut handles = Vec::with_capacity(THREAD_COUNT);

            for _ in 0..THREAD_COUNT {
                let thread_gate = gate.clone();
                let thread_barrier = Arc::clone(&barrier);

                handles.push(thread::spawn(move || {
                    thread_barrier.wait();
                    for _ in 0..ITERATIONS_PER_THREAD {
                        let _ = black_box(thread_gate.guard(successful_operation));
                    }
                }));
            }

            // Start all threads simultaneously
            barrier.wait();

            for handle in handles {
                handle.join().unwrap();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_gate_closed,
    bench_gate_open_rejection,
    bench_gate_transition,
    bench_gate_concurrent
);
criterion_main!(benches);
