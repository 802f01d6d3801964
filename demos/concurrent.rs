use circuit_gate::{FailurePolicy, GateBuilder, GateConfig, HookRegistry, PolicyKind};
use std::error::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Settings as they might arrive from a config file
    let selector = std::env::args().nth(1).unwrap_or_else(|| "failure_rate".to_string());
    let kind: PolicyKind = selector.parse()?;

    let hooks = HookRegistry::new();
    hooks.set_on_open(|t| println!(">>> gate opened (from {}, window #{})", t.from, t.batch));
    hooks.set_on_close(|_| println!(">>> gate closed"));

    let config = GateConfig {
        name: "orders-db".to_string(),
        window_interval: Duration::from_millis(500),
        cool_down: Duration::from_millis(200),
        half_open_budget: 2,
        policy: FailurePolicy::from(kind),
    };
    let gate = GateBuilder::from_config(config).hooks(hooks).build()?;

    // Downstream is healthy for the first and last thirds of the run
    let tick = Arc::new(AtomicU64::new(0));
    let handles: Vec<_> = (0..4)
        .map(|worker| {
            let gate = gate.clone();
            let tick = Arc::clone(&tick);
            thread::spawn(move || {
                let mut rejected = 0;
                for _ in 0..150 {
                    let now = tick.fetch_add(1, Ordering::Relaxed);
                    let result = gate.guard(|| {
                        thread::sleep(Duration::from_millis(2));
                        if (200..400).contains(&now) {
                            Err("connection refused")
                        } else {
                            Ok(now)
                        }
                    });
                    if matches!(&result, Err(e) if e.is_rejection()) {
                        rejected += 1;
                    }
                    thread::sleep(Duration::from_millis(5));
                }
                println!("worker {} saw {} rejections", worker, rejected);
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }

    println!("final state: {} ({:?})", gate.state(), gate.metrics());
    Ok(())
}
