use circuit_gate::{FailurePolicy, Gate, GuardError};
use std::error::Error;
use std::fmt;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// Custom error type that implements Error trait
#[derive(Debug)]
struct ServiceError(String);

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service error: {}", self.0)
    }
}

impl Error for ServiceError {}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .init();

    let gate = Gate::builder()
        .name("my-gate")
        .policy(FailurePolicy::absolute(2)) // 2 failures in a window trip the gate
        .cool_down(Duration::from_secs(1)) // 1 second before probing
        .half_open_budget(3) // 3 probes, 3 successes to close
        .build()?;

    println!("Gate initial state: {}", gate.state());

    // Calls 3..8 fail, everything else succeeds
    for i in 0..20 {
        let result = gate.guard(|| {
            if (3..8).contains(&i) {
                Err(ServiceError("External service error".to_string()))
            } else {
                Ok(format!("response #{}", i))
            }
        });

        match result {
            Ok(body) => println!("Attempt {}: succeeded with {}", i, body),
            Err(err) if err.is_rejection() => println!("Attempt {}: rejected, {}", i, err),
            Err(GuardError::Operation(err)) => println!("Attempt {}: failed, {}", i, err),
            Err(err) => println!("Attempt {}: panicked, {}", i, err),
        }

        let metrics = gate.metrics();
        println!(
            "  state: {}, window #{}: {} calls, {} failed",
            gate.state(),
            metrics.batch,
            metrics.total,
            metrics.fails
        );

        thread::sleep(Duration::from_millis(300));
    }

    Ok(())
}
