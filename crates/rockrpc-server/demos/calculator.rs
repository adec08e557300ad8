//! Line-oriented JSON-RPC calculator
//!
//! Reads one request per line from stdin and prints one response per line:
//!
//! ```text
//! echo '{"id":1,"method":"Sum","params":[2,3]}' | cargo run -p rockrpc-server --example calculator
//! ```

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use rockrpc_server::{DispatcherConfig, JsonRpcDispatcher, rpc_service};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CalculatorError {
    #[error("Division by zero")]
    DivideByZero,
}

struct Calculator;

#[rpc_service(name = "calculator", description = "Basic arithmetic")]
impl Calculator {
    #[rpc_method(name = "Sum", description = "Add two numbers")]
    fn sum(&self, a: f64, b: f64) -> f64 {
        a + b
    }

    #[rpc_method(name = "Total", description = "Add any number of values")]
    fn total(&self, #[rpc_param(variadic)] values: Vec<f64>) -> f64 {
        values.iter().sum()
    }

    #[rpc_method(name = "Divide", description = "Divide a by b")]
    fn divide(&self, a: f64, b: f64) -> Result<f64, CalculatorError> {
        if b == 0.0 {
            return Err(CalculatorError::DivideByZero);
        }
        Ok(a / b)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let dispatcher = JsonRpcDispatcher::new(Arc::new(Calculator))
        .with_config(DispatcherConfig::default().with_local_execution(false));
    info!("Calculator ready; reading requests from stdin");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        writeln!(out, "{}", dispatcher.process_text(&line)?)?;
    }
    Ok(())
}
