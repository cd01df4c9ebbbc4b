//! Benchmark aggregation server daemon.
//!
//! Listens for frame reports from the client fleet and prints a running
//! statistics report at a fixed cadence. Report lines go to stdout;
//! diagnostics go to stderr.
//!
//! # Usage
//!
//! ```sh
//! synthbench-server --bind 0.0.0.0:56636 --interval 30
//! ```

use std::io;
use std::time::Duration;

use tracing::info;

use synthbench::aggregator::{Aggregator, AggregatorError};
use synthbench::config::ServerConfig;

fn main() {
    synthbench::trace::init();

    if let Err(e) = run() {
        eprintln!("synthbench-server: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AggregatorError> {
    let args: Vec<String> = std::env::args().collect();
    let config = parse_args(&args)?;

    let mut aggregator = Aggregator::new(&config)?;
    info!(
        interval_secs = config.bookkeep_interval.as_secs(),
        "stats reported and stale clients evicted each interval"
    );
    aggregator.run()
}

fn invalid(msg: impl Into<String>) -> AggregatorError {
    AggregatorError::Bind(io::Error::new(io::ErrorKind::InvalidInput, msg.into()))
}

/// Parses command line arguments into a server configuration.
fn parse_args(args: &[String]) -> Result<ServerConfig, AggregatorError> {
    let mut config = ServerConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" | "-b" => {
                i += 1;
                let value = args.get(i).ok_or_else(|| invalid("missing value for --bind"))?;
                let bind = value
                    .parse()
                    .map_err(|e| invalid(format!("bad --bind address: {e}")))?;
                config = config.with_bind(bind);
            }
            "--interval" | "-t" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| invalid("missing value for --interval"))?;
                let secs: u64 = value
                    .parse()
                    .map_err(|e| invalid(format!("bad --interval value: {e}")))?;
                if secs == 0 {
                    return Err(invalid("--interval must be > 0"));
                }
                config = config.with_interval(Duration::from_secs(secs));
            }
            "--recv-buffer" => {
                i += 1;
                let value = args
                    .get(i)
                    .ok_or_else(|| invalid("missing value for --recv-buffer"))?;
                let bytes: usize = value
                    .parse()
                    .map_err(|e| invalid(format!("bad --recv-buffer value: {e}")))?;
                config = config.with_recv_buffer(bytes);
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg => {
                return Err(invalid(format!("unknown argument: {arg}")));
            }
        }
        i += 1;
    }

    Ok(config)
}

fn print_usage() {
    eprintln!(
        r#"synthbench-server - frame report aggregation server

USAGE:
    synthbench-server [OPTIONS]

OPTIONS:
    -b, --bind <ADDR>       Bind address (default: 0.0.0.0:56636)
    -t, --interval <SECS>   Bookkeeping interval; also the client eviction
                            window (default: 30)
        --recv-buffer <BYTES>
                            Socket receive buffer size (default: system)
    -h, --help              Print this help message

EXAMPLE:
    synthbench-server --bind 0.0.0.0:56636 --interval 30
"#
    );
}
