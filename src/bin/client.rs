//! Benchmark client daemon.
//!
//! Paces a synthetic frame loop at a fixed rate and reports each frame's
//! measured duration to the aggregator over UDP.
//!
//! # Usage
//!
//! ```sh
//! synthbench-client 192.168.1.100 56636 --rate 30
//! ```

use std::io;
use std::net::IpAddr;
use std::time::Duration;

use tracing::info;

use synthbench::clock::MonoClock;
use synthbench::config::ClientConfig;
use synthbench::net::Endpoint;
use synthbench::simulator::{ClientError, WorkloadSimulator};
use synthbench::workload::WorkSet;

struct ClientArgs {
    config: ClientConfig,
    calibrate: bool,
}

fn main() {
    synthbench::trace::init();

    if let Err(e) = run() {
        eprintln!("synthbench-client: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), ClientError> {
    let args: Vec<String> = std::env::args().collect();
    let args = parse_args(&args)?;

    if args.calibrate {
        return calibrate(&args.config);
    }

    let mut simulator = WorkloadSimulator::new(&args.config)?;
    info!(
        id = %simulator.client_id(),
        server = %args.config.server,
        rate_hz = args.config.rate_hz,
        "reporting frame times"
    );
    simulator.run()
}

/// Calibration mode: counts how many workload passes fit in half a frame
/// period on this machine, then exits.
fn calibrate(config: &ClientConfig) -> Result<(), ClientError> {
    let clock = MonoClock::new();
    let mut workset = WorkSet::new();
    let budget = Duration::from_nanos(config.frame_period_ns() / 2);

    let passes = workset.calibrate(budget, &clock);
    println!(
        "calibration: {passes} passes fit in {}ms (half of the {} Hz frame period)",
        budget.as_millis(),
        config.rate_hz
    );
    Ok(())
}

fn invalid(msg: impl Into<String>) -> ClientError {
    ClientError::Setup(io::Error::new(io::ErrorKind::InvalidInput, msg.into()))
}

/// Parses command line arguments into a client configuration.
///
/// Accepts the flags below plus the positional `[server] [port]` form.
fn parse_args(args: &[String]) -> Result<ClientArgs, ClientError> {
    let mut config = ClientConfig::default();
    let mut calibrate = false;
    let mut positionals: Vec<&str> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--rate" | "-r" => {
                i += 1;
                let value = args.get(i).ok_or_else(|| invalid("missing value for --rate"))?;
                let rate: u64 = value
                    .parse()
                    .map_err(|e| invalid(format!("bad --rate value: {e}")))?;
                if rate == 0 {
                    return Err(invalid("--rate must be > 0"));
                }
                config = config.with_rate(rate);
            }
            "--calibrate" => calibrate = true,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            arg if arg.starts_with('-') => {
                return Err(invalid(format!("unknown argument: {arg}")));
            }
            arg => positionals.push(arg),
        }
        i += 1;
    }

    if positionals.len() > 2 {
        return Err(invalid("expected at most [server] [port]"));
    }
    let mut server = config.server;
    if let Some(host) = positionals.first() {
        let ip: IpAddr = host
            .parse()
            .map_err(|_| invalid("server must be an IP literal, not a hostname"))?;
        server = Endpoint::new(ip, server.port());
    }
    if let Some(port) = positionals.get(1) {
        let port: u16 = port
            .parse()
            .map_err(|e| invalid(format!("bad port: {e}")))?;
        server = Endpoint::new(server.ip(), port);
    }
    config = config.with_server(server);

    Ok(ClientArgs { config, calibrate })
}

fn print_usage() {
    eprintln!(
        r#"synthbench-client - synthetic frame workload client

USAGE:
    synthbench-client [SERVER] [PORT] [OPTIONS]

ARGS:
    SERVER                  Aggregator IP address (default: 127.0.0.1)
    PORT                    Aggregator UDP port (default: 56636)

OPTIONS:
    -r, --rate <HZ>         Target frame rate (default: 30)
        --calibrate         Count workload passes per half frame period, then exit
    -h, --help              Print this help message

EXAMPLE:
    synthbench-client 192.168.1.100 56636 --rate 30
"#
    );
}
