use anyhow::Result;
use clap::Parser;
use routesim::{ReportDisplay, Scenario, SimConfiguration, Topology};
use routesim_core::defaults::{
    DEFAULT_BROADCAST_INTERVAL, DEFAULT_INITIAL_BROADCAST_INTERVAL, DEFAULT_INITIALIZATION_TICKS,
    DEFAULT_THROTTLE_DECAY_INTERVAL, DEFAULT_THROTTLE_DECAY_RATE,
};
use std::{io::Write as _, path::PathBuf};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Run the demonstration scenario of the distance-vector routing
/// simulator.
///
/// Without `--routers` and `--links` the built-in 16 routers network
/// is used.
#[derive(Parser)]
#[command(version, about)]
struct Command {
    /// router file: one max queue size per router, comma separated
    #[arg(long, requires = "links")]
    routers: Option<PathBuf>,

    /// link file: `a|b|bandwidth` entries, comma separated
    #[arg(long, requires = "routers")]
    links: Option<PathBuf>,

    /// seed of the desynchronized ticks
    #[arg(long, default_value = "0")]
    seed: u64,

    #[arg(long, default_value_t = DEFAULT_BROADCAST_INTERVAL)]
    broadcast_interval: u64,

    #[arg(long, default_value_t = DEFAULT_INITIAL_BROADCAST_INTERVAL)]
    initial_broadcast_interval: u64,

    #[arg(long, default_value_t = DEFAULT_INITIALIZATION_TICKS)]
    initialization_ticks: u64,

    /// share of the remaining throttle recovered per decay step, in [0, 1]
    #[arg(long, default_value_t = DEFAULT_THROTTLE_DECAY_RATE)]
    decay_rate: f64,

    #[arg(long, default_value_t = DEFAULT_THROTTLE_DECAY_INTERVAL)]
    decay_interval: u64,

    /// factor applied to a connection on congestion, in (0, 1]
    #[arg(long, default_value = "0.5")]
    throttle_factor: f64,

    /// throughput left to the connections of a failed router, in (0, 1]
    #[arg(long, default_value = "0.01")]
    failure_percent: f64,

    /// increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cmd = Command::parse();
    init_tracing(cmd.verbose);

    let configuration = SimConfiguration {
        broadcast_interval: cmd.broadcast_interval,
        initial_broadcast_interval: cmd.initial_broadcast_interval,
        initialization_ticks: cmd.initialization_ticks,
        throttle_decay_rate: cmd.decay_rate,
        throttle_decay_interval: cmd.decay_interval,
        ..SimConfiguration::with_factors(cmd.throttle_factor, cmd.failure_percent)?
    };

    let topology = match (&cmd.routers, &cmd.links) {
        (Some(routers), Some(links)) => Topology::load(routers, links)?,
        _ => Topology::demonstration()?,
    };

    let mut network = topology.build::<()>(configuration)?;
    network.set_seed(cmd.seed);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let report = Scenario::demonstration(topology.num_routers())?.run(&mut network, &mut out)?;

    writeln!(out, "\n{}", ReportDisplay(&report))?;
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
