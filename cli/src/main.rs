mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{ensemble, plot, ratio, verify, weights};

/// Install the log subscriber: `RUST_LOG` when set, otherwise the `-v` count.
fn init_logging(verbose: u8) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("agverify={level},agverify_cli={level}")));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Verify(args) => verify::run(&cli, args),
        Commands::Ensemble(args) => ensemble::run(&cli, args),
        Commands::Ratio(args) => ratio::run(&cli, args),
        Commands::Weights(args) => weights::run(&cli, args),
        Commands::Plot(args) => plot::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
