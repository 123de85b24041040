use clap::Parser;
use tracing_subscriber::EnvFilter;

use squire_triage::cli::{self, Cli};

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "squire_triage=info",
        1 => "squire_triage=debug",
        _ => "squire_triage=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    cli::execute(cli).await
}
