use anyhow::Result;
use clap::{Parser, Subcommand};

use sentinel_infrastructure::CONFIG_ENV;

#[derive(Parser, Debug)]
#[command(name = "asterbook-sentinel")]
#[command(about = "Asterbook balance sentinel", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Serve the HTTP API and run the periodic sentinel
    Serve,
    /// Run a single sentinel pass and exit
    RunOnce,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    if let Some(config) = args.config {
        std::env::set_var(CONFIG_ENV, config);
    }

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => sentinel_bootstrap::run_standalone().await,
        Command::RunOnce => sentinel_bootstrap::run_once().await,
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
