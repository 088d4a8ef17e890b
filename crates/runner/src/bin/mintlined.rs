//! Mintline daemon CLI.

use clap::{Parser, Subcommand};
use mintline_runner::RunnerConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mintlined")]
#[command(about = "Mint orchestration and inventory-reservation daemon")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon
    Run {
        /// Path to the TOML configuration file
        #[arg(short, long, default_value = "mintline.toml")]
        config: PathBuf,
    },

    /// Print a sample configuration file
    SampleConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => {
            tracing_subscriber::fmt::init();

            let text = std::fs::read_to_string(&config).map_err(|e| {
                anyhow::anyhow!("reading config {}: {e}", config.display())
            })?;
            let config = RunnerConfig::from_toml(&text)?;
            mintline_runner::serve(config).await?;
        }

        Commands::SampleConfig => {
            // Output goes to stdout; no tracing here.
            print!("{}", RunnerConfig::sample_toml());
        }
    }

    Ok(())
}
