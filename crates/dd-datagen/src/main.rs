use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cmd_check;
mod cmd_gen;
mod cmd_helpers;
mod cmd_inspect;

use cmd_helpers::Overrides;

#[derive(Parser)]
#[command(name = "dd-datagen", about = "Synthetic analytics-event archive generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate gzip archives of JSON event records
    Gen {
        /// Path to a datagen.toml config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// Validate the configuration and the built-in category table
    Check {
        /// Path to a datagen.toml config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// Summarize the records held in one archive
    Inspect {
        /// Path to a generated .gz archive
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Gen { config, overrides } => cmd_gen::run(config, overrides).await,
        Commands::Check { config, overrides } => cmd_check::run(config, overrides),
        Commands::Inspect { path } => cmd_inspect::run(path),
    }
}
