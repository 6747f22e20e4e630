mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use leanvm_core::Profile;

#[derive(Parser)]
#[command(name = "leanvm", about = "Build and verify minimal Alpine Elixir VM images")]
#[command(version)]
struct Cli {
    /// Project directory holding leanvm.toml and the application sources
    #[arg(long, short = 'C', global = true, default_value = ".")]
    project_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate, build, verify, export, and clean up (exit status 1 on any failure)
    Run {
        /// Image to build: runtime or app
        #[arg(long, short = 'p', default_value_t = Profile::Runtime)]
        profile: Profile,
        /// Also print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the Dockerfile only
    Generate {
        /// Image to build: runtime or app
        #[arg(long, short = 'p', default_value_t = Profile::Runtime)]
        profile: Profile,
    },
    /// Remove the image and generated files left by an earlier run
    Clean {
        /// Image to build: runtime or app
        #[arg(long, short = 'p', default_value_t = Profile::Runtime)]
        profile: Profile,
    },
    /// Check container engine and compressor availability
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Run { profile, json } => commands::run(&cli.project_dir, profile, json).await?,
        Commands::Generate { profile } => commands::generate(&cli.project_dir, profile)?,
        Commands::Clean { profile } => commands::clean(&cli.project_dir, profile).await?,
        Commands::Doctor => commands::doctor(&cli.project_dir).await?,
    };

    Ok(code)
}
