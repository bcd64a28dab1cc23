//! Operator CLI for the qreel backend.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::apple_secret::AppleSecretArgs;
use commands::kanji::KanjiArgs;

#[derive(Parser)]
#[command(name = "qreel-tools", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign a "Sign in with Apple" OAuth client secret
    AppleSecret(AppleSecretArgs),
    /// List rows of the hosted kanji table
    Kanji(KanjiArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays pipeable
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::AppleSecret(args) => commands::apple_secret::run(args),
        Commands::Kanji(args) => commands::kanji::run(args).await,
    }
}
