//! netcorr harness entry point.

use anyhow::Context;
use clap::{Parser, Subcommand};

use netcorr_harness::config::{resolve_log_level, resolve_replay_path, resolve_secret_key};
use netcorr_harness::replay::RecordedSession;

#[derive(Parser)]
#[command(
    name = "netcorr-harness",
    about = "Replay recorded test traffic through the capture core and manage protected credentials",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded session file and print the captured record.
    Replay {
        /// Path to the recorded session JSON file.
        /// Also reads from NETCORR_REPLAY_FILE env var.
        #[arg(short, long)]
        file: Option<String>,
    },

    /// Encrypt a credential for storage in fixtures or environment files.
    Encrypt {
        plaintext: String,

        /// Passphrase. Also reads from NETCORR_SECRET_KEY env var.
        #[arg(long)]
        key: Option<String>,
    },

    /// Decrypt a salt:iv:ciphertext packed credential.
    Decrypt {
        packed: String,

        /// Passphrase. Also reads from NETCORR_SECRET_KEY env var.
        #[arg(long)]
        key: Option<String>,
    },
}

// Single worker thread: one test worker owns one cooperative event loop.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = resolve_log_level(cli.log_level.as_deref());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay { file } => {
            let path = resolve_replay_path(file.as_deref());
            let session = RecordedSession::from_file(&path)
                .with_context(|| format!("loading recorded session from {path}"))?;

            let store = netcorr::CorrelationStore::new();
            match netcorr_harness::replay::run_session(&session, &store).await {
                Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                None => println!("no fields captured from {} exchanges", session.exchanges.len()),
            }
        }

        Commands::Encrypt { plaintext, key } => {
            let key = resolve_secret_key(key.as_deref())
                .context("no passphrase given; pass --key or set NETCORR_SECRET_KEY")?;
            println!("{}", netcorr::encrypt(&plaintext, &key));
        }

        Commands::Decrypt { packed, key } => {
            let key = resolve_secret_key(key.as_deref())
                .context("no passphrase given; pass --key or set NETCORR_SECRET_KEY")?;
            println!("{}", netcorr::decrypt(&packed, &key)?);
        }
    }

    Ok(())
}
