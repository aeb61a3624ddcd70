//! Keygate license authority server.
//!
//! Runs the activation/validation HTTP API over an in-memory authority:
//! 1. Loads (or generates) the Ed25519 token signing key
//! 2. Creates the licenses named on the command line
//! 3. Serves the API and sweeps expired licenses on a fixed interval
//!
//! Usage:
//!   keygate-server --port 8080 --license KEY-ALPHA --license KEY-BETA

use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use ed25519_dalek::SigningKey;
use keygate_authority::{Authority, NullDispatcher};
use keygate_server::build_router;
use keygate_token::TokenCodec;
use rand::rngs::OsRng;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "keygate-server")]
#[command(about = "Keygate license authority server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Path to the Ed25519 token signing key
    #[arg(short, long, default_value = "keygate-signing.key")]
    key: PathBuf,

    /// License keys to create at startup
    #[arg(short, long)]
    license: Vec<String>,

    /// Validity in days for licenses created at startup (perpetual if unset)
    #[arg(long)]
    duration_days: Option<i64>,

    /// Device quota for licenses created at startup
    #[arg(long, default_value = "3")]
    max_devices: u32,

    /// Seconds between expiry sweeps
    #[arg(long, default_value = "3600")]
    sweep_interval: u64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("Keygate server starting...");
    let signing_key = load_or_generate_key(&args.key)?;
    let codec = TokenCodec::new(signing_key);

    let authority = Arc::new(Authority::new(codec, Arc::new(NullDispatcher)));
    for key in &args.license {
        match authority
            .create_license(key, args.duration_days, args.max_devices)
            .await
        {
            Ok(record) => info!(
                license_key = key.as_str(),
                max_devices = record.max_devices,
                "license created"
            ),
            Err(e) => warn!(license_key = key.as_str(), error = %e, "license not created"),
        }
    }

    // Periodic expiry sweep
    let sweeper = Arc::clone(&authority);
    let sweep_interval = Duration::from_secs(args.sweep_interval);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval);
        ticker.tick().await; // first tick fires immediately
        loop {
            ticker.tick().await;
            let expired = sweeper.sweep_expired().await;
            if expired > 0 {
                info!(expired, "expiry sweep flipped licenses");
            }
        }
    });

    let app = build_router(authority);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", args.port))
        .await
        .with_context(|| format!("failed to bind port {}", args.port))?;
    info!("Listening on 0.0.0.0:{}", args.port);
    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

/// Loads the 32-byte signing key from disk, generating one on first run.
fn load_or_generate_key(path: &PathBuf) -> Result<SigningKey> {
    if path.exists() {
        info!("Loading signing key from {:?}", path);
        let bytes = fs::read(path).context("failed to read signing key file")?;
        let bytes: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .context("signing key file must hold exactly 32 bytes")?;
        Ok(SigningKey::from_bytes(&bytes))
    } else {
        info!("Generating new signing key at {:?}", path);
        let key = SigningKey::generate(&mut OsRng);
        fs::write(path, key.to_bytes()).context("failed to write signing key file")?;
        Ok(key)
    }
}
