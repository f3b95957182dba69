// crates/veilcraft-daemon/src/main.rs
//
// Binary entrypoint for the Veilcraft daemon.
//
// Initializes tracing, parses CLI arguments, loads configuration, builds a
// coordinator wired to the local oracle, replays a call log against it while
// the oracle worker answers decryptions in the background, and finally
// writes the coordinator's event stream as JSON lines.

mod calls;
mod config;
mod worker;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::{mpsc, RwLock};

use calls::{apply, parse_calls, Outcome};
use config::{expand_tilde, DaemonConfig};
use worker::{wall_clock_secs, OracleWorker};

use veilcraft_coordinator::{Collaborators, Coordinator};
use veilcraft_core::identity::Address;
use veilcraft_oracle::{LocalArithmetic, LocalDecryptionOracle, SignatureProofVerifier};

/// Veilcraft daemon: replays coordinator calls against a local decryption oracle.
#[derive(Parser, Debug)]
#[command(name = "veilcraft-daemon", version = "0.1.0", about = "Veilcraft batch crafting coordinator")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.veilcraft/config.toml")]
    config: String,

    /// JSON-lines call log to replay.
    #[arg(long)]
    calls: String,

    /// Write the event stream here instead of stdout.
    #[arg(long)]
    events_out: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration first so its log level can seed the filter.
    let config_path = expand_tilde(&args.config);
    let loaded = DaemonConfig::load(&config_path);
    let log_level = loaded
        .as_ref()
        .map(|cfg| cfg.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialize tracing subscriber for structured logging. Logs go to stderr
    // so stdout carries only the event stream.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let daemon_config = match loaded {
        Ok(cfg) => {
            tracing::info!("Loaded configuration from {}", config_path);
            cfg
        }
        Err(e) => {
            tracing::warn!(
                "Could not load config from {}: {}. Using defaults.",
                config_path,
                e
            );
            DaemonConfig::default()
        }
    };

    tracing::info!("Veilcraft Daemon v0.1.0");
    tracing::info!("Instance: {}", daemon_config.coordinator.instance_name);
    tracing::info!("Cooldown: {}s", daemon_config.coordinator.cooldown_seconds);

    // ---------------------------------------------------------------
    // Collaborators: encrypted arithmetic, oracle, proof verifier.
    // ---------------------------------------------------------------
    let fhe = Arc::new(LocalArithmetic::new());
    let (pending_tx, pending_rx) = mpsc::unbounded_channel();
    let oracle = Arc::new(
        LocalDecryptionOracle::new(daemon_config.oracle_keypair()?, fhe.clone())
            .with_channel(pending_tx),
    );
    let verifier = Arc::new(SignatureProofVerifier::new(oracle.public_key_bytes()));
    tracing::info!("Oracle key: 0x{}", hex::encode(oracle.public_key_bytes()));

    let owner = Address::parse_or_derive(&daemon_config.owner)?;
    let coordinator = Coordinator::new(
        &daemon_config.coordinator,
        owner,
        Collaborators {
            arithmetic: fhe.clone(),
            oracle: oracle.clone(),
            verifier,
        },
        wall_clock_secs(),
    )?;
    let coordinator = Arc::new(RwLock::new(coordinator));

    // ---------------------------------------------------------------
    // Oracle worker.
    // ---------------------------------------------------------------
    let (report_tx, mut report_rx) = mpsc::unbounded_channel();
    let worker = OracleWorker::new(
        oracle.clone(),
        coordinator.clone(),
        Duration::from_millis(daemon_config.oracle_delay_ms),
        report_tx,
    );
    let worker_handle = tokio::spawn(worker.run(pending_rx));

    // ---------------------------------------------------------------
    // Replay the call log.
    // ---------------------------------------------------------------
    let contents = std::fs::read_to_string(&args.calls)
        .map_err(|e| format!("Failed to read call log {}: {}", args.calls, e))?;
    let call_log = parse_calls(&contents)?;
    tracing::info!("Replaying {} calls from {}", call_log.len(), args.calls);

    let mut clock = coordinator
        .read()
        .await
        .events()
        .last()
        .map(|e| e.timestamp)
        .unwrap_or(0);
    let mut requested = 0usize;
    let mut rejected = 0usize;

    for (index, call) in call_log.iter().enumerate() {
        clock = call.at.unwrap_or(clock);
        let result = {
            let mut guard = coordinator.write().await;
            apply(&mut guard, &fhe, call, clock)
        };
        match result {
            Ok(Outcome::Done) => {
                tracing::debug!("Call {} ({}) applied", index + 1, call.op.name());
            }
            Ok(Outcome::BatchOpened(batch_id)) => {
                tracing::info!("Call {} opened batch {}", index + 1, batch_id);
            }
            Ok(Outcome::CraftRequested(request_id)) => {
                requested += 1;
                tracing::info!("Call {} requested craft {}", index + 1, request_id);
            }
            Err(e) => {
                rejected += 1;
                tracing::warn!(
                    code = e.code(),
                    "Call {} ({}) by {} rejected: {}",
                    index + 1,
                    call.op.name(),
                    call.caller,
                    e
                );
            }
        }
    }

    // ---------------------------------------------------------------
    // Wait for the oracle to answer everything that was requested.
    // ---------------------------------------------------------------
    let timeout = Duration::from_millis(daemon_config.callback_timeout_ms);
    let deadline = tokio::time::Instant::now() + timeout;
    let mut answered = 0usize;
    while answered < requested {
        match tokio::time::timeout_at(deadline, report_rx.recv()).await {
            Ok(Some(report)) => {
                answered += 1;
                if let Err(e) = &report.outcome {
                    tracing::debug!("Request {} rejected with {}", report.request_id, e.code());
                }
            }
            Ok(None) => break,
            Err(_) => {
                tracing::warn!(
                    "Timed out after {}ms with {} of {} decryptions answered",
                    timeout.as_millis(),
                    answered,
                    requested
                );
                break;
            }
        }
    }
    worker_handle.abort();

    // ---------------------------------------------------------------
    // Emit the event stream.
    // ---------------------------------------------------------------
    let coordinator = coordinator.read().await;
    let pending = coordinator.pending_requests();
    if !pending.is_empty() {
        tracing::warn!("{} decryption requests left unprocessed", pending.len());
        for (request_id, context) in &pending {
            tracing::warn!(
                "  {} for batch {} (requested by {} at {})",
                request_id,
                context.batch_id,
                context.requested_by,
                context.requested_at
            );
        }
    }

    let mut out: Box<dyn Write> = match &args.events_out {
        Some(path) => Box::new(std::fs::File::create(path)?),
        None => Box::new(std::io::stdout().lock()),
    };
    for record in coordinator.events() {
        writeln!(out, "{}", serde_json::to_string(record)?)?;
    }
    out.flush()?;

    tracing::info!(
        "Replayed {} calls ({} rejected), {} events emitted",
        call_log.len(),
        rejected,
        coordinator.events().len()
    );

    Ok(())
}
