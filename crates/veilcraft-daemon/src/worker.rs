// crates/veilcraft-daemon/src/worker.rs
//
// Oracle worker: drains pending decryptions from the oracle's channel,
// answers each after a simulated delay, and feeds the signed result back
// into the coordinator's callback. One report per request goes out on the
// report channel so the replay driver knows when the oracle has caught up.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::RwLock;

use veilcraft_coordinator::Coordinator;
use veilcraft_core::call::CallContext;
use veilcraft_core::error::CraftError;
use veilcraft_core::identity::{Address, RequestId};
use veilcraft_oracle::{LocalDecryptionOracle, PendingDecryption};

/// The coordinator as shared between the replay driver and the worker.
pub type SharedCoordinator = Arc<RwLock<Coordinator>>;

/// Result of delivering one decryption back to the coordinator.
#[derive(Debug)]
pub struct CallbackReport {
    pub request_id: RequestId,
    pub outcome: Result<u64, CraftError>,
}

pub struct OracleWorker {
    oracle: Arc<LocalDecryptionOracle>,
    coordinator: SharedCoordinator,
    delay: Duration,
    reports: UnboundedSender<CallbackReport>,
    /// Address the callbacks are sent from.
    relayer: Address,
}

impl OracleWorker {
    pub fn new(
        oracle: Arc<LocalDecryptionOracle>,
        coordinator: SharedCoordinator,
        delay: Duration,
        reports: UnboundedSender<CallbackReport>,
    ) -> Self {
        let relayer = Address::from_public_key(&oracle.public_key_bytes());
        Self {
            oracle,
            coordinator,
            delay,
            reports,
            relayer,
        }
    }

    /// Run until the inbox closes or a shutdown signal arrives.
    pub async fn run(self, mut inbox: UnboundedReceiver<PendingDecryption>) {
        tracing::info!(
            "Oracle worker started (delay={}ms, relayer={})",
            self.delay.as_millis(),
            self.relayer
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Oracle worker received shutdown signal");
                    break;
                }
                next = inbox.recv() => {
                    let Some(pending) = next else { break };
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                    let report = self.answer(&pending).await;
                    if self.reports.send(report).is_err() {
                        tracing::debug!("Report receiver dropped; continuing without reports");
                    }
                }
            }
        }

        tracing::info!("Oracle worker stopped");
    }

    /// Decrypt, sign, and deliver one pending decryption.
    pub async fn answer(&self, pending: &PendingDecryption) -> CallbackReport {
        let outcome = match self.oracle.fulfill(pending) {
            Ok(response) => {
                let mut coordinator = self.coordinator.write().await;
                let now = substrate_now(&coordinator);
                coordinator.on_decryption_result(
                    &CallContext::new(self.relayer, now),
                    response.request_id,
                    &response.cleartext,
                    &response.proof,
                )
            }
            Err(e) => Err(e),
        };

        match &outcome {
            Ok(result) => tracing::info!(
                "Decryption {} delivered: crafted value {}",
                pending.request_id,
                result
            ),
            Err(e) => tracing::warn!(
                code = e.code(),
                "Decryption {} not accepted: {}",
                pending.request_id,
                e
            ),
        }

        CallbackReport {
            request_id: pending.request_id,
            outcome,
        }
    }
}

/// Current unix time in seconds.
pub fn wall_clock_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// A callback timestamp that never runs behind the coordinator's last event.
fn substrate_now(coordinator: &Coordinator) -> u64 {
    let last = coordinator.events().last().map(|e| e.timestamp).unwrap_or(0);
    wall_clock_secs().max(last)
}
