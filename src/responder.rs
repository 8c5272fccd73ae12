//! Auto-responder loop — decides which inbox messages get a vacation reply
//! and when to re-poll.
//!
//! Single logical thread of control: each cycle either sleeps and re-polls,
//! or drains a batch and re-polls immediately. No other cycle runs while a
//! batch is in flight, so the already-handled check is race-free.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};

use crate::config::ResponderConfig;
use crate::error::GatewayError;
use crate::gateway::{LabelId, MailGateway, MessageRef};

/// What the next cycle should do, decided without performing any waits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing new, or the listing failed: re-poll after the fixed idle delay.
    Idle,
    /// First-contact candidates found: wait the jittered delay, then drain.
    Drain {
        delay: Duration,
        candidates: Vec<MessageRef>,
    },
}

/// Polls the inbox and replies to first-contact messages.
pub struct Responder {
    config: ResponderConfig,
    gateway: Arc<dyn MailGateway>,
    shutdown: Arc<AtomicBool>,
    rng: Mutex<StdRng>,
}

impl Responder {
    pub fn new(config: ResponderConfig, gateway: Arc<dyn MailGateway>) -> Self {
        Self::with_rng(config, gateway, StdRng::from_entropy())
    }

    /// Construct with a caller-supplied RNG so the delay policy can be
    /// exercised deterministically.
    pub fn with_rng(config: ResponderConfig, gateway: Arc<dyn MailGateway>, rng: StdRng) -> Self {
        Self {
            config,
            gateway,
            shutdown: Arc::new(AtomicBool::new(false)),
            rng: Mutex::new(rng),
        }
    }

    /// Shared flag that stops the loop before its next cycle starts.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run until the shutdown flag is set.
    pub async fn run(&self) {
        info!(label = %self.config.label_name, "Auto-responder started");

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                info!("Auto-responder shutting down");
                return;
            }

            match self.poll_cycle().await {
                CycleOutcome::Idle => {
                    tokio::time::sleep(self.config.idle_delay).await;
                }
                CycleOutcome::Drain { delay, candidates } => {
                    info!(
                        count = candidates.len(),
                        delay_secs = delay.as_secs(),
                        "Processing new emails after delay"
                    );
                    tokio::time::sleep(delay).await;
                    self.process_batch(&candidates).await;
                    // Batch done: re-poll immediately, no extra delay.
                }
            }
        }
    }

    /// One list-and-filter pass. Performs no waiting itself; the caller
    /// applies the returned schedule.
    pub async fn poll_cycle(&self) -> CycleOutcome {
        let refs = match self.gateway.list_inbox().await {
            Ok(refs) => refs,
            Err(e) => {
                // The loop must always come back for another cycle, so a
                // listing failure schedules a retry like the empty case.
                error!("Failed to list inbox: {e}");
                return CycleOutcome::Idle;
            }
        };

        let (candidates, skipped) = partition_first_contact(refs);
        for m in &skipped {
            // Any existing label counts as handled, including labels we
            // never applied; keep those skips observable.
            debug!(id = %m.id, labels = ?m.label_ids, "Already labeled; skipping");
        }
        if candidates.is_empty() {
            debug!(
                "No new emails; checking again in {}s",
                self.config.idle_delay.as_secs()
            );
            return CycleOutcome::Idle;
        }

        let delay = {
            let mut rng = self.rng.lock().unwrap();
            choose_reply_delay(
                &mut *rng,
                self.config.reply_delay_min_secs,
                self.config.reply_delay_max_secs,
            )
        };
        CycleOutcome::Drain { delay, candidates }
    }

    /// Reply to and label each candidate sequentially, in listing order.
    /// Per-candidate failures are logged and do not abort the batch.
    pub async fn process_batch(&self, candidates: &[MessageRef]) {
        for candidate in candidates {
            if let Err(e) = self.reply_and_label(&candidate.id).await {
                error!(id = %candidate.id, "Failed to process candidate: {e}");
            }
        }
    }

    async fn reply_and_label(&self, id: &str) -> Result<(), GatewayError> {
        let message = self.gateway.get_message(id).await?;

        let Some(sender) = message.sender else {
            warn!(id = %message.id, "Unable to determine sender address; skipping");
            return Ok(());
        };

        let body = vacation_reply_body(&message.subject);
        self.gateway
            .send_reply(&sender, &format!("Re: {}", message.subject), &body)
            .await?;
        info!(id = %message.id, subject = %message.subject, "Reply sent");

        let label = self.gateway.ensure_label(&self.config.label_name).await?;
        self.gateway
            .modify_labels(id, &[label], &[LabelId(self.config.inbox_label.clone())])
            .await?;
        info!(id = %message.id, label = %self.config.label_name, "Labeled and moved out of inbox");

        Ok(())
    }
}

// ── Policy helpers ──────────────────────────────────────────────────

/// Split a listing into first-contact candidates and already-handled
/// messages, preserving listing order. A message is a candidate iff no
/// labels are applied at all; any label permanently excludes it, even when
/// our own reply failed to send — at-most-once delivery, never a duplicate
/// reply.
pub fn partition_first_contact(refs: Vec<MessageRef>) -> (Vec<MessageRef>, Vec<MessageRef>) {
    refs.into_iter().partition(|m| m.label_ids.is_empty())
}

/// Uniform integer delay drawn from the closed interval `[min, max]` seconds.
pub fn choose_reply_delay<R: Rng>(rng: &mut R, min_secs: u64, max_secs: u64) -> Duration {
    Duration::from_secs(rng.gen_range(min_secs..=max_secs))
}

/// Reply body for a first-contact message.
pub fn vacation_reply_body(subject: &str) -> String {
    format!(
        "Thank you for your email on \"{subject}\". \
         I'm currently out on vacation and will get back to you as soon as possible."
    )
}

// ── Tests ───────────────────────────────────────────────────────────
