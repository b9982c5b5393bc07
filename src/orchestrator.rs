use crate::detector::traits::PreviewDetector;
use crate::filter;
use crate::guard::InFlightGuard;
use crate::message::{Message, Preview, PreviewState};
use crate::store::traits::MessageStore;
use crate::transition::next_state;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Drives enrichment passes over message snapshots.
///
/// Intake (change notifications and tracked loads) funnels into [`enqueue`],
/// which admits each eligible message through the in-flight guard and spawns
/// one pass per admission. A pass runs detection, re-reads the retraction
/// flag, applies the resulting transition through the store, releases the
/// guard, and asks the store to commit. Store failures during apply are
/// logged and absorbed; a pass always runs to completion.
///
/// [`enqueue`]: PreviewOrchestrator::enqueue
#[derive(Clone)]
pub struct PreviewOrchestrator {
    detector: Arc<dyn PreviewDetector>,
    store: Arc<dyn MessageStore>,
    guard: Arc<InFlightGuard>,
}

impl PreviewOrchestrator {
    pub fn new(detector: Arc<dyn PreviewDetector>, store: Arc<dyn MessageStore>) -> Self {
        Self {
            detector,
            store,
            guard: Arc::new(InFlightGuard::new()),
        }
    }

    /// Change-notification intake: inserted or updated messages.
    pub fn on_changed(&self, batch: Vec<Message>) -> Vec<JoinHandle<()>> {
        self.enqueue(batch)
    }

    /// Startup intake: messages already waiting when tracking began.
    pub fn on_tracked_load(&self, batch: Vec<Message>) -> Vec<JoinHandle<()>> {
        self.enqueue(batch)
    }

    /// Admit every eligible message in `batch` and spawn one pass each.
    ///
    /// Only messages in `WaitingToBeProcessed` are considered; anything
    /// already in flight is skipped silently, which is what makes rapid
    /// repeated notifications for the same message safe. The returned
    /// handles may be awaited (tests, shutdown) or dropped to leave the
    /// passes detached.
    pub fn enqueue(&self, batch: Vec<Message>) -> Vec<JoinHandle<()>> {
        let total = batch.len();
        let mut handles = Vec::new();

        for message in batch {
            if message.state != PreviewState::WaitingToBeProcessed {
                continue;
            }
            if !self.guard.try_admit(&message.id) {
                continue;
            }
            let this = self.clone();
            handles.push(tokio::spawn(async move {
                this.run_pass(message).await;
            }));
        }

        tracing::debug!(admitted = handles.len(), total, "enqueued enrichment passes");
        handles
    }

    /// Number of passes currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.guard.len()
    }

    async fn run_pass(&self, message: Message) {
        let previews = match &message.text {
            None => Vec::new(),
            Some(text) => match self.detector.detect(text, &filter::accept).await {
                Ok(previews) => previews,
                Err(e) => {
                    // Detection failures downgrade to "nothing found"; the
                    // message still completes.
                    tracing::debug!(id = %message.id, error = %e, "preview detection failed");
                    Vec::new()
                }
            },
        };

        self.complete(message, &previews).await;
    }

    /// Apply the pass outcome. The retraction flag is re-read here because
    /// the snapshot may predate a retraction that happened mid-flight.
    async fn complete(&self, message: Message, previews: &[Preview]) {
        let obfuscated_now = match self.store.is_obfuscated(&message.id).await {
            Ok(flag) => flag,
            Err(e) => {
                // Cannot confirm the message still stands, so suppress.
                tracing::warn!(id = %message.id, error = %e, "obfuscation re-read failed");
                true
            }
        };

        let transition = next_state(&message, previews, obfuscated_now);

        if let Some(attachment) = &transition.attachment {
            if let Err(e) = self.store.attach(&message.id, attachment).await {
                tracing::warn!(id = %message.id, error = %e, "failed to apply attachment");
            }
            if let Some(image) = &attachment.image
                && let Err(e) = self.store.store_image(&message.id, image).await
            {
                tracing::warn!(id = %message.id, error = %e, "failed to persist preview image");
            }
        }

        if let Err(e) = self.store.set_state(&message.id, transition.state).await {
            tracing::warn!(id = %message.id, error = %e, "failed to persist state");
        }

        self.guard.release(&message.id);

        if let Err(e) = self.store.commit().await {
            tracing::warn!(id = %message.id, error = %e, "commit failed");
        }

        tracing::debug!(id = %message.id, state = transition.state.as_str(), "enrichment pass complete");
    }
}
