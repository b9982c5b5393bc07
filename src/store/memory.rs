use super::traits::MessageStore;
use crate::error::StoreError;
use crate::message::{Message, MessageId, PreviewAttachment, PreviewState};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-process reference implementation of [`MessageStore`].
///
/// A single mutex over the whole message map doubles as the per-message
/// write serialization the trait demands. Suited to tests and to embedders
/// that keep messages in memory anyway; anything durable wants its own
/// implementation.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    messages: HashMap<MessageId, Message>,
    images: HashMap<MessageId, Vec<u8>>,
    commits: u64,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a message record.
    pub fn insert(&self, message: Message) {
        self.lock().messages.insert(message.id.clone(), message);
    }

    #[must_use]
    pub fn message(&self, id: &MessageId) -> Option<Message> {
        self.lock().messages.get(id).cloned()
    }

    #[must_use]
    pub fn image(&self, id: &MessageId) -> Option<Vec<u8>> {
        self.lock().images.get(id).cloned()
    }

    /// Flip the retraction flag the way an external retraction would.
    pub fn set_obfuscated(&self, id: &MessageId, obfuscated: bool) {
        if let Some(message) = self.lock().messages.get_mut(id) {
            message.is_obfuscated = obfuscated;
        }
    }

    /// Drop the message entirely, as an external deletion would.
    pub fn remove(&self, id: &MessageId) {
        let mut inner = self.lock();
        inner.messages.remove(id);
        inner.images.remove(id);
    }

    /// Number of commits requested so far.
    #[must_use]
    pub fn commit_count(&self) -> u64 {
        self.lock().commits
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageStore for InMemoryStore {
    fn is_obfuscated<'a>(
        &'a self,
        id: &'a MessageId,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>> {
        Box::pin(async move {
            Ok(self
                .lock()
                .messages
                .get(id)
                .is_none_or(|message| message.is_obfuscated))
        })
    }

    fn attach<'a>(
        &'a self,
        id: &'a MessageId,
        attachment: &'a PreviewAttachment,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut inner = self.lock();
            let message = inner
                .messages
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            message.attachment = Some(attachment.clone());
            Ok(())
        })
    }

    fn store_image<'a>(
        &'a self,
        id: &'a MessageId,
        image: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut inner = self.lock();
            if !inner.messages.contains_key(id) {
                return Err(StoreError::NotFound(id.to_string()).into());
            }
            inner.images.insert(id.clone(), image.to_vec());
            Ok(())
        })
    }

    fn set_state<'a>(
        &'a self,
        id: &'a MessageId,
        state: PreviewState,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut inner = self.lock();
            let message = inner
                .messages
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            message.state = state;
            Ok(())
        })
    }

    fn commit<'a>(&'a self) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.lock().commits += 1;
            Ok(())
        })
    }
}
