use crate::message::{MessageId, PreviewAttachment, PreviewState};
use std::future::Future;
use std::pin::Pin;

/// Persistence collaborator for enriched messages.
///
/// The enrichment core never owns message data. It calls these operations
/// against whatever the embedder's source of truth is and trusts the store
/// to serialize mutations of one message against concurrent writers. The
/// mutating operations are applied individually; `commit` asks the store to
/// make everything applied so far durable in one step.
pub trait MessageStore: Send + Sync {
    /// Current retraction flag for `id`.
    ///
    /// Implementations must report `true` for unknown ids: a message that
    /// disappeared counts as retracted.
    fn is_obfuscated<'a>(
        &'a self,
        id: &'a MessageId,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'a>>;

    /// Apply an enrichment attachment to the message.
    fn attach<'a>(
        &'a self,
        id: &'a MessageId,
        attachment: &'a PreviewAttachment,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

    /// Persist preview image bytes against the message.
    fn store_image<'a>(
        &'a self,
        id: &'a MessageId,
        image: &'a [u8],
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

    /// Move the message to `state`.
    fn set_state<'a>(
        &'a self,
        id: &'a MessageId,
        state: PreviewState,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

    /// Make every mutation applied so far durable.
    fn commit<'a>(&'a self) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;
}
