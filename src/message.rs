use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use url::Url;

/// Stable identity of a message. Used as the in-flight set key and as the
/// nonce carried inside the attachment payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Link-preview lifecycle of a message.
///
/// Progression only: `WaitingToBeProcessed` is the single entry point for
/// enrichment and the three remaining states are terminal for this crate.
/// Re-entry into `WaitingToBeProcessed` happens outside (external reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewState {
    WaitingToBeProcessed,
    Downloaded,
    Uploaded,
    Done,
}

impl PreviewState {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitingToBeProcessed => "waiting_to_be_processed",
            Self::Downloaded => "downloaded",
            Self::Uploaded => "uploaded",
            Self::Done => "done",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::WaitingToBeProcessed)
    }
}

/// Snapshot of an externally owned message.
///
/// The orchestrator works on snapshots; the store remains the source of
/// truth. `is_obfuscated` is re-read from the store at completion time, so
/// the snapshot value only reflects enqueue time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: Option<String>,
    pub state: PreviewState,
    pub is_obfuscated: bool,
    pub attachment: Option<PreviewAttachment>,
}

impl Message {
    /// A fresh message awaiting enrichment.
    pub fn new(id: impl Into<MessageId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: Some(text.into()),
            state: PreviewState::WaitingToBeProcessed,
            is_obfuscated: false,
            attachment: None,
        }
    }

    /// A fresh message with no text content (no detection will run).
    pub fn without_text(id: impl Into<MessageId>) -> Self {
        Self {
            id: id.into(),
            text: None,
            state: PreviewState::WaitingToBeProcessed,
            is_obfuscated: false,
            attachment: None,
        }
    }
}

/// A candidate URL occurrence inside message text.
///
/// `range` is the byte range the raw URL spans in `text`. The occurrence
/// scanner and the markdown filter both work in byte offsets, which keeps
/// exact-range comparison between the two meaningful.
#[derive(Debug, Clone)]
pub struct Occurrence<'t> {
    pub url: Url,
    pub range: Range<usize>,
    pub text: &'t str,
}

/// Candidate preview produced by a detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preview {
    pub source_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Raw image bytes, already downloaded by the detector.
    pub image: Option<Vec<u8>>,
}

/// Enrichment payload attached to a message on a successful pass.
///
/// Carries the message text as it was when the pass completed, the nonce,
/// and the selected preview's metadata. A populated `image` is the request
/// for the store collaborator to persist those bytes against the message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewAttachment {
    pub nonce: MessageId,
    pub text: String,
    pub source_url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<Vec<u8>>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::{Message, MessageId, PreviewState};

    #[test]
    fn message_id_random_is_unique() {
        assert_ne!(MessageId::random(), MessageId::random());
    }

    #[test]
    fn message_id_displays_inner_value() {
        let id = MessageId::new("abc-123");
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn preview_state_serializes_snake_case() {
        let json = serde_json::to_string(&PreviewState::WaitingToBeProcessed).unwrap();
        assert_eq!(json, "\"waiting_to_be_processed\"");
        let back: PreviewState = serde_json::from_str("\"downloaded\"").unwrap();
        assert_eq!(back, PreviewState::Downloaded);
    }

    #[test]
    fn only_waiting_state_is_non_terminal() {
        assert!(!PreviewState::WaitingToBeProcessed.is_terminal());
        assert!(PreviewState::Downloaded.is_terminal());
        assert!(PreviewState::Uploaded.is_terminal());
        assert!(PreviewState::Done.is_terminal());
    }

    #[test]
    fn new_message_starts_waiting_without_attachment() {
        let message = Message::new("m1", "hello https://example.com");
        assert_eq!(message.state, PreviewState::WaitingToBeProcessed);
        assert!(!message.is_obfuscated);
        assert!(message.attachment.is_none());
        assert!(message.text.is_some());

        let bare = Message::without_text("m2");
        assert!(bare.text.is_none());
        assert_eq!(bare.state, PreviewState::WaitingToBeProcessed);
    }
}
