use crate::message::{Message, Preview, PreviewAttachment, PreviewState};

/// Outcome of one completed enrichment pass: the state to persist and the
/// attachment to apply, if any.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: PreviewState,
    pub attachment: Option<PreviewAttachment>,
}

impl Transition {
    fn done() -> Self {
        Self {
            state: PreviewState::Done,
            attachment: None,
        }
    }
}

/// Compute the single transition out of `WaitingToBeProcessed` for a
/// completed pass.
///
/// `obfuscated_now` must be the store's current view of the retraction flag,
/// not the enqueue-time snapshot: a message retracted mid-flight completes
/// as `Done` with nothing attached, whatever the detector found. The first
/// preview wins; later candidates from the same pass are discarded. Pure:
/// callers apply the result through the store collaborator.
#[must_use]
pub fn next_state(message: &Message, previews: &[Preview], obfuscated_now: bool) -> Transition {
    let Some(text) = &message.text else {
        return Transition::done();
    };
    let Some(selected) = previews.first() else {
        return Transition::done();
    };
    if obfuscated_now {
        return Transition::done();
    }

    let attachment = PreviewAttachment {
        nonce: message.id.clone(),
        text: text.clone(),
        source_url: selected.source_url.clone(),
        title: selected.title.clone(),
        description: selected.description.clone(),
        image: selected.image.clone(),
        created_at: chrono::Utc::now().to_rfc3339(),
    };

    let state = if attachment.image.is_some() {
        PreviewState::Downloaded
    } else {
        PreviewState::Uploaded
    };

    Transition {
        state,
        attachment: Some(attachment),
    }
}
