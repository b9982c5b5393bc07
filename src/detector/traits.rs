use crate::message::{Occurrence, Preview};
use std::future::Future;
use std::pin::Pin;

/// Per-candidate acceptance policy consulted during detection.
///
/// The policy travels as an argument of every [`PreviewDetector::detect`]
/// call; there is no process-wide policy registration. The orchestrator
/// passes the masked-link filter here so detectors never need to know about
/// markdown.
pub type AcceptPolicy<'p> = &'p (dyn Fn(&Occurrence<'_>) -> bool + Send + Sync);

/// Core detection trait. Implement for any preview source.
///
/// Contract: every candidate occurrence found in `text` must be run through
/// `accept` before it may contribute a preview, and the returned previews
/// must keep the order in which their occurrences appear in `text`. The
/// first preview is the one an enrichment pass will attach.
pub trait PreviewDetector: Send + Sync {
    fn detect<'a>(
        &'a self,
        text: &'a str,
        accept: AcceptPolicy<'a>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<Preview>>> + Send + 'a>>;
}
