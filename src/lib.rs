#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

pub mod detector;
pub mod error;
pub mod filter;
pub mod guard;
pub mod message;
pub mod orchestrator;
pub mod store;
pub mod transition;

#[cfg(feature = "fetch")]
pub use detector::{FetchConfig, HttpPreviewDetector};
pub use detector::{AcceptPolicy, PreviewDetector, scan_occurrences};
pub use error::{DetectorError, Result, StoreError, UnfurlError};
pub use filter::{accept, masked_target_ranges};
pub use guard::InFlightGuard;
pub use message::{Message, MessageId, Occurrence, Preview, PreviewAttachment, PreviewState};
pub use orchestrator::PreviewOrchestrator;
pub use store::{InMemoryStore, MessageStore};
pub use transition::{Transition, next_state};
