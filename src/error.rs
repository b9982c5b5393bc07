use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `unfurl`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains. Inside an enrichment pass no
/// error is fatal: every failure is absorbed into a terminal transition.
#[derive(Debug, Error)]
pub enum UnfurlError {
    // ── Detection / fetch ───────────────────────────────────────────────
    #[error("detector: {0}")]
    Detector(#[from] DetectorError),

    // ── Store collaborator ──────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Detector errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("fetching {url} failed: {message}")]
    Fetch { url: String, message: String },

    #[error("{url} returned unsupported content type {content_type}")]
    UnsupportedContent { url: String, content_type: String },

    #[error("image at {url} is {size} bytes (limit {limit})")]
    ImageTooLarge { url: String, size: u64, limit: u64 },
}

// ─── Store errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("message not found: {0}")]
    NotFound(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, UnfurlError>;
