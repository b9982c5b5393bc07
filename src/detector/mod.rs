#[cfg(feature = "fetch")]
pub mod fetch;
pub mod scan;
pub mod traits;

#[cfg(feature = "fetch")]
pub use fetch::{FetchConfig, HttpPreviewDetector};
pub use scan::scan_occurrences;
pub use traits::{AcceptPolicy, PreviewDetector};
