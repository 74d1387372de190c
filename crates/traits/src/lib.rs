pub mod cancel;
pub mod metrics;
pub mod progress;

pub use cancel::CancellationToken;
pub use metrics::{MonospaceMetrics, ProportionalMetrics, SharedMetrics, TextMetrics};
pub use progress::{NoopProgressListener, ProgressEvent, ProgressListener};
