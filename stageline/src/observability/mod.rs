//! Observability utilities: logging setup and progress reporting.

mod logging;
mod progress;

pub use logging::{init_logging, LogFormat};
pub use progress::{CountingProgress, LoggingProgress, NoOpProgress, ProgressReporter};
