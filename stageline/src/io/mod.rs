//! Boundaries to the outside world: where the initial state comes from and
//! where per-stage deltas go.

mod mock_database;
mod sink;
mod source;

pub use mock_database::MockDatabase;
#[cfg(test)]
pub use sink::MockDeltaSink;
pub use sink::{CollectingDeltaSink, DeltaSink, LoggingDeltaSink, NoOpDeltaSink};
pub use source::{StateSource, StaticStateSource};
