//! Core types for stageline.
//!
//! This module contains the fundamental data types:
//! - [`State`]: the ordered field mapping passed between stages
//! - [`Delta`]: the fields a stage added or changed
//! - [`StageStatus`]: per-stage outcome

mod delta;
mod state;
mod status;

pub use delta::{extract_delta, Delta};
pub use state::State;
pub use status::StageStatus;
