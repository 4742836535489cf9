//! Pause-aware reveal timeline.

pub mod controller;
pub mod state;

pub use controller::{RevealController, StartOutcome, TickOutcome};
pub use state::{AnimationPhase, AnimationState, ease_out_cubic};
