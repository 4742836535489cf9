use crate::config::AnimationTimings;
use derive_more::Display;
use serde::Serialize;

/// Phase of the reveal timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AnimationPhase {
    #[display(fmt = "idle")]
    Idle,
    #[display(fmt = "initialDelay")]
    InitialDelay,
    #[display(fmt = "zooming")]
    Zooming,
    #[display(fmt = "revealing")]
    Revealing,
    /// Stands in for zoom + reveal when there is no future data
    #[display(fmt = "settling")]
    Settling,
    #[display(fmt = "observationDelay")]
    ObservationDelay,
    #[display(fmt = "complete")]
    Complete,
    #[display(fmt = "stopped")]
    Stopped,
}

impl AnimationPhase {
    /// Wall-clock length of a timed phase
    pub fn duration_ms(&self, timings: &AnimationTimings) -> Option<f64> {
        match self {
            Self::InitialDelay => Some(timings.initial_delay_ms),
            Self::Zooming => Some(timings.zoom_ms),
            Self::Revealing => Some(timings.reveal_ms),
            Self::Settling => Some(timings.settle_ms),
            Self::ObservationDelay => Some(timings.observation_ms),
            Self::Idle | Self::Complete | Self::Stopped => None,
        }
    }

    pub fn next(&self, has_future: bool) -> Option<Self> {
        match self {
            Self::InitialDelay if has_future => Some(Self::Zooming),
            Self::InitialDelay => Some(Self::Settling),
            Self::Zooming => Some(Self::Revealing),
            Self::Revealing | Self::Settling => Some(Self::ObservationDelay),
            Self::ObservationDelay => Some(Self::Complete),
            Self::Idle | Self::Complete | Self::Stopped => None,
        }
    }

    /// Phases that need a redraw every frame
    pub fn is_animated(&self) -> bool {
        matches!(self, Self::Zooming | Self::Revealing)
    }

    pub fn is_running(&self) -> bool {
        !matches!(self, Self::Idle | Self::Complete | Self::Stopped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationState {
    pub phase: AnimationPhase,
    /// Eased, `[0, 100]`
    pub zoom_progress: f64,
    /// Eased, `[0, 100]`
    pub reveal_progress: f64,
    pub paused_accumulated_ms: f64,
    pub pause_started_at: Option<f64>,
    pub phase_started_at: f64,
    pub generation: u64,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            phase: AnimationPhase::Idle,
            zoom_progress: 0.0,
            reveal_progress: 0.0,
            paused_accumulated_ms: 0.0,
            pause_started_at: None,
            phase_started_at: 0.0,
            generation: 0,
        }
    }
}

impl AnimationState {
    pub fn is_paused(&self) -> bool {
        self.pause_started_at.is_some()
    }

    /// Unpaused time spent in the current phase
    pub fn phase_elapsed(&self, now: f64) -> f64 {
        (now - self.phase_started_at - self.paused_accumulated_ms).max(0.0)
    }
}

/// Cubic ease-out
pub fn ease_out_cubic(p: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    1.0 - (1.0 - p).powi(3)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ease_is_pinned_at_both_ends() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert!((ease_out_cubic(0.5) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn no_future_path_settles() {
        assert_eq!(AnimationPhase::InitialDelay.next(false), Some(AnimationPhase::Settling));
        assert_eq!(AnimationPhase::Settling.next(false), Some(AnimationPhase::ObservationDelay));
        assert_eq!(AnimationPhase::Complete.next(true), None);
    }
}
