/// Why a pointer selection was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RejectReason {
    /// Pointer is on or before the last historical bar
    BeforeBoundary,
    /// Caller turned selection off
    SelectionDisabled,
    /// No historical bars to anchor the boundary
    EmptySeries,
    /// Pointer is above or below the plot area
    OutsidePlot,
    /// Gesture was a pan/scroll, or started outside the selectable region
    NotAClick,
}

/// Every failure the chart engine knows about.
///
/// Most variants are absorbed where they happen (logged, then degraded);
/// only config and payload parsing surface them to callers.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartError {
    MalformedBar { index: usize, reason: String },
    InvalidJsonEmbedding { index: usize, reason: String },
    EmptySeries,
    NonConvergentScaleSolve { iterations: usize, error_px: f64 },
    RejectedSelection(RejectReason),
    StaleAnimationTick { scheduled: u64, current: u64 },
    InvalidConfig(String),
    InvalidSeriesPayload(String),
}

impl std::fmt::Display for ChartError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartError::MalformedBar { index, reason } => {
                write!(f, "Malformed bar #{}: {}", index, reason)
            }
            ChartError::InvalidJsonEmbedding { index, reason } => {
                write!(f, "Invalid embedded JSON in bar #{}: {}", index, reason)
            }
            ChartError::EmptySeries => write!(f, "Series has no valid bars"),
            ChartError::NonConvergentScaleSolve { iterations, error_px } => write!(
                f,
                "Divider alignment did not converge after {} iterations (error {:.4}px)",
                iterations, error_px
            ),
            ChartError::RejectedSelection(reason) => write!(f, "Selection rejected: {:?}", reason),
            ChartError::StaleAnimationTick { scheduled, current } => write!(
                f,
                "Stale animation tick for generation {} (current {})",
                scheduled, current
            ),
            ChartError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            ChartError::InvalidSeriesPayload(msg) => write!(f, "Invalid series payload: {}", msg),
        }
    }
}

impl std::error::Error for ChartError {}

impl From<serde_json::Error> for ChartError {
    fn from(error: serde_json::Error) -> Self {
        ChartError::InvalidSeriesPayload(error.to_string())
    }
}

pub type ChartResult<T> = Result<T, ChartError>;
