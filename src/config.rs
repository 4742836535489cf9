//! Tunable constants for layout, solver and animation timing.
//!
//! Defaults are the product values. Hosts may override any subset by passing
//! partial JSON to [`EngineConfig::from_json`].

use crate::domain::chart::value_objects::{ChartMargins, DeviceClass};
use crate::domain::errors::{ChartError, ChartResult};
use serde::{Deserialize, Serialize};

/// Phase durations in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnimationTimings {
    pub initial_delay_ms: f64,
    pub zoom_ms: f64,
    pub reveal_ms: f64,
    /// Replaces zoom + reveal when there is no future data
    pub settle_ms: f64,
    /// Fixed, independent of future series length
    pub observation_ms: f64,
    /// Timer cadence for the delay phases and while paused
    pub poll_interval_ms: f64,
}

impl Default for AnimationTimings {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1500.0,
            zoom_ms: 1500.0,
            reveal_ms: 1800.0,
            settle_ms: 500.0,
            observation_ms: 5000.0,
            poll_interval_ms: 50.0,
        }
    }
}

impl AnimationTimings {
    /// Wall time of an unpaused run
    pub fn total_ms(&self, has_future: bool) -> f64 {
        let middle = if has_future { self.zoom_ms + self.reveal_ms } else { self.settle_ms };
        self.initial_delay_ms + middle + self.observation_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    /// Viewports narrower than this are `DeviceClass::Narrow`
    pub narrow_breakpoint_px: f64,
    pub divider_fraction_narrow: f64,
    pub divider_fraction_wide: f64,
    pub volume_fraction_narrow: f64,
    pub volume_fraction_wide: f64,
    pub extension_fraction_narrow: f64,
    pub extension_fraction_wide: f64,
    pub min_extension_narrow: usize,
    /// Candle body width as a share of the time step
    pub bar_width_ratio: f64,
    /// Outer padding of the point scale, in steps
    pub time_padding: f64,
    pub margins_narrow: ChartMargins,
    pub margins_wide: ChartMargins,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            narrow_breakpoint_px: 768.0,
            divider_fraction_narrow: 0.70,
            divider_fraction_wide: 0.75,
            volume_fraction_narrow: 0.25,
            volume_fraction_wide: 0.20,
            extension_fraction_narrow: 0.30,
            extension_fraction_wide: 0.50,
            min_extension_narrow: 15,
            bar_width_ratio: 0.8,
            time_padding: 0.5,
            margins_narrow: ChartMargins { top: 10.0, right: 45.0, bottom: 25.0, left: 5.0 },
            margins_wide: ChartMargins { top: 20.0, right: 60.0, bottom: 30.0, left: 10.0 },
        }
    }
}

impl LayoutConfig {
    pub fn device_for_width(&self, width: f64) -> DeviceClass {
        if width < self.narrow_breakpoint_px { DeviceClass::Narrow } else { DeviceClass::Wide }
    }

    pub fn divider_fraction(&self, device: DeviceClass) -> f64 {
        match device {
            DeviceClass::Narrow => self.divider_fraction_narrow,
            DeviceClass::Wide => self.divider_fraction_wide,
        }
    }

    pub fn volume_fraction(&self, device: DeviceClass) -> f64 {
        match device {
            DeviceClass::Narrow => self.volume_fraction_narrow,
            DeviceClass::Wide => self.volume_fraction_wide,
        }
    }

    pub fn margins(&self, device: DeviceClass) -> ChartMargins {
        match device {
            DeviceClass::Narrow => self.margins_narrow,
            DeviceClass::Wide => self.margins_wide,
        }
    }

    /// Number of synthetic click-target indices appended after `visible` bars
    pub fn extension_count(&self, device: DeviceClass, visible: usize) -> usize {
        match device {
            DeviceClass::Narrow => {
                let n = (visible as f64 * self.extension_fraction_narrow).ceil() as usize;
                n.max(self.min_extension_narrow)
            }
            DeviceClass::Wide => (visible as f64 * self.extension_fraction_wide).ceil() as usize,
        }
    }
}

/// Budget of the divider-alignment search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SolverConfig {
    pub max_iterations: usize,
    /// Budget for re-centering once extension indices are added
    pub refine_iterations: usize,
    pub epsilon_px: f64,
    /// Share of each correction applied per iteration
    pub damping: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { max_iterations: 50, refine_iterations: 30, epsilon_px: 0.01, damping: 0.85 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub timings: AnimationTimings,
    pub layout: LayoutConfig,
    pub solver: SolverConfig,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> ChartResult<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| ChartError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ChartResult<()> {
        let t = &self.timings;
        let durations = [
            ("initialDelayMs", t.initial_delay_ms),
            ("zoomMs", t.zoom_ms),
            ("revealMs", t.reveal_ms),
            ("settleMs", t.settle_ms),
            ("observationMs", t.observation_ms),
        ];
        for (name, value) in durations {
            if !value.is_finite() || value < 0.0 {
                return Err(ChartError::InvalidConfig(format!("{} must be >= 0, got {}", name, value)));
            }
        }
        if !(t.poll_interval_ms.is_finite() && t.poll_interval_ms > 0.0) {
            return Err(ChartError::InvalidConfig("pollIntervalMs must be > 0".to_string()));
        }

        let l = &self.layout;
        let fractions = [
            ("dividerFractionNarrow", l.divider_fraction_narrow),
            ("dividerFractionWide", l.divider_fraction_wide),
            ("volumeFractionNarrow", l.volume_fraction_narrow),
            ("volumeFractionWide", l.volume_fraction_wide),
            ("barWidthRatio", l.bar_width_ratio),
        ];
        for (name, value) in fractions {
            if !(value > 0.0 && value < 1.0) {
                return Err(ChartError::InvalidConfig(format!("{} must be in (0, 1), got {}", name, value)));
            }
        }
        if l.time_padding < 0.0 || l.extension_fraction_narrow < 0.0 || l.extension_fraction_wide < 0.0 {
            return Err(ChartError::InvalidConfig("padding and extension fractions must be >= 0".to_string()));
        }

        let s = &self.solver;
        if s.max_iterations == 0 || s.refine_iterations == 0 {
            return Err(ChartError::InvalidConfig("iteration budgets must be > 0".to_string()));
        }
        if !(s.damping > 0.0 && s.damping <= 1.0) || !(s.epsilon_px > 0.0) {
            return Err(ChartError::InvalidConfig("damping must be in (0, 1], epsilon > 0".to_string()));
        }
        Ok(())
    }
}
