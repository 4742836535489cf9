use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

/// Value Object - Chart kind, each with its own padding and indicator policy
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Main practice chart: historical bars with the outcome revealed after the divider
    #[display(fmt = "Historical")]
    #[strum(serialize = "historical")]
    Historical,
    #[display(fmt = "Daily")]
    #[strum(serialize = "daily")]
    Daily,
    /// Intraday bars
    #[display(fmt = "Hourly")]
    #[strum(serialize = "hourly")]
    Hourly,
    /// Coarse bars
    #[display(fmt = "Monthly")]
    #[strum(serialize = "monthly")]
    Monthly,
    /// Previous-period chart that fills its container edge to edge
    #[display(fmt = "Previous")]
    #[strum(serialize = "previous")]
    Previous,
}

impl ChartKind {
    pub fn shows_sma50(&self) -> bool {
        !matches!(self, Self::Hourly | Self::Monthly)
    }

    pub fn shows_volume(&self) -> bool {
        !matches!(self, Self::Monthly)
    }

    /// Price domain is taken from historical bars only and never zooms
    pub fn uses_historical_price_domain(&self) -> bool {
        matches!(self, Self::Historical)
    }

    /// Symmetric padding added to the interpolated price domain
    pub fn price_padding(&self) -> f64 {
        match self {
            Self::Previous => 0.0,
            _ => 0.2,
        }
    }

    /// Multiplier applied to the volume maximum
    pub fn volume_headroom(&self) -> f64 {
        match self {
            Self::Previous => 1.0,
            _ => 1.1,
        }
    }

    pub fn fills_container(&self) -> bool {
        matches!(self, Self::Previous)
    }
}

/// Value Object - Viewport width class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    #[display(fmt = "narrow")]
    Narrow,
    #[display(fmt = "wide")]
    Wide,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartMargins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Value Object - Chart viewport in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartViewport {
    pub width: f64,
    pub height: f64,
    pub device: DeviceClass,
}

impl Default for ChartViewport {
    fn default() -> Self {
        Self { width: 800.0, height: 500.0, device: DeviceClass::Wide }
    }
}

impl ChartViewport {
    pub fn new(width: f64, height: f64, device: DeviceClass) -> Self {
        Self { width, height, device }
    }

    pub fn is_narrow(&self) -> bool {
        self.device == DeviceClass::Narrow
    }

    pub fn inner_width(&self, margins: &ChartMargins) -> f64 {
        (self.width - margins.left - margins.right).max(0.0)
    }

    pub fn inner_height(&self, margins: &ChartMargins) -> f64 {
        (self.height - margins.top - margins.bottom).max(0.0)
    }
}

/// Continuous linear mapping `domain -> range`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn scale(&self, value: f64) -> f64 {
        let span = self.domain.1 - self.domain.0;
        if span == 0.0 || !span.is_finite() {
            return (self.range.0 + self.range.1) / 2.0;
        }
        let t = (value - self.domain.0) / span;
        self.range.0 + t * (self.range.1 - self.range.0)
    }

    pub fn invert(&self, px: f64) -> f64 {
        let span = self.range.1 - self.range.0;
        if span == 0.0 || !span.is_finite() {
            return (self.domain.0 + self.domain.1) / 2.0;
        }
        let t = (px - self.range.0) / span;
        self.domain.0 + t * (self.domain.1 - self.domain.0)
    }

    /// Round tick values (1, 2 or 5 times a power of ten) covering the domain
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = if self.domain.0 <= self.domain.1 {
            self.domain
        } else {
            (self.domain.1, self.domain.0)
        };
        if count == 0 || !(hi - lo).is_finite() || hi <= lo {
            return Vec::new();
        }
        let raw_step = (hi - lo) / count as f64;
        let power = 10f64.powf(raw_step.log10().floor());
        let error = raw_step / power;
        let step = power
            * if error >= 7.07 {
                10.0
            } else if error >= 3.16 {
                5.0
            } else if error >= 1.41 {
                2.0
            } else {
                1.0
            };
        let first = (lo / step).ceil() as i64;
        let last = (hi / step).floor() as i64;
        (first..=last).map(|k| k as f64 * step).collect()
    }
}

/// Ordinal point scale over indices `0..len`, with outer padding measured in
/// steps and centred alignment. Positions extrapolate linearly for indices
/// outside the domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointScale {
    pub len: usize,
    pub range: (f64, f64),
    pub padding: f64,
}

impl PointScale {
    pub fn new(len: usize, range: (f64, f64), padding: f64) -> Self {
        Self { len, range, padding }
    }

    pub fn step(&self) -> f64 {
        let slots = (self.len as f64 - 1.0 + 2.0 * self.padding).max(1.0);
        (self.range.1 - self.range.0) / slots
    }

    /// Pixel of the first domain point
    pub fn start(&self) -> f64 {
        let step = self.step();
        let used = step * (self.len.saturating_sub(1)) as f64;
        self.range.0 + (self.range.1 - self.range.0 - used) * 0.5
    }

    pub fn position(&self, index: usize) -> f64 {
        self.start() + self.step() * index as f64
    }

    pub fn contains(&self, index: usize) -> bool {
        index < self.len
    }
}
