use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display as StrumDisplay, EnumIter, EnumString};

/// Price column of a bar
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

/// Moving-average column of a bar
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter, EnumString, AsRefStr, Serialize, Deserialize,
)]
pub enum SmaSlot {
    #[strum(serialize = "sma10")]
    #[serde(rename = "sma10")]
    Sma10,
    #[strum(serialize = "sma20")]
    #[serde(rename = "sma20")]
    Sma20,
    #[strum(serialize = "sma50")]
    #[serde(rename = "sma50")]
    Sma50,
}

impl SmaSlot {
    pub fn period(&self) -> usize {
        match self {
            Self::Sma10 => 10,
            Self::Sma20 => 20,
            Self::Sma50 => 50,
        }
    }
}

/// Canonical field a raw record can be resolved into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Price(PriceField),
    Volume,
    Sma(SmaSlot),
}
