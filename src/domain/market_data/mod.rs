//! Market data aggregate: raw and canonical bars, normalization and moving averages.

pub mod entities;
pub mod indicator_engine;
pub mod normalizer;
pub mod value_objects;

pub use entities::*;
pub use indicator_engine::*;
pub use normalizer::{normalize, normalize_bar, parse_series_payload};
pub use value_objects::*;
