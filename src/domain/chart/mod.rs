//! Chart aggregate: scales, drawable geometry and pointer mapping.

pub mod geometry;
pub mod interaction;
pub mod scales;
pub mod value_objects;

pub use geometry::*;
pub use interaction::*;
pub use scales::*;
pub use value_objects::*;
