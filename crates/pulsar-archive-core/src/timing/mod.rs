//! Rotational timing models: pulse phase as a function of time.

mod model;

pub use model::*;
