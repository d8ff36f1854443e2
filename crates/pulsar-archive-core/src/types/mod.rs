//! Core domain types for pulsar archives.

mod archive;
mod epoch;
mod profile;
mod sky;
mod state;
mod subint;

pub use archive::*;
pub use epoch::*;
pub use profile::*;
pub use sky::*;
pub use state::*;
pub use subint::*;
