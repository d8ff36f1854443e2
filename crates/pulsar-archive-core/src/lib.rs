//! Pulsar Archive Core Library
//!
//! In-memory model of folded pulsar observations and the engines that
//! combine them: frequency-direction merging of sub-banded archives,
//! pulse-phase alignment against a shared timing model, and synthesis of
//! fully populated archives for testing and simulation.
//!
//! # Architecture
//!
//! This crate defines:
//! - Domain types (`Archive`, `Subintegration`, `Profile`, `Epoch`, etc.)
//! - The `TimingModel` trait and the polynomial spin-down implementation
//! - Engines (`FrequencyAppendEngine`, `TimeAlignmentEngine`,
//!   `ArchiveSynthesizer`)
//! - Error types and result aliases
//! - Narrow external interfaces for loading/unloading and parameter files
//!
//! All operations are synchronous; an engine holds exclusive mutable access
//! to the archive it mutates for the duration of a call.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use pulsar_archive_core::config::EngineConfig;
//! use pulsar_archive_core::engines::{ArchiveSynthesizer, FrequencyAppendEngine, SynthesisConfig};
//! use pulsar_archive_core::timing::PolynomialModel;
//! use pulsar_archive_core::types::Epoch;
//!
//! let model = Arc::new(
//!     PolynomialModel::new(Epoch::new(55000, 0.0), 0.0, 641.93, 0.0, 0.0).unwrap(),
//! );
//! let low = SynthesisConfig {
//!     centre_frequency_mhz: 1050.0,
//!     bandwidth_mhz: 100.0,
//!     ..SynthesisConfig::default()
//! };
//! let high = SynthesisConfig {
//!     centre_frequency_mhz: 1150.0,
//!     bandwidth_mhz: 100.0,
//!     ..SynthesisConfig::default()
//! };
//!
//! let synth = ArchiveSynthesizer::new();
//! let mut primary = synth.synthesize(&low, model.clone()).unwrap();
//! let secondary = synth.synthesize(&high, model).unwrap();
//!
//! let mut engine = FrequencyAppendEngine::new(EngineConfig::default()).unwrap();
//! engine.init(&primary);
//! engine.append(&mut primary, &secondary).unwrap();
//! assert_eq!(primary.nchan(), 8);
//! ```

pub mod config;
pub mod engines;
pub mod error;
pub mod io;
pub mod timing;
pub mod types;

// Re-exports for convenience
pub use config::{ContemporaneityPolicy, EngineConfig};
pub use engines::{ArchiveSynthesizer, FrequencyAppendEngine, SynthesisConfig, TimeAlignmentEngine};
pub use error::{ArchiveError, ArchiveResult};
pub use timing::{PolynomialModel, SharedModel, TimingModel};
pub use types::{
    Archive, ArchiveFormat, Dimensions, Epoch, PolarizationState, Profile, SkyCoordinates,
    Subintegration,
};
