//! Archive combination, alignment, and synthesis engines.
//!
//! Engines take exclusive mutable access to their primary argument for the
//! duration of a call and shared read-only access to the secondary, so the
//! no-concurrent-mutation rule is enforced at the type level.

pub mod freq_append;
pub mod synthesizer;
pub mod time_align;

pub use freq_append::FrequencyAppendEngine;
pub use synthesizer::{AmplitudeGenerator, ArchiveSynthesizer, NoiseGenerator, SynthesisConfig};
pub use time_align::TimeAlignmentEngine;
