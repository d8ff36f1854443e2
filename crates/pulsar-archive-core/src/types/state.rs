//! Polarimetric state of an archive.

use serde::{Deserialize, Serialize};

/// How the polarization products of an archive are organized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolarizationState {
    /// Total intensity only (npol = 1, DEFAULT).
    #[default]
    Intensity,
    /// Invariant interval (npol = 1).
    Invariant,
    /// PP and QQ products plus cross terms as stored (npol = 2).
    PPQQ,
    /// Coherency products: PP, QQ, Re[PQ], Im[PQ] (npol = 4).
    Coherence,
    /// Stokes parameters: I, Q, U, V (npol = 4).
    Stokes,
}

impl PolarizationState {
    /// Number of polarization products this state implies.
    pub fn npol(&self) -> usize {
        match self {
            Self::Intensity | Self::Invariant => 1,
            Self::PPQQ => 2,
            Self::Coherence | Self::Stokes => 4,
        }
    }

    /// True for states carrying a single polarization product.
    pub fn is_single(&self) -> bool {
        self.npol() == 1
    }

    /// Short name for error messages and logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Intensity => "Intensity",
            Self::Invariant => "Invariant",
            Self::PPQQ => "PPQQ",
            Self::Coherence => "Coherence",
            Self::Stokes => "Stokes",
        }
    }
}
