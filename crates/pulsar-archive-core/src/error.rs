//! Error types for pulsar-archive-core.

use thiserror::Error;

/// Errors that can occur while building, merging, or aligning archives.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// A requested dimension is zero (all of nsub/npol/nchan/nbin must be >= 1).
    #[error("Invalid dimension: {name} must be >= 1, got {value}")]
    InvalidDimension {
        /// Which dimension was rejected ("nsub", "npol", "nchan", "nbin")
        name: &'static str,
        /// The rejected value
        value: usize,
    },

    /// A (isub, ipol, ichan) index fell outside the archive's dimensions.
    #[error("Index out of range: {axis} index {index} >= {len}")]
    IndexOutOfRange {
        /// Which axis was indexed ("subint", "pol", "chan", "bin")
        axis: &'static str,
        /// The offending index
        index: usize,
        /// The axis length
        len: usize,
    },

    /// An amplitude sequence of the wrong length was assigned to a profile.
    #[error("Length mismatch: expected {expected} amplitude bins, got {actual}")]
    LengthMismatch {
        /// The profile's fixed bin count
        expected: usize,
        /// Length of the rejected sequence
        actual: usize,
    },

    /// Cross-field dimension inconsistency (e.g. a single-polarization state
    /// on a multi-polarization archive, or nbin disagreement between archives).
    #[error("Dimension mismatch: {message}")]
    DimensionMismatch {
        /// Description of the inconsistency
        message: String,
    },

    /// The two archives hold different numbers of subintegrations.
    #[error("Subintegration count mismatch: primary has {primary}, secondary has {secondary}")]
    SubintCountMismatch {
        /// Primary archive's nsub
        primary: usize,
        /// Secondary archive's nsub
        secondary: usize,
    },

    /// The two archives hold different numbers of polarizations.
    #[error("Polarization count mismatch: primary has {primary}, secondary has {secondary}")]
    PolarizationMismatch {
        /// Primary archive's npol
        primary: usize,
        /// Secondary archive's npol
        secondary: usize,
    },

    /// The two archives are in different polarimetric states.
    #[error("Polarimetric state mismatch: primary is {primary}, secondary is {secondary}")]
    StateMismatch {
        /// Primary archive's state name
        primary: &'static str,
        /// Secondary archive's state name
        secondary: &'static str,
    },

    /// Corresponding subintegrations were not observed at compatible times.
    #[error(
        "Contemporaneity mismatch at subint {isub}: epochs differ by {offset_secs} s \
         (tolerance {tolerance_secs} s)"
    )]
    ContemporaneityMismatch {
        /// Index of the offending subintegration
        isub: usize,
        /// Measured epoch difference in seconds
        offset_secs: f64,
        /// Configured tolerance in seconds
        tolerance_secs: f64,
    },

    /// Alignment was requested between archives that do not share a timing model.
    #[error("No shared timing model: {message}")]
    NoSharedModel {
        /// Description of which side is missing or mismatched
        message: String,
    },

    /// The append engine was used before `init` recorded a merge target.
    #[error("Append engine not initialized: call init() with the primary archive first")]
    NotInitialized,

    /// Configuration loading or validation failed.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ArchiveError {
    /// Create an InvalidDimension error.
    pub fn invalid_dimension(name: &'static str, value: usize) -> Self {
        Self::InvalidDimension { name, value }
    }

    /// Create an IndexOutOfRange error.
    pub fn index_out_of_range(axis: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { axis, index, len }
    }

    /// Create a DimensionMismatch error.
    pub fn dimension_mismatch(message: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            message: message.into(),
        }
    }

    /// Create a NoSharedModel error.
    pub fn no_shared_model(message: impl Into<String>) -> Self {
        Self::NoSharedModel {
            message: message.into(),
        }
    }
}

impl From<config::ConfigError> for ArchiveError {
    fn from(err: config::ConfigError) -> Self {
        ArchiveError::ConfigError(err.to_string())
    }
}

/// Result type alias for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
