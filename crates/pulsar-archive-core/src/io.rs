//! External collaborator interfaces: loading, unloading, parameter files.
//!
//! The core never touches disk formats itself. Concrete format codecs live
//! behind these narrow traits; their failures are opaque to the engines and
//! surfaced to the caller unchanged.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Archive, SkyCoordinates};

/// Opaque failure while decoding an archive from disk.
#[derive(Debug, Error)]
#[error("Load error: {message}")]
pub struct LoadError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl LoadError {
    /// Create a load error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Opaque failure while encoding an archive to disk.
#[derive(Debug, Error)]
#[error("Unload error: {message}")]
pub struct UnloadError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl UnloadError {
    /// Create an unload error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }
}

impl From<std::io::Error> for UnloadError {
    fn from(err: std::io::Error) -> Self {
        Self {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Decodes a fully-populated archive from a path.
pub trait ArchiveLoader {
    /// Load an archive; malformed input yields an opaque [`LoadError`].
    fn load(&self, path: &Path) -> Result<Archive, LoadError>;
}

/// Encodes an archive to a path once combination/alignment is complete.
pub trait ArchiveUnloader {
    /// Write the archive out; the archive itself is read-only here.
    fn unload(&self, archive: &Archive, path: &Path) -> Result<(), UnloadError>;
}

/// A plain mapping of named ephemeris/metadata fields, as produced by an
/// external pulsar-parameter-file reader.
///
/// Keys are case-sensitive, values are stored as strings and parsed on
/// access, which matches how parameter files carry them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterSet {
    fields: HashMap<String, String>,
}

impl ParameterSet {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a named field.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Remove all fields.
    pub fn clear(&mut self) {
        self.fields.clear();
    }

    /// Raw string value of a field.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// Field parsed as f64, if present and parseable.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.fields.get(key).and_then(|v| v.parse().ok())
    }

    /// Source name (`source_name` field).
    pub fn source_name(&self) -> Option<&str> {
        self.get("source_name")
    }

    /// Dispersion measure in pc cm^-3 (`dm` field).
    pub fn dispersion_measure(&self) -> Option<f64> {
        self.get_f64("dm")
    }

    /// Telescope identifier (`telescope` field).
    pub fn telescope(&self) -> Option<&str> {
        self.get("telescope")
    }

    /// Sky coordinates from `ra_deg`/`dec_deg` fields.
    pub fn sky_coordinates(&self) -> Option<SkyCoordinates> {
        match (self.get_f64("ra_deg"), self.get_f64("dec_deg")) {
            (Some(ra), Some(dec)) => Some(SkyCoordinates::new(ra, dec)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameter_set_typed_getters() {
        let mut p = ParameterSet::new();
        p.set("source_name", "J0437-4715");
        p.set("dm", "2.64476");
        p.set("ra_deg", "69.3158");
        p.set("dec_deg", "-47.2525");

        assert_eq!(p.source_name(), Some("J0437-4715"));
        assert!((p.dispersion_measure().unwrap() - 2.64476).abs() < 1e-9);
        let sky = p.sky_coordinates().unwrap();
        assert!((sky.ra_deg - 69.3158).abs() < 1e-9);
        assert!((sky.dec_deg + 47.2525).abs() < 1e-9);
    }

    #[test]
    fn test_missing_and_malformed_fields() {
        let mut p = ParameterSet::new();
        p.set("dm", "not-a-number");
        assert_eq!(p.dispersion_measure(), None);
        assert_eq!(p.sky_coordinates(), None);
        assert_eq!(p.telescope(), None);
    }

    #[test]
    fn test_load_error_is_opaque_but_displays() {
        let err = LoadError::new("truncated header");
        assert!(err.to_string().contains("truncated header"));
    }
}
