//! The archive: an ordered sequence of subintegrations plus metadata.

use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, ArchiveResult};
use crate::timing::SharedModel;
use crate::types::epoch::Epoch;
use crate::types::profile::Profile;
use crate::types::sky::SkyCoordinates;
use crate::types::state::PolarizationState;
use crate::types::subint::Subintegration;

/// The closed set of concrete on-disk formats an archive can be tagged with.
///
/// The core never encodes or decodes these; the tag records which external
/// loader produced the archive and which unloader should receive it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    /// PSRFITS (DEFAULT).
    #[default]
    Psrfits,
    /// Timer archives.
    Timer,
    /// EPN archives.
    Epn,
}

impl ArchiveFormat {
    /// Resolve a format from its configuration name (case-insensitive).
    pub fn from_name(name: &str) -> ArchiveResult<Self> {
        match name.to_ascii_lowercase().as_str() {
            "psrfits" => Ok(Self::Psrfits),
            "timer" => Ok(Self::Timer),
            "epn" => Ok(Self::Epn),
            other => Err(ArchiveError::ConfigError(format!(
                "unknown archive format: {other}"
            ))),
        }
    }
}

/// The `(nsub, npol, nchan, nbin)` shape of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Number of subintegrations
    pub nsub: usize,
    /// Number of polarizations
    pub npol: usize,
    /// Number of frequency channels
    pub nchan: usize,
    /// Number of phase bins
    pub nbin: usize,
}

impl Dimensions {
    /// Validate that every dimension is at least 1.
    pub fn validate(&self) -> ArchiveResult<()> {
        for (name, value) in [
            ("nsub", self.nsub),
            ("npol", self.npol),
            ("nchan", self.nchan),
            ("nbin", self.nbin),
        ] {
            if value == 0 {
                return Err(ArchiveError::invalid_dimension(name, value));
            }
        }
        Ok(())
    }
}

/// A folded pulsar observation dataset held fully in memory.
///
/// Owns its subintegrations, which own their profiles. All subintegrations
/// share one `(npol, nchan, nbin)` shape; the channel frequency grid may
/// vary in value between subintegrations but never in count. At most one
/// timing model is attached at a time; it may be reassigned so that a
/// secondary archive can adopt a primary's model before alignment.
pub struct Archive {
    format: ArchiveFormat,
    source_name: String,
    dispersion_measure: f64,
    sky_coordinates: SkyCoordinates,
    telescope_id: String,
    polarization_state: PolarizationState,
    centre_frequency_mhz: f64,
    bandwidth_mhz: f64,
    model: Option<SharedModel>,
    subints: Vec<Subintegration>,
}

impl Archive {
    /// Create an empty (zero-amplitude) archive of the given shape.
    ///
    /// Every dimension must be at least 1, otherwise `InvalidDimension`.
    pub fn new(
        format: ArchiveFormat,
        nsub: usize,
        npol: usize,
        nchan: usize,
        nbin: usize,
    ) -> ArchiveResult<Self> {
        let dims = Dimensions {
            nsub,
            npol,
            nchan,
            nbin,
        };
        dims.validate()?;

        let mut subints = Vec::with_capacity(nsub);
        for _ in 0..nsub {
            subints.push(Subintegration::new(Epoch::new(0, 0.0), 0.0, npol, nchan, nbin)?);
        }

        Ok(Self {
            format,
            source_name: String::new(),
            dispersion_measure: 0.0,
            sky_coordinates: SkyCoordinates::default(),
            telescope_id: String::new(),
            polarization_state: match npol {
                1 => PolarizationState::Intensity,
                2 => PolarizationState::PPQQ,
                _ => PolarizationState::Coherence,
            },
            centre_frequency_mhz: 0.0,
            bandwidth_mhz: 0.0,
            model: None,
            subints,
        })
    }

    /// On-disk format tag.
    #[inline]
    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    /// Current shape.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            nsub: self.subints.len(),
            npol: self.subints[0].npol(),
            nchan: self.subints[0].nchan(),
            nbin: self.subints[0].nbin(),
        }
    }

    /// Number of subintegrations.
    #[inline]
    pub fn nsub(&self) -> usize {
        self.subints.len()
    }

    /// Number of polarizations.
    #[inline]
    pub fn npol(&self) -> usize {
        self.subints[0].npol()
    }

    /// Number of frequency channels.
    #[inline]
    pub fn nchan(&self) -> usize {
        self.subints[0].nchan()
    }

    /// Number of phase bins.
    #[inline]
    pub fn nbin(&self) -> usize {
        self.subints[0].nbin()
    }

    /// Source name.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Set the source name.
    pub fn set_source_name(&mut self, name: impl Into<String>) {
        self.source_name = name.into();
    }

    /// Dispersion measure in pc cm^-3.
    pub fn dispersion_measure(&self) -> f64 {
        self.dispersion_measure
    }

    /// Set the dispersion measure.
    pub fn set_dispersion_measure(&mut self, dm: f64) {
        self.dispersion_measure = dm;
    }

    /// Sky coordinates of the source.
    pub fn sky_coordinates(&self) -> SkyCoordinates {
        self.sky_coordinates
    }

    /// Set the sky coordinates.
    pub fn set_sky_coordinates(&mut self, coords: SkyCoordinates) {
        self.sky_coordinates = coords;
    }

    /// Telescope identifier.
    pub fn telescope_id(&self) -> &str {
        &self.telescope_id
    }

    /// Set the telescope identifier.
    pub fn set_telescope_id(&mut self, id: impl Into<String>) {
        self.telescope_id = id.into();
    }

    /// Polarimetric state.
    pub fn polarization_state(&self) -> PolarizationState {
        self.polarization_state
    }

    /// Set the polarimetric state.
    ///
    /// A single-polarization state on a multi-polarization archive (and
    /// vice versa) is rejected with `DimensionMismatch`.
    pub fn set_polarization_state(&mut self, state: PolarizationState) -> ArchiveResult<()> {
        let npol = self.npol();
        if state.is_single() != (npol == 1) {
            return Err(ArchiveError::dimension_mismatch(format!(
                "state {} implies npol {}, archive has npol {}",
                state.name(),
                state.npol(),
                npol
            )));
        }
        self.polarization_state = state;
        Ok(())
    }

    /// Nominal centre frequency in MHz.
    pub fn centre_frequency_mhz(&self) -> f64 {
        self.centre_frequency_mhz
    }

    /// Set the nominal centre frequency.
    pub fn set_centre_frequency_mhz(&mut self, freq_mhz: f64) {
        self.centre_frequency_mhz = freq_mhz;
    }

    /// Nominal total bandwidth in MHz.
    pub fn bandwidth_mhz(&self) -> f64 {
        self.bandwidth_mhz
    }

    /// Set the nominal bandwidth.
    pub fn set_bandwidth_mhz(&mut self, bw_mhz: f64) {
        self.bandwidth_mhz = bw_mhz;
    }

    /// The attached timing model, if any.
    pub fn model(&self) -> Option<&SharedModel> {
        self.model.as_ref()
    }

    /// Attach (or replace) the timing model.
    pub fn set_model(&mut self, model: SharedModel) {
        self.model = Some(model);
    }

    /// Borrow a subintegration.
    pub fn subint(&self, isub: usize) -> ArchiveResult<&Subintegration> {
        self.subints
            .get(isub)
            .ok_or_else(|| ArchiveError::index_out_of_range("subint", isub, self.subints.len()))
    }

    /// Mutably borrow a subintegration.
    pub fn subint_mut(&mut self, isub: usize) -> ArchiveResult<&mut Subintegration> {
        let nsub = self.subints.len();
        self.subints
            .get_mut(isub)
            .ok_or_else(|| ArchiveError::index_out_of_range("subint", isub, nsub))
    }

    /// Iterate over subintegrations.
    pub fn subints(&self) -> impl Iterator<Item = &Subintegration> {
        self.subints.iter()
    }

    /// Iterate over subintegrations mutably.
    pub fn subints_mut(&mut self) -> impl Iterator<Item = &mut Subintegration> {
        self.subints.iter_mut()
    }

    /// Borrow the profile at `(isub, ipol, ichan)`.
    pub fn profile(&self, isub: usize, ipol: usize, ichan: usize) -> ArchiveResult<&Profile> {
        self.subint(isub)?.profile(ipol, ichan)
    }

    /// Mutably borrow the profile at `(isub, ipol, ichan)`.
    pub fn profile_mut(
        &mut self,
        isub: usize,
        ipol: usize,
        ichan: usize,
    ) -> ArchiveResult<&mut Profile> {
        self.subint_mut(isub)?.profile_mut(ipol, ichan)
    }

    /// Check the minimum set of observing parameters that must agree before
    /// this archive and `other` may be combined: polarimetric state, source
    /// name, and phase bin count.
    pub fn mixable(&self, other: &Archive) -> ArchiveResult<()> {
        if self.polarization_state != other.polarization_state {
            return Err(ArchiveError::StateMismatch {
                primary: self.polarization_state.name(),
                secondary: other.polarization_state.name(),
            });
        }
        if !self.source_name.is_empty()
            && !other.source_name.is_empty()
            && self.source_name != other.source_name
        {
            return Err(ArchiveError::dimension_mismatch(format!(
                "archives observe different sources: {} and {}",
                self.source_name, other.source_name
            )));
        }
        if self.nbin() != other.nbin() {
            return Err(ArchiveError::dimension_mismatch(format!(
                "archives have different bin counts: {} and {}",
                self.nbin(),
                other.nbin()
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("format", &self.format)
            .field("source_name", &self.source_name)
            .field("dimensions", &self.dimensions())
            .field("state", &self.polarization_state)
            .field("centre_frequency_mhz", &self.centre_frequency_mhz)
            .field("bandwidth_mhz", &self.bandwidth_mhz)
            .field("has_model", &self.model.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::PolynomialModel;
    use std::sync::Arc;

    #[test]
    fn test_new_rejects_each_zero_dimension() {
        for (nsub, npol, nchan, nbin, name) in [
            (0, 1, 1, 8, "nsub"),
            (1, 0, 1, 8, "npol"),
            (1, 1, 0, 8, "nchan"),
            (1, 1, 1, 0, "nbin"),
        ] {
            let err = Archive::new(ArchiveFormat::Psrfits, nsub, npol, nchan, nbin).unwrap_err();
            match err {
                ArchiveError::InvalidDimension { name: got, .. } => assert_eq!(got, name),
                other => panic!("expected InvalidDimension, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_dimensions_reported() {
        let a = Archive::new(ArchiveFormat::Timer, 3, 2, 4, 16).unwrap();
        assert_eq!(
            a.dimensions(),
            Dimensions {
                nsub: 3,
                npol: 2,
                nchan: 4,
                nbin: 16
            }
        );
    }

    #[test]
    fn test_profile_indexing_out_of_range() {
        let a = Archive::new(ArchiveFormat::Psrfits, 2, 2, 4, 8).unwrap();
        assert!(a.profile(1, 1, 3).is_ok());
        assert!(matches!(
            a.profile(2, 0, 0),
            Err(ArchiveError::IndexOutOfRange { axis: "subint", .. })
        ));
        assert!(matches!(
            a.profile(0, 2, 0),
            Err(ArchiveError::IndexOutOfRange { axis: "pol", .. })
        ));
        assert!(matches!(
            a.profile(0, 0, 4),
            Err(ArchiveError::IndexOutOfRange { axis: "chan", .. })
        ));
    }

    #[test]
    fn test_single_pol_state_requires_npol_one() {
        let mut a = Archive::new(ArchiveFormat::Psrfits, 1, 4, 2, 8).unwrap();
        let err = a.set_polarization_state(PolarizationState::Intensity).unwrap_err();
        assert!(matches!(err, ArchiveError::DimensionMismatch { .. }));
        assert!(a.set_polarization_state(PolarizationState::Stokes).is_ok());

        let mut b = Archive::new(ArchiveFormat::Psrfits, 1, 1, 2, 8).unwrap();
        assert!(b.set_polarization_state(PolarizationState::Invariant).is_ok());
        assert!(b.set_polarization_state(PolarizationState::Stokes).is_err());
    }

    #[test]
    fn test_model_reassignment() {
        let mut a = Archive::new(ArchiveFormat::Psrfits, 1, 1, 1, 8).unwrap();
        assert!(a.model().is_none());
        let m: SharedModel =
            Arc::new(PolynomialModel::new(Epoch::new(55000, 0.0), 0.0, 1.0, 0.0, 0.0).unwrap());
        a.set_model(m.clone());
        assert!(a.model().unwrap().matches(m.as_ref()));
    }

    #[test]
    fn test_format_from_name() {
        assert_eq!(ArchiveFormat::from_name("PSRFITS").unwrap(), ArchiveFormat::Psrfits);
        assert_eq!(ArchiveFormat::from_name("timer").unwrap(), ArchiveFormat::Timer);
        assert!(ArchiveFormat::from_name("asp").is_err());
    }

    #[test]
    fn test_mixable_checks_state_source_nbin() {
        let mut a = Archive::new(ArchiveFormat::Psrfits, 1, 1, 2, 8).unwrap();
        let mut b = Archive::new(ArchiveFormat::Psrfits, 1, 1, 2, 8).unwrap();
        assert!(a.mixable(&b).is_ok());

        a.set_source_name("J0437-4715");
        b.set_source_name("J1939+2134");
        assert!(a.mixable(&b).is_err());

        b.set_source_name("J0437-4715");
        assert!(a.mixable(&b).is_ok());

        let c = Archive::new(ArchiveFormat::Psrfits, 1, 1, 2, 16).unwrap();
        assert!(a.mixable(&c).is_err());
    }
}
