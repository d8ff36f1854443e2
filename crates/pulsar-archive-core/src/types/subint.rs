//! Subintegration: one time-segment of an archive.

use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, ArchiveResult};
use crate::types::epoch::Epoch;
use crate::types::profile::Profile;

/// A time-bounded epoch holding an `(npol, nchan)` grid of profiles.
///
/// Profiles are stored row-major by polarization, so the profile for
/// `(ipol, ichan)` lives at `ipol * nchan + ichan`. Each channel carries its
/// own centre frequency; the frequency grid may differ in value between
/// subintegrations of one archive, but never in count.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "SubintegrationData")]
pub struct Subintegration {
    epoch: Epoch,
    duration_secs: f64,
    /// Fractional pulse phase the profiles are folded against, in rotations.
    reference_phase: f64,
    centre_frequencies_mhz: Vec<f64>,
    npol: usize,
    profiles: Vec<Profile>,
}

/// Raw mirror deserialized first, so external input cannot bypass the
/// grid-shape invariants.
#[derive(Deserialize)]
struct SubintegrationData {
    epoch: Epoch,
    duration_secs: f64,
    reference_phase: f64,
    centre_frequencies_mhz: Vec<f64>,
    npol: usize,
    profiles: Vec<Profile>,
}

impl TryFrom<SubintegrationData> for Subintegration {
    type Error = ArchiveError;

    fn try_from(data: SubintegrationData) -> Result<Self, Self::Error> {
        if data.npol == 0 {
            return Err(ArchiveError::invalid_dimension("npol", 0));
        }
        let nchan = data.centre_frequencies_mhz.len();
        if nchan == 0 {
            return Err(ArchiveError::invalid_dimension("nchan", 0));
        }
        if data.profiles.len() != data.npol * nchan {
            return Err(ArchiveError::dimension_mismatch(format!(
                "profile grid holds {} entries, shape ({}, {}) needs {}",
                data.profiles.len(),
                data.npol,
                nchan,
                data.npol * nchan
            )));
        }
        let nbin = data.profiles[0].nbin();
        for p in &data.profiles {
            if p.nbin() != nbin {
                return Err(ArchiveError::LengthMismatch {
                    expected: nbin,
                    actual: p.nbin(),
                });
            }
        }

        let mut sub = Self {
            epoch: data.epoch,
            duration_secs: data.duration_secs,
            reference_phase: 0.0,
            centre_frequencies_mhz: data.centre_frequencies_mhz,
            npol: data.npol,
            profiles: data.profiles,
        };
        sub.set_reference_phase(data.reference_phase);
        Ok(sub)
    }
}

impl Subintegration {
    /// Create a zeroed subintegration of the given shape.
    pub fn new(epoch: Epoch, duration_secs: f64, npol: usize, nchan: usize, nbin: usize) -> ArchiveResult<Self> {
        if npol == 0 {
            return Err(ArchiveError::invalid_dimension("npol", 0));
        }
        if nchan == 0 {
            return Err(ArchiveError::invalid_dimension("nchan", 0));
        }
        let template = Profile::new(nbin)?;
        Ok(Self {
            epoch,
            duration_secs,
            reference_phase: 0.0,
            centre_frequencies_mhz: vec![0.0; nchan],
            npol,
            profiles: vec![template; npol * nchan],
        })
    }

    /// Temporal centre of this subintegration.
    #[inline]
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Set the temporal centre.
    pub fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch;
    }

    /// Duration in seconds.
    #[inline]
    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }

    /// Set the duration in seconds.
    pub fn set_duration_secs(&mut self, duration_secs: f64) {
        self.duration_secs = duration_secs;
    }

    /// Fractional pulse phase (rotations) the profiles are referenced to.
    #[inline]
    pub fn reference_phase(&self) -> f64 {
        self.reference_phase
    }

    /// Set the reference phase, folded into `[0, 1)`.
    pub fn set_reference_phase(&mut self, phase: f64) {
        self.reference_phase = phase.rem_euclid(1.0);
    }

    /// Number of polarizations.
    #[inline]
    pub fn npol(&self) -> usize {
        self.npol
    }

    /// Number of frequency channels.
    #[inline]
    pub fn nchan(&self) -> usize {
        self.centre_frequencies_mhz.len()
    }

    /// Number of phase bins (constant across all profiles).
    #[inline]
    pub fn nbin(&self) -> usize {
        self.profiles[0].nbin()
    }

    /// Channel centre frequencies in MHz, indexed by channel.
    #[inline]
    pub fn centre_frequencies_mhz(&self) -> &[f64] {
        &self.centre_frequencies_mhz
    }

    /// Centre frequency of one channel.
    pub fn centre_frequency_mhz(&self, ichan: usize) -> ArchiveResult<f64> {
        self.centre_frequencies_mhz
            .get(ichan)
            .copied()
            .ok_or_else(|| ArchiveError::index_out_of_range("chan", ichan, self.nchan()))
    }

    /// Set the centre frequency of one channel.
    pub fn set_centre_frequency_mhz(&mut self, ichan: usize, freq_mhz: f64) -> ArchiveResult<()> {
        let nchan = self.nchan();
        match self.centre_frequencies_mhz.get_mut(ichan) {
            Some(f) => {
                *f = freq_mhz;
                Ok(())
            }
            None => Err(ArchiveError::index_out_of_range("chan", ichan, nchan)),
        }
    }

    /// Borrow the profile at `(ipol, ichan)`.
    pub fn profile(&self, ipol: usize, ichan: usize) -> ArchiveResult<&Profile> {
        let idx = self.flat_index(ipol, ichan)?;
        Ok(&self.profiles[idx])
    }

    /// Mutably borrow the profile at `(ipol, ichan)`.
    pub fn profile_mut(&mut self, ipol: usize, ichan: usize) -> ArchiveResult<&mut Profile> {
        let idx = self.flat_index(ipol, ichan)?;
        Ok(&mut self.profiles[idx])
    }

    /// Iterate over all profiles mutably (every polarization and channel).
    pub fn profiles_mut(&mut self) -> impl Iterator<Item = &mut Profile> {
        self.profiles.iter_mut()
    }

    /// Insert a channel at `position` (shifting later channels up) with the
    /// given centre frequency and one profile per polarization.
    ///
    /// `profiles` must hold exactly `npol` entries, each with this
    /// subintegration's nbin.
    pub fn insert_channel(
        &mut self,
        position: usize,
        freq_mhz: f64,
        profiles: Vec<Profile>,
    ) -> ArchiveResult<()> {
        if position > self.nchan() {
            return Err(ArchiveError::index_out_of_range("chan", position, self.nchan() + 1));
        }
        if profiles.len() != self.npol {
            return Err(ArchiveError::dimension_mismatch(format!(
                "inserted channel carries {} polarizations, subintegration has {}",
                profiles.len(),
                self.npol
            )));
        }
        let nbin = self.nbin();
        for p in &profiles {
            if p.nbin() != nbin {
                return Err(ArchiveError::LengthMismatch {
                    expected: nbin,
                    actual: p.nbin(),
                });
            }
        }

        let old_nchan = self.nchan();
        self.centre_frequencies_mhz.insert(position, freq_mhz);
        // Insert back-to-front: rows below ipol are still in the old layout
        // when row ipol is spliced, so each row starts at ipol * old_nchan.
        for (ipol, profile) in profiles.into_iter().enumerate().rev() {
            let idx = ipol * old_nchan + position;
            self.profiles.insert(idx, profile);
        }
        Ok(())
    }

    fn flat_index(&self, ipol: usize, ichan: usize) -> ArchiveResult<usize> {
        if ipol >= self.npol {
            return Err(ArchiveError::index_out_of_range("pol", ipol, self.npol));
        }
        let nchan = self.nchan();
        if ichan >= nchan {
            return Err(ArchiveError::index_out_of_range("chan", ichan, nchan));
        }
        Ok(ipol * nchan + ichan)
    }
}
