//! Pulse profile: amplitude vs. phase for one channel/polarization.

use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, ArchiveResult};

/// A single folded pulse profile.
///
/// Holds a fixed-length sequence of amplitude samples across pulse phase.
/// The length (`nbin`) is set at construction and never changes; assigning a
/// sequence of a different length is rejected with `LengthMismatch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProfileData")]
pub struct Profile {
    amps: Vec<f64>,
    /// Statistical weight; 0.0 marks a padded/empty channel.
    weight: f64,
}

/// Raw mirror deserialized first, so external input cannot bypass the
/// non-empty-amps invariant.
#[derive(Deserialize)]
struct ProfileData {
    amps: Vec<f64>,
    weight: f64,
}

impl TryFrom<ProfileData> for Profile {
    type Error = ArchiveError;

    fn try_from(data: ProfileData) -> Result<Self, Self::Error> {
        let mut p = Profile::from_amps(data.amps)?;
        p.set_weight(data.weight);
        Ok(p)
    }
}

impl Profile {
    /// Create a zeroed profile with `nbin` amplitude bins and unit weight.
    pub fn new(nbin: usize) -> ArchiveResult<Self> {
        if nbin == 0 {
            return Err(ArchiveError::invalid_dimension("nbin", 0));
        }
        Ok(Self {
            amps: vec![0.0; nbin],
            weight: 1.0,
        })
    }

    /// Create a profile from an existing amplitude sequence.
    pub fn from_amps(amps: Vec<f64>) -> ArchiveResult<Self> {
        if amps.is_empty() {
            return Err(ArchiveError::invalid_dimension("nbin", 0));
        }
        Ok(Self { amps, weight: 1.0 })
    }

    /// Number of phase bins.
    #[inline]
    pub fn nbin(&self) -> usize {
        self.amps.len()
    }

    /// Amplitude samples.
    #[inline]
    pub fn amps(&self) -> &[f64] {
        &self.amps
    }

    /// Mutable amplitude samples. The slice length cannot change through
    /// this accessor, so the nbin invariant holds.
    #[inline]
    pub fn amps_mut(&mut self) -> &mut [f64] {
        &mut self.amps
    }

    /// Replace the amplitude sequence. Fails with `LengthMismatch` if the
    /// new sequence has a different length.
    pub fn set_amps(&mut self, amps: Vec<f64>) -> ArchiveResult<()> {
        if amps.len() != self.amps.len() {
            return Err(ArchiveError::LengthMismatch {
                expected: self.amps.len(),
                actual: amps.len(),
            });
        }
        self.amps = amps;
        Ok(())
    }

    /// Statistical weight of this profile.
    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Set the statistical weight (clamped to be non-negative).
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight.max(0.0);
    }

    /// Sum of all amplitude samples.
    pub fn sum(&self) -> f64 {
        self.amps.iter().sum()
    }

    /// Sum of squared amplitude samples (the profile's "energy").
    pub fn sum_sq(&self) -> f64 {
        self.amps.iter().map(|a| a * a).sum()
    }

    /// Circularly rotate the profile by `bins` phase bins.
    ///
    /// Positive `bins` moves power that was at phase bin `i + bins` to bin
    /// `i` (the profile's features shift towards earlier phase). Integer
    /// shifts are exact permutations. Fractional shifts use two-tap linear
    /// interpolation between the bracketing bins:
    ///
    /// ```text
    /// out[i] = (1 - f) * amps[(i + n) % nbin] + f * amps[(i + n + 1) % nbin]
    /// ```
    ///
    /// where `bins = n + f` with integer `n` and `0 <= f < 1`. The energy
    /// change of a fractional shift is bounded by `f * (1 - f)` times the
    /// profile's first-difference energy `sum((a[i] - a[i+1])^2)`.
    pub fn rotate_bins(&mut self, bins: f64) {
        let nbin = self.amps.len();
        if nbin == 1 {
            return;
        }

        let whole = bins.floor();
        let frac = bins - whole;
        // Map the integer part into [0, nbin).
        let shift = (whole.rem_euclid(nbin as f64)) as usize;

        if frac.abs() < f64::EPSILON {
            self.amps.rotate_left(shift);
            return;
        }

        let mut out = Vec::with_capacity(nbin);
        for i in 0..nbin {
            let lo = (i + shift) % nbin;
            let hi = (lo + 1) % nbin;
            out.push((1.0 - frac) * self.amps[lo] + frac * self.amps[hi]);
        }
        self.amps = out;
    }

    /// Circularly rotate by a phase offset in rotations (`phase * nbin` bins).
    pub fn rotate_phase(&mut self, phase: f64) {
        let bins = phase * self.amps.len() as f64;
        self.rotate_bins(bins);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_zero_bins() {
        assert!(matches!(
            Profile::new(0),
            Err(ArchiveError::InvalidDimension { name: "nbin", .. })
        ));
    }

    #[test]
    fn test_set_amps_rejects_length_change() {
        let mut p = Profile::new(8).unwrap();
        let err = p.set_amps(vec![0.0; 7]).unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::LengthMismatch {
                expected: 8,
                actual: 7
            }
        ));
        assert_eq!(p.nbin(), 8);
    }

    #[test]
    fn test_integer_rotation_is_exact_permutation() {
        let mut p = Profile::from_amps(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let energy = p.sum_sq();
        p.rotate_bins(1.0);
        assert_eq!(p.amps(), &[2.0, 3.0, 4.0, 1.0]);
        assert_eq!(p.sum_sq(), energy);
    }

    #[test]
    fn test_negative_rotation_wraps() {
        let mut p = Profile::from_amps(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        p.rotate_bins(-1.0);
        assert_eq!(p.amps(), &[4.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_full_rotation_is_identity() {
        let amps = vec![0.5, -1.5, 2.5, 3.0, 0.0, 1.0];
        let mut p = Profile::from_amps(amps.clone()).unwrap();
        p.rotate_bins(6.0);
        assert_eq!(p.amps(), amps.as_slice());
    }

    #[test]
    fn test_fractional_rotation_interpolates() {
        let mut p = Profile::from_amps(vec![0.0, 1.0, 0.0, 0.0]).unwrap();
        p.rotate_bins(0.5);
        // out[0] = 0.5*a[0] + 0.5*a[1], out[1] = 0.5*a[1] + 0.5*a[2], ...
        assert_eq!(p.amps(), &[0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn test_fractional_rotation_preserves_total_flux() {
        let mut p = Profile::from_amps(vec![1.0, 3.0, -2.0, 5.0, 0.5]).unwrap();
        let total = p.sum();
        p.rotate_bins(2.3);
        assert!((p.sum() - total).abs() < 1e-12);
    }

    #[test]
    fn test_fractional_rotation_energy_bound() {
        let amps: Vec<f64> = (0..64)
            .map(|i| (i as f64 * std::f64::consts::TAU / 64.0).sin())
            .collect();
        let mut p = Profile::from_amps(amps.clone()).unwrap();
        let energy_before = p.sum_sq();

        let frac: f64 = 0.4;
        p.rotate_bins(3.0 + frac);

        let diff_energy: f64 = (0..64)
            .map(|i| {
                let d = amps[i] - amps[(i + 1) % 64];
                d * d
            })
            .sum();
        let bound = frac * (1.0 - frac) * diff_energy;
        assert!((p.sum_sq() - energy_before).abs() <= bound + 1e-12);
    }

    #[test]
    fn test_deserialize_rejects_empty_amps() {
        let err = serde_json::from_str::<Profile>(r#"{"amps": [], "weight": 1.0}"#).unwrap_err();
        assert!(err.to_string().contains("nbin"));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut p = Profile::from_amps(vec![1.0, -2.0, 3.5]).unwrap();
        p.set_weight(0.5);
        let json = serde_json::to_string(&p).unwrap();
        let back: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_rotate_phase_scales_by_nbin() {
        let mut a = Profile::from_amps(vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut b = a.clone();
        a.rotate_phase(0.25);
        b.rotate_bins(1.0);
        assert_eq!(a.amps(), b.amps());
    }
}
