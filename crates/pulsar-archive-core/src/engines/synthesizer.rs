//! Synthesis of fully populated archives for testing and simulation.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ArchiveResult;
use crate::io::ParameterSet;
use crate::timing::SharedModel;
use crate::types::{Archive, ArchiveFormat, Dimensions, Epoch};

/// Parameters for synthesizing one archive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Format tag for the produced archive.
    pub format: ArchiveFormat,
    /// Number of subintegrations.
    pub nsub: usize,
    /// Number of polarizations.
    pub npol: usize,
    /// Number of frequency channels.
    pub nchan: usize,
    /// Number of phase bins.
    pub nbin: usize,
    /// Leading edge of the first subintegration.
    pub start: Epoch,
    /// Duration of each subintegration in seconds.
    pub subint_duration_secs: f64,
    /// Nominal centre frequency in MHz.
    pub centre_frequency_mhz: f64,
    /// Total bandwidth in MHz.
    pub bandwidth_mhz: f64,
    /// Seed for the amplitude generator's RNG.
    pub seed: u64,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            format: ArchiveFormat::default(),
            nsub: 1,
            npol: 1,
            nchan: 4,
            nbin: 8,
            start: Epoch::new(55000, 0.0),
            subint_duration_secs: 10.0,
            centre_frequency_mhz: 1400.0,
            bandwidth_mhz: 256.0,
            seed: 42,
        }
    }
}

impl SynthesisConfig {
    /// The `(nsub, npol, nchan, nbin)` shape this config describes.
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            nsub: self.nsub,
            npol: self.npol,
            nchan: self.nchan,
            nbin: self.nbin,
        }
    }
}

/// Fills profile amplitudes during synthesis.
pub trait AmplitudeGenerator {
    /// Produce `nbin` amplitude samples for the profile at
    /// `(isub, ipol, ichan)`.
    fn generate(
        &mut self,
        isub: usize,
        ipol: usize,
        ichan: usize,
        nbin: usize,
        rng: &mut ChaCha8Rng,
    ) -> Vec<f64>;
}

/// Default generator: independent samples from a standard normal
/// distribution (Box-Muller transform over the shared RNG).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoiseGenerator;

impl AmplitudeGenerator for NoiseGenerator {
    fn generate(
        &mut self,
        _isub: usize,
        _ipol: usize,
        _ichan: usize,
        nbin: usize,
        rng: &mut ChaCha8Rng,
    ) -> Vec<f64> {
        (0..nbin)
            .map(|_| {
                let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
                let u2: f64 = rng.gen_range(0.0..1.0);
                (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
            })
            .collect()
    }
}

/// Produces self-consistent synthetic archives: valid inputs for the append
/// and alignment engines and for standalone testing.
///
/// Performs no frequency or time alignment itself.
#[derive(Debug, Default)]
pub struct ArchiveSynthesizer;

impl ArchiveSynthesizer {
    /// Create a synthesizer.
    pub fn new() -> Self {
        Self
    }

    /// Synthesize an archive filled by the default noise generator.
    pub fn synthesize(&self, config: &SynthesisConfig, model: SharedModel) -> ArchiveResult<Archive> {
        self.synthesize_with(config, model, &mut NoiseGenerator)
    }

    /// Synthesize an archive filled by a caller-supplied generator.
    ///
    /// Channel `i` is centred at `fc - bw/2 + (i + 0.5) * bw / nchan`, so
    /// the grid evenly covers `[fc - bw/2, fc + bw/2)` in ascending order.
    /// Subintegration `k` is centred at `start + (k + 0.5) * duration`.
    /// Each subintegration's reference phase is seeded from the model, so a
    /// freshly synthesized archive is already aligned to it.
    pub fn synthesize_with(
        &self,
        config: &SynthesisConfig,
        model: SharedModel,
        generator: &mut dyn AmplitudeGenerator,
    ) -> ArchiveResult<Archive> {
        config.dimensions().validate()?;

        let mut archive = Archive::new(
            config.format,
            config.nsub,
            config.npol,
            config.nchan,
            config.nbin,
        )?;
        archive.set_centre_frequency_mhz(config.centre_frequency_mhz);
        archive.set_bandwidth_mhz(config.bandwidth_mhz);

        let band_edge = config.centre_frequency_mhz - config.bandwidth_mhz / 2.0;
        let channel_width = config.bandwidth_mhz / config.nchan as f64;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        for isub in 0..config.nsub {
            let epoch = config
                .start
                .add_secs((isub as f64 + 0.5) * config.subint_duration_secs);
            let reference_phase = model.phase_at(&epoch).rem_euclid(1.0);

            let sub = archive.subint_mut(isub)?;
            sub.set_epoch(epoch);
            sub.set_duration_secs(config.subint_duration_secs);
            sub.set_reference_phase(reference_phase);

            for ichan in 0..config.nchan {
                sub.set_centre_frequency_mhz(
                    ichan,
                    band_edge + (ichan as f64 + 0.5) * channel_width,
                )?;
            }

            for ipol in 0..config.npol {
                for ichan in 0..config.nchan {
                    let amps = generator.generate(isub, ipol, ichan, config.nbin, &mut rng);
                    archive
                        .subint_mut(isub)?
                        .profile_mut(ipol, ichan)?
                        .set_amps(amps)?;
                }
            }
        }

        archive.set_model(model);

        info!(dims = ?archive.dimensions(), "archive synthesized");
        Ok(archive)
    }

    /// Apply metadata fields from an external parameter source.
    pub fn apply_parameters(&self, archive: &mut Archive, params: &ParameterSet) {
        if let Some(name) = params.source_name() {
            archive.set_source_name(name);
        }
        if let Some(dm) = params.dispersion_measure() {
            archive.set_dispersion_measure(dm);
        }
        if let Some(coords) = params.sky_coordinates() {
            archive.set_sky_coordinates(coords);
        }
        if let Some(telescope) = params.telescope() {
            archive.set_telescope_id(telescope);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArchiveError;
    use crate::timing::PolynomialModel;
    use std::sync::Arc;

    fn model() -> SharedModel {
        Arc::new(PolynomialModel::new(Epoch::new(55000, 0.0), 0.0, 2.0, 0.0, 0.0).unwrap())
    }

    #[test]
    fn test_rejects_zero_dimension() {
        let cfg = SynthesisConfig {
            nchan: 0,
            ..SynthesisConfig::default()
        };
        assert!(matches!(
            ArchiveSynthesizer::new().synthesize(&cfg, model()),
            Err(ArchiveError::InvalidDimension { name: "nchan", .. })
        ));
    }

    #[test]
    fn test_channel_frequencies_strictly_increasing_and_cover_band() {
        let cfg = SynthesisConfig {
            nchan: 8,
            centre_frequency_mhz: 1100.0,
            bandwidth_mhz: 200.0,
            ..SynthesisConfig::default()
        };
        let a = ArchiveSynthesizer::new().synthesize(&cfg, model()).unwrap();
        let freqs = a.subint(0).unwrap().centre_frequencies_mhz().to_vec();
        assert!(freqs.windows(2).all(|w| w[0] < w[1]));
        assert!((freqs[0] - 1012.5).abs() < 1e-9);
        assert!((freqs[7] - 1187.5).abs() < 1e-9);
    }

    #[test]
    fn test_epochs_strictly_increasing_and_midpoint_centred() {
        let cfg = SynthesisConfig {
            nsub: 5,
            subint_duration_secs: 8.0,
            ..SynthesisConfig::default()
        };
        let a = ArchiveSynthesizer::new().synthesize(&cfg, model()).unwrap();
        let epochs: Vec<Epoch> = a.subints().map(|s| s.epoch()).collect();
        for w in epochs.windows(2) {
            assert!((w[1].diff_secs(&w[0]) - 8.0).abs() < 1e-9);
        }
        assert!((epochs[0].diff_secs(&cfg.start) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_full_shape_is_populated() {
        let cfg = SynthesisConfig {
            nsub: 10,
            npol: 4,
            nchan: 128,
            nbin: 512,
            ..SynthesisConfig::default()
        };
        let a = ArchiveSynthesizer::new().synthesize(&cfg, model()).unwrap();
        assert_eq!(a.dimensions(), cfg.dimensions());
        for isub in [0, 9] {
            for ipol in [0, 3] {
                for ichan in [0, 127] {
                    assert_eq!(a.profile(isub, ipol, ichan).unwrap().nbin(), 512);
                }
            }
        }
    }

    #[test]
    fn test_noise_is_seeded_and_reproducible() {
        let cfg = SynthesisConfig::default();
        let a = ArchiveSynthesizer::new().synthesize(&cfg, model()).unwrap();
        let b = ArchiveSynthesizer::new().synthesize(&cfg, model()).unwrap();
        assert_eq!(
            a.profile(0, 0, 0).unwrap().amps(),
            b.profile(0, 0, 0).unwrap().amps()
        );

        let other = SynthesisConfig {
            seed: 43,
            ..SynthesisConfig::default()
        };
        let c = ArchiveSynthesizer::new().synthesize(&other, model()).unwrap();
        assert_ne!(
            a.profile(0, 0, 0).unwrap().amps(),
            c.profile(0, 0, 0).unwrap().amps()
        );
    }

    #[test]
    fn test_reference_phase_seeded_from_model() {
        let m = model();
        let cfg = SynthesisConfig {
            nsub: 3,
            ..SynthesisConfig::default()
        };
        let a = ArchiveSynthesizer::new().synthesize(&cfg, m.clone()).unwrap();
        for sub in a.subints() {
            let expected = m.phase_at(&sub.epoch()).rem_euclid(1.0);
            assert!((sub.reference_phase() - expected).abs() < 1e-12);
        }
        assert!(a.model().unwrap().matches(m.as_ref()));
    }

    #[test]
    fn test_custom_generator_is_used() {
        struct Ramp;
        impl AmplitudeGenerator for Ramp {
            fn generate(
                &mut self,
                _isub: usize,
                _ipol: usize,
                _ichan: usize,
                nbin: usize,
                _rng: &mut ChaCha8Rng,
            ) -> Vec<f64> {
                (0..nbin).map(|i| i as f64).collect()
            }
        }

        let cfg = SynthesisConfig::default();
        let a = ArchiveSynthesizer::new()
            .synthesize_with(&cfg, model(), &mut Ramp)
            .unwrap();
        assert_eq!(a.profile(0, 0, 0).unwrap().amps()[3], 3.0);
    }

    #[test]
    fn test_apply_parameters() {
        let mut params = ParameterSet::new();
        params.set("source_name", "J1939+2134");
        params.set("dm", "71.0398");
        params.set("telescope", "PKS");

        let cfg = SynthesisConfig::default();
        let synth = ArchiveSynthesizer::new();
        let mut a = synth.synthesize(&cfg, model()).unwrap();
        synth.apply_parameters(&mut a, &params);

        assert_eq!(a.source_name(), "J1939+2134");
        assert!((a.dispersion_measure() - 71.0398).abs() < 1e-9);
        assert_eq!(a.telescope_id(), "PKS");
    }
}
