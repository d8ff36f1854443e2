//! End-to-end combination pipeline: synthesize, align, append, unload.

use std::path::Path;
use std::sync::Arc;

use pulsar_archive_core::config::EngineConfig;
use pulsar_archive_core::engines::{ArchiveSynthesizer, SynthesisConfig};
use pulsar_archive_core::io::{ArchiveUnloader, UnloadError};
use pulsar_archive_core::timing::{PolynomialModel, SharedModel};
use pulsar_archive_core::types::{Archive, Epoch};
use pulsar_archive_core::{ArchiveError, FrequencyAppendEngine, TimeAlignmentEngine};

fn model(f0: f64) -> SharedModel {
    Arc::new(PolynomialModel::new(Epoch::new(55000, 0.0), 0.0, f0, -1e-10, 0.0).unwrap())
}

fn band(fc: f64) -> SynthesisConfig {
    SynthesisConfig {
        nsub: 4,
        npol: 2,
        nchan: 8,
        nbin: 64,
        centre_frequency_mhz: fc,
        bandwidth_mhz: 100.0,
        subint_duration_secs: 20.0,
        ..SynthesisConfig::default()
    }
}

struct CountingUnloader {
    fail: bool,
}

impl ArchiveUnloader for CountingUnloader {
    fn unload(&self, _archive: &Archive, path: &Path) -> Result<(), UnloadError> {
        if self.fail {
            return Err(UnloadError::new(format!(
                "cannot write {}",
                path.display()
            )));
        }
        Ok(())
    }
}

#[test]
fn test_align_then_append_produces_wideband_archive() {
    let shared = model(641.93);
    let synth = ArchiveSynthesizer::new();

    let mut primary = synth.synthesize(&band(1050.0), shared.clone()).unwrap();
    // Secondary folded against a slightly different ephemeris.
    let mut secondary = synth.synthesize(&band(1150.0), model(641.93)).unwrap();
    for sub in secondary.subints_mut() {
        let p = sub.reference_phase();
        sub.set_reference_phase(p + 0.18);
    }

    let aligner = TimeAlignmentEngine::new(EngineConfig::default()).unwrap();
    aligner.adopt_model(&primary, &mut secondary).unwrap();
    aligner.align(&primary, &mut secondary).unwrap();

    // After alignment every subintegration agrees with the shared model to
    // within a phase bin.
    let nbin = secondary.nbin() as f64;
    for sub in secondary.subints() {
        let predicted = shared.phase_at(&sub.epoch()).rem_euclid(1.0);
        let mut err = (predicted - sub.reference_phase()).abs();
        if err > 0.5 {
            err = 1.0 - err;
        }
        assert!(err < 1.0 / nbin);
    }

    let mut appender = FrequencyAppendEngine::new(EngineConfig::default()).unwrap();
    appender.init(&primary);
    appender.append(&mut primary, &secondary).unwrap();

    assert_eq!(primary.nchan(), 16);
    assert_eq!(primary.nsub(), 4);
    assert_eq!(primary.npol(), 2);
    let freqs = primary.subint(0).unwrap().centre_frequencies_mhz().to_vec();
    assert!(freqs.windows(2).all(|w| w[0] < w[1]));
    assert!((primary.bandwidth_mhz() - 200.0).abs() < 1e-6);
    assert!((primary.centre_frequency_mhz() - 1100.0).abs() < 1e-6);

    // Every profile in the combined archive still has the full bin count.
    for isub in 0..4 {
        for ipol in 0..2 {
            for ichan in 0..16 {
                assert_eq!(primary.profile(isub, ipol, ichan).unwrap().nbin(), 64);
            }
        }
    }

    let unloader = CountingUnloader { fail: false };
    unloader
        .unload(&primary, Path::new("/tmp/combined.ar"))
        .unwrap();
}

#[test]
fn test_unloader_failure_is_surfaced_unchanged() {
    let synth = ArchiveSynthesizer::new();
    let archive = synth
        .synthesize(&SynthesisConfig::default(), model(1.0))
        .unwrap();
    let unloader = CountingUnloader { fail: true };
    let err = unloader
        .unload(&archive, Path::new("/nonexistent/out.ar"))
        .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/out.ar"));
}

#[test]
fn test_failed_append_never_partially_merges() {
    let synth = ArchiveSynthesizer::new();
    let mut primary = synth.synthesize(&band(1050.0), model(1.0)).unwrap();

    // Secondary whose later subintegration epochs drift out of tolerance.
    let mut secondary = synth.synthesize(&band(1150.0), model(1.0)).unwrap();
    let late = secondary.subint(3).unwrap().epoch().add_secs(600.0);
    secondary.subint_mut(3).unwrap().set_epoch(late);

    let before_freqs = primary.subint(0).unwrap().centre_frequencies_mhz().to_vec();
    let before_bw = primary.bandwidth_mhz();

    let mut appender = FrequencyAppendEngine::new(EngineConfig::default()).unwrap();
    appender.init(&primary);
    let err = appender.append(&mut primary, &secondary).unwrap_err();
    assert!(matches!(
        err,
        ArchiveError::ContemporaneityMismatch { isub: 3, .. }
    ));

    // Even though subints 0..2 were contemporaneous, nothing was merged.
    assert_eq!(primary.nchan(), 8);
    assert_eq!(
        primary.subint(0).unwrap().centre_frequencies_mhz(),
        before_freqs.as_slice()
    );
    assert!((primary.bandwidth_mhz() - before_bw).abs() < 1e-12);
}

#[test]
fn test_append_after_external_alignment_with_ignore_phase() {
    let synth = ArchiveSynthesizer::new();
    let mut primary = synth.synthesize(&band(1050.0), model(1.0)).unwrap();

    let mut shifted = band(1150.0);
    shifted.start = Epoch::new(55000, 3600.0);
    let secondary = synth.synthesize(&shifted, model(1.0)).unwrap();

    let mut strict = FrequencyAppendEngine::new(EngineConfig::default()).unwrap();
    strict.init(&primary);
    assert!(matches!(
        strict.append(&mut primary, &secondary),
        Err(ArchiveError::ContemporaneityMismatch { .. })
    ));

    let cfg = EngineConfig {
        ignore_phase: true,
        ..EngineConfig::default()
    };
    let mut lenient = FrequencyAppendEngine::new(cfg).unwrap();
    lenient.init(&primary);
    lenient.append(&mut primary, &secondary).unwrap();
    assert_eq!(primary.nchan(), 16);
}
