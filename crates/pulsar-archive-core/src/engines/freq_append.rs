//! Frequency-direction archive merging.

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::error::{ArchiveError, ArchiveResult};
use crate::types::{Archive, Dimensions};

/// Merges a secondary archive's frequency channels into a primary archive.
///
/// The primary is mutated in place into the sorted union of both channel
/// sets; the secondary is a read-only input. Channels of the secondary that
/// fall within `frequency_tolerance_mhz` of an existing primary channel are
/// dropped (the primary wins ties). `init` must record the merge target
/// before the first `append`.
///
/// All preconditions are validated and the full insertion plan is computed
/// before the primary is touched, so a failed call leaves it unchanged.
#[derive(Debug)]
pub struct FrequencyAppendEngine {
    config: EngineConfig,
    target: Option<Dimensions>,
}

impl FrequencyAppendEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: EngineConfig) -> ArchiveResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            target: None,
        })
    }

    /// Record the primary's current dimensions as the merge target.
    pub fn init(&mut self, primary: &Archive) {
        debug!(dims = ?primary.dimensions(), "frequency append target recorded");
        self.target = Some(primary.dimensions());
    }

    /// Merge the secondary's channels into the primary.
    ///
    /// On success the primary's `nchan` grows by the number of
    /// non-duplicate secondary channels and its bandwidth and centre
    /// frequency are recomputed from the merged frequency extent. Profile
    /// indices held by the caller are invalidated.
    pub fn append(&mut self, primary: &mut Archive, secondary: &Archive) -> ArchiveResult<()> {
        let target = self.target.ok_or(ArchiveError::NotInitialized)?;

        self.validate(&target, primary, secondary)?;

        // Keep/drop plan decided once against the first subintegration, so
        // every subintegration gains the same channel count.
        let kept = self.plan_kept_channels(primary, secondary)?;
        debug!(
            secondary_nchan = secondary.nchan(),
            kept = kept.len(),
            dropped = secondary.nchan() - kept.len(),
            "channel merge plan"
        );

        let old_nchan = primary.nchan();
        let npol = primary.npol();

        for isub in 0..primary.nsub() {
            let sec_sub = secondary.subint(isub)?;
            for &jchan in &kept {
                let freq = sec_sub.centre_frequency_mhz(jchan)?;
                let mut profiles = Vec::with_capacity(npol);
                for ipol in 0..npol {
                    profiles.push(sec_sub.profile(ipol, jchan)?.clone());
                }

                let sub = primary.subint_mut(isub)?;
                let position = sub
                    .centre_frequencies_mhz()
                    .iter()
                    .position(|&f| f > freq)
                    .unwrap_or(sub.nchan());
                sub.insert_channel(position, freq, profiles)?;
            }
        }

        self.recompute_extent(primary, old_nchan)?;
        self.target = Some(primary.dimensions());

        info!(
            added = kept.len(),
            nchan = primary.nchan(),
            bandwidth_mhz = primary.bandwidth_mhz(),
            centre_frequency_mhz = primary.centre_frequency_mhz(),
            "frequency append complete"
        );
        Ok(())
    }

    fn validate(
        &self,
        target: &Dimensions,
        primary: &Archive,
        secondary: &Archive,
    ) -> ArchiveResult<()> {
        let dims = primary.dimensions();
        if dims.nsub != target.nsub || dims.npol != target.npol || dims.nbin != target.nbin {
            return Err(ArchiveError::dimension_mismatch(format!(
                "primary no longer matches the recorded merge target: {dims:?} vs {target:?}"
            )));
        }

        if primary.nsub() != secondary.nsub() {
            return Err(ArchiveError::SubintCountMismatch {
                primary: primary.nsub(),
                secondary: secondary.nsub(),
            });
        }
        if primary.npol() != secondary.npol() {
            return Err(ArchiveError::PolarizationMismatch {
                primary: primary.npol(),
                secondary: secondary.npol(),
            });
        }
        primary.mixable(secondary)?;

        if !self.config.ignore_phase {
            for isub in 0..primary.nsub() {
                let offset = primary
                    .subint(isub)?
                    .epoch()
                    .diff_secs(&secondary.subint(isub)?.epoch())
                    .abs();
                if offset >= self.config.time_tolerance_secs {
                    return Err(ArchiveError::ContemporaneityMismatch {
                        isub,
                        offset_secs: offset,
                        tolerance_secs: self.config.time_tolerance_secs,
                    });
                }
            }
        }
        Ok(())
    }

    /// Secondary channel indices that survive duplicate filtering, in
    /// ascending frequency order.
    fn plan_kept_channels(
        &self,
        primary: &Archive,
        secondary: &Archive,
    ) -> ArchiveResult<Vec<usize>> {
        let prim_freqs = primary.subint(0)?.centre_frequencies_mhz();
        let sec_freqs = secondary.subint(0)?.centre_frequencies_mhz();

        let mut kept: Vec<usize> = (0..sec_freqs.len())
            .filter(|&j| {
                !prim_freqs
                    .iter()
                    .any(|&f| (f - sec_freqs[j]).abs() < self.config.frequency_tolerance_mhz)
            })
            .collect();
        kept.sort_by(|&a, &b| {
            sec_freqs[a]
                .partial_cmp(&sec_freqs[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(kept)
    }

    /// Recompute bandwidth and centre frequency from the merged extent:
    /// `bandwidth = max - min + channel_width`, `centre = (max + min) / 2`,
    /// where the channel width is the mean grid spacing.
    fn recompute_extent(&self, primary: &mut Archive, old_nchan: usize) -> ArchiveResult<()> {
        let old_bandwidth = primary.bandwidth_mhz();
        let freqs = primary.subint(0)?.centre_frequencies_mhz();
        let nchan = freqs.len();
        let min = freqs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = freqs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        let channel_width = if nchan > 1 {
            (max - min) / (nchan - 1) as f64
        } else if old_nchan > 0 {
            old_bandwidth.abs() / old_nchan as f64
        } else {
            0.0
        };

        primary.set_bandwidth_mhz(max - min + channel_width);
        primary.set_centre_frequency_mhz((max + min) / 2.0);
        Ok(())
    }
}
