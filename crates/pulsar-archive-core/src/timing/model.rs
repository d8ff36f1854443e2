//! Timing model trait and the polynomial spin-down implementation.

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::error::{ArchiveError, ArchiveResult};
use crate::io::ParameterSet;
use crate::types::Epoch;

/// A rotational ephemeris predicting spin phase at an absolute time.
///
/// Phase is measured in rotations; the fractional part is the pulse phase.
/// Models are immutable once built and carry a unique identity so that two
/// archives can be checked for sharing the same model.
pub trait TimingModel: Send + Sync {
    /// Unique identity of this model instance.
    fn id(&self) -> Uuid;

    /// Spin phase in rotations at the given epoch.
    fn phase_at(&self, epoch: &Epoch) -> f64;

    /// Spin frequency in Hz at the given epoch.
    fn frequency_at(&self, epoch: &Epoch) -> f64;

    /// True if `other` is the same model instance.
    fn matches(&self, other: &dyn TimingModel) -> bool {
        self.id() == other.id()
    }
}

/// A timing model shared between archives.
pub type SharedModel = Arc<dyn TimingModel>;

/// Taylor-expansion spin-down model about a reference epoch.
///
/// ```text
/// phase(t) = phi0 + f0*dt + f1*dt^2/2 + f2*dt^3/6,   dt = t - ref_epoch  [s]
/// ```
///
/// An optional validity span may be attached; predictions outside it are
/// still computed (the model extrapolates) but logged at `warn`.
pub struct PolynomialModel {
    id: Uuid,
    ref_epoch: Epoch,
    ref_phase: f64,
    f0_hz: f64,
    f1: f64,
    f2: f64,
    valid_span_secs: Option<f64>,
}

impl PolynomialModel {
    /// Create a model from reference epoch/phase and spin frequency terms.
    ///
    /// `f0_hz` must be positive and finite.
    pub fn new(ref_epoch: Epoch, ref_phase: f64, f0_hz: f64, f1: f64, f2: f64) -> ArchiveResult<Self> {
        if !f0_hz.is_finite() || f0_hz <= 0.0 {
            return Err(ArchiveError::ConfigError(format!(
                "spin frequency must be positive and finite, got {f0_hz}"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            ref_epoch,
            ref_phase,
            f0_hz,
            f1,
            f2,
            valid_span_secs: None,
        })
    }

    /// Restrict the nominal validity to `span_secs` either side of the
    /// reference epoch.
    pub fn with_valid_span(mut self, span_secs: f64) -> Self {
        self.valid_span_secs = Some(span_secs.abs());
        self
    }

    /// Build a model from a parameter set (`f0`, optional `f1`,
    /// `ref_epoch_mjd`, optional `ref_phase`).
    pub fn from_parameters(params: &ParameterSet) -> ArchiveResult<Self> {
        let f0 = params
            .get_f64("f0")
            .ok_or_else(|| ArchiveError::ConfigError("parameter set missing f0".into()))?;
        let mjd = params
            .get_f64("ref_epoch_mjd")
            .ok_or_else(|| ArchiveError::ConfigError("parameter set missing ref_epoch_mjd".into()))?;
        let f1 = params.get_f64("f1").unwrap_or(0.0);
        let phase = params.get_f64("ref_phase").unwrap_or(0.0);
        Self::new(Epoch::from_mjd(mjd), phase, f0, f1, 0.0)
    }

    /// Reference epoch of the expansion.
    pub fn ref_epoch(&self) -> Epoch {
        self.ref_epoch
    }

    /// Spin period in seconds at the reference epoch.
    pub fn period_secs(&self) -> f64 {
        1.0 / self.f0_hz
    }
}

impl TimingModel for PolynomialModel {
    fn id(&self) -> Uuid {
        self.id
    }

    fn phase_at(&self, epoch: &Epoch) -> f64 {
        let dt = epoch.diff_secs(&self.ref_epoch);
        if let Some(span) = self.valid_span_secs {
            if dt.abs() > span {
                warn!(
                    dt_secs = dt,
                    span_secs = span,
                    "timing model evaluated outside its validity span"
                );
            }
        }
        self.ref_phase + dt * (self.f0_hz + dt * (self.f1 / 2.0 + dt * self.f2 / 6.0))
    }

    fn frequency_at(&self, epoch: &Epoch) -> f64 {
        let dt = epoch.diff_secs(&self.ref_epoch);
        self.f0_hz + dt * (self.f1 + dt * self.f2 / 2.0)
    }
}

impl std::fmt::Debug for PolynomialModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolynomialModel")
            .field("id", &self.id)
            .field("ref_epoch", &self.ref_epoch)
            .field("f0_hz", &self.f0_hz)
            .field("f1", &self.f1)
            .finish()
    }
}
