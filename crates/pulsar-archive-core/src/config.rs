//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, ArchiveResult};

/// How the time-alignment engine evaluates phase corrections in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContemporaneityPolicy {
    /// One correction per subintegration, evaluated at its epoch (DEFAULT).
    #[default]
    PerSubintegration,
    /// Correction evaluated at finer sub-segments within each
    /// subintegration; required for single-pulse / high-time-resolution
    /// data where one subintegration spans many rotations.
    PerPhase,
}

/// Configuration shared by the append and alignment engines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Skip the pulse-phase contemporaneity check during append. Intended
    /// for data already phase-aligned externally.
    #[serde(default)]
    pub ignore_phase: bool,

    /// Time-granularity policy for phase alignment.
    #[serde(default)]
    pub contemporaneity_policy: ContemporaneityPolicy,

    /// Two channels closer than this are treated as duplicates during
    /// append (MHz).
    #[serde(default = "default_frequency_tolerance_mhz")]
    pub frequency_tolerance_mhz: f64,

    /// Maximum epoch disagreement between corresponding subintegrations
    /// (seconds). Also sets the sub-segment length for the per-phase policy.
    #[serde(default = "default_time_tolerance_secs")]
    pub time_tolerance_secs: f64,
}

fn default_frequency_tolerance_mhz() -> f64 {
    0.010 // 10 kHz
}

fn default_time_tolerance_secs() -> f64 {
    30.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ignore_phase: false,
            contemporaneity_policy: ContemporaneityPolicy::default(),
            frequency_tolerance_mhz: default_frequency_tolerance_mhz(),
            time_tolerance_secs: default_time_tolerance_secs(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from files and environment.
    ///
    /// Sources, in order:
    /// 1. `config/default.toml` (base settings)
    /// 2. `config/{PULSAR_ARCHIVE_ENV}.toml` (environment-specific)
    /// 3. Environment variables with `PULSAR_ARCHIVE_` prefix
    pub fn load() -> ArchiveResult<Self> {
        let env = std::env::var("PULSAR_ARCHIVE_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("PULSAR_ARCHIVE").separator("__"));

        let cfg: EngineConfig = builder.build()?.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate tolerance values.
    pub fn validate(&self) -> ArchiveResult<()> {
        if !self.frequency_tolerance_mhz.is_finite() || self.frequency_tolerance_mhz <= 0.0 {
            return Err(ArchiveError::ConfigError(format!(
                "frequency_tolerance_mhz must be positive and finite, got {}",
                self.frequency_tolerance_mhz
            )));
        }
        if !self.time_tolerance_secs.is_finite() || self.time_tolerance_secs <= 0.0 {
            return Err(ArchiveError::ConfigError(format!(
                "time_tolerance_secs must be positive and finite, got {}",
                self.time_tolerance_secs
            )));
        }
        Ok(())
    }
}
