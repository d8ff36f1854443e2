//! Sky coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Equatorial sky coordinates in degrees (J2000).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SkyCoordinates {
    /// Right ascension in degrees, [0, 360)
    pub ra_deg: f64,
    /// Declination in degrees, [-90, 90]
    pub dec_deg: f64,
}

impl SkyCoordinates {
    /// Create coordinates, wrapping RA into [0, 360) and clamping Dec.
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self {
            ra_deg: ra_deg.rem_euclid(360.0),
            dec_deg: dec_deg.clamp(-90.0, 90.0),
        }
    }
}

impl fmt::Display for SkyCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RA {:.6} Dec {:+.6}", self.ra_deg, self.dec_deg)
    }
}
