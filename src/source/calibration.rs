//! Per-detector spectrum energy calibration.

use serde::{Deserialize, Serialize};

/// Linear channel-to-energy calibration for one detector.
///
/// Channel `c` maps to `eV_start + c * eV_per_channel` electron-volts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyCalibration {
    pub detector: String,
    pub ev_start: f64,
    pub ev_per_channel: f64,
}

impl EnergyCalibration {
    pub fn new(detector: impl Into<String>, ev_start: f64, ev_per_channel: f64) -> Self {
        Self {
            detector: detector.into(),
            ev_start,
            ev_per_channel,
        }
    }

    /// Converts a (possibly fractional) channel index to keV.
    pub fn channel_to_kev(&self, channel: f64) -> f64 {
        (self.ev_start + channel * self.ev_per_channel) / 1000.0
    }
}
