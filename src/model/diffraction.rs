//! Classified spectral anomaly value objects.
//!
//! The classifier in [`crate::source::classifier`] turns raw per-location
//! candidate peaks into these immutable objects, which the builtin functions
//! consume read-only.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Status a detected anomaly can carry, either assigned by the classifier or
/// forced through the manual override table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
pub enum PeakStatus {
    #[strum(serialize = "diffraction-peak")]
    #[serde(rename = "diffraction-peak")]
    DiffractionPeak,
    #[strum(serialize = "roughness")]
    #[serde(rename = "roughness")]
    Roughness,
    #[strum(serialize = "not-anomaly")]
    #[serde(rename = "not-anomaly")]
    NotAnomaly,
    #[strum(serialize = "invalid-energy-calibration")]
    #[serde(rename = "invalid-energy-calibration")]
    InvalidEnergyCalibration,
}

/// A raw per-location candidate peak as delivered by the scan backend,
/// before classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPeak {
    pub point_id: i32,
    pub effect_size: f64,
    pub baseline_variation: f64,
    pub global_difference: f64,
    pub difference_sigma: f64,
    pub peak_height: f64,
    pub detector: String,
    pub channel: u32,
}

/// A candidate classified as a crystalline diffraction signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffractionPeak {
    pub point_id: i32,
    pub effect_size: f64,
    pub baseline_variation: f64,
    pub global_difference: f64,
    pub difference_sigma: f64,
    pub peak_height: f64,
    pub detector: String,
    pub channel: u32,
    pub kev: f64,
    pub kev_start: f64,
    pub kev_end: f64,
    pub status: PeakStatus,
    id_override: Option<String>,
}

impl DiffractionPeak {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        point_id: i32,
        effect_size: f64,
        baseline_variation: f64,
        global_difference: f64,
        difference_sigma: f64,
        peak_height: f64,
        detector: String,
        channel: u32,
        kev: f64,
        kev_start: f64,
        kev_end: f64,
        status: PeakStatus,
    ) -> Self {
        Self {
            point_id,
            effect_size,
            baseline_variation,
            global_difference,
            difference_sigma,
            peak_height,
            detector,
            channel,
            kev,
            kev_start,
            kev_end,
            status,
            id_override: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id_override = Some(id.into());
        self
    }

    /// `<point_id>-<channel>` unless overridden.
    pub fn id(&self) -> String {
        match &self.id_override {
            Some(id) => id.clone(),
            None => format!("{}-{}", self.point_id, self.channel),
        }
    }

    /// True if a channel falls inside this peak's window.
    pub fn channel_in_window(&self, start: u32, end: u32) -> bool {
        self.channel >= start && self.channel < end
    }
}

/// A candidate classified as surface roughness rather than diffraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoughnessItem {
    pub point_id: i32,
    pub global_difference: f64,
    pub deleted: bool,
}

impl RoughnessItem {
    pub fn new(point_id: i32, global_difference: f64, deleted: bool) -> Self {
        Self {
            point_id,
            global_difference,
            deleted,
        }
    }

    pub fn id(&self) -> String {
        format!("roughness-{}", self.point_id)
    }
}
