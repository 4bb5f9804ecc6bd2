//! Diffraction-peak vs. roughness classification.
//!
//! Runs once per scan over the raw candidate peaks the backend detected,
//! splitting them into crystalline diffraction peaks and surface-roughness
//! items. A manual status override table, keyed by `(point_id, channel)`,
//! lets operators reclassify individual detections.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::model::{DiffractionPeak, PeakStatus, RawPeak, RoughnessItem};
use crate::source::calibration::EnergyCalibration;

/// Candidates at or below this effect size are noise, not anomalies.
const MIN_EFFECT_SIZE: f64 = 6.0;

/// Global difference above which a candidate reads as surface roughness.
const ROUGHNESS_GLOBAL_DIFFERENCE: f64 = 0.16;

/// Minimum normalised peak height for a diffraction classification.
const MIN_PEAK_HEIGHT: f64 = 0.64;

/// Width, in channels, of the energy window reported around a peak.
const PEAK_CHANNEL_WINDOW: f64 = 15.0;

/// Corrupted spectra produce absurd effect sizes; clamp them here.
const MAX_EFFECT_SIZE: f64 = 100.0;

/// Classifies raw candidates into diffraction peaks and roughness items.
///
/// `overrides` maps `(point_id, channel)` to a manually assigned status.
/// `calibration` is the reference detector ("A") energy calibration used to
/// express peak windows in keV. Both outputs come back sorted ascending by
/// point id so consumers iterate deterministically.
pub fn classify_peaks(
    raw: &[RawPeak],
    overrides: &HashMap<(i32, u32), PeakStatus>,
    calibration: &EnergyCalibration,
) -> (Vec<DiffractionPeak>, Vec<RoughnessItem>) {
    let mut peaks = Vec::new();
    let mut roughness = Vec::new();
    let mut roughness_seen: HashSet<i32> = HashSet::new();
    let mut discarded = 0usize;

    for candidate in raw {
        if candidate.effect_size <= MIN_EFFECT_SIZE {
            discarded += 1;
            continue;
        }

        if candidate.global_difference > ROUGHNESS_GLOBAL_DIFFERENCE {
            // Only the first detection per point counts as roughness
            if !roughness_seen.insert(candidate.point_id) {
                continue;
            }
            let deleted = match overrides.get(&(candidate.point_id, candidate.channel)) {
                Some(status) => *status != PeakStatus::Roughness,
                None => false,
            };
            roughness.push(RoughnessItem::new(
                candidate.point_id,
                candidate.global_difference,
                deleted,
            ));
        } else if candidate.peak_height > MIN_PEAK_HEIGHT {
            let channel = candidate.channel as f64;
            let window_start = channel - PEAK_CHANNEL_WINDOW / 2.0;
            let window_end = channel + PEAK_CHANNEL_WINDOW / 2.0;

            let status = overrides
                .get(&(candidate.point_id, candidate.channel))
                .copied()
                .unwrap_or(PeakStatus::DiffractionPeak);

            peaks.push(DiffractionPeak::new(
                candidate.point_id,
                candidate.effect_size.min(MAX_EFFECT_SIZE),
                candidate.baseline_variation,
                candidate.global_difference,
                candidate.difference_sigma,
                candidate.peak_height,
                candidate.detector.clone(),
                candidate.channel,
                calibration.channel_to_kev(channel),
                calibration.channel_to_kev(window_start),
                calibration.channel_to_kev(window_end),
                status,
            ));
        } else {
            discarded += 1;
        }
    }

    peaks.sort_by_key(|p| p.point_id);
    roughness.sort_by_key(|r| r.point_id);

    debug!(
        candidates = raw.len(),
        peaks = peaks.len(),
        roughness = roughness.len(),
        discarded,
        "classified diffraction candidates"
    );

    (peaks, roughness)
}
