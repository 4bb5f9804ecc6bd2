//! Scan data source capability.
//!
//! The [`ScanDataSource`] trait is the engine's only window onto a scan's
//! backing data: quantification tables, spectra, pseudo-intensities,
//! housekeeping columns, positions and detected anomalies. Each identifier
//! family the expression language can name maps to one async accessor, so an
//! implementation states exactly which capabilities it provides and the
//! evaluator never inspects value kinds dynamically.
//!
//! Implementations are injected by the caller; the engine never constructs
//! one itself.

pub mod calibration;
pub mod classifier;

use async_trait::async_trait;
use strum::{Display, EnumString};
use thiserror::Error;

use crate::model::PointValueSet;

pub use calibration::EnergyCalibration;

/// How an A/B spectrum difference is reduced over a channel range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum SpectrumDiffMode {
    #[strum(serialize = "sum")]
    Sum,
    #[strum(serialize = "max")]
    Max,
}

/// Spatial axis for position lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum PositionAxis {
    #[strum(serialize = "x")]
    X,
    #[strum(serialize = "y")]
    Y,
    #[strum(serialize = "z")]
    Z,
}

/// Errors a data source can report.
///
/// Not-found errors always name the scan and the exact label that failed to
/// resolve; callers surface these verbatim to drive quantification UX.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    #[error("Scan {scan_id} quantification does not contain column: \"{column}\". Please select (or create) a quantification with the relevant element.")]
    QuantColumnNotFound { scan_id: String, column: String },

    #[error("Scan {scan_id} does not contain {kind} column: \"{column}\"")]
    ColumnNotFound {
        scan_id: String,
        kind: String,
        column: String,
    },

    #[error("Scan {scan_id} has no energy calibration for detector {detector}")]
    CalibrationMissing { scan_id: String, detector: String },

    #[error("Scan {scan_id} spectra unavailable: {message}")]
    SpectraUnavailable { scan_id: String, message: String },

    #[error("Data source error: {0}")]
    Backend(String),
}

impl SourceError {
    /// The pinned quantification-column error.
    pub fn quant_column_not_found(scan_id: impl Into<String>, column: impl Into<String>) -> Self {
        Self::QuantColumnNotFound {
            scan_id: scan_id.into(),
            column: column.into(),
        }
    }

    pub fn column_not_found(
        scan_id: impl Into<String>,
        kind: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self::ColumnNotFound {
            scan_id: scan_id.into(),
            kind: kind.into(),
            column: column.into(),
        }
    }
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Async accessors resolving expression identifiers into per-point maps.
///
/// Every call is a suspension point; implementations typically hit a remote
/// backend or a local cache. All returned sets carry raw provenance unless the
/// accessor itself derives values.
#[async_trait]
pub trait ScanDataSource: Send + Sync {
    /// The scan this source serves, used in error text.
    fn scan_id(&self) -> &str;

    /// One quantified column for an element/column/detector triple, e.g.
    /// `("Fe", "%", "A")`.
    ///
    /// Fails with [`SourceError::QuantColumnNotFound`] naming the full column
    /// label when the quantification lacks it.
    async fn quant_column(
        &self,
        formula: &str,
        column: &str,
        detector: &str,
    ) -> SourceResult<PointValueSet>;

    /// Per-point sum of `column` over all quantified elements.
    async fn quant_element_sum(&self, column: &str, detector: &str)
        -> SourceResult<PointValueSet>;

    /// A free data column of the quantification, e.g. `"chisq"`.
    async fn data_column(&self, column: &str, detector: &str) -> SourceResult<PointValueSet>;

    /// Sum of spectrum counts over `[start_channel, end_channel)` for one
    /// detector.
    async fn spectrum_range_sum(
        &self,
        start_channel: u32,
        end_channel: u32,
        detector: &str,
    ) -> SourceResult<PointValueSet>;

    /// A/B spectrum difference over a channel range, reduced per `mode`.
    async fn spectrum_diff(
        &self,
        start_channel: u32,
        end_channel: u32,
        mode: SpectrumDiffMode,
    ) -> SourceResult<PointValueSet>;

    /// Pseudo-intensity map for one element.
    async fn pseudo_intensity(&self, element: &str) -> SourceResult<PointValueSet>;

    /// Housekeeping/meta column.
    async fn housekeeping(&self, column: &str) -> SourceResult<PointValueSet>;

    /// Physical beam location along one axis.
    async fn position(&self, axis: PositionAxis) -> SourceResult<PointValueSet>;

    /// Count of classified diffraction peaks per point whose channel falls in
    /// `[start_channel, end_channel)`.
    async fn diffraction_peak_count(
        &self,
        start_channel: u32,
        end_channel: u32,
    ) -> SourceResult<PointValueSet>;

    /// Per-point roughness (global difference) map.
    async fn roughness_map(&self) -> SourceResult<PointValueSet>;

    /// The scan's full PMC population, used to build constant maps.
    async fn point_ids(&self) -> SourceResult<Vec<i32>>;
}
