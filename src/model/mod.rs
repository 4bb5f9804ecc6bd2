//! Core value types shared across the engine.
//!
//! * [`point_set`]: the sparse per-point numeric map and its elementwise algebra
//! * [`diffraction`]: classified spectral anomaly value objects

pub mod diffraction;
pub mod point_set;

pub use diffraction::{DiffractionPeak, PeakStatus, RawPeak, RoughnessItem};
pub use point_set::{Operand, PointSetError, PointValue, PointValueSet, SetProvenance, ValueRange};
