//! Sparse per-point value maps.
//!
//! A [`PointValueSet`] holds one numeric value per measurement point (PMC) and
//! is the unit the expression engine computes with. Sets keep a running
//! `[min,max]` range over their defined values and remember whether they came
//! straight from a raw scan file or were computed by an expression.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single per-point value.
///
/// `is_undefined` marks points that exist in the scan but carry no usable
/// value for this column; such entries stay in the set so downstream
/// consumers always see the full point population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointValue {
    /// The PMC this value belongs to.
    pub point_id: i32,
    pub value: f64,
    pub is_undefined: bool,
    pub label: Option<String>,
}

impl PointValue {
    pub fn new(point_id: i32, value: f64) -> Self {
        Self {
            point_id,
            value,
            is_undefined: false,
            label: None,
        }
    }

    /// An entry whose value is present only as a placeholder.
    pub fn undefined(point_id: i32) -> Self {
        Self {
            point_id,
            value: 0.0,
            is_undefined: true,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Running min/max over the defined values of a set.
///
/// The empty range is `{+inf, -inf}`; it expands as defined values merge in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ValueRange {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl ValueRange {
    pub fn expand(&mut self, value: f64) {
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn expand_by(&mut self, other: &ValueRange) {
        if !other.is_empty() {
            self.expand(other.min);
            self.expand(other.max);
        }
    }

    /// True until the first defined value has been merged.
    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn span(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max - self.min
        }
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Where a set's values came from. Affects downstream formatting only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetProvenance {
    /// Read directly from a raw/binary scan source.
    Raw,
    /// Produced by expression evaluation.
    Computed,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PointSetError {
    #[error("Duplicate point id in set: {0}")]
    DuplicatePointId(i32),
}

/// Right-hand operand of an elementwise combine.
pub enum Operand<'a> {
    Scalar(f64),
    Set(&'a PointValueSet),
}

/// An ordered, per-point-unique collection of [`PointValue`]s.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointValueSet {
    values: Vec<PointValue>,
    // An empty range holds infinities, which JSON cannot carry
    #[serde(skip_serializing_if = "ValueRange::is_empty")]
    range: ValueRange,
    provenance: SetProvenance,
    #[serde(skip)]
    index: HashMap<i32, usize>,
}

// The point-id index is rebuilt on deserialization rather than stored.
impl<'de> Deserialize<'de> for PointValueSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Data {
            values: Vec<PointValue>,
            #[serde(default)]
            range: ValueRange,
            provenance: SetProvenance,
        }

        let data = Data::deserialize(deserializer)?;
        let mut set = PointValueSet::new(data.provenance);
        for value in data.values {
            set.add_value(value).map_err(serde::de::Error::custom)?;
        }
        // Keep any range expansion the serialized form carried
        set.range.expand_by(&data.range);
        Ok(set)
    }
}

impl PointValueSet {
    pub fn new(provenance: SetProvenance) -> Self {
        Self {
            values: Vec::new(),
            range: ValueRange::default(),
            provenance,
            index: HashMap::new(),
        }
    }

    /// Builds a set from values, rejecting duplicate point ids.
    pub fn with_values(
        values: Vec<PointValue>,
        provenance: SetProvenance,
    ) -> Result<Self, PointSetError> {
        let mut set = Self::new(provenance);
        for value in values {
            set.add_value(value)?;
        }
        Ok(set)
    }

    /// Appends a value, expanding the range if it is defined.
    pub fn add_value(&mut self, value: PointValue) -> Result<(), PointSetError> {
        if self.index.contains_key(&value.point_id) {
            return Err(PointSetError::DuplicatePointId(value.point_id));
        }
        if !value.is_undefined {
            self.range.expand(value.value);
        }
        self.index.insert(value.point_id, self.values.len());
        self.values.push(value);
        Ok(())
    }

    pub fn expand_range_by(&mut self, other: &ValueRange) {
        self.range.expand_by(other);
    }

    pub fn values(&self) -> &[PointValue] {
        &self.values
    }

    pub fn get(&self, point_id: i32) -> Option<&PointValue> {
        self.index.get(&point_id).map(|i| &self.values[*i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn range(&self) -> &ValueRange {
        &self.range
    }

    pub fn provenance(&self) -> SetProvenance {
        self.provenance
    }

    /// Applies `f` to every defined value, producing a computed set.
    ///
    /// Undefined entries pass through untouched; a non-finite result marks its
    /// entry undefined rather than poisoning the range.
    pub fn map_values<F>(&self, f: F) -> PointValueSet
    where
        F: Fn(f64) -> f64,
    {
        let mut result = PointValueSet::new(SetProvenance::Computed);
        for pv in &self.values {
            let entry = if pv.is_undefined {
                PointValue::undefined(pv.point_id)
            } else {
                let computed = f(pv.value);
                if computed.is_finite() {
                    PointValue::new(pv.point_id, computed)
                } else {
                    PointValue::undefined(pv.point_id)
                }
            };
            // add_value cannot fail here: ids come from a set that is already unique
            let _ = result.add_value(entry);
        }
        result
    }

    /// Elementwise combine against a scalar or another set.
    ///
    /// The result always holds one entry per point of `self`, in order. With a
    /// set operand the right value is looked up by matching point id, never by
    /// position; a left point with no defined counterpart on the right yields
    /// an undefined entry. Non-finite results (division by zero among them)
    /// also become undefined entries.
    pub fn combine<F>(&self, other: &Operand<'_>, op: F) -> PointValueSet
    where
        F: Fn(f64, f64) -> f64,
    {
        let mut result = PointValueSet::new(SetProvenance::Computed);
        for pv in &self.values {
            let rhs = match other {
                Operand::Scalar(s) => Some(*s),
                Operand::Set(set) => set
                    .get(pv.point_id)
                    .filter(|r| !r.is_undefined)
                    .map(|r| r.value),
            };
            let entry = match rhs {
                Some(r) if !pv.is_undefined => {
                    let computed = op(pv.value, r);
                    if computed.is_finite() {
                        PointValue::new(pv.point_id, computed)
                    } else {
                        PointValue::undefined(pv.point_id)
                    }
                }
                _ => PointValue::undefined(pv.point_id),
            };
            let _ = result.add_value(entry);
        }
        result
    }
}
