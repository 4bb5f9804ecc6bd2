//! Shared test fixtures: an in-memory scan data source.

use std::collections::HashMap;

use async_trait::async_trait;

use regolith::model::{PointValue, PointValueSet, SetProvenance};
use regolith::source::{
    PositionAxis, ScanDataSource, SourceError, SourceResult, SpectrumDiffMode,
};

pub const TEST_SCAN_ID: &str = "048300551";

/// A scan source backed by literal tables, mirroring the column naming of a
/// real quantification (`<formula>_<column>_<detector>`).
pub struct TestSource {
    quant_columns: HashMap<String, Vec<(i32, f64)>>,
    data_columns: HashMap<String, Vec<(i32, f64)>>,
    housekeeping_columns: HashMap<String, Vec<(i32, f64)>>,
    points: Vec<i32>,
}

impl Default for TestSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSource {
    pub fn new() -> Self {
        let mut quant_columns = HashMap::new();
        quant_columns.insert(
            "Fe_%_A".to_string(),
            vec![(642, 1.0), (643, 2.0), (644, 3.0)],
        );
        quant_columns.insert(
            "Ti_%_A".to_string(),
            vec![(642, 47.88), (643, 23.94), (644, 4.788)],
        );
        quant_columns.insert(
            "Fe_err_A".to_string(),
            vec![(642, 0.1), (643, 0.2), (644, 0.3)],
        );

        let mut data_columns = HashMap::new();
        data_columns.insert(
            "chisq_A".to_string(),
            vec![(642, 50.0), (643, 100.0), (644, 150.0)],
        );
        data_columns.insert(
            "chisq_B".to_string(),
            vec![(642, 200.0), (643, 210.0), (644, 300.0)],
        );

        let mut housekeeping_columns = HashMap::new();
        housekeeping_columns.insert(
            "f_pixl_analog_fpga".to_string(),
            vec![(642, 2.1), (643, 2.2), (644, 2.3)],
        );

        Self {
            quant_columns,
            data_columns,
            housekeeping_columns,
            points: vec![642, 643, 644],
        }
    }

    fn set_of(&self, pairs: &[(i32, f64)]) -> PointValueSet {
        PointValueSet::with_values(
            pairs
                .iter()
                .map(|(id, v)| PointValue::new(*id, *v))
                .collect(),
            SetProvenance::Raw,
        )
        .expect("fixture tables have unique point ids")
    }
}

#[async_trait]
impl ScanDataSource for TestSource {
    fn scan_id(&self) -> &str {
        TEST_SCAN_ID
    }

    async fn quant_column(
        &self,
        formula: &str,
        column: &str,
        detector: &str,
    ) -> SourceResult<PointValueSet> {
        let label = format!("{}_{}_{}", formula, column, detector);
        match self.quant_columns.get(&label) {
            Some(pairs) => Ok(self.set_of(pairs)),
            None => Err(SourceError::quant_column_not_found(TEST_SCAN_ID, label)),
        }
    }

    async fn quant_element_sum(
        &self,
        column: &str,
        detector: &str,
    ) -> SourceResult<PointValueSet> {
        // Sum over every quantified formula carrying this column
        let suffix = format!("_{}_{}", column, detector);
        let mut totals: HashMap<i32, f64> = HashMap::new();
        let mut found = false;
        for (label, pairs) in &self.quant_columns {
            if label.ends_with(&suffix) {
                found = true;
                for (id, v) in pairs {
                    *totals.entry(*id).or_insert(0.0) += v;
                }
            }
        }
        if !found {
            return Err(SourceError::quant_column_not_found(
                TEST_SCAN_ID,
                suffix.trim_start_matches('_').to_string(),
            ));
        }
        let mut pairs: Vec<(i32, f64)> = totals.into_iter().collect();
        pairs.sort_by_key(|(id, _)| *id);
        Ok(self.set_of(&pairs))
    }

    async fn data_column(&self, column: &str, detector: &str) -> SourceResult<PointValueSet> {
        let label = format!("{}_{}", column, detector);
        match self.data_columns.get(&label) {
            Some(pairs) => Ok(self.set_of(pairs)),
            None => Err(SourceError::column_not_found(TEST_SCAN_ID, "data", label)),
        }
    }

    async fn spectrum_range_sum(
        &self,
        start_channel: u32,
        end_channel: u32,
        _detector: &str,
    ) -> SourceResult<PointValueSet> {
        // One count per channel per point keeps sums easy to predict
        let width = f64::from(end_channel.saturating_sub(start_channel));
        let pairs: Vec<(i32, f64)> = self.points.iter().map(|id| (*id, width)).collect();
        Ok(self.set_of(&pairs))
    }

    async fn spectrum_diff(
        &self,
        _start_channel: u32,
        _end_channel: u32,
        mode: SpectrumDiffMode,
    ) -> SourceResult<PointValueSet> {
        let value = match mode {
            SpectrumDiffMode::Sum => 12.0,
            SpectrumDiffMode::Max => 4.0,
        };
        let pairs: Vec<(i32, f64)> = self.points.iter().map(|id| (*id, value)).collect();
        Ok(self.set_of(&pairs))
    }

    async fn pseudo_intensity(&self, element: &str) -> SourceResult<PointValueSet> {
        if element == "Fe" {
            Ok(self.set_of(&[(642, 0.11), (643, 0.22), (644, 0.33)]))
        } else {
            Err(SourceError::column_not_found(
                TEST_SCAN_ID,
                "pseudo-intensity",
                element,
            ))
        }
    }

    async fn housekeeping(&self, column: &str) -> SourceResult<PointValueSet> {
        match self.housekeeping_columns.get(column) {
            Some(pairs) => Ok(self.set_of(pairs)),
            None => Err(SourceError::column_not_found(
                TEST_SCAN_ID,
                "housekeeping",
                column,
            )),
        }
    }

    async fn position(&self, axis: PositionAxis) -> SourceResult<PointValueSet> {
        let base = match axis {
            PositionAxis::X => 10.0,
            PositionAxis::Y => 20.0,
            PositionAxis::Z => 30.0,
        };
        let pairs: Vec<(i32, f64)> = self
            .points
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, base + i as f64))
            .collect();
        Ok(self.set_of(&pairs))
    }

    async fn diffraction_peak_count(
        &self,
        start_channel: u32,
        end_channel: u32,
    ) -> SourceResult<PointValueSet> {
        // Fixture peaks live at channels 100 and 110 on point 642
        let peaks = [(642, 100u32), (642, 110u32)];
        let mut counts: HashMap<i32, f64> = self.points.iter().map(|id| (*id, 0.0)).collect();
        for (id, channel) in peaks {
            if channel >= start_channel && channel < end_channel {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }
        let mut pairs: Vec<(i32, f64)> = counts.into_iter().collect();
        pairs.sort_by_key(|(id, _)| *id);
        Ok(self.set_of(&pairs))
    }

    async fn roughness_map(&self) -> SourceResult<PointValueSet> {
        Ok(self.set_of(&[(642, 0.0), (643, 0.21), (644, 0.0)]))
    }

    async fn point_ids(&self) -> SourceResult<Vec<i32>> {
        Ok(self.points.clone())
    }
}
