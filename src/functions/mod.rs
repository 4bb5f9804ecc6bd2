//! Builtin expression functions.
//!
//! Every function the language exposes validates its argument count and kinds
//! here before touching the data source or the map algebra, so a bad call
//! fails with a fixed-template message naming the function, what it expects
//! and what it received. Identifier functions (those resolving scan data)
//! render the received arguments as a literal list; map/scalar math functions
//! report the received parameter count.

pub mod chem;

use crate::eval::{EvalError, EvalResult, Value};
use crate::model::{Operand, PointValue, PointValueSet, SetProvenance};
use crate::source::{PositionAxis, ScanDataSource, SourceError, SpectrumDiffMode};

/// Dispatches one function call with already-evaluated arguments.
pub async fn call_function(
    function: &str,
    args: &[Value],
    source: &dyn ScanDataSource,
) -> EvalResult<Value> {
    match function {
        "element" => element(args, source).await,
        "elementSum" => element_sum(args, source).await,
        "data" => data(args, source).await,
        "spectrum" => spectrum(args, source).await,
        "spectrumDiff" => spectrum_diff(args, source).await,
        "pseudo" => pseudo(args, source).await,
        "housekeeping" => housekeeping(args, source).await,
        "position" => position(args, source).await,
        "diffractionPeaks" => diffraction_peaks(args, source).await,
        "roughness" => roughness(args, source).await,
        "makeMap" => make_map(args, source).await,
        "atomicMass" => atomic_mass(args),
        "normalize" => normalize(args),
        "threshold" => threshold(args),
        "pow" => pow(args),
        "under" => compare_flag(function, args, |v, s| v < s, false),
        "over" => compare_flag(function, args, |v, s| v > s, false),
        "under_undef" => compare_flag(function, args, |v, s| v < s, true),
        "over_undef" => compare_flag(function, args, |v, s| v > s, true),
        "min" => elementwise_pair(function, args, f64::min),
        "max" => elementwise_pair(function, args, f64::max),
        "avg" => elementwise_pair(function, args, |a, b| (a + b) / 2.0),
        "sin" => elementwise_unary(function, args, f64::sin),
        "cos" => elementwise_unary(function, args, f64::cos),
        "tan" => elementwise_unary(function, args, f64::tan),
        "asin" => elementwise_unary(function, args, f64::asin),
        "acos" => elementwise_unary(function, args, f64::acos),
        "atan" => elementwise_unary(function, args, f64::atan),
        "exp" => elementwise_unary(function, args, f64::exp),
        "ln" => elementwise_unary(function, args, f64::ln),
        _ => Err(EvalError::UnknownFunction(function.to_string())),
    }
}

/// Renders received arguments the way the identifier-function templates show
/// them: a JSON-style list, maps abbreviated to `map`.
fn render_args(args: &[Value]) -> String {
    let rendered: Vec<String> = args
        .iter()
        .map(|value| match value {
            Value::Text(s) => serde_json::to_string(s).unwrap_or_else(|_| s.clone()),
            Value::Scalar(n) => format!("{}", n),
            Value::Map(_) => "map".to_string(),
        })
        .collect();
    format!("[{}]", rendered.join(","))
}

fn expression_args_error(function: &str, expects: &str, args: &[Value]) -> EvalError {
    EvalError::FunctionArguments(format!(
        "{}() expression expects {}. Received: {}",
        function,
        expects,
        render_args(args)
    ))
}

fn map_args_error(function: &str, expects: &str, args: &[Value]) -> EvalError {
    EvalError::FunctionArguments(format!(
        "{}() expects {}. Received: {} parameters",
        function,
        expects,
        args.len()
    ))
}

fn text_arg(args: &[Value], index: usize) -> Option<&str> {
    match args.get(index) {
        Some(Value::Text(s)) => Some(s),
        _ => None,
    }
}

fn scalar_arg(args: &[Value], index: usize) -> Option<f64> {
    match args.get(index) {
        Some(Value::Scalar(n)) => Some(*n),
        _ => None,
    }
}

/// Non-negative whole scalar, as a spectrum channel index.
fn channel_arg(args: &[Value], index: usize) -> Option<u32> {
    scalar_arg(args, index).filter(|n| *n >= 0.0 && n.fract() == 0.0).map(|n| n as u32)
}

async fn element(args: &[Value], source: &dyn ScanDataSource) -> EvalResult<Value> {
    const EXPECTS: &str = "3 parameters: element, datatype, detector Id";
    let (formula, column, detector) = match (
        text_arg(args, 0),
        text_arg(args, 1),
        text_arg(args, 2),
        args.len(),
    ) {
        (Some(f), Some(c), Some(d), 3) => (f, c, d),
        _ => return Err(expression_args_error("element", EXPECTS, args)),
    };

    if column == "%-as-mmol" {
        // Derived column: weight % divided by the molecular mass of the
        // quantified formula, scaled to mmol. Oxide/carbonate columns
        // ("FeO-T") convert by their decomposed base formula.
        let set = source.quant_column(formula, "%", detector).await?;
        let mass = chem::molecular_mass(chem::base_formula(formula))?;
        Ok(Value::Map(set.map_values(|v| v * 10.0 / mass)))
    } else {
        Ok(Value::Map(source.quant_column(formula, column, detector).await?))
    }
}

async fn element_sum(args: &[Value], source: &dyn ScanDataSource) -> EvalResult<Value> {
    const EXPECTS: &str = "2 parameters: datatype, detector Id";
    match (text_arg(args, 0), text_arg(args, 1), args.len()) {
        (Some(column), Some(detector), 2) => Ok(Value::Map(
            source.quant_element_sum(column, detector).await?,
        )),
        _ => Err(expression_args_error("elementSum", EXPECTS, args)),
    }
}

async fn data(args: &[Value], source: &dyn ScanDataSource) -> EvalResult<Value> {
    const EXPECTS: &str = "2 parameters: data column, detector Id";
    match (text_arg(args, 0), text_arg(args, 1), args.len()) {
        (Some(column), Some(detector), 2) => {
            Ok(Value::Map(source.data_column(column, detector).await?))
        }
        _ => Err(expression_args_error("data", EXPECTS, args)),
    }
}

async fn spectrum(args: &[Value], source: &dyn ScanDataSource) -> EvalResult<Value> {
    const EXPECTS: &str = "3 parameters: start channel, end channel, detector Id";
    match (
        channel_arg(args, 0),
        channel_arg(args, 1),
        text_arg(args, 2),
        args.len(),
    ) {
        (Some(start), Some(end), Some(detector), 3) => Ok(Value::Map(
            source.spectrum_range_sum(start, end, detector).await?,
        )),
        _ => Err(expression_args_error("spectrum", EXPECTS, args)),
    }
}

async fn spectrum_diff(args: &[Value], source: &dyn ScanDataSource) -> EvalResult<Value> {
    const EXPECTS: &str = "3 parameters: start channel, end channel, mode (\"sum\" or \"max\")";
    let mode = text_arg(args, 2).and_then(|m| m.parse::<SpectrumDiffMode>().ok());
    match (channel_arg(args, 0), channel_arg(args, 1), mode, args.len()) {
        (Some(start), Some(end), Some(mode), 3) => {
            Ok(Value::Map(source.spectrum_diff(start, end, mode).await?))
        }
        _ => Err(expression_args_error("spectrumDiff", EXPECTS, args)),
    }
}

async fn pseudo(args: &[Value], source: &dyn ScanDataSource) -> EvalResult<Value> {
    const EXPECTS: &str = "1 parameter: pseudo-intensity element";
    match (text_arg(args, 0), args.len()) {
        (Some(element), 1) => Ok(Value::Map(source.pseudo_intensity(element).await?)),
        _ => Err(expression_args_error("pseudo", EXPECTS, args)),
    }
}

async fn housekeeping(args: &[Value], source: &dyn ScanDataSource) -> EvalResult<Value> {
    const EXPECTS: &str = "1 parameter: housekeeping column name";
    match (text_arg(args, 0), args.len()) {
        (Some(column), 1) => Ok(Value::Map(source.housekeeping(column).await?)),
        _ => Err(expression_args_error("housekeeping", EXPECTS, args)),
    }
}

async fn position(args: &[Value], source: &dyn ScanDataSource) -> EvalResult<Value> {
    const EXPECTS: &str = "1 parameter: axis (\"x\", \"y\" or \"z\")";
    let axis = text_arg(args, 0).and_then(|a| a.parse::<PositionAxis>().ok());
    match (axis, args.len()) {
        (Some(axis), 1) => Ok(Value::Map(source.position(axis).await?)),
        _ => Err(expression_args_error("position", EXPECTS, args)),
    }
}

async fn diffraction_peaks(args: &[Value], source: &dyn ScanDataSource) -> EvalResult<Value> {
    const EXPECTS: &str = "2 parameters: start channel, end channel";
    match (channel_arg(args, 0), channel_arg(args, 1), args.len()) {
        (Some(start), Some(end), 2) => Ok(Value::Map(
            source.diffraction_peak_count(start, end).await?,
        )),
        _ => Err(expression_args_error("diffractionPeaks", EXPECTS, args)),
    }
}

async fn roughness(args: &[Value], source: &dyn ScanDataSource) -> EvalResult<Value> {
    if !args.is_empty() {
        return Err(expression_args_error("roughness", "NO parameters", args));
    }
    Ok(Value::Map(source.roughness_map().await?))
}

async fn make_map(args: &[Value], source: &dyn ScanDataSource) -> EvalResult<Value> {
    const EXPECTS: &str = "1 parameter: scalar value";
    let value = match (scalar_arg(args, 0), args.len()) {
        (Some(value), 1) => value,
        _ => return Err(expression_args_error("makeMap", EXPECTS, args)),
    };

    let mut set = PointValueSet::new(SetProvenance::Computed);
    for point_id in source.point_ids().await? {
        set.add_value(PointValue::new(point_id, value))
            .map_err(|e| SourceError::Backend(e.to_string()))?;
    }
    Ok(Value::Map(set))
}

fn atomic_mass(args: &[Value]) -> EvalResult<Value> {
    const EXPECTS: &str = "1 parameter: chemical formula";
    match (text_arg(args, 0), args.len()) {
        (Some(formula), 1) => Ok(Value::Scalar(chem::molecular_mass(chem::base_formula(
            formula,
        ))?)),
        _ => Err(expression_args_error("atomicMass", EXPECTS, args)),
    }
}

fn normalize(args: &[Value]) -> EvalResult<Value> {
    const EXPECTS: &str = "1 parameter: map";
    let set = match (args.first(), args.len()) {
        (Some(Value::Map(set)), 1) => set,
        _ => return Err(map_args_error("normalize", EXPECTS, args)),
    };

    let range = *set.range();
    let span = range.span();
    Ok(Value::Map(set.map_values(move |v| {
        if span > 0.0 {
            (v - range.min) / span
        } else {
            0.0
        }
    })))
}

fn threshold(args: &[Value]) -> EvalResult<Value> {
    const EXPECTS: &str = "3 parameters: map, scalar (compare), scalar (threshold)";
    let (set, compare, threshold) = match (
        args.first(),
        scalar_arg(args, 1),
        scalar_arg(args, 2),
        args.len(),
    ) {
        (Some(Value::Map(set)), Some(compare), Some(threshold), 3) => (set, compare, threshold),
        _ => return Err(map_args_error("threshold", EXPECTS, args)),
    };

    Ok(Value::Map(set.map_values(move |v| {
        if (v - compare).abs() <= threshold {
            1.0
        } else {
            0.0
        }
    })))
}

fn pow(args: &[Value]) -> EvalResult<Value> {
    const EXPECTS: &str = "2 parameters: map OR scalar (base), scalar (exponent)";
    let exponent = match (scalar_arg(args, 1), args.len()) {
        (Some(exponent), 2) => exponent,
        _ => return Err(map_args_error("pow", EXPECTS, args)),
    };

    match &args[0] {
        Value::Map(set) => Ok(Value::Map(set.map_values(move |v| v.powf(exponent)))),
        Value::Scalar(base) => Ok(Value::Scalar(base.powf(exponent))),
        Value::Text(_) => Err(map_args_error("pow", EXPECTS, args)),
    }
}

/// `under`/`over` and their `_undef` variants: 1 where the comparison holds,
/// otherwise 0 — or an undefined entry when `undef_on_fail` is set.
fn compare_flag(
    function: &str,
    args: &[Value],
    cmp: impl Fn(f64, f64) -> bool,
    undef_on_fail: bool,
) -> EvalResult<Value> {
    const EXPECTS: &str = "2 parameters: map, scalar";
    let (set, threshold) = match (args.first(), scalar_arg(args, 1), args.len()) {
        (Some(Value::Map(set)), Some(threshold), 2) => (set, threshold),
        _ => return Err(map_args_error(function, EXPECTS, args)),
    };

    let mut result = PointValueSet::new(SetProvenance::Computed);
    for pv in set.values() {
        let entry = if pv.is_undefined {
            PointValue::undefined(pv.point_id)
        } else if cmp(pv.value, threshold) {
            PointValue::new(pv.point_id, 1.0)
        } else if undef_on_fail {
            PointValue::undefined(pv.point_id)
        } else {
            PointValue::new(pv.point_id, 0.0)
        };
        let _ = result.add_value(entry);
    }
    Ok(Value::Map(result))
}

fn elementwise_pair(
    function: &str,
    args: &[Value],
    op: impl Fn(f64, f64) -> f64,
) -> EvalResult<Value> {
    const EXPECTS: &str = "2 parameters: map, map OR scalar";
    if args.len() != 2 {
        return Err(map_args_error(function, EXPECTS, args));
    }
    match (&args[0], &args[1]) {
        (Value::Map(left), Value::Map(right)) => {
            Ok(Value::Map(left.combine(&Operand::Set(right), op)))
        }
        (Value::Map(left), Value::Scalar(right)) => {
            Ok(Value::Map(left.combine(&Operand::Scalar(*right), op)))
        }
        _ => Err(map_args_error(function, EXPECTS, args)),
    }
}

fn elementwise_unary(
    function: &str,
    args: &[Value],
    op: impl Fn(f64) -> f64,
) -> EvalResult<Value> {
    const EXPECTS: &str = "1 parameter: map OR scalar";
    if args.len() != 1 {
        return Err(map_args_error(function, EXPECTS, args));
    }
    match &args[0] {
        Value::Map(set) => Ok(Value::Map(set.map_values(op))),
        Value::Scalar(n) => Ok(Value::Scalar(op(*n))),
        Value::Text(_) => Err(map_args_error(function, EXPECTS, args)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    use crate::source::SourceResult;

    /// Minimal in-memory source: quant columns keyed `<formula>_<column>_<detector>`.
    struct StubSource {
        scan_id: String,
        quant_columns: HashMap<String, Vec<(i32, f64)>>,
        points: Vec<i32>,
    }

    impl StubSource {
        fn new() -> Self {
            let mut quant_columns = HashMap::new();
            quant_columns.insert(
                "Fe_%_A".to_string(),
                vec![(642, 1.0), (643, 2.0), (644, 3.0)],
            );
            quant_columns.insert(
                "Ti_%_A".to_string(),
                vec![(642, 47.88), (643, 95.76)],
            );
            Self {
                scan_id: "048300551".to_string(),
                quant_columns,
                points: vec![642, 643, 644],
            }
        }

        fn set_of(&self, pairs: &[(i32, f64)]) -> PointValueSet {
            PointValueSet::with_values(
                pairs.iter().map(|(id, v)| PointValue::new(*id, *v)).collect(),
                SetProvenance::Raw,
            )
            .unwrap()
        }
    }

    #[async_trait]
    impl ScanDataSource for StubSource {
        fn scan_id(&self) -> &str {
            &self.scan_id
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
                None => Err(SourceError::quant_column_not_found(&self.scan_id, label)),
            }
        }

        async fn quant_element_sum(
            &self,
            _column: &str,
            _detector: &str,
        ) -> SourceResult<PointValueSet> {
            Ok(self.set_of(&[(642, 10.0), (643, 20.0)]))
        }

        async fn data_column(&self, column: &str, _detector: &str) -> SourceResult<PointValueSet> {
            if column == "chisq" {
                Ok(self.set_of(&[(642, 50.0), (643, 100.0), (644, 150.0)]))
            } else {
                Err(SourceError::column_not_found(&self.scan_id, "data", column))
            }
        }

        async fn spectrum_range_sum(
            &self,
            start_channel: u32,
            end_channel: u32,
            _detector: &str,
        ) -> SourceResult<PointValueSet> {
            let width = f64::from(end_channel - start_channel);
            Ok(self.set_of(&[(642, width), (643, width * 2.0)]))
        }

        async fn spectrum_diff(
            &self,
            _start_channel: u32,
            _end_channel: u32,
            mode: SpectrumDiffMode,
        ) -> SourceResult<PointValueSet> {
            let value = match mode {
                SpectrumDiffMode::Sum => 5.0,
                SpectrumDiffMode::Max => 9.0,
            };
            Ok(self.set_of(&[(642, value)]))
        }

        async fn pseudo_intensity(&self, element: &str) -> SourceResult<PointValueSet> {
            if element == "Fe" {
                Ok(self.set_of(&[(642, 0.5)]))
            } else {
                Err(SourceError::column_not_found(
                    &self.scan_id,
                    "pseudo-intensity",
                    element,
                ))
            }
        }

        async fn housekeeping(&self, column: &str) -> SourceResult<PointValueSet> {
            Err(SourceError::column_not_found(
                &self.scan_id,
                "housekeeping",
                column,
            ))
        }

        async fn position(&self, axis: PositionAxis) -> SourceResult<PointValueSet> {
            let value = match axis {
                PositionAxis::X => 1.0,
                PositionAxis::Y => 2.0,
                PositionAxis::Z => 3.0,
            };
            Ok(self.set_of(&[(642, value)]))
        }

        async fn diffraction_peak_count(
            &self,
            _start_channel: u32,
            _end_channel: u32,
        ) -> SourceResult<PointValueSet> {
            Ok(self.set_of(&[(642, 2.0), (643, 0.0)]))
        }

        async fn roughness_map(&self) -> SourceResult<PointValueSet> {
            Ok(self.set_of(&[(642, 0.2)]))
        }

        async fn point_ids(&self) -> SourceResult<Vec<i32>> {
            Ok(self.points.clone())
        }
    }

    fn map_of(pairs: &[(i32, f64)]) -> Value {
        Value::Map(
            PointValueSet::with_values(
                pairs.iter().map(|(id, v)| PointValue::new(*id, *v)).collect(),
                SetProvenance::Raw,
            )
            .unwrap(),
        )
    }

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn expect_map(value: Value) -> PointValueSet {
        match value {
            Value::Map(set) => set,
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_element_passthrough() {
        let source = StubSource::new();
        let result = call_function("element", &[text("Fe"), text("%"), text("A")], &source)
            .await
            .unwrap();
        let set = expect_map(result);
        assert_eq!(set.len(), 3);
        assert_eq!(set.get(642).unwrap().value, 1.0);
        assert_eq!(set.get(643).unwrap().value, 2.0);
        assert_eq!(set.get(644).unwrap().value, 3.0);
    }

    #[tokio::test]
    async fn test_element_arity_message_is_pinned() {
        let source = StubSource::new();
        let err = call_function("element", &[text("Fe"), text("%")], &source)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "element() expression expects 3 parameters: element, datatype, detector Id. Received: [\"Fe\",\"%\"]"
        );
    }

    #[tokio::test]
    async fn test_element_missing_column_error() {
        let source = StubSource::new();
        let err = call_function("element", &[text("Ca"), text("%"), text("A")], &source)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Scan 048300551 quantification does not contain column: \"Ca_%_A\". Please select (or create) a quantification with the relevant element."
        );
    }

    #[tokio::test]
    async fn test_element_as_mmol() {
        let source = StubSource::new();
        let result = call_function(
            "element",
            &[text("Ti"), text("%-as-mmol"), text("A")],
            &source,
        )
        .await
        .unwrap();
        let set = expect_map(result);
        // Ti atomic mass 47.88: % values multiplied by 10/47.88
        assert!((set.get(642).unwrap().value - 10.0).abs() < 1e-9);
        assert!((set.get(643).unwrap().value - 20.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_pow_arity_message_is_pinned() {
        let source = StubSource::new();
        let err = call_function("pow", &[], &source).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "pow() expects 2 parameters: map OR scalar (base), scalar (exponent). Received: 0 parameters"
        );
    }

    #[tokio::test]
    async fn test_pow_scalar_and_map() {
        let source = StubSource::new();
        let result = call_function("pow", &[Value::Scalar(2.0), Value::Scalar(3.0)], &source)
            .await
            .unwrap();
        assert_eq!(result, Value::Scalar(8.0));

        let result = call_function("pow", &[map_of(&[(1, 3.0)]), Value::Scalar(2.0)], &source)
            .await
            .unwrap();
        assert_eq!(expect_map(result).get(1).unwrap().value, 9.0);
    }

    #[tokio::test]
    async fn test_normalize() {
        let source = StubSource::new();
        let result = call_function("normalize", &[map_of(&[(1, 50.0), (2, 100.0), (3, 150.0)])], &source)
            .await
            .unwrap();
        let set = expect_map(result);
        assert_eq!(set.get(1).unwrap().value, 0.0);
        assert_eq!(set.get(2).unwrap().value, 0.5);
        assert_eq!(set.get(3).unwrap().value, 1.0);
    }

    #[tokio::test]
    async fn test_normalize_constant_map() {
        let source = StubSource::new();
        let result = call_function("normalize", &[map_of(&[(1, 5.0), (2, 5.0)])], &source)
            .await
            .unwrap();
        let set = expect_map(result);
        assert_eq!(set.get(1).unwrap().value, 0.0);
        assert_eq!(set.get(2).unwrap().value, 0.0);
    }

    #[tokio::test]
    async fn test_threshold() {
        let source = StubSource::new();
        let result = call_function(
            "threshold",
            &[
                map_of(&[(1, 1.0), (2, 2.0), (3, 3.5)]),
                Value::Scalar(2.0),
                Value::Scalar(1.0),
            ],
            &source,
        )
        .await
        .unwrap();
        let set = expect_map(result);
        assert_eq!(set.get(1).unwrap().value, 1.0);
        assert_eq!(set.get(2).unwrap().value, 1.0);
        assert_eq!(set.get(3).unwrap().value, 0.0);
    }

    #[tokio::test]
    async fn test_under_over_and_undef_variants() {
        let source = StubSource::new();
        let map = map_of(&[(1, 1.0), (2, 5.0)]);

        let set = expect_map(
            call_function("under", &[map.clone(), Value::Scalar(3.0)], &source)
                .await
                .unwrap(),
        );
        assert_eq!(set.get(1).unwrap().value, 1.0);
        assert_eq!(set.get(2).unwrap().value, 0.0);
        assert!(!set.get(2).unwrap().is_undefined);

        let set = expect_map(
            call_function("under_undef", &[map.clone(), Value::Scalar(3.0)], &source)
                .await
                .unwrap(),
        );
        assert_eq!(set.get(1).unwrap().value, 1.0);
        assert!(set.get(2).unwrap().is_undefined);

        let set = expect_map(
            call_function("over", &[map, Value::Scalar(3.0)], &source)
                .await
                .unwrap(),
        );
        assert_eq!(set.get(1).unwrap().value, 0.0);
        assert_eq!(set.get(2).unwrap().value, 1.0);
    }

    #[tokio::test]
    async fn test_min_max_avg() {
        let source = StubSource::new();
        let left = map_of(&[(1, 1.0), (2, 8.0)]);
        let right = map_of(&[(1, 4.0), (2, 2.0)]);

        let set = expect_map(
            call_function("min", &[left.clone(), right.clone()], &source)
                .await
                .unwrap(),
        );
        assert_eq!(set.get(1).unwrap().value, 1.0);
        assert_eq!(set.get(2).unwrap().value, 2.0);

        let set = expect_map(
            call_function("max", &[left.clone(), Value::Scalar(3.0)], &source)
                .await
                .unwrap(),
        );
        assert_eq!(set.get(1).unwrap().value, 3.0);
        assert_eq!(set.get(2).unwrap().value, 8.0);

        let set = expect_map(call_function("avg", &[left, right], &source).await.unwrap());
        assert_eq!(set.get(1).unwrap().value, 2.5);
        assert_eq!(set.get(2).unwrap().value, 5.0);
    }

    #[tokio::test]
    async fn test_trig_and_ln() {
        let source = StubSource::new();
        let result = call_function("sin", &[Value::Scalar(0.0)], &source)
            .await
            .unwrap();
        assert_eq!(result, Value::Scalar(0.0));

        let set = expect_map(
            call_function("ln", &[map_of(&[(1, 1.0), (2, -1.0)])], &source)
                .await
                .unwrap(),
        );
        assert_eq!(set.get(1).unwrap().value, 0.0);
        // ln of a negative value cannot be represented; entry goes undefined
        assert!(set.get(2).unwrap().is_undefined);
    }

    #[tokio::test]
    async fn test_make_map() {
        let source = StubSource::new();
        let set = expect_map(
            call_function("makeMap", &[Value::Scalar(7.0)], &source)
                .await
                .unwrap(),
        );
        assert_eq!(set.len(), 3);
        for pv in set.values() {
            assert_eq!(pv.value, 7.0);
        }
        assert_eq!(set.provenance(), SetProvenance::Computed);
    }

    #[tokio::test]
    async fn test_atomic_mass() {
        let source = StubSource::new();
        let result = call_function("atomicMass", &[text("Ti")], &source)
            .await
            .unwrap();
        assert_eq!(result, Value::Scalar(47.88));

        let result = call_function("atomicMass", &[text("FeO-T")], &source)
            .await
            .unwrap();
        match result {
            Value::Scalar(mass) => assert!((mass - (55.847 + 15.9994)).abs() < 1e-9),
            other => panic!("expected scalar, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_spectrum_and_diff() {
        let source = StubSource::new();
        let set = expect_map(
            call_function(
                "spectrum",
                &[Value::Scalar(10.0), Value::Scalar(20.0), text("A")],
                &source,
            )
            .await
            .unwrap(),
        );
        assert_eq!(set.get(642).unwrap().value, 10.0);

        let set = expect_map(
            call_function(
                "spectrumDiff",
                &[Value::Scalar(10.0), Value::Scalar(20.0), text("max")],
                &source,
            )
            .await
            .unwrap(),
        );
        assert_eq!(set.get(642).unwrap().value, 9.0);

        let err = call_function(
            "spectrumDiff",
            &[Value::Scalar(10.0), Value::Scalar(20.0), text("median")],
            &source,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().starts_with("spectrumDiff() expression expects"));
    }

    #[tokio::test]
    async fn test_roughness_rejects_arguments() {
        let source = StubSource::new();
        let err = call_function("roughness", &[Value::Scalar(1.0)], &source)
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "roughness() expression expects NO parameters. Received: [1]"
        );
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let source = StubSource::new();
        let err = call_function("median", &[], &source).await.unwrap_err();
        assert_eq!(err, EvalError::UnknownFunction("median".to_string()));
    }
}
