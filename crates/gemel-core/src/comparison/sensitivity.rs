use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ProvidentError;
use crate::simulation::engine::run_simulation;
use crate::simulation::inputs::{OutputMetric, ParamField, SimulationInputs};
use crate::types::{with_metadata, ComputationOutput};
use crate::ProvidentResult;

/// Output of a 2-way sensitivity sweep.
///
/// `cells[i][j]` is the metric when `param1 = param1_values[i]` and
/// `param2 = param2_values[j]`; `None` marks a combination that failed
/// validation (e.g. a start age at or above the overridden withdrawal age).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityMatrix {
    pub param1: ParamField,
    pub param2: ParamField,
    pub param1_values: Vec<Decimal>,
    pub param2_values: Vec<Decimal>,
    pub row_labels: Vec<String>,
    pub col_labels: Vec<String>,
    pub metric: OutputMetric,
    pub cells: Vec<Vec<Option<Decimal>>>,
}

/// Run the projection once per (v1, v2) pair and collect one output metric.
///
/// Individual invalid combinations become `None` cells with a warning; the
/// sweep as a whole always completes.
pub fn generate_sensitivity_matrix(
    base: &SimulationInputs,
    param1: ParamField,
    param1_values: &[Decimal],
    param2: ParamField,
    param2_values: &[Decimal],
    metric: OutputMetric,
) -> ProvidentResult<ComputationOutput<SensitivityMatrix>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if param1 == param2 {
        return Err(ProvidentError::InvalidInput {
            field: "param2".into(),
            reason: format!("must differ from param1 ({param1})"),
        });
    }
    if param1_values.is_empty() || param2_values.is_empty() {
        return Err(ProvidentError::InvalidInput {
            field: "param_values".into(),
            reason: "value lists must be non-empty".into(),
        });
    }

    let mut cells = Vec::with_capacity(param1_values.len());
    for &v1 in param1_values {
        let mut row = Vec::with_capacity(param2_values.len());
        for &v2 in param2_values {
            let cell = base
                .with_override(param1, v1)
                .and_then(|m| m.with_override(param2, v2))
                .and_then(|m| run_simulation(&m));
            match cell {
                Ok(result) => row.push(Some(metric.extract(&result))),
                Err(e) => {
                    warnings.push(format!(
                        "Cell ({}, {}) unavailable: {e}",
                        param1.format_value(v1),
                        param2.format_value(v2),
                    ));
                    row.push(None);
                }
            }
        }
        cells.push(row);
    }

    let matrix = SensitivityMatrix {
        param1,
        param2,
        param1_values: param1_values.to_vec(),
        param2_values: param2_values.to_vec(),
        row_labels: param1_values.iter().map(|&v| param1.format_value(v)).collect(),
        col_labels: param2_values.iter().map(|&v| param2.format_value(v)).collect(),
        metric,
        cells,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "2-way sensitivity sweep over simulation inputs",
        &serde_json::json!({
            "param1": param1.name(),
            "param2": param2.name(),
            "output_metric": metric.name(),
        }),
        warnings,
        elapsed,
        matrix,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regulations::Regulations;
    use rust_decimal_macros::dec;

    fn base() -> SimulationInputs {
        SimulationInputs::default_from(&Regulations::default(), 30, 60, dec!(3000)).unwrap()
    }

    #[test]
    fn test_matrix_dimensions_and_labels() {
        let returns = [dec!(0.03), dec!(0.05), dec!(0.07)];
        let fees = [dec!(0.004), dec!(0.0105)];
        let output = generate_sensitivity_matrix(
            &base(),
            ParamField::ExpectedReturn,
            &returns,
            ParamField::FeeAum,
            &fees,
            OutputMetric::NetBalance,
        )
        .unwrap();
        let matrix = &output.result;

        assert_eq!(matrix.cells.len(), 3);
        assert_eq!(matrix.cells[0].len(), 2);
        assert_eq!(matrix.row_labels, vec!["3.00%", "5.00%", "7.00%"]);
        assert_eq!(matrix.col_labels, vec!["0.40%", "1.05%"]);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_matrix_is_monotone_in_both_directions() {
        let returns = [dec!(0.03), dec!(0.05), dec!(0.07)];
        let fees = [dec!(0.004), dec!(0.0065), dec!(0.0105)];
        let output = generate_sensitivity_matrix(
            &base(),
            ParamField::ExpectedReturn,
            &returns,
            ParamField::FeeAum,
            &fees,
            OutputMetric::NetBalance,
        )
        .unwrap();
        let cells = &output.result.cells;

        // Higher return (rows): larger net balance for any fee
        for j in 0..3 {
            assert!(cells[0][j].unwrap() < cells[1][j].unwrap());
            assert!(cells[1][j].unwrap() < cells[2][j].unwrap());
        }
        // Higher fee (columns): smaller net balance for any return
        for row in cells {
            assert!(row[0].unwrap() > row[1].unwrap());
            assert!(row[1].unwrap() > row[2].unwrap());
        }
    }

    #[test]
    fn test_invalid_combination_becomes_unavailable_cell() {
        // Start ages 55 and 65 against the fixed withdrawal age of 60:
        // the second row cannot be simulated
        let ages = [dec!(55), dec!(65)];
        let returns = [dec!(0.05)];
        let output = generate_sensitivity_matrix(
            &base(),
            ParamField::StartAge,
            &ages,
            ParamField::ExpectedReturn,
            &returns,
            OutputMetric::NetBalance,
        )
        .unwrap();
        let matrix = &output.result;

        assert!(matrix.cells[0][0].is_some());
        assert!(matrix.cells[1][0].is_none());
        assert_eq!(output.warnings.len(), 1);
        assert!(output.warnings[0].contains("Age 65"));
    }

    #[test]
    fn test_same_param_twice_rejected() {
        let err = generate_sensitivity_matrix(
            &base(),
            ParamField::FeeAum,
            &[dec!(0.004)],
            ParamField::FeeAum,
            &[dec!(0.0105)],
            OutputMetric::NetBalance,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_empty_values_rejected() {
        let err = generate_sensitivity_matrix(
            &base(),
            ParamField::ExpectedReturn,
            &[],
            ParamField::FeeAum,
            &[dec!(0.004)],
            OutputMetric::NetBalance,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_metric_selection() {
        let output = generate_sensitivity_matrix(
            &base(),
            ParamField::ExpectedReturn,
            &[dec!(0.05)],
            ParamField::FeeAum,
            &[dec!(0.0065)],
            OutputMetric::TotalContributions,
        )
        .unwrap();

        // 3000/month for 30 years
        assert_eq!(output.result.cells[0][0].unwrap(), dec!(1_080_000));
    }
}
