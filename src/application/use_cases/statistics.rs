//! Numeric summaries and pairwise Pearson correlation over a [`Table`].
//!
//! Missing cells are skipped everywhere: column reductions use the
//! column's present values, correlations use only rows where both columns
//! are present. Undefined results (empty input, zero variance) are `None`.

use crate::domain::statistics::{
    ColumnStatistics, CorrelationEntry, StatisticsReport, CORRELATION_KEY,
};
use crate::domain::table::{ColumnData, Table};
use statrs::statistics::{Data, Median, Statistics};

#[derive(Debug, Default, Clone, Copy)]
pub struct StatisticsEngine;

impl StatisticsEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn summarize(&self, table: &Table) -> StatisticsReport {
        let numeric: Vec<(String, &[Option<f64>])> = table
            .columns()
            .iter()
            .filter_map(|column| match &column.data {
                ColumnData::Numeric(values) => {
                    Some((report_name(table, &column.name), values.as_slice()))
                }
                ColumnData::Text(_) => None,
            })
            .collect();

        let columns = numeric
            .iter()
            .map(|(name, values)| {
                let present: Vec<f64> = values.iter().flatten().copied().collect();
                (name.to_string(), column_statistics(&present))
            })
            .collect();

        let correlation = if numeric.len() < 2 {
            None
        } else {
            let mut entries = Vec::with_capacity(numeric.len() * (numeric.len() - 1) / 2);
            for (i, (left, xs)) in numeric.iter().enumerate() {
                for (right, ys) in numeric.iter().skip(i + 1) {
                    entries.push(CorrelationEntry {
                        left: left.to_string(),
                        right: right.to_string(),
                        coefficient: pearson(xs, ys),
                    });
                }
            }
            Some(entries)
        };

        StatisticsReport {
            columns,
            correlation,
        }
    }
}

/// A column named like the correlation key is reported as
/// `correlation.N`, with the first N not taken by another column.
fn report_name(table: &Table, name: &str) -> String {
    if name != CORRELATION_KEY {
        return name.to_string();
    }
    (1..)
        .map(|n| format!("{}.{}", CORRELATION_KEY, n))
        .find(|candidate| table.column(candidate).is_none())
        .unwrap_or_else(|| name.to_string())
}

pub fn column_statistics(values: &[f64]) -> ColumnStatistics {
    ColumnStatistics {
        mean: mean(values),
        median: median(values),
        std: sample_std(values),
        min: defined(Statistics::min(values.iter())),
        max: defined(Statistics::max(values.iter())),
        count: values.len(),
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    defined(values.iter().mean())
}

pub fn median(values: &[f64]) -> Option<f64> {
    defined(Data::new(values.to_vec()).median())
}

/// Standard deviation with an `n - 1` denominator.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    defined(values.iter().std_dev())
}

/// Pearson coefficient over rows where both inputs are present.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();

    if xs.len() < 2 {
        return None;
    }

    let covariance = xs.iter().covariance(ys.iter());
    let scale = xs.iter().std_dev() * ys.iter().std_dev();
    if scale == 0.0 {
        return None;
    }
    defined(covariance / scale).map(|r| r.clamp(-1.0, 1.0))
}

/// statrs reports undefined results as NaN.
fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::Column;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|v| (v - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn test_column_summary_ignores_missing() {
        let table = Table::new(vec![Column::numeric(
            "age",
            vec![Some(10.0), None, Some(20.0), Some(30.0), Some(40.0)],
        )])
        .unwrap();

        let report = StatisticsEngine::new().summarize(&table);
        let age = report.column("age").unwrap();

        assert!(approx(age.mean, 25.0));
        assert!(approx(age.median, 25.0));
        assert!(approx(age.std, 12.909944487358056));
        assert!(approx(age.min, 10.0));
        assert!(approx(age.max, 40.0));
        assert_eq!(age.count, 4);
    }

    #[test]
    fn test_all_missing_column_has_no_values() {
        let table = Table::new(vec![
            Column::numeric("empty", vec![None, None]),
            Column::text("label", vec![Some("a".into()), None]),
        ])
        .unwrap();

        let report = StatisticsEngine::new().summarize(&table);
        let empty = report.column("empty").unwrap();

        assert_eq!(empty.count, 0);
        assert!(empty.mean.is_none());
        assert!(empty.median.is_none());
        assert!(empty.std.is_none());
        assert!(empty.min.is_none());
        assert!(empty.max.is_none());
        assert!(report.column("label").is_none());
    }

    #[test]
    fn test_single_value_has_undefined_std() {
        let stats = column_statistics(&[5.0]);
        assert_eq!(stats.std, None);
        assert_eq!(stats.median, Some(5.0));
    }

    #[test]
    fn test_correlation_upper_triangle_only() {
        let table = Table::new(vec![
            Column::numeric("a", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
            Column::numeric("b", vec![Some(2.0), Some(4.0), Some(6.0), Some(8.0)]),
            Column::text("skip", vec![None, None, None, None]),
            Column::numeric("c", vec![Some(4.0), Some(3.0), Some(2.0), Some(1.0)]),
            Column::numeric("d", vec![Some(1.0), Some(3.0), Some(2.0), Some(5.0)]),
        ])
        .unwrap();

        let report = StatisticsEngine::new().summarize(&table);
        let entries = report.correlation.as_ref().unwrap();

        // C(4, 2)
        assert_eq!(entries.len(), 6);
        assert!(entries.iter().all(|e| e.left != e.right));
        for entry in entries {
            let reversed = entries
                .iter()
                .filter(|other| other.left == entry.right && other.right == entry.left)
                .count();
            assert_eq!(reversed, 0);
        }

        assert!(approx(report.correlation_between("a", "b").unwrap().coefficient, 1.0));
        assert!(approx(report.correlation_between("a", "c").unwrap().coefficient, -1.0));
        assert_eq!(entries[0].key(), "a|b");
    }

    #[test]
    fn test_correlation_uses_pairwise_complete_rows() {
        let xs = [Some(1.0), Some(2.0), None, Some(3.0)];
        let ys = [Some(1.0), Some(2.0), Some(100.0), Some(3.0)];
        assert!(approx(pearson(&xs, &ys), 1.0));
    }

    #[test]
    fn test_constant_column_has_undefined_correlation() {
        let xs = [Some(1.0), Some(1.0), Some(1.0)];
        let ys = [Some(1.0), Some(2.0), Some(3.0)];
        assert_eq!(pearson(&xs, &ys), None);
    }

    #[test]
    fn test_correlation_omitted_below_two_numeric_columns() {
        let table = Table::new(vec![
            Column::numeric("only", vec![Some(1.0), Some(2.0)]),
            Column::text("name", vec![Some("x".into()), Some("y".into())]),
        ])
        .unwrap();

        let report = StatisticsEngine::new().summarize(&table);
        assert!(report.correlation.is_none());
    }

    #[test]
    fn test_column_named_correlation_is_renamed() {
        let table = Table::new(vec![
            Column::numeric("correlation", vec![Some(1.0), Some(2.0), Some(3.0)]),
            Column::numeric("correlation.1", vec![Some(3.0), Some(2.0), Some(1.0)]),
        ])
        .unwrap();

        let report = StatisticsEngine::new().summarize(&table);
        assert!(report.column("correlation").is_none());
        assert_eq!(report.column("correlation.2").unwrap().mean, Some(2.0));

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["correlation.2"]["count"], 3);
        assert_eq!(value["correlation.1"]["count"], 3);
        assert!(approx(value["correlation"]["correlation.2|correlation.1"].as_f64(), -1.0));
    }
}
