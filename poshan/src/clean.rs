//! Missing-value reporting, summary statistics and mean imputation.

use log::{debug, info, warn};
use polars::prelude::*;

use crate::error::{PoshanError, PoshanResult};
use crate::COL;

/// Row labels of the summary statistics table, in order.
pub const DESCRIBE_STATISTICS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Looks up `name`, mapping absence to `ColumnNotFound`.
pub(crate) fn require_column<'a>(df: &'a DataFrame, name: &str) -> PoshanResult<&'a Series> {
    df.column(name)
        .map_err(|_| PoshanError::ColumnNotFound(name.to_string()))
}

/// Fails with `InvalidColumnState` unless `series` holds numbers.
pub(crate) fn require_numeric(series: &Series) -> PoshanResult<()> {
    if series.dtype().is_numeric() {
        return Ok(());
    }
    Err(PoshanError::invalid_column_state(
        series.name(),
        format!("expected a numeric column, found {}", series.dtype()),
    ))
}

/// Count of missing values per column, in table order.
pub fn null_counts(df: &DataFrame) -> PoshanResult<DataFrame> {
    let (names, counts): (Vec<String>, Vec<u32>) = df
        .get_columns()
        .iter()
        .map(|s| (s.name().to_string(), s.null_count() as u32))
        .unzip();
    Ok(df!(
        COL::REPORT_COLUMN => names,
        COL::REPORT_MISSING => counts
    )?)
}

fn quartile(ca: &Float64Chunked, q: f64) -> PoshanResult<Option<f64>> {
    Ok(ca.quantile(q, QuantileInterpolOptions::Linear)?)
}

/// Summary statistics for every numeric column: count, mean, sample std, min, quartiles and max.
pub fn describe(df: &DataFrame) -> PoshanResult<DataFrame> {
    let mut columns = vec![Series::new(
        COL::STATISTIC,
        DESCRIBE_STATISTICS.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
    )];
    for series in df.get_columns() {
        if !series.dtype().is_numeric() {
            continue;
        }
        let values = series.cast(&DataType::Float64)?;
        let ca = values.f64()?;
        let count = (ca.len() - ca.null_count()) as f64;
        let stats: Vec<Option<f64>> = vec![
            Some(count),
            ca.mean(),
            ca.std(1),
            ca.min(),
            quartile(ca, 0.25)?,
            quartile(ca, 0.5)?,
            quartile(ca, 0.75)?,
            ca.max(),
        ];
        columns.push(Series::new(series.name(), stats));
    }
    Ok(DataFrame::new(columns)?)
}

/// The result of filling one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnFill {
    pub column: String,
    /// Mean of the non-missing values, used as the fill value.
    pub mean: f64,
    /// Number of cells that were missing and got filled.
    pub filled: usize,
}

/// Outcome of filling a list of columns. A failing column does not stop the others.
#[derive(Debug, Default)]
pub struct CleaningReport {
    pub fills: Vec<ColumnFill>,
    pub failures: Vec<PoshanError>,
}

impl CleaningReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Replaces every missing value of `column` by the mean of its non-missing values.
///
/// Fails with `ColumnNotFound` if the column is absent and with `InvalidColumnState` if it holds
/// no values at all or is not numeric. The table is untouched on failure.
pub fn fill_column_with_mean(df: &mut DataFrame, column: &str) -> PoshanResult<ColumnFill> {
    let series = require_column(df, column)?;
    require_numeric(series)?;
    let values = series.cast(&DataType::Float64)?;
    let ca = values.f64()?;
    let mean = ca
        .mean()
        .ok_or_else(|| PoshanError::invalid_column_state(column, "no non-missing values"))?;
    let filled = ca.null_count();
    let filled_series = ca.fill_null_with_values(mean)?.into_series();
    df.with_column(filled_series)?;
    debug!("Filled {filled} missing value(s) of '{column}' with {mean}");
    Ok(ColumnFill {
        column: column.to_string(),
        mean,
        filled,
    })
}

/// Fills each of `columns` in place with its own mean.
pub fn fill_missing_with_mean(df: &mut DataFrame, columns: &[String]) -> CleaningReport {
    let mut report = CleaningReport::default();
    for column in columns {
        match fill_column_with_mean(df, column) {
            Ok(fill) => report.fills.push(fill),
            Err(err) => {
                warn!("Could not fill '{column}': {err}");
                report.failures.push(err);
            }
        }
    }
    info!(
        "Filled {} column(s), {} failure(s)",
        report.fills.len(),
        report.failures.len()
    );
    report
}
