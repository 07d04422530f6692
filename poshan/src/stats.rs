//! Statistics behind the distribution charts: histogram bins, box-plot summaries, correlations
//! and skewness.

use itertools::Itertools;
use polars::prelude::*;

use crate::clean::{require_column, require_numeric};
use crate::error::{PoshanError, PoshanResult};
use crate::COL;

/// Whiskers reach at most this many inter-quartile ranges beyond the box.
const WHISKER_IQR: f64 = 1.5;

fn present_values(series: &Series) -> PoshanResult<Vec<f64>> {
    require_numeric(series)?;
    let values = series.cast(&DataType::Float64)?;
    Ok(values.f64()?.into_iter().flatten().collect())
}

/// Arithmetic mean; `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Equal-width histogram of the non-missing values of `series` over `[min, max]`.
///
/// The last bin is closed on the right. A constant series is centred in `[v - 0.5, v + 0.5]`.
pub fn histogram(series: &Series, bins: usize) -> PoshanResult<DataFrame> {
    let name = series.name().to_string();
    if bins == 0 {
        return Err(PoshanError::invalid_column_state(&name, "histogram needs at least one bin"));
    }
    let values = present_values(series)?;
    let (Some(min), Some(max)) = (
        values.iter().copied().reduce(f64::min),
        values.iter().copied().reduce(f64::max),
    ) else {
        return Err(PoshanError::invalid_column_state(&name, "no non-missing values"));
    };
    let (lo, hi) = if min == max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0u32; bins];
    for v in &values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    let starts = (0..bins).map(|i| lo + width * i as f64).collect_vec();
    let ends = (0..bins)
        .map(|i| if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 })
        .collect_vec();
    Ok(df!(
        COL::BIN_START => starts,
        COL::BIN_END => ends,
        COL::COUNT => counts
    )?)
}

/// Linear-interpolated quantile of sorted values.
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (pos - lower as f64)
}

/// Box-plot summary of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub column: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: u32,
}

impl BoxSummary {
    pub fn of(series: &Series) -> PoshanResult<Self> {
        let column = series.name().to_string();
        let mut values = present_values(series)?;
        if values.is_empty() {
            return Err(PoshanError::invalid_column_state(&column, "no non-missing values"));
        }
        values.sort_by(f64::total_cmp);
        let q1 = quantile_sorted(&values, 0.25);
        let median = quantile_sorted(&values, 0.5);
        let q3 = quantile_sorted(&values, 0.75);
        let iqr = q3 - q1;
        let low_fence = q1 - WHISKER_IQR * iqr;
        let high_fence = q3 + WHISKER_IQR * iqr;
        let inside = values
            .iter()
            .copied()
            .filter(|v| *v >= low_fence && *v <= high_fence)
            .collect_vec();
        Ok(Self {
            min: values[0],
            max: values[values.len() - 1],
            q1,
            median,
            q3,
            lower_whisker: inside.first().copied().unwrap_or(q1),
            upper_whisker: inside.last().copied().unwrap_or(q3),
            outliers: (values.len() - inside.len()) as u32,
            column,
        })
    }
}

/// One box-plot summary row per column.
pub fn box_summary<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> PoshanResult<DataFrame> {
    let summaries = columns
        .iter()
        .map(|c| BoxSummary::of(require_column(df, c.as_ref())?))
        .collect::<PoshanResult<Vec<_>>>()?;
    Ok(df!(
        COL::REPORT_COLUMN => summaries.iter().map(|s| s.column.clone()).collect_vec(),
        COL::BOX_MIN => summaries.iter().map(|s| s.min).collect_vec(),
        COL::BOX_Q1 => summaries.iter().map(|s| s.q1).collect_vec(),
        COL::BOX_MEDIAN => summaries.iter().map(|s| s.median).collect_vec(),
        COL::BOX_Q3 => summaries.iter().map(|s| s.q3).collect_vec(),
        COL::BOX_MAX => summaries.iter().map(|s| s.max).collect_vec(),
        COL::BOX_LOWER_WHISKER => summaries.iter().map(|s| s.lower_whisker).collect_vec(),
        COL::BOX_UPPER_WHISKER => summaries.iter().map(|s| s.upper_whisker).collect_vec(),
        COL::BOX_OUTLIERS => summaries.iter().map(|s| s.outliers).collect_vec()
    )?)
}

/// Pearson correlation over the positions where both inputs are present.
///
/// `None` with fewer than two pairs or when either side has zero variance.
pub fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect_vec();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Square correlation matrix: a `column` label column followed by one column per input.
pub fn correlation_matrix<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> PoshanResult<DataFrame> {
    let series = columns
        .iter()
        .map(|c| {
            let series = require_column(df, c.as_ref())?;
            require_numeric(series)?;
            let values = series.cast(&DataType::Float64)?;
            Ok(values.f64()?.into_iter().collect_vec())
        })
        .collect::<PoshanResult<Vec<Vec<Option<f64>>>>>()?;
    let names = columns.iter().map(|c| c.as_ref().to_string()).collect_vec();

    let mut out = vec![Series::new(COL::REPORT_COLUMN, names.clone())];
    for (j, name) in names.iter().enumerate() {
        let column = series
            .iter()
            .map(|row| pearson(row, &series[j]))
            .collect::<Vec<Option<f64>>>();
        out.push(Series::new(name, column));
    }
    Ok(DataFrame::new(out)?)
}

/// Adjusted Fisher-Pearson sample skewness of the non-missing values; `None` with fewer than
/// three values or no spread.
pub fn skewness(series: &Series) -> PoshanResult<Option<f64>> {
    let values = present_values(series)?;
    if values.len() < 3 {
        return Ok(None);
    }
    let n = values.len() as f64;
    let Some(m) = mean(&values) else {
        return Ok(None);
    };
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n;
    if m2 == 0.0 {
        return Ok(None);
    }
    let g1 = m3 / m2.powf(1.5);
    Ok(Some(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_of_empty() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 3.0]), Some(2.0));
    }

    #[test]
    fn histogram_counts_every_present_value() -> anyhow::Result<()> {
        let s = Series::new("v", &[Some(0.0), Some(1.0), Some(2.0), None, Some(10.0)]);
        let hist = histogram(&s, 5)?;
        assert_eq!(hist.height(), 5);
        let counts: Vec<u32> = hist.column(COL::COUNT)?.u32()?.into_no_null_iter().collect();
        assert_eq!(counts, vec![2, 1, 0, 0, 1]);
        let starts: Vec<f64> = hist.column(COL::BIN_START)?.f64()?.into_no_null_iter().collect();
        assert_eq!(starts, vec![0.0, 2.0, 4.0, 6.0, 8.0]);
        let ends: Vec<f64> = hist.column(COL::BIN_END)?.f64()?.into_no_null_iter().collect();
        assert_eq!(ends[4], 10.0);
        Ok(())
    }

    #[test]
    fn histogram_of_constant_column() -> anyhow::Result<()> {
        let s = Series::new("v", &[3.0, 3.0]);
        let hist = histogram(&s, 2)?;
        let counts: Vec<u32> = hist.column(COL::COUNT)?.u32()?.into_no_null_iter().collect();
        assert_eq!(counts, vec![0, 2]);
        Ok(())
    }

    #[test]
    fn histogram_rejects_empty_input() {
        let s = Series::new("v", &[None::<f64>, None]);
        assert!(matches!(
            histogram(&s, 4),
            Err(PoshanError::InvalidColumnState { .. })
        ));
        let s = Series::new("v", &[1.0]);
        assert!(histogram(&s, 0).is_err());
    }

    #[test]
    fn box_summary_flags_outliers() -> anyhow::Result<()> {
        let s = Series::new("v", &[1.0, 2.0, 3.0, 4.0, 100.0]);
        let summary = BoxSummary::of(&s)?;
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.upper_whisker, 4.0);
        assert_eq!(summary.lower_whisker, 1.0);
        assert_eq!(summary.outliers, 1);
        assert_eq!(summary.max, 100.0);
        Ok(())
    }

    #[test]
    fn box_summary_table_has_a_row_per_column() -> anyhow::Result<()> {
        let df = df!("a" => &[1.0, 2.0], "b" => &[3.0, 5.0])?;
        let table = box_summary(&df, &["a", "b"])?;
        assert_eq!(table.shape(), (2, 9));
        assert!(matches!(
            box_summary(&df, &["c"]),
            Err(PoshanError::ColumnNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn correlation_matrix_is_symmetric_with_unit_diagonal() -> anyhow::Result<()> {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0, 4.0],
            "b" => &[2.0, 4.0, 6.0, 8.0],
            "c" => &[4.0, 3.0, 2.0, 1.0],
            "k" => &[1.0, 1.0, 1.0, 1.0]
        )?;
        let matrix = correlation_matrix(&df, &["a", "b", "c", "k"])?;
        assert_eq!(matrix.shape(), (4, 5));
        let a: Vec<Option<f64>> = matrix.column("a")?.f64()?.into_iter().collect();
        assert_eq!(a[0], Some(1.0));
        assert_eq!(a[1], Some(1.0));
        assert_eq!(a[2], Some(-1.0));
        assert_eq!(a[3], None);
        Ok(())
    }

    #[test]
    fn text_columns_are_rejected_not_coerced() -> anyhow::Result<()> {
        let df = df!("a" => &[1.0, 2.0, 3.0], "t" => &["ten", "20", "thirty"])?;
        assert!(matches!(
            correlation_matrix(&df, &["a", "t"]),
            Err(PoshanError::InvalidColumnState { .. })
        ));
        assert!(matches!(
            histogram(df.column("t")?, 3),
            Err(PoshanError::InvalidColumnState { .. })
        ));
        assert!(skewness(df.column("t")?).is_err());
        Ok(())
    }

    #[test]
    fn pearson_uses_pairwise_complete_observations() {
        let a = [Some(1.0), Some(2.0), None, Some(3.0)];
        let b = [Some(1.0), Some(2.0), Some(50.0), Some(3.0)];
        assert_eq!(pearson(&a, &b), Some(1.0));
    }

    #[test]
    fn skewness_sign_follows_the_tail() -> anyhow::Result<()> {
        let right = Series::new("v", &[1.0, 1.0, 1.0, 2.0, 10.0]);
        assert!(skewness(&right)?.unwrap() > 0.0);
        let symmetric = Series::new("v", &[1.0, 2.0, 3.0]);
        assert_eq!(skewness(&symmetric)?, Some(0.0));
        let short = Series::new("v", &[1.0, 2.0]);
        assert_eq!(skewness(&short)?, None);
        Ok(())
    }
}
