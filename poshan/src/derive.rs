//! Derived columns appended to the cleaned table.

use log::debug;
use polars::prelude::*;

use crate::clean::{require_column, require_numeric};
use crate::error::{PoshanError, PoshanResult};
use crate::COL;

/// Denominator guard so the ratio is defined when there are no infants.
const DENOMINATOR_OFFSET: f64 = 1.0;

fn cleaned_values(df: &DataFrame, column: &str) -> PoshanResult<Float64Chunked> {
    let series = require_column(df, column)?;
    require_numeric(series)?;
    let series = series.cast(&DataType::Float64)?;
    if series.null_count() > 0 {
        return Err(PoshanError::invalid_column_state(
            column,
            format!(
                "{} missing value(s) left; fill the column before deriving from it",
                series.null_count()
            ),
        ));
    }
    Ok(series.f64()?.clone())
}

/// Appends (or replaces) `children_coverage_ratio = children_3_6_years / (children_0_6_months + 1)`.
pub fn add_children_coverage_ratio(df: &mut DataFrame) -> PoshanResult<()> {
    let older = cleaned_values(df, COL::CHILDREN_3_6_YEARS)?;
    let infants = cleaned_values(df, COL::CHILDREN_0_6_MONTHS)?;
    let ratio: Vec<f64> = older
        .into_no_null_iter()
        .zip(infants.into_no_null_iter())
        .map(|(older, infants)| older / (infants + DENOMINATOR_OFFSET))
        .collect();
    debug!("Derived {} over {} rows", COL::CHILDREN_COVERAGE_RATIO, ratio.len());
    df.with_column(Series::new(COL::CHILDREN_COVERAGE_RATIO, ratio))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratios(df: &DataFrame) -> Vec<f64> {
        df.column(COL::CHILDREN_COVERAGE_RATIO)
            .unwrap()
            .f64()
            .unwrap()
            .into_no_null_iter()
            .collect()
    }

    #[test]
    fn ratio_is_defined_without_infants() -> anyhow::Result<()> {
        let mut df = df!(
            COL::CHILDREN_3_6_YEARS => &[10.0, 0.0, 9.0],
            COL::CHILDREN_0_6_MONTHS => &[0.0, 4.0, 2.0]
        )?;
        add_children_coverage_ratio(&mut df)?;
        assert_eq!(ratios(&df), vec![10.0, 0.0, 3.0]);
        assert!(ratios(&df).iter().all(|r| *r >= 0.0));
        Ok(())
    }

    #[test]
    fn rerunning_replaces_the_column() -> anyhow::Result<()> {
        let mut df = df!(
            COL::CHILDREN_3_6_YEARS => &[4.0],
            COL::CHILDREN_0_6_MONTHS => &[1.0]
        )?;
        add_children_coverage_ratio(&mut df)?;
        add_children_coverage_ratio(&mut df)?;
        assert_eq!(df.width(), 3);
        assert_eq!(ratios(&df), vec![2.0]);
        Ok(())
    }

    #[test]
    fn uncleaned_source_is_rejected() {
        let mut df = df!(
            COL::CHILDREN_3_6_YEARS => &[Some(4.0), None],
            COL::CHILDREN_0_6_MONTHS => &[Some(1.0), Some(1.0)]
        )
        .unwrap();
        let result = add_children_coverage_ratio(&mut df);
        assert!(matches!(result, Err(PoshanError::InvalidColumnState { .. })));
        assert_eq!(df.width(), 2);
    }

    #[test]
    fn absent_source_is_not_found() {
        let mut df = df!(COL::CHILDREN_3_6_YEARS => &[4.0]).unwrap();
        let result = add_children_coverage_ratio(&mut df);
        assert!(
            matches!(result, Err(PoshanError::ColumnNotFound(ref c)) if c == COL::CHILDREN_0_6_MONTHS)
        );
    }
}
