//! Group-by means and the reshapes that feed the charts.

use itertools::Itertools;
use log::{debug, warn};
use polars::lazy::frame::pivot::pivot_stable;
use polars::prelude::*;
use regex::Regex;

use crate::clean::{require_column, require_numeric};
use crate::error::{PoshanError, PoshanResult};
use crate::COL;

/// Returns the column names that contain any of `keywords`, ignoring case, in table order.
///
/// Keywords are matched as literals (not regexes).
pub fn select_columns_by_keywords<S, K>(
    column_names: &[S],
    keywords: &[K],
) -> PoshanResult<Vec<String>>
where
    S: AsRef<str>,
    K: AsRef<str>,
{
    let keywords = keywords
        .iter()
        .map(|k| k.as_ref())
        .filter(|k| !k.is_empty())
        .collect_vec();
    if keywords.is_empty() {
        return Ok(vec![]);
    }
    let pattern = format!("(?i){}", keywords.iter().map(|k| regex::escape(k)).join("|"));
    let regex = Regex::new(&pattern)?;
    Ok(column_names
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| regex.is_match(c))
        .map(String::from)
        .collect())
}

/// Fails with `ColumnNotFound` for the first of `columns` absent from `df`.
pub fn require_columns<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> PoshanResult<()> {
    for column in columns {
        require_column(df, column.as_ref())?;
    }
    Ok(())
}

/// Keeps the subset of `columns` present in `df`, returning `(present, absent)`.
pub fn partition_existing<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> (Vec<String>, Vec<String>) {
    columns
        .iter()
        .map(|c| c.as_ref().to_string())
        .partition(|c| df.column(c).is_ok())
}

/// Projects `columns` and drops every row where any of them is missing.
pub fn drop_missing<S: AsRef<str>>(df: &DataFrame, columns: &[S]) -> PoshanResult<DataFrame> {
    require_columns(df, columns)?;
    let names = columns.iter().map(|c| c.as_ref().to_string()).collect_vec();
    let mut lf = df.clone().lazy().select(names.iter().map(|c| col(c)).collect_vec());
    for name in &names {
        lf = lf.filter(col(name).is_not_null());
    }
    Ok(lf.collect()?)
}

/// Describes one group-by-mean aggregation.
#[derive(Debug, Clone)]
pub struct AggregateRequest {
    pub key: String,
    pub targets: Vec<String>,
    /// Sort rows descending by this target; first-appearance order of keys when `None`.
    pub sort_by: Option<String>,
}

impl AggregateRequest {
    pub fn new<S: AsRef<str>>(key: &str, targets: &[S]) -> Self {
        Self {
            key: key.to_string(),
            targets: targets.iter().map(|t| t.as_ref().to_string()).collect(),
            sort_by: None,
        }
    }

    pub fn sorted_by(mut self, metric: &str) -> Self {
        self.sort_by = Some(metric.to_string());
        self
    }
}

/// A group whose target values were all missing, so its mean is undefined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndefinedMean {
    pub key: String,
    pub metric: String,
}

/// One row per distinct key, one mean column per target.
#[derive(Debug, Clone)]
pub struct AggregateTable {
    pub key: String,
    pub metrics: Vec<String>,
    pub df: DataFrame,
    pub undefined: Vec<UndefinedMean>,
}

/// Group `df` by `request.key` and average each target within each group.
///
/// Rows with a missing key are dropped. Missing target values do not count towards the mean; a
/// group with no values for a target gets a null mean that is listed in `undefined`.
pub fn group_mean(df: &DataFrame, request: &AggregateRequest) -> PoshanResult<AggregateTable> {
    require_column(df, &request.key)?;
    for target in &request.targets {
        require_numeric(require_column(df, target)?)?;
    }
    if let Some(sort_by) = request.sort_by.as_ref() {
        if !request.targets.contains(sort_by) {
            return Err(PoshanError::ColumnNotFound(sort_by.clone()));
        }
    }
    debug!("Aggregating {:?}", request);

    let aggs = request
        .targets
        .iter()
        .map(|t| col(t).cast(DataType::Float64).mean())
        .collect_vec();
    let lf = df
        .clone()
        .lazy()
        .filter(col(&request.key).is_not_null())
        .group_by_stable([col(&request.key)])
        .agg(aggs);
    let lf = match request.sort_by.as_ref() {
        Some(sort_by) => lf.sort(
            [sort_by.as_str()],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_nulls_last(true)
                .with_maintain_order(true),
        ),
        None => lf,
    };
    let result = lf.collect()?;

    let undefined = undefined_means(&result, &request.key, &request.targets)?;
    for cell in &undefined {
        warn!(
            "Mean of '{}' is undefined for {} = '{}': all values missing",
            cell.metric, request.key, cell.key
        );
    }

    Ok(AggregateTable {
        key: request.key.clone(),
        metrics: request.targets.clone(),
        df: result,
        undefined,
    })
}

fn undefined_means(
    df: &DataFrame,
    key: &str,
    metrics: &[String],
) -> PoshanResult<Vec<UndefinedMean>> {
    let keys = df.column(key)?.cast(&DataType::String)?;
    let keys = keys.str()?;
    let mut undefined = vec![];
    for metric in metrics {
        let values = df.column(metric)?.f64()?;
        for (k, v) in keys.into_iter().zip(values.into_iter()) {
            if v.is_none() {
                undefined.push(UndefinedMean {
                    key: k.unwrap_or_default().to_string(),
                    metric: metric.clone(),
                });
            }
        }
    }
    Ok(undefined)
}

impl AggregateTable {
    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// A copy of this table sorted descending by `metric`.
    pub fn sorted_by(&self, metric: &str) -> PoshanResult<DataFrame> {
        if !self.metrics.iter().any(|m| m == metric) {
            return Err(PoshanError::ColumnNotFound(metric.to_string()));
        }
        Ok(self.df.sort(
            [metric],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_nulls_last(true)
                .with_maintain_order(true),
        )?)
    }

    /// Wide to long: one `(key, metric, value)` row per key and metric, metric-major.
    pub fn melt(&self) -> PoshanResult<LongTable> {
        self.melt_blocks(false)
    }

    /// Like [`AggregateTable::melt`], with each metric block ordered descending by its value.
    pub fn melt_ranked(&self) -> PoshanResult<LongTable> {
        self.melt_blocks(true)
    }

    fn melt_blocks(&self, ranked: bool) -> PoshanResult<LongTable> {
        let df = if self.metrics.is_empty() {
            DataFrame::new(vec![
                self.df.column(&self.key)?.clear(),
                Series::new_empty(COL::METRIC, &DataType::String),
                Series::new_empty(COL::VALUE, &DataType::Float64),
            ])?
        } else {
            let args = UnpivotArgsDSL {
                on: self.metrics.iter().map(|m| Selector::from(col(m))).collect(),
                index: vec![Selector::from(col(&self.key))],
                variable_name: Some(COL::METRIC.into()),
                value_name: Some(COL::VALUE.into()),
                ..Default::default()
            };
            let long = self.df.clone().lazy().unpivot(args).collect()?;
            if ranked {
                rank_within_blocks(long, self.metrics.len(), self.df.height())?
            } else {
                long
            }
        };
        Ok(LongTable {
            key: self.key.clone(),
            metrics: self.metrics.clone(),
            df,
        })
    }
}

const BLOCK: &str = "block";

/// Sorts each metric block of an unpivoted table descending by value. Blocks keep their order and
/// ties keep the group order.
fn rank_within_blocks(mut long: DataFrame, blocks: usize, block_len: usize) -> PoshanResult<DataFrame> {
    let block = (0..blocks as u32)
        .flat_map(|b| std::iter::repeat(b).take(block_len))
        .collect_vec();
    long.with_column(Series::new(BLOCK, block))?;
    let ranked = long.sort(
        [BLOCK, COL::VALUE],
        SortMultipleOptions::default()
            .with_order_descending_multi([false, true])
            .with_nulls_last(true)
            .with_maintain_order(true),
    )?;
    Ok(ranked.drop(BLOCK)?)
}

/// Long-form reshape of an [`AggregateTable`], used as rendering input.
#[derive(Debug, Clone)]
pub struct LongTable {
    pub key: String,
    pub metrics: Vec<String>,
    pub df: DataFrame,
}

impl LongTable {
    /// Long to wide: the inverse of [`AggregateTable::melt`], columns in metric order.
    pub fn pivot(&self) -> PoshanResult<DataFrame> {
        if self.metrics.is_empty() {
            return Ok(DataFrame::new(vec![self.df.column(&self.key)?.clear()])?);
        }
        let wide = pivot_stable(
            &self.df,
            [COL::METRIC],
            Some([self.key.as_str()]),
            Some([COL::VALUE]),
            false,
            None,
            None,
        )?;
        let order = std::iter::once(self.key.as_str())
            .chain(self.metrics.iter().map(String::as_str))
            .collect_vec();
        Ok(wide.select(order)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_df() -> DataFrame {
        df!(
            "state_name" => &[Some("A"), Some("A"), Some("B"), None, Some("C")],
            "x" => &[Some(10.0), Some(20.0), None, Some(99.0), Some(1.0)],
            "y" => &[Some(1.0), Some(2.0), Some(6.0), Some(99.0), Some(4.0)]
        )
        .unwrap()
    }

    fn column_f64(df: &DataFrame, name: &str) -> Vec<Option<f64>> {
        df.column(name).unwrap().f64().unwrap().into_iter().collect()
    }

    fn column_str(df: &DataFrame, name: &str) -> Vec<String> {
        df.column(name)
            .unwrap()
            .str()
            .unwrap()
            .into_no_null_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn keyword_selection_is_case_insensitive_and_ordered() -> anyhow::Result<()> {
        let columns = [
            "state_name",
            "Pregnant_Women",
            "lact_mothers",
            "adolescent_girls",
            "children_0_6_months",
            "children_coverage_ratio",
        ];
        let keywords = ["pregnant", "lactating", "adolescent", "children"];
        assert_eq!(
            select_columns_by_keywords(&columns, &keywords)?,
            vec![
                "Pregnant_Women",
                "adolescent_girls",
                "children_0_6_months",
                "children_coverage_ratio"
            ]
        );
        Ok(())
    }

    #[test]
    fn keywords_are_literals() -> anyhow::Result<()> {
        let columns = ["a.b", "axb", "(x|"];
        assert_eq!(select_columns_by_keywords(&columns, &["a.b"])?, vec!["a.b"]);
        // Unbalanced regex syntax is still a valid literal keyword
        assert_eq!(select_columns_by_keywords(&columns, &["(x|"])?, vec!["(x|"]);
        assert!(select_columns_by_keywords(&columns, &[""; 0])?.is_empty());
        Ok(())
    }

    #[test]
    fn oversized_keyword_pattern_is_an_error() {
        let keyword = "k".repeat(5_000_000);
        let result = select_columns_by_keywords(&["k"], &[keyword]);
        assert!(matches!(result, Err(PoshanError::InvalidKeywordPattern(_))));
    }

    #[test]
    fn group_means_are_sum_over_count() -> anyhow::Result<()> {
        let table = group_mean(&test_df(), &AggregateRequest::new("state_name", &["x", "y"]))?;
        assert_eq!(column_str(&table.df, "state_name"), vec!["A", "B", "C"]);
        assert_eq!(
            column_f64(&table.df, "x"),
            vec![Some(15.0), None, Some(1.0)]
        );
        assert_eq!(
            column_f64(&table.df, "y"),
            vec![Some(1.5), Some(6.0), Some(4.0)]
        );
        Ok(())
    }

    #[test]
    fn text_target_is_rejected_not_coerced() -> anyhow::Result<()> {
        let df = df!(
            "state_name" => &["A", "A", "B"],
            "x" => &["ten", "twenty", "thirty"]
        )?;
        let result = group_mean(&df, &AggregateRequest::new("state_name", &["x"]));
        assert!(
            matches!(result, Err(PoshanError::InvalidColumnState { ref column, .. }) if column == "x")
        );
        Ok(())
    }

    #[test]
    fn all_missing_group_is_flagged() -> anyhow::Result<()> {
        let df = df!(
            "state_name" => &["A", "A", "B"],
            "x" => &[Some(10.0), Some(20.0), None]
        )?;
        let table = group_mean(&df, &AggregateRequest::new("state_name", &["x"]))?;
        assert_eq!(column_f64(&table.df, "x"), vec![Some(15.0), None]);
        assert_eq!(
            table.undefined,
            vec![UndefinedMean {
                key: "B".into(),
                metric: "x".into()
            }]
        );
        Ok(())
    }

    #[test]
    fn sorting_is_descending_with_nulls_last() -> anyhow::Result<()> {
        let request = AggregateRequest::new("state_name", &["x", "y"]).sorted_by("x");
        let table = group_mean(&test_df(), &request)?;
        assert_eq!(column_str(&table.df, "state_name"), vec!["A", "C", "B"]);
        let by_y = table.sorted_by("y")?;
        assert_eq!(column_str(&by_y, "state_name"), vec!["B", "C", "A"]);
        Ok(())
    }

    #[test]
    fn absent_column_is_not_found_and_nothing_changes() {
        let df = test_df();
        let before = df.clone();
        let result = group_mean(&df, &AggregateRequest::new("state_name", &["x", "nope"]));
        assert!(matches!(result, Err(PoshanError::ColumnNotFound(ref c)) if c == "nope"));
        let result = group_mean(&df, &AggregateRequest::new("district", &["x"]));
        assert!(matches!(result, Err(PoshanError::ColumnNotFound(ref c)) if c == "district"));
        assert!(df.equals_missing(&before));
    }

    #[test]
    fn no_keys_yields_an_empty_table() -> anyhow::Result<()> {
        let df = df!(
            "state_name" => &[None::<&str>, None],
            "x" => &[1.0, 2.0]
        )?;
        let table = group_mean(&df, &AggregateRequest::new("state_name", &["x"]))?;
        assert!(table.is_empty());
        assert!(table.undefined.is_empty());
        Ok(())
    }

    #[test]
    fn melt_then_pivot_round_trips() -> anyhow::Result<()> {
        let table = group_mean(&test_df(), &AggregateRequest::new("state_name", &["x", "y"]))?;
        let long = table.melt()?;
        assert_eq!(long.df.height(), 6);
        assert_eq!(
            column_str(&long.df, COL::METRIC),
            vec!["x", "x", "x", "y", "y", "y"]
        );
        assert_eq!(column_str(&long.df, "state_name"), vec!["A", "B", "C", "A", "B", "C"]);
        let wide = long.pivot()?;
        assert!(wide.equals_missing(&table.df));
        Ok(())
    }

    #[test]
    fn ranked_melt_orders_each_block() -> anyhow::Result<()> {
        let table = group_mean(&test_df(), &AggregateRequest::new("state_name", &["x", "y"]))?;
        let long = table.melt_ranked()?;
        assert_eq!(column_str(&long.df, "state_name"), vec!["A", "C", "B", "B", "C", "A"]);
        assert!(long.pivot()?.height() == 3);
        Ok(())
    }

    #[test]
    fn drop_missing_keeps_complete_rows() -> anyhow::Result<()> {
        let filtered = drop_missing(&test_df(), &["state_name", "x"])?;
        assert_eq!(filtered.shape(), (3, 2));
        assert_eq!(column_str(&filtered, "state_name"), vec!["A", "A", "C"]);
        Ok(())
    }

    #[test]
    fn partition_existing_splits_schema_hits() {
        let (present, absent) = partition_existing(&test_df(), &["x", "hcm_not_done", "y"]);
        assert_eq!(present, vec!["x", "y"]);
        assert_eq!(absent, vec!["hcm_not_done"]);
    }
}
