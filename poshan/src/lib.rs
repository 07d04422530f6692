use std::path::Path;

use charts::{ChartId, ChartOutcome};
use clean::CleaningReport;
use error::{PoshanError, PoshanResult};
use loader::ColumnSpec;
use log::{debug, info, warn};
use polars::frame::DataFrame;

use crate::config::Config;

// Re-exports
pub use column_names as COL;

// Modules
pub mod aggregate;
pub mod charts;
pub mod clean;
pub mod column_names;
pub mod config;
pub mod derive;
pub mod error;
#[cfg(feature = "formatters")]
pub mod formatters;
pub mod loader;
pub mod stats;

/// What [`Poshan::prepare`] found in the raw table and what it changed.
#[derive(Debug)]
pub struct PreparationReport {
    /// Missing values per column, before filling
    pub missing: DataFrame,
    /// Summary statistics, before filling
    pub summary: DataFrame,
    pub beneficiary_columns: Vec<String>,
    pub cleaning: CleaningReport,
    /// Why the coverage ratio could not be derived. Objectives reading it fail on their own.
    pub derive_failure: Option<PoshanError>,
}

impl PreparationReport {
    pub fn is_clean(&self) -> bool {
        self.cleaning.is_clean() && self.derive_failure.is_none()
    }
}

/// Type for the Poshan tracker table and the analyses run over it
pub struct Poshan {
    pub config: Config,
    pub table: DataFrame,
}

impl Poshan {
    /// Load the table at `path` with default configuration
    pub fn new<P: AsRef<Path>>(path: P) -> PoshanResult<Self> {
        Self::new_with_config(Config::default(), path)
    }

    /// Load the table at `path` with custom configuration
    pub fn new_with_config<P: AsRef<Path>>(config: Config, path: P) -> PoshanResult<Self> {
        debug!("config: {config:?}");
        let table = loader::load_csv(path, &config.numeric_columns())?;
        Ok(Self { config, table })
    }

    /// Wrap an already loaded table
    pub fn from_dataframe(config: Config, table: DataFrame) -> Self {
        Self { config, table }
    }

    pub fn columns(&self) -> Vec<ColumnSpec> {
        loader::column_specs(&self.table)
    }

    /// Missing values per column
    pub fn missing_value_report(&self) -> PoshanResult<DataFrame> {
        clean::null_counts(&self.table)
    }

    pub fn summary_statistics(&self) -> PoshanResult<DataFrame> {
        clean::describe(&self.table)
    }

    /// Columns matched by the configured beneficiary keywords
    pub fn beneficiary_columns(&self) -> PoshanResult<Vec<String>> {
        aggregate::select_columns_by_keywords(
            &self.table.get_column_names(),
            &self.config.beneficiary_keywords,
        )
    }

    /// Reports on the raw table, then fills the configured columns with their means and appends
    /// the derived ratio.
    ///
    /// Neither a column that cannot be filled nor a ratio that cannot be derived stops the run;
    /// both are recorded in the returned report.
    pub fn prepare(&mut self) -> PoshanResult<PreparationReport> {
        let missing = self.missing_value_report()?;
        let summary = self.summary_statistics()?;
        let beneficiary_columns = self.beneficiary_columns()?;
        let cleaning = clean::fill_missing_with_mean(&mut self.table, &self.config.fill_columns);
        let derive_failure = match derive::add_children_coverage_ratio(&mut self.table) {
            Ok(()) => None,
            Err(err) => {
                warn!("Could not derive '{}': {err}", COL::CHILDREN_COVERAGE_RATIO);
                Some(err)
            }
        };
        info!("Prepared table with shape: {:?}", self.table.shape());
        Ok(PreparationReport {
            missing,
            summary,
            beneficiary_columns,
            cleaning,
            derive_failure,
        })
    }

    /// Runs the chart objectives `ids` over the current table
    pub fn charts(&self, ids: &[ChartId]) -> Vec<ChartOutcome> {
        charts::run_charts(&self.table, &self.config, ids)
    }
}
