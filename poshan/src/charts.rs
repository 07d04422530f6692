//! The chart objectives: each turns the prepared table into one renderer-neutral
//! [`ChartArtifact`].

use itertools::Itertools;
use log::{debug, error, info, warn};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

use crate::aggregate::{
    drop_missing, group_mean, partition_existing, require_columns, select_columns_by_keywords,
    AggregateRequest, AggregateTable,
};
use crate::clean::require_column;
use crate::config::Config;
use crate::error::{PoshanError, PoshanResult};
use crate::stats::{box_summary, correlation_matrix, histogram, skewness};
use crate::COL;

/// Identifier of a chart objective, e.g. `infra-by-state`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ChartId {
    InfraByState,
    ChildrenDistribution,
    BeneficiaryBoxplot,
    OpenDaysVsChildren,
    CorrelationHeatmap,
    AadharOutliers,
    IdCoverageLine,
    SkewnessHistograms,
    InfraPanels,
    BeneficiaryParticipation,
    CoverageEfficiency,
    HcmFrequency,
    IdCoverageBar,
}

impl ChartId {
    pub fn title(&self) -> &'static str {
        match self {
            ChartId::InfraByState => "Average Drinking Water Supply by State",
            ChartId::ChildrenDistribution => "Distribution of Children (3-6 Years)",
            ChartId::BeneficiaryBoxplot => "Boxplot of Beneficiary Counts",
            ChartId::OpenDaysVsChildren => "AWC Open Days vs Children Participation",
            ChartId::CorrelationHeatmap => "Correlation Heatmap",
            ChartId::AadharOutliers => "Outlier Detection in Aadhar Verified Beneficiaries",
            ChartId::IdCoverageLine => "Aadhaar & Health ID Coverage by State",
            ChartId::SkewnessHistograms => "Histograms of Skewed Columns",
            ChartId::InfraPanels => "AWC Infrastructure by State",
            ChartId::BeneficiaryParticipation => "Beneficiary Participation Across States",
            ChartId::CoverageEfficiency => "Program Coverage & Efficiency Across States",
            ChartId::HcmFrequency => "Average Health Check-Up Frequency Across States",
            ChartId::IdCoverageBar => "Aadhaar Verification & Health ID Creation Coverage by State",
        }
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            ChartId::InfraByState
            | ChartId::InfraPanels
            | ChartId::BeneficiaryParticipation
            | ChartId::HcmFrequency => ChartKind::Bar,
            ChartId::ChildrenDistribution | ChartId::SkewnessHistograms => ChartKind::Histogram,
            ChartId::BeneficiaryBoxplot | ChartId::AadharOutliers => ChartKind::Box,
            ChartId::OpenDaysVsChildren => ChartKind::Scatter,
            ChartId::CorrelationHeatmap => ChartKind::Heatmap,
            ChartId::IdCoverageLine => ChartKind::Line,
            ChartId::CoverageEfficiency => ChartKind::BarLine,
            ChartId::IdCoverageBar => ChartKind::GroupedBar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ChartKind {
    Bar,
    GroupedBar,
    BarLine,
    Histogram,
    Box,
    Scatter,
    Heatmap,
    Line,
}

/// One sub-plot of a multi-panel chart.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Panel {
    pub column: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour_scheme: Option<String>,
}

/// Presentation hints for the downstream plotting tool.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colour_scheme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label_rotation: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hue: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub panels: Vec<Panel>,
}

impl DisplayOptions {
    fn axes(x_label: &str, y_label: &str) -> Self {
        Self {
            x_label: Some(x_label.into()),
            y_label: Some(y_label.into()),
            ..Default::default()
        }
    }

    fn colour(mut self, scheme: &str) -> Self {
        self.colour_scheme = Some(scheme.into());
        self
    }

    fn legend(mut self, legend: &str) -> Self {
        self.legend = Some(legend.into());
        self
    }

    fn rotate(mut self, degrees: u16) -> Self {
        self.label_rotation = Some(degrees);
        self
    }

    fn hue(mut self, column: &str) -> Self {
        self.hue = Some(column.into());
        self
    }
}

/// A finished chart: what to draw, how to label it and the table to draw it from.
#[derive(Debug, Clone)]
pub struct ChartArtifact {
    pub id: ChartId,
    pub title: String,
    pub kind: ChartKind,
    pub options: DisplayOptions,
    pub notes: Vec<String>,
    pub data: DataFrame,
}

impl ChartArtifact {
    fn new(id: ChartId, options: DisplayOptions, data: DataFrame) -> Self {
        Self {
            id,
            title: id.title().to_string(),
            kind: id.kind(),
            options,
            notes: vec![],
            data,
        }
    }

    fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes.extend(notes);
        self
    }
}

/// The result of running one objective. A failed objective does not affect the others.
#[derive(Debug)]
pub struct ChartOutcome {
    pub id: ChartId,
    pub result: PoshanResult<ChartArtifact>,
}

/// Runs each of `ids` against `df`, capturing failures per objective.
pub fn run_charts(df: &DataFrame, config: &Config, ids: &[ChartId]) -> Vec<ChartOutcome> {
    ids.iter()
        .map(|id| {
            debug!("Running chart objective '{id}'");
            let result = build_chart(*id, df, config);
            match &result {
                Ok(chart) => info!("Built '{id}' with {} row(s)", chart.data.height()),
                Err(err) => error!("Chart objective '{id}' failed: {err}"),
            }
            ChartOutcome { id: *id, result }
        })
        .collect()
}

/// Builds a single chart objective.
pub fn build_chart(id: ChartId, df: &DataFrame, config: &Config) -> PoshanResult<ChartArtifact> {
    let key = config.key_column.as_str();
    match id {
        ChartId::InfraByState => {
            let table = infra_means(df, key)?;
            let options = DisplayOptions::axes("Avg AWC Drinking Water Facilities", "State")
                .colour("viridis");
            Ok(ChartArtifact::new(id, options, table.df.clone()).with_notes(undefined_notes(&table)))
        }
        ChartId::ChildrenDistribution => {
            let series = require_column(df, COL::CHILDREN_3_6_YEARS)?;
            let data = histogram(series, config.histogram_bins)?;
            let options = DisplayOptions::axes("Number of Children", "Frequency");
            Ok(ChartArtifact::new(id, options, data))
        }
        ChartId::BeneficiaryBoxplot => {
            let data = box_summary(
                df,
                &[COL::PREGNANT_WOMEN, COL::LACT_MOTHERS, COL::ADOLESCENT_GIRLS],
            )?;
            Ok(ChartArtifact::new(id, DisplayOptions::default(), data))
        }
        ChartId::OpenDaysVsChildren => {
            let (x, y) = (COL::AWC_OPEN_21DAY, COL::CHILDREN_3_6_YEARS);
            require_columns(df, &[key, x, y])?;
            let data = df
                .clone()
                .lazy()
                .select([col(key), col(x), col(y)])
                .filter(col(x).is_not_null().and(col(y).is_not_null()))
                .collect()?;
            let options = DisplayOptions::axes("AWC Open (21 Days)", "Children (3-6 Years)")
                .colour("Set2")
                .legend("outside upper left")
                .hue(key);
            Ok(ChartArtifact::new(id, options, data))
        }
        ChartId::CorrelationHeatmap => {
            let columns = config
                .fill_columns
                .iter()
                .map(String::as_str)
                .chain([COL::CHILDREN_COVERAGE_RATIO])
                .collect_vec();
            let data = correlation_matrix(df, &columns)?;
            Ok(ChartArtifact::new(id, DisplayOptions::default().colour("coolwarm"), data))
        }
        ChartId::AadharOutliers => {
            let data = box_summary(df, &[COL::AADHAR_VERF_BENF])?;
            let options = DisplayOptions {
                x_label: Some(COL::AADHAR_VERF_BENF.into()),
                ..Default::default()
            };
            Ok(ChartArtifact::new(id, options, data))
        }
        ChartId::IdCoverageLine => {
            let (table, long) = id_coverage(df, key)?;
            let options = DisplayOptions::axes("State", "Average Percentage")
                .legend("Metric")
                .rotate(45)
                .hue(COL::METRIC);
            Ok(ChartArtifact::new(id, options, long).with_notes(undefined_notes(&table)))
        }
        ChartId::IdCoverageBar => {
            let (table, long) = id_coverage(df, key)?;
            let options = DisplayOptions::axes("State", "Average Coverage (%)")
                .colour("Set2")
                .legend("Type of Coverage")
                .rotate(45)
                .hue(COL::METRIC);
            Ok(ChartArtifact::new(id, options, long).with_notes(undefined_notes(&table)))
        }
        ChartId::SkewnessHistograms => skewness_histograms(df, config),
        ChartId::InfraPanels => {
            let table = infra_means(df, key)?;
            let panels = [
                (
                    COL::AWC_INFRA_DWS,
                    "Average Drinking Water Facilities by State",
                    "AWC Infra - DWS",
                    "Blues_d",
                ),
                (
                    COL::AWC_INFRA_FUN_TOILETS,
                    "Average Functional Toilets by State",
                    "AWC Infra - Functional Toilets",
                    "Greens_d",
                ),
                (
                    COL::AWC_INFRA_OWN_BUIL,
                    "Average Own Building Facilities by State",
                    "AWC Infra - Own Building",
                    "Purples_d",
                ),
            ]
            .into_iter()
            .map(|(column, title, y_label, colour)| Panel {
                column: column.into(),
                title: title.into(),
                y_label: Some(y_label.into()),
                colour_scheme: Some(colour.into()),
            })
            .collect();
            let options = DisplayOptions {
                panels,
                ..DisplayOptions::default().rotate(60)
            };
            Ok(ChartArtifact::new(id, options, table.df.clone()).with_notes(undefined_notes(&table)))
        }
        ChartId::BeneficiaryParticipation => beneficiary_participation(df, config),
        ChartId::CoverageEfficiency => {
            let request = AggregateRequest::new(
                key,
                &[COL::AWC_OPEN_1DAY, COL::AWC_OPEN_21DAY, COL::CHILDREN_AWC_21DAYS],
            )
            .sorted_by(COL::AWC_OPEN_21DAY);
            let table = group_mean(df, &request)?;
            let options = DisplayOptions::axes("State", "Count (Average)").rotate(45);
            Ok(ChartArtifact::new(id, options, table.df.clone()).with_notes(undefined_notes(&table)))
        }
        ChartId::HcmFrequency => {
            let (present, absent) = partition_existing(df, &config.hcm_columns);
            if present.is_empty() {
                return Err(PoshanError::ColumnNotFound(absent.join(", ")));
            }
            let mut notes = absent_notes(&absent);
            let table = group_mean(df, &AggregateRequest::new(key, &present))?;
            notes.extend(undefined_notes(&table));
            let options =
                DisplayOptions::axes("Health Check-Up Frequency Band", "Average Number of Beneficiaries")
                    .colour("Set2")
                    .rotate(45)
                    .hue(COL::METRIC);
            Ok(ChartArtifact::new(id, options, table.melt()?.df).with_notes(notes))
        }
    }
}

fn infra_means(df: &DataFrame, key: &str) -> PoshanResult<AggregateTable> {
    let request = AggregateRequest::new(
        key,
        &[COL::AWC_INFRA_DWS, COL::AWC_INFRA_FUN_TOILETS, COL::AWC_INFRA_OWN_BUIL],
    )
    .sorted_by(COL::AWC_INFRA_DWS);
    group_mean(df, &request)
}

fn id_coverage(df: &DataFrame, key: &str) -> PoshanResult<(AggregateTable, DataFrame)> {
    let metrics = [COL::AADHAR_VERF_BENF, COL::HEALTH_ID_CREATED];
    let complete = drop_missing(df, &[key, metrics[0], metrics[1]])?;
    let table = group_mean(&complete, &AggregateRequest::new(key, &metrics))?;
    let long = table.melt()?.df;
    Ok((table, long))
}

fn skewness_histograms(df: &DataFrame, config: &Config) -> PoshanResult<ChartArtifact> {
    let id = ChartId::SkewnessHistograms;
    let (present, absent) = partition_existing(df, &config.skewness_columns);
    if present.is_empty() {
        return Err(PoshanError::ColumnNotFound(absent.join(", ")));
    }
    let mut notes = absent_notes(&absent);
    let mut data: Option<DataFrame> = None;
    let mut panels = vec![];
    let mut first_failure = None;
    for column in &present {
        let series = df.column(column)?;
        let hist = match histogram(series, config.skewness_bins) {
            Ok(hist) => hist,
            Err(err) => {
                warn!("Skipping histogram of '{column}': {err}");
                notes.push(format!("{column}: {err}"));
                first_failure.get_or_insert(err);
                continue;
            }
        };
        notes.push(match skewness(series)? {
            Some(skew) => format!("{column}: skewness {skew:.4}"),
            None => format!("{column}: skewness undefined"),
        });
        let mut labelled = hist;
        let label = Series::new(COL::REPORT_COLUMN, vec![column.as_str(); labelled.height()]);
        labelled.insert_column(0, label)?;
        match data.as_mut() {
            Some(data) => {
                data.vstack_mut(&labelled)?;
            }
            None => data = Some(labelled),
        }
        panels.push(Panel {
            column: column.clone(),
            title: format!("Histogram of {column}"),
            y_label: Some("Frequency".into()),
            colour_scheme: None,
        });
    }
    let Some(data) = data else {
        return Err(first_failure
            .unwrap_or_else(|| PoshanError::ColumnNotFound(present.join(", "))));
    };
    let options = DisplayOptions {
        panels,
        ..DisplayOptions::default()
    };
    Ok(ChartArtifact::new(id, options, data).with_notes(notes))
}

fn beneficiary_participation(df: &DataFrame, config: &Config) -> PoshanResult<ChartArtifact> {
    let id = ChartId::BeneficiaryParticipation;
    let key = config.key_column.as_str();
    let names = df.get_column_names();
    let matched = select_columns_by_keywords(&names, &config.beneficiary_keywords)?
        .into_iter()
        .filter(|c| c != key)
        .collect_vec();
    if matched.is_empty() {
        return Err(PoshanError::ColumnNotFound(format!(
            "no column matches {:?}",
            config.beneficiary_keywords
        )));
    }
    let mut notes = vec![format!("Matched columns: {}", matched.join(", "))];
    let shown = matched.iter().take(config.max_panels).cloned().collect_vec();
    if shown.len() < matched.len() {
        notes.push(format!(
            "Showing the first {} of {} matched columns",
            shown.len(),
            matched.len()
        ));
    }
    let table = group_mean(df, &AggregateRequest::new(key, &shown))?;
    notes.extend(undefined_notes(&table));
    let panels = shown
        .iter()
        .map(|column| Panel {
            column: column.clone(),
            title: title_case(column),
            ..Default::default()
        })
        .collect();
    let options = DisplayOptions {
        panels,
        ..DisplayOptions::default().colour("viridis")
    };
    Ok(ChartArtifact::new(id, options, table.melt_ranked()?.df).with_notes(notes))
}

fn absent_notes(absent: &[String]) -> Vec<String> {
    absent
        .iter()
        .map(|column| {
            warn!("Column '{column}' not found; skipped");
            format!("Column '{column}' not found; skipped")
        })
        .collect()
}

fn undefined_notes(table: &AggregateTable) -> Vec<String> {
    table
        .undefined
        .iter()
        .map(|cell| {
            format!(
                "Mean of '{}' undefined for {} = '{}'",
                cell.metric, table.key, cell.key
            )
        })
        .collect()
}

/// `pregnant_women` -> `Pregnant Women`.
fn title_case(column: &str) -> String {
    column
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .join(" ")
}
