use comfy_table::{presets::NOTHING, *};
use itertools::{izip, Itertools};
use polars::prelude::{AnyValue, DataFrame, PolarsResult};
use poshan::charts::{ChartArtifact, ChartId, ChartOutcome};
use poshan::clean::CleaningReport;
use poshan::loader::{ColumnKind, ColumnSpec};
use poshan::PreparationReport;
use strum::IntoEnumIterator;

fn new_table<S: ToString>(header: &[S]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            header
                .iter()
                .map(|h| Cell::new(h.to_string()).add_attribute(Attribute::Bold))
                .collect_vec(),
        )
        .set_style(comfy_table::TableComponent::BottomBorder, '─')
        .set_style(comfy_table::TableComponent::MiddleHeaderIntersections, '─')
        .set_style(comfy_table::TableComponent::HeaderLines, '─')
        .set_style(comfy_table::TableComponent::BottomBorderIntersections, '─')
        .set_style(comfy_table::TableComponent::TopBorder, '─')
        .set_style(comfy_table::TableComponent::TopBorderIntersections, '─');
    table
}

fn any_value_to_string(value: AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::Float64(v) => format!("{v:.2}"),
        AnyValue::Float32(v) => format!("{v:.2}"),
        other => other.to_string(),
    }
}

/// Builds a terminal table with one row per row of `df`.
pub fn dataframe_table(df: &DataFrame) -> anyhow::Result<Table> {
    let mut table = new_table(&df.get_column_names());
    let columns = df.get_columns();
    for idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| col.get(idx).map(any_value_to_string))
            .collect::<PolarsResult<Vec<String>>>()?;
        table.add_row(row);
    }
    Ok(table)
}

pub fn display_dataframe(title: &str, df: &DataFrame) -> anyhow::Result<()> {
    println!("\n{title}");
    println!("{}", dataframe_table(df)?);
    Ok(())
}

pub fn display_columns(specs: &[ColumnSpec]) {
    let mut table = new_table(&["Column", "Kind"]);
    for spec in specs {
        let kind = match spec.kind {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Categorical => "categorical",
        };
        table.add_row(vec![spec.name.as_str(), kind]);
    }
    println!("\nColumns\n{}", table);
}

/// Missing values, summary statistics and beneficiary columns of the raw table.
pub fn display_table_report(
    missing: &DataFrame,
    summary: &DataFrame,
    beneficiary_columns: &[String],
) -> anyhow::Result<()> {
    display_dataframe("Missing values per column", missing)?;
    display_dataframe("Summary statistics", summary)?;
    println!("\nBeneficiary columns: {}", beneficiary_columns.iter().join(", "));
    Ok(())
}

pub fn display_preparation(report: &PreparationReport) -> anyhow::Result<()> {
    display_table_report(&report.missing, &report.summary, &report.beneficiary_columns)?;
    display_cleaning_report(&report.cleaning);
    if let Some(err) = &report.derive_failure {
        println!("✘ {err}");
    }
    Ok(())
}

pub fn display_cleaning_report(report: &CleaningReport) {
    let mut table = new_table(&["Column", "Mean", "Filled"]);
    for fill in &report.fills {
        table.add_row(vec![
            fill.column.clone(),
            format!("{:.2}", fill.mean),
            fill.filled.to_string(),
        ]);
    }
    println!("\nMissing values filled with column means\n{}", table);
    for failure in &report.failures {
        println!("✘ {failure}");
    }
}

pub fn display_chart(chart: &ChartArtifact) -> anyhow::Result<()> {
    println!("\n{} ({}, {})", chart.title, chart.id, chart.kind);
    for note in &chart.notes {
        println!("  - {note}");
    }
    println!("{}", dataframe_table(&chart.data)?);
    Ok(())
}

pub fn display_failures(outcomes: &[ChartOutcome]) {
    for outcome in outcomes {
        if let Err(err) = &outcome.result {
            println!("✘ {}: {err}", outcome.id);
        }
    }
}

pub fn display_chart_ids() {
    let ids = ChartId::iter().collect_vec();
    let mut table = new_table(&["ID", "Kind", "Title"]);
    for (id, kind, title) in izip!(
        ids.iter().map(|id| id.to_string()),
        ids.iter().map(|id| id.kind().to_string()),
        ids.iter().map(|id| id.title())
    ) {
        table.add_row(vec![id, kind, title.to_string()]);
    }
    println!("\n{}", table);
}
