use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use enum_dispatch::enum_dispatch;
use itertools::Itertools;
use log::{debug, info, warn};
use poshan::charts::{ChartArtifact, ChartId};
use poshan::config::Config;
use poshan::formatters::{ChartFormatter, ChartWriter, CsvFormatter, JsonFormatter};
use poshan::Poshan;
use serde::{Deserialize, Serialize};
use spinners::{Spinner, Spinners};
use strum::IntoEnumIterator;
use strum_macros::EnumString;

use crate::display::{
    display_chart, display_chart_ids, display_columns, display_failures, display_preparation,
    display_table_report,
};
use crate::error::PoshanCliResult;

const DEFAULT_PROGRESS_SPINNER: Spinners = Spinners::Dots;
const COMPLETE_PROGRESS_STRING: &str = "✔";
const RUNNING_TAIL_STRING: &str = "...";
const LOADING_STRING: &str = "Loading table";

/// Defines the output formats chart artifacts can be produced in.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, EnumString, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum OutputFormat {
    Json,
    Csv,
    Table,
}

impl OutputFormat {
    /// The file formatter for this format; `None` for terminal tables.
    fn formatter(&self) -> Option<ChartFormatter> {
        match self {
            OutputFormat::Json => Some(ChartFormatter::Json(JsonFormatter)),
            OutputFormat::Csv => Some(ChartFormatter::Csv(CsvFormatter)),
            OutputFormat::Table => None,
        }
    }
}

fn load(input: &Path, config: Config, quiet: bool) -> PoshanCliResult<Poshan> {
    let sp = (!quiet).then(|| {
        Spinner::with_timer(
            DEFAULT_PROGRESS_SPINNER,
            LOADING_STRING.to_string() + RUNNING_TAIL_STRING,
        )
    });
    let poshan = Poshan::new_with_config(config, input)?;
    if let Some(mut s) = sp {
        s.stop_with_symbol(COMPLETE_PROGRESS_STRING);
    }
    Ok(poshan)
}

fn write_chart(
    formatter: &ChartFormatter,
    chart: &mut ChartArtifact,
    output_dir: Option<&Path>,
) -> PoshanCliResult<()> {
    if let Some(output_dir) = output_dir {
        let path = output_dir.join(format!("{}.{}", chart.id, formatter.extension()));
        let mut f = File::create(&path)
            .with_context(|| format!("Failed to write output to {}", path.display()))?;
        formatter.save(&mut f, chart)?;
        info!("Wrote '{}' to {}", chart.id, path.display());
    } else {
        let mut stdout_lock = std::io::stdout().lock();
        formatter.save(&mut stdout_lock, chart)?;
    };
    Ok(())
}

/// Trait that defines what to run when a given subcommand is invoked.
#[enum_dispatch]
pub trait RunCommand {
    fn run(&self, config: Config) -> PoshanCliResult<()>;
}

/// The `report` command prints the missing-value report and summary statistics of the input.
#[derive(Args, Debug)]
pub struct ReportCommand {
    #[arg(help = "Delimited input file with a header row")]
    input: PathBuf,
    #[arg(from_global)]
    quiet: bool,
}

impl RunCommand for ReportCommand {
    fn run(&self, config: Config) -> PoshanCliResult<()> {
        info!("Running `report` subcommand");
        let poshan = load(&self.input, config, self.quiet)?;
        display_columns(&poshan.columns());
        display_table_report(
            &poshan.missing_value_report()?,
            &poshan.summary_statistics()?,
            &poshan.beneficiary_columns()?,
        )?;
        Ok(())
    }
}

/// The `charts` command reports on the input, cleans it and runs the chart objectives over it.
#[derive(Args, Debug)]
pub struct ChartsCommand {
    #[arg(help = "Delimited input file with a header row")]
    input: PathBuf,
    #[arg(
        short = 'c',
        long = "chart",
        value_name = "ID",
        help = "Chart objective to run, may be repeated. All objectives run when omitted"
    )]
    charts: Vec<ChartId>,
    #[arg(
        short = 'f',
        long,
        value_name = "json|csv|table",
        default_value = "table",
        help = "Output format for the chart artifacts"
    )]
    output_format: OutputFormat,
    #[arg(
        short = 'o',
        long,
        help = "Directory to write one file per chart to, instead of stdout"
    )]
    output_dir: Option<PathBuf>,
    #[arg(from_global)]
    quiet: bool,
}

impl ChartsCommand {
    fn chart_ids(&self) -> Vec<ChartId> {
        if self.charts.is_empty() {
            ChartId::iter().collect()
        } else {
            self.charts.iter().copied().unique().collect()
        }
    }
}

impl RunCommand for ChartsCommand {
    fn run(&self, config: Config) -> PoshanCliResult<()> {
        info!("Running `charts` subcommand");
        let mut poshan = load(&self.input, config, self.quiet)?;
        let report = poshan.prepare()?;
        display_preparation(&report)?;

        let ids = self.chart_ids();
        debug!("Running chart objectives: {ids:?}");
        let mut outcomes = poshan.charts(&ids);

        let formatter = self.output_format.formatter();
        if let Some(output_dir) = self.output_dir.as_deref() {
            if formatter.is_some() {
                std::fs::create_dir_all(output_dir).with_context(|| {
                    format!("Failed to create output directory {}", output_dir.display())
                })?;
            } else {
                warn!("Output directory ignored for table output");
            }
        }
        for outcome in outcomes.iter_mut() {
            let Ok(chart) = outcome.result.as_mut() else {
                continue;
            };
            match formatter.as_ref() {
                Some(formatter) => write_chart(formatter, chart, self.output_dir.as_deref())?,
                None => display_chart(chart)?,
            }
        }
        display_failures(&outcomes);
        Ok(())
    }
}

/// The `list` command prints the available chart objectives.
#[derive(Args, Debug)]
pub struct ListCommand {}

impl RunCommand for ListCommand {
    fn run(&self, _config: Config) -> PoshanCliResult<()> {
        display_chart_ids();
        Ok(())
    }
}

/// The entrypoint for the CLI.
#[derive(Parser, Debug)]
#[command(version, about="Poshan summarises Anganwadi Centre tracker data into chart-ready tables", long_about = None, name="poshan")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    #[arg(
        short = 'q',
        long = "quiet",
        help = "\
            Do not print progress bar to stdout. Results and logs (when `RUST_LOG` is set)\n\
            will still be printed.",
        global = true
    )]
    quiet: bool,
}

/// The subcommands of `poshan`. Each variant wraps its arguments and runs through [`RunCommand`].
#[derive(Subcommand, Debug)]
#[enum_dispatch(RunCommand)]
pub enum Commands {
    /// Missing-value report and summary statistics of the input
    Report(ReportCommand),
    /// Clean the input and produce chart artifacts
    Charts(ChartsCommand),
    /// List the available chart objectives
    List(ListCommand),
}
