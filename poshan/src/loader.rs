//! Reading the delimited input file into a `DataFrame`.

use std::io::{Cursor, Read};
use std::path::Path;

use log::{debug, info};
use polars::io::csv::read::{CsvParseOptions, CsvReadOptions, NullValues};
use polars::prelude::*;

use crate::error::{PoshanError, PoshanResult};

/// Cell contents read as missing in addition to empty cells.
const MISSING_TOKENS: [&str; 6] = ["NA", "N/A", "NaN", "nan", "null", "NULL"];

/// Whether a column holds numbers or labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// A named, typed reference into a loaded table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn of(series: &Series) -> Self {
        let kind = if series.dtype().is_numeric() {
            ColumnKind::Numeric
        } else {
            ColumnKind::Categorical
        };
        Self {
            name: series.name().to_string(),
            kind,
        }
    }
}

/// Lists every column of `df` with its kind.
pub fn column_specs(df: &DataFrame) -> Vec<ColumnSpec> {
    df.get_columns().iter().map(ColumnSpec::of).collect()
}

/// Loads the file at `path`. Columns listed in `numeric_columns` must parse as numbers.
pub fn load_csv<P: AsRef<Path>>(path: P, numeric_columns: &[String]) -> PoshanResult<DataFrame> {
    let path = path.as_ref();
    info!("Attempting to load dataframe from {}", path.display());
    let file = std::fs::File::open(path).map_err(|e| {
        PoshanError::MalformedInput(format!("Failed to read '{}': {e}", path.display()))
    })?;
    load_csv_from_reader(file, numeric_columns)
}

/// Same as [`load_csv`] for any reader.
pub fn load_csv_from_reader<R: Read>(
    mut reader: R,
    numeric_columns: &[String],
) -> PoshanResult<DataFrame> {
    let mut bytes = vec![];
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| PoshanError::MalformedInput(format!("Failed to read input: {e}")))?;
    let null_values = NullValues::AllColumns(MISSING_TOKENS.iter().map(|t| (*t).into()).collect());
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        // Infer from every row so a late decimal does not fail an integer column
        .with_infer_schema_length(None)
        .with_parse_options(CsvParseOptions::default().with_null_values(Some(null_values)))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()
        .map_err(|e| PoshanError::MalformedInput(format!("Failed to parse CSV: {e}")))?;

    if df.width() == 0 {
        return Err(PoshanError::MalformedInput(
            "Input has no columns".to_string(),
        ));
    }
    normalise_numeric_columns(&mut df, numeric_columns)?;
    info!("Loaded dataframe with shape: {:?}", df.shape());
    Ok(df)
}

/// Casts every numeric column to `Float64` and checks that the configured numeric columns present
/// in the table hold numbers.
fn normalise_numeric_columns(df: &mut DataFrame, numeric_columns: &[String]) -> PoshanResult<()> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();
    for name in names {
        let series = df.column(&name)?;
        let cast = if series.dtype() == &DataType::Float64 {
            continue;
        } else if series.dtype().is_numeric() {
            series.cast(&DataType::Float64)?
        } else if numeric_columns.contains(&name) {
            series.strict_cast(&DataType::Float64).map_err(|_| {
                PoshanError::MalformedInput(format!(
                    "Column '{name}' is expected to be numeric but holds {}",
                    series.dtype()
                ))
            })?
        } else {
            continue;
        };
        debug!("Casting column '{name}' to f64");
        df.with_column(cast)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(columns: &[&str]) -> Vec<String> {
        columns.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn loads_missing_cells_as_nulls() -> anyhow::Result<()> {
        let csv = "state_name,x,y\nA,1,\nB,,2.5\n,NA,3\n";
        let df = load_csv_from_reader(csv.as_bytes(), &numeric(&["x", "y"]))?;
        assert_eq!(df.shape(), (3, 3));
        assert_eq!(df.column("x")?.dtype(), &DataType::Float64);
        assert_eq!(df.column("x")?.null_count(), 2);
        assert_eq!(df.column("y")?.null_count(), 1);
        assert_eq!(df.column("state_name")?.null_count(), 1);
        Ok(())
    }

    #[test]
    fn all_missing_numeric_column_is_accepted() -> anyhow::Result<()> {
        let csv = "state_name,y\nA,\nB,\n";
        let df = load_csv_from_reader(csv.as_bytes(), &numeric(&["y"]))?;
        assert_eq!(df.column("y")?.dtype(), &DataType::Float64);
        assert_eq!(df.column("y")?.null_count(), 2);
        Ok(())
    }

    #[test]
    fn non_numeric_configured_column_is_malformed() {
        let csv = "state_name,x\nA,one\nB,two\n";
        let result = load_csv_from_reader(csv.as_bytes(), &numeric(&["x"]));
        assert!(matches!(result, Err(PoshanError::MalformedInput(_))));
    }

    #[test]
    fn late_decimal_widens_an_integer_column() -> anyhow::Result<()> {
        let mut csv = String::from("state_name,x\n");
        for i in 0..12_000 {
            csv.push_str(&format!("A,{i}\n"));
        }
        csv.push_str("B,1.5\n");
        let df = load_csv_from_reader(csv.as_bytes(), &numeric(&["x"]))?;
        assert_eq!(df.height(), 12_001);
        assert_eq!(df.column("x")?.dtype(), &DataType::Float64);
        assert_eq!(df.column("x")?.f64()?.get(12_000), Some(1.5));
        Ok(())
    }

    #[test]
    fn missing_file_is_malformed() {
        let result = load_csv("/definitely/not/here.csv", &[]);
        assert!(matches!(result, Err(PoshanError::MalformedInput(_))));
    }

    #[test]
    fn empty_input_is_malformed() {
        let result = load_csv_from_reader("".as_bytes(), &[]);
        assert!(matches!(result, Err(PoshanError::MalformedInput(_))));
    }

    #[test]
    fn column_specs_report_kinds() -> anyhow::Result<()> {
        let csv = "state_name,x\nA,1\n";
        let df = load_csv_from_reader(csv.as_bytes(), &[])?;
        let specs = column_specs(&df);
        assert_eq!(specs[0].kind, ColumnKind::Categorical);
        assert_eq!(specs[1].kind, ColumnKind::Numeric);
        Ok(())
    }
}
