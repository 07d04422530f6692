use anyhow::{anyhow, Result};
use enum_dispatch::enum_dispatch;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value;
use std::io::Cursor;
use std::io::Write;

use crate::charts::ChartArtifact;

/// Utility function to convert from polars `AnyValue` to `serde_json::Value`
/// Doesn't cover all types but most of them.
fn any_value_to_json(value: &AnyValue) -> Result<Value> {
    match value {
        AnyValue::Null => Ok(Value::Null),
        AnyValue::Boolean(b) => Ok(Value::Bool(*b)),
        AnyValue::String(s) => Ok(Value::String((*s).to_string())),
        AnyValue::Int8(n) => Ok(json!(*n)),
        AnyValue::Int16(n) => Ok(json!(*n)),
        AnyValue::Int32(n) => Ok(json!(*n)),
        AnyValue::Int64(n) => Ok(json!(*n)),
        AnyValue::UInt8(n) => Ok(json!(*n)),
        AnyValue::UInt16(n) => Ok(json!(*n)),
        AnyValue::UInt32(n) => Ok(json!(*n)),
        AnyValue::UInt64(n) => Ok(json!(*n)),
        // serde_json writes non-finite floats as null
        AnyValue::Float32(n) => Ok(json!(*n)),
        AnyValue::Float64(n) => Ok(json!(*n)),
        _ => Err(anyhow!("Failed to convert type")),
    }
}

/// Trait to define the chart writers. `save` writes the chart to a writer, `format` renders it
/// to a string.
#[enum_dispatch]
pub trait ChartWriter {
    fn save(&self, writer: &mut impl Write, chart: &mut ChartArtifact) -> Result<()>;
    fn format(&self, chart: &mut ChartArtifact) -> Result<String> {
        let mut data: Vec<u8> = Vec::new();
        let mut buff = Cursor::new(&mut data);
        self.save(&mut buff, chart)?;

        Ok(String::from_utf8(data)?)
    }
    /// File extension used when saving a chart as `<id>.<extension>`.
    fn extension(&self) -> &'static str;
}

/// Enum of chart formatters, one for each output type
#[enum_dispatch(ChartWriter)]
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartFormatter {
    Json(JsonFormatter),
    Csv(CsvFormatter),
}

/// Chart description with its data inlined as rows
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn to_value(&self, chart: &ChartArtifact) -> Result<Value> {
        let columns = chart.data.get_columns();
        let rows = (0..chart.data.height())
            .map(|idx| {
                columns
                    .iter()
                    .map(|col| any_value_to_json(&col.get(idx)?))
                    .collect::<Result<Vec<Value>>>()
                    .map(Value::Array)
            })
            .collect::<Result<Vec<Value>>>()?;
        Ok(json!({
            "id": chart.id.to_string(),
            "title": chart.title,
            "kind": chart.kind,
            "options": chart.options,
            "notes": chart.notes,
            "columns": chart.data.get_column_names(),
            "rows": rows,
        }))
    }
}

impl ChartWriter for JsonFormatter {
    fn save(&self, writer: &mut impl Write, chart: &mut ChartArtifact) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, &self.to_value(chart)?)?;
        writeln!(writer)?;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

/// The bare data table as CSV
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CsvFormatter;

impl ChartWriter for CsvFormatter {
    fn save(&self, writer: &mut impl Write, chart: &mut ChartArtifact) -> Result<()> {
        CsvWriter::new(writer).finish(&mut chart.data)?;
        Ok(())
    }

    fn extension(&self) -> &'static str {
        "csv"
    }
}

#[cfg(test)]
mod tests {
    use crate::charts::{ChartId, ChartKind, DisplayOptions};
    use crate::COL;

    use super::*;

    fn test_chart() -> ChartArtifact {
        ChartArtifact {
            id: ChartId::InfraByState,
            title: ChartId::InfraByState.title().to_string(),
            kind: ChartKind::Bar,
            options: DisplayOptions {
                hue: Some(COL::STATE_NAME.into()),
                ..Default::default()
            },
            notes: vec!["a note".into()],
            data: df!(
                COL::STATE_NAME => &["A", "B"],
                COL::AWC_INFRA_DWS => &[Some(1.5), None]
            )
            .unwrap(),
        }
    }

    #[test]
    fn test_json_formatter() -> anyhow::Result<()> {
        let formatter = ChartFormatter::Json(JsonFormatter);
        let output = formatter.format(&mut test_chart())?;
        let value: Value = serde_json::from_str(&output)?;
        assert_eq!(value["id"], "infra-by-state");
        assert_eq!(value["kind"], "bar");
        assert_eq!(value["options"]["hue"], COL::STATE_NAME);
        assert!(value["options"].get("panels").is_none());
        assert_eq!(value["columns"], json!([COL::STATE_NAME, COL::AWC_INFRA_DWS]));
        assert_eq!(value["rows"], json!([["A", 1.5], ["B", null]]));
        assert_eq!(value["notes"], json!(["a note"]));
        Ok(())
    }

    #[test]
    fn test_csv_formatter() -> anyhow::Result<()> {
        let formatter = ChartFormatter::Csv(CsvFormatter);
        let output = formatter.format(&mut test_chart())?;
        assert_eq!(output, "state_name,awc_infra_dws\nA,1.5\nB,\n");
        assert_eq!(formatter.extension(), "csv");
        Ok(())
    }
}
