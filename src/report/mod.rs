use crate::error::Result;
use crate::measure::ReportRow;
use prettytable::{row, Table};
use std::io;

/// Output format of the size report.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Two-column text table
    Table,
    /// Pretty-printed JSON array
    Json,
}

/// Builds the `Encoding` / `Size` table, keeping row order.
pub fn build_table(rows: &[ReportRow]) -> Table {
    let mut table = Table::new();
    table.add_row(row!["Encoding", "Size"]);

    for result in rows {
        match result {
            ReportRow::Measured(measured) => {
                table.add_row(row![measured.encoding.label(), measured.size]);
            }
            ReportRow::Failed { encoding, error } => {
                table.add_row(row![encoding.label(), format!("error: {}", error)]);
            }
        }
    }

    table
}

pub fn render(rows: &[ReportRow], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(build_table(rows).to_string()),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(rows).map_err(io::Error::from)?;
            json.push('\n');
            Ok(json)
        }
    }
}

/// Print the report on stdout.
pub fn print_report(rows: &[ReportRow], format: OutputFormat) -> Result<()> {
    print!("{}", render(rows, format)?);
    Ok(())
}
