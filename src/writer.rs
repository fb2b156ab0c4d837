use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::error::{PriceMatchError, Result};
use crate::models::{Cell, Table};

pub const DEFAULT_OUTPUT_FILE: &str = "updated_with_prices_and_units.xlsx";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Xlsx,
    Csv,
}

impl OutputFormat {
    pub fn for_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        match ext.as_deref() {
            Some("xlsx") => Ok(Self::Xlsx),
            Some("csv") => Ok(Self::Csv),
            _ => Err(PriceMatchError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

fn write_xlsx(table: &Table, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let sheet = workbook.add_worksheet();

    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, header, &header_format)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let row_idx = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    sheet.write_string(row_idx, col, s)?;
                }
                Cell::Number(n) if n.is_finite() => {
                    sheet.write_number(row_idx, col, *n)?;
                }
                Cell::Number(_) => {}
                Cell::Bool(b) => {
                    sheet.write_boolean(row_idx, col, *b)?;
                }
            }
        }
    }
    sheet.autofit();

    workbook.save(path)?;
    Ok(())
}

fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|c| c.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the table as XLSX or CSV, chosen by the path's extension.
/// Parent directories are created as needed.
pub fn write_table(table: &Table, path: &Path) -> Result<OutputFormat> {
    let format = OutputFormat::for_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    match format {
        OutputFormat::Xlsx => write_xlsx(table, path)?,
        OutputFormat::Csv => write_csv(table, path)?,
    }
    info!(path = %path.display(), rows = table.len(), ?format, "wrote output");
    Ok(format)
}
