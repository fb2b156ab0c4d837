use std::fmt;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{PriceMatchError, Result};
use crate::models::{Cell, Table};

pub const SERIAL_NO: &str = "s no.";
pub const ITEM_CODE: &str = "item code";
pub const UNIT: &str = "unit";
pub const UNIT_PRICE: &str = "unit price";

const MASTER_COLUMNS: &[&str] = &[SERIAL_NO, ITEM_CODE, UNIT, UNIT_PRICE];
const RAW_COLUMNS: &[&str] = &[ITEM_CODE];

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Master,
    Raw,
}

impl Role {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Raw => "raw",
        }
    }

    pub fn from_key(key: &str) -> Result<Self> {
        match key.trim().to_lowercase().as_str() {
            "master" => Ok(Self::Master),
            "raw" => Ok(Self::Raw),
            _ => Err(PriceMatchError::UnknownRole(key.to_string())),
        }
    }

    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Master => MASTER_COLUMNS,
            Self::Raw => RAW_COLUMNS,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Master => f.write_str("Master"),
            Self::Raw => f.write_str("Raw"),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Parse a price typed as text: "1,250.50", "$8", "(12.00)".
pub fn parse_price(raw: &str) -> Option<f64> {
    let s = raw.replace(&[',', '"', '$'][..], "");
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.trim().parse::<f64>().ok().map(|v| -v);
    }
    s.parse().ok().filter(|v: &f64| v.is_finite())
}

pub fn excel_serial_to_datetime(serial: f64) -> String {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let Some(base) = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).and_then(|d| d.and_hms_opt(0, 0, 0)) else {
        return serial.to_string();
    };
    let seconds = (serial * 86_400.0).round() as i64;
    let dt = base + chrono::Duration::seconds(seconds);
    if seconds % 86_400 == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// CSV cells stay text as written; "0012" must not become 12. Prices are
/// parsed where they are consumed.
fn cell_from_text(raw: &str) -> Cell {
    if raw.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::Text(raw.to_string())
    }
}

fn cell_from_data(data: &calamine::Data) -> Cell {
    use calamine::Data;
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => {
            if s.is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Text(excel_serial_to_datetime(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

/// Turn raw grid rows into a table: first row is the header, blank rows are dropped.
fn build_table(source: &str, mut grid: Vec<Vec<Cell>>) -> Result<Table> {
    if grid.is_empty() {
        return Err(PriceMatchError::EmptySheet(source.to_string()));
    }
    let header_row = grid.remove(0);
    let width = grid
        .iter()
        .map(|r| r.len())
        .chain(std::iter::once(header_row.len()))
        .max()
        .unwrap_or(0);

    let headers: Vec<String> = (0..width)
        .map(|i| {
            let name = header_row.get(i).map(|c| normalize_header(&c.to_string())).unwrap_or_default();
            if name.is_empty() {
                format!("unnamed: {i}")
            } else {
                name
            }
        })
        .collect();

    let total = grid.len();
    let rows: Vec<Vec<Cell>> = grid
        .into_iter()
        .filter(|row| !row.iter().all(Cell::is_blank))
        .collect();
    if rows.len() < total {
        debug!(source, dropped = total - rows.len(), "dropped blank rows");
    }

    Ok(Table::new(headers, rows))
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum SourceKind {
    Csv,
    Workbook,
}

impl SourceKind {
    fn detect(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Workbook),
            _ => Err(PriceMatchError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

fn read_csv(path: &Path) -> Result<Vec<Vec<Cell>>> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let mut grid = Vec::new();
    for result in rdr.records() {
        let record = result?;
        grid.push(record.iter().map(cell_from_text).collect());
    }
    Ok(grid)
}

fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<Cell>>> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)?;
    let names = workbook.sheet_names();
    let name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| PriceMatchError::UnknownSheet {
                path: path.display().to_string(),
                sheet: wanted.to_string(),
                available: names.clone(),
            })?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| PriceMatchError::EmptySheet(path.display().to_string()))?,
    };
    debug!(path = %path.display(), sheet = %name, "reading worksheet");

    let range = workbook.worksheet_range(&name)?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect())
}

/// Read a CSV or spreadsheet file into a table with normalized headers.
/// `sheet` selects a worksheet by name; ignored for CSV.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table> {
    let grid = match SourceKind::detect(path)? {
        SourceKind::Csv => read_csv(path)?,
        SourceKind::Workbook => read_workbook(path, sheet)?,
    };
    build_table(&path.display().to_string(), grid)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn missing_columns(table: &Table, role: Role) -> Vec<String> {
    role.required_columns()
        .iter()
        .filter(|c| table.column_index(c).is_none())
        .map(|c| c.to_string())
        .collect()
}

pub fn validate(table: &Table, role: Role) -> Result<()> {
    let missing = missing_columns(table, role);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PriceMatchError::MissingColumns { role, missing })
    }
}

/// Read and validate one input. A table missing required columns is never returned.
pub fn load(path: &Path, role: Role, sheet: Option<&str>) -> Result<Table> {
    let table = read_table(path, sheet)?;
    validate(&table, role)?;
    info!(
        role = role.key(),
        path = %path.display(),
        rows = table.len(),
        columns = table.headers.len(),
        "loaded sheet"
    );
    Ok(table)
}
