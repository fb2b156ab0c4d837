use thiserror::Error;

use crate::loader::Role;

#[derive(Error, Debug)]
pub enum PriceMatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("{role} sheet is missing required columns: {} (expected: {})", .missing.join(", "), .role.required_columns().join(", "))]
    MissingColumns { role: Role, missing: Vec<String> },

    #[error("Unsupported file format: {0} (expected .xlsx, .xls, .xlsb, .ods or .csv)")]
    UnsupportedFormat(String),

    #[error("No data found in {0}")]
    EmptySheet(String),

    #[error("Unknown sheet '{sheet}' in {path} (available: {})", .available.join(", "))]
    UnknownSheet {
        path: String,
        sheet: String,
        available: Vec<String>,
    },

    #[error("Unknown scorer: {0} (expected one of: token-sort, ratio, levenshtein, jaro-winkler)")]
    UnknownScorer(String),

    #[error("Unknown unit policy: {0} (expected first or cheapest)")]
    UnknownUnitPolicy(String),

    #[error("Unknown role: {0} (expected master or raw)")]
    UnknownRole(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, PriceMatchError>;
