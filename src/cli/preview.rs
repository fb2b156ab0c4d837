use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::fmt::{clip, price, score};
use crate::loader::UNIT_PRICE;
use crate::matcher::{MatchOutcome, MatchReport, MergeOutput};
use crate::models;

const MAX_CELL_CHARS: usize = 32;

fn display(cell: &models::Cell, is_price: bool) -> String {
    match cell {
        models::Cell::Number(n) if is_price => price(*n),
        other => clip(&other.to_string(), MAX_CELL_CHARS),
    }
}

/// Render the first `limit` merged rows plus a score column.
pub fn render(output: &MergeOutput, limit: usize) -> Table {
    let merged = &output.table;
    let price_col = merged.headers.iter().rposition(|h| h.starts_with(UNIT_PRICE));

    let mut table = Table::new();
    let mut header: Vec<String> = merged.headers.clone();
    header.push("score".to_string());
    table.set_header(header);

    for (i, row) in merged.rows.iter().take(limit).enumerate() {
        let mut cells: Vec<Cell> = row
            .iter()
            .enumerate()
            .map(|(col, c)| Cell::new(display(c, Some(col) == price_col)))
            .collect();
        let outcome = output.outcomes.get(i);
        let score_cell = match (outcome, outcome.and_then(MatchOutcome::best_score)) {
            (Some(MatchOutcome::Matched { .. }), Some(s)) => Cell::new(score(s).green()),
            (_, Some(s)) => Cell::new(score(s).red()),
            (_, None) => Cell::new("-".dimmed()),
        };
        cells.push(score_cell);
        table.add_row(cells);
    }
    table
}

pub fn summary(report: &MatchReport, master_items: usize) -> String {
    let matched = format!("{} matched", report.matched).green().bold();
    let no_match = if report.no_match > 0 {
        format!("{} below threshold", report.no_match).red()
    } else {
        format!("{} below threshold", report.no_match).normal()
    };
    let missing = if report.missing_key > 0 {
        format!("{} missing item code", report.missing_key).yellow()
    } else {
        format!("{} missing item code", report.missing_key).normal()
    };
    format!(
        "{} rows against {} master items: {matched}, {no_match}, {missing}",
        report.total, master_items
    )
}
