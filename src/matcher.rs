use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{PriceMatchError, Result};
use crate::fuzzy::{best_match, ScorerKind};
use crate::loader::{Role, ITEM_CODE, UNIT, UNIT_PRICE};
use crate::models::{Cell, MasterItem, Table};

pub const MATCHED_CODE: &str = "matched_code";
pub const DEFAULT_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    /// Minimum score (0-100) a candidate needs to count as a match.
    pub threshold: f64,
    pub scorer: ScorerKind,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            scorer: ScorerKind::default(),
        }
    }
}

/// Result of matching one raw item code.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Raw item code was empty; nothing was scored.
    MissingKey,
    /// Best candidate scored below the threshold (or there were no candidates).
    NoMatch { best: Option<(String, f64)> },
    Matched { code: String, score: f64 },
}

impl MatchOutcome {
    pub fn matched_code(&self) -> Option<&str> {
        match self {
            Self::Matched { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn best_score(&self) -> Option<f64> {
        match self {
            Self::MissingKey => None,
            Self::NoMatch { best } => best.as_ref().map(|(_, s)| *s),
            Self::Matched { score, .. } => Some(*score),
        }
    }
}

pub fn match_code(raw: &Cell, candidates: &[String], options: &MatchOptions) -> MatchOutcome {
    let Some(query) = raw.as_key() else {
        return MatchOutcome::MissingKey;
    };
    match best_match(&query, candidates, options.scorer) {
        Some(best) if best.score >= options.threshold => MatchOutcome::Matched {
            code: best.code.to_string(),
            score: best.score,
        },
        best => MatchOutcome::NoMatch {
            best: best.map(|b| (b.code.to_string(), b.score)),
        },
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchReport {
    pub total: usize,
    pub matched: usize,
    pub missing_key: usize,
    pub no_match: usize,
}

impl MatchReport {
    fn tally(outcomes: &[MatchOutcome]) -> Self {
        let mut report = Self {
            total: outcomes.len(),
            ..Self::default()
        };
        for outcome in outcomes {
            match outcome {
                MatchOutcome::MissingKey => report.missing_key += 1,
                MatchOutcome::NoMatch { .. } => report.no_match += 1,
                MatchOutcome::Matched { .. } => report.matched += 1,
            }
        }
        report
    }
}

#[derive(Debug)]
pub struct MergeOutput {
    /// Raw columns followed by `matched_code`, `unit`, `unit price`.
    pub table: Table,
    /// One outcome per raw row, in raw row order.
    pub outcomes: Vec<MatchOutcome>,
    pub report: MatchReport,
}

/// Output headers for the merged table plus the positions of the three
/// appended columns. A raw `matched_code` column is overwritten in place;
/// raw `unit`/`unit price` columns get an `_x` suffix and the merged ones `_y`.
fn merged_headers(raw_headers: &[String]) -> (Vec<String>, usize, usize, usize) {
    let clashes = |name: &str| raw_headers.iter().any(|h| h == name);
    let mut headers: Vec<String> = raw_headers
        .iter()
        .map(|h| {
            if h == UNIT || h == UNIT_PRICE {
                format!("{h}_x")
            } else {
                h.clone()
            }
        })
        .collect();

    let matched_col = match headers.iter().position(|h| h == MATCHED_CODE) {
        Some(i) => i,
        None => {
            headers.push(MATCHED_CODE.to_string());
            headers.len() - 1
        }
    };
    let mut append = |name: &str| {
        headers.push(if clashes(name) { format!("{name}_y") } else { name.to_string() });
        headers.len() - 1
    };
    let unit_col = append(UNIT);
    let price_col = append(UNIT_PRICE);
    (headers, matched_col, unit_col, price_col)
}

/// Match every raw row against the aggregated master items and left-join
/// unit and unit price by matched code. Row count and order follow `raw`.
pub fn match_and_merge(raw: &Table, master: &[MasterItem], options: &MatchOptions) -> Result<MergeOutput> {
    let code_col = raw.column_index(ITEM_CODE).ok_or_else(|| PriceMatchError::MissingColumns {
        role: Role::Raw,
        missing: vec![ITEM_CODE.to_string()],
    })?;

    let candidates: Vec<String> = master.iter().map(|m| m.item_code.clone()).collect();
    let by_code: HashMap<&str, &MasterItem> =
        master.iter().map(|m| (m.item_code.as_str(), m)).collect();

    let (headers, matched_col, unit_col, price_col) = merged_headers(&raw.headers);

    let mut outcomes = Vec::with_capacity(raw.len());
    let mut rows = Vec::with_capacity(raw.len());
    for (i, raw_row) in raw.rows.iter().enumerate() {
        let outcome = match_code(raw.cell(i, code_col), &candidates, options);
        debug!(row = i + 1, outcome = ?outcome, "matched row");

        let item = outcome.matched_code().and_then(|code| by_code.get(code).copied());
        let mut row = raw_row.clone();
        row.resize(headers.len(), Cell::Empty);
        row[matched_col] = outcome.matched_code().map(Cell::from).unwrap_or_default();
        row[unit_col] = item.map(|m| m.unit.clone()).unwrap_or_default();
        row[price_col] = Cell::from(item.and_then(|m| m.unit_price));

        rows.push(row);
        outcomes.push(outcome);
    }

    let report = MatchReport::tally(&outcomes);
    info!(
        rows = report.total,
        matched = report.matched,
        missing_key = report.missing_key,
        no_match = report.no_match,
        threshold = options.threshold,
        scorer = options.scorer.key(),
        "matched raw rows"
    );

    Ok(MergeOutput {
        table: Table::new(headers, rows),
        outcomes,
        report,
    })
}
