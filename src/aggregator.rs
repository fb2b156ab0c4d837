use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PriceMatchError, Result};
use crate::loader::{parse_price, Role, ITEM_CODE, UNIT, UNIT_PRICE};
use crate::models::{Cell, MasterItem, Table};

/// Which row supplies `unit` when several master rows share an item code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitPolicy {
    /// First row (in file order) that has a unit, regardless of its price.
    #[default]
    First,
    /// Unit of the row that holds the minimum price.
    Cheapest,
}

impl UnitPolicy {
    pub fn key(&self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Cheapest => "cheapest",
        }
    }

    pub fn from_key(key: &str) -> Result<Self> {
        match key.trim().to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "cheapest" => Ok(Self::Cheapest),
            _ => Err(PriceMatchError::UnknownUnitPolicy(key.to_string())),
        }
    }
}

fn price_of(cell: &Cell, item_code: &str) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(s) => {
            let parsed = parse_price(s);
            if parsed.is_none() && !s.trim().is_empty() {
                warn!(item_code, value = %s, "ignoring unparseable unit price");
            }
            parsed
        }
        _ => None,
    }
}

#[derive(Default)]
struct Group {
    first_unit: Cell,
    cheapest_unit: Cell,
    min_price: Option<f64>,
    rows: usize,
}

/// Collapse the master table to one item per distinct code: minimum price,
/// unit chosen by `policy`. Rows without an item code are skipped. Output is
/// ordered by item code.
pub fn aggregate_master(master: &Table, policy: UnitPolicy) -> Result<Vec<MasterItem>> {
    let column = |name: &str| {
        master.column_index(name).ok_or_else(|| PriceMatchError::MissingColumns {
            role: Role::Master,
            missing: vec![name.to_string()],
        })
    };
    let code_col = column(ITEM_CODE)?;
    let unit_col = column(UNIT)?;
    let price_col = column(UNIT_PRICE)?;

    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    let mut skipped = 0usize;

    for row in 0..master.len() {
        let Some(code) = master.cell(row, code_col).as_key() else {
            skipped += 1;
            continue;
        };
        let unit = master.cell(row, unit_col);
        let price = price_of(master.cell(row, price_col), &code);

        let group = groups.entry(code).or_default();
        group.rows += 1;
        if group.first_unit.is_blank() && !unit.is_blank() {
            group.first_unit = unit.clone();
        }
        if let Some(p) = price {
            if group.min_price.map_or(true, |min| p < min) {
                group.min_price = Some(p);
                group.cheapest_unit = unit.clone();
            }
        }
    }

    let items: Vec<MasterItem> = groups
        .into_iter()
        .map(|(item_code, group)| {
            let unit = match policy {
                UnitPolicy::First => group.first_unit,
                UnitPolicy::Cheapest if !group.cheapest_unit.is_blank() => group.cheapest_unit,
                UnitPolicy::Cheapest => group.first_unit,
            };
            MasterItem {
                item_code,
                unit,
                unit_price: group.min_price,
                source_rows: group.rows,
            }
        })
        .collect();

    let duplicated = items.iter().filter(|i| i.source_rows > 1).count();
    info!(
        master_rows = master.len(),
        items = items.len(),
        duplicated,
        skipped_without_code = skipped,
        policy = policy.key(),
        "aggregated master"
    );
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn master(rows: &[(&str, &str, Cell)]) -> Table {
        Table::new(
            vec!["s no.".into(), "item code".into(), "unit".into(), "unit price".into()],
            rows.iter()
                .enumerate()
                .map(|(i, (code, unit, price))| {
                    vec![
                        Cell::Number((i + 1) as f64),
                        if code.is_empty() { Cell::Empty } else { Cell::from(*code) },
                        if unit.is_empty() { Cell::Empty } else { Cell::from(*unit) },
                        price.clone(),
                    ]
                })
                .collect(),
        )
    }

    fn as_table(items: &[MasterItem]) -> Table {
        Table::new(
            vec!["s no.".into(), "item code".into(), "unit".into(), "unit price".into()],
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    vec![
                        Cell::Number((i + 1) as f64),
                        Cell::from(item.item_code.as_str()),
                        item.unit.clone(),
                        Cell::from(item.unit_price),
                    ]
                })
                .collect(),
        )
    }

    #[test]
    fn test_min_price_per_code() {
        let table = master(&[
            ("A100", "pcs", Cell::Number(10.0)),
            ("A100", "pcs", Cell::Number(8.0)),
            ("B200", "kg", Cell::Number(5.0)),
        ]);
        let items = aggregate_master(&table, UnitPolicy::First).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].item_code, "A100");
        assert_eq!(items[0].unit, Cell::from("pcs"));
        assert_eq!(items[0].unit_price, Some(8.0));
        assert_eq!(items[0].source_rows, 2);
        assert_eq!(items[1].item_code, "B200");
        assert_eq!(items[1].unit, Cell::from("kg"));
        assert_eq!(items[1].unit_price, Some(5.0));
    }

    #[test]
    fn test_first_unit_wins_even_if_not_cheapest() {
        let table = master(&[
            ("A100", "box", Cell::Number(10.0)),
            ("A100", "pcs", Cell::Number(8.0)),
        ]);
        let items = aggregate_master(&table, UnitPolicy::First).unwrap();
        assert_eq!(items[0].unit, Cell::from("box"));
        assert_eq!(items[0].unit_price, Some(8.0));
    }

    #[test]
    fn test_cheapest_policy_takes_unit_from_min_row() {
        let table = master(&[
            ("A100", "box", Cell::Number(10.0)),
            ("A100", "pcs", Cell::Number(8.0)),
        ]);
        let items = aggregate_master(&table, UnitPolicy::Cheapest).unwrap();
        assert_eq!(items[0].unit, Cell::from("pcs"));
    }

    #[test]
    fn test_first_unit_skips_blanks() {
        let table = master(&[
            ("A100", "", Cell::Number(3.0)),
            ("A100", "pcs", Cell::Number(4.0)),
        ]);
        let items = aggregate_master(&table, UnitPolicy::First).unwrap();
        assert_eq!(items[0].unit, Cell::from("pcs"));
        let items = aggregate_master(&table, UnitPolicy::Cheapest).unwrap();
        assert_eq!(items[0].unit, Cell::from("pcs"));
    }

    #[test]
    fn test_missing_and_text_prices() {
        let table = master(&[
            ("A100", "pcs", Cell::Empty),
            ("A100", "pcs", Cell::from("1,250.50")),
            ("A100", "pcs", Cell::from("call us")),
            ("C300", "m", Cell::Empty),
        ]);
        let items = aggregate_master(&table, UnitPolicy::First).unwrap();
        assert_eq!(items[0].unit_price, Some(1250.5));
        assert_eq!(items[1].item_code, "C300");
        assert_eq!(items[1].unit_price, None);
    }

    #[test]
    fn test_rows_without_code_are_dropped() {
        let table = master(&[
            ("", "pcs", Cell::Number(1.0)),
            ("B200", "kg", Cell::Number(5.0)),
        ]);
        let items = aggregate_master(&table, UnitPolicy::First).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].item_code, "B200");
    }

    #[test]
    fn test_output_sorted_by_code() {
        let table = master(&[
            ("Z9", "pcs", Cell::Number(1.0)),
            ("B200", "kg", Cell::Number(5.0)),
            ("A100", "pcs", Cell::Number(2.0)),
        ]);
        let codes: Vec<String> = aggregate_master(&table, UnitPolicy::First)
            .unwrap()
            .into_iter()
            .map(|i| i.item_code)
            .collect();
        assert_eq!(codes, vec!["A100", "B200", "Z9"]);
    }

    #[test]
    fn test_aggregation_is_idempotent() {
        let table = master(&[
            ("A100", "pcs", Cell::Number(10.0)),
            ("A100", "pcs", Cell::Number(8.0)),
            ("B200", "kg", Cell::Number(5.0)),
            ("C300", "", Cell::Empty),
        ]);
        for policy in [UnitPolicy::First, UnitPolicy::Cheapest] {
            let once = aggregate_master(&table, policy).unwrap();
            let twice = aggregate_master(&as_table(&once), policy).unwrap();
            let strip = |items: Vec<MasterItem>| -> Vec<(String, Cell, Option<f64>)> {
                items.into_iter().map(|i| (i.item_code, i.unit, i.unit_price)).collect()
            };
            assert_eq!(strip(once), strip(twice));
        }
    }

    #[test]
    fn test_requires_price_column() {
        let table = Table::new(vec!["item code".into(), "unit".into()], vec![]);
        let err = aggregate_master(&table, UnitPolicy::First).unwrap_err();
        assert!(err.to_string().contains("unit price"));
    }

    #[test]
    fn test_unit_policy_keys() {
        assert_eq!(UnitPolicy::from_key("Cheapest").unwrap(), UnitPolicy::Cheapest);
        assert_eq!(UnitPolicy::from_key(UnitPolicy::First.key()).unwrap(), UnitPolicy::First);
        assert!(UnitPolicy::from_key("last").is_err());
    }
}
