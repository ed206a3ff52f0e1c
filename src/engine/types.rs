// src/engine/types.rs
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One dish served on one day. This is the record handed to callers; the
/// table coordinates it was parsed from are carried separately as `CellKey`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dish {
    pub title: String,
    pub description: String,
    pub price: String,
    /// Nutrition string, e.g. `kcal 528 / kJ 2212`.
    pub kcal: String,
    /// Column name, e.g. `Wok Station`.
    #[serde(rename = "Type")]
    pub kind: String,
    pub date: NaiveDate,
}

impl fmt::Display for Dish {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Type: {} Title={} Description={} Price={} Kcal={}",
            self.kind, self.title, self.description, self.price, self.kcal
        )
    }
}

/// Table cell coordinate: row = day offset in the week, col = logical column id.
/// Ordering is row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub row: usize,
    pub col: usize,
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Price and nutrition read from one recognized tile.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriceFragment {
    pub price: String,
    pub nutrition: String,
}

/// Text channel output: dishes without prices.
pub type TextTable = BTreeMap<CellKey, Dish>;

/// Image channel output: one fragment per recognized tile.
pub type PriceTable = HashMap<CellKey, PriceFragment>;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub matched: usize,
    /// Dishes kept with an empty price because no tile carried their key.
    pub unmatched: Vec<CellKey>,
}

impl MergeReport {
    pub fn unmatched_count(&self) -> usize {
        self.unmatched.len()
    }
}

/// Everything one document yields.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    pub dishes: Vec<Dish>,
    pub report: MergeReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dish() -> Dish {
        Dish {
            title: "Pasta-Pfanne".into(),
            description: "mit Hähnchenfleisch".into(),
            price: "€ 4,80 / € 6,00".into(),
            kcal: "kcal 528 / kJ 2212".into(),
            kind: "Wok Station".into(),
            date: NaiveDate::from_ymd_opt(2020, 11, 16).unwrap(),
        }
    }

    #[test]
    fn serializes_public_fields_only() {
        let v = serde_json::to_value(dish()).unwrap();
        let obj = v.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["Date", "Description", "Kcal", "Price", "Title", "Type"]);
        assert_eq!(obj["Date"], "2020-11-16");
        assert_eq!(obj["Type"], "Wok Station");
    }

    #[test]
    fn display_matches_cli_format() {
        assert_eq!(
            dish().to_string(),
            "Type: Wok Station Title=Pasta-Pfanne Description=mit Hähnchenfleisch Price=€ 4,80 / € 6,00 Kcal=kcal 528 / kJ 2212"
        );
    }

    #[test]
    fn cell_keys_sort_row_major() {
        let mut keys = vec![CellKey { row: 1, col: 0 }, CellKey { row: 0, col: 3 }, CellKey { row: 0, col: 1 }];
        keys.sort();
        assert_eq!(keys, vec![CellKey { row: 0, col: 1 }, CellKey { row: 0, col: 3 }, CellKey { row: 1, col: 0 }]);
    }
}
