// src/parse/dishes.rs
// Folds the tokens of each row block into per-cell dishes (text channel).
//
// Titles overwrite, descriptions append with ", ", the nutrition line sets Kcal.
// Only cells with a nutrition value are emitted: that drops stray non-table text
// such as a "Tageskarte" line that has no nutrition entry under it.

use std::collections::BTreeMap;

use chrono::Days;

use crate::config::consts::TOKEN_GAP;
use crate::engine::types::{CellKey, Dish, TextTable};
use crate::error::{MenuError, Result};
use crate::parse::rows::{self, Layout, RowBlock};
use crate::parse::tokens::tokenize;

#[derive(Default)]
struct Cell {
    title: String,
    description: String,
    kcal: String,
}

impl Cell {
    fn push_description(&mut self, part: &str) {
        if !self.description.is_empty() {
            self.description.push_str(", ");
        }
        self.description.push_str(part);
        self.description = self.description.trim_matches([' ', ',']).to_string();
    }
}

/// Text channel of one document: layout text → dishes keyed by cell, no prices.
pub fn text_table(text: &str, year: i32) -> Result<TextTable> {
    let layout = rows::segment(text, year)?;
    assemble(&layout)
}

pub fn assemble(layout: &Layout<'_>) -> Result<TextTable> {
    let mut table = TextTable::new();
    for block in &layout.blocks {
        let date = layout
            .anchor
            .checked_add_days(Days::new(block.row as u64))
            .ok_or_else(|| MenuError::format(format!("row {} overflows the calendar", block.row)))?;

        for (col, cell) in fold_block(layout, block) {
            if cell.kcal.is_empty() {
                continue;
            }
            let Some(column) = layout.columns.by_id(col) else { continue };
            table.insert(
                CellKey { row: block.row, col },
                Dish {
                    title: cell.title,
                    description: cell.description,
                    price: String::new(),
                    kcal: cell.kcal,
                    kind: column.name.clone(),
                    date,
                },
            );
        }
    }
    Ok(table)
}

fn fold_block(layout: &Layout<'_>, block: &RowBlock<'_>) -> BTreeMap<usize, Cell> {
    let cols = &layout.columns;
    let mut cells: BTreeMap<usize, Cell> = BTreeMap::new();

    for t in tokenize(block.titles, TOKEN_GAP) {
        cells.entry(cols.nearest(t.offset).id).or_default().title = t.value;
    }
    for line in &block.descriptions {
        for t in tokenize(line, TOKEN_GAP) {
            cells.entry(cols.nearest(t.offset).id).or_default().push_description(&t.value);
        }
    }
    for t in tokenize(block.nutrition, TOKEN_GAP) {
        cells.entry(cols.nearest(t.offset).id).or_default().kcal = t.value;
    }
    cells
}
