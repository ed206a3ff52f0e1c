// src/parse/columns.rs
// Logical table columns, located once per document from the header line.

use crate::error::{MenuError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    /// Char column of the header name in the header line.
    pub offset: usize,
    pub name: String,
    /// Position of the name in the fixed header list.
    pub id: usize,
}

/// Non-empty column set, ordered by offset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Columns(Vec<Column>);

impl Columns {
    pub fn new(mut cols: Vec<Column>) -> Option<Self> {
        if cols.is_empty() {
            return None;
        }
        cols.sort_by_key(|c| c.offset);
        Some(Self(cols))
    }

    /// Find every name in the header line; ids follow the order of `names`.
    pub fn locate(header_line: &str, names: &[&str]) -> Result<Self> {
        let mut cols = Vec::with_capacity(names.len());
        for (id, name) in names.iter().enumerate() {
            let byte = header_line.find(name).ok_or_else(|| {
                MenuError::format(format!("column {name:?} missing from header line"))
            })?;
            let offset = header_line[..byte].chars().count();
            cols.push(Column { offset, name: name.to_string(), id });
        }
        Self::new(cols).ok_or_else(|| MenuError::format("no header columns configured"))
    }

    /// Column closest to `offset`; ties go to the column further left.
    pub fn nearest(&self, offset: usize) -> &Column {
        self.0
            .iter()
            .min_by_key(|c| offset.abs_diff(c.offset))
            .unwrap_or(&self.0[0])
    }

    pub fn by_id(&self, id: usize) -> Option<&Column> {
        self.0.iter().find(|c| c.id == id)
    }

    pub fn as_slice(&self) -> &[Column] {
        &self.0
    }
}
