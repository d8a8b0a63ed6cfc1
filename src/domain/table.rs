// ============================================================
// TABLE TYPES
// ============================================================
// Column-oriented in-memory table with explicit missing values

use super::error::{AppError, Result};
use std::hash::{Hash, Hasher};

/// Values of a single column. Every column is homogeneous: either all
/// present values are numbers, or the column is treated as text.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Text(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Numeric(_))
    }

    /// Number of missing cells
    pub fn null_count(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.iter().filter(|v| v.is_none()).count(),
            ColumnData::Text(values) => values.iter().filter(|v| v.is_none()).count(),
        }
    }

    pub fn cell(&self, row: usize) -> Cell<'_> {
        match self {
            ColumnData::Numeric(values) => match values[row] {
                Some(value) => Cell::Number(value),
                None => Cell::Missing,
            },
            ColumnData::Text(values) => match &values[row] {
                Some(value) => Cell::Text(value.as_str()),
                None => Cell::Missing,
            },
        }
    }

    fn take(&self, rows: &[usize]) -> ColumnData {
        match self {
            ColumnData::Numeric(values) => {
                ColumnData::Numeric(rows.iter().map(|&idx| values[idx]).collect())
            }
            ColumnData::Text(values) => {
                ColumnData::Text(rows.iter().map(|&idx| values[idx].clone()).collect())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }
}

/// A borrowed view of one cell. Equality and hashing treat two missing
/// cells as equal and compare numbers by value, so rows can be used as
/// set keys during de-duplication.
#[derive(Debug, Clone, Copy)]
pub enum Cell<'a> {
    Missing,
    Number(f64),
    Text(&'a str),
}

impl Cell<'_> {
    fn number_bits(value: f64) -> u64 {
        // -0.0 == 0.0
        if value == 0.0 {
            0.0f64.to_bits()
        } else {
            value.to_bits()
        }
    }
}

impl PartialEq for Cell<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Cell::Missing, Cell::Missing) => true,
            (Cell::Number(a), Cell::Number(b)) => Self::number_bits(*a) == Self::number_bits(*b),
            (Cell::Text(a), Cell::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Cell<'_> {}

impl Hash for Cell<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Cell::Missing => 0u8.hash(state),
            Cell::Number(value) => {
                1u8.hash(state);
                Self::number_bits(*value).hash(state);
            }
            Cell::Text(value) => {
                2u8.hash(state);
                value.hash(state);
            }
        }
    }
}

/// Ordered, named columns of equal length.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(|c| c.data.len()).unwrap_or(0);
        if let Some(bad) = columns.iter().find(|c| c.data.len() != row_count) {
            return Err(AppError::ParseError(format!(
                "column '{}' has {} rows, expected {}",
                bad.name,
                bad.data.len(),
                row_count
            )));
        }
        Ok(Self { columns, row_count })
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn numeric_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.data.is_numeric())
    }

    pub fn row(&self, idx: usize) -> Vec<Cell<'_>> {
        self.columns.iter().map(|c| c.data.cell(idx)).collect()
    }

    /// New table holding only the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.take(rows),
                })
                .collect(),
            row_count: rows.len(),
        }
    }
}
