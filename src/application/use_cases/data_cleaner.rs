use super::statistics::{mean, median};
use crate::domain::cleaning::{CleaningOptions, CleaningResult, FillStrategy, TEXT_FILL_VALUE};
use crate::domain::table::{ColumnData, Table};
use std::collections::HashSet;

/// De-duplicates rows and fills missing cells. Works on a copy; the input
/// table is never modified.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataCleaner;

impl DataCleaner {
    pub fn new() -> Self {
        Self
    }

    pub fn clean(&self, table: &Table, options: &CleaningOptions) -> (Table, CleaningResult) {
        let original_records = table.row_count();

        let mut cleaned = if options.remove_duplicates {
            drop_duplicates(table)
        } else {
            table.clone()
        };

        if options.fill_missing {
            fill_missing(&mut cleaned, options.fill_strategy);
        }

        let cleaned_records = cleaned.row_count();
        let result = CleaningResult {
            original_records,
            cleaned_records,
            duplicates_removed: if options.remove_duplicates {
                original_records - cleaned_records
            } else {
                0
            },
            missing_values_filled: options.fill_missing,
        };

        (cleaned, result)
    }
}

/// Keep the first occurrence of every distinct row, preserving order.
pub fn drop_duplicates(table: &Table) -> Table {
    let mut seen = HashSet::with_capacity(table.row_count());
    let keep: Vec<usize> = (0..table.row_count())
        .filter(|&idx| seen.insert(table.row(idx)))
        .collect();
    table.select_rows(&keep)
}

/// Numeric columns get the strategy's value computed from the column's
/// current present values; a column with nothing present stays missing.
/// Text columns always get [`TEXT_FILL_VALUE`].
pub fn fill_missing(table: &mut Table, strategy: FillStrategy) {
    for column in table.columns_mut() {
        match &mut column.data {
            ColumnData::Numeric(values) => {
                let present: Vec<f64> = values.iter().flatten().copied().collect();
                let replacement = match strategy {
                    FillStrategy::Mean => mean(&present),
                    FillStrategy::Median => median(&present),
                    FillStrategy::Zero => Some(0.0),
                };
                if let Some(replacement) = replacement {
                    for value in values.iter_mut().filter(|v| v.is_none()) {
                        *value = Some(replacement);
                    }
                }
            }
            ColumnData::Text(values) => {
                for value in values.iter_mut().filter(|v| v.is_none()) {
                    *value = Some(TEXT_FILL_VALUE.to_string());
                }
            }
        }
    }
}
