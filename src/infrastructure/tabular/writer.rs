use super::format::TabularFormat;
use crate::domain::error::{AppError, Result};
use crate::domain::table::{Cell, Table};
use csv::Writer;
use rust_xlsxwriter::Workbook;
use std::path::Path;

/// Serialises a [`Table`] back to disk. The format follows `path`'s
/// extension; `.xls` cannot be written and must be redirected to `.xlsx`
/// by the caller.
pub struct TableWriter;

impl TableWriter {
    pub fn write(table: &Table, path: &Path) -> Result<()> {
        match TabularFormat::from_path(path)? {
            TabularFormat::Csv => Self::write_csv(table, path),
            TabularFormat::Xlsx => Self::write_xlsx(table, path),
            TabularFormat::Xls => Err(AppError::UnsupportedFormat(
                "writing legacy .xls workbooks is not supported".to_string(),
            )),
        }
    }

    fn write_csv(table: &Table, path: &Path) -> Result<()> {
        let mut writer = Writer::from_path(path)
            .map_err(|e| AppError::IoError(format!("Failed to create CSV file: {}", e)))?;

        writer
            .write_record(table.columns().iter().map(|c| c.name.as_str()))
            .map_err(|e| AppError::IoError(format!("Failed to write CSV header: {}", e)))?;

        for idx in 0..table.row_count() {
            let record: Vec<String> = table.row(idx).into_iter().map(cell_to_string).collect();
            writer
                .write_record(&record)
                .map_err(|e| AppError::IoError(format!("Failed to write CSV row: {}", e)))?;
        }

        writer.flush()?;
        Ok(())
    }

    fn write_xlsx(table: &Table, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (col_idx, column) in table.columns().iter().enumerate() {
            let col = xlsx_col(col_idx)?;
            worksheet
                .write_string(0, col, column.name.as_str())
                .map_err(xlsx_err)?;

            for row_idx in 0..table.row_count() {
                let row = xlsx_row(row_idx + 1)?;
                match column.data.cell(row_idx) {
                    Cell::Missing => {}
                    Cell::Number(value) => {
                        worksheet.write_number(row, col, value).map_err(xlsx_err)?;
                    }
                    Cell::Text(value) => {
                        worksheet.write_string(row, col, value).map_err(xlsx_err)?;
                    }
                }
            }
        }

        workbook.save(path).map_err(xlsx_err)
    }
}

fn cell_to_string(cell: Cell<'_>) -> String {
    match cell {
        Cell::Missing => String::new(),
        Cell::Number(value) => value.to_string(),
        Cell::Text(value) => value.to_string(),
    }
}

fn xlsx_err(err: rust_xlsxwriter::XlsxError) -> AppError {
    AppError::IoError(format!("Failed to write spreadsheet: {}", err))
}

fn xlsx_col(idx: usize) -> Result<u16> {
    u16::try_from(idx)
        .map_err(|_| AppError::IoError(format!("column index {} exceeds spreadsheet limits", idx)))
}

fn xlsx_row(idx: usize) -> Result<u32> {
    u32::try_from(idx)
        .map_err(|_| AppError::IoError(format!("row index {} exceeds spreadsheet limits", idx)))
}
