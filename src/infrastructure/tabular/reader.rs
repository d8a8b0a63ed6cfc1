// ============================================================
// TABULAR READER
// ============================================================
// Load CSV and spreadsheet files into a typed, column-oriented Table

use super::format::TabularFormat;
use crate::domain::error::{AppError, Result};
use crate::domain::table::{Column, Table};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;

/// Cell contents treated as missing, matching common dataframe defaults.
const DEFAULT_NULL_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Reads delimited text and spreadsheets. The first row is always the
/// header; a column is numeric when every present value parses as a
/// finite number.
#[derive(Debug, Clone)]
pub struct TabularReader {
    null_markers: HashSet<String>,
}

impl Default for TabularReader {
    fn default() -> Self {
        Self {
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TabularReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path`, choosing the parser from `filename`'s extension.
    pub fn read(&self, path: &Path, filename: &str) -> Result<Table> {
        let format = TabularFormat::from_filename(filename)?;

        if !path.is_file() {
            return Err(AppError::NotFound(format!(
                "file '{}' does not exist",
                path.display()
            )));
        }

        match format {
            TabularFormat::Csv => {
                let bytes = std::fs::read(path)?;
                self.parse_csv(&bytes)
            }
            TabularFormat::Xlsx | TabularFormat::Xls => self.read_spreadsheet(path),
        }
    }

    /// Parse CSV bytes. UTF-8 (with or without BOM) is expected; anything
    /// else is decoded as Windows-1252.
    pub fn parse_csv(&self, bytes: &[u8]) -> Result<Table> {
        let content = decode_text(bytes);

        let mut reader = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .iter()
            .map(|h| h.to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Err(AppError::ParseError(
                "No columns to parse from file".to_string(),
            ));
        }

        let n_cols = headers.len();
        let mut rows: Vec<Vec<Option<String>>> = Vec::new();

        for result in reader.records() {
            let record = result
                .map_err(|e| AppError::ParseError(format!("Failed to parse CSV row: {}", e)))?;

            if record.len() == 1 && record[0].trim().is_empty() && n_cols > 1 {
                continue;
            }

            if record.len() > n_cols {
                let line = record.position().map(|p| p.line()).unwrap_or(0);
                return Err(AppError::ParseError(format!(
                    "Expected {} fields in line {}, saw {}",
                    n_cols,
                    line,
                    record.len()
                )));
            }

            let mut row: Vec<Option<String>> =
                record.iter().map(|field| self.normalize(field)).collect();
            row.resize(n_cols, None);
            rows.push(row);
        }

        build_table(headers, rows)
    }

    fn read_spreadsheet(&self, path: &Path) -> Result<Table> {
        let mut workbook = open_workbook_auto(path).map_err(|e| {
            AppError::ParseError(format!("Failed to open spreadsheet: {}", e))
        })?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| AppError::ParseError("No worksheet found".to_string()))?
            .map_err(|e| AppError::ParseError(format!("Failed to read worksheet: {}", e)))?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| self.cell_text(cell).unwrap_or_default())
                .collect(),
            None => {
                return Err(AppError::ParseError(
                    "No columns to parse from file".to_string(),
                ))
            }
        };

        let n_cols = headers.len();
        let rows: Vec<Vec<Option<String>>> = rows
            .map(|row| {
                let mut values: Vec<Option<String>> =
                    row.iter().map(|cell| self.cell_text(cell)).collect();
                values.resize(n_cols, None);
                values
            })
            .collect();

        build_table(headers, rows)
    }

    fn cell_text(&self, cell: &Data) -> Option<String> {
        match cell {
            Data::Empty | Data::Error(_) => None,
            Data::String(s) => self.normalize(s),
            Data::DateTime(dt) => dt.as_datetime().map(|d| d.to_string()),
            other => Some(other.to_string()),
        }
    }

    fn normalize(&self, raw: &str) -> Option<String> {
        if self.null_markers.contains(raw) {
            None
        } else {
            Some(raw.to_string())
        }
    }
}

fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(content) => content.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Only finite numbers count. `inf`, `-inf` or an overflowing `1e400`
/// make the column text, so every numeric column has finite statistics.
fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Blank headers become `Unnamed: <idx>`; repeats get a `.N` suffix.
fn unique_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(headers.len());

    for (idx, header) in headers.into_iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            header
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(name.clone());
        out.push(name);
    }

    out
}

fn build_table(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Table> {
    let headers = unique_headers(headers);
    let n_rows = rows.len();

    let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(n_rows); headers.len()];
    for row in rows {
        for (col_idx, value) in row.into_iter().enumerate() {
            raw_columns[col_idx].push(value);
        }
    }

    let columns = headers
        .into_iter()
        .zip(raw_columns)
        .map(|(name, values)| infer_column(name, values))
        .collect();

    Table::new(columns)
}

fn infer_column(name: String, values: Vec<Option<String>>) -> Column {
    if values.is_empty() {
        return Column::text(name, values);
    }

    let parsed: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|value| match value {
            None => Some(None),
            Some(raw) => parse_number(raw).map(Some),
        })
        .collect();

    match parsed {
        Some(numbers) => Column::numeric(name, numbers),
        None => Column::text(name, values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::ColumnData;

    #[test]
    fn test_infers_numeric_and_text_columns() {
        let csv = "name,age,score\nAlice,30,1.5\nBob,,2\nCarol,41,NA\n";
        let table = TabularReader::new().parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_count(), 3);
        assert!(!table.column("name").unwrap().data.is_numeric());
        assert_eq!(
            table.column("age").unwrap().data,
            ColumnData::Numeric(vec![Some(30.0), None, Some(41.0)])
        );
        assert_eq!(
            table.column("score").unwrap().data,
            ColumnData::Numeric(vec![Some(1.5), Some(2.0), None])
        );
    }

    #[test]
    fn test_single_non_number_makes_column_text() {
        let csv = "v\n1\n2\nthree\n";
        let table = TabularReader::new().parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(
            table.column("v").unwrap().data,
            ColumnData::Text(vec![
                Some("1".to_string()),
                Some("2".to_string()),
                Some("three".to_string())
            ])
        );
    }

    #[test]
    fn test_all_missing_column_is_numeric() {
        let csv = "a,b\n1,\n2,\n";
        let table = TabularReader::new().parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(
            table.column("b").unwrap().data,
            ColumnData::Numeric(vec![None, None])
        );
    }

    #[test]
    fn test_short_rows_are_padded_and_long_rows_fail() {
        let table = TabularReader::new()
            .parse_csv(b"a,b,c\n1,2\n")
            .unwrap();
        assert_eq!(table.row(0).len(), 3);
        assert_eq!(table.column("c").unwrap().data.null_count(), 1);

        let err = TabularReader::new().parse_csv(b"a,b\n1,2,3\n").unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_empty_input_is_parse_error() {
        assert!(matches!(
            TabularReader::new().parse_csv(b""),
            Err(AppError::ParseError(_))
        ));
    }

    #[test]
    fn test_header_only_has_zero_rows() {
        let table = TabularReader::new().parse_csv(b"a,b\n").unwrap();
        assert_eq!(table.row_count(), 0);
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.numeric_columns().count(), 0);
    }

    #[test]
    fn test_duplicate_and_blank_headers() {
        let table = TabularReader::new().parse_csv(b"a,a,\n1,2,3\n").unwrap();
        let names: Vec<&str> = table.columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "a.1", "Unnamed: 2"]);
    }

    #[test]
    fn test_bom_and_latin1_input() {
        let table = TabularReader::new()
            .parse_csv(b"\xEF\xBB\xBFcity\nZ\xfcrich\n")
            .unwrap();
        assert_eq!(table.columns()[0].name, "city");
        assert_eq!(
            table.column("city").unwrap().data,
            ColumnData::Text(vec![Some("Zürich".to_string())])
        );
    }

    #[test]
    fn test_read_rejects_unsupported_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let reader = TabularReader::new();

        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, "a\n1\n").unwrap();
        assert!(matches!(
            reader.read(&txt, "notes.txt"),
            Err(AppError::UnsupportedFormat(_))
        ));

        let missing = dir.path().join("missing.csv");
        assert!(matches!(
            reader.read(&missing, "missing.csv"),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_read_csv_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(&path, "x,y\n1,2\n3,4\n").unwrap();

        let table = TabularReader::new().read(&path, "data.csv").unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.numeric_columns().count(), 2);
    }

    #[test]
    fn test_non_finite_values_make_column_text() {
        let table = TabularReader::new()
            .parse_csv(b"a,b,c\n1,inf,1\n2,-inf,1e400\n")
            .unwrap();
        assert!(table.column("a").unwrap().data.is_numeric());
        assert!(!table.column("b").unwrap().data.is_numeric());
        assert!(!table.column("c").unwrap().data.is_numeric());
    }
}
