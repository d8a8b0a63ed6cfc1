use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Report key holding the correlation map.
pub const CORRELATION_KEY: &str = "correlation";

/// Summary of one numeric column. Every reduction ignores missing cells;
/// a reduction with no defined value (e.g. std of one value) is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatistics {
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub count: usize,
}

/// Pearson coefficient for an unordered pair of distinct numeric columns.
/// `left` precedes `right` in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationEntry {
    pub left: String,
    pub right: String,
    pub coefficient: Option<f64>,
}

impl CorrelationEntry {
    pub const PAIR_SEPARATOR: char = '|';

    /// Stable identifier for the pair, e.g. `age|income`. A `|` or `\`
    /// inside a column name is escaped with `\`, so `a|b` + `c` gives
    /// `a\|b|c` and stays distinct from `a` + `b|c`.
    pub fn key(&self) -> String {
        format!(
            "{}{}{}",
            escape_pair_part(&self.left),
            Self::PAIR_SEPARATOR,
            escape_pair_part(&self.right)
        )
    }
}

fn escape_pair_part(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch == '\\' || ch == CorrelationEntry::PAIR_SEPARATOR {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Per-column summaries plus the correlation map.
///
/// Serialises as a single JSON object: one key per numeric column (in
/// table order) and, when at least two numeric columns exist, a
/// `correlation` object keyed by [`CorrelationEntry::key`]. Column names
/// never equal [`CORRELATION_KEY`]; the engine renames such a column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatisticsReport {
    pub columns: Vec<(String, ColumnStatistics)>,
    pub correlation: Option<Vec<CorrelationEntry>>,
}

impl StatisticsReport {
    pub fn column(&self, name: &str) -> Option<&ColumnStatistics> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, stats)| stats)
    }

    #[cfg(test)]
    pub fn correlation_between(&self, left: &str, right: &str) -> Option<&CorrelationEntry> {
        self.correlation.as_ref()?.iter().find(|entry| {
            (entry.left == left && entry.right == right)
                || (entry.left == right && entry.right == left)
        })
    }
}

struct CorrelationMap<'a>(&'a [CorrelationEntry]);

impl Serialize for CorrelationMap<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(&entry.key(), &entry.coefficient)?;
        }
        map.end()
    }
}

impl Serialize for StatisticsReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.columns.len() + usize::from(self.correlation.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (name, stats) in &self.columns {
            map.serialize_entry(name, stats)?;
        }
        if let Some(entries) = &self.correlation {
            map.serialize_entry(CORRELATION_KEY, &CorrelationMap(entries))?;
        }
        map.end()
    }
}
