use super::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Replacement for missing values in numeric columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillStrategy {
    #[default]
    Mean,
    Median,
    Zero,
}

impl FillStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillStrategy::Mean => "mean",
            FillStrategy::Median => "median",
            FillStrategy::Zero => "zero",
        }
    }
}

impl fmt::Display for FillStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FillStrategy {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "mean" => Ok(FillStrategy::Mean),
            "median" => Ok(FillStrategy::Median),
            "zero" => Ok(FillStrategy::Zero),
            other => Err(AppError::InvalidArgument(format!(
                "unsupported fill_strategy '{}' (expected mean, median or zero)",
                other
            ))),
        }
    }
}

/// Text placed in missing cells of non-numeric columns.
pub const TEXT_FILL_VALUE: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningOptions {
    pub remove_duplicates: bool,
    pub fill_missing: bool,
    pub fill_strategy: FillStrategy,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            remove_duplicates: true,
            fill_missing: true,
            fill_strategy: FillStrategy::Mean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningResult {
    pub original_records: usize,
    pub cleaned_records: usize,
    pub duplicates_removed: usize,
    pub missing_values_filled: bool,
}
