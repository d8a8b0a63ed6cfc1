use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

/// Metadata of an uploaded file. `filename` is the sanitised name on disk,
/// `original_filename` is what the client sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFile {
    pub id: i64,
    pub filename: String,
    pub original_filename: String,
    pub file_size: i64,
    pub upload_date: DateTime<Utc>,
    pub records_count: Option<i64>,
}

#[derive(Debug, Clone, Validate)]
pub struct NewDataFile {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    #[validate(length(min = 1, max = 255))]
    pub original_filename: String,
    #[validate(range(min = 0))]
    pub file_size: i64,
    #[validate(range(min = 0))]
    pub records_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    Statistics,
    Cleaning,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Statistics => "statistics",
            AnalysisType::Cleaning => "cleaning",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct NewDataAnalysis {
    pub data_file_id: i64,
    pub analysis_type: AnalysisType,
    pub parameters: Option<serde_json::Value>,
    pub results: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataAnalysis {
    pub id: i64,
    pub data_file_id: i64,
    pub analysis_type: String,
    pub parameters: Option<serde_json::Value>,
    pub results: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
