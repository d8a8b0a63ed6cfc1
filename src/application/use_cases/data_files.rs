use super::data_cleaner::DataCleaner;
use super::statistics::StatisticsEngine;
use crate::domain::cleaning::{CleaningOptions, CleaningResult};
use crate::domain::data_file::{AnalysisType, DataFile, NewDataAnalysis, NewDataFile};
use crate::domain::error::{AppError, Result};
use crate::domain::statistics::StatisticsReport;
use crate::domain::table::Table;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::AnalyticsRepository;
use crate::infrastructure::storage::{secure_filename, UploadStore};
use crate::infrastructure::tabular::TabularReader;
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct StatisticsOutcome {
    pub file: DataFile,
    pub statistics: StatisticsReport,
}

#[derive(Debug)]
pub struct CleaningOutcome {
    pub file: DataFile,
    pub result: CleaningResult,
    pub cleaned_file: String,
}

/// Request-level operations on uploaded files. Lookups and file work run
/// outside the database transaction; the writes of each operation share one
/// [`AnalyticsTx`](crate::infrastructure::db::AnalyticsTx), and an early return drops it and rolls it back.
pub struct DataFileUseCase {
    config: Arc<AppConfig>,
    repository: AnalyticsRepository,
    store: UploadStore,
    reader: TabularReader,
    statistics: StatisticsEngine,
    cleaner: DataCleaner,
}

impl DataFileUseCase {
    pub fn new(config: Arc<AppConfig>, repository: AnalyticsRepository) -> Self {
        let store = UploadStore::new(config.upload_folder.clone());
        Self {
            config,
            repository,
            store,
            reader: TabularReader::new(),
            statistics: StatisticsEngine::new(),
            cleaner: DataCleaner::new(),
        }
    }

    pub fn repository(&self) -> &AnalyticsRepository {
        &self.repository
    }

    pub async fn upload(&self, original_name: &str, bytes: &[u8]) -> Result<DataFile> {
        if original_name.is_empty() {
            return Err(AppError::ValidationError("No file selected".to_string()));
        }
        if !self.config.is_allowed_file(original_name) {
            return Err(AppError::UnsupportedFormat("Unsupported file type".to_string()));
        }
        if bytes.len() > self.config.max_content_length {
            return Err(AppError::PayloadTooLarge(format!(
                "File exceeds {} bytes",
                self.config.max_content_length
            )));
        }

        let safe_name = secure_filename(original_name);
        if !self.config.is_allowed_file(&safe_name) {
            return Err(AppError::ValidationError("Invalid file name".to_string()));
        }

        let stored = self.store.save(bytes, original_name)?;
        let table = self.reader.read(&stored.path, &stored.name)?;
        let file_size = std::fs::metadata(&stored.path)?.len();

        let mut tx = self.repository.begin().await?;
        let data_file = tx
            .insert_data_file(&NewDataFile {
                filename: stored.name.clone(),
                original_filename: original_name.to_string(),
                file_size: i64::try_from(file_size).map_err(|_| {
                    AppError::Internal(format!("file size {} does not fit in i64", file_size))
                })?,
                records_count: to_i64(table.row_count())?,
            })
            .await?;
        tx.commit().await?;

        info!(
            file_id = data_file.id,
            filename = %data_file.filename,
            records = table.row_count(),
            "Stored upload"
        );
        Ok(data_file)
    }

    pub async fn statistics(&self, file_id: i64) -> Result<StatisticsOutcome> {
        let file = self.require_file(file_id).await?;
        let table = self.load_table(&file)?;

        let statistics = self.statistics.summarize(&table);

        let mut tx = self.repository.begin().await?;
        tx.insert_analysis(&NewDataAnalysis {
            data_file_id: file.id,
            analysis_type: AnalysisType::Statistics,
            parameters: None,
            results: to_json(&statistics)?,
        })
        .await?;
        tx.commit().await?;

        info!(
            file_id,
            numeric_columns = statistics.columns.len(),
            "Computed statistics"
        );
        Ok(StatisticsOutcome { file, statistics })
    }

    pub async fn clean(&self, file_id: i64, options: CleaningOptions) -> Result<CleaningOutcome> {
        let file = self.require_file(file_id).await?;
        let table = self.load_table(&file)?;

        let (cleaned, result) = self.cleaner.clean(&table, &options);
        let stored = self.store.save_table(&cleaned, &file.filename)?;

        let mut tx = self.repository.begin().await?;
        tx.insert_analysis(&NewDataAnalysis {
            data_file_id: file.id,
            analysis_type: AnalysisType::Cleaning,
            parameters: Some(to_json(&options)?),
            results: to_json(&result)?,
        })
        .await?;
        tx.commit().await?;

        info!(
            file_id,
            duplicates_removed = result.duplicates_removed,
            cleaned_file = %stored.name,
            "Cleaned data"
        );
        Ok(CleaningOutcome {
            file,
            result,
            cleaned_file: stored.name,
        })
    }

    pub async fn list_files(&self) -> Result<Vec<DataFile>> {
        self.repository.list_data_files().await
    }

    async fn require_file(&self, file_id: i64) -> Result<DataFile> {
        self.repository
            .find_data_file(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Resource not found".to_string()))
    }

    fn load_table(&self, file: &DataFile) -> Result<Table> {
        let path = self.store.path_of(&file.filename);
        self.reader.read(&path, &file.filename).map_err(|e| match e {
            AppError::NotFound(_) => AppError::NotFound("File not found".to_string()),
            other => other,
        })
    }
}

fn to_i64(value: usize) -> Result<i64> {
    i64::try_from(value).map_err(|_| AppError::Internal(format!("{} does not fit in i64", value)))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| AppError::Internal(format!("Failed to encode analysis: {}", e)))
}
