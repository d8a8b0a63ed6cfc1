use crate::domain::data_file::{DataAnalysis, DataFile, NewDataAnalysis, NewDataFile};
use crate::domain::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, Transaction};
use validator::Validate;

#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: SqlitePool,
}

impl AnalyticsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the unit of work for one request. Dropping the returned
    /// transaction without [`AnalyticsTx::commit`] rolls it back.
    ///
    /// The write lock is taken up front so concurrent writers queue on
    /// `busy_timeout` instead of failing a read-to-write lock upgrade.
    pub async fn begin(&self) -> Result<AnalyticsTx> {
        let tx = self
            .pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to start transaction: {e}")))?;
        Ok(AnalyticsTx { tx })
    }

    pub async fn find_data_file(&self, id: i64) -> Result<Option<DataFile>> {
        let file = sqlx::query_as::<_, DataFileEntity>(
            "SELECT id, filename, original_filename, file_size, upload_date, records_count
             FROM data_file WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch data file {id}: {e}")))?;

        Ok(file.map(|f| f.into()))
    }

    pub async fn list_data_files(&self) -> Result<Vec<DataFile>> {
        let files = sqlx::query_as::<_, DataFileEntity>(
            "SELECT id, filename, original_filename, file_size, upload_date, records_count
             FROM data_file ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list data files: {e}")))?;

        Ok(files.into_iter().map(|f| f.into()).collect())
    }

    pub async fn list_analyses(&self, data_file_id: i64) -> Result<Vec<DataAnalysis>> {
        let rows = sqlx::query_as::<_, DataAnalysisEntity>(
            "SELECT id, data_file_id, analysis_type, parameters, results, created_at
             FROM data_analysis WHERE data_file_id = ? ORDER BY id ASC",
        )
        .bind(data_file_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list analyses: {e}")))?;

        rows.into_iter().map(DataAnalysis::try_from).collect()
    }
}

pub struct AnalyticsTx {
    tx: Transaction<'static, Sqlite>,
}

impl AnalyticsTx {
    pub async fn insert_data_file(&mut self, file: &NewDataFile) -> Result<DataFile> {
        file.validate()
            .map_err(|e| AppError::ValidationError(format!("Invalid data file: {e}")))?;

        let upload_date = Utc::now();
        let result = sqlx::query(
            "INSERT INTO data_file (filename, original_filename, file_size, upload_date, records_count)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&file.filename)
        .bind(&file.original_filename)
        .bind(file.file_size)
        .bind(upload_date)
        .bind(file.records_count)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert data file: {e}")))?;

        Ok(DataFile {
            id: result.last_insert_rowid(),
            filename: file.filename.clone(),
            original_filename: file.original_filename.clone(),
            file_size: file.file_size,
            upload_date,
            records_count: Some(file.records_count),
        })
    }

    pub async fn insert_analysis(&mut self, analysis: &NewDataAnalysis) -> Result<i64> {
        let parameters = analysis
            .parameters
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| AppError::Internal(format!("Failed to encode parameters: {e}")))?;
        let results = serde_json::to_string(&analysis.results)
            .map_err(|e| AppError::Internal(format!("Failed to encode results: {e}")))?;

        let result = sqlx::query(
            "INSERT INTO data_analysis (analysis_type, parameters, results, created_at, data_file_id)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(analysis.analysis_type.as_str())
        .bind(parameters)
        .bind(results)
        .bind(Utc::now())
        .bind(analysis.data_file_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to insert analysis: {e}")))?;

        Ok(result.last_insert_rowid())
    }

    pub async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit transaction: {e}")))
    }
}

#[derive(sqlx::FromRow)]
struct DataFileEntity {
    id: i64,
    filename: String,
    original_filename: String,
    file_size: i64,
    upload_date: DateTime<Utc>,
    records_count: Option<i64>,
}

impl From<DataFileEntity> for DataFile {
    fn from(e: DataFileEntity) -> Self {
        Self {
            id: e.id,
            filename: e.filename,
            original_filename: e.original_filename,
            file_size: e.file_size,
            upload_date: e.upload_date,
            records_count: e.records_count,
        }
    }
}

#[derive(sqlx::FromRow)]
struct DataAnalysisEntity {
    id: i64,
    data_file_id: i64,
    analysis_type: String,
    parameters: Option<String>,
    results: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<DataAnalysisEntity> for DataAnalysis {
    type Error = AppError;

    fn try_from(e: DataAnalysisEntity) -> Result<Self> {
        let decode = |raw: &str| {
            serde_json::from_str(raw).map_err(|err| {
                AppError::DatabaseError(format!("Corrupt JSON in analysis {}: {err}", e.id))
            })
        };

        Ok(Self {
            id: e.id,
            data_file_id: e.data_file_id,
            analysis_type: e.analysis_type.clone(),
            parameters: e.parameters.as_deref().map(decode).transpose()?,
            results: decode(&e.results)?,
            created_at: e.created_at,
        })
    }
}
