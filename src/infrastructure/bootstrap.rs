use std::sync::Arc;

use tracing::{error, info};

use crate::application::DataFileUseCase;
use crate::domain::error::Result;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::db::{init_database, AnalyticsRepository};
use crate::infrastructure::storage::UploadStore;
use crate::interfaces::http::HttpState;

/// Prepare the upload folder and database, then wire the use cases.
pub async fn setup(config: AppConfig) -> Result<HttpState> {
    let config = Arc::new(config);

    UploadStore::new(config.upload_folder.clone())
        .ensure()
        .map_err(|err| {
            error!(
                error = %err,
                upload_folder = %config.upload_folder.display(),
                "Failed to create upload folder"
            );
            err
        })?;

    let pool = init_database(&config.database_url, config.db_max_connections)
        .await
        .map_err(|err| {
            error!(error = %err, "Failed to initialise database");
            err
        })?;

    info!(
        upload_folder = %config.upload_folder.display(),
        max_connections = config.db_max_connections,
        "Storage ready"
    );

    Ok(HttpState {
        data_files: DataFileUseCase::new(config.clone(), AnalyticsRepository::new(pool)),
        config,
    })
}
