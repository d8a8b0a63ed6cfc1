use std::error::Error;

use actix_web::web;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::infrastructure::config::AppConfig;

pub async fn run() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();

    let config = AppConfig::load()?;
    let state = web::Data::new(crate::infrastructure::bootstrap::setup(config).await?);

    info!(
        host = %state.config.host,
        port = state.config.port,
        "Starting HTTP server"
    );

    crate::interfaces::http::start_server(state)?.await?;
    Ok(())
}
