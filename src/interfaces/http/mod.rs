use crate::application::DataFileUseCase;
use crate::domain::cleaning::{CleaningOptions, CleaningResult, FillStrategy};
use crate::domain::error::{AppError, Result};
use crate::domain::statistics::StatisticsReport;
use crate::infrastructure::config::AppConfig;
use actix_cors::Cors;
use actix_multipart::Multipart;
use actix_web::middleware::Logger;
use actix_web::{dev::Server, get, post, web, App, HttpResponse, HttpServer, Responder};
use chrono::SecondsFormat;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

#[cfg(test)]
mod tests;

pub struct HttpState {
    pub data_files: DataFileUseCase,
    pub config: Arc<AppConfig>,
}

#[derive(Deserialize)]
pub struct FileQuery {
    pub file_id: Option<String>,
}

#[derive(Deserialize)]
pub struct CleanQuery {
    pub file_id: Option<String>,
    pub remove_duplicates: Option<String>,
    pub fill_missing: Option<String>,
    pub fill_strategy: Option<String>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub file_id: i64,
    pub filename: String,
    pub records_count: Option<i64>,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub file_id: i64,
    pub filename: String,
    pub statistics: StatisticsReport,
}

#[derive(Serialize)]
pub struct CleanResponse {
    pub file_id: i64,
    pub cleaning_stats: CleaningResult,
    pub cleaned_file: String,
}

#[derive(Serialize)]
pub struct FileSummary {
    pub id: i64,
    pub filename: String,
    pub upload_date: String,
    pub records_count: Option<i64>,
    pub file_size: i64,
}

#[derive(Serialize)]
pub struct FilesResponse {
    pub files: Vec<FileSummary>,
}

struct UploadedFile {
    filename: String,
    bytes: Vec<u8>,
}

#[post("/upload")]
async fn upload(data: web::Data<HttpState>, payload: Multipart) -> impl Responder {
    let uploaded = match read_file_field(payload, data.config.max_content_length).await {
        Ok(Some(uploaded)) => uploaded,
        Ok(None) => return error_body(HttpResponse::BadRequest(), "No file provided"),
        Err(e) => return error_response(&e, "Upload", "Failed to process file"),
    };

    match data
        .data_files
        .upload(&uploaded.filename, &uploaded.bytes)
        .await
    {
        Ok(file) => HttpResponse::Created().json(UploadResponse {
            message: "File uploaded successfully",
            file_id: file.id,
            filename: file.original_filename,
            records_count: file.records_count,
        }),
        Err(e) => error_response(&e, "Upload", "Failed to process file"),
    }
}

#[get("/data/stats")]
async fn data_stats(data: web::Data<HttpState>, query: web::Query<FileQuery>) -> impl Responder {
    let file_id = match parse_file_id(query.file_id.as_deref()) {
        Ok(id) => id,
        Err(e) => return error_response(&e, "Stats", "Failed to calculate statistics"),
    };

    match data.data_files.statistics(file_id).await {
        Ok(outcome) => HttpResponse::Ok().json(StatsResponse {
            file_id: outcome.file.id,
            filename: outcome.file.original_filename,
            statistics: outcome.statistics,
        }),
        Err(e) => error_response(&e, "Stats", "Failed to calculate statistics"),
    }
}

#[get("/data/clean")]
async fn clean_data(data: web::Data<HttpState>, query: web::Query<CleanQuery>) -> impl Responder {
    let request = parse_file_id(query.file_id.as_deref()).and_then(|file_id| {
        let options = cleaning_options(&query)?;
        Ok((file_id, options))
    });
    let (file_id, options) = match request {
        Ok(parsed) => parsed,
        Err(e) => return error_response(&e, "Cleaning", "Failed to clean data"),
    };

    match data.data_files.clean(file_id, options).await {
        Ok(outcome) => HttpResponse::Ok().json(CleanResponse {
            file_id: outcome.file.id,
            cleaning_stats: outcome.result,
            cleaned_file: outcome.cleaned_file,
        }),
        Err(e) => error_response(&e, "Cleaning", "Failed to clean data"),
    }
}

#[get("/files")]
async fn list_files(data: web::Data<HttpState>) -> impl Responder {
    match data.data_files.list_files().await {
        Ok(files) => HttpResponse::Ok().json(FilesResponse {
            files: files
                .into_iter()
                .map(|f| FileSummary {
                    id: f.id,
                    filename: f.original_filename,
                    upload_date: f.upload_date.to_rfc3339_opts(SecondsFormat::Secs, true),
                    records_count: f.records_count,
                    file_size: f.file_size,
                })
                .collect(),
        }),
        Err(e) => error_response(&e, "List files", "Failed to retrieve files"),
    }
}

async fn not_found() -> HttpResponse {
    error_body(HttpResponse::NotFound(), "Resource not found")
}

/// Pull the first multipart field named `file` that carries a filename.
/// Bytes beyond `limit` abort the read.
async fn read_file_field(mut payload: Multipart, limit: usize) -> Result<Option<UploadedFile>> {
    while let Some(item) = payload.next().await {
        let mut field = item
            .map_err(|e| AppError::ValidationError(format!("Malformed multipart body: {}", e)))?;

        let filename = field
            .content_disposition()
            .filter(|cd| cd.get_name() == Some("file"))
            .and_then(|cd| cd.get_filename())
            .map(|name| name.to_string());

        let Some(filename) = filename else {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| {
                    AppError::ValidationError(format!("Malformed multipart body: {}", e))
                })?;
            }
            continue;
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk
                .map_err(|e| AppError::ValidationError(format!("Malformed multipart body: {}", e)))?;
            if bytes.len() + chunk.len() > limit {
                return Err(AppError::PayloadTooLarge(format!(
                    "File exceeds {} bytes",
                    limit
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        return Ok(Some(UploadedFile { filename, bytes }));
    }

    Ok(None)
}

fn parse_file_id(raw: Option<&str>) -> Result<i64> {
    let raw = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::ValidationError("file_id parameter is required".to_string()))?;
    raw.parse::<i64>()
        .map_err(|_| AppError::ValidationError("file_id must be an integer".to_string()))
}

/// Only a case-insensitive `true` enables a flag.
fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    raw.map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(default)
}

fn cleaning_options(query: &CleanQuery) -> Result<CleaningOptions> {
    let defaults = CleaningOptions::default();
    let fill_strategy = match query.fill_strategy.as_deref() {
        Some(raw) => raw.parse::<FillStrategy>()?,
        None => defaults.fill_strategy,
    };
    Ok(CleaningOptions {
        remove_duplicates: parse_flag(query.remove_duplicates.as_deref(), defaults.remove_duplicates),
        fill_missing: parse_flag(query.fill_missing.as_deref(), defaults.fill_missing),
        fill_strategy,
    })
}

fn error_body(mut builder: actix_web::HttpResponseBuilder, message: &str) -> HttpResponse {
    builder.json(json!({ "error": message }))
}

/// Client errors carry their message; everything else is logged and
/// replaced by `generic`.
fn error_response(err: &AppError, context: &str, generic: &str) -> HttpResponse {
    match err {
        AppError::ValidationError(msg) | AppError::InvalidArgument(msg) => {
            warn!(error = %err, "{} rejected", context);
            error_body(HttpResponse::BadRequest(), msg)
        }
        AppError::NotFound(msg) => {
            warn!(error = %err, "{} target missing", context);
            error_body(HttpResponse::NotFound(), msg)
        }
        AppError::PayloadTooLarge(msg) => {
            warn!(error = %err, "{} rejected", context);
            error_body(HttpResponse::PayloadTooLarge(), msg)
        }
        AppError::UnsupportedFormat(_) => {
            warn!(error = %err, "{} rejected", context);
            error_body(HttpResponse::UnsupportedMediaType(), "Unsupported file type")
        }
        _ => {
            error!(error = %err, "{} error", context);
            error_body(HttpResponse::InternalServerError(), generic)
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(upload)
        .service(data_stats)
        .service(clean_data)
        .service(list_files);
}

pub fn start_server(state: web::Data<HttpState>) -> std::io::Result<Server> {
    let address = state.config.bind_address();

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(configure)
            .default_service(web::to(not_found))
    })
    .bind(address)?
    .run();

    Ok(server)
}
