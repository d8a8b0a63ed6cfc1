use super::*;
use crate::infrastructure::bootstrap;
use actix_web::http::{header, StatusCode};
use actix_web::test;
use serde_json::Value;
use std::path::Path;

const BOUNDARY: &str = "----tabular-analytics-boundary";

async fn state(upload_dir: &Path, max_content_length: usize) -> web::Data<HttpState> {
    let config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        upload_folder: upload_dir.to_path_buf(),
        max_content_length,
        ..AppConfig::default()
    };
    web::Data::new(bootstrap::setup(config).await.unwrap())
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data($state.clone())
                .configure(configure)
                .default_service(web::to(not_found)),
        )
        .await
    };
}

fn multipart_body(field: &str, filename: Option<&str>, content: &[u8]) -> Vec<u8> {
    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{field}\"; filename=\"{name}\""),
        None => format!("form-data; name=\"{field}\""),
    };
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(filename: &str, content: &[u8]) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/upload")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart_body("file", Some(filename), content))
}

#[actix_web::test]
async fn test_upload_csv_returns_created() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), 16 * 1024 * 1024).await;
    let app = test_app!(state);

    let resp = test::call_service(&app, upload_request("people.csv", b"name,age\nA,1\nB,2\n").to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "File uploaded successfully");
    assert_eq!(body["filename"], "people.csv");
    assert_eq!(body["records_count"], 2);
    assert!(body["file_id"].as_i64().is_some());
}

#[actix_web::test]
async fn test_upload_rejects_txt_with_415() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), 1024).await;
    let app = test_app!(state);

    let resp = test::call_service(&app, upload_request("notes.txt", b"hello").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[actix_web::test]
async fn test_upload_empty_filename_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), 1024).await;
    let app = test_app!(state);

    let resp = test::call_service(&app, upload_request("", b"a\n1\n").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No file selected");
}

#[actix_web::test]
async fn test_upload_without_file_field_is_400() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), 1024).await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/upload")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        ))
        .set_payload(multipart_body("comment", None, b"hi"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "No file provided");
}

#[actix_web::test]
async fn test_upload_over_limit_is_413() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), 8).await;
    let app = test_app!(state);

    let resp = test::call_service(
        &app,
        upload_request("big.csv", b"a,b\n1,2\n3,4\n5,6\n").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[actix_web::test]
async fn test_stats_requires_file_id_and_known_file() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), 1024).await;
    let app = test_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/data/stats").to_request()).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/data/stats?file_id=abc").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/data/stats?file_id=9999").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_stats_for_uploaded_file() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), 1024).await;
    let app = test_app!(state);

    let uploaded: Value = test::call_and_read_body_json(
        &app,
        upload_request("m.csv", b"a,b,c,name\n1,2,3,x\n2,4,1,y\n3,6,2,z\n").to_request(),
    )
    .await;
    let file_id = uploaded["file_id"].as_i64().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/data/stats?file_id={file_id}"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["file_id"], file_id);
    assert_eq!(body["filename"], "m.csv");
    let stats = &body["statistics"];
    assert_eq!(stats["a"]["mean"], 2.0);
    assert_eq!(stats["a"]["count"], 3);
    assert!(stats.get("name").is_none());

    let correlation = stats["correlation"].as_object().unwrap();
    assert_eq!(correlation.len(), 3);
    assert_eq!(correlation["a|b"], 1.0);
    assert!(correlation.contains_key("a|c"));
    assert!(correlation.contains_key("b|c"));
}

#[actix_web::test]
async fn test_stats_missing_on_disk_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), 1024).await;
    let app = test_app!(state);

    let uploaded: Value =
        test::call_and_read_body_json(&app, upload_request("x.csv", b"a\n1\n").to_request()).await;
    std::fs::remove_file(dir.path().join("x.csv")).unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/data/stats?file_id={}", uploaded["file_id"]))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "File not found");
}

#[actix_web::test]
async fn test_clean_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), 1024).await;
    let app = test_app!(state);

    let uploaded: Value = test::call_and_read_body_json(
        &app,
        upload_request("ages.csv", b"age,city\n10,A\n,B\n10,A\n30,\n").to_request(),
    )
    .await;
    let file_id = uploaded["file_id"].as_i64().unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/data/clean?file_id={file_id}"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["cleaned_file"], "cleaned_ages.csv");
    assert_eq!(body["cleaning_stats"]["original_records"], 4);
    assert_eq!(body["cleaning_stats"]["cleaned_records"], 3);
    assert_eq!(body["cleaning_stats"]["duplicates_removed"], 1);
    assert_eq!(body["cleaning_stats"]["missing_values_filled"], true);

    let written = std::fs::read_to_string(dir.path().join("cleaned_ages.csv")).unwrap();
    assert_eq!(written, "age,city\n10,A\n20,B\n30,Unknown\n");
}

#[actix_web::test]
async fn test_clean_flags_and_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), 1024).await;
    let app = test_app!(state);

    let uploaded: Value = test::call_and_read_body_json(
        &app,
        upload_request("v.csv", b"v\n1\n1\n\n4\n").to_request(),
    )
    .await;
    let file_id = uploaded["file_id"].as_i64().unwrap();

    let body: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get()
            .uri(&format!(
                "/data/clean?file_id={file_id}&remove_duplicates=FALSE&fill_missing=True&fill_strategy=zero"
            ))
            .to_request(),
    )
    .await;
    assert_eq!(body["cleaning_stats"]["duplicates_removed"], 0);
    assert_eq!(
        body["cleaning_stats"]["original_records"],
        body["cleaning_stats"]["cleaned_records"]
    );

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/data/clean?file_id={file_id}&fill_strategy=mode"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_list_files() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), 1024).await;
    let app = test_app!(state);

    test::call_service(&app, upload_request("one.csv", b"a\n1\n").to_request()).await;
    test::call_service(&app, upload_request("two words.csv", b"a\n1\n2\n").to_request()).await;

    let body: Value =
        test::call_and_read_body_json(&app, test::TestRequest::get().uri("/files").to_request())
            .await;
    let files = body["files"].as_array().unwrap();

    assert_eq!(files.len(), 2);
    assert_eq!(files[1]["filename"], "two words.csv");
    assert_eq!(files[1]["records_count"], 2);
    assert_eq!(files[1]["file_size"], 6);
    assert!(files[0]["upload_date"].as_str().unwrap().ends_with('Z'));
}

#[actix_web::test]
async fn test_unknown_route_is_json_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = state(dir.path(), 1024).await;
    let app = test_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/nope").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Resource not found");
}

#[actix_web::test]
async fn test_parse_flag_is_lenient() {
    assert!(parse_flag(Some("TRUE"), false));
    assert!(!parse_flag(Some("yes"), true));
    assert!(parse_flag(None, true));
}
