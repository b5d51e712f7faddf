use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use camera_angle_studio::{router, AppState, Config};
use http_body_util::BodyExt;
use httpmock::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "X-CAMERA-ANGLE-BOUNDARY";
const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 9, 9, 9, 9];

struct TestApp {
    app: Router,
    dir: TempDir,
}

fn test_app() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = Config {
        static_dir: dir.path().join("static"),
        upload_dir: dir.path().join("uploads"),
        ..Config::default()
    };
    let state = AppState::new(config).expect("state");
    TestApp {
        app: router(state),
        dir,
    }
}

fn multipart(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
        );
    }
    if let Some((filename, bytes)) = file {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/generate")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}

async fn json_response(app: &Router, request: Request<Body>) -> Value {
    let response = app.clone().oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn index_lists_preset_models() {
    let TestApp { app, dir: _dir } = test_app();
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("gemini-2.5-flash-image"));
    assert!(html.contains("qwen-image-edit-lora"));
}

#[tokio::test]
async fn disallowed_extension_never_reaches_backend() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path("/edit");
            then.status(200).json_body(json!({ "images": [{ "url": "X" }] }));
        })
        .await;
    let TestApp { app, dir } = test_app();

    let edit_url = server.url("/edit");
    let request = multipart(
        &[
            ("prompt", "cat"),
            ("model_source", "custom"),
            ("custom_api_url", edit_url.as_str()),
            ("custom_api_key", "k"),
        ],
        Some(("payload.gif", PNG)),
    );
    let body = json_response(&app, request).await;

    assert_eq!(body["success"], false);
    assert_eq!(body["error_kind"], "validation");
    assert!(body.get("original_image").is_none());
    assert_eq!(mock.hits_async().await, 0);
    assert!(!dir.path().join("uploads").join("payload.gif").exists());
}

#[tokio::test]
async fn missing_image_is_a_validation_error() {
    let TestApp { app, dir: _dir } = test_app();
    let body = json_response(&app, multipart(&[("prompt", "cat")], None)).await;

    assert_eq!(body["success"], false);
    assert_eq!(body["error_kind"], "validation");
    assert_eq!(body["error"], "No image uploaded");
}

#[tokio::test]
async fn custom_endpoint_round_trip_with_legacy_fields() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/edit")
                .header("Authorization", "Bearer sk-test")
                .body_contains(
                    "cat, back view, low angle worm's-eye view, wide angle full body shot, \
                     consistent character, high quality",
                );
            then.status(200).json_body(json!({ "data": [{ "url": "https://img/out.png" }] }));
        })
        .await;
    let TestApp { app, dir } = test_app();

    let edit_url = server.url("/edit");
    let request = multipart(
        &[
            ("prompt", "cat"),
            ("rotate", "170"),
            ("pan_y", "40"),
            ("zoom", "10"),
            ("model_source", "custom"),
            ("custom_api_url", edit_url.as_str()),
            ("custom_api_key", "sk-test"),
            ("custom_model_name", "gpt-image-1"),
        ],
        Some(("my cat.png", PNG)),
    );
    let body = json_response(&app, request).await;

    assert_eq!(body["success"], true, "{body}");
    assert_eq!(body["data"]["status"], "success");
    assert_eq!(body["data"]["image_url"], "https://img/out.png");
    assert_eq!(body["original_image"], "/uploads/my_cat.png");
    assert_eq!(
        std::fs::read(dir.path().join("uploads").join("my_cat.png")).unwrap(),
        PNG
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn custom_without_endpoint_reports_config_error() {
    let TestApp { app, dir: _dir } = test_app();
    let request = multipart(
        &[("prompt", "cat"), ("model_source", "custom")],
        Some(("cat.png", PNG)),
    );
    let body = json_response(&app, request).await;

    assert_eq!(body["success"], false);
    assert_eq!(body["error_kind"], "config");
    assert_eq!(body["original_image"], "/uploads/cat.png");
}

#[tokio::test]
async fn backend_error_body_reaches_client_unmodified() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/edit");
            then.status(503).body("upstream overloaded, try later");
        })
        .await;
    let TestApp { app, dir: _dir } = test_app();

    let edit_url = server.url("/edit");
    let request = multipart(
        &[
            ("prompt", "cat"),
            ("model_source", "custom"),
            ("custom_api_url", edit_url.as_str()),
            ("custom_api_key", "k"),
        ],
        Some(("cat.jpg", PNG)),
    );
    let body = json_response(&app, request).await;

    assert_eq!(body["success"], false);
    assert_eq!(body["error_kind"], "api");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("upstream overloaded, try later"));
}

#[tokio::test]
async fn uploaded_file_is_served_back() {
    let TestApp { app, dir: _dir } = test_app();
    let request = multipart(
        &[("model_source", "custom")],
        Some(("served.webp", PNG)),
    );
    let body = json_response(&app, request).await;
    let url = body["original_image"].as_str().unwrap().to_string();

    let response = app
        .oneshot(Request::builder().uri(url).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], PNG);
}

/// Posts `controls` to a custom endpoint and checks the exact prompt it received.
async fn assert_prompt_sent(controls: &[(&str, &str)], expected: &str) {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/edit")
                .body_contains(format!("\"prompt\":\"{expected}\""));
            then.status(200).json_body(json!({ "data": [{ "url": "https://img/out.png" }] }));
        })
        .await;
    let TestApp { app, dir: _dir } = test_app();

    let edit_url = server.url("/edit");
    let mut fields = vec![
        ("prompt", "cat"),
        ("model_source", "custom"),
        ("custom_api_url", edit_url.as_str()),
        ("custom_api_key", "k"),
    ];
    fields.extend_from_slice(controls);
    let body = json_response(&app, multipart(&fields, Some(("cat.png", PNG)))).await;

    assert_eq!(body["success"], true, "{body}");
    assert!(body["processing_time_ms"].is_u64());
    mock.assert_async().await;
}

#[tokio::test]
async fn canonical_angle_fields() {
    assert_prompt_sent(
        &[("h_angle", "90"), ("v_angle", "30"), ("zoom", "80")],
        "cat, right side profile view, high angle top-down view, close-up shot, \
         consistent character, high quality",
    )
    .await;
}

#[tokio::test]
async fn canonical_fields_win_over_legacy_ones() {
    assert_prompt_sent(
        &[
            ("h_angle", "0"),
            ("rotate", "170"),
            ("v_angle", "0"),
            ("pan_y", "40"),
            ("zoom", "50"),
        ],
        "cat, front view, eye-level shot, medium shot, consistent character, high quality",
    )
    .await;
}

#[tokio::test]
async fn rotate_is_used_when_h_angle_is_absent() {
    assert_prompt_sent(
        &[("rotate", "-90"), ("v_angle", "-40")],
        "cat, left side profile view, low angle worm's-eye view, medium shot, \
         consistent character, high quality",
    )
    .await;
}

#[tokio::test]
async fn unparseable_and_non_finite_controls_use_defaults() {
    assert_prompt_sent(
        &[("h_angle", "NaN"), ("v_angle", "inf"), ("zoom", "abc")],
        "cat, front view, eye-level shot, medium shot, consistent character, high quality",
    )
    .await;
}

#[tokio::test]
async fn missing_controls_use_defaults() {
    assert_prompt_sent(
        &[],
        "cat, front view, eye-level shot, medium shot, consistent character, high quality",
    )
    .await;
}
