//! Router tests for the processing, health, and fallback routes.
//!
//! Requests are sent straight into the router with `oneshot`; no socket
//! is opened.

#![allow(clippy::unwrap_used)]

use std::fmt::Write as _;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ImageEncoder, Rgb, RgbImage};
use outline_pipeline::codec::{self, PNG_DATA_URI_PREFIX};
use outline_server::{AppState, StartupStatus, create_app};
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot`

const BOUNDARY: &str = "outline-test-boundary";
const LIMIT: usize = 1024 * 1024;

/// One multipart part.
struct Part<'a> {
    name: &'a str,
    filename: Option<&'a str>,
    bytes: &'a [u8],
}

impl<'a> Part<'a> {
    const fn file(name: &'a str, filename: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            name,
            filename: Some(filename),
            bytes,
        }
    }

    fn disposition(&self) -> String {
        let mut line = format!("Content-Disposition: form-data; name=\"{}\"", self.name);
        if let Some(filename) = self.filename {
            let _ = write!(line, "; filename=\"{filename}\"");
        }
        line.push_str("\r\n");
        line
    }
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(part.disposition().as_bytes());
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/process")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn app() -> Router {
    create_app(AppState::new(StartupStatus::Ready, false), LIMIT)
}

fn unavailable_app() -> Router {
    create_app(
        AppState::new(
            StartupStatus::Unavailable {
                reason: "codec probe failed".into(),
            },
            false,
        ),
        LIMIT,
    )
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn gray_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([128, 128, 128]));
    let mut jpeg = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 90)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    jpeg
}

fn white_square_png() -> Vec<u8> {
    let img = RgbImage::from_fn(100, 100, |x, y| {
        if (30..70).contains(&x) && (30..70).contains(&y) {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    });
    codec::encode_png(&img).unwrap()
}

fn is_black(img: &RgbImage) -> bool {
    img.pixels().all(|p| p.0 == [0, 0, 0])
}

fn decode_uri(value: &Value) -> RgbImage {
    let uri = value.as_str().unwrap();
    let payload = uri.strip_prefix(PNG_DATA_URI_PREFIX).unwrap();
    codec::decode(&STANDARD.decode(payload).unwrap()).unwrap()
}

#[tokio::test]
async fn missing_image_field_is_rejected() {
    let request = upload_request(&[Part {
        name: "other",
        filename: Some("a.png"),
        bytes: b"x",
    }]);
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image provided");
}

#[tokio::test]
async fn field_without_filename_is_not_a_file() {
    let request = upload_request(&[Part {
        name: "image",
        filename: None,
        bytes: b"not a file",
    }]);
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image provided");
}

#[tokio::test]
async fn non_multipart_body_is_rejected() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/process")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No image provided");
}

#[tokio::test]
async fn empty_file_is_rejected() {
    let request = upload_request(&[Part::file("image", "empty.png", b"")]);
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No selected file");
}

#[tokio::test]
async fn empty_filename_is_rejected() {
    let png = white_square_png();
    let request = upload_request(&[Part::file("image", "", &png)]);
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No selected file");
}

#[tokio::test]
async fn text_file_is_invalid_image() {
    let request = upload_request(&[Part::file(
        "image",
        "notes.txt",
        b"this is plain text, not pixels\n",
    )]);
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid image");
    assert!(body.get("traceback").is_none());
}

#[tokio::test]
async fn flat_gray_jpeg_returns_three_images() {
    let jpeg = gray_jpeg(100, 100);
    let request = upload_request(&[Part::file("image", "gray.jpg", &jpeg)]);
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_object().unwrap().len(), 3);

    for key in ["original", "edges", "contours"] {
        assert!(body[key].as_str().unwrap().starts_with(PNG_DATA_URI_PREFIX));
        assert_eq!(decode_uri(&body[key]).dimensions(), (100, 100), "{key}");
    }
    assert!(is_black(&decode_uri(&body["edges"])));
    assert!(is_black(&decode_uri(&body["contours"])));
}

#[tokio::test]
async fn white_square_draws_green_contour() {
    let png = white_square_png();
    let request = upload_request(&[Part::file("image", "square.png", &png)]);
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(decode_uri(&body["original"]), codec::decode(&png).unwrap());
    let edges = decode_uri(&body["edges"]);
    assert!(edges.pixels().any(|p| p.0 == [255, 255, 255]));
    let contours = decode_uri(&body["contours"]);
    let black_or_green = |p: &Rgb<u8>| p.0 == [0, 0, 0] || p.0 == [0, 255, 0];
    assert!(contours.pixels().any(|p| p.0 == [0, 255, 0]));
    assert!(contours.pixels().all(black_or_green));
}

#[tokio::test]
async fn first_image_file_wins() {
    let png = white_square_png();
    let request = upload_request(&[
        Part {
            name: "image",
            filename: None,
            bytes: b"form value",
        },
        Part::file("image", "square.png", &png),
    ]);
    let (status, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = create_app(AppState::new(StartupStatus::Ready, false), 256);
    let big = vec![0xAB_u8; 4096];
    let request = upload_request(&[Part::file("image", "big.bin", &big)]);
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("Invalid upload"), "{error}");
}

#[tokio::test]
async fn unavailable_pipeline_refuses_processing() {
    let png = white_square_png();
    let (status, body) = send(
        unavailable_app(),
        upload_request(&[Part::file("image", "square.png", &png)]),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["error"],
        "Image pipeline unavailable: codec probe failed"
    );
}

#[tokio::test]
async fn health_routes_report_ok() {
    for uri in ["/", "/api/health", "/process"] {
        let (status, body) = send(app(), get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["status"], "ok");
        assert_eq!(body["message"], "Image processing pipeline loaded");
    }
}

#[tokio::test]
async fn health_routes_report_failure() {
    for uri in ["/", "/api/health", "/process"] {
        let (status, body) = send(unavailable_app(), get(uri)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Import failed: codec probe failed");
    }
}

#[tokio::test]
async fn unknown_path_gets_diagnostic_404() {
    let request = Request::builder()
        .uri("/nope?x=1")
        .header(header::HOST, "localhost:5000")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Path not found by Flask routing");
    assert_eq!(body["received_path"], "/nope");
    assert_eq!(body["method"], "GET");
    assert_eq!(body["url"], "http://localhost:5000/nope?x=1");
}

#[tokio::test]
async fn unsupported_method_on_known_path_is_404() {
    let request = Request::builder()
        .method(Method::PUT)
        .uri("/process")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["received_path"], "/process");
    assert_eq!(body["method"], "PUT");

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app(), request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let request = Request::builder()
        .uri("/api/health")
        .header(header::ORIGIN, "http://example.com")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
