//! Tests for the exam sheet server
//!
//! - Property tests for upload checks and download headers
//! - HTTP endpoint tests driving the router with `tower::ServiceExt::oneshot`
//! - Startup font checks and rate limiter settings

use std::sync::{Arc, OnceLock};

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use exam_engine::{ExamSheetGenerator, FontConfig, SheetConfig};
use http_body_util::BodyExt;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use tower::ServiceExt;

use crate::api::router;
use crate::AppState;

const BOUNDARY: &str = "exam-sheet-test-boundary";
const UPLOAD_LIMIT: usize = 20 * 1024 * 1024;

/// One generator for all tests; font loading is the slow part
fn generator() -> Arc<ExamSheetGenerator> {
    static GENERATOR: OnceLock<Arc<ExamSheetGenerator>> = OnceLock::new();
    GENERATOR
        .get_or_init(|| {
            Arc::new(ExamSheetGenerator::new(SheetConfig {
                title: "Test Academy".to_string(),
                info_fields: vec!["Class".to_string(), "Name".to_string()],
                font_families: vec![],
                fonts: FontConfig::embedded_only(),
                ..SheetConfig::default()
            }))
        })
        .clone()
}

fn test_app_with(timeout_ms: u64, max_upload_bytes: usize) -> Router {
    let state = AppState {
        generator: generator(),
        timeout_ms,
    };
    router(state, max_upload_bytes)
}

fn test_app() -> Router {
    test_app_with(30_000, UPLOAD_LIMIT)
}

/// Helvetica text lines at (x, y), one content stream per page
fn create_test_pdf(pages: &[Vec<(i64, i64, &str)>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for (x, y, text) in lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(*text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn hello_world_pdf() -> Vec<u8> {
    create_test_pdf(&[vec![(72, 700, "Hello"), (72, 600, "World")], vec![]])
}

/// A multipart body with a single file part
fn multipart_body(field: &str, filename: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/exam-sheet")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn header_str<'a>(response: &'a Response<Body>, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .unwrap_or_else(|| panic!("missing header {}", name))
        .to_str()
        .unwrap()
}

mod property_tests {
    use axum::http::HeaderValue;
    use proptest::prelude::*;

    use super::*;
    use crate::api::{content_disposition, is_pdf_upload, FALLBACK_DOWNLOAD_NAME};

    proptest! {
        /// Property: any name ending in .pdf is accepted, whatever its case
        #[test]
        fn pdf_extension_is_accepted(stem in "[a-zA-Z0-9 _-]{0,20}", ext in "(pdf|PDF|Pdf)") {
            let name = format!("{}.{}", stem, ext);
            prop_assert!(is_pdf_upload(&name, None));
        }

        /// Property: a PDF content type is enough even without the extension
        #[test]
        fn pdf_content_type_is_accepted(stem in "[a-z]{1,12}") {
            prop_assert!(is_pdf_upload(&stem, Some("application/pdf")));
        }

        /// Property: other extensions with other types are refused
        #[test]
        fn other_uploads_are_refused(stem in "[a-z]{1,12}", ext in "(txt|docx|png|hwp)") {
            let name = format!("{}.{}", stem, ext);
            prop_assert!(!is_pdf_upload(&name, Some("text/plain")));
        }

        /// Property: the disposition header is valid for any file name
        #[test]
        fn content_disposition_is_a_valid_header(name in "\\PC{0,40}") {
            let value = content_disposition(&name);
            prop_assert!(value.is_ascii());
            prop_assert!(HeaderValue::from_str(&value).is_ok());
            let fallback = format!("filename=\"{}\"", FALLBACK_DOWNLOAD_NAME);
            prop_assert!(value.contains(&fallback));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        /// Property: bytes without a PDF header never produce a sheet
        #[test]
        fn garbage_upload_is_rejected(data in proptest::collection::vec(any::<u8>(), 1..512)) {
            prop_assume!(!data.windows(5).any(|w| w == b"%PDF-"));
            let body = multipart_body("file", "garbage.pdf", "application/pdf", &data);

            let status = tokio_test::block_on(async {
                test_app().oneshot(upload_request(body)).await.unwrap().status()
            });
            prop_assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        }
    }
}

mod http_tests {
    //! HTTP endpoint tests against the router without a socket

    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn test_health_returns_200() {
        let response = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["service"], "exam-server");
    }

    #[tokio::test]
    async fn test_index_serves_upload_form() {
        let response = test_app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(header_str(&response, "content-type").starts_with("text/html"));

        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("<form"));
        assert!(html.contains("name=\"file\""));
        assert!(html.contains("/api/exam-sheet"));
    }

    #[tokio::test]
    async fn test_generate_returns_pdf_download() {
        let body = multipart_body("file", "quiz.pdf", "application/pdf", &hello_world_pdf());
        let response = test_app().oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(header_str(&response, "content-type"), "application/pdf");
        assert_eq!(
            header_str(&response, "content-disposition"),
            "attachment; filename=\"exam_sheet.pdf\"; \
             filename*=UTF-8''quiz_%EC%83%88%EC%8B%9C%ED%97%98%EC%A7%80.pdf"
        );
        assert_eq!(header_str(&response, "x-paragraph-count"), "2");
        assert_eq!(header_str(&response, "x-page-count"), "1");

        let pdf = body_bytes(response).await;
        assert!(pdf.starts_with(b"%PDF-"));
    }

    #[tokio::test]
    async fn test_generate_accepts_pdf_type_without_extension() {
        let body = multipart_body("file", "scan", "application/pdf", &hello_world_pdf());
        let response = test_app().oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(header_str(&response, "content-disposition")
            .ends_with("filename*=UTF-8''scan_%EC%83%88%EC%8B%9C%ED%97%98%EC%A7%80.pdf"));
    }

    #[tokio::test]
    async fn test_blank_pdf_returns_422() {
        let blank = create_test_pdf(&[vec![], vec![]]);
        let body = multipart_body("file", "blank.pdf", "application/pdf", &blank);
        let response = test_app().oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "NO_TEXT_RECOGNIZED");
        assert_eq!(json["error"], "no text could be recognized in the PDF.");
        assert!(json["detail"].is_string());
    }

    #[tokio::test]
    async fn test_unrenderable_text_returns_500() {
        // Bundled fonts cannot draw the default Korean header
        let state = AppState {
            generator: Arc::new(ExamSheetGenerator::new(SheetConfig {
                fonts: FontConfig::embedded_only(),
                ..SheetConfig::default()
            })),
            timeout_ms: 30_000,
        };
        let body = multipart_body("file", "quiz.pdf", "application/pdf", &hello_world_pdf());
        let response = router(state, UPLOAD_LIMIT)
            .oneshot(upload_request(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["code"], "PROCESSING_ERROR");
        assert_eq!(json["error"], "an error occurred while processing the PDF.");
        assert!(json["detail"].as_str().unwrap().contains("No loaded font"));
    }

    #[tokio::test]
    async fn test_text_file_returns_415() {
        let body = multipart_body("file", "notes.txt", "text/plain", b"just some notes");
        let response = test_app().oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let json = body_json(response).await;
        assert_eq!(json["code"], "UNSUPPORTED_MEDIA_TYPE");
    }

    #[tokio::test]
    async fn test_missing_file_part_returns_400() {
        let body = multipart_body("document", "quiz.pdf", "application/pdf", &hello_world_pdf());
        let response = test_app().oneshot(upload_request(body)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_empty_file_returns_400() {
        let body = multipart_body("file", "quiz.pdf", "application/pdf", b"");
        let response = test_app().oneshot(upload_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_multipart_request_returns_400() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/exam-sheet")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = test_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn test_oversized_upload_returns_413() {
        let body = multipart_body("file", "big.pdf", "application/pdf", &vec![b'x'; 8192]);
        let response = test_app_with(30_000, 1024)
            .oneshot(upload_request(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let json = body_json(response).await;
        assert_eq!(json["code"], "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn test_zero_timeout_returns_408() {
        let body = multipart_body("file", "quiz.pdf", "application/pdf", &hello_world_pdf());
        let response = test_app_with(0, UPLOAD_LIMIT)
            .oneshot(upload_request(body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
        let json = body_json(response).await;
        assert_eq!(json["code"], "TIMEOUT");
    }
}

mod startup_tests {
    use super::*;
    use crate::ensure_header_renderable;

    #[test]
    fn test_renderable_header_passes() {
        assert!(ensure_header_renderable(&generator()).is_ok());
    }

    #[test]
    fn test_unrenderable_header_stops_startup() {
        // Default Korean header with only the bundled fonts
        let generator = ExamSheetGenerator::new(SheetConfig {
            fonts: FontConfig::embedded_only(),
            ..SheetConfig::default()
        });

        let message = ensure_header_renderable(&generator).unwrap_err().to_string();
        assert!(message.contains("'연'"), "{}", message);
        assert!(message.contains("--font-dir"), "{}", message);
    }
}

mod rate_limit_tests {
    use crate::replenish_interval_ms;

    #[test]
    fn test_rate_is_requests_per_second() {
        assert_eq!(replenish_interval_ms(10), 100);
        assert_eq!(replenish_interval_ms(1), 1000);
        assert_eq!(replenish_interval_ms(4), 250);
    }

    #[test]
    fn test_extreme_rates_stay_positive() {
        assert_eq!(replenish_interval_ms(0), 1000);
        assert_eq!(replenish_interval_ms(5000), 1);
    }
}
