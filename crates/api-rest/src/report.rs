//! Report-overview service handlers.

use crate::{report_health, ApiError, AppState};
use api_shared::{DatasetUnavailable, ErrorRes, HealthRes, ReferenceSampleRes, UploadRes};
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::Json;
use lipid_report::ReportOverview;
use lipid_types::{LipidCode, LipidDetail, Mode};
use utoipa::{OpenApi, ToSchema};

/// Rows returned by the reference sample endpoint.
pub const REFERENCE_SAMPLE_ROWS: usize = 25;

#[derive(OpenApi)]
#[openapi(
    paths(health, upload, reference_sample),
    components(schemas(
        HealthRes,
        ErrorRes,
        UploadForm,
        UploadRes,
        LipidDetail,
        LipidCode,
        Mode,
        ReferenceSampleRes,
        DatasetUnavailable,
    ))
)]
pub struct ReportApiDoc;

/// Multipart body of an upload.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
pub async fn health() -> Json<HealthRes> {
    Json(report_health().check_health())
}

#[utoipa::path(
    post,
    path = "/api/report-overview/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Report overview", body = UploadRes),
        (status = 400, description = "Not a PDF, empty, or no file field", body = ErrorRes),
        (status = 413, description = "File too large", body = ErrorRes),
        (status = 422, description = "Text could not be extracted", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Upload a lab report PDF
///
/// Extracts text, detects CHOL, LDL, HDL and TG values and interprets them. When values are
/// found the response carries a `report_id` that chat questions can refer to.
#[axum::debug_handler]
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadRes>, ApiError> {
    let max_mb = state.pipeline().max_upload_bytes() / (1024 * 1024);
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_mb))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(|e| multipart_error(e, max_mb))?;
        upload = Some((filename, bytes));
        break;
    }

    let Some((filename, bytes)) = upload else {
        return Err(ApiError::BadRequest("missing form field 'file'".into()));
    };

    tracing::info!(filename, bytes = bytes.len(), "report upload received");
    let overview = state.pipeline().analyse(&filename, bytes.to_vec()).await?;
    Ok(Json(upload_res(overview)))
}

fn multipart_error(err: MultipartError, max_mb: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge(format!("file too large. max {max_mb}mb"))
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

fn upload_res(overview: ReportOverview) -> UploadRes {
    let ReportOverview {
        is_valid_report,
        message,
        report_id,
        text_preview,
        lipids,
        interpretation,
        summary,
        warnings,
    } = overview;

    UploadRes {
        is_valid_report,
        message,
        report_id,
        text_preview,
        lipids,
        details: interpretation.details,
        highlights: interpretation.highlights,
        sources: interpretation.sources,
        summary,
        mode: interpretation.mode,
        note: interpretation.note,
        warnings,
    }
}

#[utoipa::path(
    get,
    path = "/api/report-overview/reference/lipids",
    responses(
        (status = 200, description = "First rows of the lipid reference dataset", body = ReferenceSampleRes),
        (status = 500, description = "Reference dataset not loaded", body = ErrorRes)
    )
)]
/// Sample of the lipid reference dataset
#[axum::debug_handler]
pub async fn reference_sample(
    State(state): State<AppState>,
) -> Result<Json<ReferenceSampleRes>, ApiError> {
    if let Some(error) = &state.reference_error {
        return Err(ApiError::DatasetUnavailable(DatasetUnavailable {
            message: "lipid dataset not loaded".into(),
            path: state.reference_path.display().to_string(),
            error: Some(error.clone()),
        }));
    }

    let dataset = state.engine().reference();
    let data = dataset.sample(REFERENCE_SAMPLE_ROWS);
    Ok(Json(ReferenceSampleRes {
        source: dataset.source_name().to_string(),
        rows_returned: data.len(),
        columns: dataset.columns().to_vec(),
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::upload_res;
    use crate::report_router;
    use crate::tests::{json_body, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use lipid_core::{LipidEngine, LipidPanel, ReferenceDataset};
    use lipid_report::ReportOverview;
    use lipid_types::LipidCode;
    use std::sync::Arc;
    use tower::ServiceExt;

    const BOUNDARY: &str = "lipid-test-boundary";

    fn multipart_request(field: &str, filename: &str, content: &[u8]) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/report-overview/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn upload_status(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (state, _temp) = test_state(true);
        let response = report_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        (status, json_body(response).await)
    }

    #[tokio::test]
    async fn test_upload_rejects_non_pdf() {
        let (status, json) = upload_status(multipart_request("file", "notes.txt", b"hello")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], "Only PDF files are supported");
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_file() {
        let (status, json) = upload_status(multipart_request("file", "report.pdf", b"")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], "empty file");
    }

    #[tokio::test]
    async fn test_upload_requires_file_field() {
        let (status, json) =
            upload_status(multipart_request("attachment", "report.pdf", b"%PDF")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], "missing form field 'file'");
    }

    #[tokio::test]
    async fn test_upload_unreadable_pdf_is_unprocessable() {
        let (status, json) =
            upload_status(multipart_request("file", "report.pdf", b"%PDF-1.4 garbage")).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["detail"], "could not extract text from pdf");
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_too_large() {
        let big = vec![b'x'; 10 * 1024 * 1024 + 1];
        let (status, json) = upload_status(multipart_request("file", "report.pdf", &big)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json["detail"], "file too large. max 10mb");
    }

    #[tokio::test]
    async fn test_reference_sample_lists_rows() {
        let (state, _temp) = test_state(true);
        let response = report_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/report-overview/reference/lipids")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["source"], "lipids.csv");
        assert_eq!(json["rows_returned"], 4);
        assert_eq!(json["columns"][0], "code");
        assert_eq!(json["data"][2]["code"], "HDL");
        assert_eq!(json["data"][2]["borderline_high_range"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_reference_sample_reports_missing_dataset() {
        let (state, _temp) = test_state(false);
        let response = report_router(state)
            .oneshot(
                Request::builder()
                    .uri("/api/report-overview/reference/lipids")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["detail"]["message"], "lipid dataset not loaded");
        assert!(json["detail"]["path"]
            .as_str()
            .unwrap()
            .ends_with("lipids.csv"));
        assert!(json["detail"]["error"].is_string());
    }

    #[test]
    fn test_upload_response_carries_mode_and_note() {
        let mut panel = LipidPanel::new();
        panel.insert(LipidCode::Ldl, 145.0);
        let interpretation =
            LipidEngine::new(Arc::new(ReferenceDataset::empty()), false).summarise(&panel);
        let expected_note = interpretation.note.clone();
        assert!(expected_note.is_some());

        let res = upload_res(ReportOverview {
            is_valid_report: true,
            message: "pdf uploaded and text extracted".into(),
            report_id: Some("abc".into()),
            text_preview: "LDL 145 mg/dL".into(),
            lipids: serde_json::Map::new(),
            interpretation,
            summary: None,
            warnings: Vec::new(),
        });
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["mode"], "deterministic");
        assert_eq!(json["note"].as_str(), expected_note.as_deref());
        assert_eq!(json["details"][0]["code"], "LDL");
    }
}
