//! Chat service handlers.

use crate::{chat_health, ApiError, AppState};
use api_shared::{AskReq, ErrorRes, HealthRes, HistoryItem, HistoryQuery, HistoryRes, RootRes};
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::Json;
use lipid_core::constants::{DEFAULT_HISTORY_LIMIT, DEFAULT_USER_ID, MAX_HISTORY_LIMIT};
use lipid_core::{HistoryEntry, LipidPanel, SessionStore};
use lipid_types::{AnswerResult, LipidCode, LipidDetail, Mode, NonEmptyText};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(root, health, ask, history),
    components(schemas(
        RootRes,
        HealthRes,
        ErrorRes,
        AskReq,
        AnswerResult,
        LipidDetail,
        LipidCode,
        Mode,
        HistoryItem,
        HistoryRes,
    ))
)]
pub struct ChatApiDoc;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service banner", body = RootRes)
    )
)]
pub async fn root() -> Json<RootRes> {
    Json(RootRes {
        message: "Chat service is running".into(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
pub async fn health() -> Json<HealthRes> {
    Json(chat_health().check_health())
}

#[utoipa::path(
    post,
    path = "/api/chat/ask",
    request_body = AskReq,
    responses(
        (status = 200, description = "Interpreted answer", body = AnswerResult),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Answer a question about lipid values
///
/// Readings come from `lipids` when present; otherwise from the report session named by
/// `report_id`. The exchange is appended to the user's chat history.
///
/// # Errors
/// Returns `500 Internal Server Error` if:
/// - the report session store cannot be read, or
/// - the exchange cannot be written to chat history.
#[axum::debug_handler]
pub async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskReq>,
) -> Result<Json<AnswerResult>, ApiError> {
    let user_id = NonEmptyText::or_fallback(req.user_id.as_deref(), DEFAULT_USER_ID);

    let panel = match req.lipids.as_ref().filter(|lipids| !lipids.is_empty()) {
        Some(lipids) => LipidPanel::from_json_map(lipids),
        None => match req.report_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            Some(report_id) => {
                let stored = state.sessions().get(report_id)?;
                if stored.is_none() {
                    tracing::debug!(report_id, "report session unknown or expired");
                }
                stored.unwrap_or_default()
            }
            None => LipidPanel::new(),
        },
    };

    let result = state.engine().interpret_panel(&req.question, &panel);

    state
        .history()
        .record(&user_id, &req.question, &result)
        .map_err(|e| {
            tracing::error!("chat history write error: {:?}", e);
            ApiError::from(e)
        })?;

    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/api/chat/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Recent exchanges, oldest first", body = HistoryRes),
        (status = 400, description = "Invalid limit", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// List a user's most recent chat exchanges
#[axum::debug_handler]
pub async fn history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryRes>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let limit = query.limit.unwrap_or(i64::from(DEFAULT_HISTORY_LIMIT));
    let limit = u32::try_from(limit)
        .ok()
        .filter(|l| (1..=MAX_HISTORY_LIMIT).contains(l))
        .ok_or_else(|| {
            ApiError::BadRequest(format!("limit must be between 1 and {MAX_HISTORY_LIMIT}"))
        })?;
    let user_id = NonEmptyText::or_fallback(query.user_id.as_deref(), DEFAULT_USER_ID);

    let items: Vec<HistoryItem> = state
        .history()
        .recent(&user_id, limit)?
        .into_iter()
        .map(history_item)
        .collect();

    Ok(Json(HistoryRes {
        count: items.len(),
        items,
        user_id: user_id.to_string(),
    }))
}

fn history_item(entry: HistoryEntry) -> HistoryItem {
    HistoryItem {
        id: entry.id,
        question: entry.question,
        answer: entry.answer,
        mode: entry.mode,
        sources: entry.sources,
        highlights: entry.highlights,
        created_at: entry.created_at,
    }
}

#[cfg(test)]
mod tests {
    use crate::chat_router;
    use crate::tests::{json_body, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use lipid_core::{LipidPanel, SessionStore};
    use lipid_types::LipidCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_root_banner() {
        let (state, _temp) = test_state(true);
        let response = chat_router(state).oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"message": "Chat service is running"})
        );
    }

    #[tokio::test]
    async fn test_ask_interprets_and_records_history() {
        let (state, _temp) = test_state(true);
        let app = chat_router(state);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/chat/ask",
                json!({"question": "Is my LDL high?", "lipids": {"LDL": 145, "HDL": "38"}, "user_id": "  alice "}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let answer = json_body(response).await;
        assert_eq!(answer["mode"], "deterministic");
        assert_eq!(answer["details"][0]["code"], "LDL");
        assert_eq!(answer["details"][0]["category"], "borderline-high");
        assert_eq!(answer["sources"][0], "lipids.csv:LDL");

        let response = app
            .oneshot(get("/api/chat/history?user_id=alice"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let history = json_body(response).await;
        assert_eq!(history["user_id"], "alice");
        assert_eq!(history["count"], 1);
        assert_eq!(history["items"][0]["question"], "Is my LDL high?");
        assert_eq!(history["items"][0]["mode"], "deterministic");
    }

    #[tokio::test]
    async fn test_ask_without_readings_short_circuits() {
        let (state, _temp) = test_state(true);
        let response = chat_router(state)
            .oneshot(post_json("/api/chat/ask", json!({"question": "What about mine?"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let answer = json_body(response).await;
        assert_eq!(
            answer["answer"],
            lipid_core::constants::NO_VALID_READINGS
        );
        assert_eq!(answer["details"], json!([]));
    }

    #[tokio::test]
    async fn test_ask_uses_report_session_when_lipids_absent() {
        let (state, _temp) = test_state(true);
        let mut panel = LipidPanel::new();
        panel.insert(LipidCode::Tg, 260.0);
        let report_id = state.sessions().create(panel).unwrap();

        let response = chat_router(state)
            .oneshot(post_json(
                "/api/chat/ask",
                json!({"question": "Explain my triglycerides", "lipids": {}, "report_id": report_id}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let answer = json_body(response).await;
        assert_eq!(answer["details"][0]["code"], "TG");
        assert_eq!(answer["details"][0]["category"], "high");
    }

    #[tokio::test]
    async fn test_history_defaults_and_limit_validation() {
        let (state, _temp) = test_state(true);
        let app = chat_router(state);

        let response = app.clone().oneshot(get("/api/chat/history")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let history = json_body(response).await;
        assert_eq!(history["user_id"], "default");
        assert_eq!(history["count"], 0);

        for bad in ["0", "201", "-5", "abc", "2.5"] {
            let response = app
                .clone()
                .oneshot(get(&format!("/api/chat/history?limit={bad}")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "limit={bad}");
            let json = json_body(response).await;
            assert!(json["detail"].is_string(), "limit={bad}: {json}");
        }
    }

    #[tokio::test]
    async fn test_history_returns_oldest_first_within_limit() {
        let (state, _temp) = test_state(true);
        let app = chat_router(state);
        for question in ["one", "two", "three"] {
            let response = app
                .clone()
                .oneshot(post_json(
                    "/api/chat/ask",
                    json!({"question": question, "lipids": {"CHOL": 180}}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .oneshot(get("/api/chat/history?limit=2&user_id=default"))
            .await
            .unwrap();
        let history = json_body(response).await;
        assert_eq!(history["count"], 2);
        assert_eq!(history["items"][0]["question"], "two");
        assert_eq!(history["items"][1]["question"], "three");
    }
}
