pub mod health;
pub mod page;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analyzer page
        .route("/", get(page::handle_page))
        .route("/analyze", post(page::handle_form_submit))
        .route("/static/style.css", get(page::handle_stylesheet))
        // Analysis API
        .route("/api/analyze", post(handlers::handle_analyze))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::tests::{analyzer, sample_payload, ScriptedLlm};
    use crate::analysis::store::tests::memory_pool;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app(competencies: Value) -> Router {
        let pool = memory_pool().await;
        let llm = Arc::new(ScriptedLlm::new("Normalized summary.", competencies));
        let analyzer = Arc::new(analyzer(pool.clone(), llm, vec![0.0, 1.0, 0.0]));
        build_router(AppState { db: pool, analyzer })
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn json_request(body: Value) -> Request<Body> {
        Request::post("/api/analyze")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn form_request(body: &'static str) -> Request<Body> {
        Request::post("/analyze")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(sample_payload())
            .await
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "role-analyzer");
        assert_eq!(body["database"], "ok");
    }

    #[tokio::test]
    async fn test_index_serves_page_with_idle_form() {
        let response = app(sample_payload())
            .await
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains(r#"id="analyze-form""#));
        assert!(html.contains(r#"id="results" hidden"#));
        assert!(!html.contains("button--loading"));
    }

    #[tokio::test]
    async fn test_stylesheet_is_css() {
        let response = app(sample_payload())
            .await
            .oneshot(Request::get("/static/style.css").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/css; charset=utf-8"
        );
        assert!(body_text(response).await.contains(".competency-card"));
    }

    #[tokio::test]
    async fn test_api_analyze_returns_result() {
        let response = app(sample_payload())
            .await
            .oneshot(json_request(json!({
                "job_title": "Backend Engineer",
                "job_description": "Builds APIs in Python",
                "years_of_experience": 4
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["normalized_job_role_summary"], "Normalized summary.");
        assert_eq!(body["competencies"].as_array().unwrap().len(), 3);
        assert_eq!(body["competencies"][2]["type"], "soft");
        assert!(uuid::Uuid::parse_str(body["job_role_id"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_api_analyze_rejects_missing_field_with_detail() {
        let response = app(sample_payload())
            .await
            .oneshot(json_request(json!({"job_title": "Backend Engineer"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(body["detail"].as_str().unwrap().contains("job_description"));
    }

    #[tokio::test]
    async fn test_api_analyze_reports_too_few_competencies() {
        let response = app(json!([{"name": "Only one", "level": 3}]))
            .await
            .oneshot(json_request(json!({
                "job_title": "Backend Engineer",
                "job_description": "Builds APIs",
                "years_of_experience": 2
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(
            body["detail"],
            "At least 3 competencies are required; received 1."
        );
    }

    #[tokio::test]
    async fn test_form_submit_renders_cards() {
        let response = app(sample_payload())
            .await
            .oneshot(form_request(
                "job_title=Backend+Engineer&job_description=Builds+APIs&years_of_experience=4",
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert_eq!(html.matches(r#"<div class="competency-card">"#).count(), 3);
        assert!(html.contains("Normalized summary."));
        assert!(html.contains(r#"value="Backend Engineer""#));
        assert!(!html.contains("disabled"));
    }

    #[tokio::test]
    async fn test_form_submit_with_bad_years_shows_alert() {
        let response = app(sample_payload())
            .await
            .oneshot(form_request(
                "job_title=Engineer&job_description=Code&years_of_experience=lots",
            ))
            .await
            .unwrap();

        let html = body_text(response).await;
        assert!(html.contains("Years of experience must be a number."));
        assert!(html.contains(r#"id="results" hidden"#));
        assert!(!html.contains("competency-card__name"));
    }
}
