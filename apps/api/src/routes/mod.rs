pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::skills::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/spacy_extract_skills",
            post(handlers::handle_extract_skills),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::recognizer::PatternRuler;
    use crate::skills::fetcher::Fetcher;
    use crate::test_support::{spawn_file_host, FileHost};

    fn state_for(host: &FileHost, timeout: Duration) -> AppState {
        let ruler = PatternRuler::from_jsonl(
            r#"{"label":"SKILL","pattern":[{"LOWER":"rust"}]}
{"label":"SKILL","pattern":[{"LOWER":"python"}]}"#,
        )
        .unwrap();
        AppState {
            fetcher: Fetcher::new(host.base_url(), timeout).unwrap(),
            recognizer: Arc::new(ruler),
        }
    }

    fn json_request(body: &str) -> Request<Body> {
        Request::post("/spacy_extract_skills")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let host = spawn_file_host().await;
        let router = build_router(state_for(&host, Duration::from_secs(5)));
        let request = Request::get("/health").body(Body::empty()).unwrap();

        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_non_json_body_is_415() {
        let host = spawn_file_host().await;
        let router = build_router(state_for(&host, Duration::from_secs(5)));
        let request = Request::post("/spacy_extract_skills")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("file_url=cv.pdf"))
            .unwrap();

        let (status, body) = send(router, request).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(
            body,
            json!({ "error": "Request content type must be application/json" })
        );
        assert_eq!(host.hits(), 0);
    }

    #[tokio::test]
    async fn test_missing_file_url_is_400_without_fetch() {
        let host = spawn_file_host().await;
        let router = build_router(state_for(&host, Duration::from_secs(5)));

        let (status, body) = send(router, json_request(r#"{"other": 1}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "No file URL received." }));
        assert_eq!(host.hits(), 0);
    }

    #[tokio::test]
    async fn test_empty_file_url_is_400() {
        let host = spawn_file_host().await;
        let router = build_router(state_for(&host, Duration::from_secs(5)));

        let (status, _) = send(router, json_request(r#"{"file_url": ""}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(host.hits(), 0);
    }

    #[tokio::test]
    async fn test_upstream_404_is_forwarded_with_url() {
        let host = spawn_file_host().await;
        let router = build_router(state_for(&host, Duration::from_secs(5)));

        let (status, body) = send(router, json_request(r#"{"file_url": "nobody.pdf"}"#)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let expected = format!("Failed to fetch PDF from URL: {}nobody.pdf", host.base_url());
        assert_eq!(body["error"], expected.as_str());
        assert_eq!(host.hits(), 1);
    }

    #[tokio::test]
    async fn test_cv_pdf_reports_skills_emails_and_phones() {
        let host = spawn_file_host().await;
        let router = build_router(state_for(&host, Duration::from_secs(5)));

        let (status, body) = send(router, json_request(r#"{"file_url": "cv.pdf"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "skills": [".Net", "Dotnet", "Java", "Python"],
                "emails": "jane.doe@example.com",
                "phones": "(555) 123-4567"
            })
        );
        assert_eq!(host.hits(), 1);
    }

    #[tokio::test]
    async fn test_blank_pdf_reports_nothing() {
        let host = spawn_file_host().await;
        let router = build_router(state_for(&host, Duration::from_secs(5)));

        let (status, body) = send(router, json_request(r#"{"file_url": "blank.pdf"}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "skills": [], "emails": "", "phones": "" }));
    }

    #[tokio::test]
    async fn test_unparseable_pdf_is_500() {
        let host = spawn_file_host().await;
        let router = build_router(state_for(&host, Duration::from_secs(5)));

        let (status, body) = send(router, json_request(r#"{"file_url": "garbage.pdf"}"#)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().is_some_and(|m| !m.is_empty()));
        assert!(body.get("skills").is_none());
    }

    #[tokio::test]
    async fn test_slow_upstream_is_504() {
        let host = spawn_file_host().await;
        let router = build_router(state_for(&host, Duration::from_millis(200)));

        let (status, body) = send(router, json_request(r#"{"file_url": "slow.pdf"}"#)).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert!(body["error"].as_str().unwrap().contains("slow.pdf"));
    }
}
