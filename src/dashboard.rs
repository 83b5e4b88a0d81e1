use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::display::ArticleView;
use crate::insight::{run_cycle, SummaryPolicy};
use crate::news_source::{NewsSource, Notice};
use crate::query::{QueryOptions, DEFAULT_LIMIT};
use crate::summarizer::Summarizer;

/// Shared state for the dashboard server.
#[derive(Clone)]
pub struct AppState {
    pub news: Arc<NewsSource>,
    pub summarizer: Arc<Summarizer>,
    pub summary_policy: SummaryPolicy,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(AppState {
            news: Arc::new(NewsSource::new(config)?),
            summarizer: Arc::new(Summarizer::new(config)?),
            summary_policy: SummaryPolicy::from_flag(config.summary_fallback),
        })
    }
}

// ─── REST response types ───────────────────────────────

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model: String,
}

#[derive(Serialize)]
struct NewsResponse {
    options: QueryOptions,
    articles: Vec<ArticleView>,
    notice: Option<Notice>,
    is_fallback: bool,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Raw dashboard controls. Both stay strings so bad input can fall back to
/// defaults instead of being rejected by the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct ControlsQuery {
    language: Option<String>,
    limit: Option<String>,
}

impl ControlsQuery {
    fn options(&self) -> QueryOptions {
        let default_limit = DEFAULT_LIMIT.to_string();
        QueryOptions::from_user_input(
            self.language.as_deref().unwrap_or("English"),
            self.limit.as_deref().unwrap_or(&default_limit),
        )
    }
}

// ─── Handlers ──────────────────────────────────────────

async fn api_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        model: state.summarizer.model().to_string(),
    })
}

async fn api_news(
    State(state): State<AppState>,
    Query(params): Query<ControlsQuery>,
) -> impl IntoResponse {
    let options = params.options();
    let feed = state.news.fetch(&options).await;

    Json(NewsResponse {
        options,
        articles: feed.articles.iter().map(ArticleView::from).collect(),
        notice: feed.notice,
        is_fallback: feed.is_fallback,
    })
}

async fn api_insight(
    State(state): State<AppState>,
    Query(params): Query<ControlsQuery>,
) -> Response {
    let options = params.options();
    match run_cycle(
        &state.news,
        &state.summarizer,
        options,
        state.summary_policy,
    )
    .await
    {
        Ok(report) => Json(report).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: format!("{:#}", e),
            }),
        )
            .into_response(),
    }
}

async fn serve_dashboard() -> impl IntoResponse {
    Html(include_str!("../static/dashboard.html"))
}

// ─── Router & server startup ───────────────────────────

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/health", get(api_health))
        .route("/api/news", get(api_news))
        .route("/api/insight", get(api_insight));

    Router::new()
        .route("/", get(serve_dashboard))
        .merge(api_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Start the dashboard HTTP server and run until `shutdown` resolves.
pub async fn start_dashboard<F>(config: &Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let state = AppState::from_config(config)?;
    let app = build_router(state);
    let addr = config.dashboard_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind dashboard to {}", addr))?;

    info!("Dashboard listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Dashboard server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use reqwest::Client;
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_state(news_url: String, llm_url: String, policy: SummaryPolicy) -> AppState {
        AppState {
            news: Arc::new(NewsSource::with_client(
                Client::new(),
                news_url,
                "news-key".to_string(),
            )),
            summarizer: Arc::new(Summarizer::with_client(
                Client::new(),
                llm_url,
                "sk-test".to_string(),
                "gpt-5-nano".to_string(),
            )),
            summary_policy: policy,
        }
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), 1_000_000)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    async fn empty_news_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"data": {"articles": []}})),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let state = test_state(
            "http://unused".into(),
            "http://unused".into(),
            SummaryPolicy::Propagate,
        );
        let (status, json) = get_json(build_router(state), "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["model"], "gpt-5-nano");
    }

    #[tokio::test]
    async fn test_news_bad_limit_defaults_to_five() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news"))
            .and(query_param("items", "5"))
            .and(query_param("language", "zh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"articles": [{"title": "BTC ETF flows", "link": "https://x.example/1"}]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let state = test_state(
            format!("{}/news", server.uri()),
            "http://unused".into(),
            SummaryPolicy::Propagate,
        );
        let (status, json) =
            get_json(build_router(state), "/api/news?language=Chinese&limit=abc").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["options"]["limit"], 5);
        assert_eq!(json["options"]["language"], "zh");
        assert_eq!(json["is_fallback"], false);
        assert_eq!(json["articles"][0]["title"], "BTC ETF flows");
        assert_eq!(json["articles"][0]["source"], "Unknown Source");
    }

    #[tokio::test]
    async fn test_news_fallback_includes_notice() {
        let server = empty_news_server().await;
        let state = test_state(
            format!("{}/news", server.uri()),
            "http://unused".into(),
            SummaryPolicy::Propagate,
        );
        let (status, json) = get_json(build_router(state), "/api/news?limit=0").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["is_fallback"], true);
        assert_eq!(json["notice"]["level"], "warning");
        assert_eq!(json["articles"].as_array().unwrap().len(), 2);
        assert_eq!(json["articles"][0]["published"], "13 Nov 2025, 12:00");
    }

    #[tokio::test]
    async fn test_insight_returns_summary() {
        let news = empty_news_server().await;
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": " Bearish. Watch. "}}]
            })))
            .mount(&llm)
            .await;

        let state = test_state(
            format!("{}/news", news.uri()),
            llm.uri(),
            SummaryPolicy::Propagate,
        );
        let (status, json) = get_json(build_router(state), "/api/insight").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["summary"], "Bearish. Watch.");
        assert_eq!(json["articles"][1]["title"], "Ethereum Merge Update");
    }

    #[tokio::test]
    async fn test_insight_summary_failure_is_bad_gateway() {
        let news = empty_news_server().await;
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&llm)
            .await;

        let state = test_state(
            format!("{}/news", news.uri()),
            llm.uri(),
            SummaryPolicy::Propagate,
        );
        let (status, json) = get_json(build_router(state), "/api/insight").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(json["error"].as_str().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn test_insight_summary_failure_with_fallback_policy() {
        let news = empty_news_server().await;
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&llm)
            .await;

        let state = test_state(
            format!("{}/news", news.uri()),
            llm.uri(),
            SummaryPolicy::Fallback,
        );
        let (status, json) = get_json(build_router(state), "/api/insight").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["summary"], crate::insight::SUMMARY_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_dashboard_html_served() {
        let state = test_state(
            "http://unused".into(),
            "http://unused".into(),
            SummaryPolicy::Propagate,
        );
        let resp = build_router(state)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = axum::body::to_bytes(resp.into_body(), 1_000_000)
            .await
            .unwrap();
        let html = String::from_utf8_lossy(&body);
        assert!(html.contains("Crypto Market Insight"));
    }
}
