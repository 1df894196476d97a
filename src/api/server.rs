//! HTTP server implementation for the API

use anyhow::Result;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use super::handlers;
use super::models::{DictionaryQuery, ExportQuery, SubtitleQuery, VideoInfoQuery};
use crate::config::Config;
use crate::error::SubtitleError;
use crate::service::SubtitleService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: SubtitleService,
    pub config: Arc<Config>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(service: SubtitleService, config: Arc<Config>) -> crate::error::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.provider.timeout_seconds))
            .build()?;

        Ok(Self {
            service,
            config,
            http,
        })
    }
}

/// Build the application router
pub fn build_router(app_state: AppState) -> Router {
    // Configure CORS to allow browser access
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
        .route("/subtitles", get(subtitles_handler))
        .route("/api/get-subs", get(subtitles_handler))
        .route("/subtitles/export", get(export_handler))
        .route("/video-info", get(video_info_handler))
        .route("/api/video-info", get(video_info_handler))
        .route("/dictionary", get(dictionary_handler))
        .route("/api/dict", get(dictionary_handler))
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// Configure and start the HTTP server
pub async fn start_http_server(config: Arc<Config>) -> Result<()> {
    let address = config.bind_address();
    info!("🚀 Starting HTTP server on {}", address);

    let service = SubtitleService::new(&config)?;
    let app = build_router(AppState::new(service, config)?);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("🌐 API server listening on http://{}", address);

    axum::serve(listener, app).await?;

    Ok(())
}

fn error_response(error: SubtitleError) -> Response {
    (
        error.status_code(),
        Json(serde_json::json!({ "error": error.client_message() })),
    )
        .into_response()
}

fn json_response(result: crate::error::Result<serde_json::Value>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(data)).into_response(),
        Err(e) => error_response(e),
    }
}

/// Health check handler
async fn health_handler() -> Response {
    json_response(handlers::health_check().await)
}

/// Query parameters, or the `{error}` payload when they do not decode
fn parse_query<T>(
    query: std::result::Result<Query<T>, QueryRejection>,
) -> std::result::Result<T, Response> {
    query
        .map(|Query(query)| query)
        .map_err(|rejection| error_response(SubtitleError::InvalidRequest(rejection.body_text())))
}

/// Subtitle lookup handler
async fn subtitles_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<SubtitleQuery>, QueryRejection>,
) -> Response {
    match parse_query(query) {
        Ok(query) => json_response(handlers::get_subtitles(&state.service, &query).await),
        Err(response) => response,
    }
}

/// Caption document export handler
async fn export_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<ExportQuery>, QueryRejection>,
) -> Response {
    let query = match parse_query(query) {
        Ok(query) => query,
        Err(response) => return response,
    };

    match handlers::export_subtitles(&state.service, &query).await {
        Ok((content_type, body)) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
        }
        Err(e) => error_response(e),
    }
}

/// Video info handler
async fn video_info_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<VideoInfoQuery>, QueryRejection>,
) -> Response {
    match parse_query(query) {
        Ok(query) => json_response(handlers::get_video_info(&state.service, &query).await),
        Err(response) => response,
    }
}

/// Dictionary passthrough handler
async fn dictionary_handler(
    State(state): State<AppState>,
    query: std::result::Result<Query<DictionaryQuery>, QueryRejection>,
) -> Response {
    match parse_query(query) {
        Ok(query) => json_response(
            handlers::lookup_word(&state.http, &state.config.server.dictionary_endpoint, &query)
                .await,
        ),
        Err(response) => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::error::Result as SubtitleResult;
    use crate::service::ProviderFactory;
    use crate::subtitles::extractor::{CaptionTrack, ExtractedVideoInfo, LanguageTracks};
    use crate::subtitles::{CaptionExtractor, Phrase, SubtitleFetchOptions, SubtitleProvider};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct EmptyProvider;

    #[async_trait]
    impl SubtitleProvider for EmptyProvider {
        async fn fetch_subtitles(
            &self,
            video_id: &str,
            _options: &SubtitleFetchOptions,
        ) -> SubtitleResult<Vec<Phrase>> {
            Err(SubtitleError::Fetch(format!("No subtitles found for {}", video_id)))
        }

        fn name(&self) -> &'static str {
            "empty"
        }
    }

    struct DutchExtractor;

    #[async_trait]
    impl CaptionExtractor for DutchExtractor {
        async fn extract_info(&self, _video_id: &str) -> SubtitleResult<ExtractedVideoInfo> {
            Ok(ExtractedVideoInfo {
                language: Some("nl".into()),
                subtitles: LanguageTracks::from_pairs(vec![(
                    "en".to_string(),
                    vec![CaptionTrack::new("vtt", "u")],
                )]),
                ..ExtractedVideoInfo::default()
            })
        }

        async fn download_track(&self, _url: &str) -> SubtitleResult<String> {
            Err(SubtitleError::Upstream("not used".into()))
        }
    }

    fn test_app(temp_dir: &TempDir, dictionary_endpoint: &str) -> Router {
        let config = ConfigBuilder::new()
            .with_cache_root(temp_dir.path())
            .with_dictionary_endpoint(dictionary_endpoint)
            .build();
        let factory: ProviderFactory =
            Arc::new(|| Ok(Box::new(EmptyProvider) as Box<dyn SubtitleProvider>));
        let service = SubtitleService::with_parts(&config, factory, Arc::new(DutchExtractor));

        build_router(AppState::new(service, Arc::new(config)).unwrap())
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    /// Stand-in dictionary service on a local port
    async fn spawn_dictionary() -> String {
        let app = Router::new().route(
            "/entries/:word",
            get(|axum::extract::Path(word): axum::extract::Path<String>| async move {
                match word.as_str() {
                    "hello" => (
                        StatusCode::OK,
                        Json(serde_json::json!([{ "word": "hello", "meanings": [] }])),
                    ),
                    "boom" => (StatusCode::BAD_GATEWAY, Json(serde_json::json!({}))),
                    _ => (StatusCode::NOT_FOUND, Json(serde_json::json!({ "title": "No Definitions Found" }))),
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/entries/", address)
    }

    #[tokio::test]
    async fn test_missing_video_id_is_bad_request() {
        let temp_dir = TempDir::new().unwrap();
        let (status, body) = get_json(test_app(&temp_dir, "http://unused/"), "/subtitles").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing videoId");
    }

    #[tokio::test]
    async fn test_undecodable_query_is_json_bad_request() {
        let temp_dir = TempDir::new().unwrap();

        for uri in [
            "/subtitles?videoId=a&videoId=b",
            "/subtitles/export?videoId=a&videoId=b",
            "/video-info?videoId=a&videoId=b",
            "/dictionary?word=a&word=b",
        ] {
            let response = test_app(&temp_dir, "http://unused/")
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
            let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert!(json["error"].as_str().unwrap().contains("duplicate field"), "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_unknown_video_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let (status, body) = get_json(
            test_app(&temp_dir, "http://unused/"),
            "/subtitles?videoId=abc123&lang=auto",
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No subtitles found for video abc123");
    }

    #[tokio::test]
    async fn test_demo_video_returns_phrases_on_both_paths() {
        let temp_dir = TempDir::new().unwrap();

        for uri in ["/subtitles?videoId=dQw4w9WgXcQ", "/api/get-subs?videoId=dQw4w9WgXcQ&lang=auto"] {
            let (status, body) = get_json(test_app(&temp_dir, "http://unused/"), uri).await;
            assert_eq!(status, StatusCode::OK);
            let phrases = body["phrases"].as_array().unwrap();
            assert_eq!(phrases.len(), 4);
            assert_eq!(phrases[0]["text"], "We're no strangers to love");
            assert_eq!(phrases[1]["startSec"], 2.0);
        }
    }

    #[tokio::test]
    async fn test_video_info_shape() {
        let temp_dir = TempDir::new().unwrap();
        let (status, body) =
            get_json(test_app(&temp_dir, "http://unused/"), "/video-info?videoId=abc123").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["videoId"], "abc123");
        assert_eq!(body["originalLanguage"], "nl");
        assert_eq!(body["availableLanguages"], serde_json::json!(["en"]));
        assert_eq!(body["hasManualCaptions"], true);
        assert_eq!(body["hasAutoCaptions"], false);
    }

    #[tokio::test]
    async fn test_export_formats() {
        let temp_dir = TempDir::new().unwrap();
        let response = test_app(&temp_dir, "http://unused/")
            .oneshot(
                Request::builder()
                    .uri("/subtitles/export?videoId=dQw4w9WgXcQ&format=srt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/x-subrip; charset=utf-8"
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).starts_with("1\n00:00:00,000 --> 00:00:02,000\n"));

        let (status, body) = get_json(
            test_app(&temp_dir, "http://unused/"),
            "/subtitles/export?videoId=dQw4w9WgXcQ&format=ass",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown subtitle format: ass");
    }

    #[tokio::test]
    async fn test_dictionary_passthrough() {
        let temp_dir = TempDir::new().unwrap();
        let endpoint = spawn_dictionary().await;

        let (status, body) = get_json(test_app(&temp_dir, &endpoint), "/dictionary?word=hello").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"][0]["word"], "hello");

        let (status, body) = get_json(test_app(&temp_dir, &endpoint), "/api/dict?word=qwzx").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"], "Not found");
        assert!(body["translateUrl"].as_str().unwrap().contains("text=qwzx"));

        let (status, body) = get_json(test_app(&temp_dir, &endpoint), "/dictionary?word=boom").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch definition");

        let (status, _) = get_json(test_app(&temp_dir, &endpoint), "/dictionary").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let temp_dir = TempDir::new().unwrap();
        let (status, body) = get_json(test_app(&temp_dir, "http://unused/"), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
