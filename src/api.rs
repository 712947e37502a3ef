//! JSON endpoints under `/api`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::error::UpstreamError;
use crate::image::AspectRatio;
use crate::memes::{self, NewsMeme};
use crate::reddit::{self, RedditPost};
use crate::routes::AppState;

pub enum ApiError {
    /// 400 with `{error}`
    BadRequest(String),
    /// 500 with `{error}`
    Internal(String),
    /// 500 with `{status: "error", message}`
    Batch(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response(),
            ApiError::Batch(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": message })),
            )
                .into_response(),
        }
    }
}

/// Client-facing message for a failed headline fetch.
pub fn news_error_message(err: &UpstreamError) -> String {
    match err {
        UpstreamError::MissingApiKey => err.to_string(),
        _ => "Failed to fetch news".to_string(),
    }
}

/// Client-facing message for a failed news meme batch.
pub fn news_batch_error_message(err: &UpstreamError) -> String {
    match err {
        UpstreamError::InvalidShape(_) => err.to_string(),
        _ => "Failed to fetch news".to_string(),
    }
}

pub async fn news(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let body = state
        .news
        .top_headlines(state.news.page_size())
        .await
        .map_err(|e| {
            error!("Error fetching news: {}", e);
            ApiError::Internal(news_error_message(&e))
        })?;

    Ok(Json(body))
}

#[derive(Debug, Serialize)]
pub struct RedditResponse {
    pub posts: Vec<RedditPost>,
}

pub async fn reddit(State(state): State<Arc<AppState>>) -> Result<Json<RedditResponse>, ApiError> {
    let results = state.reddit.fetch_all().await;

    if reddit::all_failed(&results) {
        error!("Error fetching Reddit posts: every subreddit failed");
        return Err(ApiError::Internal(
            "Failed to fetch memes from Reddit".to_string(),
        ));
    }

    Ok(Json(RedditResponse {
        posts: reddit::image_posts(&results),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMemeRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    /// Accepted for compatibility; the configured model is always used.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub aspect_ratio: Option<String>,
    #[serde(default)]
    pub negative_prompt: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMemeResponse {
    pub image_url: String,
}

pub async fn generate_meme(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateMemeRequest>, JsonRejection>,
) -> Result<Json<GenerateMemeResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        error!("Error generating meme: {}", e);
        ApiError::BadRequest(e.body_text())
    })?;

    let prompt = request.prompt.as_deref().map(str::trim).unwrap_or_default();
    if prompt.is_empty() {
        return Err(ApiError::BadRequest("Prompt is required".to_string()));
    }

    let aspect_ratio = request
        .aspect_ratio
        .as_deref()
        .map(AspectRatio::from_label)
        .unwrap_or_default();

    info!(
        "Generating meme (requested model: {})",
        request.model.as_deref().unwrap_or("flux")
    );
    let url = state
        .images
        .generate(
            &memes::enhance_prompt(prompt),
            aspect_ratio,
            request.negative_prompt.as_deref(),
        )
        .map_err(|e| {
            error!("Error generating meme: {}", e);
            ApiError::Internal(format!("Failed to generate image: {}", e))
        })?;

    Ok(Json(GenerateMemeResponse {
        image_url: url.to_string(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsMemesResponse {
    pub status: &'static str,
    pub total_results: usize,
    pub articles: Vec<NewsMeme>,
}

pub async fn generate_from_news(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NewsMemesResponse>, ApiError> {
    let articles = state
        .news
        .articles(state.news.meme_page_size())
        .await
        .map_err(|e| {
            error!("Error in generate-from-news: {}", e);
            ApiError::Batch(news_batch_error_message(&e))
        })?;

    let articles = memes::generate_for_articles(&state.images, articles);

    Ok(Json(NewsMemesResponse {
        status: "success",
        total_results: articles.len(),
        articles,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::routes;

    fn offline_app() -> axum::Router {
        // Nothing listens on port 9, so any upstream call fails fast.
        let config = Config::from_str(
            r#"
            [news]
            base_url = "http://127.0.0.1:9"
            [reddit]
            base_url = "http://127.0.0.1:9"
            "#,
        )
        .unwrap();
        let state = AppState::from_config(&config).unwrap();
        routes::app(Arc::new(state))
    }

    async fn json_body(response: Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    mod error_message_tests {
        use super::*;

        #[test]
        fn test_news_error_message() {
            assert_eq!(
                news_error_message(&UpstreamError::MissingApiKey),
                "News API key not configured"
            );
            assert_eq!(news_error_message(&UpstreamError::Status(500)), "Failed to fetch news");
        }

        #[test]
        fn test_news_batch_error_message() {
            assert_eq!(
                news_batch_error_message(&UpstreamError::InvalidShape("Invalid news data format")),
                "Invalid news data format"
            );
            assert_eq!(
                news_batch_error_message(&UpstreamError::MissingApiKey),
                "Failed to fetch news"
            );
        }
    }

    mod generate_meme_tests {
        use super::*;

        #[tokio::test]
        async fn test_generate_meme_returns_image_url() {
            let response = offline_app()
                .oneshot(post_json(
                    "/api/generate-meme",
                    r#"{"prompt": "cats vs dogs", "aspectRatio": "9:16"}"#,
                ))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = json_body(response).await;
            let url = body["imageUrl"].as_str().unwrap();
            assert!(url.starts_with("https://image.pollinations.ai/prompt/A%20funny%20meme%20about"));
            assert!(url.contains("width=576&height=1024"));
            assert!(url.contains("negative_prompt="));
        }

        #[tokio::test]
        async fn test_generate_meme_blank_prompt() {
            let response = offline_app()
                .oneshot(post_json("/api/generate-meme", r#"{"prompt": "   "}"#))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(response).await["error"], "Prompt is required");
        }

        #[tokio::test]
        async fn test_generate_meme_missing_prompt() {
            let response = offline_app()
                .oneshot(post_json("/api/generate-meme", "{}"))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }

        #[tokio::test]
        async fn test_generate_meme_invalid_json() {
            let response = offline_app()
                .oneshot(post_json("/api/generate-meme", "{not json"))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            assert!(json_body(response).await["error"].is_string());
        }

        #[tokio::test]
        async fn test_generate_meme_null_model() {
            let response = offline_app()
                .oneshot(post_json(
                    "/api/generate-meme",
                    r#"{"prompt": "cat", "model": null}"#,
                ))
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::OK);
            let body = json_body(response).await;
            assert!(body["imageUrl"].as_str().unwrap().contains("model=flux"));
        }

        #[tokio::test]
        async fn test_generate_meme_explicit_empty_negative_prompt() {
            let response = offline_app()
                .oneshot(post_json(
                    "/api/generate-meme",
                    r#"{"prompt": "cats", "negativePrompt": ""}"#,
                ))
                .await
                .unwrap();

            let body = json_body(response).await;
            assert!(!body["imageUrl"].as_str().unwrap().contains("negative_prompt"));
        }
    }

    mod upstream_failure_tests {
        use super::*;

        #[tokio::test]
        async fn test_news_without_key_is_config_error() {
            let response = offline_app()
                .oneshot(Request::builder().uri("/api/news").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(json_body(response).await["error"], "News API key not configured");
        }

        #[tokio::test]
        async fn test_news_memes_without_key() {
            let response = offline_app()
                .oneshot(
                    Request::builder()
                        .uri("/api/generate-from-news")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            let body = json_body(response).await;
            assert_eq!(body["status"], "error");
            assert_eq!(body["message"], "Failed to fetch news");
        }

        #[tokio::test]
        async fn test_reddit_all_subreddits_unreachable() {
            let response = offline_app()
                .oneshot(Request::builder().uri("/api/reddit").body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                json_body(response).await["error"],
                "Failed to fetch memes from Reddit"
            );
        }
    }
}
