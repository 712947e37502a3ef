use std::sync::Arc;
use std::time::Duration;

use askama::Template;
use axum::{
    extract::{rejection::FormRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Form, Router,
};
use reqwest::Client;
use serde::Deserialize;
use tower_http::services::ServeDir;
use tracing::error;

use crate::api;
use crate::config::Config;
use crate::image::{AspectRatio, ImageGenerator};
use crate::memes::{self, MemeForm, MemeTemplate, NewsMeme, MEME_TEMPLATES, STYLES};
use crate::news::{Article, NewsClient};
use crate::reddit::{self, RedditClient, RedditPost};

pub struct AppState {
    pub news: NewsClient,
    pub reddit: RedditClient,
    pub images: ImageGenerator,
}

impl AppState {
    /// Build the upstream clients, sharing one HTTP client between them.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.server.request_timeout_secs))
            .user_agent(config.server.user_agent.as_str())
            .build()?;

        Ok(Self {
            news: NewsClient::new(client.clone(), config.news.clone()),
            reddit: RedditClient::new(client, config.reddit.clone()),
            images: ImageGenerator::new(&config.image)?,
        })
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/trending", get(trending))
        .route("/community", get(community))
        .route("/memegenerator", get(meme_generator).post(meme_generator_submit))
        .route("/news-memes", get(news_memes))
        .route("/health", get(health))
        .route("/api/news", get(api::news))
        .route("/api/reddit", get(api::reddit))
        .route("/api/generate-meme", post(api::generate_meme))
        .route("/api/generate-from-news", get(api::generate_from_news))
        .nest_service("/static", ServeDir::new("static"))
        .with_state(state)
}

// Template structs
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub subreddits: Vec<String>,
}

#[derive(Template)]
#[template(path = "trending.html")]
pub struct TrendingTemplate {
    pub articles: Vec<TrendingArticle>,
    pub error: Option<String>,
}

pub struct TrendingArticle {
    pub article: Article,
    pub meme_link: String,
}

#[derive(Template)]
#[template(path = "community.html")]
pub struct CommunityTemplate {
    pub posts: Vec<RedditPost>,
    pub filters: Vec<SelectOption>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "memegenerator.html")]
pub struct MemeGeneratorTemplate {
    pub form: MemeForm,
    pub templates: Vec<SelectOption>,
    pub template_description: &'static str,
    pub styles: Vec<SelectOption>,
    pub ratios: Vec<SelectOption>,
    pub image_url: Option<String>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "news_memes.html")]
pub struct NewsMemesTemplate {
    pub memes: Vec<NewsMeme>,
    pub error: Option<String>,
}

pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl SelectOption {
    fn new(value: &str, label: &str, current: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            selected: value.eq_ignore_ascii_case(current),
        }
    }
}

impl MemeGeneratorTemplate {
    fn new(form: MemeForm) -> Self {
        let templates = MEME_TEMPLATES
            .iter()
            .map(|t| SelectOption::new(t.id, t.name, &form.template))
            .collect();
        let styles = STYLES
            .iter()
            .map(|(value, label)| SelectOption::new(value, label, &form.style))
            .collect();
        let current_ratio = form.aspect().label();
        let ratios = AspectRatio::ALL
            .iter()
            .map(|r| SelectOption::new(r.label(), r.description(), current_ratio))
            .collect();

        Self {
            template_description: MemeTemplate::find(&form.template).description,
            form,
            templates,
            styles,
            ratios,
            image_url: None,
            error: None,
        }
    }

    pub fn quality_label(&self) -> &'static str {
        memes::quality_label(self.form.quality)
    }
}

// Wrapper for HTML responses
struct HtmlTemplate<T>(T);

impl<T: Template> IntoResponse for HtmlTemplate<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

// Route handlers
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    HtmlTemplate(IndexTemplate {
        subreddits: state.reddit.subreddits().to_vec(),
    })
}

pub async fn trending(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let page = match state.news.top_headlines(state.news.page_size()).await {
        Ok(body) => {
            // A body without articles renders as an empty list.
            let articles = crate::news::parse_articles(body).unwrap_or_else(|e| {
                error!("Error reading headlines: {}", e);
                Vec::new()
            });
            TrendingTemplate {
                articles: articles.into_iter().map(trending_article).collect(),
                error: None,
            }
        }
        Err(e) => {
            error!("Error fetching news: {}", e);
            TrendingTemplate {
                articles: Vec::new(),
                error: Some(api::news_error_message(&e)),
            }
        }
    };

    HtmlTemplate(page)
}

fn trending_article(article: Article) -> TrendingArticle {
    let prompt = memes::news_prompt(article.title_text());
    let meme_link = format!(
        "/memegenerator?{}",
        serde_urlencoded::to_string([("prompt", prompt.as_str())]).unwrap_or_default()
    );
    TrendingArticle { article, meme_link }
}

#[derive(Deserialize)]
pub struct CommunityQuery {
    #[serde(default = "default_subreddit_filter")]
    pub subreddit: String,
}

fn default_subreddit_filter() -> String {
    "all".to_string()
}

pub async fn community(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CommunityQuery>,
) -> impl IntoResponse {
    let results = state.reddit.fetch_all().await;

    let mut filters = vec![SelectOption::new("all", "All", &query.subreddit)];
    filters.extend(
        state
            .reddit
            .subreddits()
            .iter()
            .map(|s| SelectOption::new(s, &format!("r/{}", s), &query.subreddit)),
    );

    let page = if reddit::all_failed(&results) {
        error!("Error fetching Reddit posts: every subreddit failed");
        CommunityTemplate {
            posts: Vec::new(),
            filters,
            error: Some("Failed to fetch memes from Reddit".to_string()),
        }
    } else {
        let posts = reddit::filter_by_subreddit(reddit::image_posts(&results), &query.subreddit)
            .into_iter()
            .filter(|post| !post.image_url().is_empty())
            .collect();
        CommunityTemplate {
            posts,
            filters,
            error: None,
        }
    };

    HtmlTemplate(page)
}

#[derive(Deserialize)]
pub struct GeneratorQuery {
    pub prompt: Option<String>,
}

pub async fn meme_generator(Query(query): Query<GeneratorQuery>) -> impl IntoResponse {
    let mut form = MemeForm::default();
    if let Some(prompt) = query.prompt.filter(|p| !p.trim().is_empty()) {
        form.mode = "custom".to_string();
        form.prompt = prompt;
    }

    HtmlTemplate(MemeGeneratorTemplate::new(form))
}

pub async fn meme_generator_submit(
    State(state): State<Arc<AppState>>,
    form: Result<Form<MemeForm>, FormRejection>,
) -> impl IntoResponse {
    let form = match form {
        Ok(Form(form)) => form,
        Err(e) => {
            error!("Invalid meme form: {}", e);
            let mut page = MemeGeneratorTemplate::new(MemeForm::default());
            page.error = Some("Invalid form input".to_string());
            return HtmlTemplate(page);
        }
    };
    let mut page = MemeGeneratorTemplate::new(form);

    let result = page
        .form
        .compose_prompt()
        .map_err(|e| e.to_string())
        .and_then(|prompt| {
            state
                .images
                .generate(&memes::enhance_prompt(&prompt), page.form.aspect(), None)
                .map_err(|e| {
                    error!("Error generating meme: {}", e);
                    "Failed to generate meme".to_string()
                })
        });

    match result {
        Ok(url) => page.image_url = Some(url.to_string()),
        Err(message) => page.error = Some(message),
    }

    HtmlTemplate(page)
}

pub async fn news_memes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let page = match state.news.articles(state.news.meme_page_size()).await {
        Ok(articles) => NewsMemesTemplate {
            memes: memes::generate_for_articles(&state.images, articles),
            error: None,
        },
        Err(e) => {
            error!("Error fetching news memes: {}", e);
            NewsMemesTemplate {
                memes: Vec::new(),
                error: Some(api::news_batch_error_message(&e)),
            }
        }
    };

    HtmlTemplate(page)
}

pub async fn health() -> impl IntoResponse {
    Html("OK")
}
