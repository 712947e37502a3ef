use chrono::DateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::NewsConfig;
use crate::error::UpstreamError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// A NewsAPI article. Fields the app doesn't read are kept in `extra` so they
/// survive re-serialisation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub source: Option<ArticleSource>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Article {
    pub fn title_text(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled")
    }

    pub fn description_text(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn link(&self) -> &str {
        self.url.as_deref().unwrap_or("#")
    }

    pub fn source_name(&self) -> &str {
        self.source
            .as_ref()
            .and_then(|s| s.name.as_deref())
            .unwrap_or_default()
    }

    /// Publication date as "March 4, 2025", or the raw value if it isn't RFC 3339.
    pub fn published_date(&self) -> String {
        match self.published_at.as_deref() {
            Some(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.format("%B %-d, %Y").to_string())
                .unwrap_or_else(|_| raw.to_string()),
            None => String::new(),
        }
    }
}

pub struct NewsClient {
    client: Client,
    config: NewsConfig,
}

impl NewsClient {
    pub fn new(client: Client, config: NewsConfig) -> Self {
        Self { client, config }
    }

    pub fn page_size(&self) -> u32 {
        self.config.page_size
    }

    pub fn meme_page_size(&self) -> u32 {
        self.config.meme_page_size
    }

    /// Fetch top headlines and return the upstream body untouched.
    pub async fn top_headlines(&self, page_size: u32) -> Result<Value, UpstreamError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(UpstreamError::MissingApiKey)?;

        let url = format!("{}/top-headlines", self.config.base_url.trim_end_matches('/'));
        let page_size = page_size.to_string();

        info!("Fetching top headlines ({} per page)", page_size);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("country", self.config.country.as_str()),
                ("pageSize", page_size.as_str()),
                ("apiKey", api_key),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("News API responded with {}", status);
            return Err(UpstreamError::Status(status.as_u16()));
        }

        Ok(response.json::<Value>().await?)
    }

    /// Fetch top headlines and require a well-formed `articles` array.
    pub async fn articles(&self, page_size: u32) -> Result<Vec<Article>, UpstreamError> {
        let body = self.top_headlines(page_size).await?;
        parse_articles(body)
    }
}

/// Extract articles from a headlines body. Only a missing or non-array
/// `articles` field is an error; individual malformed articles are skipped.
pub fn parse_articles(mut body: Value) -> Result<Vec<Article>, UpstreamError> {
    let Some(Value::Array(articles)) = body.get_mut("articles").map(Value::take) else {
        return Err(UpstreamError::InvalidShape("Invalid news data format"));
    };

    Ok(articles
        .into_iter()
        .filter_map(|article| match serde_json::from_value::<Article>(article) {
            Ok(article) => Some(article),
            Err(e) => {
                warn!("Skipping malformed article: {}", e);
                None
            }
        })
        .collect())
}
