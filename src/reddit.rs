use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::RedditConfig;
use crate::error::UpstreamError;

const PERMALINK_BASE: &str = "https://reddit.com";
const IMAGE_EXTENSIONS: [&str; 5] = [".jpeg", ".jpg", ".gif", ".png", ".webp"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSource {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewImage {
    pub source: Option<ImageSource>,
    pub resolutions: Vec<ImageSource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Preview {
    pub images: Vec<PreviewImage>,
}

/// A post from a subreddit listing, trimmed to what the UI shows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub url: String,
    pub permalink: String,
    pub score: i64,
    pub num_comments: i64,
    pub author: String,
    pub subreddit: String,
    pub created_utc: f64,
    pub is_video: bool,
    pub is_gallery: bool,
    pub media: Option<Value>,
    pub post_hint: Option<String>,
    pub preview: Option<Preview>,
}

impl RedditPost {
    fn preview_source(&self) -> Option<&ImageSource> {
        self.preview
            .as_ref()
            .and_then(|p| p.images.first())
            .and_then(|img| img.source.as_ref())
    }

    pub fn has_image(&self) -> bool {
        IMAGE_EXTENSIONS.iter().any(|ext| self.url.ends_with(ext)) || self.preview_source().is_some()
    }

    /// URL suitable for an `<img>` tag, or empty if the post has none.
    pub fn image_url(&self) -> String {
        if [".jpg", ".png", ".gif"].iter().any(|ext| self.url.ends_with(ext)) {
            return self.url.clone();
        }
        self.preview_source()
            .map(|source| source.url.replace("&amp;", "&"))
            .unwrap_or_default()
    }

    pub fn score_label(&self) -> String {
        format_number(self.score)
    }

    pub fn comments_label(&self) -> String {
        format_number(self.num_comments)
    }

    pub fn time_ago(&self) -> String {
        format_time_ago(self.created_utc, Utc::now())
    }
}

/// Outcome of fetching one subreddit. A failed fetch carries the error and no posts.
#[derive(Debug, Clone, Serialize)]
pub struct SubredditResult {
    pub subreddit: String,
    pub posts: Vec<RedditPost>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct RedditClient {
    client: Client,
    config: RedditConfig,
}

impl RedditClient {
    pub fn new(client: Client, config: RedditConfig) -> Self {
        Self { client, config }
    }

    pub fn subreddits(&self) -> &[String] {
        &self.config.subreddits
    }

    pub async fn fetch_subreddit(&self, subreddit: &str) -> Result<Vec<RedditPost>, UpstreamError> {
        let url = format!(
            "{}/r/{}/hot.json",
            self.config.base_url.trim_end_matches('/'),
            subreddit
        );
        let limit = self.config.limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit.as_str()), ("raw_json", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }

        let body = response.json::<Value>().await?;
        Ok(parse_listing(body))
    }

    /// Fetch every configured subreddit concurrently. One subreddit failing
    /// never affects the others.
    pub async fn fetch_all(&self) -> Vec<SubredditResult> {
        let fetches = self.config.subreddits.iter().map(|subreddit| async move {
            match self.fetch_subreddit(subreddit).await {
                Ok(posts) => {
                    info!("Fetched {} posts from r/{}", posts.len(), subreddit);
                    SubredditResult {
                        subreddit: subreddit.clone(),
                        posts,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("Failed to fetch r/{}: {}", subreddit, e);
                    SubredditResult {
                        subreddit: subreddit.clone(),
                        posts: Vec::new(),
                        error: Some(e.to_string()),
                    }
                }
            }
        });

        join_all(fetches).await
    }
}

/// Extract posts from a listing body. A body without `data.children` yields no posts.
pub fn parse_listing(body: Value) -> Vec<RedditPost> {
    let Some(Value::Array(children)) = body.pointer("/data/children") else {
        return Vec::new();
    };

    children
        .iter()
        .filter_map(|child| {
            let data = child.get("data")?;
            match serde_json::from_value::<RedditPost>(data.clone()) {
                Ok(mut post) => {
                    post.permalink = format!("{}{}", PERMALINK_BASE, post.permalink);
                    Some(post)
                }
                Err(e) => {
                    warn!("Skipping malformed post: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Flatten per-subreddit results into image posts, highest score first.
pub fn image_posts(results: &[SubredditResult]) -> Vec<RedditPost> {
    let mut posts: Vec<RedditPost> = results
        .iter()
        .flat_map(|result| result.posts.iter())
        .filter(|post| post.has_image() && !post.is_gallery && !post.is_video)
        .cloned()
        .collect();

    posts.sort_by(|a, b| b.score.cmp(&a.score));
    posts
}

/// True when at least one subreddit was requested and none succeeded.
pub fn all_failed(results: &[SubredditResult]) -> bool {
    !results.is_empty() && results.iter().all(|r| r.error.is_some())
}

/// Keep posts from one subreddit, or all of them for `"all"`.
pub fn filter_by_subreddit(posts: Vec<RedditPost>, selected: &str) -> Vec<RedditPost> {
    if selected.eq_ignore_ascii_case("all") {
        return posts;
    }
    posts
        .into_iter()
        .filter(|post| post.subreddit.eq_ignore_ascii_case(selected))
        .collect()
}

pub fn format_number(num: i64) -> String {
    if num >= 1_000_000 {
        format!("{:.1}M", num as f64 / 1_000_000.0)
    } else if num >= 1_000 {
        format!("{:.1}K", num as f64 / 1_000.0)
    } else {
        num.to_string()
    }
}

pub fn format_time_ago(created_utc: f64, now: DateTime<Utc>) -> String {
    const INTERVALS: [(&str, i64); 7] = [
        ("year", 31_536_000),
        ("month", 2_592_000),
        ("week", 604_800),
        ("day", 86_400),
        ("hour", 3_600),
        ("minute", 60),
        ("second", 1),
    ];

    let seconds = (now.timestamp_millis() as f64 / 1000.0 - created_utc).floor() as i64;

    for (unit, unit_seconds) in INTERVALS {
        let count = seconds / unit_seconds;
        if count >= 1 {
            let plural = if count == 1 { "" } else { "s" };
            return format!("{} {}{} ago", count, unit, plural);
        }
    }

    "just now".to_string()
}
