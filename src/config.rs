use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub reddit: RedditConfig,
    #[serde(default)]
    pub image: ImageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Timeout for upstream requests in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Memewire/1.0 (Meme Aggregator)".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewsConfig {
    #[serde(default = "default_news_base_url")]
    pub base_url: String,
    #[serde(default = "default_country")]
    pub country: String,
    /// Headlines shown on the trending page and returned by /api/news
    #[serde(default = "default_news_page_size")]
    pub page_size: u32,
    /// Headlines turned into memes per batch
    #[serde(default = "default_meme_page_size")]
    pub meme_page_size: u32,
    /// Usually supplied through NEWS_API_KEY instead
    pub api_key: Option<String>,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: default_news_base_url(),
            country: default_country(),
            page_size: default_news_page_size(),
            meme_page_size: default_meme_page_size(),
            api_key: None,
        }
    }
}

fn default_news_base_url() -> String {
    "https://newsapi.org/v2".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_news_page_size() -> u32 {
    10
}

fn default_meme_page_size() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct RedditConfig {
    #[serde(default = "default_reddit_base_url")]
    pub base_url: String,
    #[serde(default = "default_subreddits")]
    pub subreddits: Vec<String>,
    /// Posts requested per subreddit
    #[serde(default = "default_reddit_limit")]
    pub limit: u32,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: default_reddit_base_url(),
            subreddits: default_subreddits(),
            limit: default_reddit_limit(),
        }
    }
}

fn default_reddit_base_url() -> String {
    "https://www.reddit.com".to_string()
}

fn default_subreddits() -> Vec<String> {
    ["memes", "dankmemes", "wholesomememes", "me_irl"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_reddit_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageConfig {
    #[serde(default = "default_image_base_url")]
    pub base_url: String,
    #[serde(default = "default_image_model")]
    pub model: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            base_url: default_image_base_url(),
            model: default_image_model(),
        }
    }
}

fn default_image_base_url() -> String {
    "https://image.pollinations.ai/prompt".to_string()
}

fn default_image_model() -> String {
    "flux".to_string()
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Parse config from a TOML string (useful for testing)
    pub fn from_str(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply a NEWS_API_KEY value from the environment. Blank values are ignored.
    pub fn with_news_api_key(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.news.api_key = Some(key);
        }
        self
    }
}
