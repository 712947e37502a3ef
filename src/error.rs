use thiserror::Error;

/// Failure talking to a third-party API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("News API key not configured")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    InvalidShape(&'static str),
}

/// Failure building an image generation URL.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("Prompt is empty after cleaning")]
    EmptyPrompt,

    #[error("Invalid image endpoint: {0}")]
    Endpoint(String),
}

/// Meme form input that can't be turned into a prompt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PromptError {
    #[error("Please enter some text for your meme")]
    MissingText,

    #[error("Prompt is required")]
    MissingPrompt,
}
