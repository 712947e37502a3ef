use reqwest::Url;
use tracing::debug;

use crate::config::ImageConfig;
use crate::error::GenerateError;

pub const DEFAULT_NEGATIVE_PROMPT: &str = "low quality, blurry, distorted, bad anatomy, text, watermark, signature, lowres, bad anatomy, bad hands, error, missing fingers, extra digit, fewer digits, cropped, worst quality, low quality, normal quality, jpeg artifacts, signature, watermark, username, blurry, artist name, bad proportions, duplicate, ugly, disfigured, bad anatomy, extra limbs, gross proportions, malformed limbs, missing arms, missing legs, extra arms, extra legs, mutated hands, fused fingers, too many fingers, long neck, cross-eye, body out of frame, cut off, low contrast, underexposed, overexposed, bad art, beginner, amateur, distorted face, blurry, draft, grainy";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Square,
    Wide,
    Portrait,
    Instagram,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Square,
        AspectRatio::Wide,
        AspectRatio::Portrait,
        AspectRatio::Instagram,
    ];

    /// Unknown labels fall back to square.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "16:9" => AspectRatio::Wide,
            "9:16" => AspectRatio::Portrait,
            "4:5" => AspectRatio::Instagram,
            _ => AspectRatio::Square,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Wide => "16:9",
            AspectRatio::Portrait => "9:16",
            AspectRatio::Instagram => "4:5",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AspectRatio::Square => "Square (1:1)",
            AspectRatio::Wide => "Wide (16:9)",
            AspectRatio::Portrait => "Portrait (9:16)",
            AspectRatio::Instagram => "Instagram (4:5)",
        }
    }

    /// (width, height) in pixels
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            AspectRatio::Square => (1024, 1024),
            AspectRatio::Wide => (1024, 576),
            AspectRatio::Portrait => (576, 1024),
            AspectRatio::Instagram => (1024, 1280),
        }
    }
}

/// Builds Pollinations image URLs. The image itself is rendered by
/// Pollinations when the browser loads the URL.
pub struct ImageGenerator {
    base_url: Url,
    model: String,
}

impl ImageGenerator {
    pub fn new(config: &ImageConfig) -> Result<Self, GenerateError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| GenerateError::Endpoint(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(GenerateError::Endpoint(config.base_url.clone()));
        }

        Ok(Self {
            base_url,
            model: config.model.clone(),
        })
    }

    /// Build the image URL for a prompt. `None` uses the default negative
    /// prompt, an empty string sends none.
    pub fn generate(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        negative_prompt: Option<&str>,
    ) -> Result<Url, GenerateError> {
        let cleaned = clean_prompt(prompt);
        if cleaned.is_empty() {
            return Err(GenerateError::EmptyPrompt);
        }

        let (width, height) = aspect_ratio.dimensions();
        let negative_prompt = negative_prompt.unwrap_or(DEFAULT_NEGATIVE_PROMPT);

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GenerateError::Endpoint(self.base_url.to_string()))?
            .pop_if_empty()
            .push(&cleaned);

        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("width", &width.to_string())
                .append_pair("height", &height.to_string())
                .append_pair("model", &self.model)
                .append_pair("enhance", "true")
                .append_pair("nologo", "true");
            if !negative_prompt.is_empty() {
                query.append_pair("negative_prompt", negative_prompt);
            }
        }

        debug!("Generated image URL: {}", url);
        Ok(url)
    }
}

/// Replace anything but ASCII word characters, whitespace and `-.,!` with spaces.
pub fn clean_prompt(prompt: &str) -> String {
    prompt
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c.is_whitespace() || "-.,!".contains(c) {
                c
            } else {
                ' '
            }
        })
        .collect::<String>()
        .trim()
        .to_string()
}
