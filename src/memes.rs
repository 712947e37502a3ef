use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::PromptError;
use crate::image::{AspectRatio, ImageGenerator};
use crate::news::Article;

pub const NEWS_NEGATIVE_PROMPT: &str = "low quality, blurry, distorted, text, watermark, signature";

pub struct MemeTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
}

pub static MEME_TEMPLATES: [MemeTemplate; 3] = [
    MemeTemplate {
        id: "drake",
        name: "Drake Hotline Bling",
        description: "Drake approving/disapproving meme format",
        prompt: "Create a Drake meme where the top panel shows {text1} and the bottom panel shows {text2}",
    },
    MemeTemplate {
        id: "distracted-bf",
        name: "Distracted Boyfriend",
        description: "Guy checking out another girl while with his girlfriend",
        prompt: "Create a Distracted Boyfriend meme where the guy is looking at {text1} while his girlfriend looks at him annoyed, with text \"{text2}\" at the bottom",
    },
    MemeTemplate {
        id: "custom",
        name: "Custom Meme",
        description: "Create a completely custom meme",
        prompt: "{text1}",
    },
];

/// (value, label)
pub const STYLES: [(&str, &str); 5] = [
    ("funny", "Funny"),
    ("sarcastic", "Sarcastic"),
    ("wholesome", "Wholesome"),
    ("dark", "Dark Humor"),
    ("surreal", "Surreal"),
];

const QUALITY_PHRASES: [&str; 4] = [
    "Low quality, quick generation",
    "Medium quality, balanced generation",
    "High quality, detailed generation",
    "Ultra high quality, maximum detail",
];

const QUALITY_LABELS: [&str; 4] = ["Low", "Medium", "High", "Ultra"];

impl MemeTemplate {
    /// Unknown ids fall back to the first template.
    pub fn find(id: &str) -> &'static MemeTemplate {
        MEME_TEMPLATES
            .iter()
            .find(|t| t.id == id)
            .unwrap_or(&MEME_TEMPLATES[0])
    }

    pub fn uses_second_text(&self) -> bool {
        self.prompt.contains("{text2}")
    }

    /// Substitute the first `{text1}` and `{text2}` placeholders.
    pub fn fill(&self, text1: &str, text2: &str) -> String {
        self.prompt
            .replacen("{text1}", text1, 1)
            .replacen("{text2}", text2, 1)
    }
}

pub fn quality_phrase(quality: u8) -> &'static str {
    match quality {
        1..=4 => QUALITY_PHRASES[usize::from(quality) - 1],
        _ => "",
    }
}

pub fn quality_label(quality: u8) -> &'static str {
    match quality {
        1..=4 => QUALITY_LABELS[usize::from(quality) - 1],
        _ => "",
    }
}

/// Prompt sent for a free-form request to /api/generate-meme.
pub fn enhance_prompt(prompt: &str) -> String {
    format!(
        "A funny meme about: {}. High quality, trending on social media, vibrant colors, detailed, 8k.",
        prompt
    )
}

pub fn news_prompt(title: &str) -> String {
    format!("Funny meme about: {}. Make it humorous and shareable.", title)
}

/// Meme generator form as submitted from the browser.
#[derive(Debug, Clone, Deserialize)]
pub struct MemeForm {
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub text1: String,
    #[serde(default)]
    pub text2: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
}

fn default_mode() -> String {
    "template".to_string()
}

fn default_style() -> String {
    "funny".to_string()
}

fn default_quality() -> u8 {
    1
}

fn default_aspect_ratio() -> String {
    "1:1".to_string()
}

impl Default for MemeForm {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            template: MEME_TEMPLATES[0].id.to_string(),
            text1: String::new(),
            text2: String::new(),
            prompt: String::new(),
            style: default_style(),
            quality: default_quality(),
            aspect_ratio: default_aspect_ratio(),
        }
    }
}

impl MemeForm {
    pub fn uses_template(&self) -> bool {
        self.mode != "custom"
    }

    pub fn aspect(&self) -> AspectRatio {
        AspectRatio::from_label(&self.aspect_ratio)
    }

    /// Build the final prompt: template or free text, decorated with style and quality.
    pub fn compose_prompt(&self) -> Result<String, PromptError> {
        let body = if self.uses_template() {
            let template = MemeTemplate::find(&self.template);
            let text1 = self.text1.trim();
            let text2 = self.text2.trim();
            if text1.is_empty() || (template.uses_second_text() && text2.is_empty()) {
                return Err(PromptError::MissingText);
            }
            template.fill(text1, text2)
        } else {
            let prompt = self.prompt.trim();
            if prompt.is_empty() {
                return Err(PromptError::MissingPrompt);
            }
            prompt.to_string()
        };

        Ok(format!(
            "{} meme: {}. {}",
            self.style,
            body,
            quality_phrase(self.quality)
        ))
    }
}

/// An article paired with the meme generated for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsMeme {
    #[serde(flatten)]
    pub article: Article,
    pub meme_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meme_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn meme_for_article(generator: &ImageGenerator, article: Article) -> NewsMeme {
    let title = article
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    let Some(title) = title else {
        error!("Error generating meme for article without a title");
        return NewsMeme {
            article,
            meme_url: None,
            meme_prompt: None,
            error: Some("Failed to generate meme".to_string()),
        };
    };

    let prompt = news_prompt(&title);
    match generator.generate(&prompt, AspectRatio::Square, Some(NEWS_NEGATIVE_PROMPT)) {
        Ok(url) => NewsMeme {
            article,
            meme_url: Some(url.to_string()),
            meme_prompt: Some(prompt),
            error: None,
        },
        Err(e) => {
            error!("Error generating meme for article '{}': {}", title, e);
            NewsMeme {
                article,
                meme_url: None,
                meme_prompt: None,
                error: Some("Failed to generate meme".to_string()),
            }
        }
    }
}

/// One meme per article, in article order. A failed article is annotated
/// and never affects its siblings.
pub fn generate_for_articles(generator: &ImageGenerator, articles: Vec<Article>) -> Vec<NewsMeme> {
    let memes: Vec<NewsMeme> = articles
        .into_iter()
        .map(|article| meme_for_article(generator, article))
        .collect();

    let failed = memes.iter().filter(|m| m.error.is_some()).count();
    info!("Generated {} news memes ({} failed)", memes.len() - failed, failed);
    memes
}
