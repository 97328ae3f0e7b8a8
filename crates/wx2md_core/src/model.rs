use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Host every article URL must mention before any network call is made.
pub const DEFAULT_ARTICLE_HOST: &str = "mp.weixin.qq.com";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidSource {
    #[error("invalid URL: empty input")]
    Empty,
    #[error("invalid URL: {url} is not hosted on {expected_host}")]
    WrongHost { url: String, expected_host: String },
}

/// A validated article URL.
///
/// The check is a plain substring match against the expected host, which
/// mirrors how the upstream platform links are recognised.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArticleSource {
    url: String,
}

impl ArticleSource {
    pub fn parse(raw: &str, expected_host: &str) -> Result<Self, InvalidSource> {
        let url = raw.trim();
        if url.is_empty() {
            return Err(InvalidSource::Empty);
        }
        if !url.contains(expected_host) {
            return Err(InvalidSource::WrongHost {
                url: url.to_string(),
                expected_host: expected_host.to_string(),
            });
        }
        Ok(Self {
            url: url.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for ArticleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

/// Title and body fragment isolated from the article page.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedContent {
    pub title: String,
    pub content_markup: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference {
    pub original_url: String,
}

impl ImageReference {
    pub fn new(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
        }
    }
}

/// A downloaded image held in memory under its generated filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializedImage {
    pub original_url: String,
    pub filename: String,
    #[serde(with = "base64_payload")]
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl MaterializedImage {
    /// Path the rewritten Markdown uses to reference this image.
    pub fn relative_path(&self) -> String {
        local_image_path(&self.filename)
    }
}

pub fn local_image_path(filename: &str) -> String {
    format!("./images/{filename}")
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversionResult {
    pub title: String,
    pub markdown: String,
    pub images: Vec<MaterializedImage>,
}

mod base64_payload {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
