use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::{ConversionResult, ExtractedContent, MaterializedImage};

pub const MAX_HISTORY_ITEMS: usize = 50;

/// One saved article, keyed by `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryArticle {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub html_content: Option<String>,
    #[serde(default)]
    pub markdown: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<MaterializedImage>>,
    /// Stamped by the store on every save.
    pub saved_at: DateTime<Utc>,
}

impl HistoryArticle {
    pub fn new(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: history_id(&url),
            url,
            title: None,
            html_content: None,
            markdown: None,
            images: None,
            saved_at: DateTime::<Utc>::default(),
        }
    }

    pub fn fetched(url: impl Into<String>, content: &ExtractedContent) -> Self {
        Self {
            title: Some(content.title.clone()),
            html_content: Some(content.content_markup.clone()),
            ..Self::new(url)
        }
    }

    pub fn converted(
        url: impl Into<String>,
        content: Option<&ExtractedContent>,
        result: &ConversionResult,
    ) -> Self {
        Self {
            title: Some(result.title.clone()),
            html_content: content.map(|c| c.content_markup.clone()),
            markdown: Some(result.markdown.clone()),
            images: Some(result.images.clone()),
            ..Self::new(url)
        }
    }

    /// The conversion result, when this entry has been converted.
    pub fn conversion(&self) -> Option<ConversionResult> {
        self.markdown.as_ref().map(|markdown| ConversionResult {
            title: self.title.clone().unwrap_or_default(),
            markdown: markdown.clone(),
            images: self.images.clone().unwrap_or_default(),
        })
    }
}

/// Stable id derived from the URL so re-saving an article keeps its id.
pub fn history_id(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut hex = String::with_capacity(12);
    for byte in digest.iter().take(6) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

/// Insert or replace `article` in `history`.
///
/// An existing entry with the same URL is replaced in place. A new entry goes
/// to the front and the oldest entries beyond [`MAX_HISTORY_ITEMS`] are dropped.
pub fn upsert(history: &mut Vec<HistoryArticle>, mut article: HistoryArticle, now: DateTime<Utc>) {
    article.saved_at = now;
    if let Some(existing) = history.iter_mut().find(|item| item.url == article.url) {
        *existing = article;
        return;
    }
    history.insert(0, article);
    history.truncate(MAX_HISTORY_ITEMS);
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history storage error: {0}")]
    Storage(String),
    #[error("history format error: {0}")]
    Format(String),
}

/// Local key-value store for saved articles, injected into the front end.
pub trait HistoryStore {
    fn get(&self) -> Result<Vec<HistoryArticle>, HistoryError>;
    fn save(&mut self, article: HistoryArticle) -> Result<(), HistoryError>;
    /// Returns whether an entry with `id` existed.
    fn remove(&mut self, id: &str) -> Result<bool, HistoryError>;
    fn clear(&mut self) -> Result<(), HistoryError>;

    fn find(&self, id: &str) -> Result<Option<HistoryArticle>, HistoryError> {
        Ok(self.get()?.into_iter().find(|item| item.id == id))
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryHistoryStore {
    items: Vec<HistoryArticle>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn get(&self) -> Result<Vec<HistoryArticle>, HistoryError> {
        Ok(self.items.clone())
    }

    fn save(&mut self, article: HistoryArticle) -> Result<(), HistoryError> {
        upsert(&mut self.items, article, Utc::now());
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<bool, HistoryError> {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        Ok(self.items.len() != before)
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.items.clear();
        Ok(())
    }
}
