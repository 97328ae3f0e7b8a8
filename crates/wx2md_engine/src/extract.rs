use scraper::{Html, Selector};
use wx2md_core::ExtractedContent;

/// Element holding the article headline.
pub const TITLE_SELECTOR: &str = "#activity-name";
/// Element holding the article body.
pub const CONTENT_SELECTOR: &str = "#js_content";

pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> ExtractedContent;
}

/// Extractor bound to the fixed article page template.
///
/// Missing elements yield empty strings rather than errors, so a page
/// template change shows up as an empty result.
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    title_selector: String,
    content_selector: String,
}

impl ArticleExtractor {
    pub fn new() -> Self {
        Self::with_selectors(TITLE_SELECTOR, CONTENT_SELECTOR)
    }

    pub fn with_selectors(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title_selector: title.into(),
            content_selector: content.into(),
        }
    }
}

impl Default for ArticleExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for ArticleExtractor {
    fn extract(&self, html: &str) -> ExtractedContent {
        let doc = Html::parse_document(html);
        let title_sel = Selector::parse(&self.title_selector).ok();
        let content_sel = Selector::parse(&self.content_selector).ok();

        let title = title_sel
            .as_ref()
            .and_then(|sel| doc.select(sel).next())
            .map(|t| t.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let content_markup = content_sel
            .as_ref()
            .and_then(|sel| doc.select(sel).next())
            .map(|node| node.inner_html())
            .unwrap_or_default();

        ExtractedContent {
            title,
            content_markup,
        }
    }
}
