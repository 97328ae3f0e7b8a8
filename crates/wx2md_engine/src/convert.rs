//! HTML fragment to Markdown through `htmd`.
//!
//! Headings are ATX (`#`) and code blocks are fenced with backticks. Image
//! sources are normalized first so lazily loaded images keep their URL.
use htmd::options::{BulletListMarker, CodeBlockFence, CodeBlockStyle, HeadingStyle, Options};
use htmd::HtmlToMarkdown;

use crate::rewrite::prepare_for_conversion;

/// Elements whose content never reaches the Markdown output.
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "svg", "canvas", "button", "input",
    "select", "textarea",
];

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ConvertError(#[from] std::io::Error);

pub trait Converter: Send + Sync {
    fn to_markdown(&self, html: &str) -> Result<String, ConvertError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownConverter;

impl MarkdownConverter {
    pub fn new() -> Self {
        Self
    }

    pub fn convert(&self, html: &str) -> Result<String, ConvertError> {
        let prepared = prepare_for_conversion(html);
        let markdown = HtmlToMarkdown::builder()
            .skip_tags(SKIPPED_TAGS.to_vec())
            .options(markdown_options())
            .build()
            .convert(&prepared)?;
        Ok(markdown.trim().to_string())
    }
}

impl Converter for MarkdownConverter {
    fn to_markdown(&self, html: &str) -> Result<String, ConvertError> {
        self.convert(html)
    }
}

fn markdown_options() -> Options {
    Options {
        heading_style: HeadingStyle::Atx,
        bullet_list_marker: BulletListMarker::Dash,
        code_block_style: CodeBlockStyle::Fenced,
        code_block_fence: CodeBlockFence::Backticks,
        ..Default::default()
    }
}
