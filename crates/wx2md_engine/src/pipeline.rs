use std::sync::Arc;

use futures_util::stream::{FuturesUnordered, StreamExt};
use wx2md_core::{
    ArticleSource, ConversionResult, ExtractedContent, ImageReference, MaterializedImage,
    DEFAULT_ARTICLE_HOST,
};
use wx_logging::{wx_debug, wx_info};

use crate::convert::MarkdownConverter;
use crate::decode::decode_document;
use crate::extract::{ArticleExtractor, Extractor};
use crate::fetch::HttpGetter;
use crate::filename::ImageNamer;
use crate::images::{materialize_image, ImageFetcher, ReqwestImageFetcher};
use crate::resolve::resolve_images;
use crate::rewrite::{image_mapping, rewrite_images};
use crate::{FetchError, FetchSettings, MarkupFetcher, PipelineError, ReqwestMarkupFetcher};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Substring every article URL must contain.
    pub expected_host: String,
    pub fetch: FetchSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            expected_host: DEFAULT_ARTICLE_HOST.to_string(),
            fetch: FetchSettings::default(),
        }
    }
}

/// Runs the preview and conversion pipelines for single articles.
///
/// Each call is independent; nothing is cached between `fetch_article` and
/// `convert_article`, so several articles can be processed concurrently
/// through one pipeline.
#[derive(Clone)]
pub struct ArticlePipeline {
    settings: PipelineSettings,
    markup: Arc<dyn MarkupFetcher>,
    images: Arc<dyn ImageFetcher>,
    extractor: ArticleExtractor,
    converter: MarkdownConverter,
}

impl ArticlePipeline {
    /// Pipeline over the network. Both fetchers share one HTTP client.
    pub fn new(settings: PipelineSettings) -> Result<Self, FetchError> {
        let http = HttpGetter::new(settings.fetch.clone())?;
        let markup = Arc::new(ReqwestMarkupFetcher::with_http(http.clone()));
        let images = Arc::new(ReqwestImageFetcher::with_http(http));
        Ok(Self::with_fetchers(settings, markup, images))
    }

    pub fn with_fetchers(
        settings: PipelineSettings,
        markup: Arc<dyn MarkupFetcher>,
        images: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            settings,
            markup,
            images,
            extractor: ArticleExtractor::new(),
            converter: MarkdownConverter::new(),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn validate(&self, url: &str) -> Result<ArticleSource, PipelineError> {
        Ok(ArticleSource::parse(url, &self.settings.expected_host)?)
    }

    /// Preview mode: title and raw content markup only.
    pub async fn fetch_article(&self, url: &str) -> Result<ExtractedContent, PipelineError> {
        let source = self.validate(url)?;
        self.load(&source).await
    }

    /// Full conversion: images materialized, references rewritten, Markdown produced.
    pub async fn convert_article(&self, url: &str) -> Result<ConversionResult, PipelineError> {
        let source = self.validate(url)?;
        let content = self.load(&source).await?;

        let references = resolve_images(&content.content_markup);
        wx_info!("Resolved {} image(s) in {}", references.len(), source);
        let images = self.materialize_all(&references).await;
        wx_info!(
            "Materialized {}/{} image(s) for {}",
            images.len(),
            references.len(),
            source
        );

        let rewritten = rewrite_images(&content.content_markup, &image_mapping(&images));
        let converter = self.converter;
        let markdown = tokio::task::spawn_blocking(move || converter.convert(&rewritten))
            .await
            .map_err(|err| PipelineError::ConversionFailed(err.to_string()))?
            .map_err(|err| PipelineError::ConversionFailed(err.to_string()))?;

        Ok(ConversionResult {
            title: content.title,
            markdown,
            images,
        })
    }

    /// Downloads every reference concurrently. Output follows `references`
    /// order regardless of completion order; failed downloads are omitted.
    pub async fn materialize_all(&self, references: &[ImageReference]) -> Vec<MaterializedImage> {
        let namer = ImageNamer::new();
        let namer = &namer;
        let fetcher: &dyn ImageFetcher = self.images.as_ref();

        let mut pending: FuturesUnordered<_> = references
            .iter()
            .enumerate()
            .map(|(index, reference)| async move {
                (index, materialize_image(fetcher, reference, namer, index).await)
            })
            .collect();

        let mut settled = Vec::with_capacity(references.len());
        while let Some((index, image)) = pending.next().await {
            wx_debug!("Image {} settled (ok: {})", index, image.is_some());
            settled.push((index, image));
        }
        settled.sort_by_key(|(index, _)| *index);
        settled.into_iter().filter_map(|(_, image)| image).collect()
    }

    async fn load(&self, source: &ArticleSource) -> Result<ExtractedContent, PipelineError> {
        let output = self
            .markup
            .fetch_markup(source.as_str())
            .await
            .map_err(|err| PipelineError::fetch_failed(source.as_str(), err))?;
        let document =
            decode_document(output).map_err(|err| PipelineError::ParseFailed(err.to_string()))?;
        wx_debug!(
            "Decoded {} ({} chars, {}, status {})",
            document.url,
            document.html.len(),
            document.encoding_label,
            document.status
        );
        let content = self.extractor.extract(&document.html);
        if content.content_markup.is_empty() {
            wx_info!("No article content found at {}", source);
        }
        Ok(content)
    }
}
