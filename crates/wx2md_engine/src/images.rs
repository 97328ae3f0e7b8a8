use reqwest::header::HeaderMap;
use wx2md_core::{ImageReference, MaterializedImage};
use wx_logging::{wx_debug, wx_warn};

use crate::fetch::HttpGetter;
use crate::filename::{extension_for_mime, ImageNamer};
use crate::{FetchError, FetchSettings};

/// MIME type assumed when the response carries no content type.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Downloads a single image. Implementations report failures; callers decide
/// whether they are fatal.
#[async_trait::async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, url: &str) -> Result<ImagePayload, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestImageFetcher {
    http: HttpGetter,
}

impl ReqwestImageFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        Ok(Self::with_http(HttpGetter::new(settings)?))
    }

    pub(crate) fn with_http(http: HttpGetter) -> Self {
        Self { http }
    }

    fn headers(&self) -> HeaderMap {
        self.http.referer_headers()
    }
}

#[async_trait::async_trait]
impl ImageFetcher for ReqwestImageFetcher {
    async fn fetch_image(&self, url: &str) -> Result<ImagePayload, FetchError> {
        let output = self
            .http
            .get(url, self.headers(), self.http.settings.max_image_bytes)
            .await?;
        let mime_type = output
            .metadata
            .content_type
            .map(|ct| ct.trim().to_string())
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());
        Ok(ImagePayload {
            data: output.bytes,
            mime_type,
        })
    }
}

/// Downloads `reference` and names it; any failure degrades to `None`.
pub async fn materialize_image(
    fetcher: &dyn ImageFetcher,
    reference: &ImageReference,
    namer: &ImageNamer,
    index: usize,
) -> Option<MaterializedImage> {
    match fetcher.fetch_image(&reference.original_url).await {
        Ok(payload) => {
            let filename = namer.name(index, &extension_for_mime(&payload.mime_type));
            wx_debug!(
                "Downloaded image {} as {} ({} bytes)",
                reference.original_url,
                filename,
                payload.data.len()
            );
            Some(MaterializedImage {
                original_url: reference.original_url.clone(),
                filename,
                data: payload.data,
                mime_type: payload.mime_type,
            })
        }
        Err(err) => {
            wx_warn!(
                "Failed to download image {}: {}",
                reference.original_url,
                err
            );
            None
        }
    }
}
