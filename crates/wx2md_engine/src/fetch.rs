use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, REFERER, USER_AGENT};
use wx_logging::{wx_debug, wx_info};

use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

/// Desktop browser identity; the article host degrades responses without one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Referer the image CDN expects for hotlink protection.
pub const DEFAULT_IMAGE_REFERER: &str = "https://mp.weixin.qq.com/";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub image_referer: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_markup_bytes: u64,
    pub max_image_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            image_referer: DEFAULT_IMAGE_REFERER.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_markup_bytes: 10 * 1024 * 1024,
            max_image_bytes: 20 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
        }
    }
}

/// Retrieves the raw article page.
#[async_trait::async_trait]
pub trait MarkupFetcher: Send + Sync {
    async fn fetch_markup(&self, url: &str) -> Result<FetchOutput, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestMarkupFetcher {
    http: HttpGetter,
}

impl ReqwestMarkupFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        Ok(Self::with_http(HttpGetter::new(settings)?))
    }

    pub(crate) fn with_http(http: HttpGetter) -> Self {
        Self { http }
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.http
            .settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }
}

#[async_trait::async_trait]
impl MarkupFetcher for ReqwestMarkupFetcher {
    async fn fetch_markup(&self, url: &str) -> Result<FetchOutput, FetchError> {
        wx_info!("Fetching article markup from {}", url);
        let output = self
            .http
            .get(url, HeaderMap::new(), self.http.settings.max_markup_bytes)
            .await?;

        if let Some(ct) = output.metadata.content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }
        Ok(output)
    }
}

/// Plain GET with the configured identity, timeouts, redirect and size limits.
///
/// Clones share one `reqwest::Client` and therefore one connection pool.
#[derive(Debug, Clone)]
pub(crate) struct HttpGetter {
    pub(crate) settings: FetchSettings,
    client: reqwest::Client,
}

impl HttpGetter {
    pub(crate) fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub(crate) fn referer_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(&self.settings.image_referer) {
            headers.insert(REFERER, value);
        }
        headers
    }

    pub(crate) async fn get(
        &self,
        url: &str,
        mut headers: HeaderMap,
        max_bytes: u64,
    ) -> Result<FetchOutput, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        let requested = parsed.clone();

        let user_agent = HeaderValue::from_str(&self.settings.user_agent)
            .map_err(|err| FetchError::new(FailureKind::Network, format!("user agent: {err}")))?;
        headers.insert(USER_AGENT, user_agent);

        let response = self
            .client
            .get(parsed)
            .headers(headers)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let redirected = *response.url() != requested;
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }
        wx_debug!("GET {} -> {} ({} bytes)", url, status, bytes.len());

        let metadata = FetchMetadata {
            original_url: url.to_string(),
            final_url,
            status: status.as_u16(),
            redirected,
            content_type,
            byte_len: bytes.len() as u64,
        };

        Ok(FetchOutput { bytes, metadata })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
