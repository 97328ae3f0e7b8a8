use std::collections::HashSet;

use scraper::node::Element;
use scraper::{ElementRef, Html};
use url::Url;
use wx2md_core::ImageReference;

/// Attribute holding the real source of a lazily loaded image.
pub const LAZY_SRC_ATTR: &str = "data-src";
pub const SRC_ATTR: &str = "src";

/// Image references in `content_markup`, deduplicated, in first-occurrence order.
pub fn resolve_images(content_markup: &str) -> Vec<ImageReference> {
    let fragment = Html::parse_fragment(content_markup);
    let mut seen = HashSet::new();
    let mut references = Vec::new();

    for img in image_elements(&fragment) {
        let Some(url) = image_source(img.value()) else {
            continue;
        };
        if seen.insert(url.clone()) {
            references.push(ImageReference::new(url));
        }
    }
    references
}

pub(crate) fn image_elements(fragment: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name().eq_ignore_ascii_case("img"))
}

/// Source URL of an image element: the lazy attribute wins over `src`.
pub(crate) fn image_source(element: &Element) -> Option<String> {
    let raw = element
        .attr(LAZY_SRC_ATTR)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| element.attr(SRC_ATTR).map(str::trim).filter(|v| !v.is_empty()))?;
    normalize_image_url(raw)
}

/// Accepts absolute http(s) and protocol-relative URLs; the latter become https.
pub fn normalize_image_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let candidate = if trimmed.starts_with("//") {
        format!("https:{trimmed}")
    } else {
        let lower = trimmed.to_ascii_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return None;
        }
        trimmed.to_string()
    };
    Url::parse(&candidate).ok().filter(|url| url.has_host())?;
    Some(candidate)
}

#[cfg(test)]
mod tests {
    use super::normalize_image_url;

    #[test]
    fn protocol_relative_becomes_https() {
        assert_eq!(
            normalize_image_url("//cdn.example.com/a.png").as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }

    #[test]
    fn non_http_values_are_rejected() {
        assert_eq!(normalize_image_url("data:image/png;base64,AAAA"), None);
        assert_eq!(normalize_image_url("/relative/a.png"), None);
        assert_eq!(normalize_image_url("a.png"), None);
        assert_eq!(normalize_image_url("https://"), None);
        assert_eq!(normalize_image_url(""), None);
    }

    #[test]
    fn absolute_urls_are_kept_verbatim() {
        let url = "https://mmbiz.qpic.cn/x/640?wx_fmt=png&from=appmsg";
        assert_eq!(normalize_image_url(url).as_deref(), Some(url));
    }
}
