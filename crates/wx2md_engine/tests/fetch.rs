use std::time::Duration;

use wx2md_engine::{
    FailureKind, FetchSettings, ImageFetcher, MarkupFetcher, ReqwestImageFetcher,
    ReqwestMarkupFetcher, DEFAULT_IMAGE_MIME, DEFAULT_IMAGE_REFERER, DEFAULT_USER_AGENT,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn markup_fetcher_sends_browser_user_agent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s/doc"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>ok</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let fetcher = ReqwestMarkupFetcher::new(FetchSettings::default()).expect("client");
    let url = format!("{}/s/doc", server.uri());

    let output = fetcher.fetch_markup(&url).await.expect("fetch ok");
    assert_eq!(output.metadata.original_url, url);
    assert_eq!(output.metadata.final_url, output.metadata.original_url);
    assert_eq!(output.metadata.status, 200);
    assert!(!output.metadata.redirected);
    assert!(output
        .metadata
        .content_type
        .unwrap()
        .starts_with("text/html"));
    assert_eq!(output.bytes, b"<html>ok</html>");
}

#[tokio::test]
async fn markup_fetcher_follows_redirects() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/s/short"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/s/long", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/s/long"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>moved</html>", "text/html"))
        .mount(&server)
        .await;

    let fetcher = ReqwestMarkupFetcher::new(FetchSettings::default()).expect("client");
    let output = fetcher
        .fetch_markup(&format!("{}/s/short", server.uri()))
        .await
        .expect("fetch ok");
    assert!(output.metadata.redirected);
    assert_eq!(output.metadata.final_url, format!("{}/s/long", server.uri()));
    assert_eq!(output.bytes, b"<html>moved</html>");
}

#[tokio::test]
async fn markup_fetcher_enforces_redirect_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/loop", server.uri())),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        redirect_limit: 2,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestMarkupFetcher::new(settings).expect("client");
    let err = fetcher
        .fetch_markup(&format!("{}/loop", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::RedirectLimitExceeded);
}

#[tokio::test]
async fn one_fetcher_serves_concurrent_image_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![7u8; 16], "image/gif"))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = ReqwestImageFetcher::new(FetchSettings::default()).expect("client");
    let urls: Vec<String> = (0..3).map(|n| format!("{}/img/{n}.gif", server.uri())).collect();
    let (a, b, c) = tokio::join!(
        fetcher.fetch_image(&urls[0]),
        fetcher.fetch_image(&urls[1]),
        fetcher.fetch_image(&urls[2]),
    );
    for payload in [a, b, c] {
        assert_eq!(payload.expect("image ok").mime_type, "image/gif");
    }
}

#[tokio::test]
async fn markup_fetcher_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = ReqwestMarkupFetcher::new(FetchSettings::default()).expect("client");
    let url = format!("{}/missing", server.uri());

    let err = fetcher.fetch_markup(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn markup_fetcher_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_string("slow"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let fetcher = ReqwestMarkupFetcher::new(settings).expect("client");
    let url = format!("{}/slow", server.uri());

    let err = fetcher.fetch_markup(&url).await.unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn markup_fetcher_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "text/html")
                .set_body_string("01234567890"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_markup_bytes: 10,
        ..FetchSettings::default()
    };
    let fetcher = ReqwestMarkupFetcher::new(settings).expect("client");
    let url = format!("{}/large", server.uri());

    let err = fetcher.fetch_markup(&url).await.unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::TooLarge {
            max_bytes: 10,
            actual: Some(11)
        }
    );
}

#[tokio::test]
async fn markup_fetcher_rejects_non_html() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .mount(&server)
        .await;

    let fetcher = ReqwestMarkupFetcher::new(FetchSettings::default()).expect("client");
    let err = fetcher
        .fetch_markup(&format!("{}/json", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind,
        FailureKind::UnsupportedContentType { .. }
    ));
}

#[tokio::test]
async fn image_fetcher_sends_referer_and_reads_mime() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/a.png"))
        .and(header("referer", DEFAULT_IMAGE_REFERER))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89, b'P', b'N', b'G'], "image/png"))
        .mount(&server)
        .await;

    let fetcher = ReqwestImageFetcher::new(FetchSettings::default()).expect("client");
    let payload = fetcher
        .fetch_image(&format!("{}/img/a.png", server.uri()))
        .await
        .expect("image ok");
    assert_eq!(payload.mime_type, "image/png");
    assert_eq!(payload.data, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn image_fetcher_defaults_missing_mime() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/raw"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .mount(&server)
        .await;

    let fetcher = ReqwestImageFetcher::new(FetchSettings::default()).expect("client");
    let payload = fetcher
        .fetch_image(&format!("{}/img/raw", server.uri()))
        .await
        .expect("image ok");
    assert_eq!(payload.mime_type, DEFAULT_IMAGE_MIME);
}

#[tokio::test]
async fn image_fetcher_reports_http_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let fetcher = ReqwestImageFetcher::new(FetchSettings::default()).expect("client");
    let err = fetcher
        .fetch_image(&format!("{}/img/blocked.png", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(403));
}
