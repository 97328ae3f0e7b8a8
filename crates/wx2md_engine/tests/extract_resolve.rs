use pretty_assertions::assert_eq;
use wx2md_core::ImageReference;
use wx2md_engine::{decode_html, resolve_images, ArticleExtractor, Extractor};

fn urls(refs: &[ImageReference]) -> Vec<&str> {
    refs.iter().map(|r| r.original_url.as_str()).collect()
}

#[test]
fn title_is_trimmed_text_of_activity_name() {
    let html = r#"
    <html><body>
        <h1 class="rich_media_title" id="activity-name">  Hello World  </h1>
        <div id="js_content"><p>Body text</p></div>
    </body></html>
    "#;
    let extracted = ArticleExtractor::new().extract(html);
    assert_eq!(extracted.title, "Hello World");
    assert_eq!(extracted.content_markup, "<p>Body text</p>");
}

#[test]
fn missing_selectors_yield_empty_strings() {
    let html = "<html><head><title>Other page</title></head><body><article>x</article></body></html>";
    let extracted = ArticleExtractor::new().extract(html);
    assert_eq!(extracted.title, "");
    assert_eq!(extracted.content_markup, "");
}

#[test]
fn nested_title_markup_contributes_text_only() {
    let html = r#"<h1 id="activity-name"><span>Part</span> <em>two</em></h1><div id="js_content"></div>"#;
    let extracted = ArticleExtractor::new().extract(html);
    assert_eq!(extracted.title, "Part two");
    assert_eq!(extracted.content_markup, "");
}

#[test]
fn decode_respects_charset_header() {
    let bytes = b"caf\xe9"; // iso-8859-1
    let decoded = decode_html(bytes, Some("text/html; charset=ISO-8859-1")).unwrap();
    assert_eq!(decoded.html, "café");
}

#[test]
fn decode_handles_utf8_bom() {
    let bytes = b"\xEF\xBB\xBFhello";
    let decoded = decode_html(bytes, Some("text/html")).unwrap();
    assert_eq!(decoded.html, "hello");
    assert_eq!(decoded.encoding_label, "UTF-8");
}

#[test]
fn lazy_protocol_relative_source_is_normalized() {
    let refs = resolve_images(r#"<p><img data-src="//cdn.example.com/a.png"></p>"#);
    assert_eq!(urls(&refs), vec!["https://cdn.example.com/a.png"]);
}

#[test]
fn lazy_attribute_wins_over_src() {
    let refs = resolve_images(
        r#"<img src="data:image/gif;base64,R0lGOD" data-src="https://mmbiz.qpic.cn/a/640?wx_fmt=png">"#,
    );
    assert_eq!(urls(&refs), vec!["https://mmbiz.qpic.cn/a/640?wx_fmt=png"]);
}

#[test]
fn empty_lazy_attribute_falls_back_to_src() {
    let refs = resolve_images(r#"<img data-src="" src="https://cdn.example.com/b.jpg">"#);
    assert_eq!(urls(&refs), vec!["https://cdn.example.com/b.jpg"]);
}

#[test]
fn unusable_sources_are_skipped() {
    let refs = resolve_images(
        r#"
        <img>
        <img src="">
        <img src="data:image/png;base64,AAAA">
        <img src="/relative.png">
        <img data-src="   ">
        "#,
    );
    assert!(refs.is_empty());
}

#[test]
fn duplicates_collapse_in_first_occurrence_order() {
    let markup = r#"
        <section><img data-src="https://cdn.example.com/2.png"></section>
        <p><img src="https://cdn.example.com/1.png"></p>
        <p><img data-src="//cdn.example.com/2.png"></p>
        <p><img src="https://cdn.example.com/1.png"></p>
        <p><img src="https://cdn.example.com/3.png"></p>
    "#;
    let refs = resolve_images(markup);
    assert_eq!(
        urls(&refs),
        vec![
            "https://cdn.example.com/2.png",
            "https://cdn.example.com/1.png",
            "https://cdn.example.com/3.png",
        ]
    );
}

#[test]
fn resolution_is_idempotent() {
    let markup = r#"<p><img data-src="//a.example.com/x.png"><img src="https://b.example.com/y.jpg"></p>"#;
    assert_eq!(resolve_images(markup), resolve_images(markup));
}
