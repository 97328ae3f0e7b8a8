//! wx2md engine: article fetching, image rehoming and Markdown conversion.
mod convert;
mod decode;
mod extract;
mod fetch;
mod filename;
mod images;
mod package;
mod persist;
mod pipeline;
mod resolve;
mod rewrite;
mod types;

pub use convert::{ConvertError, Converter, MarkdownConverter};
pub use decode::{decode_document, decode_html, DecodeError, DecodedHtml};
pub use extract::{ArticleExtractor, Extractor, CONTENT_SELECTOR, TITLE_SELECTOR};
pub use fetch::{
    FetchSettings, MarkupFetcher, ReqwestMarkupFetcher, DEFAULT_IMAGE_REFERER, DEFAULT_USER_AGENT,
};
pub use filename::{extension_for_mime, sanitize_title, ImageNamer};
pub use images::{
    materialize_image, ImageFetcher, ImagePayload, ReqwestImageFetcher, DEFAULT_IMAGE_MIME,
};
pub use package::{
    article_basename, build_article_zip, build_collection_zip, markdown_filename,
    write_collection, write_package, CollectionSummary, PackageError, PackageFormat, IMAGES_DIR,
    MANIFEST_FILENAME,
};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use pipeline::{ArticlePipeline, PipelineSettings};
pub use resolve::{normalize_image_url, resolve_images, LAZY_SRC_ATTR};
pub use rewrite::{image_mapping, rewrite_images, ImageMapping};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput, PipelineError, RawDocument};
