//! Download packaging: single Markdown file, per-article archive, or a
//! multi-article archive built from saved history entries.
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use serde_json::json;
use wx2md_core::{ConversionResult, HistoryArticle};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::filename::sanitize_title;
use crate::persist::{plain_file_name, AtomicFileWriter, PersistError};

pub const IMAGES_DIR: &str = "images";
pub const MANIFEST_FILENAME: &str = "manifest.json";
const FALLBACK_NAME: &str = "article";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageFormat {
    /// `<title>.md` only; image links point at files that are not written.
    Markdown,
    /// `<title>.zip` holding `<title>.md` and `images/`.
    Zip,
    /// `<title>.md` plus an `images/` directory next to it.
    Directory,
}

#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
    #[error("no converted articles to package")]
    NothingToPackage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    pub article_count: usize,
    pub image_count: usize,
    pub bytes: Vec<u8>,
}

pub fn article_basename(title: &str) -> String {
    sanitize_title(title, FALLBACK_NAME)
}

pub fn markdown_filename(title: &str) -> String {
    format!("{}.md", article_basename(title))
}

/// Writes `result` into `dir` in the requested format and returns the main output path.
pub fn write_package(
    dir: &Path,
    result: &ConversionResult,
    format: PackageFormat,
) -> Result<PathBuf, PackageError> {
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    match format {
        PackageFormat::Markdown => {
            Ok(writer.write(&markdown_filename(&result.title), &result.markdown)?)
        }
        PackageFormat::Zip => {
            let bytes = build_article_zip(result)?;
            let name = format!("{}.zip", article_basename(&result.title));
            Ok(writer.write_bytes(&name, &bytes)?)
        }
        PackageFormat::Directory => {
            let path = writer.write(&markdown_filename(&result.title), &result.markdown)?;
            if !result.images.is_empty() {
                AtomicFileWriter::new(dir.join(IMAGES_DIR)).write_all(
                    result
                        .images
                        .iter()
                        .map(|image| (image.filename.as_str(), image.data.as_slice())),
                )?;
            }
            Ok(path)
        }
    }
}

/// Archive with `<title>.md` at the root and every image under `images/`.
pub fn build_article_zip(result: &ConversionResult) -> Result<Vec<u8>, PackageError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    add_article(&mut zip, "", result)?;
    Ok(zip.finish()?.into_inner())
}

/// Archive with one directory per converted article plus a `manifest.json` index.
///
/// Entries without Markdown are skipped. Directory names come from the title,
/// or `article_<id>` when it is empty, and are suffixed when they collide.
pub fn build_collection_zip(articles: &[HistoryArticle]) -> Result<CollectionSummary, PackageError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut used = HashSet::new();
    let mut manifest = Vec::new();
    let mut image_count = 0;

    for article in articles {
        let Some(result) = article.conversion() else {
            continue;
        };
        let base = if result.title.trim().is_empty() {
            format!("article_{}", article.id)
        } else {
            article_basename(&result.title)
        };
        let dir = unique_name(&base, &mut used);
        add_article(&mut zip, &format!("{dir}/"), &result)?;
        image_count += result.images.len();
        manifest.push(json!({
            "directory": dir,
            "title": result.title,
            "url": article.url,
            "images": result.images.len(),
            "savedAt": article.saved_at.to_rfc3339(),
        }));
    }

    if manifest.is_empty() {
        return Err(PackageError::NothingToPackage);
    }
    let index = serde_json::to_string_pretty(&json!({
        "article_count": manifest.len(),
        "articles": manifest,
    }))?;
    zip.start_file(MANIFEST_FILENAME, file_options())?;
    zip.write_all(index.as_bytes())?;

    Ok(CollectionSummary {
        article_count: manifest.len(),
        image_count,
        bytes: zip.finish()?.into_inner(),
    })
}

pub fn write_collection(
    dir: &Path,
    filename: &str,
    articles: &[HistoryArticle],
) -> Result<(PathBuf, CollectionSummary), PackageError> {
    let summary = build_collection_zip(articles)?;
    let path = AtomicFileWriter::new(dir.to_path_buf()).write_bytes(filename, &summary.bytes)?;
    Ok((path, summary))
}

fn add_article<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    prefix: &str,
    result: &ConversionResult,
) -> Result<(), PackageError> {
    zip.start_file(format!("{prefix}{}", markdown_filename(&result.title)), file_options())?;
    zip.write_all(result.markdown.as_bytes())?;
    if result.images.is_empty() {
        return Ok(());
    }
    zip.add_directory(format!("{prefix}{IMAGES_DIR}/"), file_options())?;
    for image in &result.images {
        let name = plain_file_name(&image.filename)?;
        zip.start_file(format!("{prefix}{IMAGES_DIR}/{name}"), file_options())?;
        zip.write_all(&image.data)?;
    }
    Ok(())
}

fn file_options() -> FileOptions {
    FileOptions::default().compression_method(CompressionMethod::Deflated)
}

fn unique_name(base: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = base.to_string();
    let mut n = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{base}_{n}");
        n += 1;
    }
    candidate
}
