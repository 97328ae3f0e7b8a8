use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use wx2md_core::{upsert, HistoryArticle, HistoryError, HistoryStore};
use wx2md_engine::AtomicFileWriter;
use wx_logging::{wx_debug, wx_info};

pub const DEFAULT_HISTORY_FILE: &str = ".wx2md_history.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedHistory {
    articles: Vec<HistoryArticle>,
}

/// History store backed by a single RON file, rewritten atomically on every change.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
}

impl FileHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<HistoryArticle>, HistoryError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(HistoryError::Storage(format!(
                    "failed to read {:?}: {}",
                    self.path, err
                )));
            }
        };

        let state: PersistedHistory = ron::from_str(&content).map_err(|err| {
            HistoryError::Format(format!("failed to parse {:?}: {}", self.path, err))
        })?;
        wx_debug!(
            "Loaded {} history entries from {:?}",
            state.articles.len(),
            self.path
        );
        Ok(state.articles)
    }

    fn store(&self, articles: Vec<HistoryArticle>) -> Result<(), HistoryError> {
        let state = PersistedHistory { articles };
        let pretty = ron::ser::PrettyConfig::new();
        let content = ron::ser::to_string_pretty(&state, pretty)
            .map_err(|err| HistoryError::Format(err.to_string()))?;

        let (dir, filename) = self.split_path()?;
        AtomicFileWriter::new(dir)
            .write(&filename, &content)
            .map_err(|err| {
                HistoryError::Storage(format!("failed to write {:?}: {}", self.path, err))
            })?;
        Ok(())
    }

    fn split_path(&self) -> Result<(PathBuf, String), HistoryError> {
        let filename = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| HistoryError::Storage(format!("invalid history path {:?}", self.path)))?
            .to_string();
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok((dir, filename))
    }
}

impl HistoryStore for FileHistoryStore {
    fn get(&self) -> Result<Vec<HistoryArticle>, HistoryError> {
        self.load()
    }

    fn save(&mut self, article: HistoryArticle) -> Result<(), HistoryError> {
        let mut articles = self.load()?;
        wx_info!("Saving {} to history", article.url);
        upsert(&mut articles, article, Utc::now());
        self.store(articles)
    }

    fn remove(&mut self, id: &str) -> Result<bool, HistoryError> {
        let mut articles = self.load()?;
        let before = articles.len();
        articles.retain(|item| item.id != id);
        if articles.len() == before {
            return Ok(false);
        }
        self.store(articles)?;
        Ok(true)
    }

    fn clear(&mut self) -> Result<(), HistoryError> {
        self.store(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;
    use wx2md_core::{ConversionResult, ExtractedContent, MaterializedImage, MAX_HISTORY_ITEMS};

    fn store_in(temp: &TempDir) -> FileHistoryStore {
        FileHistoryStore::new(temp.path().join("nested").join(DEFAULT_HISTORY_FILE))
    }

    fn converted(url: &str) -> HistoryArticle {
        let result = ConversionResult {
            title: "Title".into(),
            markdown: "![](./images/image_1_000_abcdef.png)".into(),
            images: vec![MaterializedImage {
                original_url: "https://cdn.example.com/a.png".into(),
                filename: "image_1_000_abcdef.png".into(),
                data: vec![0, 159, 146, 150],
                mime_type: "image/png".into(),
            }],
        };
        HistoryArticle::converted(url, None, &result)
    }

    #[test]
    fn missing_file_reads_as_empty() {
        let temp = TempDir::new().unwrap();
        assert!(store_in(&temp).get().unwrap().is_empty());
    }

    #[test]
    fn entries_survive_reload() {
        let temp = TempDir::new().unwrap();
        let mut store = store_in(&temp);
        let content = ExtractedContent {
            title: "Preview".into(),
            content_markup: "<p>hi</p>".into(),
        };
        store
            .save(HistoryArticle::fetched("https://mp.weixin.qq.com/s/a", &content))
            .unwrap();
        store.save(converted("https://mp.weixin.qq.com/s/b")).unwrap();

        let reloaded = store_in(&temp).get().unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded[0].url, "https://mp.weixin.qq.com/s/b");
        assert_eq!(reloaded[0].images.as_ref().unwrap()[0].data, vec![0, 159, 146, 150]);
        assert_eq!(reloaded[1].html_content.as_deref(), Some("<p>hi</p>"));
    }

    #[test]
    fn saving_same_url_replaces_entry() {
        let temp = TempDir::new().unwrap();
        let mut store = store_in(&temp);
        store
            .save(HistoryArticle::new("https://mp.weixin.qq.com/s/a"))
            .unwrap();
        store.save(converted("https://mp.weixin.qq.com/s/a")).unwrap();

        let items = store.get().unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].markdown.is_some());
    }

    #[test]
    fn history_is_capped() {
        let temp = TempDir::new().unwrap();
        let mut store = store_in(&temp);
        for i in 0..MAX_HISTORY_ITEMS + 3 {
            store
                .save(HistoryArticle::new(format!("https://mp.weixin.qq.com/s/{i}")))
                .unwrap();
        }
        let items = store.get().unwrap();
        assert_eq!(items.len(), MAX_HISTORY_ITEMS);
        assert_eq!(
            items[0].url,
            format!("https://mp.weixin.qq.com/s/{}", MAX_HISTORY_ITEMS + 2)
        );
    }

    #[test]
    fn remove_and_clear() {
        let temp = TempDir::new().unwrap();
        let mut store = store_in(&temp);
        let article = converted("https://mp.weixin.qq.com/s/a");
        let id = article.id.clone();
        store.save(article).unwrap();
        store
            .save(HistoryArticle::new("https://mp.weixin.qq.com/s/b"))
            .unwrap();

        assert!(store.find(&id).unwrap().is_some());
        assert!(store.remove(&id).unwrap());
        assert!(!store.remove(&id).unwrap());
        assert_eq!(store.get().unwrap().len(), 1);

        store.clear().unwrap();
        assert!(store.get().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_is_a_format_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(DEFAULT_HISTORY_FILE);
        fs::write(&path, "not ron at all {").unwrap();
        let store = FileHistoryStore::new(path);
        assert!(matches!(store.get(), Err(HistoryError::Format(_))));
    }
}
