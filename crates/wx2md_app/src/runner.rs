use std::collections::VecDeque;

use wx2md_core::{update, ArticleSession, Effect, HistoryStore, Msg};
use wx2md_engine::ArticlePipeline;
use wx_logging::{wx_error, wx_info, wx_warn};

/// Drives an [`ArticleSession`]: applies messages, executes the resulting
/// effects against the pipeline and history store, and feeds completions back in.
pub struct SessionRunner<S> {
    pipeline: ArticlePipeline,
    history: S,
}

impl<S: HistoryStore> SessionRunner<S> {
    pub fn new(pipeline: ArticlePipeline, history: S) -> Self {
        Self { pipeline, history }
    }

    pub fn history(&self) -> &S {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut S {
        &mut self.history
    }

    /// Applies `msg` and every follow-up message until the session settles.
    pub async fn dispatch(&mut self, mut session: ArticleSession, msg: Msg) -> ArticleSession {
        let mut inbox = VecDeque::from([msg]);
        while let Some(msg) = inbox.pop_front() {
            let (next, effects) = update(session, msg);
            session = next;
            for effect in effects {
                if let Some(reply) = self.execute(effect).await {
                    inbox.push_back(reply);
                }
            }
        }
        session
    }

    async fn execute(&mut self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::FetchArticle { url } => {
                wx_info!("FetchArticle url={}", url);
                let result = self.pipeline.fetch_article(&url).await.map_err(|err| {
                    wx_warn!("Fetch of {} failed: {}", url, err);
                    err.to_string()
                });
                Some(Msg::FetchFinished(result))
            }
            Effect::ConvertArticle { url } => {
                wx_info!("ConvertArticle url={}", url);
                let result = self.pipeline.convert_article(&url).await.map_err(|err| {
                    wx_warn!("Conversion of {} failed: {}", url, err);
                    err.to_string()
                });
                Some(Msg::ConvertFinished(result))
            }
            Effect::SaveHistory(article) => {
                let url = article.url.clone();
                if let Err(err) = self.history.save(article) {
                    wx_error!("Failed to save {} to history: {}", url, err);
                }
                None
            }
        }
    }
}
