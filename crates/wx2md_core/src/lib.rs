//! wx2md core: article data model, per-article state machine and history policy.
mod effect;
mod history;
mod model;
mod msg;
mod state;
mod update;

pub use effect::Effect;
pub use history::{
    history_id, upsert, HistoryArticle, HistoryError, HistoryStore, MemoryHistoryStore,
    MAX_HISTORY_ITEMS,
};
pub use model::{
    local_image_path, ArticleSource, ConversionResult, ExtractedContent, ImageReference,
    InvalidSource, MaterializedImage, DEFAULT_ARTICLE_HOST,
};
pub use msg::Msg;
pub use state::{ArticleSession, SessionState};
pub use update::update;
