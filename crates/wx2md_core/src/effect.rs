#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchArticle { url: String },
    ConvertArticle { url: String },
    SaveHistory(crate::HistoryArticle),
}
