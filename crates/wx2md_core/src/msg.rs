#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the article URL.
    UrlChanged(String),
    /// User asked for a raw-content preview.
    FetchClicked,
    /// Preview pipeline finished; the error is a human-readable message.
    FetchFinished(Result<crate::ExtractedContent, String>),
    /// User asked for Markdown conversion of a fetched article.
    ConvertClicked,
    /// Conversion pipeline finished; the error is a human-readable message.
    ConvertFinished(Result<crate::ConversionResult, String>),
    /// Reopen an article from the history store.
    Restore(crate::HistoryArticle),
    /// Start over at `Idle`, keeping the URL.
    Reset,
}
