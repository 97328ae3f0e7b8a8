use crate::{ConversionResult, ExtractedContent};

/// Lifecycle of one article. `Converted` and `Error` are terminal until reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Fetching,
    Fetched,
    Converting,
    Converted,
    Error,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Converted | SessionState::Error)
    }

    pub fn is_busy(self) -> bool {
        matches!(self, SessionState::Fetching | SessionState::Converting)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticleSession {
    url: String,
    state: SessionState,
    content: Option<ExtractedContent>,
    result: Option<ConversionResult>,
    error: Option<String>,
    dirty: bool,
}

impl ArticleSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn content(&self) -> Option<&ExtractedContent> {
        self.content.as_ref()
    }

    pub fn result(&self) -> Option<&ConversionResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns whether anything changed since the last call, and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn set_url(&mut self, url: String) {
        self.url = url;
        self.clear_outputs();
        self.state = SessionState::Idle;
        self.dirty = true;
    }

    pub(crate) fn begin(&mut self, state: SessionState) {
        self.state = state;
        self.error = None;
        self.dirty = true;
    }

    pub(crate) fn apply_fetched(&mut self, content: ExtractedContent) {
        self.content = Some(content);
        self.state = SessionState::Fetched;
        self.dirty = true;
    }

    pub(crate) fn apply_converted(&mut self, result: ConversionResult) {
        self.result = Some(result);
        self.state = SessionState::Converted;
        self.dirty = true;
    }

    pub(crate) fn apply_error(&mut self, message: String) {
        self.error = Some(message);
        self.state = SessionState::Error;
        self.dirty = true;
    }

    pub(crate) fn restore(
        &mut self,
        url: String,
        content: Option<ExtractedContent>,
        result: Option<ConversionResult>,
    ) {
        self.state = if result.is_some() {
            SessionState::Converted
        } else if content.is_some() {
            SessionState::Fetched
        } else {
            SessionState::Idle
        };
        self.url = url;
        self.content = content;
        self.result = result;
        self.error = None;
        self.dirty = true;
    }

    pub(crate) fn reset(&mut self) {
        self.clear_outputs();
        self.state = SessionState::Idle;
        self.dirty = true;
    }

    fn clear_outputs(&mut self) {
        self.content = None;
        self.result = None;
        self.error = None;
    }
}
