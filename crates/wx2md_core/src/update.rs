use crate::{ArticleSession, Effect, HistoryArticle, Msg, SessionState};

/// Pure update function: applies a message to the session and returns any effects.
///
/// Messages that do not fit the current state are ignored.
pub fn update(mut session: ArticleSession, msg: Msg) -> (ArticleSession, Vec<Effect>) {
    let effects = match msg {
        Msg::UrlChanged(raw) => {
            if session.state().is_busy() {
                return (session, Vec::new());
            }
            session.set_url(raw.trim().to_string());
            Vec::new()
        }
        Msg::FetchClicked => {
            if session.state() != SessionState::Idle {
                return (session, Vec::new());
            }
            session.begin(SessionState::Fetching);
            vec![Effect::FetchArticle {
                url: session.url().to_string(),
            }]
        }
        Msg::FetchFinished(result) => {
            if session.state() != SessionState::Fetching {
                return (session, Vec::new());
            }
            match result {
                Ok(content) => {
                    let record = HistoryArticle::fetched(session.url(), &content);
                    session.apply_fetched(content);
                    vec![Effect::SaveHistory(record)]
                }
                Err(message) => {
                    session.apply_error(message);
                    Vec::new()
                }
            }
        }
        Msg::ConvertClicked => {
            if session.state() != SessionState::Fetched {
                return (session, Vec::new());
            }
            session.begin(SessionState::Converting);
            vec![Effect::ConvertArticle {
                url: session.url().to_string(),
            }]
        }
        Msg::ConvertFinished(result) => {
            if session.state() != SessionState::Converting {
                return (session, Vec::new());
            }
            match result {
                Ok(conversion) => {
                    let record =
                        HistoryArticle::converted(session.url(), session.content(), &conversion);
                    session.apply_converted(conversion);
                    vec![Effect::SaveHistory(record)]
                }
                Err(message) => {
                    session.apply_error(message);
                    Vec::new()
                }
            }
        }
        Msg::Restore(article) => {
            if session.state().is_busy() {
                return (session, Vec::new());
            }
            let content = article.html_content.as_ref().map(|markup| crate::ExtractedContent {
                title: article.title.clone().unwrap_or_default(),
                content_markup: markup.clone(),
            });
            let result = article.conversion();
            session.restore(article.url, content, result);
            Vec::new()
        }
        Msg::Reset => {
            if session.state().is_busy() {
                return (session, Vec::new());
            }
            session.reset();
            Vec::new()
        }
    };

    (session, effects)
}
