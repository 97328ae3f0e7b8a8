mod cli;
mod history_file;
mod logging;
mod runner;

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use wx2md_core::{ArticleSession, HistoryArticle, HistoryStore, Msg, SessionState};
use wx2md_engine::{
    write_collection, write_package, ArticlePipeline, FetchSettings, PackageFormat,
    PipelineSettings,
};
use wx_logging::wx_info;

use cli::{Cli, Commands, HistoryAction};
use history_file::FileHistoryStore;
use runner::SessionRunner;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log, cli.verbose);

    let settings = PipelineSettings {
        expected_host: cli.host.clone(),
        fetch: FetchSettings {
            request_timeout: Duration::from_secs(cli.timeout_secs),
            ..FetchSettings::default()
        },
    };
    let history = FileHistoryStore::new(cli.history_file.clone());
    wx_info!("Using history file {:?}", history.path());
    let pipeline = ArticlePipeline::new(settings).context("failed to set up the http client")?;
    let mut runner = SessionRunner::new(pipeline, history);

    match cli.command {
        Commands::Fetch { url, json } => fetch(&mut runner, &url, json).await,
        Commands::Convert {
            url,
            out,
            format,
            json,
        } => convert(&mut runner, &url, &out, format.into(), json).await,
        Commands::History { action } => history_command(&mut runner, action).await,
        Commands::Export { out } => export(runner.history(), &out),
    }
}

async fn fetch(runner: &mut SessionRunner<FileHistoryStore>, url: &str, json: bool) -> Result<()> {
    let session = runner
        .dispatch(ArticleSession::new(), Msg::UrlChanged(url.to_string()))
        .await;
    let session = settle(runner.dispatch(session, Msg::FetchClicked).await)?;
    let content = session
        .content()
        .ok_or_else(|| anyhow!("fetch produced no content"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(content)?);
    } else {
        println!("{}\n", content.title);
        println!("{}", content.content_markup);
    }
    Ok(())
}

async fn convert(
    runner: &mut SessionRunner<FileHistoryStore>,
    url: &str,
    out: &Path,
    format: PackageFormat,
    json: bool,
) -> Result<()> {
    let session = runner
        .dispatch(ArticleSession::new(), Msg::UrlChanged(url.to_string()))
        .await;
    let session = settle(runner.dispatch(session, Msg::FetchClicked).await)?;
    let session = settle(runner.dispatch(session, Msg::ConvertClicked).await)?;
    emit_result(&session, out, format, json)
}

async fn history_command(
    runner: &mut SessionRunner<FileHistoryStore>,
    action: HistoryAction,
) -> Result<()> {
    match action {
        HistoryAction::List => {
            let items = runner.history().get()?;
            if items.is_empty() {
                println!("History is empty.");
            }
            for item in items {
                println!(
                    "{}  {}  {:<9}  {}  {}",
                    item.id,
                    item.saved_at.format("%Y-%m-%d %H:%M"),
                    stage_label(&item),
                    item.title.as_deref().unwrap_or("-"),
                    item.url
                );
            }
            Ok(())
        }
        HistoryAction::Show { id, json } => {
            let article = find(runner.history(), &id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&article)?);
                return Ok(());
            }
            let session = runner.dispatch(ArticleSession::new(), Msg::Restore(article)).await;
            match (session.result(), session.content()) {
                (Some(result), _) => println!("{}", result.markdown),
                (None, Some(content)) => println!("{}", content.content_markup),
                (None, None) => println!("{} has not been fetched yet.", session.url()),
            }
            Ok(())
        }
        HistoryAction::Save { id, out, format } => {
            let article = find(runner.history(), &id)?;
            let session = runner.dispatch(ArticleSession::new(), Msg::Restore(article)).await;
            if session.state() != SessionState::Converted {
                bail!("history entry {id} has not been converted");
            }
            emit_result(&session, &out, format.into(), false)
        }
        HistoryAction::Remove { id } => {
            if runner.history_mut().remove(&id)? {
                println!("Removed {id}");
                Ok(())
            } else {
                bail!("no history entry with id {id}")
            }
        }
        HistoryAction::Clear => {
            runner.history_mut().clear()?;
            println!("History cleared.");
            Ok(())
        }
    }
}

fn export(history: &FileHistoryStore, out: &Path) -> Result<()> {
    let articles = history.get()?;
    let filename = out
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("invalid archive path {:?}", out))?;
    let dir = match out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let (path, summary) = write_collection(dir, filename, &articles)
        .with_context(|| format!("failed to export history to {:?}", out))?;
    println!(
        "Exported {} article(s) with {} image(s) to {}",
        summary.article_count,
        summary.image_count,
        path.display()
    );
    Ok(())
}

fn emit_result(session: &ArticleSession, out: &Path, format: PackageFormat, json: bool) -> Result<()> {
    let result = session
        .result()
        .ok_or_else(|| anyhow!("conversion produced no result"))?;
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    let path = write_package(out, result, format)
        .with_context(|| format!("failed to write package to {:?}", out))?;
    println!(
        "Wrote {} ({} image(s))",
        path.display(),
        result.images.len()
    );
    Ok(())
}

fn settle(session: ArticleSession) -> Result<ArticleSession> {
    if session.state() == SessionState::Error {
        bail!(
            "{}",
            session.error().unwrap_or("article processing failed")
        );
    }
    Ok(session)
}

fn find(history: &FileHistoryStore, id: &str) -> Result<HistoryArticle> {
    history
        .find(id)?
        .ok_or_else(|| anyhow!("no history entry with id {id}"))
}

fn stage_label(article: &HistoryArticle) -> &'static str {
    if article.markdown.is_some() {
        "converted"
    } else if article.html_content.is_some() {
        "fetched"
    } else {
        "saved"
    }
}
