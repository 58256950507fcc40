//! The single-shot jobs behind each subcommand.
//!
//! Every job follows the same shape: load its queue or data file, pick the
//! first pending entry, produce the artifact, deliver it, flip the status
//! flag and rewrite the queue. An empty queue is a successful no-op.

use crate::cli::{BlogArgs, TelegramArgs};
use crate::config::GenerationConfig;
use crate::generate::generate_article;
use crate::models::{BlogEntry, Status, TelegramEntry};
use crate::outputs::{indexes, pdf, post};
use crate::queue::{CsvQueue, PdfQueue};
use crate::reports;
use crate::telegram::{BANNED_TERMS, TelegramClient, build_message, quality_ok};
use crate::utils::{ensure_writable_dir, slugify};
use chrono::Local;
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, warn};

/// File locations under the site root.
#[derive(Debug, Clone)]
pub struct SitePaths {
    pub root: PathBuf,
}

impl SitePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn blog_queue(&self) -> PathBuf {
        self.root.join("data").join("queue.csv")
    }

    pub fn telegram_queue(&self) -> PathBuf {
        self.root.join("data").join("telegram_queue.csv")
    }

    pub fn pdf_queue(&self) -> PathBuf {
        self.root.join("data").join("pdf_queue.yml")
    }

    pub fn actions(&self) -> PathBuf {
        self.root.join("data").join("actions.yml")
    }

    pub fn blog_dir(&self) -> PathBuf {
        self.root.join("blog")
    }

    pub fn home(&self) -> PathBuf {
        self.root.join("index.html")
    }

    pub fn downloads(&self) -> PathBuf {
        self.root.join("downloads")
    }

    pub fn site_dir(&self) -> PathBuf {
        self.root.join("site")
    }
}

/// What a job did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing pending in the queue.
    Idle,
    /// Artifact written (and delivered, where the job delivers).
    Published(PathBuf),
    /// Queue entry rejected and marked as draft.
    Rejected,
}

fn require_file(path: &Path) -> Result<(), Box<dyn Error>> {
    if path.exists() {
        Ok(())
    } else {
        error!(path = %path.display(), "Queue file not found");
        Err(format!("missing queue file {}", path.display()).into())
    }
}

fn require_telegram(args: &TelegramArgs) -> Result<TelegramClient, Box<dyn Error>> {
    if !args.is_configured() {
        error!("TELEGRAM_BOT_TOKEN or TELEGRAM_CHAT_ID is not set");
        return Err("missing Telegram credentials".into());
    }
    TelegramClient::new(&args.api_url, &args.bot_token, &args.chat_id)
}

fn blog_entry(queue: &CsvQueue, row: usize) -> BlogEntry {
    let title = queue.get(row, "title");
    BlogEntry {
        title: if title.is_empty() { "Post".to_string() } else { title.to_string() },
        url: queue.get(row, "url").to_string(),
        tags: queue.get(row, "tags").to_string(),
        summary: queue.get(row, "body").to_string(),
    }
}

/// Publish the first pending row of the blog queue.
#[instrument(level = "info", skip_all, fields(root = %paths.root.display()))]
pub async fn publish_next(
    paths: &SitePaths,
    args: &BlogArgs,
    config: &GenerationConfig,
) -> Result<Outcome, Box<dyn Error>> {
    let queue_path = paths.blog_queue();
    require_file(&queue_path)?;
    let mut queue = CsvQueue::load(&queue_path)?;
    let Some(row) = queue.next_pending() else {
        warn!("No pending blog entries");
        return Ok(Outcome::Idle);
    };
    let entry = blog_entry(&queue, row);
    info!(row, title = %entry.title, "Publishing blog entry");

    let article = generate_article(
        config,
        args.hf_api_token.as_deref(),
        &entry.title,
        &entry.summary,
        &entry.tags,
    )
    .await;
    info!(source = ?article.source, "Article body ready");

    let blog_dir = paths.blog_dir();
    ensure_writable_dir(&blog_dir).await?;
    let out = blog_dir.join(format!("{}.html", slugify(&entry.title)));
    let product = post::product_link(&args.product_url, &args.affiliate_tag);
    let date = Local::now().date_naive().to_string();
    let html = post::render_post(&post::PostContext {
        title: &entry.title,
        summary: &entry.summary,
        body: &article.body,
        url: &entry.url,
        tags: &entry.tags,
        product_url: &product,
        date: &date,
    });
    tokio::fs::write(&out, html).await?;
    info!(path = %out.display(), "Wrote post");

    queue.set_status(row, Status::Done);
    queue.save(&queue_path)?;

    if let Err(e) = indexes::update_blog_index(&blog_dir).await {
        error!(error = %e, "Failed to update blog index");
    }
    if let Err(e) = indexes::update_home_latest(&blog_dir, &paths.home()).await {
        error!(error = %e, "Failed to update home latest posts");
    }

    info!(title = %entry.title, path = %out.display(), "Published blog post");
    Ok(Outcome::Published(out))
}

/// Send the first pending row of the Telegram queue.
///
/// Rows that fail the quality gate are marked `draft`. A failed send
/// leaves the row pending and returns the error.
#[instrument(level = "info", skip_all, fields(root = %paths.root.display()))]
pub async fn post_next(paths: &SitePaths, args: &TelegramArgs) -> Result<Outcome, Box<dyn Error>> {
    let client = require_telegram(args)?;
    let queue_path = paths.telegram_queue();
    require_file(&queue_path)?;
    let mut queue = CsvQueue::load(&queue_path)?;
    let Some(row) = queue.next_pending() else {
        warn!("No pending Telegram messages");
        return Ok(Outcome::Idle);
    };
    let entry = TelegramEntry {
        title: queue.get(row, "title").to_string(),
        body: queue.get(row, "body").to_string(),
        cta: queue.get(row, "cta").to_string(),
    };

    let outcome = if quality_ok(&entry.title, &entry.body, BANNED_TERMS) {
        let msg = build_message(&entry.title, &entry.body, Some(entry.cta.as_str()));
        client.send_message(&msg).await?;
        queue.set_status(row, Status::Done);
        info!(title = %entry.title, "Sent to Telegram");
        Outcome::Published(queue_path.clone())
    } else {
        warn!(row, title = %entry.title, "Message rejected by quality gate; marked as draft");
        queue.set_status(row, Status::Draft);
        Outcome::Rejected
    };

    queue.save(&queue_path)?;
    Ok(outcome)
}

/// Render the first pending PDF job and send it to Telegram.
#[instrument(level = "info", skip_all, fields(root = %paths.root.display()))]
pub async fn send_pdf_next(paths: &SitePaths, args: &TelegramArgs) -> Result<Outcome, Box<dyn Error>> {
    let client = require_telegram(args)?;
    let queue_path = paths.pdf_queue();
    require_file(&queue_path)?;
    let mut queue = PdfQueue::load(&queue_path)?;
    let Some(index) = queue.next_pending() else {
        warn!("No pending PDF jobs");
        return Ok(Outcome::Idle);
    };
    let job = queue.job(index)?;

    let downloads = paths.downloads();
    ensure_writable_dir(&downloads).await?;
    let out = downloads.join(format!("{}.pdf", slugify(&job.meta.slug)));
    let bytes = pdf::render_pdf(&reports::pdf_job_report(&job), &pdf::Theme::dark())?;
    tokio::fs::write(&out, bytes).await?;
    info!(path = %out.display(), "Wrote PDF");

    client.send_document(&out, reports::pdf_job_caption(&job)).await?;

    queue.set_status(index, Status::Done);
    queue.save(&queue_path)?;
    info!(path = %out.display(), "PDF sent");
    Ok(Outcome::Published(out))
}

async fn write_report(dir: &Path, file: &str, report: &pdf::Report) -> Result<PathBuf, Box<dyn Error>> {
    ensure_writable_dir(dir).await?;
    let out = dir.join(file);
    let bytes = pdf::render_pdf(report, &pdf::Theme::light())?;
    tokio::fs::write(&out, bytes).await?;
    info!(path = %out.display(), "PDF generated");
    Ok(out)
}

/// Render `data/actions.yml` into `site/action_report.pdf`.
#[instrument(level = "info", skip_all, fields(root = %paths.root.display()))]
pub async fn action_report(paths: &SitePaths) -> Result<Outcome, Box<dyn Error>> {
    let actions = reports::load_actions(&paths.actions()).await?;
    let report = reports::actions_report(&actions, Local::now());
    let out = write_report(&paths.site_dir(), "action_report.pdf", &report).await?;
    Ok(Outcome::Published(out))
}

/// Render the system status report into `site/system_report.pdf`.
#[instrument(level = "info", skip_all, fields(root = %paths.root.display()))]
pub async fn system_report(paths: &SitePaths) -> Result<Outcome, Box<dyn Error>> {
    let report = reports::system_report(Local::now());
    let out = write_report(&paths.site_dir(), "system_report.pdf", &report).await?;
    Ok(Outcome::Published(out))
}
