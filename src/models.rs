//! Data models for queue entries and report sources.
//!
//! - [`Status`]: the lifecycle flag stored in every queue
//! - [`BlogEntry`], [`TelegramEntry`]: typed views over a CSV queue row
//! - [`PdfJob`], [`PdfMeta`], [`PdfSection`]: one job of `pdf_queue.yml`
//! - [`ActionsFile`], [`ActionSystem`]: the contents of `actions.yml`

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle flag of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Waiting to be processed.
    Pending,
    /// Processed and delivered.
    Done,
    /// Rejected by the quality gate; kept for manual editing.
    Draft,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Done => "done",
            Status::Draft => "draft",
        }
    }

    /// Whether a raw status cell means "pending" (case-insensitive, surrounding
    /// whitespace ignored).
    pub fn is_pending(raw: &str) -> bool {
        raw.trim().eq_ignore_ascii_case(Status::Pending.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of `data/queue.csv`.
///
/// The `body` column is treated as a short summary; the article body itself
/// is generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogEntry {
    pub title: String,
    pub url: String,
    pub tags: String,
    pub summary: String,
}

/// A row of `data/telegram_queue.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramEntry {
    pub title: String,
    pub body: String,
    pub cta: String,
}

/// One job of `data/pdf_queue.yml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PdfJob {
    #[serde(default)]
    pub status: Option<String>,
    pub meta: PdfMeta,
    #[serde(default)]
    pub sections: Vec<PdfSection>,
}

/// Document metadata of a [`PdfJob`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PdfMeta {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    /// File stem of the rendered PDF under `downloads/`.
    pub slug: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub footer: String,
}

/// A section of a [`PdfJob`]; every part is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PdfSection {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub bullets: Vec<String>,
}

/// Contents of `data/actions.yml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ActionsFile {
    #[serde(default)]
    pub systems: Vec<ActionSystem>,
}

/// A single action plan listed in the actions report.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ActionSystem {
    pub title: Option<String>,
    pub subtitle: String,
    pub objective: String,
    pub steps: Vec<String>,
    pub rule: String,
    pub prompt: String,
    pub metric: String,
    pub cta: String,
}
