//! Listing refresh for the blog archive and the home page.
//!
//! # Index Files
//!
//! - **blog/index.html**: one card per post, newest first
//! - **index.html**: links to the four newest posts
//!
//! Both pages carry a pair of markers; everything between them is
//! regenerated on each run from a scan of the blog directory:
//!
//! ```text
//! <!-- BLOG_POSTS -->  ...cards...  <!-- /BLOG_POSTS -->
//! <!-- LATEST_POSTS --> ...links... <!-- /LATEST_POSTS -->
//! ```
//!
//! A page with only the opening marker gets the closing one inserted, so
//! the refresh can be repeated.

use crate::utils::{escape_html, title_from_stem};
use chrono::{DateTime, Local};
use itertools::Itertools;
use scraper::{Html, Selector};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

pub const BLOG_MARKER: &str = "BLOG_POSTS";
pub const LATEST_MARKER: &str = "LATEST_POSTS";
pub const HOME_LATEST_COUNT: usize = 4;

const DEFAULT_BLOG_INDEX: &str = "<!doctype html>\n<html lang='es'>\n<head>\n  <meta charset='utf-8'>\n  <title>Blog · MkPato</title>\n</head>\n<body>\n  <main class='posts'>\n    <!-- BLOG_POSTS -->\n    <!-- /BLOG_POSTS -->\n  </main>\n</body>\n</html>\n";

/// A published post found in the blog directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub file_name: String,
    pub title: String,
    pub date: String,
    modified: SystemTime,
}

/// Extract `<h1>` and `p.date` text from a rendered post.
fn read_post_meta(html: &str) -> (Option<String>, Option<String>) {
    let document = Html::parse_document(html);
    let pick = |css: &str| {
        Selector::parse(css).ok().and_then(|sel| {
            document
                .select(&sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty())
        })
    };
    (pick("h1"), pick("p.date"))
}

/// Scan `blog_dir` for posts, newest modification time first.
///
/// `index.html` is skipped. Titles come from the post's `<h1>` and dates
/// from `p.date`; the file stem and modification date are the fallbacks.
#[instrument(level = "info", skip_all, fields(blog_dir = %blog_dir.display()))]
pub async fn scan_posts(blog_dir: &Path) -> Result<Vec<PostSummary>, Box<dyn Error>> {
    let mut entries = fs::read_dir(blog_dir).await?;
    let mut posts = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_html = path.extension().is_some_and(|ext| ext == "html");
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(str::to_string) else {
            continue;
        };
        if !is_html || file_name == "index.html" {
            continue;
        }

        let modified = entry.metadata().await?.modified()?;
        let (title, date) = match fs::read_to_string(&path).await {
            Ok(html) => read_post_meta(&html),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read post; using file name");
                (None, None)
            }
        };
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();

        posts.push(PostSummary {
            title: title.unwrap_or_else(|| title_from_stem(stem)),
            date: date.unwrap_or_else(|| DateTime::<Local>::from(modified).date_naive().to_string()),
            file_name,
            modified,
        });
    }

    let posts = posts
        .into_iter()
        .sorted_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.file_name.cmp(&b.file_name)))
        .collect::<Vec<_>>();
    debug!(count = posts.len(), "Scanned posts");
    Ok(posts)
}

/// Replace the content between `<!-- NAME -->` and `<!-- /NAME -->`.
///
/// Returns `None` when the opening marker is missing.
pub fn replace_marked_region(page: &str, marker: &str, content: &str) -> Option<String> {
    let open = format!("<!-- {marker} -->");
    let close = format!("<!-- /{marker} -->");

    let start = page.find(&open)? + open.len();
    let rest = &page[start..];

    let mut out = String::with_capacity(page.len() + content.len() + close.len() + 2);
    out.push_str(&page[..start]);
    out.push('\n');
    out.push_str(content);
    out.push('\n');
    match rest.find(&close) {
        Some(offset) => out.push_str(&rest[offset..]),
        None => {
            out.push_str(&close);
            out.push_str(rest);
        }
    }
    Some(out)
}

pub fn blog_cards(posts: &[PostSummary]) -> String {
    posts
        .iter()
        .map(|p| {
            let name = escape_html(&p.file_name);
            format!(
                "<div class='post-card'><h2><a href='/blog/{name}'>{}</a></h2><p>{}</p><a href='/blog/{name}'>Leer más →</a></div>",
                escape_html(&p.title),
                escape_html(&p.date),
            )
        })
        .join("\n")
}

pub fn latest_links(posts: &[PostSummary], count: usize) -> String {
    let links: String = posts
        .iter()
        .take(count)
        .map(|p| {
            format!(
                "<div><a href='/blog/{}'>{}</a></div>",
                escape_html(&p.file_name),
                escape_html(&p.title)
            )
        })
        .collect();
    format!("<div class='postlist'>{links}</div>")
}

async fn rewrite_region(page_path: &Path, marker: &str, content: &str) -> Result<(), Box<dyn Error>> {
    let page = fs::read_to_string(page_path).await?;
    match replace_marked_region(&page, marker, content) {
        Some(updated) => {
            fs::write(page_path, updated).await?;
            Ok(())
        }
        None => Err(format!("marker <!-- {marker} --> not found in {}", page_path.display()).into()),
    }
}

/// Rebuild the card list of `blog/index.html`, creating a minimal page if needed.
#[instrument(level = "info", skip_all, fields(blog_dir = %blog_dir.display()))]
pub async fn update_blog_index(blog_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let index_path = blog_dir.join("index.html");
    if !index_path.exists() {
        fs::write(&index_path, DEFAULT_BLOG_INDEX).await?;
        info!(path = %index_path.display(), "Created blog index");
    }
    let posts = scan_posts(blog_dir).await?;
    rewrite_region(&index_path, BLOG_MARKER, &blog_cards(&posts)).await?;
    info!(path = %index_path.display(), posts = posts.len(), "Updated blog index");
    Ok(index_path)
}

/// Rebuild the latest-posts block of the home page.
#[instrument(level = "info", skip_all, fields(home = %home_path.display()))]
pub async fn update_home_latest(blog_dir: &Path, home_path: &Path) -> Result<(), Box<dyn Error>> {
    let posts = scan_posts(blog_dir).await?;
    rewrite_region(home_path, LATEST_MARKER, &latest_links(&posts, HOME_LATEST_COUNT)).await?;
    info!(posts = posts.len().min(HOME_LATEST_COUNT), "Updated home latest posts");
    Ok(())
}
