//! # Queue Press
//!
//! Content-publishing jobs for a static marketing site. Each run takes the
//! first pending entry of a queue file and turns it into something
//! published:
//!
//! - **blog**: `data/queue.csv` row → generated article → `blog/<slug>.html`,
//!   then the archive and home page listings are refreshed
//! - **telegram**: `data/telegram_queue.csv` row → quality gate → Bot API message
//! - **pdf**: `data/pdf_queue.yml` job → `downloads/<slug>.pdf` → Bot API document
//! - **actions**: `data/actions.yml` → `site/action_report.pdf`
//! - **system**: status report → `site/system_report.pdf`
//!
//! ## Usage
//!
//! ```sh
//! queue_press --root ./site blog
//! RUST_LOG=debug queue_press telegram
//! ```
//!
//! Runs are single-shot; scheduling is left to cron or CI.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod generate;
mod jobs;
mod models;
mod outputs;
mod queue;
mod reports;
mod telegram;
mod utils;

use cli::{Cli, Command};
use jobs::{Outcome, SitePaths};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("queue_press starting up");

    let args = Cli::parse();
    debug!(root = %args.root.display(), config = ?args.config, "Parsed CLI arguments");

    let paths = SitePaths::new(&args.root);
    let result = match &args.command {
        Command::Blog(blog) => {
            let mut config = config::load_config(args.config.as_deref())?;
            if let Some(model) = blog.hf_model_id.as_deref().filter(|m| !m.is_empty()) {
                config.model = model.to_string();
            }
            jobs::publish_next(&paths, blog, &config).await
        }
        Command::Telegram(tg) => jobs::post_next(&paths, tg).await,
        Command::Pdf(tg) => jobs::send_pdf_next(&paths, tg).await,
        Command::Actions => jobs::action_report(&paths).await,
        Command::System => jobs::system_report(&paths).await,
    };

    let elapsed = start_time.elapsed();
    match result {
        Ok(outcome) => {
            match &outcome {
                Outcome::Idle => info!("Nothing pending"),
                Outcome::Published(path) => info!(path = %path.display(), "Published"),
                Outcome::Rejected => info!("Entry rejected and kept as draft"),
            }
            info!(?elapsed, millis = elapsed.as_millis(), "Execution complete");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, ?elapsed, "Job failed");
            Err(e)
        }
    }
}
