//! Command-line interface definitions for Queue Press.
//!
//! Every job is a subcommand. Secrets and site settings can be given as
//! flags or picked up from the environment, so a scheduler only needs to
//! export the usual variables and run `queue_press <job>`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for Queue Press.
///
/// # Examples
///
/// ```sh
/// # Publish the next pending blog post
/// queue_press --root ./site blog
///
/// # Send the next pending Telegram message
/// TELEGRAM_BOT_TOKEN=... TELEGRAM_CHAT_ID=@canal queue_press telegram
///
/// # Render the actions report
/// queue_press actions
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Site root; queue files, blog and download folders are resolved from here
    #[arg(short, long, default_value = ".", global = true)]
    pub root: PathBuf,

    /// Optional path to a generation config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// One single-shot job per subcommand.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish the first pending row of data/queue.csv as a blog post
    Blog(BlogArgs),
    /// Send the first pending row of data/telegram_queue.csv to Telegram
    Telegram(TelegramArgs),
    /// Render the first pending job of data/pdf_queue.yml and send it to Telegram
    Pdf(TelegramArgs),
    /// Render data/actions.yml into site/action_report.pdf
    Actions,
    /// Render the system status report into site/system_report.pdf
    System,
}

#[derive(Args, Debug, Clone)]
pub struct BlogArgs {
    /// Product landing page linked from the call-to-action button
    #[arg(
        long,
        env = "PRODUCT_URL",
        default_value = "https://go.hotmart.com/F102330634N?dp=1"
    )]
    pub product_url: String,

    /// Affiliate tag appended to the product URL
    #[arg(long, env = "AFFILIATE_TAG", default_value = "")]
    pub affiliate_tag: String,

    /// Hugging Face Inference API token; without it the offline writer is used
    #[arg(long, env = "HF_API_TOKEN")]
    pub hf_api_token: Option<String>,

    /// Primary text-generation model
    #[arg(long, env = "HF_MODEL_ID")]
    pub hf_model_id: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TelegramArgs {
    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", default_value = "", hide_env_values = true)]
    pub bot_token: String,

    /// Destination chat id or channel name (e.g. @finanzas_mkpato)
    #[arg(long, env = "TELEGRAM_CHAT_ID", default_value = "")]
    pub chat_id: String,

    /// Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub api_url: String,
}

impl TelegramArgs {
    /// Both the token and the chat id are set.
    pub fn is_configured(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_blog_defaults() {
        let cli = Cli::parse_from(["queue_press", "blog"]);
        assert_eq!(cli.root, PathBuf::from("."));
        match cli.command {
            Command::Blog(args) => {
                assert!(args.product_url.starts_with("https://"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_cli_global_root_after_subcommand() {
        let cli = Cli::parse_from(["queue_press", "actions", "--root", "/tmp/site"]);
        assert_eq!(cli.root, PathBuf::from("/tmp/site"));
        assert!(matches!(cli.command, Command::Actions));
    }

    #[test]
    fn test_cli_telegram_flags() {
        let cli = Cli::parse_from([
            "queue_press",
            "-r",
            "/srv/site",
            "telegram",
            "--bot-token",
            "123:abc",
            "--chat-id",
            "@canal",
        ]);
        match cli.command {
            Command::Telegram(args) => {
                assert!(args.is_configured());
                assert_eq!(args.chat_id, "@canal");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_telegram_args_not_configured() {
        let args = TelegramArgs {
            bot_token: "  ".into(),
            chat_id: "@canal".into(),
            api_url: "https://api.telegram.org".into(),
        };
        assert!(!args.is_configured());
    }
}
