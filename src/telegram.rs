//! Telegram Bot API delivery.
//!
//! Messages are sent with `parse_mode=HTML`; documents go out as multipart
//! uploads. Before a queued message is sent it must pass [`quality_ok`].

use quick_xml::escape::partial_escape;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use std::error::Error;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

/// Terms that must not appear in a published message body.
pub const BANNED_TERMS: &[&str] = &["claridad"];

pub const MIN_TITLE_CHARS: usize = 8;
pub const MIN_BODY_CHARS: usize = 220;
pub const MIN_BODY_SPACES: usize = 40;

/// Editorial quality gate for a queued message.
///
/// The title needs at least 8 characters and the body at least 220
/// characters with at least 40 spaces. Bodies mentioning a banned term
/// (case-insensitive) are rejected.
pub fn quality_ok(title: &str, body: &str, banned: &[&str]) -> bool {
    let body = body.trim();
    if title.trim().chars().count() < MIN_TITLE_CHARS {
        return false;
    }
    if body.chars().count() < MIN_BODY_CHARS || body.matches(' ').count() < MIN_BODY_SPACES {
        return false;
    }
    let lower = body.to_lowercase();
    !banned.iter().any(|term| lower.contains(&term.to_lowercase()))
}

/// Escape text for `parse_mode=HTML`.
///
/// The Bot API only knows the `&lt;` `&gt;` `&amp;` `&quot;` named entities,
/// so apostrophes go out as a numeric entity.
pub fn escape_telegram(s: &str) -> String {
    partial_escape(s).replace('"', "&quot;").replace('\'', "&#39;")
}

/// Build the HTML message text.
///
/// The title is escaped; the body is sent as-is so the queue can carry
/// Telegram's basic HTML tags.
pub fn build_message(title: &str, body: &str, cta: Option<&str>) -> String {
    let mut msg = format!("<b>{}</b>\n\n{}", escape_telegram(title.trim()), body.trim());
    if let Some(cta) = cta.map(str::trim).filter(|c| !c.is_empty()) {
        msg.push_str(&format!("\n\n<a href='{}'>Acceder</a>", escape_telegram(cta)));
    }
    msg
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Minimal Bot API client bound to one chat.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    chat_id: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("base_url", &self.base_url)
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    pub fn new(base_url: &str, token: &str, chat_id: &str) -> Result<Self, Box<dyn Error>> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn check(resp: reqwest::Response, method: &str) -> Result<(), Box<dyn Error>> {
        let status = resp.status();
        let body: Option<ApiResponse> = resp.json().await.ok();
        match body {
            Some(api) if status.is_success() && api.ok => Ok(()),
            Some(api) => Err(format!(
                "{method} failed ({status}): {}",
                api.description.unwrap_or_default()
            )
            .into()),
            None => Err(format!("{method} failed ({status})").into()),
        }
    }

    /// Send an HTML message with link previews enabled.
    #[instrument(level = "info", skip_all, fields(chat_id = %self.chat_id))]
    pub async fn send_message(&self, html: &str) -> Result<(), Box<dyn Error>> {
        let resp = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": self.chat_id,
                "text": html,
                "parse_mode": "HTML",
                "disable_web_page_preview": false,
            }))
            .send()
            .await?;
        Self::check(resp, "sendMessage").await?;
        info!(chars = html.chars().count(), "Message sent");
        Ok(())
    }

    /// Upload a file as a document with a caption.
    #[instrument(level = "info", skip_all, fields(chat_id = %self.chat_id, path = %path.display()))]
    pub async fn send_document(&self, path: &Path, caption: &str) -> Result<(), Box<dyn Error>> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.pdf")
            .to_string();
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;
        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .part("document", part);

        let resp = self
            .http
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        Self::check(resp, "sendDocument").await?;
        info!("Document sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn long_body() -> String {
        "palabra ".repeat(45)
    }

    #[test]
    fn test_quality_ok_accepts_good_message() {
        assert!(quality_ok("Ahorro semanal", &long_body(), BANNED_TERMS));
    }

    #[test]
    fn test_quality_ok_rejections() {
        assert!(!quality_ok("Corto", &long_body(), BANNED_TERMS));
        assert!(!quality_ok("Ahorro semanal", "texto breve", BANNED_TERMS));
        // long enough but too few spaces
        assert!(!quality_ok("Ahorro semanal", &"x".repeat(300), BANNED_TERMS));
        let banned = format!("{} Claridad total", long_body());
        assert!(!quality_ok("Ahorro semanal", &banned, BANNED_TERMS));
        assert!(quality_ok("Ahorro semanal", &banned, &[]));
    }

    #[test]
    fn test_build_message() {
        assert_eq!(build_message(" A & B ", "<i>cuerpo</i>\n", None), "<b>A &amp; B</b>\n\n<i>cuerpo</i>");
        assert_eq!(
            build_message("T", "c", Some("https://x.example/?a=1&b=2")),
            "<b>T</b>\n\nc\n\n<a href='https://x.example/?a=1&amp;b=2'>Acceder</a>"
        );
        assert_eq!(build_message("T", "c", Some("  ")), "<b>T</b>\n\nc");
    }

    #[test]
    fn test_build_message_uses_bot_api_entities() {
        assert_eq!(build_message("Don't spend", "cuerpo", None), "<b>Don&#39;t spend</b>\n\ncuerpo");
        assert_eq!(
            build_message("\"Regla\" 1-1-1", "c", Some("https://x.example/?q='a'")),
            "<b>&quot;Regla&quot; 1-1-1</b>\n\nc\n\n<a href='https://x.example/?q=&#39;a&#39;'>Acceder</a>"
        );
        assert!(!escape_telegram("l'été <b>").contains("&apos;"));
    }

    #[tokio::test]
    async fn test_send_message_posts_html() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendMessage")
            .match_body(Matcher::PartialJson(json!({
                "chat_id": "@canal",
                "text": "<b>Hola</b>",
                "parse_mode": "HTML",
            })))
            .with_status(200)
            .with_body(r#"{"ok": true, "result": {}}"#)
            .create_async()
            .await;

        let client = TelegramClient::new(&server.url(), "123:abc", "@canal").unwrap();
        client.send_message("<b>Hola</b>").await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_message_reports_api_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/bot123:abc/sendMessage")
            .with_status(400)
            .with_body(r#"{"ok": false, "description": "Bad Request: chat not found"}"#)
            .create_async()
            .await;

        let client = TelegramClient::new(&server.url(), "123:abc", "@nadie").unwrap();
        let err = client.send_message("hola").await.unwrap_err();
        assert!(err.to_string().contains("chat not found"));
    }

    #[tokio::test]
    async fn test_send_document_uploads_multipart() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("guia.pdf");
        std::fs::write(&pdf, b"%PDF-1.3 test").unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot123:abc/sendDocument")
            .match_header("content-type", Matcher::Regex("multipart/form-data".into()))
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("name=\"caption\"".into()),
                Matcher::Regex("filename=\"guia.pdf\"".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"ok": true}"#)
            .create_async()
            .await;

        let client = TelegramClient::new(&server.url(), "123:abc", "@canal").unwrap();
        client.send_document(&pdf, "Recurso").await.unwrap();
        mock.assert_async().await;
    }
}
