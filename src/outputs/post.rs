//! Blog post rendering.
//!
//! A post is a standalone HTML page written to `blog/<slug>.html`. The
//! page embeds the date in `<p class='date'>` and the title in `<h1>`;
//! the index refresh reads both back.

use crate::utils::{escape_html, take_chars};
use url::Url;

/// Values substituted into the post template.
#[derive(Debug, Clone)]
pub struct PostContext<'a> {
    pub title: &'a str,
    pub summary: &'a str,
    pub body: &'a str,
    /// Optional source link shown under the call-to-action.
    pub url: &'a str,
    pub tags: &'a str,
    pub product_url: &'a str,
    pub date: &'a str,
}

const STYLE: &str = r#"
    :root { --bg:#0b1221; --text:#e6edf7; --muted:#8b98b9; --brand:#10b981; --brand-2:#34d399; --card:#111b2c; }
    body { background:var(--bg); color:var(--text); font-family:Inter,system-ui,sans-serif; margin:0; line-height:1.7; }
    article { max-width:760px; margin:0 auto; padding:60px 24px; }
    h1 { text-align:center; font-size:36px; font-weight:800; margin:20px 0; }
    p.date { text-align:center; color:var(--muted); font-size:14px; margin-top:10px; }
    img.logo { display:block; margin:40px auto 10px; width:80px; height:auto; opacity:.95; }
    .highlight { background:var(--card); padding:18px 20px; border-left:4px solid var(--brand); border-radius:16px; margin:30px 0; font-size:15px; }
    .learn-box { background:var(--card); border-radius:16px; padding:20px; margin-top:40px; }
    .learn-box h3 { margin-top:0; color:var(--brand); font-weight:700; }
    a.cta { display:block; width:fit-content; margin:40px auto; background:linear-gradient(135deg,var(--brand),var(--brand-2));
            color:#07131a; padding:16px 28px; border-radius:16px; font-weight:700; text-decoration:none; }
    hr { border:none; border-top:1px solid #1f2937; margin:40px 0; }
    footer { text-align:center; margin:60px 0; color:var(--muted); font-size:14px; }
    footer a, a.source { color:var(--brand); text-decoration:none; }
"#;

/// Append the affiliate tag to the product URL as an `aff` query parameter.
///
/// An empty tag or an unparsable URL leaves the URL unchanged.
pub fn product_link(product_url: &str, affiliate_tag: &str) -> String {
    let tag = affiliate_tag.trim();
    if tag.is_empty() {
        return product_url.to_string();
    }
    match Url::parse(product_url) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair("aff", tag);
            url.to_string()
        }
        Err(_) => product_url.to_string(),
    }
}

/// Meta description: first 150 characters of the summary (or body), quotes removed.
pub fn meta_description(summary: &str, body: &str) -> String {
    let source = if summary.is_empty() { body } else { summary };
    take_chars(source, 150).replace(['"', '\''], "")
}

/// Paragraph breaks become `<br><br>`; the text itself is escaped.
fn body_html(body: &str) -> String {
    escape_html(body).replace('\n', "<br><br>")
}

/// Render a complete post page.
pub fn render_post(ctx: &PostContext<'_>) -> String {
    let title = escape_html(ctx.title);
    let desc = escape_html(&meta_description(ctx.summary, ctx.body)).into_owned();
    let summary = escape_html(ctx.summary);
    let tags = escape_html(ctx.tags);
    let product = escape_html(ctx.product_url);
    let date = escape_html(ctx.date);
    let body = body_html(ctx.body);
    let link = if ctx.url.is_empty() {
        String::new()
    } else {
        let url = escape_html(ctx.url);
        format!("<p><a class='source' href='{url}' target='_blank' rel='noopener'>{url}</a></p>")
    };

    format!(
        r#"<!doctype html>
<html lang='es'>
<head>
  <meta charset='utf-8'>
  <meta name='viewport' content='width=device-width,initial-scale=1'>
  <title>{title} · MkPato</title>
  <meta name='description' content='{desc}'>
  <link href='https://fonts.googleapis.com/css2?family=Inter:wght@400;600;800&display=swap' rel='stylesheet'>
  <style>{STYLE}  </style>
</head>
<body>
  <img src='/assets/DckFinalSinfondo.png' alt='MkPato logo' class='logo'>
  <article>
    <p class='date'>{date}</p>
    <h1>{title}</h1>
    <div class='highlight'><strong>Mini-resumen:</strong> {summary}</div>
    <p>{body}</p>
    <div class='learn-box'>
      <h3>3 aprendizajes clave</h3>
      <ul>
        <li>Aplica el sistema, no la teoría.</li>
        <li>Registra resultados en 2 minutos al día.</li>
        <li>Itera: mejora un 1 % cada semana.</li>
      </ul>
    </div>
    <a class='cta' href='{product}' target='_blank' rel='noopener'>Acceder al Pack PRO</a>
    {link}
    <hr>
    <p class='muted'>Etiquetas: {tags}</p>
  </article>
  <footer><p><a href='/blog/'>← Volver al archivo</a></p></footer>
</body>
</html>
"#
    )
}
