//! Article body generation.
//!
//! The body comes from the inference API when a token is configured. The
//! primary model is tried first, then the backup model; an answer shorter
//! than `min_chars` counts as a failure. When everything fails the offline
//! writer in [`fallback_article`] produces a fixed ~500-word text.

use crate::api::ask_with_backoff;
use crate::config::GenerationConfig;
use crate::utils::upcase;
use once_cell::sync::Lazy;
use rand::seq::IndexedRandom;
use regex::Regex;
use tracing::{info, instrument, warn};

static EXTRA_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

const DEFAULT_TOPICS: &str = "finanzas, productividad, claridad, hábitos";

/// Editorial styles rotated between runs.
pub const STYLES: [&str; 5] = [
    "una guía práctica paso a paso",
    "un artículo de reflexión profunda",
    "una historia inspiradora con moraleja financiera",
    "una mini-lección de productividad real",
    "un análisis con ejemplos reales y consejos aplicables",
];

/// Where the article body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodySource {
    Model,
    BackupModel,
    Offline,
}

#[derive(Debug, Clone)]
pub struct GeneratedArticle {
    pub body: String,
    pub source: BodySource,
}

/// Pick a random editorial style.
pub fn random_style() -> &'static str {
    STYLES.choose(&mut rand::rng()).copied().unwrap_or(STYLES[0])
}

/// Build the writer prompt for one article.
pub fn build_prompt(title: &str, summary: &str, tags: &str, style: &str) -> String {
    let idea = if summary.is_empty() { title } else { summary };
    let topics = if tags.is_empty() { DEFAULT_TOPICS } else { tags };
    format!(
        "Eres un redactor experto en finanzas personales, productividad y hábitos.\n\n\
         Redacta un artículo en español de unas 1000 palabras titulado \"{title}\", con el formato de {style}.\n\
         Debe estar basado en esta idea: \"{idea}\".\n\n\
         El texto debe tener una estructura profesional con:\n\
         1. Un subtítulo atractivo (H2) bajo el título principal.\n\
         2. Una introducción con gancho y contexto real.\n\
         3. Secciones claras con subtítulos H3.\n\
         4. Listas con viñetas o pasos concretos.\n\
         5. Un ejemplo real o mini-historia.\n\
         6. Una conclusión potente con una invitación implícita a poner orden en las finanzas.\n\n\
         Tono: claro, cercano, profesional, con autoridad amable.\n\
         Evita relleno y frases vacías. Que aporte valor real y acción inmediata.\n\n\
         Incluye y menciona conceptos de {topics}.\n"
    )
}

/// Collapse runs of three or more newlines into a single blank line and trim.
pub fn cleanup(text: &str) -> String {
    EXTRA_BLANK_LINES.replace_all(text, "\n\n").trim().to_string()
}

/// Offline article used when generation is unavailable.
pub fn fallback_article(title: &str, summary: &str, tags: &str) -> String {
    let idea = if summary.is_empty() { title } else { summary };
    let topic = if tags.is_empty() { "productividad" } else { tags };
    let paragraphs = [
        format!(
            "{}. Esta idea resume un principio simple: la claridad dirige la acción.",
            upcase(idea.trim_end_matches('.'))
        ),
        format!(
            "En {topic}, muchas personas saltan de tarea en tarea sin prioridad. {title} reduce el ruido y enfoca energía."
        ),
        "Cómo aplicarlo hoy: define 1 objetivo, 1 tarea clave y 1 freno que vas a eliminar. Escríbelo y blíndalo en tu agenda.".to_string(),
        "Errores comunes: confundir movimiento con progreso, acumular herramientas sin hábitos y no medir resultados.".to_string(),
        "Mini-historia: un lector bloqueó 20 minutos al día para su 1 tarea clave. En 3 semanas terminó un proyecto aparcado 6 meses.".to_string(),
        "Cierre: convierte esto en un estándar. Evalúa al final del día si cumpliste tu 1-1-1. Ajusta, itera y vuelve a empezar mañana.".to_string(),
    ];
    paragraphs.join("\n\n")
}

/// Generate the body of a blog post.
///
/// Never fails: every error path ends in [`fallback_article`].
#[instrument(level = "info", skip_all, fields(%title))]
pub async fn generate_article(
    config: &GenerationConfig,
    token: Option<&str>,
    title: &str,
    summary: &str,
    tags: &str,
) -> GeneratedArticle {
    let Some(token) = token.filter(|t| !t.trim().is_empty()) else {
        info!("No inference token configured; using offline writer");
        return offline(title, summary, tags);
    };

    let style = random_style();
    let prompt = build_prompt(title, summary, tags, style);
    info!(%style, "Requesting article body");

    let candidates = [
        (config.model.as_str(), BodySource::Model),
        (config.backup_model.as_str(), BodySource::BackupModel),
    ];
    for (model, source) in candidates {
        if model.is_empty() {
            continue;
        }
        match ask_with_backoff(config, model, token, &prompt).await {
            Ok(text) => {
                let body = cleanup(&text);
                let chars = body.chars().count();
                if chars >= config.min_chars {
                    info!(%model, chars, "Generated article body");
                    return GeneratedArticle { body, source };
                }
                warn!(%model, chars, min = config.min_chars, "Generated text too short");
            }
            Err(e) => warn!(%model, error = %e, "Generation failed"),
        }
    }

    warn!("All models failed; using offline writer");
    offline(title, summary, tags)
}

fn offline(title: &str, summary: &str, tags: &str) -> GeneratedArticle {
    GeneratedArticle {
        body: fallback_article(title, summary, tags),
        source: BodySource::Offline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_collapses_blank_lines() {
        assert_eq!(cleanup("  uno\n\n\n\ndos\n\ntres\n\n\n"), "uno\n\ndos\n\ntres");
    }

    #[test]
    fn test_build_prompt_defaults() {
        let prompt = build_prompt("Regla 1-1-1", "", "", STYLES[0]);
        assert!(prompt.contains("titulado \"Regla 1-1-1\""));
        assert!(prompt.contains("basado en esta idea: \"Regla 1-1-1\""));
        assert!(prompt.contains(DEFAULT_TOPICS));
        assert!(prompt.contains(STYLES[0]));
    }

    #[test]
    fn test_build_prompt_uses_summary_and_tags() {
        let prompt = build_prompt("T", "Gastar menos", "ahorro, deuda", STYLES[2]);
        assert!(prompt.contains("\"Gastar menos\""));
        assert!(prompt.contains("ahorro, deuda"));
    }

    #[test]
    fn test_random_style_is_known() {
        assert!(STYLES.contains(&random_style()));
    }

    #[test]
    fn test_fallback_article_shape() {
        let text = fallback_article("Regla 1-1-1", "menos ruido, más foco.", "");
        let paragraphs: Vec<&str> = text.split("\n\n").collect();
        assert_eq!(paragraphs.len(), 6);
        assert!(paragraphs[0].starts_with("Menos ruido, más foco. Esta idea"));
        assert!(paragraphs[1].starts_with("En productividad,"));
        assert!(paragraphs[1].contains("Regla 1-1-1 reduce el ruido"));
    }

    #[tokio::test]
    async fn test_generate_without_token_is_offline() {
        let config = GenerationConfig::default();
        let out = generate_article(&config, None, "Título", "", "").await;
        assert_eq!(out.source, BodySource::Offline);
        assert_eq!(out.body, fallback_article("Título", "", ""));
    }

    fn mock_config(endpoint: &str) -> GenerationConfig {
        GenerationConfig {
            endpoint: endpoint.to_string(),
            model: "primary".to_string(),
            backup_model: "backup".to_string(),
            min_chars: 20,
            max_retries: 0,
            timeout_secs: 5,
            ..GenerationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_generate_falls_back_to_backup_model() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/primary")
            .with_status(500)
            .create_async()
            .await;
        server
            .mock("POST", "/models/backup")
            .with_status(200)
            .with_body(r#"[{"generated_text": "Un texto suficientemente largo.\n\n\n\nFin."}]"#)
            .create_async()
            .await;

        let out = generate_article(&mock_config(&server.url()), Some("tok"), "T", "", "").await;
        assert_eq!(out.source, BodySource::BackupModel);
        assert_eq!(out.body, "Un texto suficientemente largo.\n\nFin.");
    }

    #[tokio::test]
    async fn test_generate_short_text_goes_offline() {
        let mut server = mockito::Server::new_async().await;
        for path in ["/models/primary", "/models/backup"] {
            server
                .mock("POST", path)
                .with_status(200)
                .with_body(r#"[{"generated_text": "corto"}]"#)
                .create_async()
                .await;
        }

        let out = generate_article(&mock_config(&server.url()), Some("tok"), "T", "s", "").await;
        assert_eq!(out.source, BodySource::Offline);
    }
}
