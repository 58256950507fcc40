//! Report builders: turn queue jobs and data files into [`Report`]s.

use crate::models::{ActionSystem, ActionsFile, PdfJob};
use crate::outputs::pdf::{Block, Report};
use chrono::{DateTime, Datelike, Local};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument, warn};

pub const DEFAULT_CAPTION: &str = "Recurso MkPato";
pub const EMPTY_ACTIONS: &str = "No hay acciones definidas.";

/// Build the downloadable resource described by a PDF queue job.
pub fn pdf_job_report(job: &PdfJob) -> Report {
    let mut blocks = vec![Block::Spacer(4.0)];
    for section in &job.sections {
        if let Some(title) = section.title.as_deref().filter(|t| !t.trim().is_empty()) {
            blocks.push(Block::Heading(title.to_string()));
        }
        if let Some(text) = section.text.as_deref().filter(|t| !t.trim().is_empty()) {
            blocks.push(Block::Paragraph(text.to_string()));
        }
        if !section.bullets.is_empty() {
            blocks.push(Block::Bullets(section.bullets.clone()));
        }
        blocks.push(Block::Spacer(4.0));
    }
    if !job.meta.footer.trim().is_empty() {
        blocks.push(Block::Footer(job.meta.footer.clone()));
    }
    Report {
        title: job.meta.title.clone(),
        subtitle: job.meta.subtitle.clone(),
        blocks,
    }
}

/// Caption sent with the document; defaults to [`DEFAULT_CAPTION`].
pub fn pdf_job_caption(job: &PdfJob) -> &str {
    job.meta
        .caption
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CAPTION)
}

fn push_labeled(blocks: &mut Vec<Block>, label: &str, value: &str) {
    if !value.trim().is_empty() {
        blocks.push(Block::Paragraph(format!("{label}: {}", value.trim())));
    }
}

fn action_blocks(index: usize, system: &ActionSystem, blocks: &mut Vec<Block>) {
    let title = system
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Acción #{index}"));
    blocks.push(Block::Heading(title));
    if !system.subtitle.trim().is_empty() {
        blocks.push(Block::Note(system.subtitle.trim().to_string()));
    }
    push_labeled(blocks, "Objetivo", &system.objective);
    if !system.steps.is_empty() {
        blocks.push(Block::Bullets(system.steps.clone()));
    }
    if !system.rule.trim().is_empty() {
        blocks.push(Block::Note(format!("Regla: {}", system.rule.trim())));
    }
    push_labeled(blocks, "Prompt sugerido", &system.prompt);
    push_labeled(blocks, "Métrica", &system.metric);
    if !system.cta.trim().is_empty() {
        blocks.push(Block::Paragraph(format!("-> {}", system.cta.trim())));
    }
    blocks.push(Block::Spacer(5.0));
}

/// Build the actions report; an empty list renders a single notice.
pub fn actions_report(actions: &ActionsFile, now: DateTime<Local>) -> Report {
    let mut blocks = Vec::new();
    if actions.systems.is_empty() {
        blocks.push(Block::Paragraph(EMPTY_ACTIONS.to_string()));
    } else {
        for (i, system) in actions.systems.iter().enumerate() {
            action_blocks(i + 1, system, &mut blocks);
        }
    }
    blocks.push(Block::Footer(format!(
        "Generado automáticamente el {}",
        now.format("%d/%m/%Y %H:%M")
    )));
    Report {
        title: "Informe de Acciones MkPato".to_string(),
        subtitle: format!("{} acciones", actions.systems.len()),
        blocks,
    }
}

/// Read `actions.yml`, creating it with an empty list when missing.
///
/// A file that does not parse is logged and treated as empty.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_actions(path: &Path) -> Result<ActionsFile, Box<dyn Error>> {
    if !path.exists() {
        warn!("Actions file not found; creating an empty one");
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, "systems: []\n").await?;
    }
    let raw = tokio::fs::read_to_string(path).await?;
    let actions = match serde_yaml::from_str::<Option<ActionsFile>>(&raw) {
        Ok(parsed) => parsed.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Could not parse actions file; rendering an empty report");
            ActionsFile::default()
        }
    };
    info!(systems = actions.systems.len(), "Loaded actions");
    Ok(actions)
}

/// Status report stamped with the generation time.
pub fn system_report(now: DateTime<Local>) -> Report {
    Report {
        title: "Informe del Sistema: Finanzas MkPato".to_string(),
        subtitle: now.format("%d/%m/%Y %H:%M").to_string(),
        blocks: vec![
            Block::Heading("Resumen".to_string()),
            Block::Paragraph(format!(
                "Este informe fue generado automáticamente el {}.",
                now.format("%d/%m/%Y %H:%M")
            )),
            Block::Note("Estado del sistema: Operativo".to_string()),
            Block::Note("Automatizaciones activas: 3".to_string()),
            Block::Note("Ingresos estimados: 1.000 EUR/mes".to_string()),
            Block::Heading("Próximos pasos".to_string()),
            Block::Bullets(vec![
                "Optimizar embudos de tráfico orgánico.".to_string(),
                "Ampliar presencia en Hotmart y Amazon KDP.".to_string(),
                "Configurar campaña de crecimiento en Instagram.".to_string(),
            ]),
            Block::Footer(format!(
                "Finanzas MkPato: Sistema autónomo de ingresos (c) {}",
                now.year()
            )),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PdfMeta, PdfSection};
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 4, 9, 5, 0).unwrap()
    }

    fn job(caption: Option<&str>, footer: &str) -> PdfJob {
        PdfJob {
            status: None,
            meta: PdfMeta {
                title: "Guía".into(),
                subtitle: "Sub".into(),
                slug: "guia".into(),
                caption: caption.map(str::to_string),
                footer: footer.into(),
            },
            sections: vec![
                PdfSection { title: Some("Uno".into()), text: Some("Hola".into()), bullets: vec![] },
                PdfSection { title: None, text: None, bullets: vec!["a".into(), "b".into()] },
            ],
        }
    }

    #[test]
    fn test_pdf_job_report_blocks() {
        let report = pdf_job_report(&job(None, "pie"));
        assert_eq!(report.title, "Guía");
        assert_eq!(
            report.blocks,
            vec![
                Block::Spacer(4.0),
                Block::Heading("Uno".into()),
                Block::Paragraph("Hola".into()),
                Block::Spacer(4.0),
                Block::Bullets(vec!["a".into(), "b".into()]),
                Block::Spacer(4.0),
                Block::Footer("pie".into()),
            ]
        );
    }

    #[test]
    fn test_pdf_job_caption_default() {
        assert_eq!(pdf_job_caption(&job(None, "")), DEFAULT_CAPTION);
        assert_eq!(pdf_job_caption(&job(Some(" "), "")), DEFAULT_CAPTION);
        assert_eq!(pdf_job_caption(&job(Some("Tu guía"), "")), "Tu guía");
    }

    #[test]
    fn test_actions_report_empty() {
        let report = actions_report(&ActionsFile::default(), fixed_now());
        assert_eq!(report.blocks[0], Block::Paragraph(EMPTY_ACTIONS.into()));
        assert_eq!(report.blocks[1], Block::Footer("Generado automáticamente el 04/03/2026 09:05".into()));
    }

    #[test]
    fn test_actions_report_default_titles() {
        let actions = ActionsFile {
            systems: vec![
                ActionSystem { objective: "Ahorrar".into(), ..Default::default() },
                ActionSystem {
                    title: Some("Plan 30 días".into()),
                    steps: vec!["Paso 1".into()],
                    rule: "No gastar".into(),
                    cta: "Empieza hoy".into(),
                    ..Default::default()
                },
            ],
        };
        let report = actions_report(&actions, fixed_now());
        assert!(report.blocks.contains(&Block::Heading("Acción #1".into())));
        assert!(report.blocks.contains(&Block::Paragraph("Objetivo: Ahorrar".into())));
        assert!(report.blocks.contains(&Block::Heading("Plan 30 días".into())));
        assert!(report.blocks.contains(&Block::Note("Regla: No gastar".into())));
        assert!(report.blocks.contains(&Block::Paragraph("-> Empieza hoy".into())));
    }

    #[tokio::test]
    async fn test_load_actions_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data/actions.yml");
        let actions = load_actions(&path).await.unwrap();
        assert!(actions.systems.is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "systems: []\n");
    }

    #[tokio::test]
    async fn test_load_actions_invalid_yaml_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actions.yml");
        std::fs::write(&path, "systems: [unclosed").unwrap();
        assert!(load_actions(&path).await.unwrap().systems.is_empty());
    }

    #[test]
    fn test_system_report_is_stamped() {
        let report = system_report(fixed_now());
        assert!(report.blocks.contains(&Block::Paragraph(
            "Este informe fue generado automáticamente el 04/03/2026 09:05.".into()
        )));
        assert!(matches!(report.blocks.last(), Some(Block::Footer(f)) if f.ends_with("2026")));
    }
}
