pub mod aggregate;
pub mod answer;
pub mod categories;
pub mod export;
pub mod import;
pub mod init;
pub mod next;
pub mod questions_json;
pub mod skip;
pub mod stats;
pub mod validate;

use std::path::PathBuf;

use anyhow::{Context, Result};

use preserver_core::model::{display_name, slug_from_display};
use preserver_core::{load_config_from, Preserver, PreserverConfig, Question, QuestionStore};

/// Options shared by every subcommand.
pub struct Globals {
    pub config: Option<PathBuf>,
    pub questions_dir: Option<PathBuf>,
    pub answers_dir: Option<PathBuf>,
    pub exports_dir: Option<PathBuf>,
}

impl Globals {
    /// Config file and environment, then command-line overrides.
    pub fn load_config(&self) -> Result<PreserverConfig> {
        let mut config = load_config_from(self.config.as_deref())?;
        if let Some(dir) = &self.questions_dir {
            config.questions_dir = dir.clone();
        }
        if let Some(dir) = &self.answers_dir {
            config.answers_dir = dir.clone();
        }
        if let Some(dir) = &self.exports_dir {
            config.exports_dir = dir.clone();
        }
        Ok(config)
    }

    pub fn open(&self) -> Result<(PreserverConfig, Preserver)> {
        let config = self.load_config()?;
        tracing::debug!(
            "questions: {}, answers: {}, exports: {}",
            config.questions_dir.display(),
            config.answers_dir.display(),
            config.exports_dir.display()
        );
        let app = Preserver::from_config(&config).with_context(|| {
            format!(
                "failed to load question bank from {}",
                config.questions_dir.display()
            )
        })?;
        Ok((config, app))
    }
}

/// Trimmed, non-empty username.
pub fn username(raw: &str) -> Result<&str> {
    let name = raw.trim();
    if name.is_empty() {
        anyhow::bail!("username must not be empty");
    }
    Ok(name)
}

/// Category slug for `raw`, accepting either the slug or its display name
/// (`personal_info` or `Personal Info`).
pub fn resolve_category(questions: &QuestionStore, raw: &str) -> Result<String> {
    if questions.has_category(raw) {
        return Ok(raw.to_string());
    }
    let slug = slug_from_display(raw);
    if questions.has_category(&slug) {
        return Ok(slug);
    }
    anyhow::bail!("unknown category: {raw}")
}

pub fn print_question(question: &Question) {
    println!(
        "Category: {} ({}/{})",
        display_name(&question.category),
        question.category,
        question.id
    );
    println!("{}", question.text);
}
