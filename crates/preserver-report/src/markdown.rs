//! Markdown export.
//!
//! Answers are grouped by category (sorted by slug) and rendered in the order
//! the repository returns them within each category.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use preserver_core::model::display_name;
use preserver_core::transfer::{export_file_name, unique_path};
use preserver_core::{Answer, AnswerRepository};

/// Label used in export file names.
pub const MARKDOWN_LABEL: &str = "markdown";

/// Render a user's answers as a Markdown document.
pub fn generate_markdown(username: &str, answers: &[Answer]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Digital Twin Data: {username}\n\n"));
    md.push_str(&format!(
        "*Exported: {}*\n\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    md.push_str(&format!("**Total Answers:** {}\n\n", answers.len()));
    md.push_str("---\n\n");

    let mut by_category: BTreeMap<&str, Vec<&Answer>> = BTreeMap::new();
    for answer in answers {
        by_category.entry(&answer.category).or_default().push(answer);
    }

    for (category, group) in by_category {
        md.push_str(&format!("## {}\n\n", display_name(category)));
        for answer in group {
            md.push_str(&format!("### Q: {}\n\n", answer.question));
            md.push_str(&format!("**A:** {}\n\n", answer.answer));
            if !answer.timestamp.is_empty() {
                md.push_str(&format!("*Answered: {}*\n\n", answer.timestamp));
            }
            md.push_str("---\n\n");
        }
    }

    md
}

/// Write the Markdown export to `path`, creating parent directories.
pub fn write_markdown_report(username: &str, answers: &[Answer], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, generate_markdown(username, answers))
        .with_context(|| format!("failed to write markdown export: {}", path.display()))?;
    tracing::info!("exported {} answers to {}", answers.len(), path.display());
    Ok(())
}

/// Export `username`'s answers as `<username>_markdown_<timestamp>.md` under
/// `exports_dir`.
///
/// Returns `Ok(None)` when the user has no answers.
pub fn export_markdown(
    repo: &AnswerRepository,
    username: &str,
    exports_dir: &Path,
) -> Result<Option<PathBuf>> {
    let answers = repo.load_all(username);
    if answers.is_empty() {
        return Ok(None);
    }

    fs::create_dir_all(exports_dir).with_context(|| {
        format!("failed to create exports directory: {}", exports_dir.display())
    })?;
    let path = unique_path(
        exports_dir,
        &export_file_name(username, MARKDOWN_LABEL, "md"),
    );
    write_markdown_report(username, &answers, &path)?;
    Ok(Some(path))
}
