//! The `preserver validate` command.

use anyhow::Result;

use preserver_core::questions::validate_questions;

use super::Globals;

/// Warnings beyond this many are summarized.
const MAX_SHOWN: usize = 20;

pub fn execute(globals: &Globals) -> Result<()> {
    let (config, app) = globals.open()?;
    if !config.questions_dir.is_dir() {
        anyhow::bail!(
            "questions directory not found: {}",
            config.questions_dir.display()
        );
    }

    let questions = app.questions();
    println!("Checked {} questions", questions.total_question_count());

    let warnings = validate_questions(questions);
    if warnings.is_empty() {
        println!("All questions are valid.");
        return Ok(());
    }

    println!("\n{} warning(s) found:", warnings.len());
    for w in warnings.iter().take(MAX_SHOWN) {
        println!("  [{}/{}] WARNING: {}", w.category, w.question_id, w.message);
    }
    if warnings.len() > MAX_SHOWN {
        println!("  ... and {} more", warnings.len() - MAX_SHOWN);
    }

    Ok(())
}
