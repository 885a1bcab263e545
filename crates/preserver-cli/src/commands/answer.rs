//! The `preserver answer` command.

use std::io::Read;

use anyhow::{Context, Result};

use preserver_core::AnswerKey;

use super::{resolve_category, username, Globals};

pub fn execute(
    globals: &Globals,
    user: String,
    category: String,
    question_id: String,
    text: Option<String>,
) -> Result<()> {
    let (_, app) = globals.open()?;
    let user = username(&user)?;

    let category = resolve_category(app.questions(), &category)?;
    let question = app
        .questions()
        .get(&category, &question_id)
        .with_context(|| format!("question not found: {category}/{question_id}"))?;

    let text = match text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read answer from stdin")?;
            buf
        }
    };
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("answer must not be empty");
    }

    let key = AnswerKey::new(user, &question.category, &question.id)?;
    if app.answers().exists(user, &question.category, &question.id) {
        anyhow::bail!("{key} is already answered");
    }
    if !app.answer(user, question, text) {
        anyhow::bail!("failed to save answer {key}");
    }

    let progress = app.progress(user, None);
    println!("Saved answer {key}");
    println!(
        "Progress: {}/{} ({:.1}%)",
        progress.answered,
        progress.total,
        progress.percent()
    );

    Ok(())
}
