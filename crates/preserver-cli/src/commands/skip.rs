//! The `preserver skip` command.

use anyhow::{Context, Result};

use preserver_core::SkipOutcome;

use super::{print_question, resolve_category, username, Globals};

pub fn execute(
    globals: &Globals,
    user: String,
    current: String,
    category: Option<String>,
    sequential: bool,
) -> Result<()> {
    let (config, app) = globals.open()?;
    let user = username(&user)?;
    let (current_category, current_id) = current
        .split_once('/')
        .context("--current must look like <category>/<id>")?;
    let category = category
        .map(|c| resolve_category(app.questions(), &c))
        .transpose()?;

    let randomize = config.randomize && !sequential;
    match app.skip(
        user,
        category.as_deref(),
        Some((current_category, current_id)),
        randomize,
    ) {
        SkipOutcome::Next(question) => print_question(question),
        SkipOutcome::KeepCurrent(question) => {
            println!("No other unanswered questions; staying on this one.");
            print_question(question);
        }
        SkipOutcome::Exhausted => println!("No unanswered questions found!"),
    }

    Ok(())
}
