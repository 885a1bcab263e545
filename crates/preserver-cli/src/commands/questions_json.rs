//! The `preserver questions-json` command.

use std::path::PathBuf;

use anyhow::Result;

use preserver_report::questions_json::write_questions_json;

use super::Globals;

pub fn execute(globals: &Globals, output: PathBuf) -> Result<()> {
    let (_, app) = globals.open()?;
    let questions = app.questions();

    write_questions_json(questions, &output)?;

    println!("Generated {}", output.display());
    println!("  Categories: {}", questions.categories().len());
    println!("  Questions: {}", questions.total_question_count());

    Ok(())
}
