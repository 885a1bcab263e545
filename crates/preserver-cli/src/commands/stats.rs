//! The `preserver stats` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use super::{username, Globals};

pub fn execute(globals: &Globals, user: Option<String>, verbose: bool) -> Result<()> {
    let (_, app) = globals.open()?;
    let questions = app.questions();
    let categories = questions.categories();

    println!("Questions:");
    println!("  Total categories: {}", categories.len());
    println!("  Total questions: {}", questions.total_question_count());

    if verbose && !categories.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Category", "Questions"]);
        for category in &categories {
            table.add_row(vec![
                Cell::new(category),
                Cell::new(questions.questions_in(category).len()),
            ]);
        }
        println!("{table}");
    }

    if let Some(user) = user {
        let user = username(&user)?;
        let progress = app.progress(user, None);
        println!("\nUser: {user}");
        println!(
            "  Answered: {}/{} ({:.1}%)",
            progress.answered,
            progress.total,
            progress.percent()
        );

        if verbose {
            let mut table = Table::new();
            table.set_header(vec!["Category", "Answered", "Total", "Status"]);
            for (category, p) in app.tracker().category_progress(user) {
                table.add_row(vec![
                    Cell::new(category),
                    Cell::new(p.answered),
                    Cell::new(p.total),
                    Cell::new(if p.is_complete() { "done" } else { "open" }),
                ]);
            }
            println!("{table}");
        }
    }

    let users = app.answers().users();
    if !users.is_empty() {
        println!("\nUsers with answers: {}", users.len());
        if verbose {
            for user in &users {
                println!("  - {user}: {} answers", app.progress(user, None).answered);
            }
        }
    }

    Ok(())
}
