//! The `preserver next` command.

use anyhow::Result;

use super::{print_question, resolve_category, username, Globals};

pub fn execute(
    globals: &Globals,
    user: String,
    category: Option<String>,
    sequential: bool,
    random: bool,
) -> Result<()> {
    let (config, app) = globals.open()?;
    let user = username(&user)?;
    let category = category
        .map(|c| resolve_category(app.questions(), &c))
        .transpose()?;
    let category = category.as_deref();

    let randomize = random || (config.randomize && !sequential);
    let progress = app.progress(user, category);

    match app.next_question(user, category, randomize) {
        Some(question) => {
            print_question(question);
            println!(
                "\nProgress: {}/{} ({:.1}%)",
                progress.answered,
                progress.total,
                progress.percent()
            );
        }
        None => println!("No unanswered questions found!"),
    }

    Ok(())
}
