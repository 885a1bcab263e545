//! The `preserver categories` command.

use anyhow::Result;

use preserver_core::model::display_name;

use super::Globals;

pub fn execute(globals: &Globals) -> Result<()> {
    let (_, app) = globals.open()?;
    let categories = app.questions().categories();

    println!("Question Categories ({} total):\n", categories.len());
    for category in categories {
        println!(
            "  {}: {} questions",
            display_name(category),
            app.questions().questions_in(category).len()
        );
    }

    Ok(())
}
