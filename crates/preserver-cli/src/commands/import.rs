//! The `preserver import` command.

use std::path::PathBuf;

use anyhow::{Context, Result};

use super::{username, Globals};

pub fn execute(globals: &Globals, user: String, file: PathBuf) -> Result<()> {
    let (_, app) = globals.open()?;
    let user = username(&user)?;
    let json = std::fs::read_to_string(&file)
        .with_context(|| format!("failed to read import file: {}", file.display()))?;

    let outcome = app.import_json(user, &json);
    if !outcome.success {
        anyhow::bail!("import failed: {}", outcome.message);
    }
    println!("{}", outcome.message);

    Ok(())
}
