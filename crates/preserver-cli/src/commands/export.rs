//! The `preserver export` command.

use std::path::PathBuf;

use anyhow::Result;

use preserver_core::ExportFormat;
use preserver_report::markdown::{export_markdown, write_markdown_report};

use super::{username, Globals};

pub fn execute(
    globals: &Globals,
    user: String,
    format: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let (_, app) = globals.open()?;
    let user = username(&user)?;

    let path = if matches!(format.to_lowercase().as_str(), "markdown" | "md") {
        match output {
            Some(path) => {
                let answers = app.answers().load_all(user);
                if answers.is_empty() {
                    None
                } else {
                    write_markdown_report(user, &answers, &path)?;
                    Some(path)
                }
            }
            None => export_markdown(app.answers(), user, app.exports_dir())?,
        }
    } else {
        let format: ExportFormat = format.parse().map_err(anyhow::Error::msg)?;
        match output {
            Some(path) => app
                .transfer()
                .export_to(user, format, &path)?
                .then_some(path),
            None => app.export(user, format)?,
        }
    };

    match path {
        Some(path) => {
            println!("Exported to: {}", path.display());
            Ok(())
        }
        None => anyhow::bail!("no answers found for {user}"),
    }
}
