//! The `preserver aggregate` command.

use std::path::PathBuf;

use anyhow::Result;

use preserver_core::transfer::{save_aggregate, unique_path};

use super::Globals;

pub fn execute(globals: &Globals, output: Option<PathBuf>) -> Result<()> {
    let (_, app) = globals.open()?;

    let Some(doc) = app.transfer().aggregate() else {
        anyhow::bail!("no answers found");
    };

    let path = match output {
        Some(path) => path,
        None => {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            unique_path(
                app.exports_dir(),
                &format!("aggregated_all_users_{timestamp}.json"),
            )
        }
    };
    save_aggregate(&doc, &path)?;

    println!(
        "Aggregated {} answers from {} users",
        doc.total_answers, doc.total_users
    );
    println!("Saved to: {}", path.display());

    Ok(())
}
