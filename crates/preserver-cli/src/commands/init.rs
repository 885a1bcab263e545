//! The `preserver init` command.

use std::path::Path;

use anyhow::Result;

use preserver_core::config::CONFIG_FILE_NAME;

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE_NAME).exists() {
        println!("{CONFIG_FILE_NAME} already exists, skipping.");
    } else {
        std::fs::write(CONFIG_FILE_NAME, SAMPLE_CONFIG)?;
        println!("Created {CONFIG_FILE_NAME}");
    }

    let mut created = 0;
    for (category, id, text) in SAMPLE_QUESTIONS {
        let dir = Path::new("questions").join(category);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{id}.txt"));
        if !path.exists() {
            std::fs::write(&path, format!("{text}\n"))?;
            created += 1;
        }
    }
    if created == 0 {
        println!("questions/ already populated, skipping.");
    } else {
        println!("Created {created} sample questions under questions/");
    }

    println!("\nNext steps:");
    println!("  1. Add your own questions as questions/<category>/q<N>.txt");
    println!("  2. Run: preserver validate");
    println!("  3. Run: preserver next --user <name>");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# preserver configuration

questions_dir = "questions"
answers_dir = "answers"
exports_dir = "exports"

# Serve questions in random order; `preserver next --sequential` overrides.
randomize = true
"#;

const SAMPLE_QUESTIONS: &[(&str, &str, &str)] = &[
    ("personal_info", "q1", "Where did you grow up, and what was it like?"),
    ("personal_info", "q2", "What does a typical day look like for you?"),
    ("values", "q1", "Which principle would you never compromise on?"),
    ("goals", "q1", "What do you want to have achieved five years from now?"),
];
