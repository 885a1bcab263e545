//! Question-bank dump for the static viewer.
//!
//! Shape: `{"<category>": {"<question_id>": "<text>"}}`, with categories and
//! questions in the same order the bank serves them.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};

use preserver_core::{Question, QuestionStore};

/// Serializable view over a loaded bank that keeps load order.
#[derive(Debug, Clone, Copy)]
pub struct QuestionBankJson<'a>(pub &'a QuestionStore);

struct CategoryJson<'a>(&'a [Question]);

impl Serialize for QuestionBankJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let categories = self.0.categories();
        let mut map = serializer.serialize_map(Some(categories.len()))?;
        for category in categories {
            map.serialize_entry(category, &CategoryJson(self.0.questions_in(category)))?;
        }
        map.end()
    }
}

impl Serialize for CategoryJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for q in self.0 {
            map.serialize_entry(&q.id, &q.text)?;
        }
        map.end()
    }
}

/// Pretty-printed JSON for the whole bank.
pub fn generate_questions_json(store: &QuestionStore) -> Result<String> {
    serde_json::to_string_pretty(&QuestionBankJson(store))
        .context("failed to serialize question bank")
}

/// Write the bank dump to `path`.
pub fn write_questions_json(store: &QuestionStore, path: &Path) -> Result<()> {
    let json = generate_questions_json(store)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, json)
        .with_context(|| format!("failed to write questions json: {}", path.display()))?;
    tracing::info!(
        "wrote {} questions in {} categories to {}",
        store.total_question_count(),
        store.categories().len(),
        path.display()
    );
    Ok(())
}
