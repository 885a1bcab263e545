//! Question bank loader.
//!
//! The bank is a directory per category holding one `.txt` file per
//! question. It is loaded once into an immutable [`QuestionStore`] that the
//! rest of the system borrows.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::model::{check_segment, question_index, Question};

/// Extension of question files inside a category directory.
pub const QUESTION_EXTENSION: &str = "txt";

/// The read-only question bank, keyed by category.
///
/// Categories iterate in lexical order; questions within a category are in
/// numeric id order.
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    categories: BTreeMap<String, Vec<Question>>,
}

impl QuestionStore {
    /// Load the bank rooted at `root`.
    ///
    /// A missing root yields an empty store. Files that cannot be read are
    /// skipped with a warning.
    pub fn load(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            tracing::debug!("question bank not found at {}", root.display());
            return Ok(Self::default());
        }

        let mut category_dirs = Vec::new();
        for entry in fs::read_dir(root)
            .with_context(|| format!("failed to read question bank: {}", root.display()))?
        {
            let path = entry?.path();
            if path.is_dir() {
                category_dirs.push(path);
            }
        }
        category_dirs.sort();

        let mut categories = BTreeMap::new();
        for dir in category_dirs {
            let Some(category) = dir.file_name().and_then(|n| n.to_str()) else {
                tracing::warn!("skipping non UTF-8 category directory: {}", dir.display());
                continue;
            };
            let questions = load_category(&dir, category)?;
            categories.insert(category.to_string(), questions);
        }

        let store = Self { categories };
        tracing::info!(
            "loaded {} questions in {} categories from {}",
            store.total_question_count(),
            store.categories.len(),
            root.display()
        );
        Ok(store)
    }

    /// Build a store directly from questions (used by tests and tooling).
    ///
    /// Questions are grouped by category and ordered the same way `load`
    /// orders them.
    pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> Self {
        let mut categories: BTreeMap<String, Vec<Question>> = BTreeMap::new();
        for q in questions {
            categories.entry(q.category.clone()).or_default().push(q);
        }
        for list in categories.values_mut() {
            list.sort_by(|a, b| a.id.cmp(&b.id));
            list.sort_by_key(Question::index);
        }
        Self { categories }
    }

    /// Category slugs, sorted.
    pub fn categories(&self) -> Vec<&str> {
        self.categories.keys().map(String::as_str).collect()
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.contains_key(category)
    }

    pub fn total_question_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Questions of one category in numeric order; empty for unknown categories.
    pub fn questions_in(&self, category: &str) -> &[Question] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up one question.
    pub fn get(&self, category: &str, question_id: &str) -> Option<&Question> {
        self.questions_in(category)
            .iter()
            .find(|q| q.id == question_id)
    }

    /// Every question, category by category.
    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.categories.values().flatten()
    }

    /// Questions in scope: one category if given, else the whole bank.
    pub fn scope<'a>(&'a self, category: Option<&str>) -> Box<dyn Iterator<Item = &'a Question> + 'a> {
        match category {
            Some(c) => Box::new(self.questions_in(c).iter()),
            None => Box::new(self.iter()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

fn load_category(dir: &Path, category: &str) -> Result<Vec<Question>> {
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("failed to read category directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == QUESTION_EXTENSION) {
            files.push(path);
        }
    }

    // Name order first so ids without a number keep a stable relative order.
    files.sort();
    let mut questions = Vec::with_capacity(files.len());
    for path in files {
        let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Err(e) = check_segment("question_id", id) {
            tracing::warn!("skipping {}: {e}", path.display());
            continue;
        }
        match fs::read_to_string(&path) {
            Ok(content) => questions.push(Question {
                category: category.to_string(),
                id: id.to_string(),
                text: content.trim().to_string(),
            }),
            Err(e) => {
                tracing::warn!("skipping {}: {}", path.display(), e);
            }
        }
    }
    questions.sort_by_key(|q| question_index(&q.id));

    Ok(questions)
}

/// Minimum length before a question is flagged as suspiciously short.
pub const MIN_QUESTION_LEN: usize = 10;

/// A warning from question bank validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub category: String,
    pub question_id: String,
    pub message: String,
}

/// Check the bank for empty, very short, or unterminated questions.
pub fn validate_questions(store: &QuestionStore) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for q in store.iter() {
        let len = q.text.chars().count();
        let message = if q.text.is_empty() {
            Some("empty question".to_string())
        } else if len < MIN_QUESTION_LEN {
            Some(format!("very short question ({len} chars)"))
        } else if !(q.text.ends_with('?') || q.text.ends_with('.')) {
            Some("doesn't end with '?' or '.'".to_string())
        } else {
            None
        };

        if let Some(message) = message {
            warnings.push(ValidationWarning {
                category: q.category.clone(),
                question_id: q.id.clone(),
                message,
            });
        }
    }

    warnings
}
