//! Export to LLM training formats and import of complete exports.
//!
//! Export artifacts are the system's interface to downstream tooling; the
//! complete format doubles as the bulk import payload.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::answers::AnswerRepository;
use crate::error::{ImportError, StoreError};
use crate::model::{check_segment, now_iso, Answer, ExportFormat};

/// The complete export document, also accepted by import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteExport {
    pub username: String,
    pub export_date: String,
    pub total_answers: usize,
    pub answers: Vec<Answer>,
}

impl CompleteExport {
    pub fn new(username: &str, answers: Vec<Answer>) -> Self {
        Self {
            username: username.to_string(),
            export_date: now_iso(),
            total_answers: answers.len(),
            answers,
        }
    }
}

/// An answer tagged with its owner, as found in aggregate exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAnswer {
    #[serde(flatten)]
    pub answer: Answer,
    pub username: String,
}

/// Every user's answers in one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateExport {
    pub export_date: String,
    pub total_users: usize,
    pub total_answers: usize,
    pub users: Vec<String>,
    pub answers: Vec<UserAnswer>,
}

/// Write `answers` to `out` in the given format.
pub fn write_answers<W: Write>(
    out: &mut W,
    username: &str,
    answers: &[Answer],
    format: ExportFormat,
) -> Result<()> {
    match format {
        ExportFormat::Instruction => {
            for answer in answers {
                serde_json::to_writer(&mut *out, &answer.to_instruction())?;
                out.write_all(b"\n")?;
            }
        }
        ExportFormat::Conversation => {
            for answer in answers {
                serde_json::to_writer(&mut *out, &answer.to_conversation())?;
                out.write_all(b"\n")?;
            }
        }
        ExportFormat::Complete => {
            let doc = CompleteExport::new(username, answers.to_vec());
            serde_json::to_writer_pretty(&mut *out, &doc)?;
        }
    }
    Ok(())
}

/// Export file name: `<username>_<format>_<timestamp>.<ext>`.
pub fn export_file_name(username: &str, label: &str, extension: &str) -> String {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{username}_{label}_{timestamp}.{extension}")
}

/// A path under `dir` for `file_name` that is not yet taken, adding a
/// numeric suffix when needed.
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (file_name, String::new()),
    };
    (1..)
        .map(|n| dir.join(format!("{stem}_{n}{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Exports and imports one user's answers through a repository.
#[derive(Debug, Clone, Copy)]
pub struct Transfer<'a> {
    answers: &'a AnswerRepository,
}

impl<'a> Transfer<'a> {
    pub fn new(answers: &'a AnswerRepository) -> Self {
        Self { answers }
    }

    /// Export every answer of `username` into a new file under `exports_dir`.
    ///
    /// Returns `Ok(None)` when the user has nothing to export.
    pub fn export(
        &self,
        username: &str,
        format: ExportFormat,
        exports_dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let answers = self.answers.load_all(username);
        if answers.is_empty() {
            return Ok(None);
        }

        fs::create_dir_all(exports_dir).with_context(|| {
            format!("failed to create exports directory: {}", exports_dir.display())
        })?;
        let name = export_file_name(username, &format.to_string(), format.extension());
        let path = unique_path(exports_dir, &name);
        write_export_file(&path, username, &answers, format)?;
        Ok(Some(path))
    }

    /// Export every answer of `username` to an explicit path.
    pub fn export_to(&self, username: &str, format: ExportFormat, path: &Path) -> Result<bool> {
        let answers = self.answers.load_all(username);
        if answers.is_empty() {
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        write_export_file(path, username, &answers, format)?;
        Ok(true)
    }

    /// Merge a complete export into `username`'s answers.
    ///
    /// Existing answers are never overwritten. Malformed records are skipped
    /// without aborting the batch; only an unusable username, invalid JSON or
    /// a missing `answers` list fails the whole import.
    pub fn import_json(&self, username: &str, json: &str) -> ImportOutcome {
        let records = check_segment("username", username)
            .map_err(|_| ImportError::InvalidUsername(username.to_string()))
            .and_then(|()| parse_import_records(json));
        let outcome = match records {
            Ok(records) => ImportOutcome::from(self.merge(username, records)),
            Err(e) => ImportOutcome::failed(e),
        };
        tracing::info!("import for {username}: {}", outcome.message);
        outcome
    }

    fn merge(&self, username: &str, records: Vec<Value>) -> ImportSummary {
        let mut summary = ImportSummary::default();

        for value in records {
            let record = match serde_json::from_value::<ImportRecord>(value) {
                Ok(r) => r,
                Err(e) => {
                    tracing::debug!("skipping malformed import record: {e}");
                    summary.malformed += 1;
                    continue;
                }
            };

            let answer = record.into_answer();
            if self
                .answers
                .exists(username, &answer.category, &answer.question_id)
            {
                summary.skipped += 1;
                continue;
            }

            match self.answers.try_save(username, &answer) {
                Ok(_) => summary.imported += 1,
                Err(StoreError::InvalidKey { .. }) => summary.malformed += 1,
                Err(StoreError::AlreadyExists(_)) => summary.skipped += 1,
                Err(e) => {
                    tracing::warn!(
                        "could not import {}/{}: {e}",
                        answer.category,
                        answer.question_id
                    );
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    /// Every user's answers, each tagged with its username.
    ///
    /// Returns `None` when there are no answers at all.
    pub fn aggregate(&self) -> Option<AggregateExport> {
        let users = self.answers.users();
        let answers: Vec<UserAnswer> = users
            .iter()
            .flat_map(|user| {
                self.answers
                    .load_all(user)
                    .into_iter()
                    .map(move |answer| UserAnswer {
                        answer,
                        username: user.clone(),
                    })
            })
            .collect();

        if answers.is_empty() {
            return None;
        }

        Some(AggregateExport {
            export_date: now_iso(),
            total_users: users.len(),
            total_answers: answers.len(),
            users,
            answers,
        })
    }
}

fn write_export_file(
    path: &Path,
    username: &str,
    answers: &[Answer],
    format: ExportFormat,
) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("failed to create export file: {}", path.display()))?;
    let mut out = BufWriter::new(file);
    write_answers(&mut out, username, answers, format)
        .with_context(|| format!("failed to write export: {}", path.display()))?;
    out.flush()?;
    tracing::info!("exported {} answers to {}", answers.len(), path.display());
    Ok(())
}

/// Save an aggregate export as pretty JSON.
pub fn save_aggregate(doc: &AggregateExport, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(doc).context("failed to serialize aggregate")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)
        .with_context(|| format!("failed to write aggregate to {}", path.display()))?;
    Ok(())
}

/// One answer as it appears in an import payload.
#[derive(Debug, Deserialize)]
struct ImportRecord {
    question: String,
    answer: String,
    category: String,
    question_id: String,
    #[serde(default)]
    timestamp: Option<String>,
}

impl ImportRecord {
    fn into_answer(self) -> Answer {
        Answer {
            question: self.question,
            answer: self.answer,
            category: self.category,
            question_id: self.question_id,
            timestamp: self.timestamp.unwrap_or_else(now_iso),
        }
    }
}

/// Validate the payload's top-level shape and return its answer records.
pub fn parse_import_records(json: &str) -> Result<Vec<Value>, ImportError> {
    let mut doc: Value = serde_json::from_str(json).map_err(ImportError::InvalidJson)?;
    match doc.get_mut("answers").map(Value::take) {
        Some(Value::Array(records)) => Ok(records),
        Some(_) => Err(ImportError::AnswersNotList),
        None => Err(ImportError::MissingAnswers),
    }
}

/// Per-record tallies of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    /// Records whose key already had an answer.
    pub skipped: usize,
    /// Records missing required fields or with unusable keys.
    pub malformed: usize,
    /// Records that could not be written.
    pub failed: usize,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        let mut message = format!("Successfully imported {} answers", self.imported);
        if self.skipped > 0 {
            message.push_str(&format!(
                " ({} already existed and were skipped)",
                self.skipped
            ));
        }
        if self.failed > 0 {
            message.push_str(&format!(" ({} could not be written)", self.failed));
        }
        message
    }
}

/// What an import reports back to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOutcome {
    pub success: bool,
    pub message: String,
    pub imported: usize,
    pub skipped: usize,
}

impl ImportOutcome {
    fn failed(error: ImportError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            imported: 0,
            skipped: 0,
        }
    }
}

impl From<ImportSummary> for ImportOutcome {
    fn from(summary: ImportSummary) -> Self {
        Self {
            success: true,
            message: summary.message(),
            imported: summary.imported,
            skipped: summary.skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, AnswerRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = AnswerRepository::new(dir.path().join("answers"));
        (dir, repo)
    }

    fn seed(repo: &AnswerRepository, user: &str) {
        let mut a = Answer::new("What is your favorite color?", "Blue", "preferences", "q1");
        a.timestamp = "2024-01-15T10:30:00".into();
        assert!(repo.save(user, &a));
        assert!(repo.save(user, &Answer::new("Why?", "Because", "goals", "q2")));
    }

    #[test]
    fn export_without_answers_is_none() {
        let (dir, repo) = setup();
        let transfer = Transfer::new(&repo);
        let result = transfer
            .export("nobody", ExportFormat::Instruction, &dir.path().join("exports"))
            .unwrap();
        assert!(result.is_none());
        assert!(!dir.path().join("exports").exists());
    }

    #[test]
    fn export_instruction_lines() {
        let (dir, repo) = setup();
        seed(&repo, "alice");
        let transfer = Transfer::new(&repo);

        let path = transfer
            .export("alice", ExportFormat::Instruction, &dir.path().join("exports"))
            .unwrap()
            .unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("alice_instruction_"));
        assert!(name.ends_with(".jsonl"));

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["instruction"], "Why?");
        assert_eq!(lines[1]["output"], "Blue");
        assert_eq!(lines[1]["timestamp"], "2024-01-15T10:30:00");
    }

    #[test]
    fn export_conversation_lines() {
        let (dir, repo) = setup();
        seed(&repo, "alice");
        let path = dir.path().join("conv.jsonl");

        assert!(Transfer::new(&repo)
            .export_to("alice", ExportFormat::Conversation, &path)
            .unwrap());
        let first: Value =
            serde_json::from_str(fs::read_to_string(&path).unwrap().lines().next().unwrap())
                .unwrap();
        assert_eq!(first["messages"][0]["role"], "user");
        assert_eq!(first["messages"][1]["content"], "Because");
        assert_eq!(first["category"], "goals");
    }

    #[test]
    fn successive_exports_do_not_collide() {
        let (dir, repo) = setup();
        seed(&repo, "alice");
        let transfer = Transfer::new(&repo);
        let exports = dir.path().join("exports");

        let a = transfer.export("alice", ExportFormat::Complete, &exports).unwrap().unwrap();
        let b = transfer.export("alice", ExportFormat::Complete, &exports).unwrap().unwrap();
        assert_ne!(a, b);
        assert!(a.exists() && b.exists());
    }

    #[test]
    fn complete_export_round_trips_into_new_user() {
        let (dir, repo) = setup();
        seed(&repo, "alice");
        let transfer = Transfer::new(&repo);

        let path = dir.path().join("alice.json");
        transfer.export_to("alice", ExportFormat::Complete, &path).unwrap();
        let json = fs::read_to_string(&path).unwrap();

        let doc: CompleteExport = serde_json::from_str(&json).unwrap();
        assert_eq!(doc.username, "alice");
        assert_eq!(doc.total_answers, 2);

        let outcome = transfer.import_json("bob", &json);
        assert!(outcome.success);
        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.message, "Successfully imported 2 answers");
        assert_eq!(repo.load_all("bob"), repo.load_all("alice"));
    }

    #[test]
    fn import_twice_skips_everything() {
        let (dir, repo) = setup();
        seed(&repo, "alice");
        let transfer = Transfer::new(&repo);
        let path = dir.path().join("alice.json");
        transfer.export_to("alice", ExportFormat::Complete, &path).unwrap();
        let json = fs::read_to_string(&path).unwrap();

        transfer.import_json("bob", &json);
        let again = transfer.import_json("bob", &json);
        assert!(again.success);
        assert_eq!(again.imported, 0);
        assert_eq!(again.skipped, 2);
        assert!(again.message.contains("2 already existed and were skipped"));
    }

    #[test]
    fn import_rejects_bad_payloads() {
        let (_dir, repo) = setup();
        let transfer = Transfer::new(&repo);

        let outcome = transfer.import_json("bob", "not json");
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Invalid JSON format");

        let outcome = transfer.import_json("bob", r#"{"username": "x"}"#);
        assert!(!outcome.success);
        assert!(outcome.message.contains("missing 'answers'"));

        let outcome = transfer.import_json("bob", r#"{"answers": "nope"}"#);
        assert!(!outcome.success);
        assert_eq!(outcome.imported, 0);
    }

    #[test]
    fn import_rejects_unusable_username() {
        let (dir, repo) = setup();
        let transfer = Transfer::new(&repo);
        let json = r#"{"answers": [
            {"question": "Q1", "answer": "A1", "category": "goals", "question_id": "q1"}
        ]}"#;

        for user in ["", "..", "a/b"] {
            let outcome = transfer.import_json(user, json);
            assert!(!outcome.success, "import into {user:?} should fail");
            assert!(outcome.message.starts_with("Invalid username"));
            assert_eq!(outcome.imported, 0);
        }
        assert!(!dir.path().join("answers").exists());
    }

    #[test]
    fn import_skips_malformed_records_and_fills_timestamp() {
        let (_dir, repo) = setup();
        let transfer = Transfer::new(&repo);
        let json = r#"{
            "answers": [
                {"question": "Q1", "answer": "A1", "category": "new_cat", "question_id": "q1"},
                {"question": "Q2", "category": "new_cat", "question_id": "q2"},
                {"question": "Q3", "answer": "A3", "category": "../x", "question_id": "q3"},
                42,
                {"question": "Q4", "answer": "A4", "category": "new_cat", "question_id": "q4",
                 "timestamp": "2020-01-01T00:00:00"}
            ]
        }"#;

        let outcome = transfer.import_json("bob", json);
        assert!(outcome.success);
        assert_eq!(outcome.imported, 2);
        assert_eq!(outcome.skipped, 0);

        let answers = repo.load_all("bob");
        assert_eq!(answers.len(), 2);
        assert!(!answers[0].timestamp.is_empty());
        assert_eq!(answers[1].timestamp, "2020-01-01T00:00:00");
    }

    #[test]
    fn aggregate_tags_answers_with_user() {
        let (_dir, repo) = setup();
        let transfer = Transfer::new(&repo);
        assert!(transfer.aggregate().is_none());

        seed(&repo, "alice");
        seed(&repo, "bob");
        let doc = transfer.aggregate().unwrap();
        assert_eq!(doc.total_users, 2);
        assert_eq!(doc.total_answers, 4);
        assert_eq!(doc.users, vec!["alice", "bob"]);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["answers"][0]["username"], "alice");
        assert_eq!(value["answers"][0]["category"], "goals");
    }

    #[test]
    fn unique_path_adds_suffix() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "").unwrap();
        fs::write(dir.path().join("a_1.json"), "").unwrap();
        assert_eq!(unique_path(dir.path(), "a.json"), dir.path().join("a_2.json"));
        assert_eq!(unique_path(dir.path(), "b.json"), dir.path().join("b.json"));
    }
}
