//! Per-user answer storage.
//!
//! Layout: `<root>/data-<username>/<category>/<question_id>.txt`, one record
//! per file. This module is the only place that knows that layout.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::StoreError;
use crate::model::{check_segment, Answer, AnswerKey};
use crate::record;

/// Prefix of every per-user directory under the answers root.
pub const USER_DIR_PREFIX: &str = "data-";
/// Extension of answer record files.
pub const ANSWER_EXTENSION: &str = "txt";

/// Reads and writes answer records under one root directory.
#[derive(Debug, Clone)]
pub struct AnswerRepository {
    root: PathBuf,
}

impl AnswerRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything stored for `username`.
    fn user_dir(&self, username: &str) -> PathBuf {
        self.root.join(format!("{USER_DIR_PREFIX}{username}"))
    }

    /// Storage location for a key.
    pub fn path_for(&self, key: &AnswerKey) -> PathBuf {
        self.user_dir(key.username())
            .join(key.category())
            .join(format!("{}.{ANSWER_EXTENSION}", key.question_id()))
    }

    /// Whether an answer is stored for this key. Invalid keys have no answer.
    pub fn exists(&self, username: &str, category: &str, question_id: &str) -> bool {
        AnswerKey::new(username, category, question_id)
            .map(|key| self.path_for(&key).is_file())
            .unwrap_or(false)
    }

    /// Store a new answer for `username`, keyed by the answer's own
    /// category and question id.
    ///
    /// Returns `false` and logs on any failure, including an answer already
    /// existing for the key.
    pub fn save(&self, username: &str, answer: &Answer) -> bool {
        match self.try_save(username, answer) {
            Ok(path) => {
                tracing::debug!("saved answer to {}", path.display());
                true
            }
            Err(e) => {
                tracing::warn!(
                    "failed to save answer {}/{} for {username}: {e}",
                    answer.category,
                    answer.question_id
                );
                false
            }
        }
    }

    /// Store a new answer, reporting why it failed.
    ///
    /// The record is written to a temporary file next to its destination and
    /// then linked into place without replacing anything already there.
    pub fn try_save(&self, username: &str, answer: &Answer) -> Result<PathBuf, StoreError> {
        let key = AnswerKey::new(username, &answer.category, &answer.question_id)?;
        let path = self.path_for(&key);
        if path.exists() {
            return Err(StoreError::AlreadyExists(path));
        }

        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;

        let content = record::encode(answer)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| StoreError::io(&dir, e))?;
        tmp.write_all(content.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StoreError::io(tmp.path(), e))?;

        match tmp.persist_noclobber(&path) {
            Ok(_) => Ok(path),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists(path))
            }
            Err(e) => Err(StoreError::io(&path, e.error)),
        }
    }

    /// Read a single answer, if present and decodable.
    pub fn load(&self, username: &str, category: &str, question_id: &str) -> Option<Answer> {
        let key = AnswerKey::new(username, category, question_id).ok()?;
        read_record(&self.path_for(&key), category, question_id)
    }

    /// Every readable answer for `username`, ordered by category directory
    /// and then file name.
    ///
    /// Records that fail to decode are logged and left out.
    pub fn load_all(&self, username: &str) -> Vec<Answer> {
        let mut answers = Vec::new();
        if check_segment("username", username).is_err() {
            return answers;
        }

        let user_dir = self.user_dir(username);
        for category_dir in sorted_entries(&user_dir, |p| p.is_dir()) {
            let Some(category) = file_name(&category_dir) else {
                continue;
            };
            let files = sorted_entries(&category_dir, |p| {
                p.is_file() && p.extension().is_some_and(|ext| ext == ANSWER_EXTENSION)
            });
            for file in files {
                let Some(question_id) = file.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                if let Some(answer) = read_record(&file, &category, question_id) {
                    answers.push(answer);
                }
            }
        }

        answers
    }

    /// Usernames that have a data directory, sorted.
    pub fn users(&self) -> Vec<String> {
        sorted_entries(&self.root, |p| p.is_dir())
            .iter()
            .filter_map(|p| file_name(p))
            .filter_map(|name| name.strip_prefix(USER_DIR_PREFIX).map(str::to_string))
            .filter(|name| !name.is_empty())
            .collect()
    }
}

fn read_record(path: &Path, category: &str, question_id: &str) -> Option<Answer> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("skipping unreadable answer {}: {e}", path.display());
            }
            return None;
        }
    };

    match record::decode(&content, category, question_id) {
        Ok(decoded) => {
            if decoded.is_legacy() {
                tracing::debug!("read legacy answer record {}", path.display());
            }
            Some(decoded.into_answer())
        }
        Err(e) => {
            tracing::warn!("skipping {}: {e}", path.display());
            None
        }
    }
}

/// Entries of `dir` matching `keep`, sorted by path. Missing or unreadable
/// directories yield nothing.
fn sorted_entries(dir: &Path, keep: impl Fn(&Path) -> bool) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| keep(p))
        .collect();
    paths.sort();
    paths
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> (tempfile::TempDir, AnswerRepository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = AnswerRepository::new(dir.path().join("answers"));
        (dir, repo)
    }

    #[test]
    fn path_is_derived_from_key() {
        let repo = AnswerRepository::new("/data/answers");
        let key = AnswerKey::new("alice", "goals", "q3").unwrap();
        assert_eq!(
            repo.path_for(&key),
            PathBuf::from("/data/answers/data-alice/goals/q3.txt")
        );
    }

    #[test]
    fn save_then_exists_and_load() {
        let (_dir, repo) = repo();
        assert!(!repo.exists("alice", "goals", "q1"));

        let answer = Answer::new("Why?", "Because.", "goals", "q1");
        assert!(repo.save("alice", &answer));
        assert!(repo.exists("alice", "goals", "q1"));
        assert!(!repo.exists("bob", "goals", "q1"));

        let loaded = repo.load("alice", "goals", "q1").unwrap();
        assert_eq!(loaded, answer);
    }

    #[test]
    fn save_never_overwrites() {
        let (_dir, repo) = repo();
        let first = Answer::new("Q", "first", "goals", "q1");
        let second = Answer::new("Q", "second", "goals", "q1");

        assert!(repo.save("alice", &first));
        assert!(!repo.save("alice", &second));
        assert!(matches!(
            repo.try_save("alice", &second),
            Err(StoreError::AlreadyExists(_))
        ));
        assert_eq!(repo.load("alice", "goals", "q1").unwrap().answer, "first");
    }

    #[test]
    fn save_rejects_invalid_keys() {
        let (_dir, repo) = repo();
        let answer = Answer::new("Q", "A", "../escape", "q1");
        assert!(!repo.save("alice", &answer));
        assert!(!repo.save("", &Answer::new("Q", "A", "goals", "q1")));
    }

    #[test]
    fn save_reports_io_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("answers");
        fs::write(&blocker, "not a directory").unwrap();

        let repo = AnswerRepository::new(&blocker);
        assert!(!repo.save("alice", &Answer::new("Q", "A", "goals", "q1")));
    }

    #[test]
    fn load_all_is_sorted_and_skips_garbage() {
        let (_dir, repo) = repo();
        repo.save("alice", &Answer::new("H1", "a", "habits", "q1"));
        repo.save("alice", &Answer::new("G2", "b", "goals", "q2"));
        repo.save("alice", &Answer::new("G1", "c", "goals", "q1"));

        let broken = repo.root().join("data-alice/goals/q9.txt");
        fs::write(&broken, "{ not json and no markers").unwrap();

        let answers = repo.load_all("alice");
        let keys: Vec<(&str, &str)> = answers
            .iter()
            .map(|a| (a.category.as_str(), a.question_id.as_str()))
            .collect();
        assert_eq!(keys, vec![("goals", "q1"), ("goals", "q2"), ("habits", "q1")]);
    }

    #[test]
    fn load_all_reads_legacy_records() {
        let (_dir, repo) = repo();
        let path = repo.root().join("data-alice/c/q1.txt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "<USER>\nQ\n<ANSWER>\nA\n").unwrap();

        let answers = repo.load_all("alice");
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].question, "Q");
        assert_eq!(answers[0].answer, "A");
        assert_eq!(answers[0].category, "c");
        assert_eq!(answers[0].question_id, "q1");
        assert_eq!(answers[0].timestamp, "");
    }

    #[test]
    fn unknown_user_has_no_answers() {
        let (_dir, repo) = repo();
        assert!(repo.load_all("nobody").is_empty());
        assert!(repo.users().is_empty());
    }

    #[test]
    fn lists_users() {
        let (_dir, repo) = repo();
        repo.save("bob", &Answer::new("Q", "A", "goals", "q1"));
        repo.save("alice", &Answer::new("Q", "A", "goals", "q1"));
        fs::create_dir_all(repo.root().join("scratch")).unwrap();

        assert_eq!(repo.users(), vec!["alice", "bob"]);
    }
}
