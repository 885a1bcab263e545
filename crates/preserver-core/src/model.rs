//! Core data model types for preserver.
//!
//! Questions come from the read-only question bank; answers are the records
//! a user accumulates over many sessions, one per `(username, category,
//! question_id)` key.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A single prompt from the question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Category slug (e.g. "personal_info").
    pub category: String,
    /// Question identifier within the category (e.g. "q12").
    pub id: String,
    /// The prompt text, trimmed.
    pub text: String,
}

impl Question {
    /// Numeric position of this question within its category.
    pub fn index(&self) -> u64 {
        question_index(&self.id)
    }
}

/// Numeric ordering key embedded in a question id.
///
/// `q12` → 12. Ids that are not `q` followed by digits sort as 0.
pub fn question_index(id: &str) -> u64 {
    let digits = id.strip_prefix('q').unwrap_or(id);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    digits.parse().unwrap_or(0)
}

/// A stored answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    /// The question text as it was shown when answering.
    pub question: String,
    /// The user's answer.
    pub answer: String,
    pub category: String,
    pub question_id: String,
    /// ISO-8601 creation time. Empty for records read from the legacy format.
    #[serde(default)]
    pub timestamp: String,
}

impl Answer {
    /// Create an answer stamped with the current local time.
    pub fn new(
        question: impl Into<String>,
        answer: impl Into<String>,
        category: impl Into<String>,
        question_id: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            category: category.into(),
            question_id: question_id.into(),
            timestamp: now_iso(),
        }
    }

    /// Build an answer to a question from the bank.
    pub fn for_question(question: &Question, answer: impl Into<String>) -> Self {
        Self::new(
            question.text.clone(),
            answer,
            question.category.clone(),
            question.id.clone(),
        )
    }

    /// Instruction-tuning line: `{instruction, output, category, timestamp}`.
    pub fn to_instruction(&self) -> InstructionRecord<'_> {
        InstructionRecord {
            instruction: &self.question,
            output: &self.answer,
            category: &self.category,
            timestamp: &self.timestamp,
        }
    }

    /// Chat-tuning line: a user/assistant message pair.
    pub fn to_conversation(&self) -> ConversationRecord<'_> {
        ConversationRecord {
            messages: [
                ChatMessage {
                    role: "user",
                    content: &self.question,
                },
                ChatMessage {
                    role: "assistant",
                    content: &self.answer,
                },
            ],
            category: &self.category,
            timestamp: &self.timestamp,
        }
    }
}

/// One line of an instruction-format export.
#[derive(Debug, Clone, Serialize)]
pub struct InstructionRecord<'a> {
    pub instruction: &'a str,
    pub output: &'a str,
    pub category: &'a str,
    pub timestamp: &'a str,
}

/// One line of a conversation-format export.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationRecord<'a> {
    pub messages: [ChatMessage<'a>; 2],
    pub category: &'a str,
    pub timestamp: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Current local time in the `YYYY-MM-DDTHH:MM:SS.ffffff` form used for
/// answer timestamps.
pub fn now_iso() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Validated `(username, category, question_id)` triple.
///
/// Each component becomes exactly one path segment on disk, so components
/// may not be empty, `.` or `..`, or contain separators or NUL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnswerKey {
    username: String,
    category: String,
    question_id: String,
}

impl AnswerKey {
    pub fn new(username: &str, category: &str, question_id: &str) -> Result<Self, StoreError> {
        check_segment("username", username)?;
        check_segment("category", category)?;
        check_segment("question_id", question_id)?;
        Ok(Self {
            username: username.to_string(),
            category: category.to_string(),
            question_id: question_id.to_string(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn question_id(&self) -> &str {
        &self.question_id
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.username, self.category, self.question_id)
    }
}

pub(crate) fn check_segment(field: &'static str, value: &str) -> Result<(), StoreError> {
    let reason = if value.is_empty() {
        Some("must not be empty")
    } else if value == "." || value == ".." {
        Some("must not be a relative path component")
    } else if value.contains(['/', '\\', '\0']) {
        Some("must not contain path separators")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidKey {
            field,
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Machine-readable export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// JSON lines of `{instruction, output, category, timestamp}`.
    Instruction,
    /// JSON lines of `{messages, category, timestamp}`.
    Conversation,
    /// One JSON document with every full answer record.
    Complete,
}

impl ExportFormat {
    /// File extension for artifacts of this format.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Instruction | ExportFormat::Conversation => "jsonl",
            ExportFormat::Complete => "json",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Instruction => write!(f, "instruction"),
            ExportFormat::Conversation => write!(f, "conversation"),
            ExportFormat::Complete => write!(f, "complete"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instruction" | "jsonl" => Ok(ExportFormat::Instruction),
            "conversation" | "chat" => Ok(ExportFormat::Conversation),
            "complete" | "json" => Ok(ExportFormat::Complete),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

/// Title-cased form of a category slug: `personal_info` → `Personal Info`.
pub fn display_name(category: &str) -> String {
    category
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Inverse of [`display_name`], as used by category pickers.
pub fn slug_from_display(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_index_parsing() {
        assert_eq!(question_index("q1"), 1);
        assert_eq!(question_index("q42"), 42);
        assert_eq!(question_index("7"), 7);
        assert_eq!(question_index("intro"), 0);
        assert_eq!(question_index("q"), 0);
        assert_eq!(question_index("q+3"), 0);
    }

    #[test]
    fn export_format_display_and_parse() {
        assert_eq!(ExportFormat::Instruction.to_string(), "instruction");
        assert_eq!("jsonl".parse::<ExportFormat>().unwrap(), ExportFormat::Instruction);
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Complete);
        assert_eq!(
            "conversation".parse::<ExportFormat>().unwrap(),
            ExportFormat::Conversation
        );
        assert!("markdown".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Complete.extension(), "json");
    }

    #[test]
    fn instruction_and_conversation_shapes() {
        let answer = Answer {
            question: "What is your hobby?".into(),
            answer: "Reading books".into(),
            category: "hobbies".into(),
            question_id: "q1".into(),
            timestamp: "2024-01-15T10:30:00".into(),
        };

        let inst = serde_json::to_string(&answer.to_instruction()).unwrap();
        assert_eq!(
            inst,
            r#"{"instruction":"What is your hobby?","output":"Reading books","category":"hobbies","timestamp":"2024-01-15T10:30:00"}"#
        );

        let conv = serde_json::to_value(answer.to_conversation()).unwrap();
        let messages = conv["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "What is your hobby?");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"], "Reading books");
        assert_eq!(conv["category"], "hobbies");
        assert_eq!(conv["timestamp"], "2024-01-15T10:30:00");
    }

    #[test]
    fn answer_key_rejects_path_tricks() {
        let key = AnswerKey::new("alice", "goals", "q1").unwrap();
        assert_eq!(key.to_string(), "alice/goals/q1");
        assert!(AnswerKey::new("", "goals", "q1").is_err());
        assert!(AnswerKey::new("..", "goals", "q1").is_err());
        assert!(AnswerKey::new("alice", "a/b", "q1").is_err());
        assert!(AnswerKey::new("alice", "goals", "q1\\x").is_err());
    }

    #[test]
    fn display_names() {
        assert_eq!(display_name("personal_info"), "Personal Info");
        assert_eq!(display_name("goals"), "Goals");
        assert_eq!(slug_from_display("Personal Info"), "personal_info");
    }

    #[test]
    fn new_answer_is_timestamped() {
        let a = Answer::new("Q", "A", "goals", "q1");
        assert!(a.timestamp.contains('T'));
    }
}
