//! On-disk answer record codec.
//!
//! Current records are pretty-printed JSON. Older installs wrote a plain
//! text form with `<USER>` and `<ANSWER>` markers; those are still readable
//! but never written.

use crate::error::DecodeError;
use crate::model::Answer;

pub const USER_MARKER: &str = "<USER>";
pub const ANSWER_MARKER: &str = "<ANSWER>";

/// Which format a record was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Current(Answer),
    Legacy(Answer),
}

impl Decoded {
    pub fn into_answer(self) -> Answer {
        match self {
            Decoded::Current(a) | Decoded::Legacy(a) => a,
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Decoded::Legacy(_))
    }
}

/// Serialize an answer in the current format.
pub fn encode(answer: &Answer) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(answer)
}

/// Decode a stored record.
///
/// `category` and `question_id` come from the record's location and are only
/// used for legacy records, which do not carry them.
pub fn decode(content: &str, category: &str, question_id: &str) -> Result<Decoded, DecodeError> {
    match serde_json::from_str::<Answer>(content) {
        Ok(answer) => Ok(Decoded::Current(answer)),
        Err(structured) => decode_legacy(content, category, question_id)
            .map(Decoded::Legacy)
            .ok_or(DecodeError { structured }),
    }
}

fn decode_legacy(content: &str, category: &str, question_id: &str) -> Option<Answer> {
    if !(content.contains(USER_MARKER) && content.contains(ANSWER_MARKER)) {
        return None;
    }

    let mut sections = content.split(ANSWER_MARKER);
    let question = sections.next().unwrap_or_default().replace(USER_MARKER, "");
    let answer = sections.next().unwrap_or_default();

    Some(Answer {
        question: question.trim().to_string(),
        answer: answer.trim().to_string(),
        category: category.to_string(),
        question_id: question_id.to_string(),
        timestamp: String::new(),
    })
}
