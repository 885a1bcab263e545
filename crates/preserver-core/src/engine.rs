//! Central facade wiring the question bank, answer storage, selection and
//! transfer together.
//!
//! Front ends (the CLI, a UI) hold one [`Preserver`] for the life of the
//! process and call through it.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::answers::AnswerRepository;
use crate::config::PreserverConfig;
use crate::model::{Answer, ExportFormat, Question};
use crate::questions::QuestionStore;
use crate::selection::{Progress, RandomPick, Sequential, SkipOutcome, Tracker};
use crate::transfer::{ImportOutcome, Transfer};

/// The loaded question bank plus the answer storage it is tracked against.
#[derive(Debug, Clone)]
pub struct Preserver {
    questions: QuestionStore,
    answers: AnswerRepository,
    exports_dir: PathBuf,
}

impl Preserver {
    pub fn new(questions: QuestionStore, answers: AnswerRepository, exports_dir: PathBuf) -> Self {
        Self {
            questions,
            answers,
            exports_dir,
        }
    }

    /// Load the question bank and open answer storage as configured.
    pub fn from_config(config: &PreserverConfig) -> Result<Self> {
        let questions = QuestionStore::load(&config.questions_dir)?;
        let answers = AnswerRepository::new(&config.answers_dir);
        Ok(Self::new(questions, answers, config.exports_dir.clone()))
    }

    pub fn questions(&self) -> &QuestionStore {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerRepository {
        &self.answers
    }

    pub fn exports_dir(&self) -> &Path {
        &self.exports_dir
    }

    pub fn tracker(&self) -> Tracker<'_> {
        Tracker::new(&self.questions, &self.answers)
    }

    pub fn transfer(&self) -> Transfer<'_> {
        Transfer::new(&self.answers)
    }

    pub fn progress(&self, username: &str, category: Option<&str>) -> Progress {
        self.tracker().progress(username, category)
    }

    pub fn next_question(
        &self,
        username: &str,
        category: Option<&str>,
        randomize: bool,
    ) -> Option<&Question> {
        self.tracker().next_question(username, category, randomize)
    }

    /// Skip `current` and pick another unanswered question.
    pub fn skip(
        &self,
        username: &str,
        category: Option<&str>,
        current: Option<(&str, &str)>,
        randomize: bool,
    ) -> SkipOutcome<'_> {
        let tracker = self.tracker();
        if randomize {
            tracker.skip(username, category, current, &mut RandomPick::thread())
        } else {
            tracker.skip(username, category, current, &mut Sequential)
        }
    }

    /// Record an answer to a question from the bank.
    pub fn answer(&self, username: &str, question: &Question, text: &str) -> bool {
        self.answers
            .save(username, &Answer::for_question(question, text))
    }

    pub fn export(&self, username: &str, format: ExportFormat) -> Result<Option<PathBuf>> {
        self.transfer().export(username, format, &self.exports_dir)
    }

    pub fn import_json(&self, username: &str, json: &str) -> ImportOutcome {
        self.transfer().import_json(username, json)
    }
}
