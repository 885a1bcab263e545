//! preserver-core: question bank, answer storage, selection and transfer.
//!
//! This crate holds everything with real invariants: loading the question
//! bank, the one-file-per-answer storage layout, progress and next-question
//! selection, and import/export of accumulated answers.

pub mod answers;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod questions;
pub mod record;
pub mod selection;
pub mod transfer;

pub use answers::AnswerRepository;
pub use config::{load_config, load_config_from, PreserverConfig};
pub use engine::Preserver;
pub use error::{DecodeError, ImportError, StoreError};
pub use model::{Answer, AnswerKey, ExportFormat, Question};
pub use questions::QuestionStore;
pub use selection::{Progress, SelectionPolicy, SkipOutcome, Tracker};
pub use transfer::{ImportOutcome, Transfer};
