//! Human-readable renderings of preserver data.
//!
//! - [`markdown`]: a user's answers as a Markdown document
//! - [`questions_json`]: the question bank as `{category: {id: text}}` for
//!   the static viewer

pub mod markdown;
pub mod questions_json;
