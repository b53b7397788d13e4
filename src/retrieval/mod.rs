//! Fallback matching of a message against a corpus of example questions.

pub mod corpus;
pub mod matcher;

pub use corpus::{tokenize, PromptCorpus, PromptEntry};
pub use matcher::{PromptMatcher, Retrieval};
