use std::io;

use thiserror::Error;

use crate::corpus::WordClass;

pub type Result<T> = std::result::Result<T, CptError>;

#[derive(Debug, Error)]
pub enum CptError {
    #[error("the number of topics must be positive")]
    InvalidTopicCount,

    #[error("hyperparameter `{name}` must be a positive finite number, got {value}")]
    NonPositiveHyperparameter { name: &'static str, value: f64 },

    #[error("the number of sampling iterations must be positive")]
    ZeroIterations,

    #[error("the corpus contains no documents")]
    EmptyCorpus,

    #[error("the corpus contains no perspectives")]
    NoPerspectives,

    #[error("the {class} vocabulary is empty")]
    EmptyVocabulary { class: WordClass },

    #[error("{class} word id {word} is outside the vocabulary of size {vocab_size}")]
    WordOutOfVocabulary { class: WordClass, word: usize, vocab_size: usize },

    #[error("document {document} refers to unknown perspective {perspective}")]
    UnknownPerspective { document: usize, perspective: usize },

    #[error("document {document} claims opinion-document index {index}, but its perspective has {count} opinion documents")]
    OpinionDocumentOutOfRange { document: usize, index: usize, count: usize },

    #[error("documents {other} and {document} both claim opinion document {index} of perspective {perspective}")]
    DuplicateOpinionDocument { document: usize, other: usize, perspective: usize, index: usize },

    #[error("document {document} has two {class} words at position {position}")]
    DuplicatePosition { document: usize, class: WordClass, position: usize },

    #[error("degenerate distribution over {len} outcomes: weights sum to zero or are not finite")]
    DegenerateDistribution { len: usize },

    #[error("expected {expected} snapshots of `{name}`, found only {found}")]
    IncompleteSnapshots { name: String, expected: usize, found: usize },

    #[error("snapshot `{name}` has shape {found:?}, expected {expected:?}")]
    ShapeMismatch { name: String, expected: Vec<usize>, found: Vec<usize> },

    #[error("malformed document file {path}: expected a topic-word line and an opinion-word line")]
    MalformedDocument { path: String },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
