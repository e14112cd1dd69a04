use std::io;

use deppiece_encoders::dependency::{AnnotationError, ProjectionError, VocabularyError};
use deppiece_tokenizers::{ContractError, TokenizerError};
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DepPieceError {
    #[error("Invalid annotation on line {line}: {source}")]
    AnnotationError {
        line: usize,
        #[source]
        source: AnnotationError,
    },

    #[error("Illegal configuration: {0}")]
    IllegalConfigurationError(String),

    #[error(transparent)]
    IoError(#[from] io::Error),

    #[error("{0}: {1}")]
    JSonSerialization(String, serde_json::Error),

    #[error("Cannot align input record {record}: {source}")]
    RecordError {
        record: usize,
        #[source]
        source: SentenceError,
    },

    #[error("Cannot relativize path: {0}")]
    RelativizePathError(String),

    #[error("Cannot align sentence {sentence} of the batch: {source}")]
    SentenceError {
        sentence: usize,
        #[source]
        source: SentenceError,
    },

    #[error(transparent)]
    TomlDeserializationError(#[from] toml::de::Error),

    #[error(transparent)]
    TokenizerError(#[from] TokenizerError),

    #[error(transparent)]
    VocabularyError(#[from] VocabularyError),
}

impl DepPieceError {
    pub(crate) fn sentence(sentence: usize, source: impl Into<SentenceError>) -> Self {
        DepPieceError::SentenceError {
            sentence,
            source: source.into(),
        }
    }
}

/// Failure to align a single sentence.
#[derive(Debug, Error)]
pub enum SentenceError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Tokenizer(#[from] TokenizerError),
}
