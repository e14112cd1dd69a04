//! Projection of dependency annotations onto subword pieces.
//!
//! The annotations of a sentence are first filtered with
//! [`filter_missing_heads`], so that every word has a head. After
//! tokenization, [`LabelProjector`] assigns a label to each piece: the
//! first piece of every word is labeled with the position of the first
//! piece of its head and its relation identifier, all other pieces are
//! ignored. [`DependencyDecoder`] maps piece-level labels back to
//! word-level dependencies.

mod annotation;
pub use annotation::{AnnotatedSentence, AnnotatedWord, AnnotationError, RawHead, RawSentence};

mod decoder;
pub use decoder::{DecodeError, DecodedDependency, DependencyDecoder};

mod filter;
pub use filter::filter_missing_heads;

mod index;
pub use index::WordPositionIndex;

mod projector;
pub use projector::{LabelProjector, Projection, ProjectionError, TokenLabel, ROOT_POSITION};

mod relations;
pub use relations::{RelationVocab, VocabularyError};
