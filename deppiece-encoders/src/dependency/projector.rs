use std::fmt;

use ndarray::Array1;
use thiserror::Error;

use super::{AnnotatedSentence, RelationVocab, WordPositionIndex};

/// Position of the piece that stands in for the artificial root.
///
/// Tokenizers always emit a special piece at the start of a sentence,
/// which precedes the pieces of all words.
pub const ROOT_POSITION: usize = 0;

/// Label projection errors.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ProjectionError {
    /// The word does not have a head, it should have been filtered.
    MissingHead {
        piece: usize,
        word: usize,
        sent: Vec<String>,
    },

    /// The head of the word is not covered by any piece.
    HeadNotTokenized {
        piece: usize,
        word: usize,
        head: usize,
        sent: Vec<String>,
    },

    /// The relation of the word is not in the relation vocabulary.
    UnknownRelation {
        piece: usize,
        word: usize,
        relation: String,
        sent: Vec<String>,
    },

    /// The pieces of a word are interrupted by other pieces.
    NonContiguousWord { piece: usize, word: usize },

    /// A piece refers to a word that is not in the sentence.
    WordOutOfRange {
        piece: usize,
        word: usize,
        n_words: usize,
    },
}

impl ProjectionError {
    fn format_bracketed(bracket_idx: usize, tokens: &[String]) -> String {
        let mut tokens = tokens.to_owned();
        tokens.insert(bracket_idx + 1, "]".to_string());
        tokens.insert(bracket_idx, "[".to_string());

        tokens.join(" ")
    }

    fn sentence_to_forms(sentence: &AnnotatedSentence) -> Vec<String> {
        sentence.iter().map(|word| word.form.clone()).collect()
    }
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ProjectionError::*;

        match self {
            MissingHead { piece, word, sent } => write!(
                f,
                "Word {} (piece {}) does not have a head:\n\n{}\n",
                word,
                piece,
                Self::format_bracketed(*word, sent),
            ),
            HeadNotTokenized {
                piece,
                word,
                head,
                sent,
            } => write!(
                f,
                "Head {} of word {} (piece {}) is not covered by a piece:\n\n{}\n",
                head,
                word,
                piece,
                Self::format_bracketed(*word, sent),
            ),
            UnknownRelation {
                piece,
                word,
                relation,
                sent,
            } => write!(
                f,
                "Unknown dependency relation '{}' of word {} (piece {}):\n\n{}\n",
                relation,
                word,
                piece,
                Self::format_bracketed(*word, sent),
            ),
            NonContiguousWord { piece, word } => write!(
                f,
                "Pieces of word {} are not contiguous, the word resumes at piece {}",
                word, piece
            ),
            WordOutOfRange {
                piece,
                word,
                n_words,
            } => write!(
                f,
                "Piece {} belongs to word {}, but the sentence has {} words",
                piece, word, n_words
            ),
        }
    }
}

/// The label of a piece.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TokenLabel {
    /// The piece does not carry supervision.
    ///
    /// Used for special pieces and for all but the first piece of a
    /// word.
    Ignore,

    /// The first piece of a word.
    Word {
        /// Position of the first piece of the head word, or
        /// [`ROOT_POSITION`] for the root.
        head: usize,

        /// Identifier of the dependency relation.
        relation: usize,
    },
}

impl TokenLabel {
    /// Encode the head as an integer, using `ignore_index` for ignored pieces.
    pub fn head_index(&self, ignore_index: i64) -> i64 {
        match self {
            TokenLabel::Ignore => ignore_index,
            TokenLabel::Word { head, .. } => *head as i64,
        }
    }

    /// Encode the relation as an integer, using `ignore_index` for ignored pieces.
    pub fn relation_index(&self, ignore_index: i64) -> i64 {
        match self {
            TokenLabel::Ignore => ignore_index,
            TokenLabel::Word { relation, .. } => *relation as i64,
        }
    }
}

/// Dependency annotations of a sentence, projected onto its pieces.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Projection {
    /// The label of every piece.
    pub labels: Vec<TokenLabel>,

    /// Positions of the pieces that represent the words.
    ///
    /// The first element is always [`ROOT_POSITION`], followed by the
    /// position of the first piece of every word in word order.
    pub representatives: Vec<usize>,
}

impl Projection {
    /// The number of words in the sentence.
    pub fn n_words(&self) -> usize {
        self.representatives.len() - 1
    }

    /// Head positions of the pieces.
    pub fn head_labels(&self, ignore_index: i64) -> Array1<i64> {
        self.labels
            .iter()
            .map(|label| label.head_index(ignore_index))
            .collect()
    }

    /// Relation identifiers of the pieces.
    pub fn relation_labels(&self, ignore_index: i64) -> Array1<i64> {
        self.labels
            .iter()
            .map(|label| label.relation_index(ignore_index))
            .collect()
    }
}

/// Projects word-level dependency annotations onto pieces.
pub struct LabelProjector<'a> {
    relations: &'a RelationVocab,
}

struct ScanState {
    prev_word: Option<usize>,
    labels: Vec<TokenLabel>,
    representatives: Vec<usize>,
}

impl<'a> LabelProjector<'a> {
    pub fn new(relations: &'a RelationVocab) -> Self {
        LabelProjector { relations }
    }

    /// Project the annotations of `sentence` onto its pieces.
    ///
    /// `word_ids` contains for every piece the index of the word that
    /// it belongs to, or `None` for special pieces. The sentence must
    /// be filtered, so that every word has a head.
    ///
    /// Only the first piece of a word receives a label, its head is
    /// the position of the first piece of the head word.
    ///
    /// Word indices must be in range and the pieces of a word must be
    /// contiguous. Tokenizer output that passes the tokenizer contract
    /// check satisfies both.
    pub fn project(
        &self,
        sentence: &AnnotatedSentence,
        word_ids: &[Option<usize>],
    ) -> Result<Projection, ProjectionError> {
        Self::check_word_ids(sentence, word_ids)?;

        let index = WordPositionIndex::from_word_ids(word_ids);

        let initial = ScanState {
            prev_word: None,
            labels: Vec::with_capacity(word_ids.len()),
            representatives: {
                let mut representatives = Vec::with_capacity(sentence.len() + 1);
                representatives.push(ROOT_POSITION);
                representatives
            },
        };

        let state = word_ids.iter().enumerate().try_fold(
            initial,
            |mut state, (piece, &word_id)| -> Result<ScanState, ProjectionError> {
                let label = match word_id {
                    Some(word) if word_id != state.prev_word => {
                        state.representatives.push(piece);
                        self.word_label(sentence, &index, piece, word)?
                    }
                    _ => TokenLabel::Ignore,
                };

                state.labels.push(label);
                state.prev_word = word_id;

                Ok(state)
            },
        )?;

        Ok(Projection {
            labels: state.labels,
            representatives: state.representatives,
        })
    }

    fn check_word_ids(
        sentence: &AnnotatedSentence,
        word_ids: &[Option<usize>],
    ) -> Result<(), ProjectionError> {
        let mut seen = vec![false; sentence.len()];
        let mut prev = None;

        for (piece, &word_id) in word_ids.iter().enumerate() {
            if let Some(word) = word_id {
                if word >= sentence.len() {
                    return Err(ProjectionError::WordOutOfRange {
                        piece,
                        word,
                        n_words: sentence.len(),
                    });
                }

                if word_id != prev {
                    if seen[word] {
                        return Err(ProjectionError::NonContiguousWord { piece, word });
                    }
                    seen[word] = true;
                }
            }

            prev = word_id;
        }

        Ok(())
    }

    fn word_label(
        &self,
        sentence: &AnnotatedSentence,
        index: &WordPositionIndex,
        piece: usize,
        word: usize,
    ) -> Result<TokenLabel, ProjectionError> {
        let annotation = &sentence.words()[word];

        let head = annotation
            .head
            .ok_or_else(|| ProjectionError::MissingHead {
                piece,
                word,
                sent: ProjectionError::sentence_to_forms(sentence),
            })?;

        // Heads are 1-based, word indices are 0-based.
        let head = if head == 0 {
            ROOT_POSITION
        } else {
            index
                .position(head - 1)
                .ok_or_else(|| ProjectionError::HeadNotTokenized {
                    piece,
                    word,
                    head,
                    sent: ProjectionError::sentence_to_forms(sentence),
                })?
        };

        let relation =
            self.relations
                .id(&annotation.relation)
                .ok_or_else(|| ProjectionError::UnknownRelation {
                    piece,
                    word,
                    relation: annotation.relation.clone(),
                    sent: ProjectionError::sentence_to_forms(sentence),
                })?;

        Ok(TokenLabel::Word { head, relation })
    }
}
