use thiserror::Error;

use crate::TokenizedSentence;

/// Violations of the tokenizer contract.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ContractError {
    #[error("tokenizer returned {pieces} pieces, but an attention mask of length {mask}")]
    MaskLengthMismatch { pieces: usize, mask: usize },

    #[error("tokenizer returned {pieces} pieces, but {word_ids} word indices")]
    WordIdsLengthMismatch { pieces: usize, word_ids: usize },

    #[error("tokenizer output does not start with a special piece")]
    MissingBoundary,

    #[error("word {word} at piece {piece} appears after word {previous}")]
    DecreasingWordIndex {
        piece: usize,
        word: usize,
        previous: usize,
    },

    #[error("pieces of word {word} are not contiguous, the word resumes at piece {piece}")]
    NonContiguousWord { piece: usize, word: usize },

    #[error("tokenizer did not produce pieces for word {word}")]
    MissingWord { word: usize },

    #[error("piece {piece} belongs to word {word}, but the sentence has {n_words} words")]
    WordOutOfRange {
        piece: usize,
        word: usize,
        n_words: usize,
    },
}

pub(crate) fn validate(sentence: &TokenizedSentence, n_words: usize) -> Result<(), ContractError> {
    let pieces = sentence.pieces.len();

    if sentence.attention_mask.len() != pieces {
        return Err(ContractError::MaskLengthMismatch {
            pieces,
            mask: sentence.attention_mask.len(),
        });
    }

    if sentence.word_ids.len() != pieces {
        return Err(ContractError::WordIdsLengthMismatch {
            pieces,
            word_ids: sentence.word_ids.len(),
        });
    }

    // Heads of root words point at the first piece.
    if sentence.word_ids.first() != Some(&None) {
        return Err(ContractError::MissingBoundary);
    }

    // The next word that must start a run of pieces.
    let mut expected = 0;
    let mut prev = None;

    for (piece, &word_id) in sentence.word_ids.iter().enumerate() {
        if let Some(word) = word_id {
            if word >= n_words {
                return Err(ContractError::WordOutOfRange {
                    piece,
                    word,
                    n_words,
                });
            }

            if word_id != prev {
                if word + 1 == expected {
                    return Err(ContractError::NonContiguousWord { piece, word });
                } else if word < expected {
                    return Err(ContractError::DecreasingWordIndex {
                        piece,
                        word,
                        previous: expected - 1,
                    });
                } else if word > expected {
                    return Err(ContractError::MissingWord { word: expected });
                }

                expected += 1;
            }
        }

        prev = word_id;
    }

    if expected < n_words {
        return Err(ContractError::MissingWord { word: expected });
    }

    Ok(())
}
