use ndarray::Array1;

mod albert;
pub use albert::AlbertTokenizer;

mod bert;
pub use bert::BertTokenizer;

mod contract;
pub use contract::ContractError;

mod error;
pub use error::TokenizerError;

mod xlm_roberta;
pub use xlm_roberta::XlmRobertaTokenizer;

/// Trait for subword tokenizers.
///
/// A tokenizer receives the words of a sentence that was already split
/// into words. Every word is split into one or more pieces and the
/// tokenizer adds its special pieces (such as a beginning-of-sentence
/// marker). Besides the piece identifiers, the tokenizer records for
/// each piece the index of the word that it belongs to, or `None` for
/// special pieces.
pub trait Tokenize: Send + Sync {
    /// Tokenize the words of a sentence into pieces.
    fn tokenize(&self, words: &[&str]) -> Result<TokenizedSentence, TokenizerError>;

    /// Tokenize a batch of sentences.
    fn tokenize_batch(
        &self,
        sentences: &[Vec<&str>],
    ) -> Result<Vec<TokenizedSentence>, TokenizerError> {
        sentences
            .iter()
            .map(|words| self.tokenize(words))
            .collect()
    }

    /// The piece that is used to pad sentences in a batch.
    fn pad_piece(&self) -> i64;
}

/// A tokenized sentence.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenizedSentence {
    /// Piece identifiers.
    pub pieces: Array1<i64>,

    /// Attention mask, `1` for every piece that should be attended to.
    pub attention_mask: Array1<i64>,

    /// The index of the word that each piece belongs to.
    ///
    /// Special pieces do not belong to a word and have the index
    /// `None`.
    pub word_ids: Vec<Option<usize>>,
}

impl TokenizedSentence {
    /// Construct a tokenized sentence from pieces and their word indices.
    ///
    /// All pieces are attended to.
    pub fn new(pieces: impl Into<Array1<i64>>, word_ids: Vec<Option<usize>>) -> Self {
        let pieces = pieces.into();
        let attention_mask = Array1::ones((pieces.len(),));
        TokenizedSentence {
            pieces,
            attention_mask,
            word_ids,
        }
    }

    /// The number of pieces in the sentence.
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    /// Check whether the sentence has no pieces.
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// The positions of the first piece of every word.
    pub fn word_offsets(&self) -> Vec<usize> {
        let mut prev = None;
        let mut offsets = Vec::new();
        for (position, &word_id) in self.word_ids.iter().enumerate() {
            if word_id.is_some() && word_id != prev {
                offsets.push(position);
            }
            prev = word_id;
        }
        offsets
    }

    /// Validate the tokenizer output against the tokenizer contract.
    ///
    /// The pieces, attention mask, and word indices must have the
    /// same length. Each of the `n_words` words must be covered by
    /// a contiguous run of pieces and the words must appear in order.
    pub fn validate(&self, n_words: usize) -> Result<(), ContractError> {
        contract::validate(self, n_words)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::convert::TryFrom;
    use std::io::{BufRead, BufReader, Cursor};

    use wordpieces::WordPieces;

    use crate::{BertTokenizer, TokenizedSentence};

    const PIECES: &str = r#"[CLS]
[UNK]
[PAD]
I
sa
##w
it
ran
##t
away"#;

    pub fn wordpiece_tokenizer() -> BertTokenizer {
        let pieces = WordPieces::try_from(BufReader::new(Cursor::new(PIECES)).lines()).unwrap();
        BertTokenizer::new(pieces, "[UNK]").unwrap()
    }

    #[test]
    fn new_sentence_attends_to_all_pieces() {
        let sentence = TokenizedSentence::new(vec![0, 3, 4], vec![None, Some(0), Some(1)]);
        assert_eq!(sentence.attention_mask.to_vec(), vec![1, 1, 1]);
        assert_eq!(sentence.len(), 3);
    }

    #[test]
    fn word_offsets_skip_continuation_and_special_pieces() {
        let sentence = TokenizedSentence::new(
            vec![0, 3, 4, 5, 6, 2],
            vec![None, Some(0), Some(1), Some(1), Some(2), None],
        );
        assert_eq!(sentence.word_offsets(), vec![1, 2, 4]);
    }
}
