use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use wordpieces::WordPieces;

use super::{TokenizedSentence, Tokenize};
use crate::TokenizerError;

/// BERT word piece tokenizer.
///
/// This tokenizer splits words into word pieces. For example, a
/// sentence such as:
///
/// > Veruntreute die AWO Spendengeld ?
///
/// Could be split (depending on the vocabulary) into the following
/// word pieces:
///
/// > [CLS] Ver ##unt ##reute die A ##W ##O Spenden ##geld [UNK]
///
/// Then vocabulary index of each such piece is returned, together
/// with the word each piece belongs to. The `[CLS]` piece stands in
/// for the root of the sentence and does not belong to a word.
///
/// The unknown token (here `[UNK]`) can be specified while
/// constructing a tokenizer.
pub struct BertTokenizer {
    word_pieces: WordPieces,
    cls_piece: i64,
    pad_piece: i64,
    unknown_piece: i64,
}

impl BertTokenizer {
    /// Construct a tokenizer from wordpieces and the unknown piece.
    ///
    /// Fails when the vocabulary lacks the `[CLS]`, `[PAD]`, or
    /// unknown piece.
    pub fn new(
        word_pieces: WordPieces,
        unknown_piece: impl AsRef<str>,
    ) -> Result<Self, TokenizerError> {
        let special_piece = |piece: &str| {
            word_pieces
                .get_initial(piece)
                .map(|idx| idx as i64)
                .ok_or_else(|| TokenizerError::missing_special_piece(piece))
        };

        let cls_piece = special_piece("[CLS]")?;
        let pad_piece = special_piece("[PAD]")?;
        let unknown_piece = special_piece(unknown_piece.as_ref())?;

        Ok(BertTokenizer {
            word_pieces,
            cls_piece,
            pad_piece,
            unknown_piece,
        })
    }

    pub fn open<P>(model_path: P, unknown_piece: impl AsRef<str>) -> Result<Self, TokenizerError>
    where
        P: AsRef<Path>,
    {
        let model_path = model_path.as_ref();
        let f = File::open(model_path)
            .map_err(|err| TokenizerError::open_error(model_path.to_string_lossy(), err))?;
        Self::read(BufReader::new(f), unknown_piece)
    }

    pub fn read<R>(
        buf_read: R,
        unknown_piece: impl AsRef<str>,
    ) -> Result<BertTokenizer, TokenizerError>
    where
        R: BufRead,
    {
        let word_pieces = WordPieces::try_from(buf_read.lines())?;
        Self::new(word_pieces, unknown_piece)
    }
}

impl Tokenize for BertTokenizer {
    fn tokenize(&self, words: &[&str]) -> Result<TokenizedSentence, TokenizerError> {
        // An average of three pieces per token ought to enough for
        // everyone ;).
        let mut pieces = Vec::with_capacity((words.len() + 1) * 3);
        let mut word_ids = Vec::with_capacity((words.len() + 1) * 3);

        pieces.push(self.cls_piece);
        word_ids.push(None);

        for (word_idx, word) in words.iter().enumerate() {
            match self
                .word_pieces
                .split(word)
                .map(|piece| piece.idx().map(|piece| piece as i64))
                .collect::<Option<Vec<_>>>()
            {
                Some(word_pieces) => {
                    word_ids.extend(word_pieces.iter().map(|_| Some(word_idx)));
                    pieces.extend(word_pieces);
                }
                None => {
                    pieces.push(self.unknown_piece);
                    word_ids.push(Some(word_idx));
                }
            }
        }

        Ok(TokenizedSentence::new(pieces, word_ids))
    }

    fn pad_piece(&self) -> i64 {
        self.pad_piece
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use ndarray::array;

    use crate::tests::wordpiece_tokenizer;
    use crate::{BertTokenizer, Tokenize, TokenizerError};

    #[test]
    fn splits_words_into_pieces() {
        let tokenizer = wordpiece_tokenizer();

        let sentence = tokenizer.tokenize(&["I", "saw", "it"]).unwrap();
        assert_eq!(sentence.pieces, array![0i64, 3, 4, 5, 6]);
        assert_eq!(
            sentence.word_ids,
            vec![None, Some(0), Some(1), Some(1), Some(2)]
        );
        assert_eq!(sentence.attention_mask, array![1i64, 1, 1, 1, 1]);
    }

    #[test]
    fn unknown_words_get_a_single_piece() {
        let tokenizer = wordpiece_tokenizer();

        let sentence = tokenizer.tokenize(&["rant", "xyz", "away"]).unwrap();
        assert_eq!(sentence.pieces, array![0i64, 7, 8, 1, 9]);
        assert_eq!(
            sentence.word_ids,
            vec![None, Some(0), Some(0), Some(1), Some(2)]
        );
        assert!(sentence.validate(3).is_ok());
    }

    #[test]
    fn empty_sentence_only_has_cls_piece() {
        let tokenizer = wordpiece_tokenizer();

        let sentence = tokenizer.tokenize(&[]).unwrap();
        assert_eq!(sentence.pieces, array![0i64]);
        assert_eq!(sentence.word_ids, vec![None]);
    }

    #[test]
    fn batch_is_tokenized_per_sentence() {
        let tokenizer = wordpiece_tokenizer();

        let batch = tokenizer
            .tokenize_batch(&[vec!["I"], vec!["it", "saw"]])
            .unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].pieces, array![0i64, 3]);
        assert_eq!(batch[1].pieces, array![0i64, 6, 4, 5]);
        assert_eq!(tokenizer.pad_piece(), 2);
    }

    #[test]
    fn vocabulary_without_pad_piece_is_rejected() {
        let vocab = "[CLS]\n[UNK]\nI";
        assert!(matches!(
            BertTokenizer::read(Cursor::new(vocab), "[UNK]"),
            Err(TokenizerError::MissingSpecialPiece(piece)) if piece == "[PAD]"
        ));
    }
}
