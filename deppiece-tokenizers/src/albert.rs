use std::convert::TryFrom;
use std::path::Path;

use sentencepiece::SentencePieceProcessor;

use super::{TokenizedSentence, Tokenize};
use crate::TokenizerError;

/// Tokenizer for ALBERT models.
///
/// ALBERT uses the sentencepiece tokenizer. However, we cannot use
/// it in the intended way: we would have to detokenize sentences and
/// it is not guaranteed that each word has a unique piece, which is
/// required for projecting word annotations. So instead, we use the
/// tokenizer as a subword tokenizer.
pub struct AlbertTokenizer {
    spp: SentencePieceProcessor,
    cls_piece: i64,
    sep_piece: i64,
    pad_piece: i64,
}

impl AlbertTokenizer {
    /// Construct a tokenizer from a sentencepiece model.
    ///
    /// Fails when the model lacks the `[CLS]`, `[SEP]`, or `<pad>`
    /// piece.
    pub fn new(spp: SentencePieceProcessor) -> Result<Self, TokenizerError> {
        let special_piece = |piece: &str| -> Result<i64, TokenizerError> {
            spp.piece_to_id(piece)?
                .map(|id| id as i64)
                .ok_or_else(|| TokenizerError::missing_special_piece(piece))
        };

        let cls_piece = special_piece("[CLS]")?;
        let sep_piece = special_piece("[SEP]")?;
        let pad_piece = special_piece("<pad>")?;

        Ok(AlbertTokenizer {
            spp,
            cls_piece,
            sep_piece,
            pad_piece,
        })
    }

    pub fn open<P>(model: P) -> Result<Self, TokenizerError>
    where
        P: AsRef<Path>,
    {
        let spp = SentencePieceProcessor::open(model)?;
        Self::new(spp)
    }
}

impl TryFrom<SentencePieceProcessor> for AlbertTokenizer {
    type Error = TokenizerError;

    fn try_from(spp: SentencePieceProcessor) -> Result<Self, Self::Error> {
        AlbertTokenizer::new(spp)
    }
}

impl Tokenize for AlbertTokenizer {
    fn tokenize(&self, words: &[&str]) -> Result<TokenizedSentence, TokenizerError> {
        // An average of three pieces per token ought to be enough for
        // everyone ;).
        let mut pieces = Vec::with_capacity((words.len() + 2) * 3);
        let mut word_ids = Vec::with_capacity((words.len() + 2) * 3);

        pieces.push(self.cls_piece);
        word_ids.push(None);

        for (word_idx, word) in words.iter().enumerate() {
            let word_pieces = self.spp.encode(word)?;

            if !word_pieces.is_empty() {
                word_ids.extend(word_pieces.iter().map(|_| Some(word_idx)));
                pieces.extend(word_pieces.into_iter().map(|piece| piece.id as i64));
            } else {
                // Use the unknown token id if sentencepiece does not
                // give an output for the word. This should not happen
                // under normal circumstances, since sentencepiece does
                // return this id for unknown words. However, the input
                // may be corrupt and use some form of non-tab whitespace
                // as a form, for which sentencepiece does not return any
                // identifier.
                pieces.push(self.spp.unk_id() as i64);
                word_ids.push(Some(word_idx));
            }
        }

        pieces.push(self.sep_piece);
        word_ids.push(None);

        Ok(TokenizedSentence::new(pieces, word_ids))
    }

    fn pad_piece(&self) -> i64 {
        self.pad_piece
    }
}
