use std::path::Path;

use sentencepiece::SentencePieceProcessor;

use super::{TokenizedSentence, Tokenize};
use crate::TokenizerError;

const FAIRSEQ_BOS_ID: i64 = 0;
const FAIRSEQ_PAD_ID: i64 = 1;
const FAIRSEQ_EOS_ID: i64 = 2;
const FAIRSEQ_OFFSET: i64 = 1;
const FAIRSEQ_UNK: i64 = 3;

/// Tokenizer for XLM-RoBERTa models.
///
/// XLM-RoBERTa uses the sentencepiece tokenizer. However, we cannot
/// use it in the intended way: we would have to detokenize sentences
/// and it is not guaranteed that each word has a unique piece, which
/// is required for projecting word annotations. So instead, we use the
/// tokenizer as a subword tokenizer.
///
/// Piece identifiers are remapped to the fairseq vocabulary, which
/// reserves the first identifiers for special pieces.
pub struct XlmRobertaTokenizer {
    spp: SentencePieceProcessor,
}

impl XlmRobertaTokenizer {
    pub fn new(spp: SentencePieceProcessor) -> Self {
        XlmRobertaTokenizer { spp }
    }

    pub fn open<P>(model: P) -> Result<Self, TokenizerError>
    where
        P: AsRef<Path>,
    {
        let spp = SentencePieceProcessor::open(model)?;
        Ok(Self::new(spp))
    }
}

impl From<SentencePieceProcessor> for XlmRobertaTokenizer {
    fn from(spp: SentencePieceProcessor) -> Self {
        XlmRobertaTokenizer::new(spp)
    }
}

impl Tokenize for XlmRobertaTokenizer {
    fn tokenize(&self, words: &[&str]) -> Result<TokenizedSentence, TokenizerError> {
        // An average of three pieces per token ought to be enough for
        // everyone ;).
        let mut pieces = Vec::with_capacity((words.len() + 2) * 3);
        let mut word_ids = Vec::with_capacity((words.len() + 2) * 3);

        pieces.push(FAIRSEQ_BOS_ID);
        word_ids.push(None);

        let unk_id = self.spp.unk_id() as i64;

        for (word_idx, word) in words.iter().enumerate() {
            let word_pieces = self.spp.encode(word)?;

            if !word_pieces.is_empty() {
                word_ids.extend(word_pieces.iter().map(|_| Some(word_idx)));
                pieces.extend(word_pieces.into_iter().map(|piece| {
                    let piece_id = piece.id as i64;
                    if piece_id == unk_id {
                        FAIRSEQ_UNK
                    } else {
                        piece_id + FAIRSEQ_OFFSET
                    }
                }));
            } else {
                // Use the unknown token id if sentencepiece does not
                // give an output for the word. This should not happen
                // under normal circumstances, since sentencepiece does
                // return this id for unknown words. However, the input
                // may be corrupt and use some form of non-tab whitespace
                // as a form, for which sentencepiece does not return any
                // identifier.
                pieces.push(FAIRSEQ_UNK);
                word_ids.push(Some(word_idx));
            }
        }

        pieces.push(FAIRSEQ_EOS_ID);
        word_ids.push(None);

        Ok(TokenizedSentence::new(pieces, word_ids))
    }

    fn pad_piece(&self) -> i64 {
        FAIRSEQ_PAD_ID
    }
}
