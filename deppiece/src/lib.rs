//! Alignment of dependency annotations with subword pieces.
//!
//! Dependency treebanks annotate words, transformer models consume
//! subword pieces. This crate tokenizes annotated sentences and
//! projects their heads and relations onto the pieces, producing
//! padded batches for training a piece-level dependency parser.

pub mod align;

pub mod batch;

pub mod config;

pub mod dataset;

pub mod error;

pub mod normalize;

#[cfg(test)]
pub(crate) mod tests {
    use std::convert::TryFrom;
    use std::io::{BufRead, BufReader, Cursor};

    use deppiece_encoders::dependency::RelationVocab;
    use deppiece_tokenizers::BertTokenizer;
    use wordpieces::WordPieces;

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

    pub fn relations() -> RelationVocab {
        RelationVocab::from_labels(vec!["root", "nsubj", "obj", "advmod"]).unwrap()
    }
}
