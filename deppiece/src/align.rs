use deppiece_encoders::dependency::{
    filter_missing_heads, AnnotatedSentence, LabelProjector, Projection, RelationVocab,
};
use deppiece_tokenizers::{TokenizedSentence, Tokenize};
use log::trace;
use rayon::prelude::*;

use crate::batch::{AlignedBatch, BatchBuilder};
use crate::error::{DepPieceError, SentenceError};

/// A filtered sentence with its pieces.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TokenizedAnnotation {
    /// The annotation, without words that lack a head.
    pub annotation: AnnotatedSentence,

    /// The pieces of the annotation's words.
    pub tokenized: TokenizedSentence,
}

/// Aligns dependency annotations with subword pieces.
///
/// The aligner removes words without a head from a sentence, splits
/// the remaining words into pieces, and projects the dependency
/// annotations onto the pieces. Aligned sentences are then combined
/// into an [`AlignedBatch`].
pub struct BatchAligner<'a> {
    tokenizer: &'a dyn Tokenize,
    projector: LabelProjector<'a>,
    ignore_index: i64,
    pad_index: i64,
}

impl<'a> BatchAligner<'a> {
    /// Construct an aligner.
    ///
    /// The aligner uses `-100` as the label of pieces without
    /// supervision and `-1` to pad representative lists.
    pub fn new(tokenizer: &'a dyn Tokenize, relations: &'a RelationVocab) -> Self {
        BatchAligner {
            tokenizer,
            projector: LabelProjector::new(relations),
            ignore_index: -100,
            pad_index: -1,
        }
    }

    /// Set the label of pieces that do not start a word.
    pub fn ignore_index(mut self, ignore_index: i64) -> Self {
        self.ignore_index = ignore_index;
        self
    }

    /// Set the padding of representative lists.
    pub fn pad_index(mut self, pad_index: i64) -> Self {
        self.pad_index = pad_index;
        self
    }

    /// Filter a sentence and split its words into pieces.
    pub fn tokenize(
        &self,
        sentence: &AnnotatedSentence,
    ) -> Result<TokenizedAnnotation, SentenceError> {
        let annotation = filter_missing_heads(sentence.clone());
        let tokenized = self.tokenizer.tokenize(&annotation.forms())?;
        Ok(TokenizedAnnotation {
            annotation,
            tokenized,
        })
    }

    /// Align a batch of sentences.
    ///
    /// Fails on the first sentence that cannot be aligned, the error
    /// carries the index of that sentence within the batch.
    pub fn align(&self, sentences: &[AnnotatedSentence]) -> Result<AlignedBatch, DepPieceError> {
        let tokenized = sentences
            .iter()
            .enumerate()
            .map(|(idx, sentence)| {
                self.tokenize(sentence)
                    .map_err(|err| DepPieceError::sentence(idx, err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.align_tokenized(&tokenized)
    }

    /// Align a batch of sentences that were already tokenized.
    pub fn align_tokenized(
        &self,
        sentences: &[TokenizedAnnotation],
    ) -> Result<AlignedBatch, DepPieceError> {
        let projections = sentences
            .iter()
            .enumerate()
            .map(|(idx, sentence)| {
                self.project(sentence)
                    .map_err(|err| DepPieceError::sentence(idx, err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.build(
            sentences
                .iter()
                .map(|sentence| &sentence.tokenized)
                .zip(&projections),
        ))
    }

    /// Align a batch of sentences on the rayon thread pool.
    ///
    /// Sentences are tokenized and projected independently. The result
    /// is the same as that of [`BatchAligner::align`], including the
    /// error: tokenization errors are reported before projection
    /// errors and within each step the sentence with the lowest index
    /// is reported.
    pub fn par_align(
        &self,
        sentences: &[AnnotatedSentence],
    ) -> Result<AlignedBatch, DepPieceError> {
        let tokenized = sentences
            .par_iter()
            .enumerate()
            .map(|(idx, sentence)| {
                self.tokenize(sentence)
                    .map_err(|err| DepPieceError::sentence(idx, err))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        self.par_align_tokenized(&tokenized)
    }

    /// Align a batch of tokenized sentences on the rayon thread pool.
    pub fn par_align_tokenized(
        &self,
        sentences: &[TokenizedAnnotation],
    ) -> Result<AlignedBatch, DepPieceError> {
        // Collect all results first, so that the first failure is
        // reported regardless of scheduling.
        let projections = sentences
            .par_iter()
            .enumerate()
            .map(|(idx, sentence)| {
                self.project(sentence)
                    .map_err(|err| DepPieceError::sentence(idx, err))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect::<Result<Vec<_>, _>>()?;

        Ok(self.build(
            sentences
                .iter()
                .map(|sentence| &sentence.tokenized)
                .zip(&projections),
        ))
    }

    fn project(&self, sentence: &TokenizedAnnotation) -> Result<Projection, SentenceError> {
        sentence.tokenized.validate(sentence.annotation.len())?;
        Ok(self
            .projector
            .project(&sentence.annotation, &sentence.tokenized.word_ids)?)
    }

    fn build<'s>(
        &self,
        sentences: impl Iterator<Item = (&'s TokenizedSentence, &'s Projection)> + Clone,
    ) -> AlignedBatch {
        let (batch_size, max_seq_len) = sentences
            .clone()
            .fold((0, 0), |(n, max_len), (tokenized, _)| {
                (n + 1, max_len.max(tokenized.len()))
            });

        trace!(
            "Building batch of {} sentences, {} pieces",
            batch_size,
            max_seq_len
        );

        let mut builder = BatchBuilder::new(
            batch_size,
            max_seq_len,
            self.tokenizer.pad_piece(),
            self.ignore_index,
            self.pad_index,
        );

        for (tokenized, projection) in sentences {
            builder.add(tokenized, projection);
        }

        builder.into()
    }
}

#[cfg(test)]
mod tests {
    use deppiece_encoders::dependency::{
        AnnotatedSentence, AnnotatedWord, DependencyDecoder, ProjectionError,
    };
    use deppiece_tokenizers::{ContractError, TokenizedSentence, Tokenize, TokenizerError};
    use ndarray::{arr2, array, s};

    use super::BatchAligner;
    use crate::error::{DepPieceError, SentenceError};
    use crate::tests::{relations, wordpiece_tokenizer};

    fn i_saw_it() -> AnnotatedSentence {
        AnnotatedSentence::new(vec![
            AnnotatedWord::new("I", Some(2), "nsubj"),
            AnnotatedWord::new("saw", Some(0), "root"),
            AnnotatedWord::new("it", Some(2), "obj"),
        ])
    }

    fn i_ran_away() -> AnnotatedSentence {
        AnnotatedSentence::new(vec![
            AnnotatedWord::new("I", Some(2), "nsubj"),
            AnnotatedWord::new("ran", None, "None"),
            AnnotatedWord::new("ran", Some(0), "root"),
            AnnotatedWord::new("away", Some(2), "advmod"),
        ])
    }

    /// Tokenizer that only knows sentences of a single word.
    struct SingleWordTokenizer;

    impl Tokenize for SingleWordTokenizer {
        fn tokenize(&self, words: &[&str]) -> Result<TokenizedSentence, TokenizerError> {
            if words.len() != 1 {
                return Err(TokenizerError::MissingSpecialPiece("<s>".to_string()));
            }

            Ok(TokenizedSentence::new(vec![0i64, 1], vec![None, Some(0)]))
        }

        fn pad_piece(&self) -> i64 {
            0
        }
    }

    /// Tokenizer that emits the pieces of a word out of order.
    struct ReorderingTokenizer;

    impl Tokenize for ReorderingTokenizer {
        fn tokenize(&self, words: &[&str]) -> Result<TokenizedSentence, TokenizerError> {
            let mut word_ids = vec![None];
            word_ids.extend((0..words.len()).rev().map(Some));
            Ok(TokenizedSentence::new(vec![0i64; word_ids.len()], word_ids))
        }

        fn pad_piece(&self) -> i64 {
            0
        }
    }

    #[test]
    fn sentence_is_aligned() {
        let tokenizer = wordpiece_tokenizer();
        let relations = relations();
        let aligner = BatchAligner::new(&tokenizer, &relations);

        let batch = aligner.align(&[i_saw_it()]).unwrap();

        assert_eq!(batch.pieces, arr2(&[[0i64, 3, 4, 5, 6]]));
        assert_eq!(batch.attention_mask, arr2(&[[1i64, 1, 1, 1, 1]]));
        assert_eq!(batch.heads, arr2(&[[-100i64, 2, 0, -100, 2]]));
        assert_eq!(batch.relations, arr2(&[[-100i64, 1, 0, -100, 2]]));
        assert_eq!(batch.representatives, arr2(&[[0i64, 1, 2, 4]]));
        assert_eq!(batch.n_words, array![3i64]);
        assert_eq!(
            batch.word_ids,
            vec![vec![None, Some(0), Some(1), Some(1), Some(2)]]
        );
    }

    #[test]
    fn words_without_heads_are_removed() {
        let tokenizer = wordpiece_tokenizer();
        let relations = relations();
        let aligner = BatchAligner::new(&tokenizer, &relations);

        let batch = aligner.align(&[i_ran_away()]).unwrap();

        // [CLS] I ran away
        assert_eq!(batch.pieces, arr2(&[[0i64, 3, 7, 9]]));
        assert_eq!(batch.heads, arr2(&[[-100i64, 2, 0, 2]]));
        assert_eq!(batch.relations, arr2(&[[-100i64, 1, 0, 3]]));
        assert_eq!(batch.n_words, array![3i64]);
    }

    #[test]
    fn sentence_without_heads_has_no_words() {
        let tokenizer = wordpiece_tokenizer();
        let relations = relations();
        let aligner = BatchAligner::new(&tokenizer, &relations);

        let sentence = AnnotatedSentence::new(vec![AnnotatedWord::new("I", None, "None")]);
        let batch = aligner.align(&[sentence, i_saw_it()]).unwrap();

        assert_eq!(batch.n_words, array![0i64, 3]);
        assert_eq!(
            batch.representatives,
            arr2(&[[0i64, -1, -1, -1], [0, 1, 2, 4]])
        );
        assert_eq!(
            batch.heads.slice(s![0, ..]),
            array![-100i64, -100, -100, -100, -100]
        );
        assert_eq!(batch.pieces.slice(s![0, ..]), array![0i64, 2, 2, 2, 2]);
        assert_eq!(batch.seq_lens, array![1i64, 5]);
    }

    #[test]
    fn parallel_alignment_is_identical() {
        let tokenizer = wordpiece_tokenizer();
        let relations = relations();
        let aligner = BatchAligner::new(&tokenizer, &relations)
            .ignore_index(-1)
            .pad_index(-2);

        let sentences = vec![i_saw_it(), i_ran_away(), i_saw_it()];
        assert_eq!(
            aligner.align(&sentences).unwrap(),
            aligner.par_align(&sentences).unwrap()
        );
    }

    #[test]
    fn decoding_recovers_heads() {
        let tokenizer = wordpiece_tokenizer();
        let relations = relations();
        let aligner = BatchAligner::new(&tokenizer, &relations);
        let decoder = DependencyDecoder::new(&relations);

        let sentences = vec![i_saw_it(), i_ran_away()];
        let batch = aligner.align(&sentences).unwrap();

        for (idx, record) in batch.records().into_iter().enumerate() {
            let representatives = record
                .representatives
                .iter()
                .take(record.n_words as usize + 1)
                .map(|&position| position as usize)
                .collect::<Vec<_>>();

            let decoded = decoder
                .decode(
                    &representatives,
                    batch.heads.row(idx),
                    batch.relations.row(idx),
                )
                .unwrap();

            let expected = sentences[idx]
                .iter()
                .filter(|word| word.head.is_some())
                .map(|word| (word.head.unwrap(), word.relation.clone()))
                .collect::<Vec<_>>();
            assert_eq!(
                decoded
                    .into_iter()
                    .map(|dep| (dep.head, dep.relation))
                    .collect::<Vec<_>>(),
                expected
            );
        }
    }

    #[test]
    fn errors_carry_sentence_index() {
        let tokenizer = wordpiece_tokenizer();
        let relations = relations();
        let aligner = BatchAligner::new(&tokenizer, &relations);

        let unknown_relation =
            AnnotatedSentence::new(vec![AnnotatedWord::new("it", Some(0), "det")]);
        let sentences = vec![i_saw_it(), unknown_relation];

        for result in &[aligner.align(&sentences), aligner.par_align(&sentences)] {
            assert!(matches!(
                result,
                Err(DepPieceError::SentenceError {
                    sentence: 1,
                    source: SentenceError::Projection(ProjectionError::UnknownRelation {
                        piece: 1,
                        word: 0,
                        ..
                    })
                })
            ));
        }
    }

    #[test]
    fn parallel_alignment_reports_first_failure() {
        let tokenizer = wordpiece_tokenizer();
        let relations = relations();
        let aligner = BatchAligner::new(&tokenizer, &relations);

        let dangling = AnnotatedSentence::new(vec![AnnotatedWord::new("it", Some(4), "obj")]);
        let unknown_relation =
            AnnotatedSentence::new(vec![AnnotatedWord::new("it", Some(0), "det")]);
        let sentences = vec![i_saw_it(), dangling, unknown_relation];

        assert!(matches!(
            aligner.par_align(&sentences),
            Err(DepPieceError::SentenceError {
                sentence: 1,
                source: SentenceError::Projection(ProjectionError::HeadNotTokenized {
                    head: 4,
                    ..
                })
            })
        ));
    }

    #[test]
    fn tokenizer_errors_carry_sentence_index() {
        let tokenizer = SingleWordTokenizer;
        let relations = relations();
        let aligner = BatchAligner::new(&tokenizer, &relations);

        let it = AnnotatedSentence::new(vec![AnnotatedWord::new("it", Some(0), "root")]);
        let sentences = vec![it, i_saw_it()];

        for result in &[aligner.align(&sentences), aligner.par_align(&sentences)] {
            assert!(matches!(
                result,
                Err(DepPieceError::SentenceError {
                    sentence: 1,
                    source: SentenceError::Tokenizer(TokenizerError::MissingSpecialPiece(piece))
                }) if piece == "<s>"
            ));
        }
    }

    #[test]
    fn malformed_tokenizer_output_is_rejected() {
        let tokenizer = ReorderingTokenizer;
        let relations = relations();
        let aligner = BatchAligner::new(&tokenizer, &relations);

        assert!(matches!(
            aligner.align(&[i_saw_it()]),
            Err(DepPieceError::SentenceError {
                sentence: 0,
                source: SentenceError::Contract(ContractError::MissingWord { word: 0 })
            })
        ));
    }
}
