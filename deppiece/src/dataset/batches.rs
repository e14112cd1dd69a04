use deppiece_encoders::dependency::AnnotatedSentence;
use log::debug;

use crate::align::{BatchAligner, TokenizedAnnotation};
use crate::batch::AlignedBatch;
use crate::dataset::SequenceLength;
use crate::error::DepPieceError;

/// An iterator returning aligned batches.
///
/// Sentences that exceed the maximum length are skipped, so that every
/// batch but the last has `batch_size` sentences. Alignment errors are
/// reported as [`DepPieceError::RecordError`] with the 1-based position
/// of the failing sentence in the input, skipped sentences included.
pub struct AlignedBatches<'a, I> {
    aligner: &'a BatchAligner<'a>,
    batch_size: usize,
    max_len: Option<SequenceLength>,
    parallel: bool,
    sentences: I,
    n_records: usize,
    n_skipped: usize,
}

impl<'a, I> AlignedBatches<'a, I>
where
    I: Iterator<Item = Result<AnnotatedSentence, DepPieceError>>,
{
    /// Create an iterator over batches of at most `batch_size` sentences.
    pub fn new(aligner: &'a BatchAligner<'a>, sentences: I, batch_size: usize) -> Self {
        assert!(batch_size > 0, "Batch size must be at least 1");

        AlignedBatches {
            aligner,
            batch_size,
            max_len: None,
            parallel: false,
            sentences,
            n_records: 0,
            n_skipped: 0,
        }
    }

    /// Skip sentences that are longer than `max_len`.
    pub fn max_len(mut self, max_len: Option<SequenceLength>) -> Self {
        self.max_len = max_len;
        self
    }

    /// Project the sentences of a batch on the rayon thread pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The number of sentences that were skipped so far.
    pub fn n_skipped(&self) -> usize {
        self.n_skipped
    }

    fn too_long(&self, sentence: &TokenizedAnnotation) -> bool {
        match self.max_len {
            Some(SequenceLength::Pieces(max_len)) => sentence.tokenized.len() > max_len,
            Some(SequenceLength::Words(max_len)) => sentence.annotation.len() > max_len,
            None => false,
        }
    }
}

impl<'a, I> Iterator for AlignedBatches<'a, I>
where
    I: Iterator<Item = Result<AnnotatedSentence, DepPieceError>>,
{
    type Item = Result<AlignedBatch, DepPieceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut batch_sentences = Vec::with_capacity(self.batch_size);
        let mut batch_records = Vec::with_capacity(self.batch_size);
        while let Some(sentence) = self.sentences.next() {
            let sentence = match sentence {
                Ok(sentence) => sentence,
                Err(err) => return Some(Err(err)),
            };
            self.n_records += 1;

            let tokenized = match self.aligner.tokenize(&sentence) {
                Ok(tokenized) => tokenized,
                Err(source) => {
                    return Some(Err(DepPieceError::RecordError {
                        record: self.n_records,
                        source,
                    }))
                }
            };

            if self.too_long(&tokenized) {
                debug!(
                    "Skipping record {} with {} words, {} pieces",
                    self.n_records,
                    tokenized.annotation.len(),
                    tokenized.tokenized.len()
                );
                self.n_skipped += 1;
                continue;
            }

            batch_sentences.push(tokenized);
            batch_records.push(self.n_records);
            if batch_sentences.len() == self.batch_size {
                break;
            }
        }

        // Check whether the reader is exhausted.
        if batch_sentences.is_empty() {
            return None;
        }

        let batch = if self.parallel {
            self.aligner.par_align_tokenized(&batch_sentences)
        } else {
            self.aligner.align_tokenized(&batch_sentences)
        };

        Some(batch.map_err(|err| match err {
            DepPieceError::SentenceError { sentence, source } => DepPieceError::RecordError {
                record: batch_records[sentence],
                source,
            },
            err => err,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use ndarray::{arr2, array};

    use super::AlignedBatches;
    use crate::align::BatchAligner;
    use crate::dataset::{JsonlDataSet, SequenceLength};
    use crate::error::{DepPieceError, SentenceError};
    use crate::tests::{relations, wordpiece_tokenizer};

    static RECORDS: &str = r#"{"tokens": ["I", "saw", "it"], "head": ["2", "0", "2"], "deprel": ["nsubj", "root", "obj"]}
{"tokens": ["I", "ran", "away"], "head": ["2", "0", "2"], "deprel": ["nsubj", "root", "advmod"]}
{"tokens": ["I", "rant"], "head": ["2", "0"], "deprel": ["nsubj", "root"]}
{"tokens": ["it"], "head": ["0"], "deprel": ["root"]}
"#;

    #[test]
    fn sentences_are_batched() {
        let tokenizer = wordpiece_tokenizer();
        let relations = relations();
        let aligner = BatchAligner::new(&tokenizer, &relations);

        let sentences = JsonlDataSet::new(Cursor::new(RECORDS)).sentences();
        let batches = AlignedBatches::new(&aligner, sentences, 3)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 3);
        assert_eq!(batches[0].n_words, array![3i64, 3, 2]);
        assert_eq!(batches[1].pieces, arr2(&[[0i64, 6]]));
        assert_eq!(batches[1].heads, arr2(&[[-100i64, 0]]));
    }

    #[test]
    fn long_sentences_are_skipped() {
        let tokenizer = wordpiece_tokenizer();
        let relations = relations();
        let aligner = BatchAligner::new(&tokenizer, &relations);

        // [CLS] I sa ##w it has five pieces.
        let sentences = JsonlDataSet::new(Cursor::new(RECORDS)).sentences();
        let mut batches = AlignedBatches::new(&aligner, sentences, 3)
            .max_len(Some(SequenceLength::Pieces(4)))
            .parallel(true);
        let batch = batches.next().unwrap().unwrap();
        assert!(batches.next().is_none());

        assert_eq!(
            batch.pieces,
            arr2(&[[0i64, 3, 7, 9], [0, 3, 7, 8], [0, 6, 2, 2]])
        );
        assert_eq!(batches.n_skipped(), 1);

        let sentences = JsonlDataSet::new(Cursor::new(RECORDS)).sentences();
        let batches = AlignedBatches::new(&aligner, sentences, 2)
            .max_len(Some(SequenceLength::Words(2)))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].n_words, array![2i64, 1]);
    }

    #[test]
    fn errors_are_returned() {
        let tokenizer = wordpiece_tokenizer();
        let relations = relations();
        let aligner = BatchAligner::new(&tokenizer, &relations);

        let data = r#"{"tokens": ["it"], "head": ["0"], "deprel": ["det"]}"#;
        let sentences = JsonlDataSet::new(Cursor::new(data)).sentences();
        let mut batches = AlignedBatches::new(&aligner, sentences, 2);

        assert!(matches!(
            batches.next(),
            Some(Err(DepPieceError::RecordError {
                record: 1,
                source: SentenceError::Projection(_)
            }))
        ));
    }

    #[test]
    fn errors_point_to_input_record_after_skipping() {
        let tokenizer = wordpiece_tokenizer();
        let relations = relations();
        let aligner = BatchAligner::new(&tokenizer, &relations);

        let data = r#"{"tokens": ["I", "saw", "it"], "head": ["2", "0", "2"], "deprel": ["nsubj", "root", "obj"]}
{"tokens": ["it"], "head": ["0"], "deprel": ["root"]}

{"tokens": ["it"], "head": ["0"], "deprel": ["det"]}
"#;

        for &parallel in &[false, true] {
            let sentences = JsonlDataSet::new(Cursor::new(data)).sentences();
            let mut batches = AlignedBatches::new(&aligner, sentences, 3)
                .max_len(Some(SequenceLength::Pieces(4)))
                .parallel(parallel);

            let err = batches.next().unwrap().unwrap_err();
            assert!(matches!(
                err,
                DepPieceError::RecordError {
                    record: 3,
                    source: SentenceError::Projection(_)
                }
            ));
            assert_eq!(batches.n_skipped(), 1);
        }
    }
}
