use deppiece_encoders::dependency::Projection;
use deppiece_tokenizers::TokenizedSentence;
use ndarray::{s, Array1, Array2};
use serde::Serialize;

use crate::normalize::pad_representatives;

/// Build a batch from tokenized sentences and their projections.
pub struct BatchBuilder {
    current_sequence: usize,
    pieces: Array2<i64>,
    attention_mask: Array2<i64>,
    heads: Array2<i64>,
    relations: Array2<i64>,
    word_ids: Vec<Vec<Option<usize>>>,
    representatives: Vec<Vec<usize>>,
    seq_lens: Array1<i64>,
    ignore_index: i64,
    pad_index: i64,
}

impl BatchBuilder {
    /// Create a new `BatchBuilder`.
    ///
    /// Piece identifiers are padded with `pad_piece`, labels with
    /// `ignore_index`, and representative lists with `pad_index`.
    pub fn new(
        batch_size: usize,
        max_seq_len: usize,
        pad_piece: i64,
        ignore_index: i64,
        pad_index: i64,
    ) -> Self {
        BatchBuilder {
            current_sequence: 0,
            pieces: Array2::from_elem((batch_size, max_seq_len), pad_piece),
            attention_mask: Array2::zeros((batch_size, max_seq_len)),
            heads: Array2::from_elem((batch_size, max_seq_len), ignore_index),
            relations: Array2::from_elem((batch_size, max_seq_len), ignore_index),
            word_ids: Vec::with_capacity(batch_size),
            representatives: Vec::with_capacity(batch_size),
            seq_lens: Array1::zeros((batch_size,)),
            ignore_index,
            pad_index,
        }
    }

    /// Add a sentence with its projected labels.
    pub fn add(&mut self, sentence: &TokenizedSentence, projection: &Projection) {
        assert!(
            self.current_sequence < self.pieces.nrows(),
            "BatchBuilder is already filled."
        );

        assert_eq!(
            sentence.len(),
            projection.labels.len(),
            "Sentence has {} pieces, but {} labels",
            sentence.len(),
            projection.labels.len()
        );

        let len = sentence.len();

        self.pieces
            .row_mut(self.current_sequence)
            .slice_mut(s![0..len])
            .assign(&sentence.pieces);

        self.attention_mask
            .row_mut(self.current_sequence)
            .slice_mut(s![0..len])
            .assign(&sentence.attention_mask);

        self.heads
            .row_mut(self.current_sequence)
            .slice_mut(s![0..len])
            .assign(&projection.head_labels(self.ignore_index));

        self.relations
            .row_mut(self.current_sequence)
            .slice_mut(s![0..len])
            .assign(&projection.relation_labels(self.ignore_index));

        let mut word_ids = sentence.word_ids.clone();
        word_ids.resize(self.pieces.ncols(), None);
        self.word_ids.push(word_ids);

        self.representatives.push(projection.representatives.clone());

        self.seq_lens[self.current_sequence] = len as i64;

        self.current_sequence += 1;
    }
}

/// A batch of sentences with piece-level dependency labels.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AlignedBatch {
    /// Piece identifiers.
    pub pieces: Array2<i64>,

    /// Attention mask.
    pub attention_mask: Array2<i64>,

    /// Head piece positions.
    pub heads: Array2<i64>,

    /// Relation identifiers.
    pub relations: Array2<i64>,

    /// Padded representative lists.
    pub representatives: Array2<i64>,

    /// Word counts.
    pub n_words: Array1<i64>,

    /// The word that each piece belongs to.
    pub word_ids: Vec<Vec<Option<usize>>>,

    /// Sequence lengths in pieces.
    pub seq_lens: Array1<i64>,
}

impl AlignedBatch {
    /// The number of sentences in the batch.
    pub fn len(&self) -> usize {
        self.pieces.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split the batch into per-sentence records.
    ///
    /// Piece-level rows are truncated to the length of the sentence,
    /// the representative lists keep their padding.
    pub fn records(&self) -> Vec<AlignedRecord> {
        (0..self.len())
            .map(|idx| {
                let len = self.seq_lens[idx] as usize;
                AlignedRecord {
                    pieces: self.pieces.slice(s![idx, ..len]).to_vec(),
                    attention_mask: self.attention_mask.slice(s![idx, ..len]).to_vec(),
                    heads: self.heads.slice(s![idx, ..len]).to_vec(),
                    relations: self.relations.slice(s![idx, ..len]).to_vec(),
                    representatives: self.representatives.row(idx).to_vec(),
                    n_words: self.n_words[idx],
                    word_ids: self.word_ids[idx][..len].to_vec(),
                }
            })
            .collect()
    }
}

impl From<BatchBuilder> for AlignedBatch {
    fn from(builder: BatchBuilder) -> Self {
        let padded = pad_representatives(&builder.representatives, builder.pad_index);

        // Drop the rows of an underfilled builder.
        let n_sentences = builder.current_sequence;

        AlignedBatch {
            pieces: builder.pieces.slice(s![..n_sentences, ..]).to_owned(),
            attention_mask: builder
                .attention_mask
                .slice(s![..n_sentences, ..])
                .to_owned(),
            heads: builder.heads.slice(s![..n_sentences, ..]).to_owned(),
            relations: builder.relations.slice(s![..n_sentences, ..]).to_owned(),
            representatives: padded.representatives,
            n_words: padded.n_words,
            word_ids: builder.word_ids,
            seq_lens: builder.seq_lens.slice(s![..n_sentences]).to_owned(),
        }
    }
}

/// A single sentence of an aligned batch.
///
/// Serializes to the field names that transformer token
/// classification pipelines expect.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AlignedRecord {
    #[serde(rename = "input_ids")]
    pub pieces: Vec<i64>,

    pub attention_mask: Vec<i64>,

    #[serde(rename = "head")]
    pub heads: Vec<i64>,

    #[serde(rename = "deprel_ids")]
    pub relations: Vec<i64>,

    #[serde(rename = "tokens_representing_words")]
    pub representatives: Vec<i64>,

    #[serde(rename = "num_words")]
    pub n_words: i64,

    #[serde(rename = "tokenid_to_wordid")]
    pub word_ids: Vec<Option<usize>>,
}
