//! Iterators over data sets.

use serde::{Deserialize, Serialize};

mod batches;
pub use batches::AlignedBatches;

mod jsonl;
pub use jsonl::{parse_record, JsonlDataSet, JsonlIter};

/// The maximum length of a sentence.
///
/// This enum can be used to express the (maximum) length of a
/// sentence in words or in pieces.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceLength {
    Pieces(usize),
    Words(usize),
}
