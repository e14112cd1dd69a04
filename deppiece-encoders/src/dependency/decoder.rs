use std::collections::HashMap;
use std::convert::TryFrom;

use itertools::Itertools;
use ndarray::ArrayView1;
use thiserror::Error;

use super::{RelationVocab, ROOT_POSITION};

/// Decoder errors.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum DecodeError {
    #[error("word {word} is represented by piece {piece}, but the sentence has {n_pieces} pieces")]
    PieceOutOfBounds {
        word: usize,
        piece: usize,
        n_pieces: usize,
    },

    #[error("head of word {word} is piece {head}, which does not represent a word")]
    UnknownHeadPosition { word: usize, head: i64 },

    #[error("word {word} has unknown relation identifier {relation}")]
    UnknownRelation { word: usize, relation: i64 },
}

/// A word-level dependency, recovered from piece-level labels.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedDependency {
    /// 1-based head of the word, `0` is the root.
    pub head: usize,

    /// Dependency relation.
    pub relation: String,
}

/// Recovers word-level dependencies from piece-level labels.
///
/// This is the inverse of the label projection: piece positions of
/// heads are mapped back to word ordinals using the representatives of
/// the sentence.
pub struct DependencyDecoder<'a> {
    relations: &'a RelationVocab,
}

impl<'a> DependencyDecoder<'a> {
    pub fn new(relations: &'a RelationVocab) -> Self {
        DependencyDecoder { relations }
    }

    /// Decode the dependencies of a sentence.
    ///
    /// `representatives` are the representative piece positions of the
    /// sentence, starting with the root position. `heads` and
    /// `relations` hold the head position and relation identifier for
    /// every piece; only the values at representative pieces are read.
    pub fn decode(
        &self,
        representatives: &[usize],
        heads: ArrayView1<i64>,
        relations: ArrayView1<i64>,
    ) -> Result<Vec<DecodedDependency>, DecodeError> {
        // Map representative piece positions back to 1-based word ordinals.
        let ordinals = representatives
            .iter()
            .enumerate()
            .map(|(ordinal, &position)| (position as i64, ordinal))
            .collect::<HashMap<_, _>>();

        representatives
            .iter()
            .skip(1)
            .enumerate()
            .map(|(word, &piece)| -> Result<DecodedDependency, DecodeError> {
                if piece >= heads.len() || piece >= relations.len() {
                    return Err(DecodeError::PieceOutOfBounds {
                        word,
                        piece,
                        n_pieces: heads.len().min(relations.len()),
                    });
                }

                let head_position = heads[piece];
                let head = if head_position == ROOT_POSITION as i64 {
                    0
                } else {
                    *ordinals
                        .get(&head_position)
                        .ok_or(DecodeError::UnknownHeadPosition {
                            word,
                            head: head_position,
                        })?
                };

                let relation_id = relations[piece];
                let relation = usize::try_from(relation_id)
                    .ok()
                    .and_then(|id| self.relations.label(id))
                    .ok_or(DecodeError::UnknownRelation {
                        word,
                        relation: relation_id,
                    })?;

                Ok(DecodedDependency {
                    head,
                    relation: relation.to_owned(),
                })
            })
            .collect()
    }

    /// Decode the dependencies of every sentence in a batch.
    pub fn decode_batch(
        &self,
        representatives: &[Vec<usize>],
        heads: &[ArrayView1<i64>],
        relations: &[ArrayView1<i64>],
    ) -> Result<Vec<Vec<DecodedDependency>>, DecodeError> {
        representatives
            .iter()
            .zip_eq(heads)
            .zip_eq(relations)
            .map(|((representatives, heads), relations)| {
                self.decode(representatives, heads.view(), relations.view())
            })
            .collect()
    }
}
