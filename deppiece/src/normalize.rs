use ndarray::{s, Array1, Array2};

/// Representative lists of a batch, padded to the same length.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaddedRepresentatives {
    /// Representative piece positions, one row per sentence.
    ///
    /// Row `i` holds the representative list of sentence `i`, followed
    /// by the pad index.
    pub representatives: Array2<i64>,

    /// The number of words of each sentence.
    pub n_words: Array1<i64>,
}

/// Pad representative lists to the longest list in the batch.
///
/// `representatives` has a list per sentence, each starting with the
/// root position. The word count of a sentence is the length of its
/// list minus the root. The counts are returned unpadded.
pub fn pad_representatives<R>(representatives: &[R], pad_index: i64) -> PaddedRepresentatives
where
    R: AsRef<[usize]>,
{
    let max_len = representatives
        .iter()
        .map(|r| r.as_ref().len())
        .max()
        .unwrap_or(0);

    let mut padded = Array2::from_elem((representatives.len(), max_len), pad_index);
    let mut n_words = Array1::zeros((representatives.len(),));

    for (idx, sent_representatives) in representatives.iter().enumerate() {
        let sent_representatives = sent_representatives.as_ref();

        padded
            .row_mut(idx)
            .slice_mut(s![0..sent_representatives.len()])
            .assign(
                &sent_representatives
                    .iter()
                    .map(|&position| position as i64)
                    .collect::<Array1<_>>(),
            );

        n_words[idx] = sent_representatives.len().saturating_sub(1) as i64;
    }

    PaddedRepresentatives {
        representatives: padded,
        n_words,
    }
}
