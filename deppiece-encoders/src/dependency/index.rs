/// Mapping from word indices to the position of their first piece.
///
/// Word indices form a dense range, so the index is stored as a
/// vector that is indexed by the word index.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WordPositionIndex {
    positions: Vec<Option<usize>>,
}

impl WordPositionIndex {
    /// Build the index from the word index of every piece.
    ///
    /// The index records the position of the first piece of each
    /// word. Special pieces (`None`) and continuation pieces are
    /// skipped.
    pub fn from_word_ids(word_ids: &[Option<usize>]) -> Self {
        let positions = word_ids.iter().enumerate().fold(
            Vec::new(),
            |mut positions: Vec<Option<usize>>, (position, word_id)| {
                if let Some(word) = *word_id {
                    if word >= positions.len() {
                        positions.resize(word + 1, None);
                    }

                    if positions[word].is_none() {
                        positions[word] = Some(position);
                    }
                }

                positions
            },
        );

        WordPositionIndex { positions }
    }

    /// Get the position of the first piece of `word`.
    pub fn position(&self, word: usize) -> Option<usize> {
        self.positions.get(word).copied().flatten()
    }

    /// Iterate over `(word, position)` pairs in word order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.positions
            .iter()
            .enumerate()
            .filter_map(|(word, position)| position.map(|position| (word, position)))
    }

    /// Check whether `position` is the first piece of some word.
    pub fn contains_position(&self, position: usize) -> bool {
        self.iter().any(|(_, word_position)| word_position == position)
    }

    /// The number of words in the index.
    pub fn len(&self) -> usize {
        self.positions.iter().filter(|position| position.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
