use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use numberer::Numberer;
use thiserror::Error;

/// Relation vocabulary errors.
#[derive(Debug, Error)]
pub enum VocabularyError {
    #[error("Cannot open relation vocabulary `{path}`: {inner}")]
    OpenError { path: String, inner: io::Error },

    #[error("Cannot read relation vocabulary: {0}")]
    ReadError(#[from] io::Error),

    #[error("Relation `{label}` occurs more than once (entry {index})")]
    DuplicateLabel { label: String, index: usize },
}

/// A fixed vocabulary of dependency relations.
///
/// The vocabulary maps relation labels to dense identifiers and back.
/// It is read-only: looking up a label that is not in the vocabulary
/// gives `None`, it is never added.
pub struct RelationVocab {
    relations: Numberer<String>,
}

impl RelationVocab {
    /// Construct a vocabulary from labels.
    ///
    /// Labels are numbered in iteration order, starting at zero.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut relations: Numberer<String> = Numberer::new(0);

        for (idx, label) in labels.into_iter().enumerate() {
            let label: String = label.into();
            if relations.number(&label).is_some() {
                return Err(VocabularyError::DuplicateLabel { label, index: idx });
            }
            relations.add(label);
        }

        Ok(RelationVocab { relations })
    }

    /// Read a vocabulary with one relation label per line.
    ///
    /// Labels are numbered in the order in which they appear, empty
    /// lines are skipped.
    pub fn read<R>(buf_read: R) -> Result<Self, VocabularyError>
    where
        R: BufRead,
    {
        let labels = buf_read
            .lines()
            .filter(|line| line.as_ref().map(|l| !l.trim().is_empty()).unwrap_or(true))
            .map(|line| line.map(|l| l.trim().to_owned()))
            .collect::<Result<Vec<_>, _>>()?;

        Self::from_labels(labels)
    }

    pub fn open<P>(path: P) -> Result<Self, VocabularyError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let f = File::open(path).map_err(|inner| VocabularyError::OpenError {
            path: path.to_string_lossy().into_owned(),
            inner,
        })?;
        Self::read(BufReader::new(f))
    }

    /// Get the identifier of a relation label.
    pub fn id(&self, label: &str) -> Option<usize> {
        self.relations.number(&label.to_owned())
    }

    /// Get the label of a relation identifier.
    pub fn label(&self, id: usize) -> Option<&str> {
        self.relations.value(id).map(String::as_str)
    }

    /// The number of relations in the vocabulary.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::{RelationVocab, VocabularyError};

    #[test]
    fn labels_are_numbered_by_line() {
        let vocab = RelationVocab::read(Cursor::new("root\nnsubj\n\nobj\n")).unwrap();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.id("root"), Some(0));
        assert_eq!(vocab.id("nsubj"), Some(1));
        assert_eq!(vocab.id("obj"), Some(2));
        assert_eq!(vocab.label(2), Some("obj"));
    }

    #[test]
    fn unknown_labels_are_not_added() {
        let vocab = RelationVocab::from_labels(vec!["root"]).unwrap();
        assert_eq!(vocab.id("det"), None);
        assert_eq!(vocab.label(1), None);
        assert_eq!(vocab.len(), 1);
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        assert!(matches!(
            RelationVocab::from_labels(vec!["root", "det", "root"]),
            Err(VocabularyError::DuplicateLabel { label, index: 2 }) if label == "root"
        ));
    }
}
