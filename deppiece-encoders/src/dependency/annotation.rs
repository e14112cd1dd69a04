use std::convert::TryFrom;
use std::iter::FromIterator;
use std::slice;

use serde::Deserialize;
use thiserror::Error;

/// Head markers that signal that a word has no head.
static MISSING_HEAD_MARKERS: &[&str] = &["None", "_"];

/// Annotation record errors.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum AnnotationError {
    #[error("annotation has {tokens} tokens, {heads} heads, and {relations} relations")]
    LengthMismatch {
        tokens: usize,
        heads: usize,
        relations: usize,
    },

    #[error("word {word} has an invalid head: '{head}'")]
    InvalidHead { word: usize, head: String },
}

/// A head as it occurs in an annotation record.
///
/// Heads are usually stored as strings, since the missing head is
/// represented by a marker such as `None`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(untagged)]
pub enum RawHead {
    Number(usize),
    Text(String),
}

/// A dependency-annotated sentence record.
///
/// The three fields are parallel: `head[i]` and `deprel[i]` are the
/// annotations of `tokens[i]`. Other fields of the record are ignored.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct RawSentence {
    pub tokens: Vec<String>,
    pub head: Vec<Option<RawHead>>,
    pub deprel: Vec<String>,
}

/// A word with its dependency annotation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AnnotatedWord {
    /// Form of the word.
    pub form: String,

    /// 1-based head of the word, `0` is the artificial root.
    ///
    /// `None` if the word is not part of the dependency structure.
    pub head: Option<usize>,

    /// Dependency relation to the head.
    pub relation: String,
}

impl AnnotatedWord {
    pub fn new(form: impl Into<String>, head: Option<usize>, relation: impl Into<String>) -> Self {
        AnnotatedWord {
            form: form.into(),
            head,
            relation: relation.into(),
        }
    }
}

/// A sentence with dependency annotations.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AnnotatedSentence {
    words: Vec<AnnotatedWord>,
}

impl AnnotatedSentence {
    pub fn new(words: Vec<AnnotatedWord>) -> Self {
        AnnotatedSentence { words }
    }

    /// Get the forms of the words in the sentence.
    pub fn forms(&self) -> Vec<&str> {
        self.words.iter().map(|word| word.form.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<AnnotatedWord> {
        self.words.iter()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn words(&self) -> &[AnnotatedWord] {
        &self.words
    }
}

impl FromIterator<AnnotatedWord> for AnnotatedSentence {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = AnnotatedWord>,
    {
        AnnotatedSentence {
            words: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for AnnotatedSentence {
    type Item = AnnotatedWord;
    type IntoIter = std::vec::IntoIter<AnnotatedWord>;

    fn into_iter(self) -> Self::IntoIter {
        self.words.into_iter()
    }
}

impl<'a> IntoIterator for &'a AnnotatedSentence {
    type Item = &'a AnnotatedWord;
    type IntoIter = slice::Iter<'a, AnnotatedWord>;

    fn into_iter(self) -> Self::IntoIter {
        self.words.iter()
    }
}

impl TryFrom<RawSentence> for AnnotatedSentence {
    type Error = AnnotationError;

    fn try_from(raw: RawSentence) -> Result<Self, Self::Error> {
        if raw.tokens.len() != raw.head.len() || raw.tokens.len() != raw.deprel.len() {
            return Err(AnnotationError::LengthMismatch {
                tokens: raw.tokens.len(),
                heads: raw.head.len(),
                relations: raw.deprel.len(),
            });
        }

        raw.tokens
            .into_iter()
            .zip(raw.head)
            .zip(raw.deprel)
            .enumerate()
            .map(|(word, ((form, head), relation))| {
                Ok::<_, AnnotationError>(AnnotatedWord {
                    form,
                    head: parse_head(word, head)?,
                    relation,
                })
            })
            .collect()
    }
}

fn parse_head(word: usize, head: Option<RawHead>) -> Result<Option<usize>, AnnotationError> {
    match head {
        None => Ok(None),
        Some(RawHead::Number(head)) => Ok(Some(head)),
        Some(RawHead::Text(head)) => {
            let trimmed = head.trim();
            if MISSING_HEAD_MARKERS.contains(&trimmed) {
                return Ok(None);
            }

            trimmed
                .parse()
                .map(Some)
                .map_err(|_| AnnotationError::InvalidHead { word, head })
        }
    }
}
