use std::convert::TryFrom;
use std::io::{BufRead, Lines};

use deppiece_encoders::dependency::{AnnotatedSentence, RawSentence};

use crate::error::DepPieceError;

/// A data set with one JSON annotation record per line.
///
/// Every record must have the parallel `tokens`, `head`, and `deprel`
/// fields. Other fields are ignored.
pub struct JsonlDataSet<R>(R);

impl<R> JsonlDataSet<R>
where
    R: BufRead,
{
    /// Construct a JSON lines data set.
    pub fn new(read: R) -> Self {
        Self(read)
    }

    /// Get an iterator over the sentences in the data set.
    pub fn sentences(self) -> JsonlIter<R> {
        JsonlIter {
            lines: self.0.lines(),
            line: 0,
        }
    }
}

pub struct JsonlIter<R> {
    lines: Lines<R>,
    line: usize,
}

impl<R> Iterator for JsonlIter<R>
where
    R: BufRead,
{
    type Item = Result<AnnotatedSentence, DepPieceError>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in &mut self.lines {
            self.line += 1;

            // Bubble up read errors.
            let line = match line {
                Ok(line) => line,
                Err(err) => return Some(Err(err.into())),
            };

            // Skip empty lines
            if line.trim().is_empty() {
                continue;
            }

            return Some(parse_record(self.line, &line));
        }

        None
    }
}

/// Parse an annotation record.
///
/// `line` is the 1-based line number of the record, used in errors.
pub fn parse_record(line: usize, record: &str) -> Result<AnnotatedSentence, DepPieceError> {
    let raw: RawSentence = serde_json::from_str(record).map_err(|err| {
        DepPieceError::JSonSerialization(
            format!("Cannot parse annotation record on line {}", line),
            err,
        )
    })?;

    AnnotatedSentence::try_from(raw)
        .map_err(|source| DepPieceError::AnnotationError { line, source })
}
