use std::io::Read;
use std::path::Path;

use deppiece_encoders::dependency::RelationVocab;
use deppiece_tokenizers::{AlbertTokenizer, BertTokenizer, Tokenize, XlmRobertaTokenizer};
use serde::{Deserialize, Serialize};

use crate::dataset::SequenceLength;
use crate::error::DepPieceError;

/// Input configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Input {
    /// The type of tokenizer to use.
    pub tokenizer: Tokenizer,
}

/// Label configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Labels {
    /// Dependency relation vocabulary, one label per line.
    pub relations: String,
}

/// Batch configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BatchConfig {
    /// The maximum number of sentences in a batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Label of pieces that do not start a word.
    #[serde(default = "default_ignore_index")]
    pub ignore_index: i64,

    /// Padding of representative lists.
    #[serde(default = "default_pad_index")]
    pub pad_index: i64,

    /// Sentences that are longer are skipped.
    #[serde(default)]
    pub max_len: Option<SequenceLength>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            batch_size: default_batch_size(),
            ignore_index: default_ignore_index(),
            pad_index: default_pad_index(),
            max_len: None,
        }
    }
}

fn default_batch_size() -> usize {
    32
}

fn default_ignore_index() -> i64 {
    -100
}

fn default_pad_index() -> i64 {
    -1
}

/// Aligner configuration.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Configuration of the input representations.
    pub input: Input,

    /// Configuration of the labels.
    pub labels: Labels,

    /// Configuration of batching.
    #[serde(default)]
    pub batch: BatchConfig,
}

impl Config {
    /// Make configuration paths relative to the configuration file.
    pub fn relativize_paths<P>(&mut self, config_path: P) -> Result<(), DepPieceError>
    where
        P: AsRef<Path>,
    {
        let config_path = config_path.as_ref();

        *self.input.tokenizer.vocab_mut() =
            relativize_path(config_path, self.input.tokenizer.vocab())?;
        self.labels.relations = relativize_path(config_path, &self.labels.relations)?;

        Ok(())
    }

    /// Validate settings that cannot be expressed in types.
    pub fn validate(&self) -> Result<(), DepPieceError> {
        if self.batch.batch_size == 0 {
            return Err(DepPieceError::IllegalConfigurationError(
                "batch size must be at least 1".to_string(),
            ));
        }

        if self.batch.ignore_index >= 0 {
            return Err(DepPieceError::IllegalConfigurationError(format!(
                "ignore index {} collides with piece positions",
                self.batch.ignore_index
            )));
        }

        if self.batch.pad_index >= 0 {
            return Err(DepPieceError::IllegalConfigurationError(format!(
                "pad index {} collides with piece positions",
                self.batch.pad_index
            )));
        }

        Ok(())
    }

    /// Construct a word piece tokenizer.
    pub fn tokenizer(&self) -> Result<Box<dyn Tokenize>, DepPieceError> {
        match self.input.tokenizer {
            Tokenizer::Albert { ref vocab } => {
                let tokenizer = AlbertTokenizer::open(vocab)?;
                Ok(Box::new(tokenizer))
            }
            Tokenizer::Bert { ref vocab } => {
                let tokenizer = BertTokenizer::open(vocab, "[UNK]")?;
                Ok(Box::new(tokenizer))
            }
            Tokenizer::XlmRoberta { ref vocab } => {
                let tokenizer = XlmRobertaTokenizer::open(vocab)?;
                Ok(Box::new(tokenizer))
            }
        }
    }

    /// Read the dependency relation vocabulary.
    pub fn relations(&self) -> Result<RelationVocab, DepPieceError> {
        Ok(RelationVocab::open(&self.labels.relations)?)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
#[serde(rename_all = "snake_case")]
pub enum Tokenizer {
    Albert { vocab: String },
    Bert { vocab: String },
    XlmRoberta { vocab: String },
}

impl Tokenizer {
    fn vocab(&self) -> &str {
        use Tokenizer::*;
        match self {
            Albert { vocab } => vocab,
            Bert { vocab } => vocab,
            XlmRoberta { vocab } => vocab,
        }
    }

    fn vocab_mut(&mut self) -> &mut String {
        use Tokenizer::*;
        match self {
            Albert { ref mut vocab } => vocab,
            Bert { ref mut vocab } => vocab,
            XlmRoberta { ref mut vocab } => vocab,
        }
    }
}

pub trait TomlRead
where
    Self: Sized,
{
    fn from_toml_read(read: impl Read) -> Result<Self, DepPieceError>;
}

impl TomlRead for Config {
    fn from_toml_read(mut read: impl Read) -> Result<Self, DepPieceError> {
        let mut data = String::new();
        read.read_to_string(&mut data)?;
        let config: Config = toml::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }
}

fn relativize_path(config_path: &Path, filename: &str) -> Result<String, DepPieceError> {
    if filename.is_empty() {
        return Ok(filename.to_owned());
    }

    let path = Path::new(&filename);

    // Don't touch absolute paths.
    if path.is_absolute() {
        return Ok(filename.to_owned());
    }

    let abs_config_path = config_path.canonicalize()?;
    Ok(abs_config_path
        .parent()
        .ok_or_else(|| {
            DepPieceError::RelativizePathError(format!(
                "Cannot get parent path of the configuration file: {}",
                abs_config_path.to_string_lossy()
            ))
        })?
        .join(path)
        .to_str()
        .ok_or_else(|| {
            DepPieceError::RelativizePathError(format!(
                "Cannot convert parent path to string: {}",
                abs_config_path.to_string_lossy()
            ))
        })?
        .to_owned())
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::config::{BatchConfig, Config, Input, Labels, Tokenizer, TomlRead};
    use crate::dataset::SequenceLength;
    use crate::error::DepPieceError;

    #[test]
    fn config() {
        let config =
            Config::from_toml_read(include_bytes!("../testdata/deppiece.conf").as_ref()).unwrap();

        assert_eq!(
            config,
            Config {
                input: Input {
                    tokenizer: Tokenizer::Bert {
                        vocab: "bert-base-cased-vocab.txt".to_string()
                    },
                },
                labels: Labels {
                    relations: "deppiece.relations".to_string()
                },
                batch: BatchConfig {
                    batch_size: 16,
                    ignore_index: -100,
                    pad_index: -1,
                    max_len: Some(SequenceLength::Pieces(512)),
                }
            }
        );
    }

    #[test]
    fn batch_section_is_optional() {
        let config =
            Config::from_toml_read(include_bytes!("../testdata/minimal.conf").as_ref()).unwrap();

        assert_eq!(
            config.input.tokenizer,
            Tokenizer::XlmRoberta {
                vocab: "sentencepiece.bpe.model".to_string()
            }
        );
        assert_eq!(config.batch, BatchConfig::default());
    }

    #[test]
    fn relative_paths_are_resolved() {
        let config_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata/minimal.conf");
        let mut config =
            Config::from_toml_read(include_bytes!("../testdata/minimal.conf").as_ref()).unwrap();
        config.relativize_paths(&config_path).unwrap();

        let testdata = config_path.canonicalize().unwrap();
        let testdata = testdata.parent().unwrap();
        assert_eq!(
            config.input.tokenizer,
            Tokenizer::XlmRoberta {
                vocab: testdata
                    .join("sentencepiece.bpe.model")
                    .to_string_lossy()
                    .into_owned()
            }
        );

        // Absolute paths are kept.
        assert_eq!(config.labels.relations, "/data/relations.txt");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let data = r#"
[input]
tokenizer = { bert = { vocab = "vocab.txt" } }

[labels]
relations = "relations.txt"
lemmas = "lemmas.txt"
"#;

        assert!(matches!(
            Config::from_toml_read(data.as_bytes()),
            Err(DepPieceError::TomlDeserializationError(_))
        ));
    }

    #[test]
    fn non_negative_sentinels_are_rejected() {
        let data = r#"
[input]
tokenizer = { bert = { vocab = "vocab.txt" } }

[labels]
relations = "relations.txt"

[batch]
pad_index = 0
max_len = { words = 100 }
"#;

        assert!(matches!(
            Config::from_toml_read(data.as_bytes()),
            Err(DepPieceError::IllegalConfigurationError(_))
        ));
    }
}
