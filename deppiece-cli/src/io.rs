use std::fs::File;

use anyhow::{Context, Result};
use deppiece::config::{Config, TomlRead};
use deppiece_encoders::dependency::RelationVocab;
use deppiece_tokenizers::Tokenize;
use log::info;

pub fn load_config(config_path: &str) -> Result<Config> {
    let config_file = File::open(config_path)
        .context(format!("Cannot open configuration file '{}'", &config_path))?;
    let mut config = Config::from_toml_read(config_file)
        .context(format!("Cannot parse configuration file: {}", config_path))?;
    config.relativize_paths(config_path).context(format!(
        "Cannot relativize paths in configuration file: {}",
        config_path
    ))?;

    Ok(config)
}

pub fn load_relations(config: &Config) -> Result<RelationVocab> {
    let relations = config.relations().context(format!(
        "Cannot read relation vocabulary: {}",
        config.labels.relations
    ))?;

    info!(
        "Loaded {} dependency relations from '{}'",
        relations.len(),
        config.labels.relations
    );

    Ok(relations)
}

pub fn load_tokenizer(config: &Config) -> Result<Box<dyn Tokenize>> {
    config
        .tokenizer()
        .context("Cannot read tokenizer vocabulary")
}
