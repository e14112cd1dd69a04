use std::io::{BufRead, BufWriter, Write};

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use deppiece::dataset::parse_record;
use deppiece_encoders::dependency::filter_missing_heads;
use deppiece_tokenizers::Tokenize;
use log::info;
use stdinout::{Input, Output};

use crate::io::{load_config, load_tokenizer};
use crate::traits::DepPieceApp;

const CONFIG: &str = "CONFIG";
const MAX_LEN: &str = "MAX_LEN";
const INPUT: &str = "INPUT";
const OUTPUT: &str = "OUTPUT";

pub struct FilterLenApp {
    config: String,
    input: Option<String>,
    max_len: usize,
    output: Option<String>,
}

impl FilterLenApp {
    fn process<R, W>(&self, tokenizer: &dyn Tokenize, read: R, mut write: W) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        let (mut n_kept, mut n_removed) = (0, 0);

        for (idx, line) in read.lines().enumerate() {
            let line = line.context("Cannot read annotation record")?;
            if line.trim().is_empty() {
                continue;
            }

            let sentence = filter_missing_heads(parse_record(idx + 1, &line)?);
            let tokenized = tokenizer
                .tokenize(&sentence.forms())
                .context(format!("Cannot tokenize sentence on line {}", idx + 1))?;

            if tokenized.len() <= self.max_len {
                writeln!(write, "{}", line).context("Cannot write annotation record")?;
                n_kept += 1;
            } else {
                n_removed += 1;
            }
        }

        info!(
            "Kept {} sentences, removed {} sentences longer than {} pieces",
            n_kept, n_removed, self.max_len
        );

        write.flush().context("Cannot flush output")?;

        Ok(())
    }
}

impl DepPieceApp for FilterLenApp {
    fn app() -> Command {
        Command::new("filter-len")
            .arg_required_else_help(true)
            .about("Filter annotations by the sentence length in pieces")
            .arg(
                Arg::new(CONFIG)
                    .help("Aligner configuration file")
                    .index(1)
                    .required(true),
            )
            .arg(
                Arg::new(MAX_LEN)
                    .help("Maximum sentence length")
                    .index(2)
                    .required(true),
            )
            .arg(Arg::new(INPUT).help("Input annotations").index(3))
            .arg(Arg::new(OUTPUT).help("Output annotations").index(4))
    }

    fn parse(matches: &ArgMatches) -> Result<Self> {
        let config = matches.get_one::<String>(CONFIG).unwrap().into();
        let max_len = matches
            .get_one::<String>(MAX_LEN)
            .unwrap()
            .parse()
            .context("Cannot parse maximum sentence length")?;
        let input = matches.get_one::<String>(INPUT).map(ToOwned::to_owned);
        let output = matches.get_one::<String>(OUTPUT).map(ToOwned::to_owned);

        Ok(FilterLenApp {
            config,
            input,
            max_len,
            output,
        })
    }

    fn run(&self) -> Result<()> {
        let config = load_config(&self.config)?;

        let tokenizer = load_tokenizer(&config)?;

        let input = Input::from(self.input.as_ref());
        let output = Output::from(self.output.as_ref());

        let read = input
            .buf_read()
            .context("Cannot open annotations for reading")?;
        let write = BufWriter::new(
            output
                .write()
                .context("Cannot open annotations for writing")?,
        );

        self.process(&*tokenizer, read, write)
    }
}
