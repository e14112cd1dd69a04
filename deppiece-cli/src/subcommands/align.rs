use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};

use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use deppiece::align::BatchAligner;
use deppiece::config::BatchConfig;
use deppiece::dataset::{AlignedBatches, JsonlDataSet};
use log::info;
use stdinout::{Input, Output};

use crate::io::{load_config, load_relations, load_tokenizer};
use crate::progress::{read_progress, AlignSpeed};
use crate::traits::DepPieceApp;

const CONFIG: &str = "CONFIG";
const INPUT: &str = "INPUT";
const NUM_THREADS: &str = "NUM_THREADS";
const OUTPUT: &str = "OUTPUT";

pub struct AlignApp {
    config: String,
    input: Option<String>,
    num_threads: usize,
    output: Option<String>,
}

impl AlignApp {
    fn open_input(&self) -> Result<Box<dyn BufRead>> {
        match self.input {
            Some(ref path) => {
                let f = File::open(path).context(format!("Cannot open input file: {}", path))?;
                Ok(Box::new(BufReader::new(read_progress(f)?)))
            }
            None => {
                let input = Input::from(self.input.as_ref());
                Ok(Box::new(
                    input.buf_read().context("Cannot open input for reading")?,
                ))
            }
        }
    }

    fn process<R, W>(
        &self,
        aligner: &BatchAligner,
        batch_config: &BatchConfig,
        read: R,
        mut write: W,
    ) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        let mut speed = AlignSpeed::new();

        let sentences = JsonlDataSet::new(read).sentences();
        let mut batches = AlignedBatches::new(aligner, sentences, batch_config.batch_size)
            .max_len(batch_config.max_len)
            .parallel(self.num_threads != 1);

        for (batch_idx, batch) in (&mut batches).enumerate() {
            let batch = batch.context(format!("Cannot align batch {}", batch_idx))?;

            for record in batch.records() {
                serde_json::to_writer(&mut write, &record)
                    .context("Cannot write aligned sentence")?;
                writeln!(write).context("Cannot write aligned sentence")?;
            }

            speed.count_batch(&batch);
        }

        if batches.n_skipped() > 0 {
            info!(
                "Skipped {} sentences that exceed the maximum length",
                batches.n_skipped()
            );
        }

        write.flush().context("Cannot flush output")?;

        Ok(())
    }
}

impl DepPieceApp for AlignApp {
    fn app() -> Command {
        Command::new("align")
            .arg_required_else_help(true)
            .about("Align dependency annotations with pieces")
            .arg(
                Arg::new(CONFIG)
                    .help("Aligner configuration file")
                    .index(1)
                    .required(true),
            )
            .arg(Arg::new(INPUT).help("Input annotations").index(2))
            .arg(Arg::new(OUTPUT).help("Output batches").index(3))
            .arg(
                Arg::new(NUM_THREADS)
                    .help("Alignment threads (0: one per logical CPU)")
                    .long("threads")
                    .value_name("N")
                    .default_value("0"),
            )
    }

    fn parse(matches: &ArgMatches) -> Result<Self> {
        let config = matches.get_one::<String>(CONFIG).unwrap().into();
        let input = matches.get_one::<String>(INPUT).map(ToOwned::to_owned);
        let num_threads = matches
            .get_one::<String>(NUM_THREADS)
            .unwrap()
            .parse()
            .context("Cannot parse number of alignment threads")?;
        let output = matches.get_one::<String>(OUTPUT).map(ToOwned::to_owned);

        Ok(AlignApp {
            config,
            input,
            num_threads,
            output,
        })
    }

    fn run(&self) -> Result<()> {
        // Rayon threads.
        rayon::ThreadPoolBuilder::new()
            .num_threads(self.num_threads)
            .build_global()
            .context("Cannot set up alignment threads")?;

        let config = load_config(&self.config)?;
        let tokenizer = load_tokenizer(&config)?;
        let relations = load_relations(&config)?;

        let aligner = BatchAligner::new(&*tokenizer, &relations)
            .ignore_index(config.batch.ignore_index)
            .pad_index(config.batch.pad_index);

        let read = self.open_input()?;

        let output = Output::from(self.output.as_ref());
        let write = BufWriter::new(output.write().context("Cannot open output for writing")?);

        self.process(&aligner, &config.batch, read, write)
    }
}
