use std::fs::File;
use std::time::Instant;

use anyhow::{Context, Result};
use deppiece::batch::AlignedBatch;
use indicatif::{ProgressBar, ProgressBarIter, ProgressStyle};

/// Wrap `file` in a reader that shows how much of it was read.
pub fn read_progress(file: File) -> Result<ProgressBarIter<File>> {
    let len = file
        .metadata()
        .context("Cannot get length of input file")?
        .len();

    let progress_bar = ProgressBar::new(len).with_style(
        ProgressStyle::default_bar()
            .template("[Time: {elapsed_precise}, ETA: {eta_precise}] {bar} {percent}%")
            .context("Invalid progress bar template")?,
    );

    Ok(progress_bar.wrap_read(file))
}

/// Measure the number of sentences aligned per second.
///
/// The speed is logged when the instance is dropped.
pub struct AlignSpeed {
    start: Instant,
    n_sentences: usize,
    n_pieces: usize,
}

impl AlignSpeed {
    pub fn new() -> Self {
        AlignSpeed {
            start: Instant::now(),
            n_sentences: 0,
            n_pieces: 0,
        }
    }

    /// Count the sentences and pieces of an aligned batch.
    pub fn count_batch(&mut self, batch: &AlignedBatch) {
        self.n_sentences += batch.len();
        self.n_pieces += batch.seq_lens.sum() as usize;
    }
}

impl Default for AlignSpeed {
    fn default() -> Self {
        AlignSpeed::new()
    }
}

impl Drop for AlignSpeed {
    fn drop(&mut self) {
        let elapsed_secs = self.start.elapsed().as_secs_f32();
        log::info!(
            "Aligned {} sentences ({} pieces) in {:.1}s ({:.1} sents/s)",
            self.n_sentences,
            self.n_pieces,
            elapsed_secs,
            self.n_sentences as f32 / elapsed_secs
        );
    }
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};
    use std::io::Read;
    use std::path::Path;

    use super::read_progress;

    #[test]
    fn progress_reader_reads_whole_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");

        let mut read = read_progress(File::open(&path).unwrap()).unwrap();
        let mut data = String::new();
        read.read_to_string(&mut data).unwrap();

        assert_eq!(data, fs::read_to_string(&path).unwrap());
    }
}
