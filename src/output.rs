//! Walk corpus output.
//!
//! Each worker streams its walks into private part files; after the final
//! pass the parts are concatenated in-process into a single corpus. The
//! binary corpus holds fixed-length little-endian `i32[walk_length]` records,
//! so only full-length walks land there; the optional text mirror keeps
//! truncated (non-empty) walks too, one whitespace-separated walk per line.

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Final corpus file name (binary records)
pub const CORPUS_BIN: &str = "walks.bin";
/// Final corpus file name (text mirror)
pub const CORPUS_TEXT: &str = "walks.txt";

fn bin_part(dir: &Path, worker: usize) -> PathBuf {
    dir.join(format!("{CORPUS_BIN}.part{worker}"))
}

fn text_part(dir: &Path, worker: usize) -> PathBuf {
    dir.join(format!("{CORPUS_TEXT}.part{worker}"))
}

/// Buffered per-worker corpus writer.
pub struct CorpusWriter {
    bin: BufWriter<File>,
    text: Option<BufWriter<File>>,
    walk_length: usize,
}

impl CorpusWriter {
    /// Create (truncating) the part files for `worker` under `dir`.
    ///
    /// # Errors
    ///
    /// Returns any underlying file-creation error.
    pub fn create(
        dir: &Path,
        worker: usize,
        walk_length: usize,
        text_mirror: bool,
    ) -> io::Result<Self> {
        let bin = BufWriter::new(File::create(bin_part(dir, worker))?);
        let text = if text_mirror {
            Some(BufWriter::new(File::create(text_part(dir, worker))?))
        } else {
            None
        };
        Ok(Self {
            bin,
            text,
            walk_length,
        })
    }

    /// Append one walk.
    ///
    /// Full-length walks become one binary record; shorter non-empty walks
    /// appear only in the text mirror; empty walks are dropped entirely.
    ///
    /// # Errors
    ///
    /// Returns any underlying write error.
    pub fn write_walk(&mut self, walk: &[u32]) -> io::Result<()> {
        if walk.len() == self.walk_length {
            for &vertex in walk {
                #[allow(clippy::cast_possible_wrap)]
                self.bin.write_all(&(vertex as i32).to_le_bytes())?;
            }
        }
        if let Some(text) = &mut self.text {
            if !walk.is_empty() {
                let mut line = String::with_capacity(walk.len() * 8);
                for (i, vertex) in walk.iter().enumerate() {
                    if i > 0 {
                        line.push(' ');
                    }
                    line.push_str(&vertex.to_string());
                }
                line.push('\n');
                text.write_all(line.as_bytes())?;
            }
        }
        Ok(())
    }

    /// Flush and close the part files.
    ///
    /// # Errors
    ///
    /// Returns any flush error.
    pub fn finish(mut self) -> io::Result<()> {
        self.bin.flush()?;
        if let Some(mut text) = self.text.take() {
            text.flush()?;
        }
        Ok(())
    }
}

/// Paths of the merged corpus files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusPaths {
    /// Merged binary corpus
    pub binary: PathBuf,
    /// Merged text mirror, when enabled
    pub text: Option<PathBuf>,
}

/// Concatenate the per-worker part files under `dir` into the final corpus,
/// removing the parts. Workers that never ran leave no part; those slots are
/// skipped.
///
/// # Errors
///
/// Returns any underlying I/O error; partial merges leave the written prefix
/// behind.
pub fn merge_parts(dir: &Path, workers: usize, text_mirror: bool) -> io::Result<CorpusPaths> {
    let binary = dir.join(CORPUS_BIN);
    concat_parts(&binary, (0..workers).map(|w| bin_part(dir, w)))?;

    let text = if text_mirror {
        let path = dir.join(CORPUS_TEXT);
        concat_parts(&path, (0..workers).map(|w| text_part(dir, w)))?;
        Some(path)
    } else {
        None
    };

    debug!(corpus = %binary.display(), workers, "merged worker corpus parts");
    Ok(CorpusPaths { binary, text })
}

fn concat_parts(target: &Path, parts: impl Iterator<Item = PathBuf>) -> io::Result<()> {
    let mut out = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(target)?,
    );
    for part in parts {
        let mut file = match File::open(&part) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => return Err(err),
        };
        io::copy(&mut file, &mut out)?;
        std::fs::remove_file(&part)?;
    }
    out.flush()
}
