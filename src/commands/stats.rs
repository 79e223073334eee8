//! File statistics: `wc`-style counts and sparse-file detection.
//!
//! Counting is done in a single streaming pass. Bytes are counted raw; the
//! remaining counts run over text decoded with the encoding named by a
//! leading byte order mark (UTF-8 when there is none), so multi-byte
//! characters count once.
//!
//! Filesystem errors from `wc` are propagated; a missing file is
//! [`FileprobeError::NotFound`].

use crate::commands::signature::advisory;
use crate::error::{FileprobeError, Result};
use encoding_rs::{CoderResult, Encoding, UTF_8};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::trace;

const READ_BLOCK: usize = 8 * 1024;

/// Size of the unit `st_blocks` is expressed in.
pub const STAT_BLOCK_SIZE: u64 = 512;

/// What [`wc`] should count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WcMode {
    Bytes,
    Chars,
    Words,
    Lines,
    /// All four counts at once
    #[default]
    All,
}

impl WcMode {
    /// Parses a mode name (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the mode is not recognized.
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "bytes" => Ok(WcMode::Bytes),
            "chars" | "characters" => Ok(WcMode::Chars),
            "words" => Ok(WcMode::Words),
            "lines" => Ok(WcMode::Lines),
            "all" => Ok(WcMode::All),
            _ => Err(FileprobeError::InvalidInput(format!(
                "Invalid option: '{}'. Supported: all, bytes, characters, chars, words, lines",
                s
            ))),
        }
    }
}

/// The four `wc` counts, in `bytes, chars, words, lines` order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileStats {
    pub bytes: u64,
    pub chars: u64,
    pub words: u64,
    pub lines: u64,
}

impl FileStats {
    pub fn as_tuple(&self) -> (u64, u64, u64, u64) {
        (self.bytes, self.chars, self.words, self.lines)
    }

    /// Picks the count for `mode`.
    pub fn select(&self, mode: WcMode) -> WcCount {
        match mode {
            WcMode::Bytes => WcCount::Single(self.bytes),
            WcMode::Chars => WcCount::Single(self.chars),
            WcMode::Words => WcCount::Single(self.words),
            WcMode::Lines => WcCount::Single(self.lines),
            WcMode::All => WcCount::All(*self),
        }
    }
}

/// Result of [`wc`]: one count, or all four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum WcCount {
    Single(u64),
    All(FileStats),
}

/// Counts bytes, characters, words or lines of `path`.
///
/// Lines are `\n` terminators; words are maximal runs of non-whitespace.
///
/// # Errors
///
/// Returns `NotFound` for a missing file and `Io` for other read failures.
pub fn wc(path: &Path, mode: WcMode) -> Result<WcCount> {
    if mode == WcMode::Bytes {
        return Ok(WcCount::Single(byte_count(path)?));
    }
    Ok(file_stats(path)?.select(mode))
}

/// Byte count of `path`, failing wherever [`file_stats`] would.
///
/// Regular files answer from metadata. Anything else is read through, so a
/// directory errors out and a pseudo-file reporting size zero still counts.
fn byte_count(path: &Path) -> Result<u64> {
    let mut file = File::open(path).map_err(|err| FileprobeError::from_io(err, path))?;
    let metadata = file.metadata()?;
    if metadata.is_file() && metadata.len() > 0 {
        return Ok(metadata.len());
    }
    Ok(std::io::copy(&mut file, &mut std::io::sink())?)
}

/// Computes all four counts of `path` in one pass.
pub fn file_stats(path: &Path) -> Result<FileStats> {
    let mut file = File::open(path).map_err(|err| FileprobeError::from_io(err, path))?;
    let mut counter = TextCounter::default();
    let mut decoder: Option<encoding_rs::Decoder> = None;
    let mut decoded = String::with_capacity(READ_BLOCK * 3);
    let mut block = vec![0u8; READ_BLOCK];
    let mut bytes = 0u64;

    loop {
        let read = file.read(&mut block)?;
        let last = read == 0;
        bytes += read as u64;

        // The first block decides the encoding
        let decoder = decoder.get_or_insert_with(|| {
            let encoding = Encoding::for_bom(&block[..read])
                .map(|(encoding, _)| encoding)
                .unwrap_or(UTF_8);
            encoding.new_decoder_with_bom_removal()
        });

        let mut input = &block[..read];
        loop {
            decoded.clear();
            let (result, consumed, _had_errors) =
                decoder.decode_to_string(input, &mut decoded, last);
            counter.feed(&decoded);
            input = &input[consumed..];
            if result == CoderResult::InputEmpty {
                break;
            }
        }

        if last {
            break;
        }
    }

    let stats = FileStats {
        bytes,
        chars: counter.chars,
        words: counter.words,
        lines: counter.lines,
    };
    trace!(path = %path.display(), ?stats, "counted");
    Ok(stats)
}

/// Returns whether `path` occupies fewer blocks than its apparent size needs.
///
/// Always `false` where the platform has no block count.
///
/// # Errors
///
/// Returns `NotFound` if `path` does not exist; any other metadata failure
/// yields `false`.
pub fn sparse(path: &Path) -> Result<bool> {
    let Some(metadata) = advisory(path, std::fs::metadata(path))? else {
        return Ok(false);
    };
    Ok(is_sparse(&metadata))
}

#[cfg(unix)]
fn is_sparse(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    metadata.size() > metadata.blocks() * STAT_BLOCK_SIZE
}

#[cfg(not(unix))]
fn is_sparse(_metadata: &std::fs::Metadata) -> bool {
    false
}

#[derive(Debug, Default)]
struct TextCounter {
    chars: u64,
    words: u64,
    lines: u64,
    in_word: bool,
}

impl TextCounter {
    fn feed(&mut self, text: &str) {
        for c in text.chars() {
            self.chars += 1;
            if c == '\n' {
                self.lines += 1;
            }
            if c.is_whitespace() {
                self.in_word = false;
            } else if !self.in_word {
                self.in_word = true;
                self.words += 1;
            }
        }
    }
}
