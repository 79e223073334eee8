//! Line-range reads: `head`, `tail` and `middle`.
//!
//! Lines are split on the platform line separator (`\r\n` on Windows, `\n`
//! elsewhere) and handed out without it. Invalid UTF-8 is replaced with
//! U+FFFD rather than rejected.
//!
//! Each read comes in two shapes: a collecting one returning `Vec<String>`,
//! and an `*_each` one that streams lines to a callback as they are produced
//! and returns nothing.
//!
//! `tail` never loads more of the file than it needs: it walks backwards from
//! the end in [`TAIL_CHUNK_SIZE`] blocks until enough separators have been
//! seen.

use crate::error::{FileprobeError, Result};
use crate::platform::Platform;
use memchr::memmem;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::trace;

/// Block size for backward reads in [`LineReader::tail`].
pub const TAIL_CHUNK_SIZE: usize = 64 * 1024;

/// Default line count for `head` and `tail`.
pub const DEFAULT_LINE_COUNT: usize = 10;

/// Reads line ranges using a fixed separator.
#[derive(Debug, Clone)]
pub struct LineReader {
    separator: &'static [u8],
    chunk_size: usize,
}

impl LineReader {
    pub fn new(platform: &Platform) -> Self {
        Self {
            separator: platform.line_separator(),
            chunk_size: TAIL_CHUNK_SIZE,
        }
    }

    /// Overrides the backward read block size. Zero is bumped to one byte.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn separator(&self) -> &'static [u8] {
        self.separator
    }

    /// Returns the first `n` lines of `path`.
    pub fn head(&self, path: &Path, n: usize) -> Result<Vec<String>> {
        let mut lines = Vec::with_capacity(n.min(1024));
        self.head_each(path, n, |line| lines.push(line))?;
        Ok(lines)
    }

    /// Streams the first `n` lines of `path` to `sink`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `path` does not exist, even when `n` is zero.
    pub fn head_each<F>(&self, path: &Path, n: usize, mut sink: F) -> Result<()>
    where
        F: FnMut(String),
    {
        let file = open(path)?;
        if n == 0 {
            return Ok(());
        }

        let mut remaining = n;
        for_each_line(file, self.separator, |line| {
            sink(decode(line));
            remaining -= 1;
            remaining > 0
        })?;
        Ok(())
    }

    /// Returns lines `from..=to` of `path`, counting from 1.
    pub fn middle(&self, path: &Path, from: usize, to: usize) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        self.middle_each(path, from, to, |line| lines.push(line))?;
        Ok(lines)
    }

    /// Streams lines `from..=to` of `path` to `sink`, counting from 1.
    ///
    /// A range reaching past the end of the file is cut short.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `from` is zero or greater than `to`, and
    /// `NotFound` if `path` does not exist.
    pub fn middle_each<F>(&self, path: &Path, from: usize, to: usize, mut sink: F) -> Result<()>
    where
        F: FnMut(String),
    {
        if from == 0 || from > to {
            return Err(FileprobeError::InvalidInput(format!(
                "Invalid line range {}..{}: lines are numbered from 1 and the start must not exceed the end",
                from, to
            )));
        }

        let file = open(path)?;
        let mut number = 0usize;
        for_each_line(file, self.separator, |line| {
            number += 1;
            if number >= from {
                sink(decode(line));
            }
            number < to
        })?;
        Ok(())
    }

    /// Returns the last `n` lines of `path`.
    pub fn tail(&self, path: &Path, n: usize) -> Result<Vec<String>> {
        let mut lines = Vec::with_capacity(n.min(1024));
        self.tail_each(path, n, |line| lines.push(line))?;
        Ok(lines)
    }

    /// Streams the last `n` lines of `path` to `sink`, oldest first.
    ///
    /// A final line without a trailing separator is included.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `path` does not exist, even when `n` is zero.
    pub fn tail_each<F>(&self, path: &Path, n: usize, mut sink: F) -> Result<()>
    where
        F: FnMut(String),
    {
        let mut file = open(path)?;
        if n == 0 {
            return Ok(());
        }

        let buffer = self.read_tail_block(&mut file, n)?;

        let mut lines = split_lines(&buffer, self.separator);
        if lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }

        let skip = lines.len().saturating_sub(n);
        for line in &lines[skip..] {
            sink(decode(line));
        }
        Ok(())
    }

    /// Reads backwards from the end of `file` until the collected bytes hold
    /// more than `n` separators or the start of the file is reached.
    fn read_tail_block(&self, file: &mut File, n: usize) -> Result<Vec<u8>> {
        let sep = self.separator;
        let finder = memmem::Finder::new(sep);
        let mut position = file.metadata()?.len();

        // Newest block first
        let mut blocks: Vec<Vec<u8>> = Vec::new();
        let mut separators = 0usize;

        while position > 0 && separators <= n {
            let block_len = (self.chunk_size as u64).min(position);
            position -= block_len;

            file.seek(SeekFrom::Start(position))?;
            let mut block = vec![0u8; block_len as usize];
            file.read_exact(&mut block)?;

            separators += finder.find_iter(&block).count();

            // A multi-byte separator may straddle this block and the next one
            if let Some(next) = blocks.last() {
                let overlap = sep.len() - 1;
                if overlap > 0 {
                    let mut seam = block[block.len().saturating_sub(overlap)..].to_vec();
                    seam.extend_from_slice(&next[..overlap.min(next.len())]);
                    separators += finder.find_iter(&seam).count();
                }
            }

            trace!(position, block_len, separators, "read tail block");
            blocks.push(block);
        }

        blocks.reverse();
        Ok(blocks.concat())
    }
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new(&Platform::current())
    }
}

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|err| FileprobeError::from_io(err, path))
}

fn decode(line: &[u8]) -> String {
    String::from_utf8_lossy(line).into_owned()
}

/// Splits `data` on every occurrence of `sep`. Always yields at least one
/// (possibly empty) slice.
fn split_lines<'a>(data: &'a [u8], sep: &[u8]) -> Vec<&'a [u8]> {
    let mut lines = Vec::new();
    let mut start = 0;
    for pos in memmem::find_iter(data, sep) {
        lines.push(&data[start..pos]);
        start = pos + sep.len();
    }
    lines.push(&data[start..]);
    lines
}

/// Feeds each `sep`-terminated line of `reader` to `visit` until it returns
/// `false`. A trailing unterminated line is delivered too.
fn for_each_line<R, F>(reader: R, sep: &[u8], mut visit: F) -> Result<()>
where
    R: Read,
    F: FnMut(&[u8]) -> bool,
{
    let finder = memmem::Finder::new(sep);
    let mut reader = BufReader::new(reader);
    let mut pending: Vec<u8> = Vec::new();
    // No separator starts before this offset of `pending`
    let mut scanned = 0;

    loop {
        let chunk = reader.fill_buf()?;
        if chunk.is_empty() {
            break;
        }
        let consumed = chunk.len();
        pending.extend_from_slice(chunk);
        reader.consume(consumed);

        let mut start = 0;
        let mut from = scanned;
        while let Some(pos) = finder.find(&pending[from..]) {
            let end = from + pos;
            if !visit(&pending[start..end]) {
                return Ok(());
            }
            start = end + sep.len();
            from = start;
        }
        pending.drain(..start);
        scanned = pending.len().saturating_sub(sep.len() - 1);
    }

    if !pending.is_empty() {
        visit(&pending);
    }
    Ok(())
}

/// [`LineReader::head`] for the current platform.
pub fn head(path: &Path, n: usize) -> Result<Vec<String>> {
    LineReader::default().head(path, n)
}

/// [`LineReader::tail`] for the current platform.
pub fn tail(path: &Path, n: usize) -> Result<Vec<String>> {
    LineReader::default().tail(path, n)
}

/// [`LineReader::middle`] for the current platform.
pub fn middle(path: &Path, from: usize, to: usize) -> Result<Vec<String>> {
    LineReader::default().middle(path, from, to)
}
