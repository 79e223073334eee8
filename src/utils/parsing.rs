//! Parsing utilities for fileprobe.
//!
//! Command-line values arrive as strings; this module turns them into the
//! typed arguments the operations take:
//! - Line counts (e.g., "10", "0x20"), rejecting negatives
//! - Line ranges for `middle` (e.g., "10..20", "5", "100..")
/// src/utils/parsing.rs
use crate::error::{FileprobeError, Result};

/// Parses a line count.
///
/// # Errors
/// Returns `FileprobeError::InvalidInput` for negative or malformed counts.
///
/// # Examples
/// ```ignore
/// assert_eq!(parse_count("25")?, 25);
/// assert!(parse_count("-1").is_err());
/// ```
pub fn parse_count(s: &str) -> Result<usize> {
    let s = s.trim();
    if s.starts_with('-') {
        return Err(FileprobeError::InvalidInput(format!(
            "Line count cannot be negative: '{}'",
            s
        )));
    }
    parse_number(s)
}

/// Parses a 1-based, inclusive line range.
///
/// # Range Syntax
/// - `"10"` → Line 10 only (returns `(10, 10)`)
/// - `"10..20"` → Lines 10 through 20 (returns `(10, 20)`)
/// - `"..20"` → Lines 1 through 20 (returns `(1, 20)`)
/// - `"10.."` → Line 10 to the end of the file (returns `(10, usize::MAX)`)
///
/// # Errors
/// Returns `FileprobeError::InvalidInput` if the range is malformed, starts
/// at 0, or ends before it starts.
pub fn parse_line_range(range: &str) -> Result<(usize, usize)> {
    let range = range.trim();

    let (from, to) = match range.split_once("..") {
        Some((start, end)) => {
            if end.contains("..") {
                return Err(FileprobeError::InvalidInput(format!(
                    "Invalid range format: '{}'. Expected 'from..to', '..to', 'from..', or a single line",
                    range
                )));
            }
            let from = if start.trim().is_empty() {
                1
            } else {
                parse_count(start)?
            };
            let to = if end.trim().is_empty() {
                usize::MAX
            } else {
                parse_count(end)?
            };
            (from, to)
        }
        None => {
            let line = parse_count(range)?;
            (line, line)
        }
    };

    if from == 0 {
        return Err(FileprobeError::InvalidInput(
            "Line numbers start at 1".to_string(),
        ));
    }
    if from > to {
        return Err(FileprobeError::InvalidInput(format!(
            "Range start {} is past its end {}",
            from, to
        )));
    }

    Ok((from, to))
}

/// Parses a number from a string, supporting decimal and `0x` hexadecimal.
fn parse_number(s: &str) -> Result<usize> {
    let s = s.trim();
    if s.is_empty() {
        return Err(FileprobeError::InvalidInput(
            "Empty number string".to_string(),
        ));
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        usize::from_str_radix(hex, 16).map_err(|e| {
            FileprobeError::InvalidInput(format!("Invalid hexadecimal number '{}': {}", s, e))
        })
    } else {
        s.parse::<usize>().map_err(|e| {
            FileprobeError::InvalidInput(format!("Invalid decimal number '{}': {}", s, e))
        })
    }
}
