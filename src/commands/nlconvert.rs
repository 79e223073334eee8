//! # Line Ending Conversion
//!
//! Rewrites a text file so every line ends with the terminator of a target
//! platform, in the spirit of `dos2unix` / `unix2dos`.
//!
//! ## Platform Names
//!
//! | Names (case-insensitive) | Terminator |
//! |--------------------------|------------|
//! | `dos`, `windows`, `win32`, `mswin`, `cygwin`, `mingw` | CRLF (`\r\n`) |
//! | `unix`, `linux`, `bsd`, `osx`, `darwin`, `macos`, `solaris`, `sunos` | LF (`\n`) |
//! | `mac`, `apple`, `macintosh` | CR (`\r`) - Classic Mac OS |
//! | `local` | whatever the running platform uses |
//!
//! Input lines may end in any of the three terminators, mixed freely. The
//! last line gets a terminator even if the source had none.
//!
//! Converting a file onto itself goes through a temporary file in the same
//! directory that replaces the source only after it has been fully written.

use crate::error::{FileprobeError, Result};
use crate::platform::{OsFamily, Platform};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

const READ_BLOCK: usize = 8 * 1024;

/// Target line terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// CRLF (`\r\n`)
    Dos,
    /// LF (`\n`)
    Unix,
    /// CR (`\r`)
    Mac,
}

impl LineEnding {
    /// Resolves a platform name to its line ending.
    ///
    /// `local` maps to the native ending of `platform`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the name is not recognized.
    pub fn for_platform(name: &str, platform: &Platform) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "dos" | "windows" | "win32" | "mswin" | "cygwin" | "mingw" => Ok(LineEnding::Dos),
            "unix" | "linux" | "bsd" | "osx" | "darwin" | "macos" | "solaris" | "sunos" => {
                Ok(LineEnding::Unix)
            }
            "mac" | "apple" | "macintosh" => Ok(LineEnding::Mac),
            "local" => Ok(Self::native(platform)),
            _ => Err(FileprobeError::InvalidInput(format!(
                "Invalid platform string: '{}'. Supported: dos, unix, mac, local",
                name
            ))),
        }
    }

    /// Native ending of `platform`.
    pub fn native(platform: &Platform) -> Self {
        match platform.family() {
            OsFamily::Windows => LineEnding::Dos,
            OsFamily::Unix => LineEnding::Unix,
        }
    }

    /// Get the terminator byte sequence.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineEnding::Dos => b"\r\n",
            LineEnding::Unix => b"\n",
            LineEnding::Mac => b"\r",
        }
    }
}

/// Converts the line endings of `source` to `ending`.
///
/// The result goes to `dest`, or replaces `source` when `dest` is `None`.
/// A `dest` that is the same file as `source` (same path, symlink or hard
/// link) is rewritten through a temporary file, never truncated in place.
/// Symlinks are followed, so the link target receives the new content.
///
/// # Errors
///
/// - `NotFound` if `source` does not exist
/// - `NotAPlainFile` if `source` is a directory, device or similar
/// - `Io` for read/write failures; a replacing conversion leaves the target
///   untouched in that case
pub fn nl_convert(source: &Path, dest: Option<&Path>, ending: LineEnding) -> Result<()> {
    let metadata = std::fs::metadata(source).map_err(|err| FileprobeError::from_io(err, source))?;
    if !metadata.is_file() {
        return Err(FileprobeError::NotAPlainFile(source.to_path_buf()));
    }

    let target = dest.unwrap_or(source);
    let replace = dest.is_none() || target == source || same_file(source, target);

    let input = File::open(source).map_err(|err| FileprobeError::from_io(err, source))?;

    if !replace {
        let output = File::create(target)?;
        let mut writer = BufWriter::new(output);
        convert_stream(BufReader::new(input), &mut writer, ending)?;
        writer.flush()?;
        debug!(source = %source.display(), dest = %target.display(), ?ending, "converted line endings");
        return Ok(());
    }

    // Rename onto the resolved file, not onto a symlink pointing at it
    let target = target
        .canonicalize()
        .map_err(|err| FileprobeError::from_io(err, target))?;
    let dir = target
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        convert_stream(BufReader::new(input), &mut writer, ending)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    std::fs::set_permissions(temp.path(), metadata.permissions())?;

    // Dropping `temp` on any earlier error removes it
    temp.persist(&target).map_err(|err| FileprobeError::Io(err.error))?;
    debug!(source = %source.display(), target = %target.display(), ?ending, "converted line endings through temp file");
    Ok(())
}

/// Copies `reader` to `writer`, replacing every CRLF, LF or lone CR with
/// `ending`. Returns the number of lines written.
pub fn convert_stream<R, W>(mut reader: R, writer: &mut W, ending: LineEnding) -> Result<u64>
where
    R: Read,
    W: Write,
{
    let terminator = ending.as_bytes();
    let mut block = vec![0u8; READ_BLOCK];
    let mut lines = 0u64;
    // Last byte seen was a CR, so a following LF belongs to the same terminator
    let mut after_cr = false;
    // Bytes written since the last terminator
    let mut open_line = false;

    loop {
        let read = reader.read(&mut block)?;
        if read == 0 {
            break;
        }

        let mut start = 0;
        for (i, &byte) in block[..read].iter().enumerate() {
            match byte {
                b'\r' | b'\n' => {
                    writer.write_all(&block[start..i])?;
                    start = i + 1;
                    if byte == b'\n' && after_cr {
                        after_cr = false;
                        continue;
                    }
                    writer.write_all(terminator)?;
                    lines += 1;
                    after_cr = byte == b'\r';
                    open_line = false;
                }
                _ => {
                    after_cr = false;
                    open_line = true;
                }
            }
        }
        writer.write_all(&block[start..read])?;
    }

    if open_line {
        writer.write_all(terminator)?;
        lines += 1;
    }
    Ok(lines)
}

/// Whether `a` and `b` name the same file, through symlinks and hard links.
#[cfg(unix)]
fn same_file(a: &Path, b: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;
    match (std::fs::metadata(a), std::fs::metadata(b)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// [`nl_convert`] with a platform name, resolved against the current platform.
pub fn nl_convert_named(source: &Path, dest: Option<&Path>, platform: &str) -> Result<()> {
    let ending = LineEnding::for_platform(platform, &Platform::current())?;
    nl_convert(source, dest, ending)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn convert_bytes(input: &[u8], ending: LineEnding) -> Vec<u8> {
        let mut output = Vec::new();
        convert_stream(input, &mut output, ending).unwrap();
        output
    }

    fn ten_lines(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        let content: String = (0..10).map(|n| format!("line {}\n", n)).collect();
        std::fs::write(&path, content).unwrap();
        path
    }

    // ------------------------------------------------------------------------
    // Platform Names
    // ------------------------------------------------------------------------

    #[test]
    fn test_for_platform() {
        let unix = Platform::unix();
        assert_eq!(LineEnding::for_platform("dos", &unix).unwrap().as_bytes(), b"\r\n");
        assert_eq!(LineEnding::for_platform("unix", &unix).unwrap().as_bytes(), b"\n");
        assert_eq!(LineEnding::for_platform("mac", &unix).unwrap().as_bytes(), b"\r");
        assert_eq!(LineEnding::for_platform("MSWin", &unix).unwrap(), LineEnding::Dos);
        assert_eq!(LineEnding::for_platform("Linux", &unix).unwrap(), LineEnding::Unix);
        assert_eq!(LineEnding::for_platform("darwin", &unix).unwrap(), LineEnding::Unix);
        assert_eq!(LineEnding::for_platform("macintosh", &unix).unwrap(), LineEnding::Mac);
    }

    #[test]
    fn test_for_platform_local() {
        assert_eq!(
            LineEnding::for_platform("local", &Platform::unix()).unwrap(),
            LineEnding::Unix
        );
        assert_eq!(
            LineEnding::for_platform("local", &Platform::windows(None)).unwrap(),
            LineEnding::Dos
        );
    }

    #[test]
    fn test_for_platform_invalid() {
        assert!(matches!(
            LineEnding::for_platform("bogus", &Platform::unix()),
            Err(FileprobeError::InvalidInput(_))
        ));
    }

    // ------------------------------------------------------------------------
    // Stream Conversion
    // ------------------------------------------------------------------------

    #[test]
    fn test_convert_stream_mixed_input() {
        let input = b"a\r\nb\nc\rd";
        assert_eq!(convert_bytes(input, LineEnding::Unix), b"a\nb\nc\nd\n");
        assert_eq!(convert_bytes(input, LineEnding::Dos), b"a\r\nb\r\nc\r\nd\r\n");
        assert_eq!(convert_bytes(input, LineEnding::Mac), b"a\rb\rc\rd\r");
    }

    #[test]
    fn test_convert_stream_blank_lines() {
        assert_eq!(convert_bytes(b"\n\r\n\r", LineEnding::Unix), b"\n\n\n");
        assert_eq!(convert_bytes(b"", LineEnding::Dos), b"");
    }

    #[test]
    fn test_crlf_split_across_blocks() {
        let mut input = vec![b'x'; READ_BLOCK - 1];
        input.extend_from_slice(b"\r\nyz\r\n");
        let output = convert_bytes(&input, LineEnding::Unix);

        let mut expected = vec![b'x'; READ_BLOCK - 1];
        expected.extend_from_slice(b"\nyz\n");
        assert_eq!(output, expected);
    }

    #[test]
    fn test_line_count() {
        let mut sink = Vec::new();
        let lines = convert_stream(&b"one\ntwo\nthree"[..], &mut sink, LineEnding::Dos).unwrap();
        assert_eq!(lines, 3);
    }

    // ------------------------------------------------------------------------
    // File Conversion
    // ------------------------------------------------------------------------

    #[test]
    fn test_nl_convert_dos() {
        let dir = TempDir::new().unwrap();
        let source = ten_lines(&dir, "test_nl_convert1.txt");
        let dest = dir.path().join("dos_test_file.txt");

        nl_convert(&source, Some(&dest), LineEnding::Dos).unwrap();
        let converted = std::fs::read(&dest).unwrap();
        assert!(converted.len() > std::fs::metadata(&source).unwrap().len() as usize);
        assert!(converted.starts_with(b"line 0\r\n"));
        assert_eq!(converted.iter().filter(|&&b| b == b'\n').count(), 10);
        assert_eq!(converted.windows(2).filter(|w| *w == b"\r\n").count(), 10);
    }

    #[test]
    fn test_nl_convert_mac_and_unix() {
        let dir = TempDir::new().unwrap();
        let source = ten_lines(&dir, "test_nl_convert1.txt");
        let mac = dir.path().join("mac_test_file.txt");
        let unix = dir.path().join("unix_test_file.txt");

        nl_convert(&source, Some(&mac), LineEnding::Mac).unwrap();
        let converted = std::fs::read(&mac).unwrap();
        assert!(!converted.contains(&b'\n'));
        assert!(converted.ends_with(b"line 9\r"));
        assert_eq!(converted.len() as u64, std::fs::metadata(&source).unwrap().len());

        nl_convert(&mac, Some(&unix), LineEnding::Unix).unwrap();
        assert_eq!(std::fs::read(&unix).unwrap(), std::fs::read(&source).unwrap());
    }

    #[test]
    fn test_nl_convert_in_place() {
        let dir = TempDir::new().unwrap();
        let source = ten_lines(&dir, "test_nl_convert2.txt");

        nl_convert(&source, None, LineEnding::Dos).unwrap();
        let converted = std::fs::read(&source).unwrap();
        assert_eq!(converted.windows(2).filter(|w| *w == b"\r\n").count(), 10);

        // Same path given explicitly
        nl_convert(&source, Some(&source), LineEnding::Unix).unwrap();
        let restored = std::fs::read_to_string(&source).unwrap();
        assert!(restored.starts_with("line 0\nline 1\n"));
        assert!(!restored.contains('\r'));

        // No temp files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_nl_convert_in_place_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let source = ten_lines(&dir, "script.sh");
        std::fs::set_permissions(&source, std::fs::Permissions::from_mode(0o750)).unwrap();

        nl_convert(&source, None, LineEnding::Dos).unwrap();
        let mode = std::fs::metadata(&source).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }

    #[cfg(unix)]
    #[test]
    fn test_nl_convert_hard_link_dest_keeps_content() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        let linked = dir.path().join("b.txt");
        std::fs::write(&source, "one\ntwo\n").unwrap();
        std::fs::hard_link(&source, &linked).unwrap();

        nl_convert(&source, Some(&linked), LineEnding::Dos).unwrap();
        assert_eq!(std::fs::read(&linked).unwrap(), b"one\r\ntwo\r\n");
        // The rename detaches the destination; the source keeps its bytes
        assert_eq!(std::fs::read(&source).unwrap(), b"one\ntwo\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn test_nl_convert_in_place_through_symlink() {
        let dir = TempDir::new().unwrap();
        let real = ten_lines(&dir, "real.txt");
        let link = dir.path().join("link.txt");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        nl_convert(&link, None, LineEnding::Dos).unwrap();
        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        let converted = std::fs::read(&real).unwrap();
        assert_eq!(converted.windows(2).filter(|w| *w == b"\r\n").count(), 10);
    }

    #[test]
    fn test_nl_convert_rejects_non_files() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("out.txt");

        let result = nl_convert(dir.path(), Some(&dest), LineEnding::Unix);
        assert!(matches!(result, Err(FileprobeError::NotAPlainFile(_))));

        #[cfg(unix)]
        {
            let result = nl_convert(Path::new("/dev/null"), Some(&dest), LineEnding::Unix);
            assert!(matches!(result, Err(FileprobeError::NotAPlainFile(_))));
        }
        assert!(!dest.exists());
    }

    #[test]
    fn test_nl_convert_missing_source() {
        let dir = TempDir::new().unwrap();
        let result = nl_convert(&dir.path().join("bogus"), None, LineEnding::Unix);
        assert!(matches!(result, Err(FileprobeError::NotFound(_))));
    }

    #[test]
    fn test_nl_convert_named_invalid_platform() {
        let dir = TempDir::new().unwrap();
        let source = ten_lines(&dir, "src.txt");
        let result = nl_convert_named(&source, Some(&dir.path().join("bogus.txt")), "blah");
        assert!(matches!(result, Err(FileprobeError::InvalidInput(_))));
    }
}
