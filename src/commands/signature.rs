//! # Signature Detection
//!
//! Identifies a handful of image formats by their magic numbers and offers a
//! cheap "is this binary?" heuristic built on top of it.
//!
//! ## Recognized Signatures
//!
//! | Format | Magic | Extra condition |
//! |--------|-------|-----------------|
//! | BMP  | `BM` | LE u32 at offset 2 equals the file size |
//! | JPEG | `FF D8 FF E0 00 10 'JFIF'` | |
//! | PNG  | `89 'PNG'` | |
//! | GIF  | `GIF89a` / `GIF97a` | |
//! | TIFF | `II` / `MM` | u16 at offset 2 equals 42 in that byte order; file >= 12 bytes |
//! | ICO  | `00 00 01 00` / `00 00 02 00` | |
//!
//! This is not a MIME library: anything outside the table is simply "not an
//! image".
//!
//! ## Error Policy
//!
//! Both predicates are advisory. A missing file is reported as
//! [`FileprobeError::NotFound`]; any other failure to read (permissions,
//! symlink loops, directories) yields `false`.

use crate::error::{FileprobeError, Result};
use byteorder::{BigEndian, ByteOrder, LittleEndian};
use memchr::memmem;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::trace;

/// Longest prefix any signature needs.
pub const HEADER_LEN: usize = 10;

/// Extensions accepted by [`is_image`] when the extension check is on.
pub const IMAGE_EXTENSIONS: &[&str] = &[".bmp", ".gif", ".jpg", ".jpeg", ".png", ".ico"];

/// Upper bound on the window [`is_binary`] inspects.
pub const BINARY_SAMPLE_LEN: usize = 4096;

/// Byte run that marks a sample as binary.
pub const BINARY_MARKER: &[u8] = b"\0\0";

/// TIFF headers shorter than this cannot hold a first IFD.
const TIFF_MIN_LEN: u64 = 12;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G'];
const GIF_MAGICS: &[&[u8]] = &[b"GIF89a", b"GIF97a"];
const ICO_MAGICS: &[&[u8]] = &[&[0x00, 0x00, 0x01, 0x00], &[0x00, 0x00, 0x02, 0x00]];

// ============================================================================
// Image Formats
// ============================================================================

/// Image formats the detector knows about, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Bmp,
    Jpeg,
    Png,
    Gif,
    Tiff,
    Ico,
}

impl ImageFormat {
    /// Signature table, in check order.
    pub const ALL: [ImageFormat; 6] = [
        ImageFormat::Bmp,
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Gif,
        ImageFormat::Tiff,
        ImageFormat::Ico,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ImageFormat::Bmp => "BMP",
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Gif => "GIF",
            ImageFormat::Tiff => "TIFF",
            ImageFormat::Ico => "ICO",
        }
    }

    /// Checks `header` (the first bytes of a file of `file_len` bytes)
    /// against this format's signature.
    ///
    /// A header shorter than the signature simply does not match.
    pub fn matches(&self, header: &[u8], file_len: u64) -> bool {
        match self {
            ImageFormat::Bmp => {
                header.len() >= 6
                    && header.starts_with(b"BM")
                    && u64::from(LittleEndian::read_u32(&header[2..6])) == file_len
            }
            ImageFormat::Jpeg => header.starts_with(JPEG_MAGIC),
            ImageFormat::Png => header.starts_with(PNG_MAGIC),
            ImageFormat::Gif => GIF_MAGICS.iter().any(|magic| header.starts_with(magic)),
            ImageFormat::Tiff => {
                if file_len < TIFF_MIN_LEN || header.len() < 4 {
                    return false;
                }
                match &header[0..2] {
                    b"II" => LittleEndian::read_u16(&header[2..4]) == 42,
                    b"MM" => BigEndian::read_u16(&header[2..4]) == 42,
                    _ => false,
                }
            }
            ImageFormat::Ico => ICO_MAGICS.iter().any(|magic| header.starts_with(magic)),
        }
    }

    /// Returns the first format whose signature matches `header`.
    pub fn from_header(header: &[u8], file_len: u64) -> Option<ImageFormat> {
        Self::ALL
            .iter()
            .copied()
            .find(|format| format.matches(header, file_len))
    }

    /// Sniffs the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if `path` does not exist. Other read failures are
    /// reported as "no format".
    pub fn detect(path: &Path) -> Result<Option<ImageFormat>> {
        let Some((header, file_len)) = advisory(path, read_header(path, HEADER_LEN))? else {
            return Ok(None);
        };
        let format = Self::from_header(&header, file_len);
        trace!(path = %path.display(), ?format, "sniffed header");
        Ok(format)
    }
}

// ============================================================================
// Byte Order Marks
// ============================================================================

/// Unicode byte order marks recognized at the start of text files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrderMark {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
}

impl ByteOrderMark {
    /// Detects a BOM at the start of `data`.
    ///
    /// UTF-32 LE is checked before UTF-16 LE since its mark starts with the
    /// UTF-16 LE one.
    pub fn detect(data: &[u8]) -> Option<ByteOrderMark> {
        [
            ByteOrderMark::Utf32Le,
            ByteOrderMark::Utf32Be,
            ByteOrderMark::Utf8,
            ByteOrderMark::Utf16Le,
            ByteOrderMark::Utf16Be,
        ]
        .into_iter()
        .find(|bom| data.starts_with(bom.as_bytes()))
    }

    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            ByteOrderMark::Utf8 => &[0xEF, 0xBB, 0xBF],
            ByteOrderMark::Utf16Le => &[0xFF, 0xFE],
            ByteOrderMark::Utf16Be => &[0xFE, 0xFF],
            ByteOrderMark::Utf32Le => &[0xFF, 0xFE, 0x00, 0x00],
            ByteOrderMark::Utf32Be => &[0x00, 0x00, 0xFE, 0xFF],
        }
    }
}

// ============================================================================
// Predicates
// ============================================================================

/// Returns whether `path` looks like an image.
///
/// The content must match one of the signatures in [`ImageFormat::ALL`]. With
/// `check_extension` the file name must also end in one of
/// [`IMAGE_EXTENSIONS`] (case-insensitive); the extension alone never makes a
/// file an image.
///
/// # Errors
///
/// Returns `NotFound` if `path` does not exist.
pub fn is_image(path: &Path, check_extension: bool) -> Result<bool> {
    if ImageFormat::detect(path)?.is_none() {
        return Ok(false);
    }
    Ok(!check_extension || has_image_extension(path))
}

/// Returns whether the file name carries a recognized image extension.
pub fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_lowercase()))
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Best-guess check for binary content.
///
/// Empty files, images and files starting with a Unicode BOM are never
/// binary. Otherwise the first `min(BINARY_SAMPLE_LEN, block size)` bytes are
/// inspected and the file is binary if they contain [`BINARY_MARKER`].
///
/// # Errors
///
/// Returns `NotFound` if `path` does not exist.
pub fn is_binary(path: &Path) -> Result<bool> {
    let Some(metadata) = advisory(path, std::fs::metadata(path))? else {
        return Ok(false);
    };
    if metadata.is_dir() || metadata.len() == 0 {
        return Ok(false);
    }
    if is_image(path, false)? {
        return Ok(false);
    }

    let window = sample_window(&metadata);
    let Some((sample, _)) = advisory(path, read_header(path, window))? else {
        return Ok(false);
    };
    if ByteOrderMark::detect(&sample).is_some() {
        return Ok(false);
    }

    let binary = memmem::find(&sample, BINARY_MARKER).is_some();
    trace!(path = %path.display(), window, binary, "binary heuristic");
    Ok(binary)
}

#[cfg(unix)]
fn sample_window(metadata: &std::fs::Metadata) -> usize {
    use std::os::unix::fs::MetadataExt;
    match usize::try_from(metadata.blksize()) {
        Ok(0) | Err(_) => BINARY_SAMPLE_LEN,
        Ok(blksize) => blksize.min(BINARY_SAMPLE_LEN),
    }
}

#[cfg(not(unix))]
fn sample_window(_metadata: &std::fs::Metadata) -> usize {
    BINARY_SAMPLE_LEN
}

// ============================================================================
// Helpers
// ============================================================================

/// Returns up to `limit` leading bytes of `path`.
///
/// # Errors
///
/// Returns `NotFound` if `path` does not exist and `Io` for other failures.
pub fn read_prefix(path: &Path, limit: usize) -> Result<Vec<u8>> {
    read_header(path, limit)
        .map(|(header, _)| header)
        .map_err(|err| FileprobeError::from_io(err, path))
}

/// Reads up to `limit` bytes from the start of `path`, along with the file size.
pub(crate) fn read_header(path: &Path, limit: usize) -> std::io::Result<(Vec<u8>, u64)> {
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    let mut header = Vec::with_capacity(limit);
    file.take(limit as u64).read_to_end(&mut header)?;
    Ok((header, file_len))
}

/// Maps an I/O outcome onto the advisory policy: `NotFound` is an error,
/// every other failure becomes `None`.
pub(crate) fn advisory<T>(path: &Path, result: std::io::Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(FileprobeError::NotFound(path.to_path_buf()))
        }
        Err(err) => {
            trace!(path = %path.display(), error = %err, "advisory read failed");
            Ok(None)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    fn bmp_bytes() -> Vec<u8> {
        let mut data = vec![0u8; 64];
        data[0..2].copy_from_slice(b"BM");
        LittleEndian::write_u32(&mut data[2..6], 64);
        data
    }

    fn padded(magic: &[u8], len: usize) -> Vec<u8> {
        let mut data = magic.to_vec();
        data.resize(len.max(magic.len()), 0x20);
        data
    }

    fn samples() -> Vec<(ImageFormat, &'static str, Vec<u8>)> {
        vec![
            (ImageFormat::Bmp, "bmp", bmp_bytes()),
            (ImageFormat::Jpeg, "jpg", padded(JPEG_MAGIC, 32)),
            (ImageFormat::Png, "png", padded(PNG_MAGIC, 32)),
            (ImageFormat::Gif, "gif", padded(b"GIF89a", 32)),
            (ImageFormat::Tiff, "tiff", padded(b"II\x2a\x00", 32)),
            (ImageFormat::Ico, "ico", padded(&[0, 0, 1, 0], 32)),
        ]
    }

    // ------------------------------------------------------------------------
    // Header Matching
    // ------------------------------------------------------------------------

    #[test]
    fn test_every_signature_detected_without_extension() {
        let dir = TempDir::new().unwrap();
        for (format, _, data) in samples() {
            let path = write(&dir, &format!("sample_{}", format.name()), &data);
            assert_eq!(ImageFormat::detect(&path).unwrap(), Some(format));
            assert!(is_image(&path, false).unwrap(), "{} not detected", format.name());
            // No extension at all
            assert!(!is_image(&path, true).unwrap());
        }
    }

    #[test]
    fn test_extension_check() {
        let dir = TempDir::new().unwrap();
        let png = padded(PNG_MAGIC, 16);

        assert!(is_image(&write(&dir, "a.png", &png), true).unwrap());
        assert!(is_image(&write(&dir, "b.PNG", &png), true).unwrap());
        // Wrong but recognized extension still passes: content decides the format
        assert!(is_image(&write(&dir, "c.gif", &png), true).unwrap());
        assert!(!is_image(&write(&dir, "d.txt", &png), true).unwrap());

        // Extension alone is not enough
        assert!(!is_image(&write(&dir, "e.png", b"not an image"), true).unwrap());
    }

    #[test]
    fn test_bmp_size_must_match() {
        let mut data = bmp_bytes();
        assert!(ImageFormat::Bmp.matches(&data, 64));
        assert!(!ImageFormat::Bmp.matches(&data, 65));

        data.truncate(4);
        assert!(!ImageFormat::Bmp.matches(&data, 4));
    }

    #[test]
    fn test_tiff_byte_orders() {
        assert!(ImageFormat::Tiff.matches(b"II\x2a\x00", 12));
        assert!(ImageFormat::Tiff.matches(b"MM\x00\x2a", 12));
        assert!(!ImageFormat::Tiff.matches(b"MM\x2a\x00", 12));
        assert!(!ImageFormat::Tiff.matches(b"II\x00\x2a", 12));
        // Too small to be a TIFF
        assert!(!ImageFormat::Tiff.matches(b"II\x2a\x00", 11));
    }

    #[test]
    fn test_gif_and_ico_variants() {
        assert!(ImageFormat::Gif.matches(b"GIF97a", 6));
        assert!(!ImageFormat::Gif.matches(b"GIF87a", 6));
        assert!(ImageFormat::Ico.matches(&[0, 0, 2, 0], 4));
        assert!(!ImageFormat::Ico.matches(&[0, 0, 3, 0], 4));
    }

    #[test]
    fn test_short_files_fail_quietly() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "short.jpg", &JPEG_MAGIC[..5]);
        assert!(!is_image(&path, true).unwrap());

        let empty = write(&dir, "empty.png", b"");
        assert!(!is_image(&empty, false).unwrap());
    }

    #[test]
    fn test_read_prefix() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "prefix.bin", b"GIF89a and more");
        assert_eq!(read_prefix(&path, HEADER_LEN).unwrap(), b"GIF89a and");
        assert_eq!(read_prefix(&path, 100).unwrap().len(), 15);
        assert!(matches!(
            read_prefix(&dir.path().join("bogus"), 4),
            Err(FileprobeError::NotFound(_))
        ));
    }

    #[test]
    fn test_is_image_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = is_image(&dir.path().join("bogus.png"), true);
        assert!(matches!(result, Err(FileprobeError::NotFound(_))));
    }

    #[test]
    fn test_is_image_directory_is_false() {
        let dir = TempDir::new().unwrap();
        assert!(!is_image(dir.path(), false).unwrap());
    }

    // ------------------------------------------------------------------------
    // Byte Order Marks
    // ------------------------------------------------------------------------

    #[test]
    fn test_bom_detection() {
        assert_eq!(ByteOrderMark::detect(b"\xEF\xBB\xBFhi"), Some(ByteOrderMark::Utf8));
        assert_eq!(ByteOrderMark::detect(b"\xFF\xFEh\x00"), Some(ByteOrderMark::Utf16Le));
        assert_eq!(ByteOrderMark::detect(b"\xFE\xFF\x00h"), Some(ByteOrderMark::Utf16Be));
        assert_eq!(
            ByteOrderMark::detect(b"\xFF\xFE\x00\x00"),
            Some(ByteOrderMark::Utf32Le)
        );
        assert_eq!(
            ByteOrderMark::detect(b"\x00\x00\xFE\xFF"),
            Some(ByteOrderMark::Utf32Be)
        );
        assert_eq!(ByteOrderMark::detect(b"plain"), None);
    }

    // ------------------------------------------------------------------------
    // Binary Heuristic
    // ------------------------------------------------------------------------

    #[test]
    fn test_text_files_are_not_binary() {
        let dir = TempDir::new().unwrap();
        let english = write(&dir, "english.txt", "The quick brown fox\n".repeat(300).as_bytes());
        let korean = write(&dir, "korean.txt", "안녕하세요 세계\n".repeat(100).as_bytes());
        let empty = write(&dir, "empty.txt", b"");

        assert!(!is_binary(&english).unwrap());
        assert!(!is_binary(&korean).unwrap());
        assert!(!is_binary(&empty).unwrap());
    }

    #[test]
    fn test_utf16_with_bom_is_not_binary() {
        let dir = TempDir::new().unwrap();
        let mut data = vec![0xFF, 0xFE];
        for unit in "hello\r\n".repeat(50).encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        // ASCII in UTF-16 never has two NULs in a row, but pad to make sure the BOM decides
        data.extend_from_slice(&[0, 0, 0, 0]);
        let path = write(&dir, "english.utf16", &data);
        assert!(!is_binary(&path).unwrap());
    }

    #[test]
    fn test_images_are_not_binary() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "pic.ico", &[0, 0, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert!(!is_binary(&path).unwrap());
    }

    #[test]
    fn test_null_runs_are_binary() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "blob.bin", b"\x7fELF\x02\x01\x01\x00\x00\x00\x00");
        assert!(is_binary(&path).unwrap());

        // A lone NUL is tolerated
        let single = write(&dir, "single.txt", b"abc\x00def");
        assert!(!is_binary(&single).unwrap());
    }

    #[test]
    fn test_marker_past_window_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut data = vec![b'a'; BINARY_SAMPLE_LEN];
        data.extend_from_slice(b"\0\0\0\0");
        let path = write(&dir, "late.bin", &data);
        assert!(!is_binary(&path).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_host_executable_is_binary() {
        let ls = Path::new("/bin/ls");
        if ls.exists() {
            assert!(is_binary(ls).unwrap());
        }
    }

    #[test]
    fn test_is_binary_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = is_binary(&dir.path().join("bogus"));
        assert!(matches!(result, Err(FileprobeError::NotFound(_))));
    }
}
