/// src/lib.rs
pub mod commands;
pub mod error;
pub mod platform;
pub mod utils;

pub use commands::{
    convert_stream, env_search_path, file_stats, has_image_extension, head, is_binary, is_image,
    middle, nl_convert, nl_convert_named, read_prefix, sparse, tail, touch, wc, whereis,
    whereis_in_env, which, which_in_env, ByteOrderMark, FileStats, ImageFormat, LineEnding,
    LineReader, PathResolver, WcCount, WcMode, DEFAULT_LINE_COUNT, HEADER_LEN, IMAGE_EXTENSIONS,
    TAIL_CHUNK_SIZE,
};
pub use error::{FileprobeError, Result};
pub use platform::{null_device, OsFamily, Platform};
pub use utils::{display, parsing};
pub use utils::{parse_count, parse_line_range, OutputFormat};

/// Version of the fileprobe library.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Color output mode for terminal display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// Always use colors, even if output is not a terminal
    Always,
    /// Automatically detect if terminal supports colors
    Auto,
    /// Never use colors
    Never,
}

impl Default for ColorMode {
    fn default() -> Self {
        ColorMode::Auto
    }
}

impl ColorMode {
    /// Parses a color mode from a string.
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "always" | "yes" => Ok(ColorMode::Always),
            "auto" => Ok(ColorMode::Auto),
            "never" | "no" => Ok(ColorMode::Never),
            _ => Err(FileprobeError::InvalidInput(format!(
                "Unknown color mode: '{}'. Supported: always, auto, never",
                s
            ))),
        }
    }
}
