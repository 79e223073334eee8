/// src/commands/mod.rs
pub mod lines;
pub mod nlconvert;
pub mod resolve;
pub mod signature;
pub mod stats;
pub mod touch;

pub use lines::{head, middle, tail, LineReader, DEFAULT_LINE_COUNT, TAIL_CHUNK_SIZE};
pub use nlconvert::{convert_stream, nl_convert, nl_convert_named, LineEnding};
pub use resolve::{
    env_search_path, whereis, whereis_in_env, which, which_in_env, PathResolver,
};
pub use signature::{
    has_image_extension, is_binary, is_image, read_prefix, ByteOrderMark, ImageFormat, HEADER_LEN,
    IMAGE_EXTENSIONS,
};
pub use stats::{file_stats, sparse, wc, FileStats, WcCount, WcMode};
pub use touch::touch;
