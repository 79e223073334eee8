use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fileprobe::display::{
    emit, FlagReport, LinesReport, LookupReport, MagicReport, TextReport, WcReport,
};
use fileprobe::{
    env_search_path, is_binary, is_image, nl_convert, parse_count, parse_line_range, read_prefix,
    sparse, touch, wc, ColorMode, ImageFormat, LineEnding, LineReader, OutputFormat, PathResolver,
    Platform, WcMode, HEADER_LEN,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fileprobe")]
#[command(version, about = "Small file utilities: signatures, lookups, line slicing and counts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (human, json, yaml)
    #[arg(short, long, default_value = "human", global = true)]
    format: String,

    /// Color output (always, auto, never)
    #[arg(long, default_value = "auto", global = true)]
    color: String,

    /// Log what the commands are doing to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a file is a BMP, JPEG, PNG, GIF, TIFF or ICO image
    Image {
        path: PathBuf,

        /// Accept any file name, judging by content alone
        #[arg(long)]
        no_ext: bool,
    },

    /// Guess whether a file holds binary data
    Binary { path: PathBuf },

    /// Show the detected image signature and the leading header bytes
    Magic { path: PathBuf },

    /// Locate the first matching executable on the search path
    Which {
        program: String,

        /// Search path to use instead of $PATH
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Locate every matching executable on the search path
    Whereis {
        program: String,

        /// Search path to use instead of $PATH
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Print the first lines of a file
    Head {
        path: PathBuf,

        /// Number of lines
        #[arg(short = 'n', long, default_value = "10", allow_hyphen_values = true)]
        lines: String,
    },

    /// Print the last lines of a file
    Tail {
        path: PathBuf,

        /// Number of lines
        #[arg(short = 'n', long, default_value = "10", allow_hyphen_values = true)]
        lines: String,
    },

    /// Print a range of lines, e.g. '10..20', '..5', '100..' or '7'
    Middle { path: PathBuf, range: String },

    /// Count bytes, characters, words or lines
    Wc {
        path: PathBuf,

        /// What to count (bytes, chars, words, lines, all)
        #[arg(short, long, default_value = "all")]
        mode: String,
    },

    /// Check whether a file has unallocated holes
    Sparse { path: PathBuf },

    /// Rewrite a file's line endings
    Nlconvert {
        source: PathBuf,

        /// Destination (defaults to converting in place)
        dest: Option<PathBuf>,

        /// Target line ending: dos, unix, mac, or a platform name like 'linux' or 'local'
        #[arg(short, long, default_value = "local")]
        platform: String,
    },

    /// Create files or update their timestamps
    Touch {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print the null device for this platform
    Null,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "fileprobe=debug" } else { "fileprobe=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Maps a yes/no answer onto the process exit status.
fn status(value: bool) -> ExitCode {
    if value {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let format = OutputFormat::from_str(&cli.format)?;
    let color = ColorMode::from_str(&cli.color)?;
    let platform = Platform::current();
    debug!(family = ?platform.family(), "resolved platform");

    let code = match cli.command {
        Commands::Image { path, no_ext } => {
            let value = is_image(&path, !no_ext)
                .with_context(|| format!("cannot inspect {}", path.display()))?;
            emit(&FlagReport { check: "image", path, value }, format, color)?;
            status(value)
        }
        Commands::Binary { path } => {
            let value =
                is_binary(&path).with_context(|| format!("cannot inspect {}", path.display()))?;
            emit(&FlagReport { check: "binary", path, value }, format, color)?;
            status(value)
        }
        Commands::Magic { path } => {
            let header = read_prefix(&path, HEADER_LEN)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let detected = ImageFormat::detect(&path)?;
            emit(&MagicReport::new(path, detected, &header), format, color)?;
            status(detected.is_some())
        }
        Commands::Which { program, path } => {
            let search_path = search_path_or_env(path)?;
            let found = PathResolver::new(platform).which(&program, &search_path)?;
            let paths: Vec<PathBuf> = found.into_iter().collect();
            let code = status(!paths.is_empty());
            emit(&LookupReport { program, paths }, format, color)?;
            code
        }
        Commands::Whereis { program, path } => {
            let search_path = search_path_or_env(path)?;
            let paths = PathResolver::new(platform)
                .whereis(&program, &search_path)?
                .unwrap_or_default();
            let code = status(!paths.is_empty());
            emit(&LookupReport { program, paths }, format, color)?;
            code
        }
        Commands::Head { path, lines } => {
            let n = parse_count(&lines)?;
            let lines = LineReader::new(&platform)
                .head(&path, n)
                .with_context(|| format!("cannot read {}", path.display()))?;
            emit(&LinesReport { path, lines }, format, color)?;
            ExitCode::SUCCESS
        }
        Commands::Tail { path, lines } => {
            let n = parse_count(&lines)?;
            let lines = LineReader::new(&platform)
                .tail(&path, n)
                .with_context(|| format!("cannot read {}", path.display()))?;
            emit(&LinesReport { path, lines }, format, color)?;
            ExitCode::SUCCESS
        }
        Commands::Middle { path, range } => {
            let (from, to) = parse_line_range(&range)?;
            let lines = LineReader::new(&platform)
                .middle(&path, from, to)
                .with_context(|| format!("cannot read {}", path.display()))?;
            emit(&LinesReport { path, lines }, format, color)?;
            ExitCode::SUCCESS
        }
        Commands::Wc { path, mode } => {
            let mode = WcMode::from_str(&mode)?;
            let count = wc(&path, mode).with_context(|| format!("cannot count {}", path.display()))?;
            emit(&WcReport { path, count }, format, color)?;
            ExitCode::SUCCESS
        }
        Commands::Sparse { path } => {
            let value =
                sparse(&path).with_context(|| format!("cannot inspect {}", path.display()))?;
            emit(&FlagReport { check: "sparse", path, value }, format, color)?;
            status(value)
        }
        Commands::Nlconvert {
            source,
            dest,
            platform: target,
        } => {
            let ending = LineEnding::for_platform(&target, &platform)?;
            nl_convert(&source, dest.as_deref(), ending)
                .with_context(|| format!("cannot convert {}", source.display()))?;
            ExitCode::SUCCESS
        }
        Commands::Touch { paths } => {
            for path in &paths {
                touch(path).with_context(|| format!("cannot touch {}", path.display()))?;
            }
            ExitCode::SUCCESS
        }
        Commands::Null => {
            let text = platform.null_device().to_string();
            emit(&TextReport { text }, format, color)?;
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}

fn search_path_or_env(path: Option<String>) -> Result<String> {
    match path {
        Some(path) => Ok(path),
        None => Ok(env_search_path()?),
    }
}
