//! Display utilities for fileprobe.
//!
//! Every CLI result is a small serializable report. Reports render either as
//! human-readable text (with optional color through `termcolor`) or as JSON /
//! YAML for scripting.
/// src/utils/display.rs
use crate::commands::{FileStats, ImageFormat, WcCount};
use crate::error::{FileprobeError, Result};
use crate::ColorMode;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Human,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

impl OutputFormat {
    /// Parses an output format string.
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "human" | "text" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            _ => Err(FileprobeError::InvalidInput(format!(
                "Invalid output format '{}': expected 'human', 'json', or 'yaml'",
                s
            ))),
        }
    }
}

/// A printable command result.
pub trait Report: Serialize {
    /// Writes the human-readable form, using color where it helps.
    fn write_human(&self, out: &mut dyn WriteColor) -> io::Result<()>;
}

/// Renders `report` as JSON or YAML.
///
/// # Errors
/// Returns `FileprobeError::InvalidInput` for [`OutputFormat::Human`], which
/// has no string form, and `FileprobeError::Format` if serialization fails.
pub fn render_structured<R: Report>(report: &R, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(report)
            .map_err(|e| FileprobeError::Format(format!("Failed to serialize to JSON: {}", e))),
        OutputFormat::Yaml => serde_yaml::to_string(report)
            .map_err(|e| FileprobeError::Format(format!("Failed to serialize to YAML: {}", e))),
        OutputFormat::Human => Err(FileprobeError::InvalidInput(
            "Human output is written, not rendered".to_string(),
        )),
    }
}

/// Writes `report` to `out` in the requested format.
pub fn write_report<R: Report>(
    report: &R,
    format: OutputFormat,
    out: &mut dyn WriteColor,
) -> Result<()> {
    match format {
        OutputFormat::Human => report.write_human(out)?,
        _ => {
            let rendered = render_structured(report, format)?;
            writeln!(out, "{}", rendered.trim_end())?;
        }
    }
    Ok(())
}

/// Prints `report` to stdout.
pub fn emit<R: Report>(report: &R, format: OutputFormat, color: ColorMode) -> Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(color));
    write_report(report, format, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

/// Maps a [`ColorMode`] onto termcolor, resolving `Auto` against the terminal.
pub fn color_choice(color: ColorMode) -> ColorChoice {
    match color {
        ColorMode::Always => ColorChoice::Always,
        ColorMode::Never => ColorChoice::Never,
        ColorMode::Auto if atty::is(atty::Stream::Stdout) => ColorChoice::Auto,
        ColorMode::Auto => ColorChoice::Never,
    }
}

fn write_colored(out: &mut dyn WriteColor, text: &str, color: Color) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    write!(out, "{}", text)?;
    out.reset()
}

// ============================================================================
// Reports
// ============================================================================

/// Outcome of a yes/no check such as `image` or `sparse`.
#[derive(Debug, Clone, Serialize)]
pub struct FlagReport {
    pub check: &'static str,
    pub path: PathBuf,
    pub value: bool,
}

impl Report for FlagReport {
    fn write_human(&self, out: &mut dyn WriteColor) -> io::Result<()> {
        write!(out, "{}: ", self.path.display())?;
        if self.value {
            write_colored(out, "yes", Color::Green)?;
        } else {
            write_colored(out, "no", Color::Red)?;
        }
        writeln!(out)
    }
}

/// Detected signature plus the raw header bytes.
#[derive(Debug, Clone, Serialize)]
pub struct MagicReport {
    pub path: PathBuf,
    pub format: Option<ImageFormat>,
    pub header: String,
}

impl MagicReport {
    pub fn new(path: PathBuf, format: Option<ImageFormat>, header: &[u8]) -> Self {
        Self {
            path,
            format,
            header: hex::encode(header),
        }
    }
}

impl Report for MagicReport {
    fn write_human(&self, out: &mut dyn WriteColor) -> io::Result<()> {
        write!(out, "{}: ", self.path.display())?;
        match self.format {
            Some(format) => write_colored(out, format.name(), Color::Green)?,
            None => write_colored(out, "unknown", Color::Yellow)?,
        }
        writeln!(out, " [{}]", self.header)
    }
}

/// Executables found for a program.
#[derive(Debug, Clone, Serialize)]
pub struct LookupReport {
    pub program: String,
    pub paths: Vec<PathBuf>,
}

impl Report for LookupReport {
    fn write_human(&self, out: &mut dyn WriteColor) -> io::Result<()> {
        if self.paths.is_empty() {
            write_colored(out, &format!("{} not found", self.program), Color::Red)?;
            return writeln!(out);
        }
        for path in &self.paths {
            writeln!(out, "{}", path.display())?;
        }
        Ok(())
    }
}

/// Lines read from a file.
#[derive(Debug, Clone, Serialize)]
pub struct LinesReport {
    pub path: PathBuf,
    pub lines: Vec<String>,
}

impl Report for LinesReport {
    fn write_human(&self, out: &mut dyn WriteColor) -> io::Result<()> {
        for line in &self.lines {
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }
}

/// `wc` counts for a file.
#[derive(Debug, Clone, Serialize)]
pub struct WcReport {
    pub path: PathBuf,
    pub count: WcCount,
}

impl Report for WcReport {
    fn write_human(&self, out: &mut dyn WriteColor) -> io::Result<()> {
        match self.count {
            WcCount::Single(n) => writeln!(out, "{:>8} {}", n, self.path.display()),
            WcCount::All(FileStats {
                bytes,
                chars,
                words,
                lines,
            }) => writeln!(
                out,
                "{:>8} {:>8} {:>8} {:>8} {}",
                bytes,
                chars,
                words,
                lines,
                self.path.display()
            ),
        }
    }
}

/// Free-form message, e.g. the null device name.
#[derive(Debug, Clone, Serialize)]
pub struct TextReport {
    pub text: String,
}

impl Report for TextReport {
    fn write_human(&self, out: &mut dyn WriteColor) -> io::Result<()> {
        writeln!(out, "{}", self.text)
    }
}
