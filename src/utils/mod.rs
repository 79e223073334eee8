//! Utility modules for fileprobe.
//!
//! This module provides argument parsing and report display for the CLI.

pub mod display;
pub mod parsing;

// Re-export commonly used functions at the module level
pub use display::{emit, write_report, OutputFormat, Report};
pub use parsing::{parse_count, parse_line_range};
