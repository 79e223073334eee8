//! Process-wide platform conventions.
//!
//! Everything that depends on the host OS (search-path separator, executable
//! suffixes, null device, native line ending) is captured once in a
//! [`Platform`] value and handed to the operations that need it. Tests build
//! simulated platforms with [`Platform::unix`] and [`Platform::windows`].

use serde::Serialize;

/// Suffixes tried on Windows when `PATHEXT` is not set.
pub const DEFAULT_EXECUTABLE_EXTENSIONS: &[&str] = &[".exe", ".com", ".bat"];

/// Broad OS family, as far as file conventions go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// Windows: `;` search paths, `\` separators, CRLF, suffix matching
    Windows,
    /// Everything else: `:` search paths, `/` separators, LF
    Unix,
}

/// Platform conventions resolved from the operating environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Platform {
    family: OsFamily,
    executable_extensions: Vec<String>,
}

impl Platform {
    /// Resolves the conventions of the running process.
    ///
    /// Reads `PATHEXT` on Windows; other environment variables are looked up
    /// lazily by the operations that need them.
    pub fn current() -> Self {
        if cfg!(windows) {
            let pathext = std::env::var("PATHEXT").ok();
            Self::windows(pathext.as_deref())
        } else {
            Self::unix()
        }
    }

    pub fn unix() -> Self {
        Self {
            family: OsFamily::Unix,
            executable_extensions: Vec::new(),
        }
    }

    /// Windows conventions with a `PATHEXT`-style suffix list (`.EXE;.CMD`).
    ///
    /// Entries are lowercased and given a leading dot. An absent or blank
    /// list falls back to [`DEFAULT_EXECUTABLE_EXTENSIONS`].
    pub fn windows(pathext: Option<&str>) -> Self {
        let mut executable_extensions: Vec<String> = pathext
            .unwrap_or_default()
            .split(';')
            .map(str::trim)
            .filter(|ext| !ext.is_empty())
            .map(|ext| format!(".{}", ext.trim_start_matches('.').to_lowercase()))
            .collect();

        if executable_extensions.is_empty() {
            executable_extensions = DEFAULT_EXECUTABLE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect();
        }

        Self {
            family: OsFamily::Windows,
            executable_extensions,
        }
    }

    pub fn family(&self) -> OsFamily {
        self.family
    }

    pub fn is_windows(&self) -> bool {
        self.family == OsFamily::Windows
    }

    /// Separator between entries of a `PATH`-like variable.
    pub fn path_list_separator(&self) -> char {
        match self.family {
            OsFamily::Windows => ';',
            OsFamily::Unix => ':',
        }
    }

    /// Suffixes appended to extension-less program names. Empty on Unix.
    pub fn executable_extensions(&self) -> &[String] {
        &self.executable_extensions
    }

    /// Whether program lookup must try [`Self::executable_extensions`].
    pub fn requires_suffix(&self) -> bool {
        !self.executable_extensions.is_empty()
    }

    /// Name of the bit bucket device.
    pub fn null_device(&self) -> &'static str {
        match self.family {
            OsFamily::Windows => "NUL",
            OsFamily::Unix => "/dev/null",
        }
    }

    /// Native line terminator.
    pub fn line_separator(&self) -> &'static [u8] {
        match self.family {
            OsFamily::Windows => b"\r\n",
            OsFamily::Unix => b"\n",
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

/// Null device name for the running platform.
pub fn null_device() -> &'static str {
    Platform::current().null_device()
}
