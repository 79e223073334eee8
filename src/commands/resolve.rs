//! Executable lookup along a search path (`which` / `whereis`).
//!
//! Resolution follows the conventions of a [`Platform`]: its list separator
//! splits the search path, and on Windows extension-less names are retried
//! with every configured executable suffix. A program that is not found is
//! `Ok(None)`, never an error.

use crate::error::{FileprobeError, Result};
use crate::platform::Platform;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Resolves program names against a search path.
#[derive(Debug, Clone)]
pub struct PathResolver {
    platform: Platform,
}

impl PathResolver {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Returns the first executable named `program` in `search_path`.
    ///
    /// An absolute `program` bypasses the search path and is returned as-is
    /// if it is executable.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `program` or `search_path` is empty.
    pub fn which(&self, program: &str, search_path: &str) -> Result<Option<PathBuf>> {
        validate(program, search_path)?;

        if self.is_absolute(program) {
            return Ok(self
                .candidates(Path::new(program))
                .into_iter()
                .find(|candidate| is_executable(candidate))
                .map(|found| self.native(found)));
        }

        for dir in self.search_dirs(search_path)? {
            if let Some(found) = self.find_in(&dir, program) {
                debug!(program, found = %found.display(), "resolved program");
                return Ok(Some(self.native(found)));
            }
        }

        Ok(None)
    }

    /// Returns every executable named `program` in `search_path`, in search
    /// order, without duplicates.
    ///
    /// Each directory contributes at most one hit. For an absolute `program`
    /// every executable suffix variant is reported.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if `program` or `search_path` is empty.
    pub fn whereis(&self, program: &str, search_path: &str) -> Result<Option<Vec<PathBuf>>> {
        validate(program, search_path)?;

        let hits: Vec<PathBuf> = if self.is_absolute(program) {
            self.candidates(Path::new(program))
                .into_iter()
                .filter(|candidate| is_executable(candidate))
                .collect()
        } else {
            self.search_dirs(search_path)?
                .iter()
                .filter_map(|dir| self.find_in(dir, program))
                .collect()
        };

        let mut paths: Vec<PathBuf> = Vec::with_capacity(hits.len());
        for hit in hits {
            let hit = self.native(hit);
            if !paths.contains(&hit) {
                paths.push(hit);
            }
        }

        Ok(if paths.is_empty() { None } else { Some(paths) })
    }

    /// Splits `search_path` into existing absolute directories.
    ///
    /// Empty entries are skipped, `~` expands to the home directory and
    /// relative entries are taken relative to the current directory. Entries
    /// are used verbatim otherwise, surrounding spaces included.
    ///
    /// # Errors
    ///
    /// Returns `Io` only if a relative entry needs the current directory and
    /// it cannot be determined.
    pub fn search_dirs(&self, search_path: &str) -> Result<Vec<PathBuf>> {
        self.search_dirs_from(search_path, std::env::current_dir)
    }

    /// [`Self::search_dirs`] with the current directory looked up through
    /// `current_dir`, at most once and only for relative entries.
    fn search_dirs_from<C>(&self, search_path: &str, current_dir: C) -> Result<Vec<PathBuf>>
    where
        C: FnOnce() -> std::io::Result<PathBuf>,
    {
        let mut current_dir = Some(current_dir);
        let mut cwd: Option<PathBuf> = None;
        let mut dirs = Vec::new();

        for entry in search_path.split(self.platform.path_list_separator()) {
            if entry.is_empty() {
                continue;
            }

            let expanded = expand_home(entry);
            let dir = if expanded.is_absolute() || self.is_absolute(entry) {
                expanded
            } else {
                if let Some(lookup) = current_dir.take() {
                    cwd = Some(lookup()?);
                }
                match cwd.as_ref() {
                    Some(cwd) => cwd.join(expanded),
                    None => expanded,
                }
            };
            if dir.is_dir() {
                dirs.push(dir);
            } else {
                trace!(entry, "skipping missing search path entry");
            }
        }

        Ok(dirs)
    }

    fn find_in(&self, dir: &Path, program: &str) -> Option<PathBuf> {
        self.candidates(&dir.join(program))
            .into_iter()
            .find(|candidate| is_executable(candidate))
    }

    /// Expands `base` with executable suffixes when the platform needs them
    /// and the name has no extension of its own.
    fn candidates(&self, base: &Path) -> Vec<PathBuf> {
        if !self.platform.requires_suffix() || base.extension().is_some() {
            return vec![base.to_path_buf()];
        }

        self.platform
            .executable_extensions()
            .iter()
            .map(|ext| {
                let mut name = base.as_os_str().to_os_string();
                name.push(ext);
                PathBuf::from(name)
            })
            .collect()
    }

    /// `/usr/bin/ls`, or a drive-letter path such as `C:\bin\ls`.
    fn is_absolute(&self, program: &str) -> bool {
        let bytes = program.as_bytes();
        program.starts_with('/')
            || (bytes.len() >= 3
                && bytes[0].is_ascii_alphabetic()
                && bytes[1] == b':'
                && (bytes[2] == b'\\' || bytes[2] == b'/'))
    }

    /// Rewrites separators to the platform's native form.
    fn native(&self, path: PathBuf) -> PathBuf {
        if self.platform.is_windows() {
            PathBuf::from(path.to_string_lossy().replace('/', "\\"))
        } else {
            path
        }
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(Platform::current())
    }
}

fn validate(program: &str, search_path: &str) -> Result<()> {
    if program.is_empty() {
        return Err(FileprobeError::InvalidInput(
            "program name cannot be empty".to_string(),
        ));
    }
    if search_path.trim().is_empty() {
        return Err(FileprobeError::InvalidInput(
            "search path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn expand_home(entry: &str) -> PathBuf {
    let rest = match entry.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with(&['/', '\\'][..]) => rest,
        _ => return PathBuf::from(entry),
    };

    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(&['/', '\\'][..])),
        None => PathBuf::from(entry),
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .is_ok_and(|meta| !meta.is_dir() && meta.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    // No execute bit to consult; any existing file counts.
    std::fs::metadata(path).is_ok_and(|meta| !meta.is_dir())
}

/// Reads the search path from `PATH`.
///
/// # Errors
///
/// Returns `InvalidInput` if `PATH` is unset or not valid UTF-8.
pub fn env_search_path() -> Result<String> {
    std::env::var("PATH")
        .map_err(|err| FileprobeError::InvalidInput(format!("cannot read PATH: {}", err)))
}

/// [`PathResolver::which`] for the current platform.
pub fn which(program: &str, search_path: &str) -> Result<Option<PathBuf>> {
    PathResolver::default().which(program, search_path)
}

/// [`PathResolver::whereis`] for the current platform.
pub fn whereis(program: &str, search_path: &str) -> Result<Option<Vec<PathBuf>>> {
    PathResolver::default().whereis(program, search_path)
}

/// [`which`] over the `PATH` environment variable.
pub fn which_in_env(program: &str) -> Result<Option<PathBuf>> {
    which(program, &env_search_path()?)
}

/// [`whereis`] over the `PATH` environment variable.
pub fn whereis_in_env(program: &str) -> Result<Option<Vec<PathBuf>>> {
    whereis(program, &env_search_path()?)
}
