//! Plain text files edited through regex substitutions.

use crate::error::{ManifestError, Result};
use regex::{Regex, Replacer};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A text file held in memory, rewritten with [`Regex`] substitutions and
/// written back whole.
#[derive(Debug, Clone)]
pub struct RegexTextFile {
    path: PathBuf,
    contents: String,
    modified: bool,
}

impl RegexTextFile {
    /// Open `path`. A missing file reads as empty.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = if path.exists() {
            std::fs::read_to_string(&path).map_err(|e| ManifestError::io(&path, e))?
        } else {
            String::new()
        };
        Ok(Self {
            path,
            contents,
            modified: false,
        })
    }

    /// File path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Whether a substitution changed the contents since the file was read.
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Replace every match of `regex` and return the number of matches.
    ///
    /// Patterns that should anchor on lines need the `(?m)` flag.
    pub fn sub<R: Replacer>(&mut self, regex: &Regex, replacement: R) -> usize {
        let count = regex.find_iter(&self.contents).count();
        if count == 0 {
            return 0;
        }
        let replaced = regex.replace_all(&self.contents, replacement).into_owned();
        if replaced != self.contents {
            self.contents = replaced;
            self.modified = true;
        }
        count
    }

    /// Write the contents back to the file.
    ///
    /// # Errors
    /// Returns error if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        std::fs::write(&self.path, &self.contents).map_err(|e| ManifestError::io(&self.path, e))?;
        debug!(path = %self.path.display(), "wrote text file");
        Ok(())
    }
}

impl fmt::Display for RegexTextFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.contents)
    }
}
