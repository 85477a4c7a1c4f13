//! Version levels and level-based rounding.
//!
//! A [`Level`] addresses one segment of a version's release tuple, either by
//! absolute position or relative to the first non-zero segment. [`ceil`] and
//! [`floor`] round a version at such a level.

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

pub use pep440_rs::Version;

/// Position of a release segment inside a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Level {
    /// Fixed zero-based index into the release segments.
    Absolute(usize),
    /// Offset from the first non-zero release segment.
    RelativeToFirstNonZero(usize),
}

/// The first release segment.
pub const MAJOR: Level = Level::Absolute(0);
/// The second release segment.
pub const MINOR: Level = Level::Absolute(1);
/// The third release segment.
pub const MICRO: Level = Level::Absolute(2);
/// The first non-zero release segment.
pub const REL_MAJOR: Level = Level::RelativeToFirstNonZero(0);
/// The segment after the first non-zero one.
pub const REL_MINOR: Level = Level::RelativeToFirstNonZero(1);
/// The second segment after the first non-zero one.
pub const REL_MICRO: Level = Level::RelativeToFirstNonZero(2);

impl Level {
    /// Resolve this level to an index into `version`'s release segments.
    ///
    /// # Errors
    ///
    /// Relative levels fail on a version whose segments are all zero.
    pub fn index(self, version: &Version) -> Result<usize> {
        match self {
            Self::Absolute(index) => Ok(index),
            Self::RelativeToFirstNonZero(offset) => version
                .release()
                .iter()
                .position(|segment| *segment != 0)
                .map(|first| first + offset)
                .ok_or_else(|| Error::NoSignificantSegment {
                    version: version.to_string(),
                }),
        }
    }
}

impl From<usize> for Level {
    fn from(index: usize) -> Self {
        Self::Absolute(index)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MAJOR => write!(f, "major"),
            MINOR => write!(f, "minor"),
            MICRO => write!(f, "micro"),
            REL_MAJOR => write!(f, "rel_major"),
            REL_MINOR => write!(f, "rel_minor"),
            REL_MICRO => write!(f, "rel_micro"),
            Self::Absolute(index) => write!(f, "{index}"),
            Self::RelativeToFirstNonZero(offset) => write!(f, "rel_{offset}"),
        }
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let level = match lower.as_str() {
            "major" => MAJOR,
            "minor" => MINOR,
            "micro" | "patch" => MICRO,
            "rel_major" => REL_MAJOR,
            "rel_minor" => REL_MINOR,
            "rel_micro" => REL_MICRO,
            other => {
                let parse = |digits: &str| {
                    digits
                        .parse::<usize>()
                        .map_err(|e| Error::Config(format!("invalid level '{s}': {e}")))
                };
                match other.strip_prefix("rel_") {
                    Some(offset) => Self::RelativeToFirstNonZero(parse(offset)?),
                    None => Self::Absolute(parse(other)?),
                }
            }
        };
        Ok(level)
    }
}

/// Parse a PEP 440 version.
///
/// # Errors
///
/// Returns [`Error::InvalidVersion`] if `input` is not a valid version.
pub fn parse_version(input: &str) -> Result<Version> {
    Version::from_str(input.trim()).map_err(|e| Error::invalid_version(input, e))
}

/// Round `version` up to the next value of the segment at `level`.
///
/// Segments after `level` are dropped, or zeroed when `keep_trailing_zeros`
/// is set. The epoch is kept; pre, post, dev and local parts are dropped.
///
/// # Errors
///
/// Fails when a relative level cannot be resolved against `version`.
pub fn ceil(level: Level, version: &Version, keep_trailing_zeros: bool) -> Result<Version> {
    let index = level.index(version)?;
    Ok(ceil_at(index, version, keep_trailing_zeros))
}

/// Round `version` down to the segment at `level`.
///
/// # Errors
///
/// Fails when a relative level cannot be resolved against `version`.
pub fn floor(level: Level, version: &Version, keep_trailing_zeros: bool) -> Result<Version> {
    let index = level.index(version)?;
    Ok(floor_at(index, version, keep_trailing_zeros))
}

/// [`ceil`] at an already resolved segment index.
#[must_use]
pub fn ceil_at(index: usize, version: &Version, keep_trailing_zeros: bool) -> Version {
    let (mut segments, width) = padded_release(version, index + 1);
    segments.truncate(index + 1);
    segments[index] += 1;
    if keep_trailing_zeros {
        segments.resize(width, 0);
    }
    Version::new(segments).with_epoch(version.epoch())
}

/// [`floor`] at an already resolved segment index.
#[must_use]
pub fn floor_at(index: usize, version: &Version, keep_trailing_zeros: bool) -> Version {
    let (mut segments, width) = padded_release(version, index + 1);
    segments.truncate(index + 1);
    if keep_trailing_zeros {
        segments.resize(width, 0);
    }
    Version::new(segments).with_epoch(version.epoch())
}

/// Release segments extended with zeros to at least `min_len`, plus the
/// resulting width.
fn padded_release(version: &Version, min_len: usize) -> (Vec<u64>, usize) {
    let mut segments = version.release().to_vec();
    if segments.len() < min_len {
        segments.resize(min_len, 0);
    }
    let width = segments.len();
    (segments, width)
}
