//! Three-component numeric product versions.
//!
//! Bundle versions are plain `MAJOR.MINOR.PATCH` triples. Ordering compares
//! the components numerically from left to right, which is all the
//! credential policy and the URL templates need.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing a [`Version`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VersionError {
    /// The value does not have exactly three dot-separated numeric parts.
    #[error("malformed version \"{value}\": expected MAJOR.MINOR.PATCH")]
    Malformed {
        /// The rejected input.
        value: String,
    },
}

/// A `MAJOR.MINOR.PATCH` product version.
///
/// # Examples
///
/// ```
/// use bundle_validation_common::version::Version;
///
/// let version: Version = "2.12.0".parse().expect("valid version");
/// assert!(version >= Version::new(2, 3, 0));
/// assert_eq!(version.to_string(), "2.12.0");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    major: u32,
    minor: u32,
    patch: u32,
}

impl Version {
    /// Builds a version from its components.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Returns the major component.
    #[must_use]
    pub const fn major(self) -> u32 {
        self.major
    }

    /// Returns the minor component.
    #[must_use]
    pub const fn minor(self) -> u32 {
        self.minor
    }

    /// Returns the patch component.
    #[must_use]
    pub const fn patch(self) -> u32 {
        self.patch
    }

    /// Returns the major release line used by package repositories, e.g. `2.x`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bundle_validation_common::version::Version;
    ///
    /// assert_eq!(Version::new(1, 3, 12).release_line(), "1.x");
    /// ```
    #[must_use]
    pub fn release_line(self) -> String {
        format!("{}.x", self.major)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || VersionError::Malformed {
            value: value.to_owned(),
        };
        let mut parts = value.trim().split('.');
        let mut next = || -> Result<u32, VersionError> {
            let part = parts.next().ok_or_else(malformed)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            part.parse().map_err(|_| malformed())
        };
        let version = Self::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(malformed());
        }
        Ok(version)
    }
}

impl TryFrom<&str> for Version {
    type Error = VersionError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
