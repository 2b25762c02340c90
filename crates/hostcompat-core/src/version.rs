//! Version parsing, comparison, and host version resolution.
//!
//! Host clients report their SDK version as free-form text. Parsing here is
//! deliberately lenient: anything that cannot be read resolves to the lowest
//! possible version, so an unreadable version can never unlock a feature.

use std::cmp::Ordering;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::host::HostSurface;

/// Version assumed when the host reports nothing usable.
pub const DEFAULT_SDK_VERSION: &str = "0.1.0";

/// A `major.minor.patch` version triple.
///
/// Ordering is lexicographic on `(major, minor, patch)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SemVer {
    /// Major version - breaking changes
    pub major: u32,
    /// Minor version - new features, backwards compatible
    pub minor: u32,
    /// Patch version - bug fixes, backwards compatible
    pub patch: u32,
}

impl SemVer {
    /// The lowest possible version, used for anything unparseable.
    pub const ZERO: Self = Self::new(0, 0, 0);

    /// Creates a new version.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse leniently. Never fails; see [`parse_version`].
    #[must_use]
    pub fn parse(text: &str) -> Self {
        parse_version(text)
    }

    /// Parse a version that must be exactly `major.minor.patch`, with an
    /// optional leading `v`.
    ///
    /// Used where a malformed version is a user mistake worth reporting,
    /// such as configuration files.
    ///
    /// # Errors
    ///
    /// Returns an error if the string does not have three numeric segments.
    pub fn parse_strict(text: &str) -> Result<Self, VersionParseError> {
        text.parse()
    }

    /// Returns `true` if this version is at least `required`.
    #[must_use]
    pub fn meets(&self, required: &Self) -> bool {
        meets_minimum(self, required)
    }
}

impl Default for SemVer {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for SemVer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl From<&str> for SemVer {
    fn from(text: &str) -> Self {
        parse_version(text)
    }
}

/// Error returned when strict version parsing fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    /// Wrong number of segments (expected "major.minor.patch").
    InvalidFormat(String),
    /// A numeric segment could not be parsed.
    InvalidNumber(ParseIntError),
}

impl fmt::Display for VersionParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(s) => write!(
                f,
                "invalid version format: {s} (expected major.minor.patch)"
            ),
            Self::InvalidNumber(e) => write!(f, "invalid version number: {e}"),
        }
    }
}

impl std::error::Error for VersionParseError {}

impl From<ParseIntError> for VersionParseError {
    fn from(e: ParseIntError) -> Self {
        Self::InvalidNumber(e)
    }
}

impl FromStr for SemVer {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = strip_prefix(s).split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(VersionParseError::InvalidFormat(s.to_string()));
        };
        Ok(Self {
            major: major.parse()?,
            minor: minor.parse()?,
            patch: patch.parse()?,
        })
    }
}

fn strip_prefix(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed)
}

/// Parse a dotted version string, failing closed.
///
/// Strips an optional `v` prefix, splits on `.`, and reads up to three
/// components. Missing or non-numeric components become `0`, and anything
/// past the third component is ignored. Malformed input therefore yields
/// [`SemVer::ZERO`] rather than an error.
#[must_use]
pub fn parse_version(text: &str) -> SemVer {
    let mut parts = strip_prefix(text)
        .split('.')
        .map(|segment| segment.trim().parse::<u32>().unwrap_or(0));

    SemVer {
        major: parts.next().unwrap_or(0),
        minor: parts.next().unwrap_or(0),
        patch: parts.next().unwrap_or(0),
    }
}

/// Compare two versions on `(major, minor, patch)`.
///
/// `Less`, `Equal` and `Greater` stand for `-1`, `0` and `1`.
#[must_use]
pub fn compare_versions(a: &SemVer, b: &SemVer) -> Ordering {
    a.cmp(b)
}

/// Returns `true` if `current` is the same as or newer than `required`.
#[must_use]
pub fn meets_minimum(current: &SemVer, required: &SemVer) -> bool {
    compare_versions(current, required) != Ordering::Less
}

/// Where a resolved version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    /// The host exposed a version field directly.
    Host,
    /// The version came from the host's metadata lookup.
    Metadata,
    /// Nothing usable was reported; the configured default applies.
    Default,
}

/// Result of resolving the current host SDK version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResolution {
    /// The parsed version.
    pub version: SemVer,
    /// The raw text the version was parsed from.
    pub raw: String,
    /// Which lookup produced the version.
    pub source: VersionSource,
}

/// Resolve the SDK version of the current host, best-effort.
///
/// Prefers the version the host exposes directly, then the host's metadata
/// lookup, then `default`. This never fails: probe errors are logged and
/// the next source is tried.
pub async fn current_version(host: &dyn HostSurface, default: SemVer) -> VersionResolution {
    if let Some(raw) = host.sdk_version().filter(|v| !v.trim().is_empty()) {
        debug!(version = %raw, "using host-reported SDK version");
        return VersionResolution {
            version: parse_version(&raw),
            raw,
            source: VersionSource::Host,
        };
    }

    match host.metadata_version().await {
        Ok(raw) if !raw.trim().is_empty() => {
            debug!(version = %raw, "using SDK version from host metadata");
            return VersionResolution {
                version: parse_version(&raw),
                raw,
                source: VersionSource::Metadata,
            };
        },
        Ok(_) => debug!("host metadata reported an empty version"),
        Err(e) if e.is_absent() => debug!("host exposes no metadata version lookup"),
        Err(e) => warn!(error = %e, "metadata version lookup failed"),
    }

    VersionResolution {
        version: default,
        raw: default.to_string(),
        source: VersionSource::Default,
    }
}
