//! Lenient semantic-version and constraint parsing.
//!
//! Git tags in the wild carry `v` prefixes and sometimes omit minor or patch
//! components. The helpers here normalize those spellings before handing them
//! to the `semver` crate, so that `v1.2` and `1.2.0` name the same version and
//! a bare `v1.2.3` constraint means "exactly 1.2.3" rather than a caret range.

use std::sync::LazyLock;

use regex::Regex;
use semver::{Version, VersionReq};

use crate::core::ExmError;

/// Matches a `v`/`V` prefix that follows the start of a comparator, so it can
/// be stripped inside ranges like `>=v1.0.0, <v2.0.0`.
static RANGE_V_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[\s,=<>~^])[vV](\d)").expect("static regex"));

/// Operator characters that mark a string as a range rather than a bare pin.
const RANGE_MARKERS: &[char] = &['^', '~', '>', '<', '=', '*', ',', ' '];

/// Parse a version name leniently.
///
/// Strips a leading `v`/`V` and pads missing minor/patch components, so
/// `v1`, `1.2` and `1.2.0` all parse. Pre-release and build metadata pass
/// through untouched.
///
/// # Errors
///
/// Returns the underlying `semver` error when the normalized string still is
/// not a valid version.
pub fn parse_version(name: &str) -> Result<Version, semver::Error> {
    let trimmed = name.trim();
    let bare = trimmed
        .strip_prefix(&['v', 'V'][..])
        .filter(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
        .unwrap_or(trimmed);

    Version::parse(&pad_version(bare))
}

/// Pad `1` to `1.0.0` and `1.2` to `1.2.0`, leaving anything with a
/// pre-release, build metadata, or three components alone.
fn pad_version(version: &str) -> String {
    let core_end = version
        .find(&['-', '+'][..])
        .unwrap_or(version.len());
    let (core, rest) = version.split_at(core_end);

    match core.split('.').count() {
        1 => format!("{core}.0.0{rest}"),
        2 => format!("{core}.0{rest}"),
        _ => version.to_string(),
    }
}

/// Parse a requirement's version string as a constraint.
///
/// Strings carrying a range operator are handed to [`VersionReq`] after
/// normalizing `v` prefixes inside comparators. A bare version (with or
/// without a `v` prefix) becomes an exact `=` pin.
///
/// # Errors
///
/// Returns [`ExmError::InvalidVersionRange`] on malformed syntax.
pub fn parse_constraint(range: &str) -> Result<VersionReq, ExmError> {
    let invalid = |reason: String| ExmError::InvalidVersionRange {
        range: range.to_string(),
        reason,
    };

    let trimmed = range.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty range".to_string()));
    }

    if trimmed.contains(RANGE_MARKERS) {
        let normalized = RANGE_V_PREFIX.replace_all(trimmed, "$1$2");
        return VersionReq::parse(&normalized).map_err(|err| invalid(err.to_string()));
    }

    // Bare pin: "1.2.3" or "v1.2.3" means exactly that version.
    let version = parse_version(trimmed).map_err(|err| invalid(err.to_string()))?;
    VersionReq::parse(&format!("={version}")).map_err(|err| invalid(err.to_string()))
}
