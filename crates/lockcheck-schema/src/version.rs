//! Version ordering used to pick a winner when lock files disagree.

use semver::Version;
use tracing::debug;

/// Strict "greater than" comparison between two version strings.
///
/// Implemented by [`is_version_greater`]; the merger accepts any comparer so
/// callers can substitute their own ordering.
pub trait VersionComparer: Fn(&str, &str) -> bool {}

impl<F: Fn(&str, &str) -> bool> VersionComparer for F {}

pub fn parse_version(input: &str) -> Result<Version, semver::Error> {
    Version::parse(input)
}

/// Returns true only when `a` is strictly greater than `b` under SemVer 2.0
/// precedence. Unparseable input on either side yields `false`.
pub fn is_version_greater(a: &str, b: &str) -> bool {
    let left = match parse_version(a) {
        Ok(v) => v,
        Err(e) => {
            debug!("cannot parse version '{a}': {e}");
            return false;
        }
    };
    let right = match parse_version(b) {
        Ok(v) => v,
        Err(e) => {
            debug!("cannot parse version '{b}': {e}");
            return false;
        }
    };
    // Build metadata does not participate in precedence.
    left.cmp_precedence(&right).is_gt()
}
