//! String helpers for OpenShift object names and label values.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum length of an OpenShift label value.
pub const LABEL_MAX_CHARS: usize = 63;

static LABEL_FORBIDDEN_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("label character class compiles"));

static NON_ALNUM_EDGES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^A-Za-z0-9]+|[^A-Za-z0-9]+$").expect("label edge pattern compiles")
});

/// Sanitizes a string so OpenShift accepts it as a label value.
///
/// Characters outside `[A-Za-z0-9._-]` are dropped, the result is cut to
/// [`LABEL_MAX_CHARS`], and it must begin and end with an alphanumeric
/// character. An empty result is a valid (empty) label value.
///
/// # Examples
///
/// ```
/// use osbs_core::sanitize_label_value;
///
/// assert_eq!(sanitize_label_value("feature/new-thing"), "featurenew-thing");
/// assert_eq!(sanitize_label_value("-_1.0_-"), "1.0");
/// ```
pub fn sanitize_label_value(value: &str) -> String {
    let filtered = LABEL_FORBIDDEN_CHARS.replace_all(value, "");
    let trimmed = NON_ALNUM_EDGES.replace_all(&filtered, "");
    // only ASCII is left, so byte slicing stays on char boundaries
    let truncated = &trimmed[..trimmed.len().min(LABEL_MAX_CHARS)];
    NON_ALNUM_EDGES.replace_all(truncated, "").into_owned()
}

/// Joins two strings with `-` and sanitizes the result for use as an
/// object name. Object names are lowercase.
pub fn sanitize_name(first: &str, second: &str) -> String {
    let joined = if second.is_empty() {
        first.to_owned()
    } else {
        format!("{first}-{second}")
    };
    sanitize_label_value(&joined.to_ascii_lowercase().replace('_', "-"))
}

/// Returns the "humanish" part of a git URI, the way `git clone` picks a
/// directory name.
///
/// ```
/// use osbs_core::git_repo_humanish_part;
///
/// assert_eq!(git_repo_humanish_part("https://github.com/user/reponame.git"), "reponame");
/// assert_eq!(git_repo_humanish_part("git@host:group/repo/.git"), "repo");
/// ```
pub fn git_repo_humanish_part(uri: &str) -> &str {
    let uri = uri.trim_end_matches('/');
    let uri = uri
        .strip_suffix("/.git")
        .or_else(|| uri.strip_suffix(".git"))
        .unwrap_or(uri);
    uri.rsplit(['/', ':']).next().unwrap_or(uri)
}
