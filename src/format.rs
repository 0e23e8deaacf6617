//! Small text helpers used when rendering build results.

use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;

static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s-]+").expect("slug pattern is valid"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Render a duration compactly: `2h5m`, `16m40s`, `42s` or `3.25s`.
///
/// ```rust
/// # use huginn::format::format_duration;
/// assert_eq!(format_duration(1000.0), "16m40s");
/// ```
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let hours = (seconds / 3600.0).floor();
    let rest = seconds - hours * 3600.0;
    let minutes = (rest / 60.0).floor();
    let secs = rest - minutes * 60.0;

    if hours > 0.0 {
        format!("{}h{}m", hours as u64, minutes as u64)
    } else if minutes > 0.0 {
        format!("{}m{}s", minutes as u64, secs as u64)
    } else if secs < 10.0 {
        format!("{secs:.2}s")
    } else {
        format!("{}s", secs as u64)
    }
}

/// Render a Unix timestamp (seconds) as `YYYY-MM-DD HH:MM`, in UTC.
///
/// `None` if the timestamp is out of range.
pub fn format_timestamp(ts: i64) -> Option<String> {
    DateTime::from_timestamp(ts, 0).map(|t| t.format("%F %H:%M").to_string())
}

/// Turn a test name into an HTML anchor id.
pub fn slugify(text: &str) -> String {
    let stripped = NON_SLUG.replace_all(text, "");
    WHITESPACE.replace_all(&stripped, "-").to_lowercase()
}
