//! Natural ordering of path segments.
//!
//! Build numbers are path segments, so `"10"` would sort before `"9"` as a
//! plain string. [`natural_key`] zero-pads every run of digits to a fixed
//! width, after which plain string comparison gives numeric order.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Width every digit run is padded to.
pub const PAD_WIDTH: usize = 16;

static DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"));

/// Replace each maximal run of ASCII digits with the same digits
/// left-padded with zeros to [`PAD_WIDTH`].
///
/// ```rust
/// use huginn::sort::natural_key;
/// assert!(natural_key("build10") > natural_key("build9"));
/// ```
pub fn natural_key(s: &str) -> String {
    DIGITS
        .replace_all(s, |caps: &Captures<'_>| format!("{:0>width$}", &caps[0], width = PAD_WIDTH))
        .into_owned()
}

/// Compare two strings by their natural keys.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}
