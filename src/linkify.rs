//! Stack trace linking for failure details.
//!
//! Failure bodies are escaped for HTML. When the commit under test is
//! known, lines consisting solely of `/<anything>/<repo>/<path>:<line>` are
//! turned into links to that line in a source browser.

use regex::{Captures, Regex};

use crate::{HuginnError, Result};

/// Directory name marking the repository root inside absolute paths.
pub const DEFAULT_REPO_MARKER: &str = "kubernetes";

/// Source browser URL with `{commit}`, `{path}` and `{line}` placeholders.
pub const DEFAULT_VIEW_URL: &str =
    "https://github.com/kubernetes/kubernetes/blob/{commit}/{path}#L{line}";

/// Escape `&`, `<`, `>`, `"` and `'` for inclusion in HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Rewrites source locations in stack traces into links.
#[derive(Debug, Clone)]
pub struct SourceLinker {
    view_url: String,
    pattern: Regex,
}

impl SourceLinker {
    /// Build a linker for repositories checked out under a `repo_marker`
    /// directory, linking to `view_url` (see [`DEFAULT_VIEW_URL`]).
    pub fn new(repo_marker: &str, view_url: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(&format!(
            r"(?m)^/\S*/{}/(\S+):(\d+)$",
            regex::escape(repo_marker)
        ))
        .map_err(|e| HuginnError::Configuration(format!("invalid repo marker: {e}")))?;
        Ok(Self {
            view_url: view_url.into(),
            pattern,
        })
    }

    /// Escape `text` and, if `commit` is given, link its source locations.
    ///
    /// ```rust
    /// # use huginn::SourceLinker;
    /// let linker = SourceLinker::default();
    /// let html = linker.linkify("/go/src/k8s.io/kubernetes/pkg/a.go:12", Some("abc"));
    /// assert!(html.contains("blob/abc/pkg/a.go#L12"));
    /// ```
    pub fn linkify(&self, text: &str, commit: Option<&str>) -> String {
        let escaped = escape_html(text);
        let Some(commit) = commit else {
            return escaped;
        };
        let commit = escape_html(commit);
        self.pattern
            .replace_all(&escaped, |caps: &Captures<'_>| {
                let href = self
                    .view_url
                    .replace("{commit}", &commit)
                    .replace("{path}", &caps[1])
                    .replace("{line}", &caps[2]);
                format!(r#"<a href="{href}">{}</a>"#, &caps[0])
            })
            .into_owned()
    }
}

impl Default for SourceLinker {
    fn default() -> Self {
        Self {
            view_url: DEFAULT_VIEW_URL.to_string(),
            pattern: Regex::new(r"(?m)^/\S*/kubernetes/(\S+):(\d+)$")
                .expect("default stack trace pattern is valid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "/go/src/k8s.io/kubernetes/test/example.go:123\nError Goes Here";

    #[test]
    fn links_source_lines() {
        let html = SourceLinker::default().linkify(TRACE, Some("56"));
        let link = r#"<a href="https://github.com/kubernetes/kubernetes/blob/56/test/example.go#L123">/go/src/k8s.io/kubernetes/test/example.go:123</a>"#;
        assert!(html.starts_with(link));
        assert!(html.ends_with("\nError Goes Here"));
    }

    #[test]
    fn no_commit_means_no_links() {
        let html = SourceLinker::default().linkify(TRACE, None);
        assert_eq!(html, TRACE);
    }

    #[test]
    fn text_is_escaped() {
        let html = SourceLinker::default().linkify("expected <nil> & got \"x\"", Some("abc"));
        assert_eq!(html, "expected &lt;nil&gt; &amp; got &#34;x&#34;");
    }

    #[test]
    fn only_whole_lines_are_linked() {
        let html = SourceLinker::default().linkify("at /go/src/kubernetes/a.go:1 here", Some("c"));
        assert!(!html.contains("<a "));
    }

    #[test]
    fn custom_marker_and_url() {
        let url = "https://src.example/{commit}/{path}?l={line}";
        let linker = SourceLinker::new("test-infra", url).unwrap();
        let html = linker.linkify("/home/ci/test-infra/gubernator/main.py:40", Some("f00"));
        assert!(html.contains(r#"href="https://src.example/f00/gubernator/main.py?l=40""#));
    }
}
