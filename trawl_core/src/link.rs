//! Canonical link model.
//!
//! A [`Link`] is one discovered URL attributed to the queried username. Construction
//! normalizes the URL (lower-casing, tracking-parameter removal, trailing separator
//! trimming) and the link carries the cheap "junk score" heuristic used for ranking:
//! the lower the score, the more the URL looks like `site.com/<username>`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Ordered profile-boundary symbols. The penalty of a symbol is the index of its
/// first occurrence in this string, so `/` costs 0, `.` 1, ..., space 6 and `-` 12.
pub const USERNAME_MARK_SYMBOLS: &str = "/.~=?&      -";

/// Tracking-parameter fragments removed from every URL, each up to the next `&`.
pub const JUNK_PATTERNS: &[&str] = &["ref_src=[^&]+", "via=[^&]+"];

/// Characters trimmed from the right end of a URL after junk removal.
pub const JUNK_END_SYMBOLS: &[char] = &['?', '&', '/'];

static JUNK_REGEXES: Lazy<Vec<Regex>> = Lazy::new(|| {
    JUNK_PATTERNS
        .iter()
        .map(|p| Regex::new(p).expect("junk pattern is a valid regex"))
        .collect()
});

/// Penalty of a boundary character, or `None` when it is not a profile-boundary symbol.
pub fn symbol_penalty(c: char) -> Option<usize> {
    USERNAME_MARK_SYMBOLS.chars().position(|s| s == c)
}

/// Canonicalize a raw URL: lower-case it, strip junk parameters and trim trailing
/// separators. Applying it to its own output returns the output unchanged.
pub fn normalize_url(raw: &str) -> String {
    let mut url = raw.to_lowercase();
    loop {
        let mut stripped = url.clone();
        for re in JUNK_REGEXES.iter() {
            if let Cow::Owned(s) = re.replace_all(&stripped, "") {
                stripped = s;
            }
        }
        let stripped = stripped.trim_end_matches(JUNK_END_SYMBOLS);
        if stripped == url {
            return url;
        }
        url = stripped.to_string();
    }
}

/// Scheme-folded form used for equality and hashing: `https://` compares as `http://`.
fn fold_scheme(url: &str) -> Cow<'_, str> {
    match url.strip_prefix("https://") {
        Some(rest) => Cow::Owned(format!("http://{}", rest)),
        None => Cow::Borrowed(url),
    }
}

/// One discovered URL for one candidate username.
#[derive(Debug, Clone, Serialize)]
pub struct Link {
    url: String,
    title: String,
    name: String,
    source: String,
    filtered: bool,
}

impl Link {
    /// Build a link from a raw `(url, title)` pair returned by `source`.
    pub fn new(
        url: impl AsRef<str>,
        title: impl Into<String>,
        username: impl AsRef<str>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            url: normalize_url(url.as_ref()),
            title: title.into(),
            name: username.as_ref().to_lowercase(),
            source: source.into(),
            filtered: false,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// The lower-cased username this link was collected for.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when the username filter flagged this link (its URL lacks the username).
    pub fn is_filtered(&self) -> bool {
        self.filtered
    }

    pub(crate) fn mark_filtered(&mut self) {
        self.filtered = true;
    }

    /// Key under which two links collapse during deduplication.
    pub fn dedup_key(&self) -> Cow<'_, str> {
        fold_scheme(&self.url)
    }

    /// Byte offset of the first username occurrence in the URL.
    fn name_position(&self) -> Option<usize> {
        if self.name.is_empty() {
            return None;
        }
        self.url.find(&self.name)
    }

    /// Characters immediately left and right of the first username occurrence.
    ///
    /// `None` stands for a string boundary, or for both sides when the username does
    /// not occur in the URL at all.
    pub fn username_boundaries(&self) -> (Option<char>, Option<char>) {
        match self.name_position() {
            Some(pos) => {
                let left = self.url[..pos].chars().next_back();
                let right = self.url[pos + self.name.len()..].chars().next();
                (left, right)
            }
            None => (None, None),
        }
    }

    /// Profile-likelihood heuristic; lower means more profile-like.
    ///
    /// `path length + 10 * boundary penalties + 3 * username offset`, all measured in
    /// characters, where the path is everything before the first `?`.
    pub fn junk_score(&self) -> usize {
        let (left, right) = self.username_boundaries();
        let symbols_score: usize = [left, right]
            .into_iter()
            .flatten()
            .filter_map(symbol_penalty)
            .sum();

        let name_index = self
            .name_position()
            .map(|pos| self.url[..pos].chars().count() * 3)
            .unwrap_or(0);

        let path_len = self
            .url
            .split('?')
            .next()
            .map(|p| p.chars().count())
            .unwrap_or(0);

        path_len + symbols_score * 10 + name_index
    }

    /// True iff both boundary characters are profile-boundary symbols (or absent).
    pub fn is_likely_profile(&self) -> bool {
        let (left, right) = self.username_boundaries();
        [left, right]
            .into_iter()
            .flatten()
            .all(|c| symbol_penalty(c).is_some())
    }

    /// PDF-like document link.
    pub fn is_document(&self) -> bool {
        self.url.ends_with("pdf") || self.url.contains("-pdf.")
    }

    /// A link worth showing as a profile: likely profile, under the junk threshold,
    /// and not flagged by the username filter.
    pub fn is_reliable(&self, threshold: usize) -> bool {
        self.is_likely_profile() && self.junk_score() <= threshold && !self.filtered
    }
}

impl PartialEq for Link {
    fn eq(&self, other: &Self) -> bool {
        self.dedup_key() == other.dedup_key()
    }
}

impl Eq for Link {}

impl Hash for Link {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dedup_key().hash(state);
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.title, self.url)
    }
}
