//! Title normalization
//!
//! Turns a display title into the comparison key used for deduplication and
//! ordering. The key folds away accents, case and spacing differences:
//!
//! ```rust
//! use carnets::normalize::normalize_title;
//!
//! assert_eq!(normalize_title("  Ave   MARÍA "), "ave maria");
//! assert_eq!(normalize_title("Noël"), normalize_title("NOEL"));
//! ```
//!
//! The key is never stored in output records; the original `title` is kept
//! as-is.

use std::fmt;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Normalized comparison key for a song title
///
/// Ordering is plain lexical ordering of the normalized string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TitleKey(String);

impl TitleKey {
    /// Build the key for a display title
    pub fn new(title: &str) -> Self {
        TitleKey(normalize_title(title))
    }

    /// Borrow the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key is empty (blank or mark-only title)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TitleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TitleKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonicalize a title into its comparison key
///
/// Applies compatibility decomposition (NFKD), full Unicode case folding,
/// decomposes again, drops combining marks, then trims and collapses
/// whitespace runs to one space. Total and deterministic.
///
/// Folding rather than lowercasing makes "ß" match "SS" and final sigma
/// match capital sigma. The second decomposition catches marks that folding
/// introduces (dotted capital I folds to "i" plus a combining dot).
pub fn normalize_title(title: &str) -> String {
    let decomposed: String = title.nfkd().collect();
    let folded: String = caseless::default_case_fold_str(&decomposed)
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    // split_whitespace trims both ends as well
    let mut normalized = String::with_capacity(folded.len());
    for segment in folded.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}
