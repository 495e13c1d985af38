use regex::Regex;
use std::sync::LazyLock;

/// Matches any HTML-like tag, including tags that span several lines.
static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<.*?>").expect("tag pattern is a valid regex"));

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input was empty, whitespace, or nothing but markup
    #[error("Text cannot be empty")]
    Empty,
}

/// Strips every `<...>` tag from `input`.
///
/// Text outside of tags is left untouched, so `"<b>Ann</b> Lee"` becomes `"Ann Lee"`.
pub fn strip_tags(input: &str) -> String {
    TAG_PATTERN.replace_all(input, "").into_owned()
}

/// A string that has had markup removed and is guaranteed to be non-empty.
///
/// Construction strips tags first and trims afterwards, so an input made only of tags and
/// whitespace is rejected the same way an empty string is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SanitisedText(String);

impl SanitisedText {
    /// Sanitises `input` and wraps the result.
    ///
    /// # Errors
    ///
    /// Returns `TextError::Empty` if nothing but whitespace remains once tags are removed.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let stripped = strip_tags(input.as_ref());
        let trimmed = stripped.trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SanitisedText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for SanitisedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<SanitisedText> for String {
    fn from(text: SanitisedText) -> Self {
        text.0
    }
}
