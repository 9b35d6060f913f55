//! Policy for plain-text content that is left behind during a descent.

use std::fmt;

/// Decides whether a plain-text body is filler that can be dropped silently.
///
/// Blank bodies are always ignorable. On top of that the policy either
/// matches a list of placeholder strings (compared after trimming) or asks a
/// caller-supplied predicate.
pub struct TextPolicy {
    predicate: Box<dyn Fn(&str) -> bool>,
}

impl TextPolicy {
    /// Use a custom predicate. It receives the trimmed body.
    pub fn new(predicate: impl Fn(&str) -> bool + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }

    /// Treat bodies equal to one of `placeholders` as ignorable.
    pub fn placeholders<I, S>(placeholders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<String> = placeholders
            .into_iter()
            .map(|p| p.into().trim().to_string())
            .collect();
        Self::new(move |body| list.iter().any(|p| p == body))
    }

    pub fn is_ignorable(&self, body: &str) -> bool {
        let body = body.trim();
        body.is_empty() || (self.predicate)(body)
    }
}

impl Default for TextPolicy {
    fn default() -> Self {
        Self::new(|_| false)
    }
}

impl fmt::Debug for TextPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextPolicy").finish_non_exhaustive()
    }
}
