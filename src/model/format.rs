//! Format tags and the format path that drives the descent.
//!
//! A format path such as `ZIP,ZIP,EML` names the layering to peel off, outermost
//! first. Traversal consumes tags from the front with [`FormatPath::consume`];
//! the returned [`ConsumedTag`] puts its tag back on drop, so every recursion
//! level restores the path on its way out, including when it fails.

use std::collections::VecDeque;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use crate::error::{ExtractError, Result};

/// A container layer kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    /// A ZIP archive whose entries are the next layer.
    Zip,
    /// An RFC 822 message whose attachments are the next layer.
    Eml,
}

impl FormatTag {
    /// Upper-case name used on the command line and in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            FormatTag::Zip => "ZIP",
            FormatTag::Eml => "EML",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatTag {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ZIP" => Ok(FormatTag::Zip),
            "EML" => Ok(FormatTag::Eml),
            _ => Err(ExtractError::UnsupportedFormatTag(s.trim().to_string())),
        }
    }
}

/// Ordered sequence of format tags, consumed from the front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatPath {
    tags: VecDeque<FormatTag>,
}

impl FormatPath {
    pub fn new(tags: impl IntoIterator<Item = FormatTag>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
        }
    }

    /// Check that the path is usable as a top-level path: non-empty and
    /// terminated by `EML`.
    pub fn validate(&self) -> Result<()> {
        match self.tags.back() {
            None => Err(ExtractError::InvalidFormatPath(
                "format path is empty".to_string(),
            )),
            Some(FormatTag::Eml) => Ok(()),
            Some(last) => Err(ExtractError::InvalidFormatPath(format!(
                "format path {} must end with EML, not {}",
                self, last
            ))),
        }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn front(&self) -> Option<FormatTag> {
        self.tags.front().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = FormatTag> + '_ {
        self.tags.iter().copied()
    }

    /// Take the front tag for the duration of the returned guard.
    ///
    /// The guard dereferences to the remaining path. Dropping it pushes the
    /// tag back onto the front.
    pub fn consume(&mut self) -> Option<ConsumedTag<'_>> {
        let tag = self.tags.pop_front()?;
        Some(ConsumedTag { path: self, tag })
    }
}

impl fmt::Display for FormatPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{tag}")?;
        }
        Ok(())
    }
}

impl FromStr for FormatPath {
    type Err = ExtractError;

    /// Parse a comma-separated list such as `ZIP,EML`.
    fn from_str(s: &str) -> Result<Self> {
        let tags = s
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .map(FormatTag::from_str)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(tags))
    }
}

impl FromIterator<FormatTag> for FormatPath {
    fn from_iter<I: IntoIterator<Item = FormatTag>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// A tag taken off the front of a [`FormatPath`], restored on drop.
pub struct ConsumedTag<'a> {
    path: &'a mut FormatPath,
    tag: FormatTag,
}

impl ConsumedTag<'_> {
    pub fn tag(&self) -> FormatTag {
        self.tag
    }
}

impl Deref for ConsumedTag<'_> {
    type Target = FormatPath;

    fn deref(&self) -> &FormatPath {
        &*self.path
    }
}

impl DerefMut for ConsumedTag<'_> {
    fn deref_mut(&mut self) -> &mut FormatPath {
        &mut *self.path
    }
}

impl Drop for ConsumedTag<'_> {
    fn drop(&mut self) {
        self.path.tags.push_front(self.tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_path() {
        let path: FormatPath = "ZIP, zip,EML".parse().unwrap();
        assert_eq!(
            path.iter().collect::<Vec<_>>(),
            vec![FormatTag::Zip, FormatTag::Zip, FormatTag::Eml]
        );
        assert_eq!(path.to_string(), "ZIP,ZIP,EML");
    }

    #[test]
    fn test_parse_unknown_tag() {
        let err = "ZIP,TAR,EML".parse::<FormatPath>().unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormatTag(t) if t == "TAR"));
    }

    #[test]
    fn test_validate() {
        assert!(FormatPath::new([FormatTag::Zip, FormatTag::Eml])
            .validate()
            .is_ok());
        assert!(matches!(
            FormatPath::default().validate(),
            Err(ExtractError::InvalidFormatPath(_))
        ));
        assert!(matches!(
            FormatPath::new([FormatTag::Eml, FormatTag::Zip]).validate(),
            Err(ExtractError::InvalidFormatPath(_))
        ));
    }

    #[test]
    fn test_consume_restores_on_drop() {
        let mut path = FormatPath::new([FormatTag::Zip, FormatTag::Eml, FormatTag::Eml]);
        let before = path.clone();
        {
            let mut first = path.consume().unwrap();
            assert_eq!(first.tag(), FormatTag::Zip);
            assert_eq!(first.len(), 2);
            let second = first.consume().unwrap();
            assert_eq!(second.tag(), FormatTag::Eml);
            assert_eq!(second.front(), Some(FormatTag::Eml));
        }
        assert_eq!(path, before);
    }

    #[test]
    fn test_consume_restores_on_early_exit() {
        fn fails(path: &mut FormatPath) -> Result<()> {
            let mut rest = path.consume().unwrap();
            let _inner = rest.consume().unwrap();
            Err(ExtractError::parse("x", "boom"))
        }

        let mut path = FormatPath::new([FormatTag::Eml, FormatTag::Zip, FormatTag::Eml]);
        let before = path.clone();
        assert!(fails(&mut path).is_err());
        assert_eq!(path, before);
    }

    #[test]
    fn test_consume_empty() {
        let mut path = FormatPath::default();
        assert!(path.consume().is_none());
    }
}
