//! Body part classification and traversal ordering.
//!
//! A multipart's children are visited archives first, then attached messages,
//! then everything else, keeping source order inside each group. This gives
//! a depth-first walk that opens the richest nesting first.

use std::borrow::Cow;

use mail_parser::{MessagePart, MimeHeaders, PartType};

use crate::error::{ExtractError, Result};

/// What a body part is, as far as the descent is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    Archive,
    SubMessage,
    PlainText,
    Other,
}

impl PartKind {
    /// Map a bare `type/subtype` string (no parameters) to a kind.
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            "application/zip" | "application/x-zip-compressed" => PartKind::Archive,
            "message/rfc822" => PartKind::SubMessage,
            "text/plain" => PartKind::PlainText,
            _ => PartKind::Other,
        }
    }

    /// Sort key for [`order_for_traversal`]; lower goes first.
    pub fn priority(self) -> u32 {
        match self {
            PartKind::Archive => 1,
            PartKind::SubMessage => 2,
            PartKind::PlainText | PartKind::Other => 1000,
        }
    }
}

/// Anything with a declared MIME type.
pub trait MimeTyped {
    /// The `type/subtype` of this part, without parameters.
    fn mime_type(&self) -> Result<Cow<'_, str>>;
}

impl<T: MimeTyped + ?Sized> MimeTyped for &T {
    fn mime_type(&self) -> Result<Cow<'_, str>> {
        (**self).mime_type()
    }
}

impl MimeTyped for MessagePart<'_> {
    fn mime_type(&self) -> Result<Cow<'_, str>> {
        let Some(ct) = self.content_type() else {
            // RFC 2045 defaults, refined by what the parser found in the body.
            let implied = match &self.body {
                PartType::Text(_) => "text/plain",
                PartType::Html(_) => "text/html",
                PartType::Message(_) => "message/rfc822",
                PartType::Multipart(_) => "multipart/mixed",
                PartType::Binary(_) | PartType::InlineBinary(_) => "application/octet-stream",
            };
            return Ok(Cow::Borrowed(implied));
        };

        if ct.ctype().is_empty() {
            return Err(ExtractError::parse(
                self.attachment_name().unwrap_or("body part"),
                "Content-Type header has no media type",
            ));
        }
        Ok(match ct.subtype() {
            Some(sub) => Cow::Owned(format!("{}/{}", ct.ctype(), sub)),
            None => Cow::Borrowed(ct.ctype()),
        })
    }
}

/// Classify a part from its declared MIME type.
pub fn classify<P: MimeTyped + ?Sized>(part: &P) -> Result<PartKind> {
    Ok(PartKind::from_mime(&part.mime_type()?))
}

/// Stable-sort parts by [`PartKind::priority`].
///
/// A part whose type cannot be determined fails the whole ordering.
pub fn order_for_traversal<P, I>(parts: I) -> Result<Vec<P>>
where
    P: MimeTyped,
    I: IntoIterator<Item = P>,
{
    let mut keyed = parts
        .into_iter()
        .map(|part| Ok((classify(&part)?.priority(), part)))
        .collect::<Result<Vec<_>>>()?;
    keyed.sort_by_key(|(priority, _)| *priority);
    Ok(keyed.into_iter().map(|(_, part)| part).collect())
}
