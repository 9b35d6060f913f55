//! The recursive extraction engine.
//!
//! [`Extractor::run`] walks the input along a [`FormatPath`]. Each step
//! consumes one tag and unwraps one layer:
//!
//! - `ZIP`: every entry, in archive order, becomes the next layer. A
//!   directory entry ends the walk over that archive. A recoverable failure
//!   in one entry is logged and the next entry is tried.
//! - `EML`: with no tags left the raw bytes are written out as a new `.eml`
//!   file. Otherwise the attachments of a multipart body matching the next
//!   tag (archives for `ZIP`, attached messages for `EML`) become the next
//!   layer, visited in [`classify::order_for_traversal`] order.
//!
//! Every consumed tag is restored and every trail node popped on the way out,
//! whatever the outcome.

pub mod classify;
pub mod text;
pub mod trail;

use std::borrow::Cow;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use mail_parser::{Message, MessageParser, MessagePart, MimeHeaders, PartType};
use serde::Serialize;
use tracing::{debug, error, warn};
use zip::ZipArchive;

use crate::error::{ExtractError, Result};
use crate::model::artifact::Artifact;
use crate::model::format::{FormatPath, FormatTag};
use crate::output::writer::{OutputWriter, WrittenFile};

use self::classify::{classify, order_for_traversal, MimeTyped, PartKind};
use self::text::TextPolicy;
use self::trail::ExtractionPath;

/// What one run produced.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ExtractionSummary {
    /// Output files in the order they were written.
    pub written: Vec<WrittenFile>,
    /// ZIP entries whose processing failed and was skipped.
    pub failed_entries: usize,
    /// Plain-text parts with real content that were not extracted.
    pub leftover_text_parts: usize,
}

impl ExtractionSummary {
    pub fn bytes_written(&self) -> u64 {
        self.written.iter().map(|f| f.bytes).sum()
    }
}

/// Outcome of one ZIP entry for the surrounding entry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ArchiveStep {
    Continue,
    StopArchive,
}

/// The current layer, tagged with how it is to be unwrapped.
enum Node<'a> {
    Archive(Artifact<'a>),
    Message(Artifact<'a>),
}

impl<'a> Node<'a> {
    fn new(tag: FormatTag, artifact: Artifact<'a>) -> Self {
        match tag {
            FormatTag::Zip => Node::Archive(artifact),
            FormatTag::Eml => Node::Message(artifact),
        }
    }
}

/// One child of a multipart body, remembering its source position.
struct BodyPart<'m, 'x> {
    position: usize,
    part: &'m MessagePart<'x>,
}

impl<'m> BodyPart<'m, '_> {
    fn name(&self) -> String {
        self.part
            .attachment_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("part{}", self.position + 1))
    }

    /// Payload bytes: transfer-decoded, and for an attached message the
    /// message exactly as it appears in its container.
    fn bytes(&self) -> Result<&'m [u8]> {
        let part: &'m MessagePart<'_> = self.part;
        match &part.body {
            PartType::Message(nested) => {
                // Nested messages share the container's buffer.
                let root = nested.root_part();
                nested
                    .raw_message
                    .get(root.raw_header_offset()..root.raw_end_offset())
                    .ok_or_else(|| {
                        ExtractError::parse(self.name(), "nested message offsets out of range")
                    })
            }
            _ => Ok(part.contents()),
        }
    }
}

impl MimeTyped for BodyPart<'_, '_> {
    fn mime_type(&self) -> Result<Cow<'_, str>> {
        self.part.mime_type()
    }
}

/// Extraction engine bound to one output writer.
#[derive(Debug)]
pub struct Extractor {
    writer: OutputWriter,
    text_policy: TextPolicy,
}

impl Extractor {
    pub fn new(writer: OutputWriter) -> Self {
        Self {
            writer,
            text_policy: TextPolicy::default(),
        }
    }

    pub fn with_text_policy(mut self, policy: TextPolicy) -> Self {
        self.text_policy = policy;
        self
    }

    pub fn writer(&self) -> &OutputWriter {
        &self.writer
    }

    /// Extract every message reachable from `input` along `path`.
    ///
    /// The path is validated before the filesystem is touched. On return,
    /// success or failure, `path` holds exactly the tags it held on entry.
    pub fn run(&mut self, input: &Path, path: &mut FormatPath) -> Result<ExtractionSummary> {
        path.validate()?;
        if !input.exists() {
            return Err(ExtractError::InputNotFound(input.to_path_buf()));
        }

        debug!(
            input = %input.display(),
            output = %self.writer.dir().display(),
            format = %path,
            "Starting mail extraction"
        );

        let file =
            File::open(input).map_err(|e| ExtractError::io(input.display().to_string(), e))?;
        let reader = BufReader::with_capacity(self.writer.limits().buffer_size.max(1), file);
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.display().to_string());

        let summary = self.extract(Artifact::file(name, reader), path)?;
        debug!(files = summary.written.len(), "Processing finished");
        Ok(summary)
    }

    /// Extract from an artifact that is already open, e.g. bytes in memory.
    pub fn extract(
        &mut self,
        artifact: Artifact<'_>,
        path: &mut FormatPath,
    ) -> Result<ExtractionSummary> {
        path.validate()?;
        let mut trail = ExtractionPath::new();
        let mut summary = ExtractionSummary::default();
        let result = self.descend(artifact, path, &mut trail, &mut summary);
        debug_assert!(trail.is_empty(), "trail leaked: {trail}");
        result.map(|()| summary)
    }

    /// Consume the next tag and unwrap `artifact` accordingly.
    fn descend(
        &mut self,
        artifact: Artifact<'_>,
        path: &mut FormatPath,
        trail: &mut ExtractionPath,
        summary: &mut ExtractionSummary,
    ) -> Result<()> {
        let Some(mut rest) = path.consume() else {
            return Err(ExtractError::InvalidFormatPath(format!(
                "format path exhausted before '{}'",
                artifact.name
            )));
        };
        let node = Node::new(rest.tag(), artifact);
        self.visit(node, &mut rest, trail, summary)
    }

    /// Unwrap one node; `rest` is the path after the node's own tag.
    fn visit(
        &mut self,
        node: Node<'_>,
        rest: &mut FormatPath,
        trail: &mut ExtractionPath,
        summary: &mut ExtractionSummary,
    ) -> Result<()> {
        match node {
            Node::Archive(artifact) => self.visit_archive(artifact, rest, trail, summary),
            Node::Message(artifact) => self.visit_message(artifact, rest, trail, summary),
        }
    }

    fn visit_archive(
        &mut self,
        artifact: Artifact<'_>,
        rest: &mut FormatPath,
        trail: &mut ExtractionPath,
        summary: &mut ExtractionSummary,
    ) -> Result<()> {
        let Artifact { name, payload } = artifact;
        let mut trail = trail.enter_archive(&name);
        debug!(archive = %name, format = %rest, "Processing zip input");

        let mut archive = ZipArchive::new(payload).map_err(|e| ExtractError::archive(&name, e))?;
        for index in 0..archive.len() {
            match self.visit_entry(&mut archive, index, rest, &mut trail, summary) {
                Ok(ArchiveStep::Continue) => {}
                Ok(ArchiveStep::StopArchive) => break,
                Err(e) if e.is_recoverable() => {
                    error!(
                        archive = %name,
                        entry = index,
                        error = %e,
                        "Failed to process zip entry"
                    );
                    summary.failed_entries += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn visit_entry<R: Read + Seek>(
        &mut self,
        archive: &mut ZipArchive<R>,
        index: usize,
        rest: &mut FormatPath,
        trail: &mut ExtractionPath,
        summary: &mut ExtractionSummary,
    ) -> Result<ArchiveStep> {
        let entry = archive
            .by_index(index)
            .map_err(|e| ExtractError::archive(format!("entry #{index}"), e))?;
        if entry.is_dir() {
            debug!(entry = %entry.name(), "Nested directory, stopping this archive");
            return Ok(ArchiveStep::StopArchive);
        }

        let name = entry.name().to_string();
        let size = entry.size();
        let artifact = entry_artifact(name, size, entry, rest)?;
        self.descend(artifact, rest, trail, summary)?;
        Ok(ArchiveStep::Continue)
    }

    fn visit_message(
        &mut self,
        artifact: Artifact<'_>,
        rest: &mut FormatPath,
        trail: &mut ExtractionPath,
        summary: &mut ExtractionSummary,
    ) -> Result<()> {
        let Artifact { name, mut payload } = artifact;
        let mut trail = trail.enter_message(&name);

        if rest.is_empty() {
            // Terminal case: the bytes go out untouched.
            let written = self.writer.write(&mut payload)?;
            summary.written.push(written);
            return Ok(());
        }

        let raw = payload
            .into_bytes()
            .map_err(|e| ExtractError::io(&name, e))?;
        let message = MessageParser::default()
            .parse(&raw[..])
            .ok_or_else(|| ExtractError::parse(&name, "not a MIME message"))?;
        self.visit_body(&name, &message, rest, &mut trail, summary)
    }

    fn visit_body(
        &mut self,
        name: &str,
        message: &Message<'_>,
        rest: &mut FormatPath,
        trail: &mut ExtractionPath,
        summary: &mut ExtractionSummary,
    ) -> Result<()> {
        let root = message.root_part();
        let ids = match &root.body {
            PartType::Multipart(ids) => ids,
            PartType::Text(text) => {
                self.note_text(name, text, summary);
                return Ok(());
            }
            PartType::Message(_) => {
                debug!(message = %name, "Embedded message body is not an attachment");
                return Ok(());
            }
            _ => {
                let content_type = root
                    .mime_type()
                    .unwrap_or(Cow::Borrowed("<unknown>"))
                    .into_owned();
                warn!(message = %name, content_type = %content_type, "Content type unknown");
                return Ok(());
            }
        };

        debug!(message = %name, parts = ids.len(), "Multipart in mail");
        let parts = ids
            .iter()
            .enumerate()
            .filter_map(|(position, id)| message.part(*id).map(|part| BodyPart { position, part }));
        let ordered = order_for_traversal(parts)?;

        let Some(mut next) = rest.consume() else {
            return Ok(());
        };
        let tag = next.tag();
        let wanted = match tag {
            FormatTag::Zip => PartKind::Archive,
            FormatTag::Eml => PartKind::SubMessage,
        };

        for part in &ordered {
            let kind = classify(part)?;
            if kind == wanted {
                let artifact = Artifact::borrowed(part.name(), part.bytes()?);
                self.visit(Node::new(tag, artifact), &mut next, trail, summary)?;
            } else if kind == PartKind::PlainText {
                if let Some(text) = part.part.text_contents() {
                    self.note_text(&part.name(), text, summary);
                }
            }
        }
        Ok(())
    }

    /// Record plain text that the descent leaves behind.
    fn note_text(&self, name: &str, text: &str, summary: &mut ExtractionSummary) {
        if self.text_policy.is_ignorable(text) {
            debug!(part = %name, "Ignoring filler text");
        } else {
            summary.leftover_text_parts += 1;
            debug!(part = %name, bytes = text.len(), "Text content is not an attachment");
        }
    }
}

/// Turn a ZIP entry into the next layer.
///
/// An entry that is the last message on the path is streamed into its output
/// file. Anything unwrapped further is buffered: archives need to seek and
/// messages are parsed whole.
fn entry_artifact<'e>(
    name: String,
    size: u64,
    mut entry: impl Read + 'e,
    rest: &FormatPath,
) -> Result<Artifact<'e>> {
    if rest.len() == 1 && rest.front() == Some(FormatTag::Eml) {
        return Ok(Artifact::stream(name, entry));
    }
    let mut bytes = Vec::with_capacity(usize::try_from(size).unwrap_or(0).min(1 << 20));
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| ExtractError::io(&name, e))?;
    Ok(Artifact::owned(name, bytes))
}
