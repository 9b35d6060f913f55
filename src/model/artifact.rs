//! The content currently being unwrapped: a display name plus its bytes.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};

/// Byte source for one layer.
///
/// The top-level input is streamed from disk. A ZIP entry that goes straight
/// to an output file is streamed from the archive and cannot seek. Anything
/// else found inside a container is held in memory, borrowed from the parsed
/// parent where possible.
pub enum Payload<'a> {
    File(BufReader<File>),
    Stream(Box<dyn Read + 'a>),
    Memory(Cursor<Cow<'a, [u8]>>),
}

impl<'a> Payload<'a> {
    /// Read the whole payload, without copying in-memory content.
    pub fn into_bytes(self) -> io::Result<Cow<'a, [u8]>> {
        match self {
            Payload::File(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(Cow::Owned(buf))
            }
            Payload::Stream(mut reader) => {
                let mut buf = Vec::new();
                reader.read_to_end(&mut buf)?;
                Ok(Cow::Owned(buf))
            }
            Payload::Memory(cursor) => Ok(cursor.into_inner()),
        }
    }
}

impl Read for Payload<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Payload::File(reader) => reader.read(buf),
            Payload::Stream(reader) => reader.read(buf),
            Payload::Memory(cursor) => cursor.read(buf),
        }
    }
}

impl Seek for Payload<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Payload::File(reader) => reader.seek(pos),
            Payload::Stream(_) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "streamed payload cannot seek",
            )),
            Payload::Memory(cursor) => cursor.seek(pos),
        }
    }
}

/// A named payload awaiting its next unwrapping step.
pub struct Artifact<'a> {
    /// Label used in the extraction trail (file, entry or attachment name).
    pub name: String,
    pub payload: Payload<'a>,
}

impl<'a> Artifact<'a> {
    pub fn file(name: impl Into<String>, reader: BufReader<File>) -> Self {
        Self {
            name: name.into(),
            payload: Payload::File(reader),
        }
    }

    pub fn stream(name: impl Into<String>, reader: impl Read + 'a) -> Self {
        Self {
            name: name.into(),
            payload: Payload::Stream(Box::new(reader)),
        }
    }

    pub fn owned(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            payload: Payload::Memory(Cursor::new(Cow::Owned(bytes))),
        }
    }

    pub fn borrowed(name: impl Into<String>, bytes: &'a [u8]) -> Self {
        Self {
            name: name.into(),
            payload: Payload::Memory(Cursor::new(Cow::Borrowed(bytes))),
        }
    }
}
