//! Fixture builders: ZIP archives and MIME messages assembled at test time.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use base64::Engine;
use zip::write::SimpleFileOptions;

/// One entry of a fixture archive.
pub enum Entry<'a> {
    File(&'a str, &'a [u8]),
    Dir(&'a str),
}

/// Build a ZIP archive in memory, entries in the given order.
pub fn zip_bytes(entries: &[Entry<'_>]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        match entry {
            Entry::File(name, bytes) => {
                writer
                    .start_file(*name, SimpleFileOptions::default())
                    .unwrap();
                writer.write_all(bytes).unwrap();
            }
            Entry::Dir(name) => {
                writer
                    .add_directory(*name, SimpleFileOptions::default())
                    .unwrap();
            }
        }
    }
    writer.finish().unwrap().into_inner()
}

/// A single-part `text/plain` message. `subject` must not contain spaces.
pub fn simple_message(subject: &str) -> Vec<u8> {
    format!(
        "From: Sender <sender@example.com>\r\n\
         To: rcpt@example.com\r\n\
         Subject: {subject}\r\n\
         Message-ID: <{subject}@example.com>\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: text/plain; charset=utf-8\r\n\
         \r\n\
         Body of {subject}\r\n"
    )
    .into_bytes()
}

/// One body part of a fixture multipart message.
pub enum Attach<'a> {
    Text(&'a str),
    Html(&'a str),
    Zip(&'a str, &'a [u8]),
    LegacyZip(&'a str, &'a [u8]),
    Message(&'a str, &'a [u8]),
    EncodedMessage(&'a str, &'a [u8]),
}

/// A `multipart/mixed` message carrying `parts` in order.
pub fn multipart_message(subject: &str, parts: &[Attach<'_>]) -> Vec<u8> {
    let boundary = format!("=_boundary_{subject}");
    let mut out = format!(
        "From: Sender <sender@example.com>\r\n\
         To: rcpt@example.com\r\n\
         Subject: {subject}\r\n\
         Message-ID: <{subject}@example.com>\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\
         \r\n\
         This is a multi-part message in MIME format.\r\n"
    );

    for part in parts {
        out.push_str(&format!("--{boundary}\r\n"));
        match part {
            Attach::Text(text) => {
                out.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
                out.push_str(text);
                out.push_str("\r\n");
            }
            Attach::Html(html) => {
                out.push_str("Content-Type: text/html; charset=utf-8\r\n\r\n");
                out.push_str(html);
                out.push_str("\r\n");
            }
            Attach::Zip(name, bytes) => {
                push_base64_part(&mut out, "application/zip", name, bytes);
            }
            Attach::LegacyZip(name, bytes) => {
                push_base64_part(&mut out, "application/x-zip-compressed", name, bytes);
            }
            Attach::Message(name, raw) => {
                out.push_str(&format!(
                    "Content-Type: message/rfc822; name=\"{name}\"\r\n\
                     Content-Disposition: attachment; filename=\"{name}\"\r\n\
                     \r\n"
                ));
                out.push_str(std::str::from_utf8(raw).unwrap());
                out.push_str("\r\n");
            }
            Attach::EncodedMessage(name, raw) => {
                push_base64_part(&mut out, "message/rfc822", name, raw);
            }
        }
    }
    out.push_str(&format!("--{boundary}--\r\n"));
    out.into_bytes()
}

fn push_base64_part(out: &mut String, content_type: &str, name: &str, bytes: &[u8]) {
    out.push_str(&format!(
        "Content-Type: {content_type}; name=\"{name}\"\r\n\
         Content-Disposition: attachment; filename=\"{name}\"\r\n\
         Content-Transfer-Encoding: base64\r\n\
         \r\n"
    ));
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    for line in encoded.as_bytes().chunks(76) {
        out.push_str(std::str::from_utf8(line).unwrap());
        out.push_str("\r\n");
    }
}

/// True if `haystack` contains `needle`.
pub fn contains(haystack: &[u8], needle: &str) -> bool {
    haystack
        .windows(needle.len())
        .any(|window| window == needle.as_bytes())
}
