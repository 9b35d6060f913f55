//! Output side: size guard, numbered EML writer, and destination directory handling.

pub mod dir;
pub mod guard;
pub mod writer;
