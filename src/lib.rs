//! `mailpeel` — extract EML messages buried in nested ZIP archives and MIME attachments.
//!
//! The caller names the layering explicitly with a format path such as
//! `ZIP,EML,ZIP,EML`; the [`extract::Extractor`] peels those layers off and
//! writes every message found at the end of the path as `test<N>.eml`.

pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod output;

pub use error::{ExtractError, Result};
pub use extract::{ExtractionSummary, Extractor};
pub use model::format::{FormatPath, FormatTag};
