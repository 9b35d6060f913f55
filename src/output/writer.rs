//! Writing terminal messages out as numbered `.eml` files.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::error::{ExtractError, Result};
use crate::output::guard::{GuardedWriter, SizeGuard, DEFAULT_MAX_OUTPUT_SIZE};

/// Default I/O buffer size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Allocates output filenames `test1.eml`, `test2.eml`, …
#[derive(Debug, Default, Clone)]
pub struct OutputNames {
    counter: u64,
}

impl OutputNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_name(&mut self) -> String {
        self.counter += 1;
        format!("test{}.eml", self.counter)
    }

    /// Number of names handed out so far.
    pub fn allocated(&self) -> u64 {
        self.counter
    }
}

/// Buffer size and per-file ceiling for output sinks.
#[derive(Debug, Clone, Copy)]
pub struct OutputLimits {
    pub buffer_size: usize,
    pub max_output_size: u64,
}

impl Default for OutputLimits {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            max_output_size: DEFAULT_MAX_OUTPUT_SIZE,
        }
    }
}

/// A finished output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Copy `source` verbatim into the next numbered file under `dir`.
///
/// The sink is size-guarded and buffered. It is closed on every exit path;
/// a copy stopped by the guard leaves the truncated file in place.
pub fn write_eml(
    names: &mut OutputNames,
    dir: &Path,
    source: &mut impl Read,
    limits: OutputLimits,
) -> Result<WrittenFile> {
    let path = dir.join(names.next_name());
    info!("WRITING: {}", path.display());

    let file =
        File::create(&path).map_err(|e| ExtractError::io(path.display().to_string(), e))?;
    let mut sink = GuardedWriter::new(
        BufWriter::with_capacity(limits.buffer_size.max(1), file),
        SizeGuard::new(limits.max_output_size),
    );

    io::copy(source, &mut sink).map_err(|e| ExtractError::from_write(&path, e))?;
    sink.flush().map_err(|e| ExtractError::from_write(&path, e))?;

    Ok(WrittenFile {
        bytes: sink.written(),
        path,
    })
}

/// Output writer bound to one destination directory and name sequence.
#[derive(Debug)]
pub struct OutputWriter {
    dir: PathBuf,
    names: OutputNames,
    limits: OutputLimits,
}

impl OutputWriter {
    pub fn new(dir: impl Into<PathBuf>, names: OutputNames, limits: OutputLimits) -> Self {
        Self {
            dir: dir.into(),
            names,
            limits,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn limits(&self) -> OutputLimits {
        self.limits
    }

    pub fn write(&mut self, source: &mut impl Read) -> Result<WrittenFile> {
        write_eml(&mut self.names, &self.dir, source, self.limits)
    }
}
