//! Output size guard: a byte counter with a hard ceiling around a sink.

use std::io::{self, Write};

use thiserror::Error;

/// Default ceiling for a single output file (1 GiB).
pub const DEFAULT_MAX_OUTPUT_SIZE: u64 = 1024 * 1024 * 1024;

/// Raised once the running total reaches the ceiling.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("total output size exceeded: {used} bytes against a limit of {limit}")]
pub struct LimitExceeded {
    pub limit: u64,
    pub used: u64,
}

/// Running byte total compared against a fixed maximum.
///
/// Bytes of the failing request are still counted; the guard never rolls back.
#[derive(Debug, Clone)]
pub struct SizeGuard {
    max: u64,
    used: u64,
}

impl SizeGuard {
    pub fn new(max: u64) -> Self {
        Self { max, used: 0 }
    }

    /// Account for `additional` bytes about to be written.
    pub fn ensure_size(&mut self, additional: u64) -> std::result::Result<(), LimitExceeded> {
        self.used = self.used.saturating_add(additional);
        if self.used >= self.max {
            return Err(LimitExceeded {
                limit: self.max,
                used: self.used,
            });
        }
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn max(&self) -> u64 {
        self.max
    }
}

impl Default for SizeGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OUTPUT_SIZE)
    }
}

/// Writer that consults a [`SizeGuard`] before every write to `inner`.
///
/// A tripped guard surfaces as an `io::Error` carrying [`LimitExceeded`];
/// nothing from the rejected buffer reaches the sink.
pub struct GuardedWriter<W> {
    inner: W,
    guard: SizeGuard,
}

impl<W: Write> GuardedWriter<W> {
    pub fn new(inner: W, guard: SizeGuard) -> Self {
        Self { inner, guard }
    }

    /// Bytes accounted so far.
    pub fn written(&self) -> u64 {
        self.guard.used()
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for GuardedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.guard
            .ensure_size(buf.len() as u64)
            .map_err(io::Error::other)?;
        // Write the whole buffer so a short inner write is never counted twice.
        self.inner.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_under_limit() {
        let mut guard = SizeGuard::new(100);
        assert!(guard.ensure_size(40).is_ok());
        assert!(guard.ensure_size(59).is_ok());
        assert_eq!(guard.used(), 99);
    }

    #[test]
    fn test_guard_trips_at_limit() {
        let mut guard = SizeGuard::new(100);
        guard.ensure_size(60).unwrap();
        let err = guard.ensure_size(40).unwrap_err();
        assert_eq!(err, LimitExceeded { limit: 100, used: 100 });
        // The rejected bytes stay counted.
        assert_eq!(guard.used(), 100);
        assert!(guard.ensure_size(0).is_err());
    }

    #[test]
    fn test_default_limit_is_one_gib() {
        assert_eq!(SizeGuard::default().max(), 1 << 30);
    }

    #[test]
    fn test_guarded_writer_passes_bytes_through() {
        let mut writer = GuardedWriter::new(Vec::new(), SizeGuard::new(1024));
        writer.write_all(b"hello ").unwrap();
        writer.write_all(b"world").unwrap();
        assert_eq!(writer.written(), 11);
        assert_eq!(writer.into_inner(), b"hello world");
    }

    #[test]
    fn test_guarded_writer_rejects_over_limit() {
        let mut writer = GuardedWriter::new(Vec::new(), SizeGuard::new(8));
        writer.write_all(b"1234").unwrap();
        let err = writer.write_all(b"5678").unwrap_err();
        let inner = err
            .get_ref()
            .and_then(|e| e.downcast_ref::<LimitExceeded>())
            .copied();
        assert_eq!(inner, Some(LimitExceeded { limit: 8, used: 8 }));
        assert_eq!(writer.into_inner(), b"1234");
    }
}
