//! Writer that stops accepting data after a byte or line limit.
//!
//! Backs the run log: once either limit would be exceeded a single
//! truncation notice is written and every later write is dropped. Writes
//! and flushes report success even when dropped or when the underlying
//! writer fails, so the run log never fails the caller.

use std::io::{self, Write};

use crate::constants::RUN_LOG_TRUNCATED_NOTICE;

#[derive(Debug)]
pub struct BoundedLogWriter<W: Write> {
    inner: W,
    max_bytes: u64,
    max_lines: u64,
    bytes: u64,
    lines: u64,
    truncated: bool,
}

impl<W: Write> BoundedLogWriter<W> {
    pub fn new(inner: W, max_bytes: u64, max_lines: u64) -> Self {
        Self {
            inner,
            max_bytes,
            max_lines,
            bytes: 0,
            lines: 0,
            truncated: false,
        }
    }

    /// Whether the limit has been reached
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    pub fn lines_written(&self) -> u64 {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn truncate(&mut self) -> io::Result<()> {
        self.truncated = true;
        self.inner.write_all(RUN_LOG_TRUNCATED_NOTICE.as_bytes())?;
        self.inner.flush()
    }
}

impl<W: Write> Write for BoundedLogWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.truncated {
            return Ok(buf.len());
        }

        let new_lines = buf.iter().filter(|&&b| b == b'\n').count() as u64;
        if self.bytes + buf.len() as u64 > self.max_bytes || self.lines + new_lines > self.max_lines
        {
            // The notice itself is best effort
            let _ = self.truncate();
            return Ok(buf.len());
        }

        // A record the inner writer rejects is lost, not counted
        if self.inner.write_all(buf).is_ok() {
            self.bytes += buf.len() as u64;
            self.lines += new_lines;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = self.inner.flush();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passes_through_under_limit() {
        let mut writer = BoundedLogWriter::new(Vec::new(), 100, 10);
        writer.write_all(b"one\ntwo\n").unwrap();
        assert!(!writer.is_truncated());
        assert_eq!(writer.lines_written(), 2);
        assert_eq!(writer.into_inner(), b"one\ntwo\n");
    }

    #[test]
    fn test_byte_limit() {
        let mut writer = BoundedLogWriter::new(Vec::new(), 8, 100);
        writer.write_all(b"1234\n").unwrap();
        writer.write_all(b"5678\n").unwrap();
        writer.write_all(b"9\n").unwrap();
        assert!(writer.is_truncated());
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(out, format!("1234\n{}", RUN_LOG_TRUNCATED_NOTICE));
    }

    #[test]
    fn test_line_limit() {
        let mut writer = BoundedLogWriter::new(Vec::new(), 1000, 2);
        for line in ["a\n", "b\n", "c\n", "d\n"] {
            writer.write_all(line.as_bytes()).unwrap();
        }
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(out, format!("a\nb\n{}", RUN_LOG_TRUNCATED_NOTICE));
    }

    /// Accepts `capacity` bytes, then fails every call
    struct FailingWriter {
        written: Vec<u8>,
        capacity: usize,
    }

    impl Write for FailingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written.len() + buf.len() > self.capacity {
                return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    #[test]
    fn test_inner_errors_are_swallowed() {
        let inner = FailingWriter {
            written: Vec::new(),
            capacity: 4,
        };
        let mut writer = BoundedLogWriter::new(inner, 1000, 100);
        writer.write_all(b"ok
").unwrap();
        writer.write_all(b"rejected
").unwrap();
        writer.flush().unwrap();

        assert!(!writer.is_truncated());
        assert_eq!(writer.bytes_written(), 3);
        assert_eq!(writer.lines_written(), 1);
        assert_eq!(writer.into_inner().written, b"ok
");
    }

    #[test]
    fn test_notice_written_once() {
        let mut writer = BoundedLogWriter::new(Vec::new(), 0, 0);
        for _ in 0..5 {
            assert_eq!(writer.write(b"dropped\n").unwrap(), 8);
        }
        let out = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(out.matches(RUN_LOG_TRUNCATED_NOTICE).count(), 1);
    }
}
