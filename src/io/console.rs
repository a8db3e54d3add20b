//! Character output sink.

use std::io::{self, Write};

/// Writer for program output.
///
/// A terminal in raw mode no longer turns `\n` into a carriage return plus
/// line feed, so in that mode every `\n` is written as `\r\n`. Otherwise
/// bytes pass through untouched.
#[derive(Debug)]
pub struct ConsoleWriter<W: Write> {
    inner: W,
    crlf: bool,
}

impl<W: Write> ConsoleWriter<W> {
    /// Wrap `inner`, translating newlines when `crlf` is set.
    pub fn new(inner: W, crlf: bool) -> Self {
        Self { inner, crlf }
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ConsoleWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.crlf {
            return self.inner.write(buf);
        }
        for (i, line) in buf.split(|b| *b == b'\n').enumerate() {
            if i > 0 {
                self.inner.write_all(b"\r\n")?;
            }
            self.inner.write_all(line)?;
        }
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
    fn test_passthrough() {
        let mut out = ConsoleWriter::new(Vec::<u8>::new(), false);
        out.write_all(b"one\ntwo\n").unwrap();
        assert_eq!(out.into_inner(), b"one\ntwo\n");
    }

    #[test]
    fn test_crlf_translation() {
        let mut out = ConsoleWriter::new(Vec::<u8>::new(), true);
        out.write_all(b"one\ntwo\n").unwrap();
        out.write_all(b"\n").unwrap();
        out.write_all(b"x").unwrap();
        assert_eq!(out.into_inner(), b"one\r\ntwo\r\n\r\nx");
    }
}
