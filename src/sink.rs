use std::borrow::Cow;
use std::fs::OpenOptions;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub type BoxedWriter = Box<dyn Write + Send>;

const NUL_ESCAPE: &str = "\\0";

/// Ordered, newline-delimited output for forwarded log messages.
///
/// Writes are buffered; nothing is guaranteed visible downstream until
/// [`LineSink::flush`] returns.
pub struct LineSink<W: Write> {
    inner: W,
}

impl<W: Write> LineSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Writes one message as exactly one line.
    pub fn append(&mut self, message: &str) -> io::Result<()> {
        let line = escape_nul(message);
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\n")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl LineSink<BoxedWriter> {
    pub fn stdout() -> Self {
        Self::new(Box::new(BufWriter::new(io::stdout())))
    }

    /// Appends to `path`, creating it if needed, so another process can
    /// follow the file while the session runs.
    pub fn append_to_file(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }
}

fn escape_nul(message: &str) -> Cow<'_, str> {
    if message.contains('\0') {
        Cow::Owned(message.replace('\0', NUL_ESCAPE))
    } else {
        Cow::Borrowed(message)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::SharedBuffer;
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn nul_is_escaped_and_nothing_else_changes() {
        let mut sink = LineSink::new(Vec::new());
        sink.append("a\0b\tc\\0 é").unwrap();
        assert_eq!(sink.into_inner(), "a\\0b\tc\\0 é\n".as_bytes());
    }

    #[test]
    fn one_line_per_message_in_order() {
        let mut sink = LineSink::new(Vec::new());
        sink.append("first").unwrap();
        sink.append("").unwrap();
        sink.append("third").unwrap();
        assert_eq!(sink.into_inner(), b"first\n\nthird\n");
    }

    #[test]
    fn lines_become_visible_on_flush() {
        let buffer = SharedBuffer::default();
        let mut sink = LineSink::new(buffer.clone());
        sink.append("x").unwrap();
        assert!(buffer.flushed_lines().is_empty());
        sink.flush().unwrap();
        assert_eq!(buffer.flushed_lines(), vec!["x"]);
        assert_eq!(buffer.flushes(), 1);
    }

    #[test]
    fn file_sink_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tail.log");
        std::fs::write(&path, "existing\n").unwrap();

        let mut sink = LineSink::append_to_file(&path).unwrap();
        sink.append("new").unwrap();
        sink.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "existing\nnew\n");
    }
}
