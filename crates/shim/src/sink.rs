//! Line-oriented diagnostic sinks for processor failures.

use std::io::Write;
use std::sync::Mutex;

/// Something that accepts one line of diagnostic text.
pub trait DiagnosticSink: Send + Sync {
    fn write_line(&self, line: &str) -> std::io::Result<()>;
}

/// Forwards diagnostics to `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        tracing::error!("{line}");
        Ok(())
    }
}

/// Writes each diagnostic as a newline-terminated line to `W`.
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl WriterSink<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> DiagnosticSink for WriterSink<W> {
    fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| std::io::Error::other("diagnostic writer lock poisoned"))?;
        writeln!(writer, "{line}")?;
        writer.flush()
    }
}

/// Write `line` to every present sink. A failing sink does not stop the rest.
pub(crate) fn write_all(sinks: &[Option<&dyn DiagnosticSink>], line: &str) {
    for sink in sinks.iter().flatten() {
        if let Err(e) = sink.write_line(line) {
            tracing::warn!("Failed to write diagnostic: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_sink_appends_newline() {
        let sink = WriterSink::new(Vec::new());
        sink.write_line("first").unwrap();
        sink.write_line("second").unwrap();
        assert_eq!(sink.into_inner(), b"first\nsecond\n");
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_all_skips_none_and_continues_past_failures() {
        let broken = WriterSink::new(BrokenWriter);
        let good = WriterSink::new(Vec::new());
        let sinks: [Option<&dyn DiagnosticSink>; 3] = [Some(&broken), None, Some(&good)];

        write_all(&sinks, "boom");

        assert_eq!(good.into_inner(), b"boom\n");
    }
}
