// ── Serialized record output ──
//
// Every device record goes out in one critical section, so records from
// concurrent workers never interleave.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared, cloneable sink for whole records.
#[derive(Clone)]
pub struct OutputWriter {
    sink: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl OutputWriter {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        Self {
            sink: Arc::new(Mutex::new(Box::new(sink))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Write every line, each newline-terminated, and flush, all under
    /// one lock. Concurrent calls are linearized in arrival order.
    pub fn emit(&self, lines: &[String]) -> io::Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let mut record = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
        for line in lines {
            record.push_str(line);
            record.push('\n');
        }

        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        sink.write_all(record.as_bytes())?;
        sink.flush()
    }
}

impl std::fmt::Debug for OutputWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputWriter").finish_non_exhaustive()
    }
}
