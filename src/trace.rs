use tracing::debug;

/// Append-only receiver for pipeline decision traces.
pub trait LogSink {
    fn record(&mut self, message: String);
}

/// Per-run trace buffer. Each entry is also emitted at debug level.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    entries: Vec<String>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<String> {
        self.entries
    }
}

impl LogSink for TraceLog {
    fn record(&mut self, message: String) {
        debug!(trace = %message, "pipeline trace");
        self.entries.push(message);
    }
}
