use std::sync::Mutex;

/// Fire-and-forget audio announcements (text to speech or equivalent).
pub trait CueSink: Send + Sync {
    fn speak(&self, text: &str);
}

/// Writes cues to the log; used when no speech backend is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCueSink;

impl CueSink for TracingCueSink {
    fn speak(&self, text: &str) {
        tracing::info!(cue = %text, "Audio cue");
    }
}

/// Keeps every cue in memory.
#[derive(Debug, Default)]
pub struct RecordingCueSink {
    spoken: Mutex<Vec<String>>,
}

impl RecordingCueSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        match self.spoken.lock() {
            Ok(spoken) => spoken.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl CueSink for RecordingCueSink {
    fn speak(&self, text: &str) {
        match self.spoken.lock() {
            Ok(mut spoken) => spoken.push(text.to_string()),
            Err(poisoned) => poisoned.into_inner().push(text.to_string()),
        }
    }
}
