//! Response accumulation.
//!
//! Folds the fragment stream into a running string for incremental
//! display. Fragments with an empty payload (the terminal chunk usually
//! carries only a finish signal) are skipped by contract, not treated as
//! errors. The accumulated text only reaches the turn log through
//! `finalize`; dropping the accumulator on a stream error discards the
//! partial output.

/// Marker shown after the partial text while the stream is still open.
pub const CURSOR_MARKER: &str = "▌";

#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    text: String,
    finished: bool,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one fragment. Empty fragments are skipped.
    pub fn push(&mut self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        self.text.push_str(fragment);
    }

    /// Text for incremental display: the running text plus the cursor
    /// marker while streaming, the bare text once finished.
    pub fn display_text(&self) -> String {
        if self.finished {
            self.text.clone()
        } else {
            format!("{}{}", self.text, CURSOR_MARKER)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Mark the stream as ended and yield the final text, the one value
    /// eligible for the turn log.
    pub fn finalize(mut self) -> String {
        self.finished = true;
        self.text
    }
}
