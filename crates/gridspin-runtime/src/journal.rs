#![forbid(unsafe_code)]

//! Bounded journal of animator lifecycle events.
//!
//! The journal is a structured record of what the loop did and why, kept
//! alongside the `tracing` output so a host can drain it (for example as
//! JSONL into a debug panel) without installing a subscriber.
//!
//! The journal holds at most `capacity` entries; when full, the oldest entry
//! is dropped. Sequence numbers keep increasing across drops and drains, so a
//! consumer can detect gaps.

use std::collections::VecDeque;

use serde::Serialize;
use serde_json::Value;

/// One lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum JournalEntry {
    /// Slot positions were captured and a new layout epoch began.
    LayoutCaptured { epoch: u64, icons: usize },
    /// Position capture failed.
    LayoutNotReady { reason: String },
    /// A step started animating.
    StepStarted {
        epoch: u64,
        offset: usize,
        animated: usize,
        skipped: usize,
    },
    /// Every transition of a step settled successfully.
    StepCompleted {
        epoch: u64,
        offset: usize,
        next_offset: usize,
    },
    /// A transition of the step failed unexpectedly.
    StepFailed {
        epoch: u64,
        offset: usize,
        attempt: u32,
        error: String,
    },
    /// A transition of the step was cancelled.
    StepAborted { epoch: u64, offset: usize },
    /// A retry of the same offset was scheduled.
    RetryScheduled {
        offset: usize,
        attempt: u32,
        delay_ms: u64,
    },
    /// The retry budget ran out; the loop stopped.
    RetriesExhausted { offset: usize, attempts: u32 },
    /// A resize ended the layout epoch and reset the offset.
    ResizeReset { ended_epoch: u64 },
    /// The loop stopped for a reason other than a resize.
    LoopStopped { reason: String },
    /// The host could not be wired up; the animator is disabled.
    SetupFailed { error: String },
}

/// Ring buffer of [`JournalEntry`] values with sequence numbers.
#[derive(Debug, Clone)]
pub struct Journal {
    entries: VecDeque<(u64, JournalEntry)>,
    capacity: usize,
    next_seq: u64,
}

impl Journal {
    /// Create an empty journal. A zero capacity is clamped to 1.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(64)),
            capacity,
            next_seq: 0,
        }
    }

    /// Append an entry, dropping the oldest if full.
    pub fn record(&mut self, entry: JournalEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back((self.next_seq, entry));
        self.next_seq += 1;
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate held entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().map(|(_, e)| e)
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&JournalEntry> {
        self.entries.back().map(|(_, e)| e)
    }

    /// Remove and return every held entry, oldest first.
    pub fn drain(&mut self) -> Vec<JournalEntry> {
        self.entries.drain(..).map(|(_, e)| e).collect()
    }

    /// Remove every held entry and render each as one JSON line tagged with
    /// `run_id` and its sequence number.
    pub fn drain_jsonl(&mut self, run_id: &str) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.entries.len());
        for (seq, entry) in self.entries.drain(..) {
            let Ok(Value::Object(mut fields)) = serde_json::to_value(&entry) else {
                continue;
            };
            fields.insert("run_id".into(), Value::from(run_id));
            fields.insert("seq".into(), Value::from(seq));
            lines.push(Value::Object(fields).to_string());
        }
        lines
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::new(512)
    }
}
