use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Serialize;
use treeconfig::UploadTimings;

/// Where the photo ingestion sequence currently waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadPhase {
    Idle,
    /// Files selected, waiting for the ingest step.
    Ingesting,
    /// Photos added, waiting for the processing overlay to clear.
    Settling,
    /// Processing done, waiting to reassemble the tree.
    Returning,
}

/// Side effect the scene must apply when a step fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEffect {
    /// Append these files, already truncated to the per-selection cap.
    Ingest(Vec<PathBuf>),
    /// Processing finished.
    Settled,
    /// Send the formation back to the assembled tree.
    Return,
}

#[derive(Debug)]
enum Step {
    Idle,
    Ingesting { due: Instant, files: Vec<PathBuf> },
    Settling { due: Instant },
    Returning { due: Instant },
}

/// `Idle → Ingesting → Settling → Returning → Idle`.
///
/// Each step is due a fixed delay after the previous deadline. Beginning a
/// new sequence while one is pending cancels whatever the old one had left.
#[derive(Debug)]
pub struct UploadSequence {
    timings: UploadTimings,
    step: Step,
    generation: u64,
}

impl UploadSequence {
    pub fn new(timings: UploadTimings) -> Self {
        Self {
            timings,
            step: Step::Idle,
            generation: 0,
        }
    }

    pub fn phase(&self) -> UploadPhase {
        match self.step {
            Step::Idle => UploadPhase::Idle,
            Step::Ingesting { .. } => UploadPhase::Ingesting,
            Step::Settling { .. } => UploadPhase::Settling,
            Step::Returning { .. } => UploadPhase::Returning,
        }
    }

    /// True between `begin` and the settle step.
    pub fn is_processing(&self) -> bool {
        matches!(self.step, Step::Ingesting { .. } | Step::Settling { .. })
    }

    /// Number of sequences begun so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Deadline of the pending step, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.step {
            Step::Idle => None,
            Step::Ingesting { due, .. } | Step::Settling { due } | Step::Returning { due } => {
                Some(due)
            }
        }
    }

    /// Starts (or restarts) the sequence. An empty selection is a no-op and
    /// returns `false`.
    pub fn begin(&mut self, files: Vec<PathBuf>, now: Instant) -> bool {
        if files.is_empty() {
            tracing::debug!("ignoring empty file selection");
            return false;
        }
        let Some(due) = now.checked_add(self.timings.ingest_delay) else {
            tracing::warn!(
                delay = ?self.timings.ingest_delay,
                "ingest delay out of range; selection ignored"
            );
            return false;
        };
        if !matches!(self.step, Step::Idle) {
            tracing::info!(
                generation = self.generation,
                phase = ?self.phase(),
                "restarting upload sequence; pending steps cancelled"
            );
        }
        self.generation += 1;
        tracing::debug!(
            generation = self.generation,
            files = files.len(),
            "upload sequence started"
        );
        self.step = Step::Ingesting { due, files };
        true
    }

    /// Moves to the next step. A deadline past the end of the clock never
    /// arrives, so the rest of the sequence is dropped instead.
    fn schedule(&mut self, after: Instant, delay: Duration, next: fn(Instant) -> Step) {
        self.step = match after.checked_add(delay) {
            Some(due) => next(due),
            None => {
                tracing::warn!(
                    generation = self.generation,
                    ?delay,
                    "upload step delay out of range; sequence dropped"
                );
                Step::Idle
            }
        };
    }

    /// Fires at most one due step. Call in a loop until it returns `None`
    /// so that a long frame gap still runs every elapsed step in order.
    pub fn poll(&mut self, now: Instant) -> Option<UploadEffect> {
        let due = self.next_deadline()?;
        if now < due {
            return None;
        }
        let step = std::mem::replace(&mut self.step, Step::Idle);
        match step {
            Step::Idle => None,
            Step::Ingesting { mut files, .. } => {
                let max = self.timings.max_files;
                if files.len() > max {
                    tracing::debug!(
                        selected = files.len(),
                        kept = max,
                        "selection exceeds cap; extra files dropped"
                    );
                    files.truncate(max);
                }
                self.schedule(due, self.timings.settle_delay, |due| Step::Settling { due });
                Some(UploadEffect::Ingest(files))
            }
            Step::Settling { .. } => {
                self.schedule(due, self.timings.return_delay, |due| Step::Returning { due });
                Some(UploadEffect::Settled)
            }
            Step::Returning { .. } => {
                tracing::debug!(generation = self.generation, "upload sequence finished");
                Some(UploadEffect::Return)
            }
        }
    }
}
