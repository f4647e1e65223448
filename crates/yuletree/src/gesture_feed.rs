use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver, TryRecvError};
use mixer::GestureSample;

const FEED_CAPACITY: usize = 256;

/// Gesture samples read from JSON lines on a background thread.
///
/// The reader thread never touches scene state; it only sends parsed
/// samples, and the frame loop drains them.
pub struct GestureFeed {
    rx: Receiver<GestureSample>,
    closed: bool,
    _reader: JoinHandle<()>,
}

impl GestureFeed {
    /// `-` reads stdin, anything else is opened as a file.
    pub fn open(source: &str) -> Result<Self> {
        if source == "-" {
            return Ok(Self::from_reader(BufReader::new(io::stdin())));
        }
        let file = File::open(source)
            .with_context(|| format!("failed to open gesture feed at {source}"))?;
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_reader<R>(reader: R) -> Self
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = bounded(FEED_CAPACITY);
        let handle = thread::spawn(move || {
            for (index, line) in reader.lines().enumerate() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        tracing::warn!(%err, "gesture feed read failed; closing");
                        break;
                    }
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<GestureSample>(trimmed) {
                    Ok(sample) => {
                        if tx.send(sample).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(line = index + 1, %err, "skipping malformed gesture sample")
                    }
                }
            }
            tracing::debug!("gesture feed reader finished");
        });
        Self {
            rx,
            closed: false,
            _reader: handle,
        }
    }

    /// Next sample if one is already waiting.
    pub fn try_next(&mut self) -> Option<GestureSample> {
        match self.rx.try_recv() {
            Ok(sample) => Some(sample),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.mark_closed();
                None
            }
        }
    }

    /// Waits for the next sample; `None` once the source is exhausted.
    pub fn next_blocking(&mut self) -> Option<GestureSample> {
        if self.closed {
            return None;
        }
        match self.rx.recv() {
            Ok(sample) => Some(sample),
            Err(_) => {
                self.mark_closed();
                None
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn mark_closed(&mut self) {
        if !self.closed {
            self.closed = true;
            tracing::info!("gesture feed closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn yields_samples_in_order_then_closes() {
        let input = concat!(
            "{\"detected\":true,\"open\":true,\"x\":0.5,\"y\":0.1}\n",
            "\n",
            "not json\n",
            "{\"detected\":false}\n",
        );
        let mut feed = GestureFeed::from_reader(Cursor::new(input.as_bytes().to_vec()));
        assert_eq!(
            feed.next_blocking(),
            Some(GestureSample::hand(true, 0.5, 0.1))
        );
        assert_eq!(feed.next_blocking(), Some(GestureSample::lost()));
        assert_eq!(feed.next_blocking(), None);
        assert!(feed.is_closed());
        assert_eq!(feed.try_next(), None);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = GestureFeed::open("/definitely/not/here.jsonl").err().unwrap();
        assert!(format!("{err:#}").contains("gesture feed"));
    }
}
