// SPDX-License-Identifier: MIT

//! `EventSink` (spec §9, external interfaces): a non-blocking destination
//! for lifecycle events. `emit` never blocks the caller on I/O — it hands
//! the event to an unbounded channel drained by a dedicated writer thread,
//! so a slow disk never stalls the parallel runner.

use orc_core::Event;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to open event log at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for lifecycle events. Implementations must not block the
/// caller on I/O.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Discards every event. Used when no event log was configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: Event) {}
}

/// Appends one JSON object per line to a file, one line per event, in
/// arrival order. Construction opens (and creates) the file eagerly so a
/// permissions or path error surfaces immediately rather than silently
/// dropping the run's first events.
pub struct JsonLinesSink {
    tx: Option<Sender<Event>>,
    worker: Option<JoinHandle<()>>,
}

impl JsonLinesSink {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;

        let (tx, rx) = mpsc::channel::<Event>();
        let worker = std::thread::spawn(move || write_loop(file, rx));

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }
}

fn write_loop(file: File, rx: mpsc::Receiver<Event>) {
    let mut writer = BufWriter::new(file);
    for event in rx {
        match serde_json::to_string(&event) {
            Ok(line) => {
                if writeln!(writer, "{line}").is_err() {
                    tracing::warn!("event sink write failed, dropping further events");
                    return;
                }
            }
            Err(err) => tracing::warn!(error = %err, "failed to serialize event"),
        }
    }
    let _ = writer.flush();
}

impl EventSink for JsonLinesSink {
    fn emit(&self, event: Event) {
        // An error here only means the writer thread has already exited
        // (e.g. after a write failure); there is nowhere left to report it.
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}

impl Drop for JsonLinesSink {
    fn drop(&mut self) {
        // Dropping `tx` ends the writer thread's `for event in rx` loop;
        // only then can `join` return.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
