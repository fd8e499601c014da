//! Append-only timeline storage.
//!
//! One plain-text log file per player, one entry per line. The file is the
//! only source of truth: the in-memory current-state index is rebuilt from
//! it on open and kept in sync on every append.
//!
//! # Concurrency
//!
//! A [`Timeline`] is a single-writer handle; serializing writers per data
//! directory is the caller's job. Appends are line-atomic (one write per
//! entry), so readers never observe a torn line. The entry iterators open
//! their own file handle and see the log as of the call.

mod ingest;
mod reverse;

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Lines, Write};
use std::path::{Path, PathBuf};

use statline_core::{
    AttributeKey, AttributeValue, PlayerId, Segment, SegmentBuilder, SessionScan, TimelineEntry,
    decode_entry, encode_entry,
};
use thiserror::Error;

pub use ingest::{ConsumeError, STATE_SINCE_JITTER_SECS, StatIngest};
use reverse::ReverseLines;

/// Errors from timeline storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Durable append-only log of one player's attribute changes.
pub struct Timeline {
    path: PathBuf,
    handle: File,
    state: HashMap<AttributeKey, AttributeValue>,
}

impl Timeline {
    /// Opens (creating if needed) the timeline for one player.
    ///
    /// Replays the whole log to rebuild the current-state index, so the
    /// returned handle is ready to diff against immediately.
    pub fn open(dir: impl AsRef<Path>, player: &PlayerId) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("{player}.log"));
        let handle = OpenOptions::new().append(true).create(true).open(&path)?;

        let mut timeline = Self {
            path,
            handle,
            state: HashMap::new(),
        };
        timeline.replay()?;
        Ok(timeline)
    }

    fn replay(&mut self) -> Result<(), StorageError> {
        self.state.clear();
        for entry in self.iter()? {
            let entry = entry?;
            self.state.insert(entry.key, entry.value);
        }
        Ok(())
    }

    /// Appends one entry and updates the index.
    ///
    /// The whole line goes down in a single write. `flush` forces the
    /// entry to durable storage before returning; batching callers pass
    /// `false` and flush once at the end.
    pub fn append(&mut self, entry: &TimelineEntry, flush: bool) -> Result<(), StorageError> {
        let mut line = encode_entry(entry);
        line.push('\n');
        self.handle.write_all(line.as_bytes())?;
        self.state.insert(entry.key.clone(), entry.value.clone());
        if flush {
            self.flush()?;
        }
        Ok(())
    }

    /// Appends a batch of entries followed by exactly one flush.
    pub fn append_batch(&mut self, entries: &[TimelineEntry]) -> Result<(), StorageError> {
        for entry in entries {
            self.append(entry, false)?;
        }
        self.flush()
    }

    /// Forces previously appended entries to durable storage.
    pub fn flush(&mut self) -> Result<(), StorageError> {
        self.handle.sync_data()?;
        Ok(())
    }

    /// Latest value per key, replay-equivalent, no I/O.
    #[must_use]
    pub fn current_state(&self) -> &HashMap<AttributeKey, AttributeValue> {
        &self.state
    }

    /// Path of the backing log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lazy forward iteration, oldest entry first.
    ///
    /// Malformed lines are skipped with a warning; I/O failures surface as
    /// `Err` items.
    pub fn iter(&self) -> Result<EntryIter, StorageError> {
        let file = File::open(&self.path)?;
        Ok(EntryIter {
            path: self.path.clone(),
            lines: BufReader::new(file).lines(),
        })
    }

    /// Lazy backward iteration, newest entry first.
    ///
    /// Reads fixed-size chunks from the file tail, so arbitrarily large
    /// logs iterate without the whole file in memory.
    pub fn iter_rev(&self) -> Result<RevEntryIter, StorageError> {
        Ok(RevEntryIter {
            path: self.path.clone(),
            lines: ReverseLines::open(&self.path)?,
        })
    }

    /// Finds the start of the session in progress at `before_time`.
    ///
    /// Scans backward from the end of the log; returns `None` when no
    /// online period precedes `before_time`.
    pub fn find_session_start(&self, before_time: i64) -> Result<Option<i64>, StorageError> {
        let mut scan = SessionScan::with_default_break(before_time);
        for entry in self.iter_rev()? {
            let entry = entry?;
            if let Some(start) = scan.observe(&entry) {
                return Ok(Some(start));
            }
        }
        Ok(scan.finish())
    }

    /// Builds the segment view for the closed window `[start, end]`.
    pub fn segment(&self, start: i64, end: i64) -> Result<Segment, StorageError> {
        let mut builder = SegmentBuilder::new(start, end);
        for entry in self.iter()? {
            let entry = entry?;
            if !builder.observe(&entry) {
                break;
            }
        }
        Ok(builder.finish())
    }

    /// Flushes and releases the append handle.
    ///
    /// Dropping a `Timeline` also flushes as a backstop, but drop cannot
    /// report failures; shutdown paths should close explicitly.
    pub fn close(mut self) -> Result<(), StorageError> {
        self.flush()
    }
}

impl Drop for Timeline {
    fn drop(&mut self) {
        let _ = self.handle.sync_data();
    }
}

/// Forward entry iterator over one log file.
pub struct EntryIter {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
}

impl Iterator for EntryIter {
    type Item = Result<TimelineEntry, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    tracing::warn!(
                        path = %self.path.display(),
                        "skipping non-UTF-8 timeline line"
                    );
                    continue;
                }
                Err(e) => return Some(Err(e.into())),
            };
            if let Some(entry) = parse_line(&self.path, &line) {
                return Some(Ok(entry));
            }
        }
    }
}

/// Backward entry iterator over one log file, newest entry first.
pub struct RevEntryIter {
    path: PathBuf,
    lines: ReverseLines,
}

impl Iterator for RevEntryIter {
    type Item = Result<TimelineEntry, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let bytes = match self.lines.next()? {
                Ok(bytes) => bytes,
                Err(e) => return Some(Err(e.into())),
            };
            let Ok(line) = String::from_utf8(bytes) else {
                tracing::warn!(
                    path = %self.path.display(),
                    "skipping non-UTF-8 timeline line"
                );
                continue;
            };
            if let Some(entry) = parse_line(&self.path, &line) {
                return Some(Ok(entry));
            }
        }
    }
}

/// Decodes one line, dropping blanks and logging garbage.
fn parse_line(path: &Path, line: &str) -> Option<TimelineEntry> {
    let line = line.trim_end_matches('\r');
    if line.is_empty() {
        return None;
    }
    match decode_entry(line) {
        Ok(entry) => Some(entry),
        Err(error) => {
            tracing::warn!(
                path = %path.display(),
                %error,
                line,
                "skipping malformed timeline line"
            );
            None
        }
    }
}
