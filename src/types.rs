//! Core types for ole-unpack

use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Outcome recorded for one processed file
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FileRecord {
    /// MIME-like type reported by the classifier ("" when unknown)
    pub file_type: String,

    /// An extraction attempt ran for this file
    pub expanded: bool,

    /// The file's type is one the dispatcher recognizes
    pub supported: bool,

    /// Error text, empty when nothing failed
    pub error: String,
}

impl FileRecord {
    /// Fresh record as created at classification time
    pub fn new(file_type: impl Into<String>, supported: bool) -> Self {
        Self {
            file_type: file_type.into(),
            expanded: false,
            supported,
            error: String::new(),
        }
    }
}

/// Per-path outcome ledger for one run
///
/// Entries are created once and never removed. After creation only
/// `expanded` and `error` change.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(rename = "ParsedFiles", serialize_with = "serialize_lossy_keys")]
    entries: BTreeMap<PathBuf, FileRecord>,
}

/// Paths that are not valid UTF-8 are written with replacement characters
fn serialize_lossy_keys<S: Serializer>(
    entries: &BTreeMap<PathBuf, FileRecord>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(entries.iter().map(|(path, record)| (path.to_string_lossy(), record)))
}

impl Ledger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the entry for `path`
    ///
    /// Returns `false` and leaves the existing entry untouched if one exists.
    pub fn create(&mut self, path: &Path, record: FileRecord) -> bool {
        if self.entries.contains_key(path) {
            return false;
        }
        self.entries.insert(path.to_path_buf(), record);
        true
    }

    /// Look up the entry for `path`
    pub fn get(&self, path: &Path) -> Option<&FileRecord> {
        self.entries.get(path)
    }

    /// Whether `path` has an entry
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Flag that an extraction attempt ran for `path`
    pub fn mark_expanded(&mut self, path: &Path) {
        if let Some(record) = self.entries.get_mut(path) {
            record.expanded = true;
        }
    }

    /// Record an error for `path`
    pub fn set_error(&mut self, path: &Path, error: impl Into<String>) {
        if let Some(record) = self.entries.get_mut(path) {
            record.error = error.into();
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in path order
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &FileRecord)> {
        self.entries.iter()
    }
}

/// FIFO of paths waiting to be processed
///
/// A path is accepted at most once over the queue's lifetime.
#[derive(Debug, Default)]
pub struct WorkQueue {
    pending: VecDeque<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl WorkQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path`; returns `false` if it was accepted before
    pub fn push(&mut self, path: PathBuf) -> bool {
        if !self.seen.insert(path.clone()) {
            return false;
        }
        self.pending.push_back(path);
        true
    }

    /// Take the oldest pending path
    pub fn pop(&mut self) -> Option<PathBuf> {
        self.pending.pop_front()
    }

    /// Number of pending paths
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return everything still pending, in order
    pub fn drain(&mut self) -> Vec<PathBuf> {
        self.pending.drain(..).collect()
    }
}

/// Shared cancellation signal, polled between dequeues
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create an unset flag
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
