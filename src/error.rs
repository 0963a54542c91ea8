//! Error types for ole-unpack
//!
//! Errors fall into two groups:
//! - Setup errors ([`SetupError`]) abort a whole run before anything is recorded.
//! - Everything else is node-local: it is rendered into the failing path's
//!   ledger entry and the traversal carries on.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for ole-unpack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ole-unpack
#[derive(Debug, Error)]
pub enum Error {
    /// Fatal setup failure (output directory or root copy)
    #[error("setup error: {0}")]
    Setup(#[from] SetupError),

    /// Malformed or truncated OLE 1.0 native record
    #[error("decode error: {0}")]
    Decode(#[from] Ole10Error),

    /// ZIP container could not be opened
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// One or more members of a container could not be written
    #[error("{0}")]
    Members(#[from] MemberErrors),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "member_dir_suffix")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error aborts the whole run rather than a single node
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Setup(_))
    }
}

/// Failures that happen before the traversal starts
#[derive(Debug, Error)]
pub enum SetupError {
    /// The output directory could not be inspected (usually missing)
    #[error("cannot access output directory {path}: {source}")]
    OutputDirUnavailable {
        /// The configured output directory
        path: PathBuf,
        /// Underlying stat failure
        #[source]
        source: io::Error,
    },

    /// The output path exists but is not a directory
    #[error("output path is not a directory: {path}")]
    NotADirectory {
        /// The configured output path
        path: PathBuf,
    },

    /// The input is not a regular file
    #[error("not a regular file: {path}")]
    NotARegularFile {
        /// The input path
        path: PathBuf,
    },

    /// Copying the input into the output directory failed
    #[error("failed to copy {from} to {to}: {source}")]
    CopyRoot {
        /// The input path
        from: PathBuf,
        /// Destination inside the output directory
        to: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
}

/// Grammar stage of an OLE 1.0 native record
///
/// Used to tag decode failures so callers can tell a record truncated before
/// the name apart from one truncated before the size field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeStage {
    /// Leading 6-byte header
    FirstHeader,
    /// Null-terminated member name
    Name,
    /// Null-terminated cache path
    CachePath,
    /// First unused null-terminated field
    Reserved1,
    /// Second unused null-terminated field
    Reserved2,
    /// Second 6-byte header
    SecondHeader,
    /// Null-terminated temp path
    TempPath,
    /// 4-byte little-endian payload size
    Size,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecodeStage::FirstHeader => "first header",
            DecodeStage::Name => "member name",
            DecodeStage::CachePath => "cache path",
            DecodeStage::Reserved1 => "reserved field 1",
            DecodeStage::Reserved2 => "reserved field 2",
            DecodeStage::SecondHeader => "second header",
            DecodeStage::TempPath => "temp path",
            DecodeStage::Size => "payload size",
        };
        f.write_str(s)
    }
}

/// OLE 1.0 native record decode errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Ole10Error {
    /// The buffer ended before a stage could complete
    #[error("record truncated while reading {stage} at offset {offset}")]
    Truncated {
        /// The stage that could not complete
        stage: DecodeStage,
        /// Offset into the record where the stage started
        offset: usize,
    },
}

impl Ole10Error {
    /// The grammar stage that failed
    pub fn stage(&self) -> DecodeStage {
        match self {
            Ole10Error::Truncated { stage, .. } => *stage,
        }
    }
}

/// A single member that could not be extracted
#[derive(Debug)]
pub struct MemberFailure {
    /// What was being attempted, e.g. "creating file /out/a-members/b"
    pub context: String,
    /// Underlying I/O failure
    pub source: io::Error,
}

impl fmt::Display for MemberFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.context)
    }
}

/// Ordered member failures collected during one extractor call
///
/// Order matches the order entries were processed in. Displayed one failure
/// per line.
#[derive(Debug, Default)]
pub struct MemberErrors {
    failures: Vec<MemberFailure>,
}

impl MemberErrors {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure
    pub fn push(&mut self, context: impl Into<String>, source: io::Error) {
        self.failures.push(MemberFailure {
            context: context.into(),
            source,
        });
    }

    /// Whether nothing failed
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of failures
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Failures in processing order
    pub fn iter(&self) -> impl Iterator<Item = &MemberFailure> {
        self.failures.iter()
    }

    /// `Ok(())` when empty, otherwise `Err(Error::Members)`
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Members(self))
        }
    }
}

impl fmt::Display for MemberErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MemberErrors {}
