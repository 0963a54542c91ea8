//! # ole-unpack
//!
//! Recursive unpacker for Office containers and the objects embedded in them.
//!
//! Starting from one input file, every file found is classified and, when it
//! is a container, expanded next to itself into `<path>-members/`. The
//! members are queued and processed the same way, breadth first, until
//! nothing is left. Three container formats are expanded:
//!
//! - compound binary files (legacy `.doc`/`.xls`/`.msg`, OLE2),
//! - OOXML packages (`.docx`/`.xlsx`),
//! - OLE 1.0 native records (`Ole10Native` streams inside compound files).
//!
//! Every file seen gets one [`FileRecord`] in the run's [`Ledger`]. Failures
//! are recorded there and never stop the traversal; only a bad output
//! directory or a failed input copy aborts a run.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ole_unpack::{UnpackConfig, Unpacker};
//! use std::path::Path;
//!
//! fn main() -> ole_unpack::Result<()> {
//!     let unpacker = Unpacker::new(UnpackConfig::default());
//!     let ledger = unpacker.unpack(Path::new("report.doc"), Path::new("out"))?;
//!
//!     for (path, record) in ledger.iter() {
//!         println!("{} {} {}", path.display(), record.file_type, record.error);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// File type classification
pub mod classify;
/// Configuration types
pub mod config;
/// Format dispatch policy
pub mod dispatch;
/// Error types
pub mod error;
/// Container extraction
pub mod extraction;
/// Log sink setup
pub mod logging;
/// OLE 1.0 native record decoding
pub mod ole10;
/// Run report serialization
pub mod report;
/// Core types (ledger, work queue, cancellation)
pub mod types;
/// Recursive unpacking driver
pub mod unpacker;

pub use classify::{Classifier, MagicClassifier, ReadSeek};
pub use config::UnpackConfig;
pub use dispatch::{Classification, Dispatcher, Outcome};
pub use error::{Error, Result};
pub use extraction::Extractor;
pub use ole10::Ole10Record;
pub use types::{CancelFlag, FileRecord, Ledger, WorkQueue};
pub use unpacker::Unpacker;
