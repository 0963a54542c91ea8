//! Format dispatch
//!
//! Maps a classified file to either one of the three extractors or a
//! terminal outcome, and creates the file's ledger entry.

use crate::classify::{Classifier, ReadSeek, mime};
use crate::extraction::Extractor;
use crate::types::{FileRecord, Ledger};
use std::path::Path;
use tracing::debug;

/// Stream names inside compound files that hold OLE 1.0 native records
const OLE10_NATIVE_NAME: &str = "Ole10Native";

/// Compound file metadata streams with nothing to extract
const METADATA_STREAM_NAMES: [&str; 2] = ["CompObj", "ObjInfo"];

/// What to do with a classified file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Hand the file to an extractor
    Extract {
        /// Extractor for the file's container format
        extractor: Extractor,
        /// Value recorded in the ledger's `Supported` field
        supported: bool,
    },
    /// No extraction
    Terminal {
        /// Value recorded in the ledger's `Supported` field
        supported: bool,
        /// Reason recorded in the ledger's `Error` field
        error: Option<String>,
    },
}

impl Outcome {
    /// Value recorded in the ledger's `Supported` field
    pub fn supported(&self) -> bool {
        match self {
            Outcome::Extract { supported, .. } | Outcome::Terminal { supported, .. } => *supported,
        }
    }

    /// The selected extractor, if any
    pub fn extractor(&self) -> Option<Extractor> {
        match self {
            Outcome::Extract { extractor, .. } => Some(*extractor),
            Outcome::Terminal { .. } => None,
        }
    }

    fn leaf() -> Self {
        Outcome::Terminal {
            supported: true,
            error: None,
        }
    }

    fn unsupported(error: String) -> Self {
        Outcome::Terminal {
            supported: false,
            error: Some(error),
        }
    }
}

/// Select the outcome for a file of type `file_type` stored at `path`
///
/// Compound files are extracted but recorded as unsupported.
pub fn select(path: &Path, file_type: &str) -> Outcome {
    match file_type {
        mime::DOCX | mime::XLSX => Outcome::Extract {
            extractor: Extractor::OfficeZip,
            supported: true,
        },
        mime::OLE_STORAGE => Outcome::Extract {
            extractor: Extractor::Cfb,
            supported: false,
        },
        mime::OCTET_STREAM => select_generic_binary(path),
        mime::PNG
        | mime::JPEG
        | mime::JXR
        | mime::PDF
        | mime::OUTLOOK_MSG
        | mime::XML_UTF8
        | mime::TEXT_UTF8 => Outcome::leaf(),
        other => Outcome::unsupported(format!("unsupported file type for extraction: {other}")),
    }
}

/// Generic binary data is recognized by its file name alone
fn select_generic_binary(path: &Path) -> Outcome {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    if name == OLE10_NATIVE_NAME {
        return Outcome::Extract {
            extractor: Extractor::Ole10,
            supported: true,
        };
    }
    if METADATA_STREAM_NAMES.contains(&name.as_str()) || extension.as_deref() == Some("emf") {
        return Outcome::leaf();
    }

    let dotted = extension.map(|e| format!(".{e}")).unwrap_or_default();
    Outcome::unsupported(format!(
        "unsupported filename/extension pattern for extraction from {}: {}/{}",
        mime::OCTET_STREAM,
        name,
        dotted
    ))
}

/// A classified file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    /// Type recorded in the ledger ("" when unknown)
    pub file_type: String,
    /// Selected outcome
    pub outcome: Outcome,
}

/// Classifies files and creates their ledger entries
#[derive(Clone, Debug)]
pub struct Dispatcher<C> {
    classifier: C,
}

impl<C: Classifier> Dispatcher<C> {
    /// Create a dispatcher around a classifier
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    /// Classify `path` and select its outcome
    ///
    /// A path that already has a ledger entry keeps its recorded type and is
    /// not classified again. Otherwise the entry is created here, before any
    /// extraction, with `Supported` set from the outcome and the terminal
    /// error (if any) filled in. The stream position is unspecified afterwards.
    pub fn classify(
        &self,
        path: &Path,
        reader: &mut dyn ReadSeek,
        ledger: &mut Ledger,
    ) -> Classification {
        let file_type = match ledger.get(path) {
            Some(existing) => existing.file_type.clone(),
            None => self.classifier.classify(path, reader).unwrap_or_default(),
        };
        let outcome = select(path, &file_type);

        let mut record = FileRecord::new(file_type.clone(), outcome.supported());
        if let Outcome::Terminal {
            error: Some(error), ..
        } = &outcome
        {
            record.error = error.clone();
        }
        if !ledger.create(path, record) {
            debug!(?path, "ledger entry already present, keeping recorded type");
        }

        debug!(?path, %file_type, ?outcome, "dispatched file");
        Classification { file_type, outcome }
    }
}
