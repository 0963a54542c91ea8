//! File type classification
//!
//! The dispatcher only needs a MIME-like string per file. [`MagicClassifier`]
//! produces one from magic bytes, refining compound files and ZIP packages by
//! peeking at their directory. Classification never fails: problems are
//! logged and reported as an unknown type.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use tracing::{debug, warn};

/// MIME strings the dispatcher recognizes
pub mod mime {
    /// Word document package (.docx)
    pub const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
    /// Spreadsheet package (.xlsx)
    pub const XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
    /// Presentation package (.pptx)
    pub const PPTX: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.presentation";
    /// Plain ZIP archive
    pub const ZIP: &str = "application/zip";
    /// Compound binary file (OLE2 / MS-CFB)
    pub const OLE_STORAGE: &str = "application/x-ole-storage";
    /// Outlook message, itself a compound file
    pub const OUTLOOK_MSG: &str = "application/vnd.ms-outlook";
    /// Unrecognized binary data
    pub const OCTET_STREAM: &str = "application/octet-stream";
    /// PNG image
    pub const PNG: &str = "image/png";
    /// JPEG image
    pub const JPEG: &str = "image/jpeg";
    /// JPEG XR image
    pub const JXR: &str = "image/jxr";
    /// PDF document
    pub const PDF: &str = "application/pdf";
    /// UTF-8 XML
    pub const XML_UTF8: &str = "text/xml; charset=utf-8";
    /// UTF-8 text
    pub const TEXT_UTF8: &str = "text/plain; charset=utf-8";
    /// Text in an unknown 8-bit encoding
    pub const TEXT: &str = "text/plain";
}

/// Compound binary file signature
const CFB_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Root storage CLSID of Outlook .msg files
const OUTLOOK_MSG_CLSID: &str = "00020d0b-0000-0000-c000-000000000046";

/// A seekable byte stream
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Classifies a byte stream into a MIME-like string
///
/// Implementations may move the stream position; callers rewind afterwards.
pub trait Classifier {
    /// Return the stream's type, or `None` if it could not be determined
    fn classify(&self, path: &Path, reader: &mut dyn ReadSeek) -> Option<String>;
}

/// Magic-byte classifier backed by `infer`, `cfb` and `zip`
#[derive(Clone, Debug)]
pub struct MagicClassifier {
    sample_len: usize,
}

impl Default for MagicClassifier {
    fn default() -> Self {
        Self::new(3072)
    }
}

impl MagicClassifier {
    /// Create a classifier that sniffs the first `sample_len` bytes
    pub fn new(sample_len: usize) -> Self {
        Self {
            sample_len: sample_len.max(1),
        }
    }

    fn detect(&self, reader: &mut dyn ReadSeek) -> io::Result<String> {
        let mut sample = Vec::with_capacity(self.sample_len);
        (&mut *reader)
            .take(self.sample_len as u64)
            .read_to_end(&mut sample)?;

        if sample.starts_with(&CFB_MAGIC) {
            reader.seek(SeekFrom::Start(0))?;
            return Ok(classify_compound(reader).to_string());
        }

        if let Some(kind) = infer::get(&sample) {
            let detected = kind.mime_type();
            return match detected {
                mime::ZIP | mime::DOCX | mime::XLSX | mime::PPTX => {
                    reader.seek(SeekFrom::Start(0))?;
                    Ok(classify_zip(reader, detected).to_string())
                }
                "image/vnd.ms-photo" => Ok(mime::JXR.to_string()),
                // infer knows XML but not its charset
                "text/xml" => Ok(classify_text(&sample).to_string()),
                other => Ok(other.to_string()),
            };
        }

        Ok(classify_text(&sample).to_string())
    }
}

impl Classifier for MagicClassifier {
    fn classify(&self, path: &Path, reader: &mut dyn ReadSeek) -> Option<String> {
        match self.detect(reader) {
            Ok(file_type) => {
                debug!(?path, %file_type, "classified file");
                Some(file_type)
            }
            Err(e) => {
                warn!(?path, error = %e, "getting MIME type");
                None
            }
        }
    }
}

/// Tell Outlook messages apart from other compound files
fn classify_compound(reader: &mut dyn ReadSeek) -> &'static str {
    match cfb::CompoundFile::open(reader) {
        Ok(comp) => {
            if comp.root_entry().clsid().to_string() == OUTLOOK_MSG_CLSID {
                mime::OUTLOOK_MSG
            } else {
                mime::OLE_STORAGE
            }
        }
        Err(e) => {
            debug!(error = %e, "compound file signature without a readable directory");
            mime::OLE_STORAGE
        }
    }
}

/// Refine a ZIP guess by looking at the package's entry names
fn classify_zip<'a>(reader: &mut dyn ReadSeek, guess: &'a str) -> &'a str {
    let archive = match zip::ZipArchive::new(reader) {
        Ok(archive) => archive,
        Err(e) => {
            debug!(error = %e, "ZIP signature without a readable central directory");
            return guess;
        }
    };

    let mut content_types = false;
    let (mut word, mut xl, mut ppt) = (false, false, false);
    for name in archive.file_names() {
        content_types |= name == "[Content_Types].xml";
        word |= name.starts_with("word/");
        xl |= name.starts_with("xl/");
        ppt |= name.starts_with("ppt/");
    }

    match (content_types, word, xl, ppt) {
        (true, true, _, _) => mime::DOCX,
        (true, _, true, _) => mime::XLSX,
        (true, _, _, true) => mime::PPTX,
        _ => mime::ZIP,
    }
}

/// Binary data bytes as defined by the WHATWG MIME sniffing standard
fn is_binary_byte(b: u8) -> bool {
    b <= 0x08 || b == 0x0B || (0x0E..=0x1A).contains(&b) || (0x1C..=0x1F).contains(&b)
}

fn classify_text(sample: &[u8]) -> &'static str {
    if sample.iter().copied().any(is_binary_byte) {
        return mime::OCTET_STREAM;
    }

    let text = match std::str::from_utf8(sample) {
        Ok(text) => text,
        // The sample window may cut a multi-byte character in half
        Err(e) if e.error_len().is_none() => {
            std::str::from_utf8(&sample[..e.valid_up_to()]).unwrap_or_default()
        }
        Err(_) => return mime::TEXT,
    };

    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    if text.trim_start().starts_with("<?xml") {
        mime::XML_UTF8
    } else {
        mime::TEXT_UTF8
    }
}
