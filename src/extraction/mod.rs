//! Container extraction
//!
//! Three extractors share one contract: given a container stored at `path`,
//! write its members below `<path>-members/`, queue every member file that
//! was written, and flag the container as expanded in the ledger.
//!
//! - [`Extractor::Cfb`] walks the storages and streams of a compound file.
//! - [`Extractor::OfficeZip`] unpacks the parts of an OOXML package.
//! - [`Extractor::Ole10`] decodes an OLE 1.0 native record into its single
//!   embedded file.
//!
//! Per-member failures do not stop an extractor. They are collected in
//! processing order and returned together as [`Error::Members`](crate::Error::Members).

mod cfb;
mod members;
mod ole10;
mod zip;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use members::member_dir;

use crate::classify::ReadSeek;
use crate::config::UnpackConfig;
use crate::error::Result;
use crate::types::{Ledger, WorkQueue};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Container formats that can be unpacked
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extractor {
    /// Compound binary file (OLE2 / MS-CFB)
    Cfb,
    /// ZIP-based Office package (OOXML)
    OfficeZip,
    /// OLE 1.0 native record
    Ole10,
}

/// State an extractor may touch during one call
///
/// Borrowed from the orchestrator for the duration of a single
/// [`Extractor::extract`] call.
pub struct ExtractContext<'a> {
    /// Run ledger; extractors only flag `Expanded`
    pub ledger: &'a mut Ledger,
    /// Work queue receiving every member file written
    pub queue: &'a mut WorkQueue,
    /// Run configuration (member directory naming and permissions)
    pub config: &'a UnpackConfig,
}

impl Extractor {
    /// Short name used in logs
    pub fn name(self) -> &'static str {
        match self {
            Extractor::Cfb => "CFB",
            Extractor::OfficeZip => "OfficeZip",
            Extractor::Ole10 => "OLE10",
        }
    }

    /// Unpack the container at `path`, read through `reader`
    ///
    /// `size` is the container's length in bytes. Returns the aggregated
    /// member failures, or an error that stopped extraction altogether.
    pub fn extract(
        self,
        path: &Path,
        reader: &mut dyn ReadSeek,
        size: u64,
        ctx: &mut ExtractContext<'_>,
    ) -> Result<()> {
        info!(?path, extractor = self.name(), size, "extracting container");

        match self {
            Extractor::Cfb => cfb::extract(path, reader, ctx),
            Extractor::OfficeZip => zip::extract(path, reader, ctx),
            Extractor::Ole10 => ole10::extract(path, reader, size, ctx),
        }
    }
}
