//! Run report
//!
//! The ledger is written once, at the end of a run, as
//! `{"ParsedFiles": {"<path>": {"FileType", "Expanded", "Supported", "Error"}}}`.

use crate::config::UnpackConfig;
use crate::error::Result;
use crate::types::Ledger;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Where the report for a run into `outdir` goes
pub fn report_path(outdir: &Path, config: &UnpackConfig) -> PathBuf {
    outdir.join(&config.report_file_name)
}

/// Serialize `ledger` to `path`, replacing any existing file
pub fn write_report(ledger: &Ledger, path: &Path) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut out, ledger)?;
    out.write_all(b"\n")?;
    out.flush()?;

    info!(path = ?path, entries = ledger.len(), "wrote run report");
    Ok(())
}
