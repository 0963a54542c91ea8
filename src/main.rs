//! ole-unpack - recursively unpack Office documents and embedded objects
//!
//! Usage:
//!   ole-unpack -i report.doc -o out/
//!   ole-unpack -i report.docx -o out/ --log-format json
//!
//! The input is copied into the output directory and expanded in place.
//! A JSON report of every file seen is written to `out/ole.log`.

use clap::Parser;
use ole_unpack::logging::{self, LogFormat};
use ole_unpack::{Result, UnpackConfig, Unpacker, report};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Recursively unpack compound files, OOXML packages and OLE 1.0 objects
#[derive(Parser, Debug)]
#[command(name = "ole-unpack", version, about)]
struct Args {
    /// File to unpack
    #[arg(short = 'i', long = "infile")]
    infile: PathBuf,

    /// Existing directory receiving the copy, its members and the report
    #[arg(short = 'o', long = "outdir")]
    outdir: PathBuf,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// Skip writing the report file
    #[arg(long)]
    no_report: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let log = logging::init(args.log_format);

    match run(args, log) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "unpack failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args, log: tracing::Dispatch) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => UnpackConfig::from_file(path)?,
        None => UnpackConfig::default(),
    };
    if args.no_report {
        config.write_report = false;
    }

    let unpacker = Unpacker::new(config).with_log_dispatch(log);
    let ledger = unpacker.unpack(&args.infile, &args.outdir)?;

    let failed = ledger.iter().filter(|(_, record)| !record.error.is_empty()).count();
    info!(files = ledger.len(), failed, "traversal complete");

    if unpacker.config().write_report {
        let path = report::report_path(&args.outdir, unpacker.config());
        report::write_report(&ledger, &path)?;
    }
    Ok(())
}
