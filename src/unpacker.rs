//! Recursive unpacking driver
//!
//! The run goes through three phases:
//! 1. Setup - validate the output directory and copy the input into it
//! 2. Traverse - breadth-first classify/extract loop over the work queue
//! 3. Done - hand the completed ledger back to the caller
//!
//! Only setup failures end a run early. Anything that goes wrong with a
//! single file is written to that file's ledger entry.

use crate::classify::{Classifier, MagicClassifier, ReadSeek};
use crate::config::UnpackConfig;
use crate::dispatch::{Dispatcher, Outcome};
use crate::error::{Result, SetupError};
use crate::extraction::{ExtractContext, Extractor};
use crate::types::{CancelFlag, FileRecord, Ledger, WorkQueue};
use std::fs::{self, File};
use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{Dispatch, debug, dispatcher, info, info_span, warn};

/// Error recorded for paths still queued when a run is cancelled
pub const CANCELLED_ERROR: &str = "cancelled before extraction";

/// Drives one or more unpack runs
pub struct Unpacker<C = MagicClassifier> {
    /// Run configuration
    config: UnpackConfig,
    /// Classifier plus dispatch policy
    dispatcher: Dispatcher<C>,
    /// Log sink every run is scoped to
    log: Dispatch,
    /// Polled between dequeues
    cancel: CancelFlag,
}

impl Unpacker<MagicClassifier> {
    /// Create an unpacker with the default magic-byte classifier
    pub fn new(config: UnpackConfig) -> Self {
        let classifier = MagicClassifier::new(config.classify_sample_len);
        Self::with_classifier(config, classifier)
    }
}

impl<C: Classifier> Unpacker<C> {
    /// Create an unpacker around a custom classifier
    ///
    /// Logs go to the dispatcher that is current at construction time.
    pub fn with_classifier(config: UnpackConfig, classifier: C) -> Self {
        Self {
            config,
            dispatcher: Dispatcher::new(classifier),
            log: dispatcher::get_default(|current| current.clone()),
            cancel: CancelFlag::new(),
        }
    }

    /// Send this unpacker's logs to `log` instead
    pub fn with_log_dispatch(mut self, log: Dispatch) -> Self {
        self.log = log;
        self
    }

    /// Poll `cancel` between dequeues
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle for cancelling runs of this unpacker
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Run configuration
    pub fn config(&self) -> &UnpackConfig {
        &self.config
    }

    /// Unpack `infile` recursively into `outdir`
    ///
    /// `outdir` must already exist. The input is copied into it and every
    /// container found is expanded next to its copy under
    /// `<path><member_dir_suffix>/`.
    ///
    /// # Errors
    ///
    /// Only [`Error::Setup`](crate::Error::Setup) is returned. Per-file
    /// failures are recorded in the returned ledger.
    pub fn unpack(&self, infile: &Path, outdir: &Path) -> Result<Ledger> {
        dispatcher::with_default(&self.log, || {
            let span = info_span!("unpack", infile = ?infile, outdir = ?outdir);
            let _enter = span.enter();
            self.run(infile, outdir)
        })
    }

    fn run(&self, infile: &Path, outdir: &Path) -> Result<Ledger> {
        let root = prepare_output(infile, outdir)?;
        info!(root = ?root, "starting unpack");

        let mut ledger = Ledger::new();
        let mut queue = WorkQueue::new();
        queue.push(root);

        while let Some(path) = queue.pop() {
            if self.cancel.is_cancelled() {
                cancel_remaining(path, &mut queue, &mut ledger);
                break;
            }
            self.process(&path, &mut ledger, &mut queue);
        }

        info!(entries = ledger.len(), "unpack finished");
        Ok(ledger)
    }

    /// Classify one path and run its extractor, recording any failure
    fn process(&self, path: &Path, ledger: &mut Ledger, queue: &mut WorkQueue) {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                warn!(?path, error = %e, "cannot open queued file");
                ledger.create(path, FileRecord::new("", false));
                ledger.set_error(path, e.to_string());
                return;
            }
        };

        let classification = self.dispatcher.classify(path, &mut file, ledger);
        let Outcome::Extract { extractor, .. } = classification.outcome else {
            debug!(?path, file_type = %classification.file_type, "no extraction");
            return;
        };

        if let Err(e) = self.extract(extractor, path, &mut file, ledger, queue) {
            warn!(?path, extractor = extractor.name(), error = %e, "extraction failed");
            ledger.set_error(path, e.to_string());
        }
    }

    fn extract(
        &self,
        extractor: Extractor,
        path: &Path,
        file: &mut File,
        ledger: &mut Ledger,
        queue: &mut WorkQueue,
    ) -> Result<()> {
        let size = file.metadata()?.len();
        file.seek(SeekFrom::Start(0))?;

        let mut ctx = ExtractContext {
            ledger,
            queue,
            config: &self.config,
        };
        let reader: &mut dyn ReadSeek = file;
        extractor.extract(path, reader, size, &mut ctx)
    }
}

/// Validate `outdir` and copy `infile` into it, returning the copy's path
fn prepare_output(infile: &Path, outdir: &Path) -> Result<PathBuf> {
    let meta = fs::metadata(outdir).map_err(|source| SetupError::OutputDirUnavailable {
        path: outdir.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(SetupError::NotADirectory {
            path: outdir.to_path_buf(),
        }
        .into());
    }

    let not_a_file = || SetupError::NotARegularFile {
        path: infile.to_path_buf(),
    };
    let is_file = fs::metadata(infile).map(|m| m.is_file()).unwrap_or(false);
    let Some(name) = infile.file_name().filter(|_| is_file) else {
        return Err(not_a_file().into());
    };

    let root = outdir.join(name);
    if is_same_file(infile, &root) {
        debug!(?root, "input already in output directory, skipping copy");
        return Ok(root);
    }

    fs::copy(infile, &root).map_err(|source| SetupError::CopyRoot {
        from: infile.to_path_buf(),
        to: root.clone(),
        source,
    })?;
    debug!(from = ?infile, to = ?root, "copied input into output directory");
    Ok(root)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Give `current` and every path still queued a cancellation entry
fn cancel_remaining(current: PathBuf, queue: &mut WorkQueue, ledger: &mut Ledger) {
    let mut remaining = vec![current];
    remaining.extend(queue.drain());
    warn!(remaining = remaining.len(), "unpack cancelled");

    for path in remaining {
        ledger.create(&path, FileRecord::new("", false));
        ledger.set_error(&path, CANCELLED_ERROR);
    }
}
