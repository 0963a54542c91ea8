use crate::error::{MemberErrors, Result};
use crate::extraction::ExtractContext;
use std::ffi::OsString;
use std::fs::{self, DirBuilder, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Directory receiving the members of the container at `path`
///
/// The suffix is appended to the full file name, so `a/b.doc` becomes
/// `a/b.doc-members`.
pub fn member_dir(path: &Path, suffix: &str) -> PathBuf {
    let mut dir = OsString::from(path.as_os_str());
    dir.push(suffix);
    PathBuf::from(dir)
}

/// Create `path` and any missing parents; existing directories are fine
pub(crate) fn create_dir_all(path: &Path, mode: u32) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder.create(path)
}

/// A relative member path segment that cannot leave the member directory
fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains(['/', '\\'])
}

/// Writes one container's members and collects their failures
pub(crate) struct MemberWriter<'c, 'a> {
    ctx: &'c mut ExtractContext<'a>,
    container: PathBuf,
    member_dir: PathBuf,
    errors: MemberErrors,
    written: usize,
}

impl<'c, 'a> MemberWriter<'c, 'a> {
    /// Ensure the member directory of `container` exists
    pub(crate) fn open(container: &Path, ctx: &'c mut ExtractContext<'a>) -> Result<Self> {
        let member_dir = member_dir(container, &ctx.config.member_dir_suffix);
        create_dir_all(&member_dir, ctx.config.dir_mode)?;
        Ok(Self {
            ctx,
            container: container.to_path_buf(),
            member_dir,
            errors: MemberErrors::new(),
            written: 0,
        })
    }

    /// Output path for a member, or `None` if a segment is unsafe
    fn resolve<S: AsRef<str>>(&mut self, segments: &[S]) -> Option<PathBuf> {
        let mut path = self.member_dir.clone();
        for segment in segments {
            let segment = segment.as_ref();
            if !is_safe_segment(segment) {
                let joined: Vec<&str> = segments.iter().map(|s| s.as_ref()).collect();
                self.fail(
                    format!("resolving member path {:?}", joined.join("/")),
                    io::Error::new(io::ErrorKind::InvalidInput, "unsafe member path segment"),
                );
                return None;
            }
            path.push(segment);
        }
        Some(path)
    }

    /// Create the directory for a storage/directory entry
    pub(crate) fn directory<S: AsRef<str>>(&mut self, segments: &[S]) {
        let Some(path) = self.resolve(segments) else {
            return;
        };
        if let Err(e) = create_dir_all(&path, self.ctx.config.dir_mode) {
            self.fail(format!("creating directory {}", path.display()), e);
        }
    }

    /// Write a file entry and queue it on success
    pub(crate) fn file<S: AsRef<str>>(&mut self, segments: &[S], content: &mut dyn Read) {
        let Some(path) = self.resolve(segments) else {
            return;
        };

        if let Some(parent) = path.parent()
            && let Err(e) = create_dir_all(parent, self.ctx.config.dir_mode)
        {
            self.fail(format!("creating directory {}", parent.display()), e);
            return;
        }

        let mut out = match File::create(&path) {
            Ok(out) => out,
            Err(e) => {
                self.fail(format!("creating file {}", path.display()), e);
                return;
            }
        };

        match io::copy(content, &mut out) {
            Ok(bytes) => {
                debug!(member = ?path, bytes, "extracted member");
                self.written += 1;
                self.ctx.queue.push(path);
            }
            Err(e) => {
                drop(out);
                let name = segments.last().map(|s| s.as_ref()).unwrap_or("");
                let mut context = format!("extracting member {} to {}", name, path.display());
                // Partial members are never kept
                if let Err(remove) = fs::remove_file(&path) {
                    context.push_str(&format!(" (removing partial file failed: {remove})"));
                }
                self.fail(context, e);
            }
        }
    }

    /// Record a failure for an entry that could not be handled
    pub(crate) fn fail(&mut self, context: String, error: io::Error) {
        warn!(container = ?self.container, error = %error, %context, "member extraction failed");
        self.errors.push(context, error);
    }

    /// Flag the container as expanded and return the collected failures
    pub(crate) fn finish(self) -> Result<()> {
        self.ctx.ledger.mark_expanded(&self.container);
        self.report();
        self.errors.into_result()
    }

    /// Like [`finish`](Self::finish), but only flags the container when
    /// nothing failed
    pub(crate) fn finish_strict(self) -> Result<()> {
        if self.errors.is_empty() {
            self.ctx.ledger.mark_expanded(&self.container);
        }
        self.report();
        self.errors.into_result()
    }

    fn report(&self) {
        debug!(
            container = ?self.container,
            member_dir = ?self.member_dir,
            written = self.written,
            failed = self.errors.len(),
            "finished writing members"
        );
    }
}
