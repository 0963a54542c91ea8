use crate::classify::ReadSeek;
use crate::error::Result;
use crate::ole10::Ole10Record;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

use super::ExtractContext;
use super::members::MemberWriter;

/// Unpack the single object embedded in an OLE 1.0 native record
///
/// The object is written to `<path>-members/<name>`, where `name` is the
/// record's sanitized file name. The container is only flagged as expanded
/// when the object was written in full.
pub(super) fn extract(
    path: &Path,
    reader: &mut dyn ReadSeek,
    size: u64,
    ctx: &mut ExtractContext<'_>,
) -> Result<()> {
    let mut writer = MemberWriter::open(path, ctx)?;

    let mut data = Vec::with_capacity(usize::try_from(size).unwrap_or(0));
    (&mut *reader).take(size).read_to_end(&mut data)?;

    let mut record = Ole10Record::decode(data)?;
    debug!(
        ?path,
        name = %record.name,
        cache_path = %record.cache_path,
        temp_path = %record.temp_path,
        size = record.size,
        "decoded OLE 1.0 native record"
    );
    if record.is_truncated() {
        warn!(?path, declared = record.size, "OLE 1.0 payload shorter than declared size");
    }

    let name = record.name.clone();
    writer.file(&[name], &mut record);
    writer.finish_strict()
}
