use crate::classify::ReadSeek;
use crate::error::Result;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use super::ExtractContext;
use super::members::MemberWriter;

/// Unpack every storage and stream of a compound file
///
/// Storages become directories and streams become files, mirroring the
/// compound file's own tree under `<path>-members/`.
pub(super) fn extract(path: &Path, reader: &mut dyn ReadSeek, ctx: &mut ExtractContext<'_>) -> Result<()> {
    let mut writer = MemberWriter::open(path, ctx)?;
    let mut comp = cfb::CompoundFile::open(reader)?;

    // Snapshot the directory first; opening streams needs the file mutably
    let entries: Vec<(PathBuf, bool)> = comp
        .walk()
        .map(|entry| (entry.path().to_path_buf(), entry.is_storage()))
        .collect();

    debug!(?path, entries = entries.len(), "opened compound file");

    for (entry_path, is_storage) in entries {
        let segments = member_segments(&entry_path);
        // The root storage maps onto the member directory itself
        if segments.is_empty() {
            continue;
        }

        if is_storage {
            writer.directory(&segments);
            continue;
        }

        match comp.open_stream(&entry_path) {
            Ok(mut stream) => writer.file(&segments, &mut stream),
            Err(e) => writer.fail(format!("opening stream {}", entry_path.display()), e),
        }
    }

    writer.finish()
}

/// Member path segments for a compound file entry path
///
/// Leading control characters mark special streams (`\x01Ole10Native`,
/// `\x05SummaryInformation`) and are dropped from the output names.
fn member_segments(entry_path: &Path) -> Vec<String> {
    entry_path
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(strip_control_prefix(&name.to_string_lossy())),
            _ => None,
        })
        .collect()
}

fn strip_control_prefix(name: &str) -> String {
    name.trim_start_matches(char::is_control).to_string()
}
