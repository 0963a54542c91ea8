use crate::classify::ReadSeek;
use crate::error::Result;
use std::io;
use std::path::{Component, Path};
use tracing::debug;

use super::ExtractContext;
use super::members::MemberWriter;

/// Unpack every part of an OOXML package
///
/// Parts keep their relative path inside the package, so
/// `word/document.xml` lands at `<path>-members/word/document.xml`.
pub(super) fn extract(path: &Path, reader: &mut dyn ReadSeek, ctx: &mut ExtractContext<'_>) -> Result<()> {
    let mut writer = MemberWriter::open(path, ctx)?;
    let mut archive = zip::ZipArchive::new(reader)?;

    debug!(?path, entries = archive.len(), "opened ZIP package");

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                writer.fail(format!("opening archive member #{index}"), io::Error::other(e));
                continue;
            }
        };

        // enclosed_name rejects absolute names and names that climb out of the archive root
        let Some(segments) = entry.enclosed_name().map(relative_segments) else {
            writer.fail(
                format!("opening archive member {}", entry.name()),
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "member path escapes the member directory",
                ),
            );
            continue;
        };
        if segments.is_empty() {
            continue;
        }

        if entry.is_dir() {
            writer.directory(&segments);
        } else {
            writer.file(&segments, &mut entry);
        }
    }

    writer.finish()
}

/// Normal path segments of an enclosed member name, with `..` resolved
fn relative_segments(name: &Path) -> Vec<String> {
    let mut segments = Vec::new();
    for component in name.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                segments.pop();
            }
            _ => {}
        }
    }
    segments
}
