//! Decoder for OLE 1.0 native records (`\x01Ole10Native` streams)
//!
//! An OLE 1.0 native record wraps exactly one embedded file plus some path
//! metadata. The layout is loosely documented; this decoder follows the
//! grammar observed in Office-produced packages.
//!
//! ## Record Layout
//!
//! | Field         | Size              | Notes                          |
//! |---------------|-------------------|--------------------------------|
//! | header        | 6                 | skipped                        |
//! | name          | variable, NUL end | file name of the embedded file |
//! | cache path    | variable, NUL end | path on the packaging machine  |
//! | reserved      | variable, NUL end | skipped                        |
//! | reserved      | variable, NUL end | skipped                        |
//! | header        | 6                 | skipped                        |
//! | temp path     | variable, NUL end | packager's temp copy           |
//! | size          | 4 (LE u32)        | payload length                 |
//! | payload       | `size`            | the embedded file              |
//!
//! Bytes after the payload do not belong to the object and are never read.

use crate::error::{DecodeStage, Ole10Error};
use std::io::{self, Read};

/// Length of each of the two fixed headers
const HEADER_LEN: usize = 6;

/// Length of the payload size field
const SIZE_FIELD_LEN: usize = 4;

/// Name used when the recorded name has no usable final segment
pub const FALLBACK_NAME: &str = "Ole10Native.bin";

/// A decoded OLE 1.0 native record
///
/// Metadata is parsed up front by [`Ole10Record::decode`]. The payload is
/// read through the [`Read`] impl, which never yields more than `size` bytes.
#[derive(Debug)]
pub struct Ole10Record {
    /// File name of the embedded object, reduced to its final path segment
    pub name: String,

    /// Original path of the object on the packaging machine (informational)
    pub cache_path: String,

    /// Temp path used by the packager (informational)
    pub temp_path: String,

    /// Declared payload length in bytes
    pub size: u64,

    data: Vec<u8>,
    payload_start: usize,
    delivered: u64,
}

impl Ole10Record {
    /// Decode the metadata of a record held in memory
    ///
    /// Fails with a stage-tagged [`Ole10Error`] if the buffer ends before a
    /// NUL terminator or a fixed-size field.
    pub fn decode(data: Vec<u8>) -> Result<Self, Ole10Error> {
        let mut cursor = FieldCursor::new(&data);

        cursor.skip(HEADER_LEN, DecodeStage::FirstHeader)?;
        let name = sanitize_name(cursor.take_until_nul(DecodeStage::Name)?);
        let cache_path = lossy(cursor.take_until_nul(DecodeStage::CachePath)?);
        cursor.take_until_nul(DecodeStage::Reserved1)?;
        cursor.take_until_nul(DecodeStage::Reserved2)?;
        cursor.skip(HEADER_LEN, DecodeStage::SecondHeader)?;
        let temp_path = lossy(cursor.take_until_nul(DecodeStage::TempPath)?);
        let size = u64::from(cursor.read_u32_le(DecodeStage::Size)?);

        let payload_start = cursor.pos;
        Ok(Self {
            name,
            cache_path,
            temp_path,
            size,
            data,
            payload_start,
            delivered: 0,
        })
    }

    /// Payload bytes not yet delivered
    pub fn remaining(&self) -> u64 {
        self.size - self.delivered
    }

    /// Whether the buffer holds fewer payload bytes than declared
    pub fn is_truncated(&self) -> bool {
        ((self.data.len() - self.payload_start) as u64) < self.size
    }
}

impl Read for Ole10Record {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(0);
        }

        let start = self.payload_start + self.delivered as usize;
        let available = self.data.len().saturating_sub(start);
        if available == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "payload truncated: declared {} bytes, record holds {}",
                    self.size, self.delivered
                ),
            ));
        }

        let n = buf
            .len()
            .min(available)
            .min(usize::try_from(remaining).unwrap_or(usize::MAX));
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        self.delivered += n as u64;
        Ok(n)
    }
}

/// Forward-only cursor over the record's fixed and NUL-terminated fields
struct FieldCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn truncated(&self, stage: DecodeStage) -> Ole10Error {
        Ole10Error::Truncated {
            stage,
            offset: self.pos,
        }
    }

    fn take(&mut self, len: usize, stage: DecodeStage) -> Result<&'a [u8], Ole10Error> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| self.truncated(stage))?;
        let field = &self.data[self.pos..end];
        self.pos = end;
        Ok(field)
    }

    fn skip(&mut self, len: usize, stage: DecodeStage) -> Result<(), Ole10Error> {
        self.take(len, stage).map(|_| ())
    }

    /// Bytes up to (not including) the next NUL; the NUL is consumed
    fn take_until_nul(&mut self, stage: DecodeStage) -> Result<&'a [u8], Ole10Error> {
        let rest = &self.data[self.pos..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| self.truncated(stage))?;
        self.pos += nul + 1;
        Ok(&rest[..nul])
    }

    fn read_u32_le(&mut self, stage: DecodeStage) -> Result<u32, Ole10Error> {
        let bytes = self.take(SIZE_FIELD_LEN, stage)?;
        let mut raw = [0u8; SIZE_FIELD_LEN];
        raw.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(raw))
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Keep only the final path segment of a recorded name
///
/// Both `/` and `\` count as separators. Names that reduce to nothing, `.`
/// or `..` become [`FALLBACK_NAME`].
pub fn sanitize_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.rsplit(['/', '\\']).find(|segment| !segment.is_empty()) {
        Some(segment) if segment != "." && segment != ".." => segment.to_string(),
        _ => FALLBACK_NAME.to_string(),
    }
}
