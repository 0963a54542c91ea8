//! Container fixtures built at test time

use std::io::{Cursor, Write};

/// `CompObj` stream content; starts with binary bytes so it sniffs as octet-stream
pub const COMP_OBJ: &[u8] = b"\x01\x00\xFE\xFF\x03\x0A\x00\x00\xFF\xFF\xFF\xFF";

/// Minimal OOXML content types part
pub const CONTENT_TYPES: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#;

/// Minimal main document part
pub const DOCUMENT_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"/>"#;

/// Text payload carried by the embedded object fixtures
pub const SECRET_TEXT: &[u8] = b"quarterly numbers, do not forward\n";

/// Assemble an OLE 1.0 native record
///
/// `trailing` is appended after the declared payload and must never show up
/// in extracted output.
pub fn ole10_record(name: &str, payload: &[u8], trailing: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&[0x10, 0x00, 0x00, 0x00, 0x02, 0x00]);
    out.extend_from_slice(name.as_bytes());
    out.push(0);
    out.extend_from_slice(format!(r"C:\Users\victim\AppData\Local\Temp\{name}").as_bytes());
    out.push(0);
    out.push(0);
    out.extend_from_slice(b"reserved");
    out.push(0);
    out.extend_from_slice(&[0x00, 0x00, 0x03, 0x00, 0x40, 0x00]);
    out.extend_from_slice(format!(r"C:\Users\victim\AppData\Local\Temp\2\{name}").as_bytes());
    out.push(0);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(trailing);
    out
}

/// Build a compound file in memory from storages and streams
pub fn compound_file(storages: &[&str], streams: &[(&str, &[u8])]) -> Vec<u8> {
    let mut comp = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
    for storage in storages {
        comp.create_storage(storage).unwrap();
    }
    for (name, content) in streams {
        comp.create_stream(name).unwrap().write_all(content).unwrap();
    }
    comp.flush().unwrap();
    comp.into_inner().into_inner()
}

/// Build a stored (uncompressed) ZIP archive in memory
pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Compound file embedding `payload` as `name` in an OLE 1.0 object
///
/// Mirrors how Word stores a packaged attachment: the object storage holds
/// `\x01Ole10Native` next to its `\x01CompObj` metadata.
pub fn embedded_object(name: &str, payload: &[u8]) -> Vec<u8> {
    let native = ole10_record(name, payload, b"TRAILER-NOT-PART-OF-THE-OBJECT");
    compound_file(
        &[],
        &[("/\u{1}Ole10Native", &native), ("/\u{1}CompObj", COMP_OBJ)],
    )
}

/// A `.docx` package with an embedded OLE object carrying `payload` as `name`
pub fn docx_with_embedded_object(name: &str, payload: &[u8]) -> Vec<u8> {
    let object = embedded_object(name, payload);
    zip_archive(&[
        ("[Content_Types].xml", CONTENT_TYPES),
        ("word/document.xml", DOCUMENT_XML),
        ("word/embeddings/oleObject1.bin", &object),
    ])
}
