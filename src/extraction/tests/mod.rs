use crate::config::UnpackConfig;
use crate::error::Error;
use crate::extraction::*;
use crate::ole10::tests::build_record;
use crate::types::{FileRecord, Ledger, WorkQueue};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Result of running one extractor against a file on disk
struct Run {
    result: crate::Result<()>,
    ledger: Ledger,
    queued: Vec<PathBuf>,
}

/// Run `extractor` on `path` with a fresh ledger entry and queue
fn run_extractor(extractor: Extractor, path: &Path) -> Run {
    let config = UnpackConfig::default();
    let mut ledger = Ledger::new();
    ledger.create(path, FileRecord::new("test/container", true));
    let mut queue = WorkQueue::new();

    let mut file = File::open(path).unwrap();
    let size = file.metadata().unwrap().len();
    let result = {
        let mut ctx = ExtractContext {
            ledger: &mut ledger,
            queue: &mut queue,
            config: &config,
        };
        extractor.extract(path, &mut file, size, &mut ctx)
    };

    Run {
        result,
        ledger,
        queued: queue.drain(),
    }
}

/// Create a ZIP archive with the given files (stored, no compression)
fn create_zip_archive(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Stored);
    for (name, content) in files {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content).unwrap();
        }
    }
    writer.finish().unwrap();
}

/// Create a compound file with the given storages and streams
fn create_compound_file(path: &Path, storages: &[&str], streams: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut comp = ::cfb::CompoundFile::create(file).unwrap();
    for storage in storages {
        comp.create_storage(storage).unwrap();
    }
    for (name, content) in streams {
        let mut stream = comp.create_stream(name).unwrap();
        stream.write_all(content).unwrap();
    }
    comp.flush().unwrap();
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn expanded(run: &Run, path: &Path) -> bool {
    run.ledger.get(path).unwrap().expanded
}

// ---------------------------------------------------------------------------
// OOXML packages
// ---------------------------------------------------------------------------

#[test]
fn test_zip_writes_parts_and_queues_them() {
    let dir = TempDir::new().unwrap();
    let docx = dir.path().join("report.docx");
    create_zip_archive(
        &docx,
        &[
            ("[Content_Types].xml", b"<Types/>"),
            ("word/", b""),
            ("word/document.xml", b"<w:document/>"),
            ("word/embeddings/oleObject1.bin", b"\xd0\xcf\x11\xe0"),
        ],
    );

    let run = run_extractor(Extractor::OfficeZip, &docx);
    assert!(run.result.is_ok());
    assert!(expanded(&run, &docx));

    let members = member_dir(&docx, "-members");
    assert_eq!(members, dir.path().join("report.docx-members"));
    assert_eq!(
        std::fs::read(members.join("word/document.xml")).unwrap(),
        b"<w:document/>"
    );
    assert!(members.join("word/embeddings/oleObject1.bin").is_file());

    // Directory entries are created but never queued
    assert_eq!(run.queued.len(), 3);
    assert!(run.queued.contains(&members.join("[Content_Types].xml")));
    assert!(run.queued.contains(&members.join("word/embeddings/oleObject1.bin")));
    assert!(!run.queued.contains(&members.join("word")));
}

#[test]
fn test_zip_member_escaping_root_is_reported_and_skipped() {
    let dir = TempDir::new().unwrap();
    let docx = dir.path().join("evil.docx");
    create_zip_archive(
        &docx,
        &[("../outside.txt", b"nope"), ("word/document.xml", b"<w:document/>")],
    );

    let run = run_extractor(Extractor::OfficeZip, &docx);

    match &run.result {
        Err(Error::Members(errors)) => {
            assert_eq!(errors.len(), 1);
            assert!(errors.to_string().contains("../outside.txt"));
        }
        other => panic!("expected member errors, got {other:?}"),
    }
    // Best-effort extraction still flags the container
    assert!(expanded(&run, &docx));
    assert!(!dir.path().join("outside.txt").exists());
    assert_eq!(run.queued.len(), 1);
}

#[test]
fn test_zip_not_an_archive() {
    let dir = TempDir::new().unwrap();
    let bogus = dir.path().join("bogus.xlsx");
    std::fs::write(&bogus, b"this is not a zip file").unwrap();

    let run = run_extractor(Extractor::OfficeZip, &bogus);

    assert!(matches!(run.result, Err(Error::Zip(_))));
    assert!(!expanded(&run, &bogus));
    assert!(run.queued.is_empty());
    // The member directory is created before the archive is opened
    assert!(dir.path().join("bogus.xlsx-members").is_dir());
}

// ---------------------------------------------------------------------------
// Compound files
// ---------------------------------------------------------------------------

#[test]
fn test_cfb_mirrors_storage_tree() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("legacy.doc");
    create_compound_file(
        &doc,
        &["/ObjectPool", "/ObjectPool/_1234", "/Empty"],
        &[
            ("/WordDocument", b"word stream"),
            ("/\u{5}SummaryInformation", b"summary"),
            ("/ObjectPool/_1234/\u{1}Ole10Native", b"native"),
            ("/ObjectPool/_1234/\u{1}CompObj", b"compobj"),
        ],
    );

    let run = run_extractor(Extractor::Cfb, &doc);
    assert!(run.result.is_ok());
    assert!(expanded(&run, &doc));

    let members = dir.path().join("legacy.doc-members");
    assert_eq!(std::fs::read(members.join("WordDocument")).unwrap(), b"word stream");
    assert_eq!(
        std::fs::read(members.join("SummaryInformation")).unwrap(),
        b"summary"
    );
    assert_eq!(
        std::fs::read(members.join("ObjectPool/_1234/Ole10Native")).unwrap(),
        b"native"
    );
    assert!(members.join("Empty").is_dir());

    // Streams only; storages are directories on disk
    assert_eq!(run.queued.len(), 4);
    assert!(run.queued.contains(&members.join("ObjectPool/_1234/CompObj")));
    assert!(!run.queued.contains(&members.join("ObjectPool")));
}

#[test]
fn test_cfb_empty_compound_file() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("empty.doc");
    create_compound_file(&doc, &[], &[]);

    let run = run_extractor(Extractor::Cfb, &doc);
    assert!(run.result.is_ok());
    assert!(expanded(&run, &doc));
    assert!(run.queued.is_empty());
    assert!(dir.path().join("empty.doc-members").is_dir());
}

#[test]
fn test_cfb_unparseable_container() {
    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("broken.doc");
    std::fs::write(&doc, b"\xd0\xcf\x11\xe0\xa1\xb1\x1a\xe1 truncated").unwrap();

    let run = run_extractor(Extractor::Cfb, &doc);
    assert!(matches!(run.result, Err(Error::Io(_))));
    assert!(!expanded(&run, &doc));
}

#[cfg(unix)]
#[test]
fn test_member_directories_use_configured_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let doc = dir.path().join("modes.doc");
    create_compound_file(&doc, &["/Storage"], &[("/Storage/Stream", b"x")]);

    let run = run_extractor(Extractor::Cfb, &doc);
    assert!(run.result.is_ok());

    // The process umask may only clear bits, never add them
    let mode = std::fs::metadata(dir.path().join("modes.doc-members/Storage"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o007, 0);
}

// ---------------------------------------------------------------------------
// OLE 1.0 native records
// ---------------------------------------------------------------------------

#[test]
fn test_ole10_writes_payload_only() {
    let dir = TempDir::new().unwrap();
    let native = dir.path().join("Ole10Native");
    let payload: Vec<u8> = (0..=255u8).cycle().take(4096).collect();
    std::fs::write(
        &native,
        build_record(
            "Untitled.msg",
            r"C:\cache\Untitled.msg",
            r"C:\temp\Untitled.msg",
            &payload,
            b"TRAILING-GARBAGE",
        ),
    )
    .unwrap();

    let run = run_extractor(Extractor::Ole10, &native);
    assert!(run.result.is_ok());
    assert!(expanded(&run, &native));

    let out = dir.path().join("Ole10Native-members/Untitled.msg");
    assert_eq!(run.queued, vec![out.clone()]);
    let written = std::fs::read(&out).unwrap();
    assert_eq!(written.len(), payload.len());
    assert_eq!(sha256_hex(&written), sha256_hex(&payload));
}

#[test]
fn test_ole10_name_with_directories_stays_inside_member_dir() {
    let dir = TempDir::new().unwrap();
    let native = dir.path().join("Ole10Native");
    std::fs::write(
        &native,
        build_record(r"..\..\payload.exe", "", "", b"MZ", b""),
    )
    .unwrap();

    let run = run_extractor(Extractor::Ole10, &native);
    assert!(run.result.is_ok());
    assert_eq!(
        run.queued,
        vec![dir.path().join("Ole10Native-members/payload.exe")]
    );
}

#[test]
fn test_ole10_truncated_header_is_decode_error() {
    let dir = TempDir::new().unwrap();
    let native = dir.path().join("Ole10Native");
    let record = build_record("a.txt", "cache", "temp", b"payload", b"");
    std::fs::write(&native, &record[..10]).unwrap();

    let run = run_extractor(Extractor::Ole10, &native);
    assert!(matches!(run.result, Err(Error::Decode(_))));
    assert!(!expanded(&run, &native));
    assert!(run.queued.is_empty());
}

#[test]
fn test_ole10_short_payload_is_member_error() {
    let dir = TempDir::new().unwrap();
    let native = dir.path().join("Ole10Native");
    let record = build_record("a.txt", "cache", "temp", &[7u8; 64], b"");
    // Keep the header intact but drop the tail of the payload
    std::fs::write(&native, &record[..record.len() - 16]).unwrap();

    let run = run_extractor(Extractor::Ole10, &native);
    match &run.result {
        Err(Error::Members(errors)) => assert_eq!(errors.len(), 1),
        other => panic!("expected member errors, got {other:?}"),
    }
    assert!(!expanded(&run, &native));
    assert!(run.queued.is_empty());
    // The partial copy is not left behind
    assert!(!dir.path().join("Ole10Native-members/a.txt").exists());
    assert!(dir.path().join("Ole10Native-members").is_dir());
}

#[test]
fn test_extractor_names() {
    assert_eq!(Extractor::Cfb.name(), "CFB");
    assert_eq!(Extractor::OfficeZip.name(), "OfficeZip");
    assert_eq!(Extractor::Ole10.name(), "OLE10");
    assert_eq!(
        serde_json::to_string(&Extractor::OfficeZip).unwrap(),
        "\"office_zip\""
    );
}
