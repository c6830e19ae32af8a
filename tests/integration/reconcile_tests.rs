use std::fs;
use std::io::{self, Cursor, Read};

use chrono::{DateTime, TimeZone, Utc};
use ghostfs::{Candidate, Digest, GhostFs, Outcome};
use tempfile::tempdir;

fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap() + chrono::Duration::nanoseconds(500)
}

#[test]
fn create_writes_content_and_record() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();
    let content = b"9 bytes!!";

    let result = cache
        .reconcile(
            Candidate::new("x.txt", content.len() as u64, ts()),
            Cursor::new(content),
        )
        .unwrap();

    assert_eq!(result.outcome, Outcome::Created);
    assert_eq!(result.record.size, 9);
    assert_eq!(result.record.hash, Digest::of_bytes(content).hex);
    assert!(result.record.has_hash);
    assert!(!result.record.deleted);
    assert_eq!(fs::read(root.path().join("x.txt")).unwrap(), content);
}

#[test]
fn identical_candidate_skips_even_after_local_content_removal() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();
    let content = b"9 bytes!!";
    let digest = Digest::of_bytes(content);

    let first = cache
        .reconcile(
            Candidate::new("x.txt", 9, ts()).with_digest(digest.clone()),
            Cursor::new(content),
        )
        .unwrap();
    assert_eq!(first.outcome, Outcome::Created);

    // The local consumer processed the file and deleted the content; the
    // record alone must be enough to recognize the path as already ingested.
    fs::remove_file(root.path().join("x.txt")).unwrap();

    let second = cache
        .reconcile(
            Candidate::new("x.txt", 9, ts()).with_digest(digest),
            Cursor::new(content),
        )
        .unwrap();

    assert_eq!(second.outcome, Outcome::Skipped);
    assert_eq!(second.record, first.record);
    assert!(
        !root.path().join("x.txt").exists(),
        "a skip performs no content I/O"
    );
}

#[test]
fn any_attribute_change_forces_an_update() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();
    let content = b"9 bytes!!";

    cache
        .reconcile(Candidate::new("x.txt", 9, ts()), Cursor::new(content))
        .unwrap();

    // Different size.
    let longer = b"twelve bytes";
    let result = cache
        .reconcile(Candidate::new("x.txt", 12, ts()), Cursor::new(longer))
        .unwrap();
    assert_eq!(result.outcome, Outcome::Updated);
    assert_eq!(result.record.size, 12);

    // Same size, mod time off by one nanosecond in either direction.
    let earlier = ts() - chrono::Duration::nanoseconds(1);
    let result = cache
        .reconcile(Candidate::new("x.txt", 12, earlier), Cursor::new(longer))
        .unwrap();
    assert_eq!(result.outcome, Outcome::Updated);

    // Same size and mod time, different digest.
    let changed = b"twelve byteZ";
    let result = cache
        .reconcile(
            Candidate::new("x.txt", 12, earlier).with_digest(Digest::of_bytes(changed)),
            Cursor::new(changed),
        )
        .unwrap();
    assert_eq!(result.outcome, Outcome::Updated);
    assert_eq!(result.record.hash, Digest::of_bytes(changed).hex);
    assert_eq!(fs::read(root.path().join("x.txt")).unwrap(), changed);
}

#[test]
fn nested_create_materializes_ancestor_directories() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    cache
        .reconcile(Candidate::new("a/b/c.txt", 2, ts()), Cursor::new(b"hi"))
        .unwrap();

    for dir in ["a", "a/b"] {
        let rec = cache.store_record(dir).unwrap().unwrap();
        assert!(rec.is_dir, "{dir} should be a directory record");
        assert!(!rec.deleted);
    }
    assert_eq!(fs::read(root.path().join("a/b/c.txt")).unwrap(), b"hi");
}

#[test]
fn ancestor_that_is_a_live_file_rejects_the_write() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    cache
        .reconcile(Candidate::new("a", 3, ts()), Cursor::new(b"one"))
        .unwrap();

    let err = cache
        .reconcile(Candidate::new("a/b.txt", 3, ts()), Cursor::new(b"two"))
        .unwrap_err();
    assert!(matches!(err, ghostfs::CacheError::NotADirectory { path } if path == "a"));
    assert!(cache.store_record("a/b.txt").unwrap().is_none());
}

#[test]
fn candidate_colliding_with_a_directory_is_rejected() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    cache.mkdir("d").unwrap();

    let err = cache
        .reconcile(Candidate::new("d", 4, ts()), Cursor::new(b"data"))
        .unwrap_err();
    assert!(matches!(err, ghostfs::CacheError::IsADirectory { path } if path == "d"));

    let rec = cache.store_record("d").unwrap().unwrap();
    assert!(rec.is_dir, "the directory record is untouched");
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("stream broke mid-transfer"))
    }
}

#[test]
fn streaming_failure_never_commits_metadata() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    // Create case: no record may appear.
    assert!(cache
        .reconcile(Candidate::new("new.txt", 4, ts()), FailingReader)
        .is_err());
    assert!(cache.store_record("new.txt").unwrap().is_none());

    // Update case: the previous record survives untouched.
    let original = cache
        .reconcile(Candidate::new("old.txt", 4, ts()), Cursor::new(b"data"))
        .unwrap()
        .record;
    let later = ts() + chrono::Duration::seconds(1);
    assert!(cache
        .reconcile(Candidate::new("old.txt", 4, later), FailingReader)
        .is_err());
    assert_eq!(cache.store_record("old.txt").unwrap().unwrap(), original);
}

#[test]
fn stored_size_comes_from_bytes_written_not_the_claim() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    // The source claimed 100 bytes but delivered 5; the record must describe
    // what is actually on disk.
    let result = cache
        .reconcile(Candidate::new("short.txt", 100, ts()), Cursor::new(b"five!"))
        .unwrap();
    assert_eq!(result.record.size, 5);
    assert_eq!(result.record.hash, Digest::of_bytes(b"five!").hex);
}

#[test]
fn empty_content_is_cacheable_and_hashed() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    let result = cache
        .reconcile(Candidate::new("empty.txt", 0, ts()), Cursor::new(b""))
        .unwrap();
    assert_eq!(result.outcome, Outcome::Created);
    assert_eq!(result.record.size, 0);
    assert!(result.record.has_hash);
    assert_eq!(result.record.hash, Digest::of_bytes(b"").hex);

    let again = cache
        .reconcile(Candidate::new("empty.txt", 0, ts()), Cursor::new(b""))
        .unwrap();
    assert_eq!(again.outcome, Outcome::Skipped);
}
