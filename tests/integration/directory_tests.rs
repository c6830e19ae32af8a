use std::io::Cursor;

use chrono::{DateTime, TimeZone, Utc};
use ghostfs::{CacheError, Candidate, GhostFs};
use tempfile::tempdir;

fn ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
}

#[test]
fn mkdir_materializes_the_path_and_its_ancestors() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    cache.mkdir("a/b/c").unwrap();

    for dir in ["a", "a/b", "a/b/c"] {
        let rec = cache.store_record(dir).unwrap().unwrap();
        assert!(rec.is_dir, "{dir} should have a directory record");
    }
    assert!(root.path().join("a/b/c").is_dir());
}

#[test]
fn mkdir_never_downgrades_an_existing_file() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    cache
        .reconcile(Candidate::new("a", 4, ts()), Cursor::new(b"file"))
        .unwrap();

    let err = cache.mkdir("a/b").unwrap_err();
    assert!(matches!(err, CacheError::NotADirectory { path } if path == "a"));
    assert!(cache.lookup("a").is_ok(), "the file record is untouched");
}

#[test]
fn rmdir_requires_a_directory_row() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    let err = cache.rmdir_if_empty("missing").unwrap_err();
    assert!(err.is_not_found());

    // A file row at the path is not a removable directory either.
    cache
        .reconcile(Candidate::new("f.txt", 1, ts()), Cursor::new(b"x"))
        .unwrap();
    assert!(cache.rmdir_if_empty("f.txt").unwrap_err().is_not_found());
    assert!(cache.lookup("f.txt").is_ok());
}

#[test]
fn rmdir_refuses_while_live_records_remain() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    cache
        .reconcile(Candidate::new("d/sub/file.txt", 1, ts()), Cursor::new(b"x"))
        .unwrap();

    // A live descendant at any depth blocks removal.
    let err = cache.rmdir_if_empty("d").unwrap_err();
    assert!(matches!(err, CacheError::NotEmpty { path } if path == "d"));
    assert!(cache.store_record("d").unwrap().is_some());
}

#[test]
fn rmdir_succeeds_once_descendants_are_tombstoned() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    cache
        .reconcile(Candidate::new("d/file.txt", 1, ts()), Cursor::new(b"x"))
        .unwrap();
    cache.mark_deleted("d/file.txt").unwrap();

    // Tombstoned rows do not count as live; the marker file left in the
    // content directory must not block removal of the row.
    cache.rmdir_if_empty("d").unwrap();
    assert!(cache.store_record("d").unwrap().is_none());
    assert!(
        root.path().join("d/file.txt.delete").exists(),
        "the marker keeps signaling the deletion"
    );
}

#[test]
fn rmdir_removes_the_empty_content_directory() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    cache.mkdir("empty").unwrap();
    cache.rmdir_if_empty("empty").unwrap();

    assert!(cache.store_record("empty").unwrap().is_none());
    assert!(!root.path().join("empty").exists());
}

#[test]
fn set_mod_time_updates_metadata_only() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    cache
        .reconcile(Candidate::new("f.txt", 4, ts()), Cursor::new(b"data"))
        .unwrap();

    let later = ts() + chrono::Duration::nanoseconds(250);
    cache.set_mod_time("f.txt", later).unwrap();

    let rec = cache.lookup("f.txt").unwrap();
    assert_eq!(rec.mod_time, later);
    assert_eq!(rec.size, 4);

    assert!(cache.set_mod_time("ghost.txt", later).unwrap_err().is_not_found());
}

#[test]
fn open_content_follows_lookup_visibility() {
    use std::io::Read;

    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    cache
        .reconcile(Candidate::new("f.txt", 4, ts()), Cursor::new(b"data"))
        .unwrap();

    let mut buf = String::new();
    cache
        .open_content("f.txt")
        .unwrap()
        .read_to_string(&mut buf)
        .unwrap();
    assert_eq!(buf, "data");

    cache.mark_deleted("f.txt").unwrap();
    assert!(cache.open_content("f.txt").unwrap_err().is_not_found());
}

#[test]
fn capabilities_report_blake3_and_nanosecond_precision() {
    let root = tempdir().unwrap();
    let cache = GhostFs::open(root.path()).unwrap();

    assert_eq!(cache.digest_kind(), ghostfs::DigestKind::Blake3);
    assert_eq!(cache.precision(), std::time::Duration::from_nanos(1));
}
