use case_trends::data::load_stamped;
use case_trends::{SnapshotCache, SourceSchema};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

const HEADER: &str = "Province/State,Country/Region,Lat,Long,3/1/20,3/2/20";

fn write_stamped(path: &Path, rows: &str, modified: SystemTime) {
    fs::write(path, format!("{HEADER}\n{rows}")).unwrap();
    OpenOptions::new()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(modified)
        .unwrap();
}

#[test]
fn unchanged_file_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("global.csv");
    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    write_stamped(&path, ",Chad,15.4,18.7,10,12\n", stamp);

    let mut cache = SnapshotCache::new();
    let first = cache.get_or_load(&path, &SourceSchema::GLOBAL).unwrap();
    let second = cache.get_or_load(&path, &SourceSchema::GLOBAL).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
    assert!(cache.get(&path, &SourceSchema::REGIONAL).is_none());
}

#[test]
fn modified_file_is_reloaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("global.csv");
    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    write_stamped(&path, ",Chad,15.4,18.7,10,12\n", stamp);

    let mut cache = SnapshotCache::new();
    let before = cache.get_or_load(&path, &SourceSchema::GLOBAL).unwrap();

    write_stamped(
        &path,
        ",Chad,15.4,18.7,10,30\n",
        stamp + Duration::from_secs(60),
    );
    assert!(cache.get(&path, &SourceSchema::GLOBAL).is_none());

    let after = cache.get_or_load(&path, &SourceSchema::GLOBAL).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.wide.values_for("Chad"), Some(&[10, 30][..]));
    assert_eq!(cache.len(), 1);
}

#[test]
fn invalidate_and_clear_drop_entries() {
    let dir = tempfile::tempdir().unwrap();
    let global = dir.path().join("global.csv");
    let other = dir.path().join("other.csv");
    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    write_stamped(&global, ",Chad,15.4,18.7,10,12\n", stamp);
    write_stamped(&other, ",Mali,17.6,-4.0,11,13\n", stamp);

    let mut cache = SnapshotCache::new();
    let first = cache.get_or_load(&global, &SourceSchema::GLOBAL).unwrap();
    cache.get_or_load(&other, &SourceSchema::GLOBAL).unwrap();
    assert_eq!(cache.len(), 2);

    assert!(cache.invalidate(&global));
    assert!(!cache.invalidate(&global));
    let reloaded = cache.get_or_load(&global, &SourceSchema::GLOBAL).unwrap();
    assert!(!Arc::ptr_eq(&first, &reloaded));

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn failed_load_is_not_cached() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.csv");

    let mut cache = SnapshotCache::new();
    assert!(cache.get_or_load(&path, &SourceSchema::GLOBAL).is_err());
    assert!(cache.is_empty());
}

#[test]
fn stamped_load_feeds_the_cache() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("global.csv");
    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
    write_stamped(&path, ",Chad,15.4,18.7,10,12\n", stamp);

    let (dataset, modified) = load_stamped(&path, &SourceSchema::GLOBAL).unwrap();
    assert_eq!(modified, stamp);
    assert_eq!(dataset.source, path);

    let mut cache = SnapshotCache::new();
    let inserted = cache.insert(dataset, modified);
    let served = cache.get_or_load(&path, &SourceSchema::GLOBAL).unwrap();
    assert!(Arc::ptr_eq(&inserted, &served));
}
