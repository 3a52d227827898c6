// Tests for the memory and SQLite page caches

use chrono::Utc;
use sitescout_core::cache::{CacheKey, CachedPages, MemoryCache, PageCache, SqliteCache};
use sitescout_core::scoring::score_pages_at;
use sitescout_scanner::PageEntry;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn sample_pages() -> CachedPages {
    let entries = vec![
        PageEntry::new("https://acme.example/".to_string()),
        PageEntry::new("https://acme.example/about".to_string()).with_priority(0.9),
        PageEntry::new("https://acme.example/careers/openings".to_string()),
    ];
    let pages = score_pages_at(&entries, "Acme Corp", "acme.example", Utc::now());
    CachedPages {
        total_found: pages.len(),
        pages,
        subdomains_checked: 10,
        sitemaps_found: 2,
    }
}

fn key() -> CacheKey {
    CacheKey::new("acme.example", "Acme Corp")
}

fn create_test_db() -> (TempDir, SqliteCache) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cache.db");
    let cache = SqliteCache::open(&db_path).unwrap();
    (temp_dir, cache)
}

// ============================================================================
// Cache Key Tests
// ============================================================================

#[test]
fn test_cache_key_normalizes_parts() {
    let a = CacheKey::new(" ACME.example ", "Acme   Corp.");
    let b = CacheKey::new("acme.example", "acme corp");
    assert_eq!(a, b);
    assert_eq!(a.as_string(), "acme.example|acme corp");
}

#[test]
fn test_cache_key_distinguishes_companies() {
    assert_ne!(
        CacheKey::new("acme.example", "Acme Corp"),
        CacheKey::new("acme.example", "Acme Holdings")
    );
}

// ============================================================================
// Shared Behavior (run against both implementations)
// ============================================================================

fn assert_round_trip(cache: &dyn PageCache) {
    let value = sample_pages();
    cache.put(&key(), value.clone(), Duration::from_secs(60)).unwrap();

    let entry = cache.get(&key()).unwrap().expect("entry should be present");
    assert_eq!(entry.value, value);
    assert!(entry.expires_at > Utc::now());
    assert_eq!(cache.len().unwrap(), 1);
}

fn assert_expiry(cache: &dyn PageCache) {
    cache.put(&key(), sample_pages(), Duration::from_millis(50)).unwrap();
    std::thread::sleep(Duration::from_millis(120));

    assert!(cache.get(&key()).unwrap().is_none());
    assert_eq!(cache.len().unwrap(), 0);
}

fn assert_overwrite(cache: &dyn PageCache) {
    let mut first = sample_pages();
    first.sitemaps_found = 1;
    let mut second = sample_pages();
    second.sitemaps_found = 7;

    cache.put(&key(), first, Duration::from_secs(60)).unwrap();
    cache.put(&key(), second, Duration::from_secs(60)).unwrap();

    let entry = cache.get(&key()).unwrap().unwrap();
    assert_eq!(entry.value.sitemaps_found, 7);
    assert_eq!(cache.len().unwrap(), 1);
}

fn assert_clear(cache: &dyn PageCache) {
    cache.put(&key(), sample_pages(), Duration::from_secs(60)).unwrap();
    cache
        .put(&CacheKey::new("beta.example", "Beta"), sample_pages(), Duration::from_secs(60))
        .unwrap();

    assert_eq!(cache.clear().unwrap(), 2);
    assert!(cache.is_empty().unwrap());
    assert!(cache.get(&key()).unwrap().is_none());
}

fn assert_clear_counts_live_entries(cache: &dyn PageCache) {
    cache.put(&key(), sample_pages(), Duration::from_millis(50)).unwrap();
    cache
        .put(&CacheKey::new("beta.example", "Beta"), sample_pages(), Duration::from_secs(60))
        .unwrap();
    std::thread::sleep(Duration::from_millis(120));

    let live = cache.len().unwrap();
    assert_eq!(live, 1);
    assert_eq!(cache.clear().unwrap(), live);
    assert!(cache.is_empty().unwrap());
}

#[test]
fn test_memory_round_trip() {
    assert_round_trip(&MemoryCache::new());
}

#[test]
fn test_memory_expiry() {
    assert_expiry(&MemoryCache::new());
}

#[test]
fn test_memory_overwrite() {
    assert_overwrite(&MemoryCache::new());
}

#[test]
fn test_memory_clear() {
    assert_clear(&MemoryCache::new());
}

#[test]
fn test_memory_clear_counts_live_entries() {
    assert_clear_counts_live_entries(&MemoryCache::new());
}

#[test]
fn test_sqlite_round_trip() {
    let (_temp_dir, cache) = create_test_db();
    assert_round_trip(&cache);
}

#[test]
fn test_sqlite_expiry() {
    let (_temp_dir, cache) = create_test_db();
    assert_expiry(&cache);
}

#[test]
fn test_sqlite_overwrite() {
    let (_temp_dir, cache) = create_test_db();
    assert_overwrite(&cache);
}

#[test]
fn test_sqlite_clear() {
    let (_temp_dir, cache) = create_test_db();
    assert_clear(&cache);
}

#[test]
fn test_sqlite_clear_counts_live_entries() {
    let (_temp_dir, cache) = create_test_db();
    assert_clear_counts_live_entries(&cache);
}

// ============================================================================
// SQLite Specific Tests
// ============================================================================

#[test]
fn test_sqlite_creates_parent_directories() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested").join("dir").join("cache.db");

    let cache = SqliteCache::open(&db_path);
    assert!(cache.is_ok());
    assert!(db_path.exists());
}

#[test]
fn test_sqlite_persists_between_connections() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("cache.db");

    {
        let cache = SqliteCache::open(&db_path).unwrap();
        cache.put(&key(), sample_pages(), Duration::from_secs(3600)).unwrap();
    }

    let reopened = SqliteCache::open(&db_path).unwrap();
    let entry = reopened.get(&key()).unwrap().unwrap();
    assert_eq!(entry.value, sample_pages());
}

#[test]
fn test_sqlite_purge_expired() {
    let cache = SqliteCache::in_memory().unwrap();
    cache.put(&key(), sample_pages(), Duration::ZERO).unwrap();
    cache
        .put(&CacheKey::new("beta.example", "Beta"), sample_pages(), Duration::from_secs(60))
        .unwrap();

    assert_eq!(cache.purge_expired().unwrap(), 1);
    assert_eq!(cache.len().unwrap(), 1);
}

#[test]
fn test_memory_cache_shared_between_threads() {
    let cache = Arc::new(MemoryCache::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let cache = cache.clone();
            std::thread::spawn(move || {
                let key = CacheKey::new(&format!("site{}.example", i), "Acme");
                cache.put(&key, sample_pages(), Duration::from_secs(60)).unwrap();
                cache.get(&key).unwrap().is_some()
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
    assert_eq!(cache.len().unwrap(), 8);
}
