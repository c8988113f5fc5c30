use super::*;
use std::sync::Mutex;

/// Serves canned responses and records every request.
#[derive(Default)]
struct FakeDownloader {
    body: Option<Vec<u8>>,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeDownloader {
    fn serving(body: &[u8]) -> Arc<Self> {
        Arc::new(Self {
            body: Some(body.to_vec()),
            ..Default::default()
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Downloader for FakeDownloader {
    fn fetch(&self, url: &str, proxy: Option<&str>, _limit: u64) -> Result<Vec<u8>, CacheError> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), proxy.map(str::to_string)));
        self.body
            .clone()
            .ok_or_else(|| CacheError::download("HTTP 404 Not Found"))
    }
}

const URL: &str = "https://art.example/ds/cover/US/ADME.jpg";
const KEY: &str = "ds/cover/US/ADME.jpg";

#[test]
fn filter_rejects_unsafe_keys() {
    for key in ["", "/etc/passwd", "\\share", "a\\b", "c:/x", "ds/../../x", ".."] {
        assert!(filter_cache_key(key).is_err(), "{key:?} should be rejected");
    }
}

#[test]
fn filter_replaces_reserved_characters() {
    assert_eq!(filter_cache_key("ds/a*b?c|d.png").unwrap(), "ds/a_b_c_d.png");
    assert_eq!(filter_cache_key("x/\"<y>\"\t.png").unwrap(), "x/__y___.png");
    assert_eq!(filter_cache_key("wii/cover/US/GALE01.png").unwrap(), "wii/cover/US/GALE01.png");
}

#[test]
fn downloads_once_then_hits_cache() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeDownloader::serving(b"image data");
    let cache = CacheManager::with_root(dir.path(), fake.clone());

    assert!(cache.find_in_cache(KEY).is_none());
    let path = cache.download(URL, KEY).unwrap().unwrap();
    assert_eq!(path, dir.path().join(KEY));
    assert_eq!(fs::read(&path).unwrap(), b"image data");

    assert_eq!(cache.download(URL, KEY).unwrap(), Some(path.clone()));
    assert_eq!(cache.find_in_cache(KEY), Some(path));
    assert_eq!(fake.request_count(), 1);
}

#[test]
fn failure_leaves_negative_entry() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeDownloader::failing();
    let cache = CacheManager::with_root(dir.path(), fake.clone());

    assert_eq!(cache.download(URL, KEY).unwrap(), None);
    let path = dir.path().join(KEY);
    assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    assert!(cache.find_in_cache(KEY).is_none());

    assert_eq!(cache.download(URL, KEY).unwrap(), None);
    assert_eq!(fake.request_count(), 1);
}

#[test]
fn stale_negative_entry_is_retried() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(KEY);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, b"").unwrap();
    let old = SystemTime::now() - Duration::from_secs(8 * 24 * 60 * 60);
    fs::File::options()
        .write(true)
        .open(&path)
        .unwrap()
        .set_modified(old)
        .unwrap();

    let fake = FakeDownloader::serving(b"fresh");
    let cache = CacheManager::with_root(dir.path(), fake.clone());
    assert_eq!(cache.download(URL, KEY).unwrap(), Some(path.clone()));
    assert_eq!(fs::read(&path).unwrap(), b"fresh");
    assert_eq!(fake.request_count(), 1);
}

#[test]
fn blank_url_never_downloads() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeDownloader::serving(b"x");
    let cache = CacheManager::with_root(dir.path(), fake.clone());

    assert_eq!(cache.download("  ", KEY).unwrap(), None);
    assert_eq!(fake.request_count(), 0);
    assert!(!dir.path().join(KEY).exists());
}

#[test]
fn invalid_key_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let cache = CacheManager::with_root(dir.path(), FakeDownloader::serving(b"x"));
    assert!(matches!(
        cache.download(URL, "../escape.png"),
        Err(CacheError::InvalidKey(_))
    ));
    assert!(cache.find_in_cache("../escape.png").is_none());
}

#[test]
fn proxy_is_passed_to_downloader() {
    let dir = tempfile::tempdir().unwrap();
    let fake = FakeDownloader::serving(b"x");
    let mut cache = CacheManager::with_root(dir.path(), fake.clone());
    cache.set_proxy(Some("http://proxy:3128".to_string()));
    cache.download(URL, KEY).unwrap();

    let requests = fake.requests.lock().unwrap();
    assert_eq!(
        requests[0],
        (URL.to_string(), Some("http://proxy:3128".to_string()))
    );
}

#[test]
fn usage_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("cache");
    let cache = CacheManager::with_root(&root, FakeDownloader::serving(b"12345"));
    assert_eq!(cache.usage().unwrap(), CacheUsage::default());

    cache.download(URL, KEY).unwrap();
    cache.download("https://art.example/other", "ds/box/US/ADME.png").unwrap();
    fs::write(root.join("ds/missing.png"), b"").unwrap();

    let usage = cache.usage().unwrap();
    assert_eq!(usage.files, 2);
    assert_eq!(usage.bytes, 10);
    assert_eq!(usage.negative, 1);

    cache.clear().unwrap();
    assert!(!root.exists());
    cache.clear().unwrap();
}
