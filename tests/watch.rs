//! End-to-end runs of the watcher against in-memory and mocked sources.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wnpp_watch::error::{AppError, Result};
use wnpp_watch::models::{Config, NO_DESCRIPTION, NotifyMode};
use wnpp_watch::notify::Notifier;
use wnpp_watch::pipeline::{NoveltyResult, Watcher, run_watch};
use wnpp_watch::services::PageSource;
use wnpp_watch::storage::{HistorySet, HistoryStore, LocalHistoryStore};

const LISTING_URL: &str = "https://www.debian.org/devel/wnpp/orphaned";

const PAGE: &str = r#"
<html><body><ul>
  <li><a href="https://bugs.debian.org/1001">libfoo-cfd: A CFD solver library</a></li>
  <li><a href="https://bugs.debian.org/1002">libbar-gui: A GUI toolkit</a></li>
</ul></body></html>
"#;

struct StaticPage {
    html: String,
    fetches: AtomicUsize,
}

impl StaticPage {
    fn new(html: &str) -> Self {
        Self {
            html: html.to_string(),
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl PageSource for StaticPage {
    async fn fetch(&self) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.html.clone())
    }

    fn url(&self) -> &str {
        LISTING_URL
    }
}

struct UnreachablePage;

#[async_trait]
impl PageSource for UnreachablePage {
    async fn fetch(&self) -> Result<String> {
        Err(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "listing unreachable").into())
    }

    fn url(&self) -> &str {
        LISTING_URL
    }
}

/// File-backed store that counts saves.
struct CountingStore {
    inner: LocalHistoryStore,
    saves: AtomicUsize,
}

impl CountingStore {
    fn new(path: &Path) -> Self {
        Self {
            inner: LocalHistoryStore::new(path),
            saves: AtomicUsize::new(0),
        }
    }

    fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistoryStore for CountingStore {
    async fn load(&self) -> Result<HistorySet> {
        self.inner.load().await
    }

    async fn save(&self, history: &HistorySet) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.inner.save(history).await
    }

    fn location(&self) -> String {
        self.inner.location()
    }
}

type DeliveryLog = Arc<Mutex<Vec<NoveltyResult>>>;

/// Notifier that records what it was given, optionally failing afterwards.
struct RecordingNotifier {
    log: DeliveryLog,
    fail: bool,
}

fn recording(fail: bool) -> (Vec<Box<dyn Notifier>>, DeliveryLog) {
    let log = DeliveryLog::default();
    let notifier = RecordingNotifier {
        log: Arc::clone(&log),
        fail,
    };
    (vec![Box::new(notifier)], log)
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn channel(&self) -> &'static str {
        "recording"
    }

    async fn deliver(&self, result: &NoveltyResult) -> Result<()> {
        self.log.lock().unwrap().push(result.clone());
        if self.fail {
            return Err(AppError::notify(self.channel(), "status 500: upstream down"));
        }
        Ok(())
    }
}

fn config(keywords: &[&str]) -> Config {
    let mut config = Config::default();
    config.filter.keywords = keywords.iter().map(|k| k.to_string()).collect();
    config.filter.threshold = 80;
    config
}

fn names(items: &[&str]) -> HistorySet {
    items.iter().map(|n| n.to_string()).collect()
}

#[tokio::test]
async fn new_match_is_reported_and_saved() {
    let tmp = TempDir::new().unwrap();
    let store = CountingStore::new(&tmp.path().join("history.json"));
    let page = StaticPage::new(PAGE);
    let (notifiers, log) = recording(false);

    let outcome = run_watch(&config(&["cfd"]), &page, &store, &notifiers)
        .await
        .unwrap();

    let expected: NoveltyResult = [("libfoo-cfd", "A CFD solver library")]
        .into_iter()
        .collect();
    assert_eq!(outcome.novel, expected);
    assert_eq!(outcome.entries_seen, 2);
    assert!(outcome.history_saved);
    assert_eq!(store.saves(), 1);
    assert_eq!(store.load().await.unwrap(), names(&["libfoo-cfd"]));
    assert_eq!(outcome.deliveries.len(), 1);
    assert!(outcome.deliveries[0].succeeded());
    assert_eq!(*log.lock().unwrap(), vec![expected]);
}

#[tokio::test]
async fn known_package_leaves_history_untouched() {
    let tmp = TempDir::new().unwrap();
    let history_path = tmp.path().join("history.json");
    LocalHistoryStore::new(&history_path)
        .save(&names(&["libfoo-cfd"]))
        .await
        .unwrap();
    let before = std::fs::read(&history_path).unwrap();

    let store = CountingStore::new(&history_path);
    let (notifiers, log) = recording(false);

    let outcome = run_watch(&config(&["cfd"]), &StaticPage::new(PAGE), &store, &notifiers)
        .await
        .unwrap();

    assert!(!outcome.has_novelty());
    assert!(!outcome.history_saved);
    assert_eq!(store.saves(), 0);
    assert_eq!(std::fs::read(&history_path).unwrap(), before);
    assert!(log.lock().unwrap().is_empty());
    assert!(outcome.deliveries.is_empty());
}

#[tokio::test]
async fn entry_without_colon_gets_placeholder() {
    let tmp = TempDir::new().unwrap();
    let store = CountingStore::new(&tmp.path().join("history.json"));
    let page = StaticPage::new(r#"<a href="https://bugs.debian.org/9">weirdpkg</a>"#);

    let outcome = run_watch(&config(&["pkg"]), &page, &store, &[])
        .await
        .unwrap();

    assert_eq!(outcome.novel.get("weirdpkg"), Some(NO_DESCRIPTION));
}

#[tokio::test]
async fn second_run_finds_nothing_new() {
    let tmp = TempDir::new().unwrap();
    let history_path = tmp.path().join("history.json");
    let store = CountingStore::new(&history_path);
    let page = StaticPage::new(PAGE);
    let config = config(&["cfd", "gui"]);

    let first = run_watch(&config, &page, &store, &[]).await.unwrap();
    assert_eq!(first.novel.len(), 2);
    let after_first = std::fs::read(&history_path).unwrap();

    let second = run_watch(&config, &page, &store, &[]).await.unwrap();
    assert!(!second.has_novelty());
    assert_eq!(store.saves(), 1);
    assert_eq!(page.fetches.load(Ordering::SeqCst), 2);
    assert_eq!(std::fs::read(&history_path).unwrap(), after_first);
}

#[tokio::test]
async fn history_only_grows() {
    let tmp = TempDir::new().unwrap();
    let history_path = tmp.path().join("history.json");
    let previous = names(&["gone-from-page", "old-physics-pkg"]);
    LocalHistoryStore::new(&history_path)
        .save(&previous)
        .await
        .unwrap();

    let store = CountingStore::new(&history_path);
    let outcome = run_watch(&config(&["cfd"]), &StaticPage::new(PAGE), &store, &[])
        .await
        .unwrap();

    let after = store.load().await.unwrap();
    assert!(after.is_superset(&previous));
    assert!(after.contains("libfoo-cfd"));
    assert_eq!(outcome.history_size, 3);
}

#[tokio::test]
async fn fetch_failure_aborts_without_touching_history() {
    let tmp = TempDir::new().unwrap();
    let history_path = tmp.path().join("history.json");
    let store = CountingStore::new(&history_path);
    let (notifiers, log) = recording(false);

    let result = run_watch(&config(&["cfd"]), &UnreachablePage, &store, &notifiers).await;

    assert!(matches!(result, Err(AppError::Io(_))));
    assert_eq!(store.saves(), 0);
    assert!(!history_path.exists());
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_delivery_is_recorded_and_not_repeated() {
    let tmp = TempDir::new().unwrap();
    let store = CountingStore::new(&tmp.path().join("history.json"));
    let page = StaticPage::new(PAGE);
    let (notifiers, log) = recording(true);

    let outcome = run_watch(&config(&["cfd"]), &page, &store, &notifiers)
        .await
        .unwrap();
    assert!(outcome.history_saved);
    assert_eq!(outcome.deliveries[0].channel, "recording");
    assert!(!outcome.deliveries[0].succeeded());

    let retry = run_watch(&config(&["cfd"]), &page, &store, &notifiers)
        .await
        .unwrap();
    assert!(!retry.has_novelty());
    assert!(retry.deliveries.is_empty());
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn http_listing_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devel/wnpp/orphaned"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let mut config = config(&["cfd"]);
    config.source.url = format!("{}/devel/wnpp/orphaned", server.uri());
    config.history.path = tmp.path().join("history.json");

    let watcher = Watcher::from_config(config, |_| None).unwrap();
    let outcome = watcher.run().await.unwrap();

    assert_eq!(
        outcome.novel.names().collect::<Vec<_>>(),
        vec!["libfoo-cfd"]
    );
    assert!(tmp.path().join("history.json").exists());
}

#[tokio::test]
async fn http_error_status_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let mut config = config(&["cfd"]);
    config.source.url = format!("{}/devel/wnpp/orphaned", server.uri());
    config.history.path = tmp.path().join("history.json");

    let watcher = Watcher::from_config(config, |_| None).unwrap();
    let result = watcher.run().await;

    assert!(matches!(result, Err(AppError::Http(_))));
    assert!(!tmp.path().join("history.json").exists());
}

#[tokio::test]
async fn email_mode_without_recipient_fails_before_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let mut config = config(&["cfd"]);
    config.source.url = format!("{}/devel/wnpp/orphaned", server.uri());
    config.history.path = tmp.path().join("history.json");
    config.notify.mode = NotifyMode::Email;

    let result = Watcher::from_config(config, |key| match key {
        "SENDGRID_EMAIL_TO" => None,
        _ => Some("configured".to_string()),
    });

    assert!(matches!(result, Err(AppError::Config(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}
