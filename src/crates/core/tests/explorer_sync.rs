//! Synchronization behavior of the explorer engine against a scripted
//! directory service: refresh ordering, debounce coalescing, selection
//! handling and teardown.

use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use treeline_core::service::explorer::{CHANGE_DEBOUNCE_DELAY, WINDOW_FOCUS_DEBOUNCE_DELAY};
use treeline_core::{
    DirectoryService, ExplorerManager, ExplorerViewState, FileEntry, TreelineError,
    TreelineResult,
};

struct ScriptedRead {
    delay: Duration,
    result: TreelineResult<Vec<FileEntry>>,
}

/// Directory service with scripted listings and controllable resolution
/// delays. Mutations always succeed and are recorded.
#[derive(Default)]
struct ScriptedService {
    reads: Mutex<VecDeque<ScriptedRead>>,
    read_calls: AtomicUsize,
    seen_expanded: Mutex<Vec<BTreeSet<String>>>,
    mutations: Mutex<Vec<String>>,
}

impl ScriptedService {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push_read(&self, delay_ms: u64, entries: Vec<FileEntry>) {
        self.reads.lock().push_back(ScriptedRead {
            delay: Duration::from_millis(delay_ms),
            result: Ok(entries),
        });
    }

    fn push_failure(&self, delay_ms: u64, message: &str) {
        self.reads.lock().push_back(ScriptedRead {
            delay: Duration::from_millis(delay_ms),
            result: Err(TreelineError::OperationFailed(message.to_string())),
        });
    }

    fn read_calls(&self) -> usize {
        self.read_calls.load(Ordering::SeqCst)
    }

    fn mutations(&self) -> Vec<String> {
        self.mutations.lock().clone()
    }
}

#[async_trait]
impl DirectoryService for ScriptedService {
    async fn read_directory_recursive(
        &self,
        _current_path: &str,
        expanded: &BTreeSet<String>,
    ) -> TreelineResult<Vec<FileEntry>> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_expanded.lock().push(expanded.clone());
        let scripted = self.reads.lock().pop_front();
        match scripted {
            Some(read) => {
                tokio::time::sleep(read.delay).await;
                read.result
            }
            None => Ok(Vec::new()),
        }
    }

    async fn create_file(&self, dir_path: &str, name: &str) -> TreelineResult<()> {
        self.mutations.lock().push(format!("create_file {}/{}", dir_path, name));
        Ok(())
    }

    async fn create_directory(&self, dir_path: &str, name: &str) -> TreelineResult<()> {
        self.mutations.lock().push(format!("create_directory {}/{}", dir_path, name));
        Ok(())
    }

    async fn rename(&self, target_path: &str, new_name: &str) -> TreelineResult<()> {
        self.mutations.lock().push(format!("rename {} {}", target_path, new_name));
        Ok(())
    }

    async fn delete(&self, target_path: &str) -> TreelineResult<()> {
        self.mutations.lock().push(format!("delete {}", target_path));
        Ok(())
    }

    async fn open_with_system_app(&self, path: &str) -> TreelineResult<()> {
        self.mutations.lock().push(format!("open {}", path));
        Ok(())
    }

    async fn show_in_folder(&self, path: &str) -> TreelineResult<()> {
        self.mutations.lock().push(format!("reveal {}", path));
        Ok(())
    }
}

fn entry(path: &str, is_directory: bool) -> FileEntry {
    let name = path.rsplit('/').next().expect("non-empty path").to_string();
    let extension = match name.rfind('.') {
        Some(idx) if idx > 0 && !is_directory => name[idx..].to_lowercase(),
        _ => String::new(),
    };
    FileEntry {
        is_hidden: name.starts_with('.'),
        absolute_path: format!("/vault/{}", path),
        path: path.to_string(),
        name,
        is_directory,
        extension,
        size: if is_directory { None } else { Some(0) },
        modified_time: None,
    }
}

/// Let spawned tasks run without advancing the clock.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn subscribe_delivers_current_snapshot_synchronously() {
    let service = ScriptedService::new();
    let manager = ExplorerManager::new(service);

    let seen: Arc<Mutex<Vec<ExplorerViewState>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = manager.subscribe(move |state| sink.lock().push(state.clone()));

    {
        let seen = seen.lock();
        assert_eq!(seen.len(), 1, "initial snapshot delivered before subscribe returns");
        assert!(!seen[0].loading);
        assert!(seen[0].entries.is_empty());
    }

    subscription.unsubscribe();
    manager.select(Some("a.md"));
    assert_eq!(seen.lock().len(), 1, "unsubscribed listener no longer notified");
}

#[tokio::test(start_paused = true)]
async fn refresh_installs_listing_and_reports_loading() {
    let service = ScriptedService::new();
    service.push_read(10, vec![entry("a.md", false), entry("Notes", true)]);
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);

    let seen: Arc<Mutex<Vec<ExplorerViewState>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    manager.subscribe(move |state| sink.lock().push(state.clone()));

    manager.refresh().await;

    let state = manager.state();
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert_eq!(state.entries.len(), 2);
    assert!(state.entry_at("a.md").is_some());

    let seen = seen.lock();
    assert!(
        seen.iter().any(|s| s.loading),
        "loading=true must be observable while the read is in flight"
    );
    let last = seen.last().expect("final snapshot");
    assert!(!last.loading);
    assert_eq!(last.entries.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn refresh_failure_preserves_previous_entries() {
    let service = ScriptedService::new();
    service.push_read(0, vec![entry("keep.md", false)]);
    service.push_failure(0, "disk detached");
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);

    manager.refresh().await;
    assert_eq!(manager.state().entries.len(), 1);

    manager.refresh().await;
    let state = manager.state();
    assert!(!state.loading);
    assert_eq!(state.entries.len(), 1, "stale-but-visible beats a blanked screen");
    assert!(state.error.as_deref().unwrap_or("").contains("disk detached"));

    // A later successful refresh clears the error again.
    service.push_read(0, vec![entry("keep.md", false), entry("new.md", false)]);
    manager.refresh().await;
    let state = manager.state();
    assert_eq!(state.error, None);
    assert_eq!(state.entries.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn last_issued_refresh_wins() {
    let service = ScriptedService::new();
    // First issued read is slow and stale, second is fast and fresh.
    service.push_read(100, vec![entry("stale.md", false)]);
    service.push_read(10, vec![entry("fresh.md", false)]);
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);

    let first = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.refresh().await })
    };
    settle().await;
    let second = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.refresh().await })
    };

    first.await.expect("first refresh task");
    second.await.expect("second refresh task");
    assert_eq!(service.read_calls(), 2);

    let state = manager.state();
    assert!(!state.loading);
    assert_eq!(
        state.entries,
        vec![entry("fresh.md", false)],
        "slow stale read must not clobber the most recently issued one"
    );
}

#[tokio::test(start_paused = true)]
async fn external_change_bursts_coalesce_into_one_refresh() {
    let service = ScriptedService::new();
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);

    for _ in 0..5 {
        manager.notify_external_change();
        tokio::time::advance(CHANGE_DEBOUNCE_DELAY / 2).await;
        settle().await;
    }
    assert_eq!(service.read_calls(), 0, "timer resets while the burst lasts");

    tokio::time::advance(CHANGE_DEBOUNCE_DELAY * 2).await;
    settle().await;
    assert_eq!(service.read_calls(), 1, "exactly one refresh after the burst quiets");
}

#[tokio::test(start_paused = true)]
async fn window_focus_uses_longer_settle_delay() {
    let service = ScriptedService::new();
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);

    manager.notify_window_focus();
    tokio::time::advance(CHANGE_DEBOUNCE_DELAY * 2).await;
    settle().await;
    assert_eq!(service.read_calls(), 0, "focus refresh waits out the longer delay");

    tokio::time::advance(WINDOW_FOCUS_DEBOUNCE_DELAY).await;
    settle().await;
    assert_eq!(service.read_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn toggle_expand_refreshes_with_the_new_expansion_set() {
    let service = ScriptedService::new();
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);

    manager.toggle_expand("Notes").await;
    assert!(manager.state().is_expanded("Notes"));

    manager.toggle_expand("Notes").await;
    assert!(!manager.state().is_expanded("Notes"));

    let seen = service.seen_expanded.lock();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].contains("Notes"));
    assert!(seen[1].is_empty());
}

#[tokio::test(start_paused = true)]
async fn collapse_all_clears_the_expansion_set() {
    let service = ScriptedService::new();
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);

    manager.toggle_expand("a").await;
    manager.toggle_expand("a/b").await;
    assert_eq!(manager.state().expanded_paths.len(), 2);

    manager.collapse_all().await;
    assert!(manager.state().expanded_paths.is_empty());
    assert_eq!(service.read_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn delete_clears_selection_before_the_refresh_completes() {
    let service = ScriptedService::new();
    // The refresh following the delete stays in flight for a while.
    service.push_read(100, Vec::new());
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);

    manager.select(Some("doomed.md"));
    let deletion = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.delete("doomed.md").await })
    };
    settle().await;

    let state = manager.state();
    assert!(state.loading, "follow-up refresh still pending");
    assert_eq!(state.selected_path, None, "selection cleared before the refresh lands");

    let result = deletion.await.expect("delete task");
    assert!(result.success);
    assert!(!manager.state().loading);
}

#[tokio::test(start_paused = true)]
async fn collapsing_does_not_clear_selection() {
    let service = ScriptedService::new();
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);

    manager.toggle_expand("Notes").await;
    manager.select(Some("Notes/a.md"));
    manager.toggle_expand("Notes").await;

    assert_eq!(manager.state().selected_path.as_deref(), Some("Notes/a.md"));
}

#[tokio::test]
async fn invalid_name_is_rejected_before_the_directory_service() {
    let service = ScriptedService::new();
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);
    let before = manager.state();

    let result = manager.create_file("", "bad:name.md").await;
    assert!(!result.success);
    assert!(result.error.as_deref().unwrap_or("").contains("illegal character"));

    assert_eq!(service.read_calls(), 0);
    assert!(service.mutations().is_empty());
    let after = manager.state();
    assert!(Arc::ptr_eq(&before, &after), "state untouched on validation failure");

    for name in ["", "   ", "a/b.md", "question?.md"] {
        assert!(!manager.create_file("", name).await.success);
        assert!(!manager.create_directory("", name).await.success);
        assert!(!manager.rename("x.md", name).await.success);
    }
    assert!(service.mutations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn create_directory_expands_the_parent() {
    let service = ScriptedService::new();
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);

    let result = manager.create_directory("", "Notes").await;
    assert!(result.success);
    assert!(manager.state().is_expanded(""));

    let result = manager.create_directory("Notes", "Sub").await;
    assert!(result.success);
    assert!(manager.state().is_expanded("Notes"));

    assert_eq!(
        service.mutations(),
        vec!["create_directory /Notes", "create_directory Notes/Sub"]
    );
}

#[tokio::test]
async fn listener_panic_is_isolated() {
    let service = ScriptedService::new();
    let manager = ExplorerManager::new(service);

    manager.subscribe(|_| panic!("broken listener"));
    let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    manager.subscribe(move |state| sink.lock().push(state.selected_path.clone()));

    manager.select(Some("a.md"));

    assert_eq!(
        *seen.lock(),
        vec![None, Some("a.md".to_string())],
        "listener after the panicking one still observes every transition"
    );
}

#[tokio::test(start_paused = true)]
async fn destroy_cancels_a_pending_debounce() {
    let service = ScriptedService::new();
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);

    manager.notify_external_change();
    manager.destroy();
    tokio::time::advance(WINDOW_FOCUS_DEBOUNCE_DELAY * 4).await;
    settle().await;

    assert_eq!(service.read_calls(), 0, "no refresh may fire after teardown");
}

#[tokio::test(start_paused = true)]
async fn destroy_discards_an_in_flight_refresh() {
    let service = ScriptedService::new();
    service.push_read(100, vec![entry("late.md", false)]);
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);

    let refresh = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { manager.refresh().await })
    };
    settle().await;
    manager.destroy();

    refresh.await.expect("refresh task");
    assert!(
        manager.state().entries.is_empty(),
        "late resolution must not mutate a torn-down state"
    );
}

#[tokio::test]
async fn snapshots_serialize_camel_case() {
    let service = ScriptedService::new();
    service.push_read(0, vec![entry("Notes", true), entry("a.md", false)]);
    let manager = ExplorerManager::new(Arc::clone(&service) as Arc<dyn DirectoryService>);
    manager.refresh().await;

    let value = serde_json::to_value(manager.state().as_ref()).expect("serialize snapshot");
    for key in ["loading", "error", "entries", "expandedPaths", "selectedPath", "currentPath"] {
        assert!(value.get(key).is_some(), "missing key {}", key);
    }
    let file = &value["entries"][1];
    assert_eq!(file["isDirectory"], false);
    assert_eq!(file["absolutePath"], "/vault/a.md");
    assert_eq!(file["extension"], ".md");
    let dir = &value["entries"][0];
    assert!(dir.get("size").is_none(), "directories omit size");
    assert!(dir.get("modifiedTime").is_none(), "directories omit modifiedTime");
}
