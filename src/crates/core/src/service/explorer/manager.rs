//! Explorer manager
//!
//! The state-synchronization engine behind the file-tree view. All disk I/O
//! goes through the directory service; the manager owns the snapshot, the
//! refresh ordering discipline and the debounce timer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use log::{debug, warn};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::filesystem::path_utils::{join_rel, normalize_rel, validate_entry_name};
use crate::infrastructure::filesystem::DirectoryService;
use crate::service::explorer::observable::{ObservableState, Subscription};
use crate::service::explorer::types::{ExplorerViewState, OperationResult};

/// Settle delay for bursts of host file events.
pub const CHANGE_DEBOUNCE_DELAY: Duration = Duration::from_millis(100);
/// Longer settle delay after window focus, to ride out focus flicker.
pub const WINDOW_FOCUS_DEBOUNCE_DELAY: Duration = Duration::from_millis(500);

/// Live, editable projection of a directory subtree.
///
/// Created when the view opens and torn down with [`destroy`] when it closes.
/// Always lives behind an `Arc`; the debounce timer task holds only a weak
/// reference back to the manager, so a dropped view is never kept alive by
/// its own timer.
///
/// [`destroy`]: ExplorerManager::destroy
pub struct ExplorerManager {
    directory_service: Arc<dyn DirectoryService>,
    state: ObservableState<ExplorerViewState>,
    /// Monotonic refresh token; only the most recently issued read installs.
    refresh_seq: AtomicU64,
    debounce_task: Mutex<Option<JoinHandle<()>>>,
    cancel_token: CancellationToken,
    weak_self: Weak<ExplorerManager>,
}

impl ExplorerManager {
    pub fn new(directory_service: Arc<dyn DirectoryService>) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            directory_service,
            state: ObservableState::new(ExplorerViewState::new("")),
            refresh_seq: AtomicU64::new(0),
            debounce_task: Mutex::new(None),
            cancel_token: CancellationToken::new(),
            weak_self: weak_self.clone(),
        })
    }

    /// Current snapshot, for consumers that do not subscribe.
    pub fn state(&self) -> Arc<ExplorerViewState> {
        self.state.get()
    }

    /// Register a snapshot listener. The current snapshot is delivered
    /// synchronously before this returns; afterwards the listener runs on
    /// every installed transition, in subscription order.
    pub fn subscribe(
        &self,
        listener: impl Fn(&ExplorerViewState) + Send + Sync + 'static,
    ) -> Subscription<ExplorerViewState> {
        self.state.subscribe(listener)
    }

    /// Pure state update: no I/O, listeners notified synchronously.
    pub fn select(&self, path: Option<&str>) {
        self.state.update(|s| s.selected_path = path.map(str::to_string));
    }

    /// Re-read the subtree constrained by the current expansion set and
    /// install the result.
    ///
    /// Overlapping calls resolve last-issued-wins: a read that finishes after
    /// a newer one was issued is discarded, so a slow stale listing can never
    /// clobber a fresher fast one. On failure the previous entries stay
    /// visible and only `error` is set.
    pub async fn refresh(&self) {
        let token = self.refresh_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let issued = self.state.update(|s| {
            s.loading = true;
            s.error = None;
        });
        debug!("Refresh issued: token={}", token);

        let result = self
            .directory_service
            .read_directory_recursive(&issued.current_path, &issued.expanded_paths)
            .await;

        if self.cancel_token.is_cancelled() {
            return;
        }
        if self.refresh_seq.load(Ordering::SeqCst) != token {
            debug!("Refresh superseded, discarding result: token={}", token);
            return;
        }

        match result {
            Ok(entries) => {
                debug!("Refresh complete: token={} entries={}", token, entries.len());
                self.state.update(|s| {
                    s.loading = false;
                    s.error = None;
                    s.entries = entries;
                });
            }
            Err(e) => {
                warn!("Refresh failed, keeping previous entries: error={}", e);
                let message = e.to_string();
                self.state.update(|s| {
                    s.loading = false;
                    s.error = Some(message);
                });
            }
        }
    }

    /// Coalesce a burst of triggers into one [`refresh`] fired `delay` after
    /// the last call. Re-triggering before the delay elapses resets the
    /// timer instead of queueing another refresh.
    ///
    /// [`refresh`]: ExplorerManager::refresh
    pub fn refresh_debounced(&self, delay: Duration) {
        if self.cancel_token.is_cancelled() {
            return;
        }
        let weak = self.weak_self.clone();
        let cancel = self.cancel_token.clone();
        let mut slot = self.debounce_task.lock();
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(manager) = weak.upgrade() {
                        manager.refresh().await;
                    }
                }
            }
        }));
    }

    /// Host file-create/delete/rename notification.
    pub fn notify_external_change(&self) {
        self.refresh_debounced(CHANGE_DEBOUNCE_DELAY);
    }

    /// Host window-focus notification.
    pub fn notify_window_focus(&self) {
        self.refresh_debounced(WINDOW_FOCUS_DEBOUNCE_DELAY);
    }

    /// Flip `path` in the expansion set, then re-read. Collapsing a folder
    /// does not touch the selection; only delete clears it.
    pub async fn toggle_expand(&self, path: &str) {
        self.state.update(|s| {
            if !s.expanded_paths.remove(path) {
                s.expanded_paths.insert(path.to_string());
            }
        });
        self.refresh().await;
    }

    pub async fn collapse_all(&self) {
        self.state.update(|s| s.expanded_paths.clear());
        self.refresh().await;
    }

    pub async fn create_file(&self, dir_path: &str, name: &str) -> OperationResult {
        if let Err(e) = validate_entry_name(name) {
            return OperationResult::failed(format!("Cannot create \"{}\"", name), &e);
        }
        match self.directory_service.create_file(dir_path, name).await {
            Ok(()) => {
                self.refresh().await;
                OperationResult::ok(format!("Created \"{}\"", join_rel(dir_path, name)))
            }
            Err(e) => OperationResult::failed(format!("Cannot create \"{}\"", name), &e),
        }
    }

    /// On success the parent directory is also added to the expansion set, so
    /// the new folder is visible without a manual expand.
    pub async fn create_directory(&self, dir_path: &str, name: &str) -> OperationResult {
        if let Err(e) = validate_entry_name(name) {
            return OperationResult::failed(format!("Cannot create folder \"{}\"", name), &e);
        }
        let parent = match normalize_rel(dir_path) {
            Ok(p) => p,
            Err(e) => {
                return OperationResult::failed(format!("Cannot create folder \"{}\"", name), &e)
            }
        };
        match self.directory_service.create_directory(&parent, name).await {
            Ok(()) => {
                self.state.update(|s| {
                    s.expanded_paths.insert(parent.clone());
                });
                self.refresh().await;
                OperationResult::ok(format!("Created folder \"{}\"", join_rel(&parent, name)))
            }
            Err(e) => OperationResult::failed(format!("Cannot create folder \"{}\"", name), &e),
        }
    }

    pub async fn rename(&self, target_path: &str, new_name: &str) -> OperationResult {
        if let Err(e) = validate_entry_name(new_name) {
            return OperationResult::failed(format!("Cannot rename to \"{}\"", new_name), &e);
        }
        match self.directory_service.rename(target_path, new_name).await {
            Ok(()) => {
                self.refresh().await;
                OperationResult::ok(format!("Renamed \"{}\" to \"{}\"", target_path, new_name))
            }
            Err(e) => OperationResult::failed(format!("Cannot rename to \"{}\"", new_name), &e),
        }
    }

    /// Move the entry to trash. A selection pointing at the deleted path is
    /// cleared synchronously before the follow-up refresh, so the view never
    /// shows a selected-but-vanishing item.
    pub async fn delete(&self, target_path: &str) -> OperationResult {
        match self.directory_service.delete(target_path).await {
            Ok(()) => {
                if self.state.get().selected_path.as_deref() == Some(target_path) {
                    self.state.update(|s| s.selected_path = None);
                }
                self.refresh().await;
                OperationResult::ok(format!("Moved \"{}\" to trash", target_path))
            }
            Err(e) => OperationResult::failed(format!("Cannot delete \"{}\"", target_path), &e),
        }
    }

    pub async fn open_with_system_app(&self, path: &str) -> OperationResult {
        match self.directory_service.open_with_system_app(path).await {
            Ok(()) => OperationResult::ok(format!("Opened \"{}\"", path)),
            Err(e) => OperationResult::failed(format!("Cannot open \"{}\"", path), &e),
        }
    }

    pub async fn show_in_folder(&self, path: &str) -> OperationResult {
        match self.directory_service.show_in_folder(path).await {
            Ok(()) => OperationResult::ok(format!("Revealed \"{}\"", path)),
            Err(e) => OperationResult::failed(format!("Cannot reveal \"{}\"", path), &e),
        }
    }

    /// Tear the engine down: cancel the debounce timer, turn late refresh
    /// resolutions into no-ops and drop every listener.
    pub fn destroy(&self) {
        self.cancel_token.cancel();
        if let Some(task) = self.debounce_task.lock().take() {
            task.abort();
        }
        self.state.clear_listeners();
        debug!("Explorer manager destroyed");
    }
}
