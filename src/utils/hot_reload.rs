// Watches the mock directory for changes and feeds them to the reload controller

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle, time::sleep};
use tracing::{error, info, warn};

use crate::{
    constants::hot_reload::CHANNEL_BUFFER_SIZE,
    mock::context::{MockContext, ReloadMode},
    utils::logging::log_reload,
};

/// Maximum retry attempts for watcher creation
const MAX_RETRY_ATTEMPTS: usize = 3;

/// Retry delay for watcher recreation
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Custom error type for hot reload operations
#[derive(Debug, thiserror::Error)]
pub enum HotReloadError {
    #[error("Path resolution failed: {0}")]
    PathResolution(String),

    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Watcher creation failed: {0}")]
    WatcherCreation(String),

    #[error("File watching failed: {0}")]
    FileWatching(String),
}

/// Helper function to resolve and verify the watched directory
fn resolve_and_verify_dir(path: &Path) -> Result<PathBuf, HotReloadError> {
    match fs::canonicalize(path) {
        Ok(resolved_path) => {
            if !resolved_path.is_dir() {
                return Err(HotReloadError::DirectoryNotFound(resolved_path));
            }
            Ok(resolved_path)
        }
        Err(e) => Err(HotReloadError::PathResolution(format!(
            "Failed to resolve path {:?}: {}",
            path, e
        ))),
    }
}

/// Whether an event should trigger a recompile. Paths are judged relative to
/// `root` so an ignored name above the mock directory does not mask it.
pub fn is_relevant_change(event: &Event, root: &Path, ignored_dirs: &[String]) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
        return false;
    }

    event.paths.iter().any(|path| {
        let relative = path.strip_prefix(root).unwrap_or(path);
        !relative.components().any(|component| {
            let name = component.as_os_str().to_string_lossy();
            ignored_dirs.iter().any(|ignored| *ignored == name)
        })
    })
}

fn describe_paths(event: &Event, cwd: &Path) -> String {
    event
        .paths
        .iter()
        .map(|p| match p.strip_prefix(cwd) {
            Ok(relative) => format!("./{}", relative.display()),
            Err(_) => p.display().to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Spawns the task that owns the watcher and serialises reloads.
pub fn spawn_watch_task(runtime: &Handle, ctx: Arc<MockContext>) -> JoinHandle<()> {
    runtime.spawn(async move {
        if let Err(e) = watch_mock_dir(ctx).await {
            // The server keeps running without hot reload
            error!("Mock config watcher failed: {}. Changes will not be reloaded.", e);
        }
    })
}

/// Main watch loop. While `Healthy` the watcher is kept across events; while
/// `Degraded` it is torn down before each retry and armed again afterwards.
async fn watch_mock_dir(ctx: Arc<MockContext>) -> Result<(), HotReloadError> {
    info!("Starting mock config watcher...");

    let root = resolve_and_verify_dir(&ctx.settings().dir)?;
    let cwd = std::env::current_dir().unwrap_or_default();
    let ignored = ctx.settings().ignored_dirs.clone();
    info!(mock_dir = ?root);

    let (tx, mut rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let mut watcher = Some(create_watcher_with_retry(&root, tx.clone()).await?);

    while let Some(event) = rx.recv().await {
        if !is_relevant_change(&event, &root, &ignored) {
            continue;
        }

        let changed = describe_paths(&event, &cwd);
        info!("CHANGED {}", changed);

        let was_degraded = ctx.mode() == ReloadMode::Degraded;
        if was_degraded {
            drop(watcher.take());
        }

        let mode = ctx.handle_change();
        if ctx.last_error().is_none() {
            log_reload(&changed, ctx.rules().len());
        }

        if was_degraded {
            watcher = Some(create_watcher_with_retry(&root, tx.clone()).await?);
            if mode == ReloadMode::Healthy {
                info!("Mock config recovered, watching persistently");
            }
        }
    }

    Ok(())
}

/// Create and arm a watcher with retry mechanism
async fn create_watcher_with_retry(
    root: &Path,
    tx: mpsc::Sender<Event>,
) -> Result<RecommendedWatcher, HotReloadError> {
    for attempt in 1..=MAX_RETRY_ATTEMPTS {
        match create_watcher(root, tx.clone()) {
            Ok(watcher) => {
                if attempt > 1 {
                    info!("Watcher created successfully on attempt {}", attempt);
                }
                return Ok(watcher);
            }
            Err(e) if attempt == MAX_RETRY_ATTEMPTS => {
                return Err(HotReloadError::WatcherCreation(format!(
                    "Failed to create watcher after {} attempts: {}",
                    MAX_RETRY_ATTEMPTS, e
                )));
            }
            Err(e) => {
                warn!(
                    "Watcher creation failed on attempt {}: {}. Retrying...",
                    attempt, e
                );
                sleep(RETRY_DELAY).await;
            }
        }
    }

    Err(HotReloadError::WatcherCreation("no attempts made".to_string()))
}

fn create_watcher(root: &Path, tx: mpsc::Sender<Event>) -> Result<RecommendedWatcher, HotReloadError> {
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) => {
                // Use non-blocking send to avoid deadlocks
                if let Err(e) = tx.try_send(event) {
                    warn!("Failed to send file change event: {}", e);
                }
            }
            Err(e) => warn!("Watch error: {}", e),
        },
        notify::Config::default(),
    )
    .map_err(|e| HotReloadError::WatcherCreation(e.to_string()))?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| HotReloadError::FileWatching(format!("Failed to watch {:?}: {}", root, e)))?;

    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, EventKind, ModifyKind, RemoveKind};

    fn ignored() -> Vec<String> {
        vec!["node_modules".to_string(), "target".to_string()]
    }

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_resolve_and_verify_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        assert!(resolve_and_verify_dir(temp_dir.path()).is_ok());

        let temp_file = tempfile::NamedTempFile::new().unwrap();
        let result = resolve_and_verify_dir(temp_file.path());
        assert!(matches!(result, Err(HotReloadError::DirectoryNotFound(_))));

        let result = resolve_and_verify_dir(Path::new("/non/existent/dir"));
        assert!(matches!(result, Err(HotReloadError::PathResolution(_))));
    }

    #[test]
    fn test_hot_reload_error_creation() {
        let path_error = HotReloadError::PathResolution("test error".to_string());
        assert!(path_error.to_string().contains("Path resolution failed"));

        let dir_error = HotReloadError::DirectoryNotFound(PathBuf::from("/test/path"));
        assert!(dir_error.to_string().contains("Directory not found"));

        let watcher_error = HotReloadError::WatcherCreation("watcher failed".to_string());
        assert!(watcher_error.to_string().contains("Watcher creation failed"));
    }

    #[test]
    fn modifications_inside_mock_dir_are_relevant() {
        let root = Path::new("/proj/mock");
        let e = event(EventKind::Modify(ModifyKind::Any), "/proj/mock/index.yaml");
        assert!(is_relevant_change(&e, root, &ignored()));
        let e = event(EventKind::Create(CreateKind::File), "/proj/mock/users/list.yaml");
        assert!(is_relevant_change(&e, root, &ignored()));
        let e = event(EventKind::Remove(RemoveKind::File), "/proj/mock/index.yaml");
        assert!(is_relevant_change(&e, root, &ignored()));
    }

    #[test]
    fn access_events_are_ignored() {
        let e = event(EventKind::Access(AccessKind::Any), "/proj/mock/index.yaml");
        assert!(!is_relevant_change(&e, Path::new("/proj/mock"), &ignored()));
    }

    #[test]
    fn dependency_directories_are_ignored() {
        let e = event(EventKind::Modify(ModifyKind::Any), "/proj/mock/node_modules/pkg/index.js");
        assert!(!is_relevant_change(&e, Path::new("/proj/mock"), &ignored()));
    }

    #[test]
    fn ignored_names_above_the_root_do_not_matter() {
        let e = event(EventKind::Modify(ModifyKind::Any), "/home/target/proj/mock/index.yaml");
        assert!(is_relevant_change(&e, Path::new("/home/target/proj/mock"), &ignored()));
    }
}
