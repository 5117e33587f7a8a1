use anyhow::{Context, Result};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

/// Events emitted by the directory watcher
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// Entries in the watched directory changed; the browser should re-read it
    DirChanged(PathBuf),
}

/// A debounced watcher on the directory the file browser is showing
pub struct DirWatcher {
    _watcher: notify_debouncer_mini::Debouncer<RecommendedWatcher>,
}

impl DirWatcher {
    /// Watch `dir` (not its subdirectories). Bursts of changes within
    /// `debounce_ms` arrive as a single event.
    pub fn new(dir: &Path, debounce_ms: u64, tx: mpsc::Sender<WatchEvent>) -> Result<Self> {
        let owned = dir.to_path_buf();
        let mut debouncer = new_debouncer(
            Duration::from_millis(debounce_ms),
            move |result: std::result::Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    if events.iter().any(|e| e.kind == DebouncedEventKind::Any) {
                        let _ = tx.send(WatchEvent::DirChanged(owned.clone()));
                    }
                }
                Err(e) => log::warn!("directory watcher error: {}", e),
            },
        )?;

        debouncer
            .watcher()
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("cannot watch {}", dir.display()))?;

        Ok(DirWatcher { _watcher: debouncer })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_file_in_watched_dir_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let _watcher = DirWatcher::new(dir.path(), 50, tx).unwrap();

        std::fs::write(dir.path().join("new.png"), b"png").unwrap();
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event, WatchEvent::DirChanged(dir.path().to_path_buf()));
    }

    #[test]
    fn missing_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::channel();
        assert!(DirWatcher::new(&dir.path().join("gone"), 50, tx).is_err());
    }
}
