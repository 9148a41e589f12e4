//! File system watcher for external database changes

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::{Error, Result};

/// Debounce duration - wait this long after last event before sending update
const DEBOUNCE_MS: u64 = 100;

/// Changes seen this soon after one of the server's own writes are not
/// reported as external reloads.
const LOCAL_WRITE_WINDOW_MS: u64 = 500;

/// When the server itself last wrote to the database.
///
/// Pages already get `tools_changed` for those writes, so the watcher uses
/// this to avoid a second refresh.
#[derive(Debug, Clone, Default)]
pub struct LocalWrites(Arc<Mutex<Option<Instant>>>);

impl LocalWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a write made by the server.
    pub fn mark(&self) {
        if let Ok(mut last) = self.0.lock() {
            *last = Some(Instant::now());
        }
    }

    /// True if the server wrote within the last `window`.
    pub fn within(&self, window: Duration) -> bool {
        self.0
            .lock()
            .ok()
            .and_then(|last| *last)
            .is_some_and(|at| at.elapsed() < window)
    }
}

/// Watch the database file and broadcast `{"type":"reload"}` when it changes.
///
/// The parent directory is watched so that SQLite's journal files and
/// replace-by-rename writes are seen too.
pub async fn watch_database(
    database: PathBuf,
    update_tx: broadcast::Sender<String>,
    local_writes: LocalWrites,
) -> Result<()> {
    let database = database.canonicalize().unwrap_or(database);
    let dir = database
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = database
        .file_name()
        .map(OsStr::to_os_string)
        .ok_or_else(|| Error::Other(format!("not a file path: {}", database.display())))?;

    let (tx, mut rx) = tokio::sync::mpsc::channel(100);
    let mut watcher = RecommendedWatcher::new(
        move |res: std::result::Result<Event, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        },
        Config::default(),
    )
    .map_err(|e| Error::Other(format!("failed to create file watcher: {}", e)))?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| Error::Other(format!("failed to watch {}: {}", dir.display(), e)))?;
    tracing::debug!(path = %database.display(), "watching database for changes");

    let mut pending_update = false;
    let mut last_event_time = Instant::now();

    loop {
        let timeout = if pending_update {
            Duration::from_millis(DEBOUNCE_MS).saturating_sub(last_event_time.elapsed())
        } else {
            Duration::from_secs(3600)
        };

        tokio::select! {
            event = rx.recv() => {
                match event {
                    Some(event) => {
                        if is_database_event(&event, &file_name) {
                            pending_update = true;
                            last_event_time = Instant::now();
                        }
                    }
                    None => break,
                }
            }
            _ = tokio::time::sleep(timeout), if pending_update => {
                if local_writes.within(Duration::from_millis(LOCAL_WRITE_WINDOW_MS)) {
                    tracing::trace!("ignoring change from own write");
                } else {
                    tracing::debug!("database changed on disk");
                    let _ = update_tx.send(reload_message());
                }
                pending_update = false;
            }
        }
    }

    Ok(())
}

/// True for writes to the database file or its `-journal`/`-wal` siblings.
fn is_database_event(event: &Event, file_name: &OsStr) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    );
    relevant_kind
        && event.paths.iter().any(|p| {
            match (p.file_name().and_then(OsStr::to_str), file_name.to_str()) {
                (Some(name), Some(db)) => name.starts_with(db),
                _ => p.file_name() == Some(file_name),
            }
        })
}

fn reload_message() -> String {
    serde_json::json!({
        "type": "reload",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })
    .to_string()
}
