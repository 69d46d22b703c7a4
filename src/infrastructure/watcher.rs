//! Keeps the gallery live: watches the gallery directory and feeds new,
//! changed and deleted images through the ingest use case.
//!
//! Filesystem callbacks only push events into a channel; a single tokio task
//! owns the debounce state and performs every store mutation.

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};

use crate::application::ingest::IngestUseCase;
use crate::domain::error::DomainError;
use crate::domain::values::identity::Identity;
use crate::infrastructure::fs::gallery_dir::is_gallery_image;

#[derive(Debug, Clone, Copy)]
pub struct WatcherConfig {
    /// Wait after the last write event for a file before reading it. A
    /// heuristic: a producer slower than this can still be read half-written.
    pub settle_delay: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(1),
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IngestEvent {
    Ingested { identity: Identity, path: PathBuf },
    Failed { path: PathBuf, error: String },
    Removed { identity: Identity, path: PathBuf },
    Rescanned { loaded: usize, failed: usize },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WatcherHealth {
    pub watching: bool,
    pub ingested: u64,
    pub failed: u64,
    pub removed: u64,
    pub pending: usize,
    pub last_error: Option<String>,
}

enum WatcherCommand {
    Shutdown,
}

/// Handle to the background ingestion task. Dropping it stops the task.
pub struct DirectoryWatcher {
    command_tx: mpsc::Sender<WatcherCommand>,
    events_tx: broadcast::Sender<IngestEvent>,
    health_rx: watch::Receiver<WatcherHealth>,
    task: Option<JoinHandle<()>>,
}

impl DirectoryWatcher {
    /// Subscribes to the gallery directory and spawns the ingestion task.
    /// Must be called from within a tokio runtime.
    pub fn start(ingest: Arc<IngestUseCase>, config: WatcherConfig) -> Result<Self, DomainError> {
        let root = ingest.gallery().root().to_path_buf();
        ingest.gallery().check_available()?;

        let (fs_tx, fs_rx) = mpsc::channel(1024);
        let (command_tx, command_rx) = mpsc::channel(4);
        let (events_tx, _) = broadcast::channel(256);
        let initial = WatcherHealth {
            watching: true,
            ..WatcherHealth::default()
        };
        let (health_tx, health_rx) = watch::channel(initial.clone());

        let watcher = create_fs_watcher(&root, fs_tx)?;
        info!(
            dir = %root.display(),
            settle_ms = config.settle_delay.as_millis() as u64,
            "watching gallery"
        );

        let watch_loop = WatchLoop {
            ingest,
            config,
            root,
            watcher,
            fs_rx,
            command_rx,
            events_tx: events_tx.clone(),
            health_tx,
            health: initial,
            pending: HashMap::new(),
            retry: None,
        };
        let task = tokio::spawn(watch_loop.run());

        Ok(Self {
            command_tx,
            events_tx,
            health_rx,
            task: Some(task),
        })
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<IngestEvent> {
        self.events_tx.subscribe()
    }

    #[must_use]
    pub fn health(&self) -> WatcherHealth {
        self.health_rx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stops the task and releases the directory subscription.
    pub async fn shutdown(mut self) -> Result<(), DomainError> {
        let _ = self.command_tx.send(WatcherCommand::Shutdown).await;
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| DomainError::Watcher(format!("watcher task failed: {e}")))?;
        }
        Ok(())
    }
}

impl Drop for DirectoryWatcher {
    fn drop(&mut self) {
        let _ = self.command_tx.try_send(WatcherCommand::Shutdown);
    }
}

fn create_fs_watcher(
    root: &Path,
    sender: mpsc::Sender<notify::Result<Event>>,
) -> Result<RecommendedWatcher, DomainError> {
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = sender.blocking_send(res);
        },
        NotifyConfig::default(),
    )
    .map_err(|e| DomainError::Watcher(format!("watcher init failed: {e}")))?;
    watcher
        .watch(root, RecursiveMode::NonRecursive)
        .map_err(|e| DomainError::DirectoryUnavailable {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;
    Ok(watcher)
}

struct WatchLoop {
    ingest: Arc<IngestUseCase>,
    config: WatcherConfig,
    root: PathBuf,
    watcher: RecommendedWatcher,
    fs_rx: mpsc::Receiver<notify::Result<Event>>,
    command_rx: mpsc::Receiver<WatcherCommand>,
    events_tx: broadcast::Sender<IngestEvent>,
    health_tx: watch::Sender<WatcherHealth>,
    health: WatcherHealth,
    /// Paths waiting out their settle delay, with the instant they are due.
    pending: HashMap<PathBuf, Instant>,
    /// Next resubscribe attempt and the backoff that scheduled it.
    retry: Option<(Instant, Duration)>,
}

impl WatchLoop {
    async fn run(mut self) {
        loop {
            let wake = self.next_wake();
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(WatcherCommand::Shutdown) | None => break,
                },
                Some(res) = self.fs_rx.recv() => self.on_fs_event(res).await,
                _ = sleep_until(wake) => {
                    self.ingest_due().await;
                    self.retry_due().await;
                }
            }
            self.publish_health();
        }

        let _ = self.watcher.unwatch(&self.root);
        self.health.watching = false;
        self.publish_health();
        info!(dir = %self.root.display(), "gallery watcher stopped");
    }

    fn next_wake(&self) -> Option<Instant> {
        let next_settle = self.pending.values().min().copied();
        let next_retry = self.retry.map(|(at, _)| at);
        match (next_settle, next_retry) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    async fn on_fs_event(&mut self, res: notify::Result<Event>) {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, "gallery watch error");
                self.health.last_error = Some(e.to_string());
                if !self.root.is_dir() {
                    self.schedule_retry(self.config.initial_backoff);
                }
                return;
            }
        };

        if event.need_rescan() {
            self.rescan().await;
            return;
        }

        let root_removed = event.paths.iter().any(|p| p == &self.root);
        if matches!(event.kind, EventKind::Remove(_)) && root_removed {
            warn!(dir = %self.root.display(), "gallery directory removed");
            self.schedule_retry(self.config.initial_backoff);
            return;
        }

        match event.kind {
            EventKind::Create(CreateKind::File | CreateKind::Any)
            | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any)
            | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                for path in &event.paths {
                    self.schedule(path);
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if let [from, to] = event.paths.as_slice() {
                    self.forget(from);
                    self.schedule(to);
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) | EventKind::Remove(_) => {
                for path in &event.paths {
                    self.forget(path);
                }
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                for path in &event.paths {
                    if path.exists() {
                        self.schedule(path);
                    } else {
                        self.forget(path);
                    }
                }
            }
            _ => {}
        }
    }

    /// (Re)starts the settle timer for a gallery image.
    fn schedule(&mut self, path: &Path) {
        if !is_gallery_image(path) {
            return;
        }
        debug!(path = %path.display(), "gallery image written; settling");
        self.pending
            .insert(path.to_path_buf(), Instant::now() + self.config.settle_delay);
    }

    fn forget(&mut self, path: &Path) {
        self.pending.remove(path);
        if let Some(identity) = self.ingest.forget_file(path) {
            info!(identity = %identity, path = %path.display(), "gallery image removed");
            self.health.removed += 1;
            self.emit(IngestEvent::Removed {
                identity,
                path: path.to_path_buf(),
            });
        }
    }

    async fn ingest_due(&mut self) {
        let now = Instant::now();
        let mut due: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(path, _)| path.clone())
            .collect();
        due.sort();

        for path in due {
            self.pending.remove(&path);
            if !path.is_file() {
                debug!(path = %path.display(), "gallery image vanished before ingestion");
                continue;
            }
            match self.ingest.ingest_file(&path).await {
                Ok(identity) => {
                    info!(identity = %identity, path = %path.display(), "new face added");
                    self.health.ingested += 1;
                    self.emit(IngestEvent::Ingested { identity, path });
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to ingest gallery image");
                    self.health.failed += 1;
                    self.health.last_error = Some(e.to_string());
                    self.emit(IngestEvent::Failed {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    fn schedule_retry(&mut self, backoff: Duration) {
        self.health.watching = false;
        if self.retry.is_none() {
            self.retry = Some((Instant::now() + backoff, backoff));
        }
    }

    async fn retry_due(&mut self) {
        let Some((at, backoff)) = self.retry else {
            return;
        };
        if at > Instant::now() {
            return;
        }
        self.retry = None;

        let _ = self.watcher.unwatch(&self.root);
        let resubscribed = match self.ingest.gallery().check_available() {
            Ok(()) => self
                .watcher
                .watch(&self.root, RecursiveMode::NonRecursive)
                .map_err(DomainError::from),
            Err(e) => Err(e),
        };
        match resubscribed {
            Ok(()) => {
                info!(dir = %self.root.display(), "gallery watch re-established");
                self.health.watching = true;
                self.rescan().await;
            }
            Err(e) => {
                let next = (backoff * 2).min(self.config.max_backoff);
                warn!(
                    error = %e,
                    retry_in_ms = next.as_millis() as u64,
                    "gallery directory still unavailable"
                );
                self.health.last_error = Some(e.to_string());
                self.schedule_retry(next);
            }
        }
    }

    async fn rescan(&mut self) {
        for identity in self.ingest.prune_missing() {
            self.health.removed += 1;
            debug!(identity = %identity, "pruned record without backing file");
        }
        match self.ingest.bulk_load().await {
            Ok(report) => {
                self.health.failed += report.failures.len() as u64;
                self.emit(IngestEvent::Rescanned {
                    loaded: report.loaded,
                    failed: report.failures.len(),
                });
            }
            Err(e) => {
                error!(error = %e, "gallery rescan failed");
                self.health.last_error = Some(e.to_string());
                self.schedule_retry(self.config.initial_backoff);
            }
        }
    }

    /// Publishes health before the event so subscribers see counts that
    /// already include it.
    fn emit(&mut self, event: IngestEvent) {
        self.publish_health();
        let _ = self.events_tx.send(event);
    }

    fn publish_health(&mut self) {
        self.health.pending = self.pending.len();
        self.health_tx.send_replace(self.health.clone());
    }
}

async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
