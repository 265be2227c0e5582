//! # Upload Queue
//!
//! Bounded-concurrency scheduler that owns every upload task of one editor
//! session.
//!
//! ## Lifecycle
//!
//! ```text
//! add ──► queued ──► compressing ──► uploading ──► validating ──► success
//!   │                    │               │              │
//!   └──► failed ◄────────┴───────────────┴──────────────┘
//!          │
//!        retry ──► queued
//! ```
//!
//! `remove` and `clear` drop tasks entirely; there is no aborted status.
//!
//! ## Concurrency
//!
//! All bookkeeping lives behind one mutex that is never held across an
//! `.await`. Each dispatch gets a fresh cancellation token and generation
//! number; a completion whose generation is no longer tracked changes
//! nothing, so removed or cleared tasks can't come back. Cancellation is
//! cooperative: a cancelled run keeps its slot until its future returns.
//! Document calls are made while holding the queue lock (queue → document
//! lock order).

use crate::broadcast::{StatusBroadcaster, SubscriptionId};
use crate::config::QueueConfig;
use crate::error::{QueueError, UploadError, UploadResult};
use crate::preprocess::{ImagePreprocessor, Preprocess};
use crate::probe::{validate_reference, ReferenceProbe, UrlProbe};
use crate::resources::{LocalHandle, LocalResourceRegistry};
use crate::status::{Status, StatusSnapshot};
use crate::task::{TaskId, UploadRequest, UploadTask};
use folio_common::{DocumentBinding, Marker, PlaceholderState};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

#[derive(Clone)]
pub struct UploadQueue {
    inner: Arc<QueueInner>,
}

struct QueueInner {
    config: QueueConfig,
    document: Arc<dyn DocumentBinding>,
    preprocessor: Arc<dyn Preprocess>,
    probe: Arc<dyn ReferenceProbe>,
    resources: LocalResourceRegistry,
    broadcaster: StatusBroadcaster,
    state: Mutex<QueueState>,
    sequence: AtomicU64,
    runtime: Handle,
    idle: watch::Sender<bool>,
}

#[derive(Default)]
struct QueueState {
    /// FIFO of tasks waiting for a slot
    pending: VecDeque<TaskId>,

    /// generation -> task holding a slot, including cancelled runs still unwinding
    running: HashMap<u64, TaskId>,

    /// Submission order
    snapshots: Vec<StatusSnapshot>,

    /// Non-success tasks, including failed ones kept for retry
    tasks: HashMap<TaskId, TrackedTask>,

    next_generation: u64,
    revision: u64,
}

struct TrackedTask {
    task: UploadTask,
    preview: Option<LocalHandle>,
    run: Option<RunHandle>,
}

struct RunHandle {
    generation: u64,
    cancel: CancellationToken,
}

impl TrackedTask {
    fn release_preview(&mut self) {
        if let Some(preview) = self.preview.take() {
            preview.release();
        }
    }
}

impl QueueState {
    fn snapshot(&self, id: &TaskId) -> Option<&StatusSnapshot> {
        self.snapshots.iter().find(|s| &s.id == id)
    }

    fn snapshot_mut(&mut self, id: &TaskId) -> Option<&mut StatusSnapshot> {
        self.snapshots.iter_mut().find(|s| &s.id == id)
    }

    fn set_status(&mut self, id: &TaskId, status: Status) {
        if let Some(snapshot) = self.snapshot_mut(id) {
            snapshot.status = status;
            if status != Status::Failed {
                snapshot.error = None;
            }
        }
    }

    fn fail(&mut self, id: &TaskId, error: &UploadError) {
        if let Some(snapshot) = self.snapshot_mut(id) {
            snapshot.status = Status::Failed;
            snapshot.error = Some(error.to_string());
        }
    }

    fn is_current(&self, id: &TaskId, generation: u64) -> bool {
        self.tasks
            .get(id)
            .and_then(|tracked| tracked.run.as_ref())
            .map_or(false, |run| run.generation == generation)
    }

    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.running.is_empty()
    }
}

pub struct UploadQueueBuilder {
    document: Arc<dyn DocumentBinding>,
    config: QueueConfig,
    preprocessor: Option<Arc<dyn Preprocess>>,
    probe: Option<Arc<dyn ReferenceProbe>>,
}

impl UploadQueueBuilder {
    pub fn config(mut self, config: QueueConfig) -> Self {
        self.config = config;
        self
    }

    pub fn preprocessor(mut self, preprocessor: Arc<dyn Preprocess>) -> Self {
        self.preprocessor = Some(preprocessor);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn ReferenceProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Captures the current Tokio runtime; tasks are spawned onto it
    pub fn build(self) -> Result<UploadQueue, QueueError> {
        let runtime = Handle::try_current().map_err(|_| QueueError::NoRuntime)?;
        let (idle, _) = watch::channel(true);

        tracing::debug!(
            "[UploadQueue] Created (max_concurrent={}, max_size={:?})",
            self.config.max_concurrent,
            self.config.max_size
        );

        Ok(UploadQueue {
            inner: Arc::new(QueueInner {
                config: self.config,
                document: self.document,
                preprocessor: self
                    .preprocessor
                    .unwrap_or_else(|| Arc::new(ImagePreprocessor::new())),
                probe: self.probe.unwrap_or_else(|| Arc::new(UrlProbe)),
                resources: LocalResourceRegistry::new(),
                broadcaster: StatusBroadcaster::new(),
                state: Mutex::new(QueueState::default()),
                sequence: AtomicU64::new(0),
                runtime,
                idle,
            }),
        })
    }
}

impl UploadQueue {
    pub fn builder(document: Arc<dyn DocumentBinding>) -> UploadQueueBuilder {
        UploadQueueBuilder {
            document,
            config: QueueConfig::default(),
            preprocessor: None,
            probe: None,
        }
    }

    /// Queue with default preprocessor and probe
    pub fn new(document: Arc<dyn DocumentBinding>, config: QueueConfig) -> Result<Self, QueueError> {
        Self::builder(document).config(config).build()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Publish the state behind `guard` and release the lock
    fn commit(&self, mut guard: MutexGuard<'_, QueueState>) {
        guard.revision += 1;
        let revision = guard.revision;
        let snapshots = guard.snapshots.clone();
        self.inner.idle.send_replace(guard.is_idle());
        drop(guard);

        self.inner.broadcaster.publish(revision, snapshots);
    }

    fn admit(&self, task: &UploadTask) -> UploadResult<()> {
        let constraints = &task.constraints;
        if !constraints.accept.matches(&task.file.mime, &task.file.name) {
            return Err(UploadError::UnsupportedType(task.file.mime.clone()));
        }
        crate::preprocess::check_size(task.file.size(), constraints.max_size, constraints.force_reduce)?;
        Ok(())
    }

    /// Submit a file. Never fails: problems show up as a `failed` snapshot.
    pub fn add(&self, request: UploadRequest) -> TaskId {
        let UploadRequest {
            file,
            position,
            uploader,
            id,
            constraints,
        } = request;

        let id = id.unwrap_or_else(|| {
            TaskId::generate(&file.name, self.inner.sequence.fetch_add(1, Ordering::Relaxed))
        });
        let task = UploadTask {
            id: id.clone(),
            file,
            position,
            uploader,
            constraints: constraints.unwrap_or_else(|| self.inner.config.constraints()),
            marker: Marker::new(),
        };

        let mut guard = self.lock();
        let state = &mut *guard;

        if !state.snapshots.is_empty()
            && state.snapshots.iter().all(|s| s.status == Status::Success)
        {
            tracing::debug!("[UploadQueue] Purging {} finished entries", state.snapshots.len());
            state.snapshots.clear();
        }

        if self.discard_locked(state, &id) {
            tracing::debug!("[UploadQueue] Replacing existing task {}", id);
        }

        state
            .snapshots
            .push(StatusSnapshot::new(id.clone(), &task.file.name, task.file.size()));

        let preview = self.inner.resources.create(&task.file);
        let admission = self
            .inner
            .document
            .insert_placeholder(&task.position, &task.marker, preview.url())
            .map_err(UploadError::from)
            .and_then(|()| self.admit(&task));

        let mut tracked = TrackedTask {
            task,
            preview: Some(preview),
            run: None,
        };

        match admission {
            Ok(()) => {
                tracing::debug!("[UploadQueue] {} queued", id);
                state.tasks.insert(id.clone(), tracked);
                state.pending.push_back(id.clone());
                self.dispatch_locked(state);
            }
            Err(error) => {
                tracing::warn!("[UploadQueue] {} rejected: {}", id, error);
                self.inner.document.update_by_marker(
                    &tracked.task.marker,
                    PlaceholderState::Failed {
                        error: error.to_string(),
                    },
                );
                tracked.release_preview();
                state.fail(&id, &error);
                state.tasks.insert(id.clone(), tracked);
            }
        }

        self.commit(guard);
        id
    }

    /// Drop a task (running, pending, failed or finished). Idempotent.
    ///
    /// A running task is cancelled; the next pending task starts once the
    /// cancelled run has actually returned.
    pub fn remove(&self, id: &TaskId) {
        let mut guard = self.lock();
        let state = &mut *guard;
        if !self.discard_locked(state, id) {
            return;
        }
        tracing::debug!("[UploadQueue] {} removed", id);
        self.dispatch_locked(state);
        self.commit(guard);
    }

    /// Re-run a failed task with its original file, position and marker
    pub fn retry(&self, id: &TaskId) -> Result<(), QueueError> {
        let mut guard = self.lock();
        let state = &mut *guard;

        let failed = state.snapshot(id).map(|s| s.status) == Some(Status::Failed);
        let tracked = state
            .tasks
            .get_mut(id)
            .ok_or_else(|| QueueError::NotFound(id.clone()))?;
        if !failed || tracked.run.is_some() {
            return Err(QueueError::NotRetryable(id.clone()));
        }

        let preview = self.inner.resources.create(&tracked.task.file);
        let document = &self.inner.document;
        let marker = &tracked.task.marker;
        let restored = if document.update_by_marker(
            marker,
            PlaceholderState::Loading {
                preview: preview.url().to_string(),
            },
        ) {
            Ok(())
        } else {
            // User deleted the node; put it back where it was requested
            document
                .insert_placeholder(&tracked.task.position, marker, preview.url())
                .map_err(UploadError::from)
        };
        tracked.release_preview();
        tracked.preview = Some(preview);

        let admission = restored.and_then(|()| self.admit(&tracked.task));
        match admission {
            Ok(()) => {
                tracing::debug!("[UploadQueue] {} retrying", id);
                if let Some(snapshot) = state.snapshot_mut(id) {
                    snapshot.compressed_size = None;
                }
                state.set_status(id, Status::Queued);
                state.pending.push_back(id.clone());
                self.dispatch_locked(state);
            }
            Err(error) => {
                tracing::warn!("[UploadQueue] {} retry rejected: {}", id, error);
                if let Some(tracked) = state.tasks.get_mut(id) {
                    self.inner.document.update_by_marker(
                        &tracked.task.marker,
                        PlaceholderState::Failed {
                            error: error.to_string(),
                        },
                    );
                    tracked.release_preview();
                }
                state.fail(id, &error);
            }
        }

        self.commit(guard);
        Ok(())
    }

    /// Cancel everything and remove every placeholder the queue still owns
    pub fn clear(&self) {
        let mut guard = self.lock();
        let state = &mut *guard;

        let count = state.tasks.len();
        for (_, mut tracked) in state.tasks.drain() {
            if let Some(run) = tracked.run.take() {
                run.cancel.cancel();
            }
            self.inner.document.remove_by_marker(&tracked.task.marker);
            tracked.release_preview();
        }
        state.pending.clear();
        state.snapshots.clear();

        tracing::debug!("[UploadQueue] Cleared {} tasks", count);
        self.commit(guard);
    }

    /// Remove every trace of `id`. Returns whether anything was tracked.
    fn discard_locked(&self, state: &mut QueueState, id: &TaskId) -> bool {
        state.pending.retain(|pending| pending != id);
        let had_snapshot = state.snapshot(id).is_some();
        state.snapshots.retain(|s| &s.id != id);

        let Some(mut tracked) = state.tasks.remove(id) else {
            return had_snapshot;
        };
        if let Some(run) = tracked.run.take() {
            // The slot stays taken until the run's future reaches `finish`
            run.cancel.cancel();
        }
        self.inner.document.remove_by_marker(&tracked.task.marker);
        tracked.release_preview();
        true
    }

    /// Start pending tasks while slots are free
    fn dispatch_locked(&self, state: &mut QueueState) {
        let capacity = self.inner.config.max_concurrent.max(1);

        while state.running.len() < capacity {
            let Some(id) = state.pending.pop_front() else {
                break;
            };
            let generation = state.next_generation;
            let Some(tracked) = state.tasks.get_mut(&id) else {
                continue;
            };
            state.next_generation += 1;

            let token = CancellationToken::new();
            tracked.run = Some(RunHandle {
                generation,
                cancel: token.clone(),
            });
            let task = tracked.task.clone();

            state.running.insert(generation, id.clone());
            state.set_status(&id, Status::Compressing);
            tracing::debug!("[UploadQueue] {} compressing (generation {})", id, generation);

            let queue = self.clone();
            self.inner.runtime.spawn(async move {
                let result = queue.process(&task, generation, &token).await;
                queue.finish(&task, generation, result);
            });
        }
    }

    /// Move a running task to its next phase, if it is still the live run
    fn advance(&self, id: &TaskId, generation: u64, status: Status, compressed_size: Option<u64>) {
        let mut guard = self.lock();
        if !guard.is_current(id, generation) {
            return;
        }
        guard.set_status(id, status);
        if let Some(snapshot) = guard.snapshot_mut(id) {
            if compressed_size.is_some() {
                snapshot.compressed_size = compressed_size;
            }
        }
        tracing::debug!("[UploadQueue] {} {}", id, status);
        self.commit(guard);
    }

    async fn process(
        &self,
        task: &UploadTask,
        generation: u64,
        token: &CancellationToken,
    ) -> UploadResult<String> {
        checkpoint(token)?;
        let constraints = &task.constraints;
        let processed = self
            .inner
            .preprocessor
            .resize(task.file.clone(), constraints.max_size, constraints.force_reduce, token)
            .await?;

        checkpoint(token)?;
        let compressed = (processed.bytes != task.file.bytes).then(|| processed.size());
        self.advance(&task.id, generation, Status::Uploading, compressed);
        let reference = task.uploader.upload(processed, token.clone()).await?;

        checkpoint(token)?;
        self.advance(&task.id, generation, Status::Validating, None);
        validate_reference(
            self.inner.probe.as_ref(),
            &reference,
            self.inner.config.validation_timeout(),
        )
        .await?;

        checkpoint(token)?;
        Ok(reference)
    }

    fn finish(&self, task: &UploadTask, generation: u64, result: UploadResult<String>) {
        let id = &task.id;
        let mut guard = self.lock();
        let state = &mut *guard;

        state.running.remove(&generation);

        if !state.is_current(id, generation) {
            // Removed, cleared or replaced while in flight: only the slot is given back
            tracing::debug!("[UploadQueue] Ignoring stale completion of {} (generation {})", id, generation);
            self.dispatch_locked(state);
            self.commit(guard);
            return;
        }

        match result {
            Ok(reference) => {
                if let Some(mut tracked) = state.tasks.remove(id) {
                    let found = self.inner.document.update_by_marker(
                        &tracked.task.marker,
                        PlaceholderState::Ready {
                            src: reference.clone(),
                        },
                    );
                    if !found {
                        tracing::warn!("[UploadQueue] Placeholder for {} is gone; nothing to update", id);
                    }
                    tracked.release_preview();
                }
                state.set_status(id, Status::Success);
                tracing::info!("[UploadQueue] {} uploaded -> {}", id, reference);
            }
            Err(UploadError::Cancelled) => {
                self.discard_locked(state, id);
                tracing::debug!("[UploadQueue] {} cancelled by uploader", id);
            }
            Err(error) => {
                if let Some(tracked) = state.tasks.get_mut(id) {
                    tracked.run = None;
                    let found = self.inner.document.update_by_marker(
                        &tracked.task.marker,
                        PlaceholderState::Failed {
                            error: error.to_string(),
                        },
                    );
                    if !found {
                        tracing::warn!("[UploadQueue] Placeholder for {} is gone", id);
                    }
                    tracked.release_preview();
                }
                state.fail(id, &error);
                tracing::warn!("[UploadQueue] {} failed: {}", id, error);
            }
        }

        self.dispatch_locked(state);
        self.commit(guard);
    }

    pub fn snapshots(&self) -> Vec<StatusSnapshot> {
        self.lock().snapshots.clone()
    }

    pub fn snapshot(&self, id: &TaskId) -> Option<StatusSnapshot> {
        self.lock().snapshot(id).cloned()
    }

    /// Runs holding a concurrency slot, cancelled ones included until they return
    pub fn running_count(&self) -> usize {
        self.lock().running.len()
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.lock().is_idle()
    }

    /// Resolves once nothing is pending or running
    pub async fn wait_idle(&self) {
        let mut rx = self.inner.idle.subscribe();
        // The sender lives as long as the queue, so this can't fail
        let _ = rx.wait_for(|idle| *idle).await;
    }

    pub fn config(&self) -> &QueueConfig {
        &self.inner.config
    }

    pub fn document(&self) -> &Arc<dyn DocumentBinding> {
        &self.inner.document
    }

    /// Live preview resources (released ones excluded)
    pub fn live_previews(&self) -> usize {
        self.inner.resources.live_count()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&[StatusSnapshot]) + Send + Sync + 'static,
    {
        self.inner.broadcaster.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.broadcaster.unsubscribe(id)
    }

    pub fn subscribe_channel(&self) -> broadcast::Receiver<Arc<Vec<StatusSnapshot>>> {
        self.inner.broadcaster.subscribe_channel()
    }
}

impl std::fmt::Debug for UploadQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("UploadQueue")
            .field("pending", &state.pending.len())
            .field("running", &state.running.len())
            .field("snapshots", &state.snapshots.len())
            .finish()
    }
}

fn checkpoint(token: &CancellationToken) -> UploadResult<()> {
    if token.is_cancelled() {
        Err(UploadError::Cancelled)
    } else {
        Ok(())
    }
}
