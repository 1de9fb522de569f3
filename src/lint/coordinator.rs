//! Per-root request coordination
//!
//! Each project root has its own state entry: `Idle` when no run is active,
//! `Running` while a lint process owns the root. A request arriving while a
//! run is active becomes the single pending request for that root, and the
//! active process is cancelled. Results are published only when the run's
//! sequence number is still the latest for the root.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tower_lsp::lsp_types::Diagnostic;
use tracing::{debug, info, warn};

use crate::lint::error::{InvocationError, LintError};
use crate::lint::invoker::{CancelHandle, LintOutput, LintRun, Linter};
use crate::lint::root::ProjectRoot;
use crate::lint::translate::Translator;

/// Receives the final diagnostic sets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiagnosticPublisher: Send + Sync + 'static {
    /// Publishes the complete set for one file. An empty set means "no issues".
    async fn publish(&self, file: PathBuf, diagnostics: Vec<Diagnostic>);

    /// Signals that linting failed for the given files.
    async fn publish_error(&self, files: Vec<PathBuf>, message: String);
}

#[async_trait]
impl<T: DiagnosticPublisher + ?Sized> DiagnosticPublisher for Arc<T> {
    async fn publish(&self, file: PathBuf, diagnostics: Vec<Diagnostic>) {
        (**self).publish(file, diagnostics).await
    }

    async fn publish_error(&self, files: Vec<PathBuf>, message: String) {
        (**self).publish_error(files, message).await
    }
}

/// How a request ended from the requester's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Published,
    Failed,
    /// A newer request for the same root took over; its run covers this
    /// request's files.
    Superseded,
}

/// Resolves when the run owning a request completes or is superseded.
#[derive(Debug)]
pub struct LintTicket(oneshot::Receiver<RunOutcome>);

impl LintTicket {
    pub async fn wait(self) -> RunOutcome {
        self.0.await.unwrap_or(RunOutcome::Failed)
    }
}

struct InvocationRequest {
    seq: u64,
    files: Vec<PathBuf>,
    waiters: Vec<oneshot::Sender<RunOutcome>>,
}

impl InvocationRequest {
    fn absorb_files(&mut self, files: &[PathBuf]) {
        for file in files {
            if !self.files.contains(file) {
                self.files.push(file.clone());
            }
        }
    }

    fn notify(self, outcome: RunOutcome) {
        for waiter in self.waiters {
            let _ = waiter.send(outcome);
        }
    }
}

struct Running {
    seq: u64,
    files: Vec<PathBuf>,
    cancel: Option<CancelHandle>,
}

#[derive(Default)]
struct RootState {
    latest_seq: u64,
    running: Option<Running>,
    pending: Option<InvocationRequest>,
}

type RootSlot = Arc<Mutex<RootState>>;

/// Records `request` as the latest for the root. Returns it when the root
/// was idle and a run must be started.
fn admit(
    state: &mut RootState,
    root: &ProjectRoot,
    mut request: InvocationRequest,
) -> Option<InvocationRequest> {
    state.latest_seq = request.seq;

    match state.running.as_ref() {
        Some(running) => {
            debug!(
                "Run #{} active for {}, queueing request #{}",
                running.seq, root, request.seq
            );
            request.absorb_files(&running.files);
            if let Some(previous) = state.pending.take() {
                request.absorb_files(&previous.files);
                previous.notify(RunOutcome::Superseded);
            }
            if let Some(cancel) = &running.cancel {
                cancel.cancel();
            }
            state.pending = Some(request);
            None
        }
        None => {
            state.running = Some(Running {
                seq: request.seq,
                files: request.files.clone(),
                cancel: None,
            });
            Some(request)
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner<L, P> {
    linter: L,
    publisher: P,
    translator: Translator,
    roots: Mutex<HashMap<ProjectRoot, RootSlot>>,
    next_seq: AtomicU64,
}

pub struct RequestCoordinator<L, P> {
    inner: Arc<Inner<L, P>>,
}

impl<L, P> Clone for RequestCoordinator<L, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L: Linter, P: DiagnosticPublisher> RequestCoordinator<L, P> {
    pub fn new(linter: L, publisher: P, translator: Translator) -> Self {
        Self {
            inner: Arc::new(Inner {
                linter,
                publisher,
                translator,
                roots: Mutex::new(HashMap::new()),
                next_seq: AtomicU64::new(0),
            }),
        }
    }

    /// Requests analysis of `files` under `root`.
    ///
    /// Starts a run immediately when the root is idle. Otherwise the request
    /// becomes the root's pending request, absorbing the files of the
    /// request it supersedes, and the active run is cancelled.
    pub fn submit(&self, root: ProjectRoot, files: Vec<PathBuf>) -> LintTicket {
        let seq = self.inner.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = oneshot::channel();
        let mut request = InvocationRequest {
            seq,
            files: Vec::new(),
            waiters: vec![tx],
        };
        request.absorb_files(&files);

        // The map lock is held while admitting so that an idle slot cannot be
        // released by `drive` between lookup and admission.
        let (slot, start) = {
            let mut roots = lock(&self.inner.roots);
            let slot = Arc::clone(roots.entry(root.clone()).or_default());
            let start = admit(&mut lock(&slot), &root, request);
            (slot, start)
        };

        if let Some(request) = start {
            tokio::spawn(Arc::clone(&self.inner).drive(root, slot, request));
        }

        LintTicket(rx)
    }
}

impl<L: Linter, P: DiagnosticPublisher> Inner<L, P> {
    fn is_current(slot: &RootSlot, seq: u64) -> bool {
        lock(slot).latest_seq == seq
    }

    /// Runs requests for one root back to back until none is pending.
    async fn drive(self: Arc<Self>, root: ProjectRoot, slot: RootSlot, mut request: InvocationRequest) {
        loop {
            let result = self.run(&root, &slot, request.seq).await;

            let outcome = self
                .publish(&root, &slot, request.seq, &request.files, result)
                .await;
            request.notify(outcome);

            let next = {
                let mut roots = lock(&self.roots);
                let mut state = lock(&slot);
                let next = state.pending.take();
                state.running = next.as_ref().map(|next| Running {
                    seq: next.seq,
                    files: next.files.clone(),
                    cancel: None,
                });
                if next.is_none() {
                    roots.remove(&root);
                }
                next
            };

            match next {
                Some(next) => request = next,
                None => break,
            }
        }
    }

    async fn run(
        &self,
        root: &ProjectRoot,
        slot: &RootSlot,
        seq: u64,
    ) -> Result<LintOutput, InvocationError> {
        let LintRun { cancel, output } = self.linter.start(root)?;
        info!("Started lint run #{} for {}", seq, root);

        {
            let mut guard = lock(slot);
            let state = &mut *guard;
            // Superseded between admission and process start.
            if state.latest_seq != seq {
                cancel.cancel();
            }
            if let Some(running) = state.running.as_mut() {
                running.cancel = Some(cancel);
            }
        }

        output.await
    }

    /// Publishes the run's result while its sequence number is still the
    /// latest for the root, checking again before every file.
    async fn publish(
        &self,
        root: &ProjectRoot,
        slot: &RootSlot,
        seq: u64,
        files: &[PathBuf],
        result: Result<LintOutput, InvocationError>,
    ) -> RunOutcome {
        if !Self::is_current(slot, seq) {
            debug!("Discarding result of superseded run #{} for {}", seq, root);
            return RunOutcome::Superseded;
        }

        let sets = result.map_err(LintError::from).and_then(|output| {
            self.translator
                .translate(root, &output.stdout, files)
                .map_err(LintError::from)
        });

        match sets {
            Ok(sets) => {
                for (file, diagnostics) in sets {
                    if !Self::is_current(slot, seq) {
                        debug!("Run #{} for {} superseded while publishing", seq, root);
                        return RunOutcome::Superseded;
                    }
                    debug!("Publishing {} diagnostics for {:?}", diagnostics.len(), file);
                    self.publisher.publish(file, diagnostics).await;
                }
                RunOutcome::Published
            }
            Err(LintError::Invocation(InvocationError::Cancelled)) => RunOutcome::Superseded,
            Err(e) => {
                warn!("Lint failed for {}: {}", root, e);
                self.publisher
                    .publish_error(files.to_vec(), e.to_string())
                    .await;
                RunOutcome::Failed
            }
        }
    }
}
