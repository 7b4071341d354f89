//! Crawl dispatcher - the claim/dispatch/flush cycle loop
//!
//! This module owns the run lifecycle and the cycle-scoped accumulators.
//! Each cycle walks the same sequence:
//!
//! 1. Flush completions buffered by the previous cycle (`mark_crawled`)
//! 2. Claim up to `batch_size` uncrawled records, oldest first
//! 3. Re-read the configured concurrency, aborting the run if it is zero
//! 4. Partition the batch and run the worker pool to completion
//! 5. Merge the pool's discoveries and completions into the accumulators
//! 6. Flush discovered links (`insert_new`) and clear them
//!
//! Completions deliberately wait one cycle: step 1 runs before anything new
//! is claimed, so a record is never claimed twice within a run, and a stop
//! between cycles leaves the buffer in memory for the next start instead of
//! losing it. A store failure during any flush terminates the run with the
//! buffered data still intact.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::pool::{partition, run_pool};
use crate::storage::{LinkStore, StoreError};
use crate::LinkwellError;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;

/// How long the loop rests before re-claiming when the store had nothing
const EMPTY_BATCH_DELAY: Duration = Duration::from_millis(500);

/// Errors surfaced by dispatcher control operations
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Crawl is already running")]
    AlreadyRunning,

    #[error("Worker concurrency must be at least 1, got {0}")]
    InvalidConcurrency(usize),
}

/// Run state of the dispatch loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No cycle loop is running
    Idle,

    /// The cycle loop is claiming and crawling batches
    Running,

    /// A stop was requested; the in-flight cycle is finishing its flush
    StopRequested,
}

impl RunState {
    fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Running => 1,
            Self::StopRequested => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Running,
            2 => Self::StopRequested,
            _ => Self::Idle,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::StopRequested => "stop-requested",
        };
        write!(f, "{}", label)
    }
}

/// Read-only view of dispatcher progress, polled by the presentation layer
#[derive(Debug, Clone)]
pub struct CrawlSnapshot {
    /// Current run state
    pub state: RunState,

    /// Links discovered by the in-flight cycle, not yet flushed
    pub pending_discovered: usize,

    /// Links flushed to the store since the dispatcher was created
    pub total_discovered: u64,

    /// Total records in the store, crawled or not
    pub stored_links: u64,

    /// The condition that terminated the last run, cleared on the next start
    pub last_error: Option<String>,
}

/// Cycle-scoped result buffers
///
/// Each set is cleared when its own flush commits: discovered at step 6 of
/// the cycle that filled it, completed at step 1 of the following cycle.
#[derive(Debug, Default)]
struct Accumulators {
    discovered: HashSet<String>,
    completed: HashSet<i64>,
}

/// State shared between the control surface and the cycle loop task
struct Inner<S> {
    store: Mutex<S>,
    fetcher: PageFetcher,
    batch_size: usize,
    concurrency: AtomicUsize,
    state: AtomicU8,
    stop: Arc<AtomicBool>,
    accums: Mutex<Accumulators>,
    total_discovered: AtomicU64,
    last_error: Mutex<Option<String>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Crawl dispatcher driving the cycle loop over a link store
///
/// All control methods take `&self`; the dispatcher is shared between the
/// caller and its own loop task through an internal `Arc`.
pub struct CrawlDispatcher<S> {
    inner: Arc<Inner<S>>,
}

impl<S: LinkStore + Send + 'static> CrawlDispatcher<S> {
    /// Creates a dispatcher over the given store
    ///
    /// # Arguments
    ///
    /// * `store` - The link store backing claims and flushes
    /// * `fetcher` - The page fetcher shared by all workers
    /// * `batch_size` - Maximum records claimed per cycle
    pub fn new(store: S, fetcher: PageFetcher, batch_size: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: Mutex::new(store),
                fetcher,
                batch_size,
                concurrency: AtomicUsize::new(0),
                state: AtomicU8::new(RunState::Idle.as_u8()),
                stop: Arc::new(AtomicBool::new(false)),
                accums: Mutex::new(Accumulators::default()),
                total_discovered: AtomicU64::new(0),
                last_error: Mutex::new(None),
                task: Mutex::new(None),
            }),
        }
    }

    /// Starts the cycle loop on a dedicated task
    ///
    /// Fails with [`DispatchError::AlreadyRunning`] unless the dispatcher is
    /// idle. A zero concurrency is accepted here; the first cycle's
    /// configuration check rejects it, the same way a live reconfiguration
    /// to zero would be rejected.
    pub fn start(&self, concurrency: usize) -> Result<(), DispatchError> {
        if self
            .inner
            .state
            .compare_exchange(
                RunState::Idle.as_u8(),
                RunState::Running.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_err()
        {
            // A failed start changes nothing, not even the concurrency
            return Err(DispatchError::AlreadyRunning);
        }

        self.inner.concurrency.store(concurrency, Ordering::SeqCst);
        self.inner.stop.store(false, Ordering::SeqCst);
        *self.inner.last_error.lock().unwrap() = None;

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(cycle_loop(inner));
        *self.inner.task.lock().unwrap() = Some(handle);

        tracing::info!("Crawl started with concurrency {}", concurrency);
        Ok(())
    }

    /// Requests a stop
    ///
    /// The in-flight cycle finishes its fetches-in-progress and its flush
    /// before the dispatcher settles idle; workers abandon URLs they have
    /// not started. Calling this while idle does nothing.
    pub fn stop(&self) {
        let transitioned = self
            .inner
            .state
            .compare_exchange(
                RunState::Running.as_u8(),
                RunState::StopRequested.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();

        if transitioned {
            self.inner.stop.store(true, Ordering::SeqCst);
            tracing::info!("Stop requested, finishing in-flight cycle");
        }
    }

    /// Updates the worker concurrency; the next cycle picks it up
    pub fn set_concurrency(&self, concurrency: usize) {
        self.inner.concurrency.store(concurrency, Ordering::SeqCst);
        tracing::info!("Concurrency set to {}", concurrency);
    }

    /// Returns the current run state
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.inner.state.load(Ordering::SeqCst))
    }

    /// Builds the read-only progress view
    pub fn snapshot(&self) -> Result<CrawlSnapshot, StoreError> {
        let pending_discovered = self.inner.accums.lock().unwrap().discovered.len();
        let stored_links = self.inner.store.lock().unwrap().count()?;

        Ok(CrawlSnapshot {
            state: self.state(),
            pending_discovered,
            total_discovered: self.inner.total_discovered.load(Ordering::SeqCst),
            stored_links,
            last_error: self.inner.last_error.lock().unwrap().clone(),
        })
    }

    /// Inserts externally supplied links as uncrawled records
    ///
    /// Safe to call at any time; a running loop claims them in a later
    /// cycle.
    pub fn import_links(&self, urls: &HashSet<String>) -> Result<(), StoreError> {
        self.inner.store.lock().unwrap().insert_new(urls)
    }

    /// Waits for the cycle loop task to settle idle
    ///
    /// Returns immediately when no run was started. Without a prior
    /// [`stop`](Self::stop) or a run failure this waits indefinitely.
    pub async fn wait_until_idle(&self) {
        let handle = self.inner.task.lock().unwrap().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!("Dispatch task failed: {}", e);
            }
        }
    }
}

/// Outcome of a single cycle
enum CycleOutcome {
    Continue,
    EmptyBatch,
}

/// The dispatch loop body, run on its own task until stop or failure
async fn cycle_loop<S: LinkStore>(inner: Arc<Inner<S>>) {
    tracing::debug!("Dispatch loop running");

    loop {
        if stop_observed(&inner) {
            break;
        }

        match run_cycle(&inner).await {
            Ok(CycleOutcome::Continue) => {}
            Ok(CycleOutcome::EmptyBatch) => {
                tokio::time::sleep(EMPTY_BATCH_DELAY).await;
            }
            Err(e) => {
                tracing::error!("Crawl run terminated: {}", e);
                *inner.last_error.lock().unwrap() = Some(e.to_string());
                break;
            }
        }
    }

    settle_idle(&inner);
    tracing::info!("Dispatcher idle");
}

/// Runs one claim/dispatch/flush cycle
async fn run_cycle<S: LinkStore>(inner: &Inner<S>) -> Result<CycleOutcome, LinkwellError> {
    // Step 1: persist completions buffered by the previous cycle, before
    // anything new is claimed
    flush_completed(inner)?;

    // Step 2: claim a batch
    let batch = inner.store.lock().unwrap().claim_uncrawled(inner.batch_size)?;

    // Step 3: live configuration check
    let concurrency = inner.concurrency.load(Ordering::SeqCst);
    if concurrency == 0 {
        return Err(DispatchError::InvalidConcurrency(concurrency).into());
    }

    // Step 4: nothing claimable, go straight to the discovered flush
    if batch.is_empty() {
        flush_discovered(inner)?;
        return Ok(CycleOutcome::EmptyBatch);
    }

    let batch_len = batch.len();
    let chunks = partition(batch, concurrency);
    tracing::info!(
        "Crawling batch of {} links across {} workers",
        batch_len,
        chunks.len()
    );
    let outcome = run_pool(chunks, &inner.fetcher, Arc::clone(&inner.stop)).await;

    // Step 5: merge pool results into the accumulators
    {
        let mut accums = inner.accums.lock().unwrap();
        accums.discovered.extend(outcome.discovered);
        accums.completed.extend(outcome.completed);
    }

    // Step 6: flush the discovered links; completions wait for step 1 of
    // the next cycle
    flush_discovered(inner)?;

    Ok(CycleOutcome::Continue)
}

/// Marks every buffered completion as crawled, clearing the buffer only
/// after the store commits
fn flush_completed<S: LinkStore>(inner: &Inner<S>) -> Result<(), StoreError> {
    let completed = inner.accums.lock().unwrap().completed.clone();
    if completed.is_empty() {
        return Ok(());
    }

    inner.store.lock().unwrap().mark_crawled(&completed)?;
    inner.accums.lock().unwrap().completed.clear();

    tracing::debug!("Marked {} links crawled", completed.len());
    Ok(())
}

/// Inserts every buffered discovery, clearing the buffer only after the
/// store commits
fn flush_discovered<S: LinkStore>(inner: &Inner<S>) -> Result<(), StoreError> {
    let discovered = inner.accums.lock().unwrap().discovered.clone();
    if discovered.is_empty() {
        return Ok(());
    }

    inner.store.lock().unwrap().insert_new(&discovered)?;
    inner.accums.lock().unwrap().discovered.clear();
    inner
        .total_discovered
        .fetch_add(discovered.len() as u64, Ordering::SeqCst);

    tracing::info!("Stored {} discovered links", discovered.len());
    Ok(())
}

fn stop_observed<S>(inner: &Inner<S>) -> bool {
    RunState::from_u8(inner.state.load(Ordering::SeqCst)) == RunState::StopRequested
}

fn settle_idle<S>(inner: &Inner<S>) {
    inner.state.store(RunState::Idle.as_u8(), Ordering::SeqCst);
    inner.stop.store(false, Ordering::SeqCst);
}
