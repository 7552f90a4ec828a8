//! GhostCurator: the periodic background reflector.
//!
//! Every `interval` the curator samples one entry uniformly at random, looks up
//! the entries that resonate with it and appends a [`Reflection`]. Ticks are
//! isolated from each other: a failing, panicking or hung tick is logged and
//! the schedule carries on. Only one tick runs at a time; a tick that overruns
//! its period delays the next one instead of stacking.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::similarity::SearchParams;
use super::types::Reflection;
use super::Archive;
use crate::config::CuratorConfig;
use crate::error::Result;

/// How long `stop()` waits for the loop before aborting it.
const STOP_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CuratorError {
    #[error("curator already running, call stop() first")]
    AlreadyRunning,

    #[error("curator not running, call start() first")]
    NotRunning,
}

/// Where the curator is within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CuratorState {
    Idle = 0,
    Sampling = 1,
    Searching = 2,
    Persisting = 3,
}

impl CuratorState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Sampling,
            2 => Self::Searching,
            3 => Self::Persisting,
            _ => Self::Idle,
        }
    }
}

/// Everything one tick needs, cheap to clone into a spawned task.
#[derive(Clone)]
struct TickContext {
    archive: Arc<Archive>,
    config: CuratorConfig,
    rng: Arc<Mutex<StdRng>>,
    state: Arc<AtomicU8>,
}

/// Resets the state to idle however the tick ends.
struct IdleOnDrop(Arc<AtomicU8>);

impl Drop for IdleOnDrop {
    fn drop(&mut self) {
        self.0.store(CuratorState::Idle as u8, Ordering::SeqCst);
    }
}

impl TickContext {
    fn enter(&self, state: CuratorState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    async fn run(self) -> Result<Option<Reflection>> {
        let _idle = IdleOnDrop(Arc::clone(&self.state));

        self.enter(CuratorState::Sampling);
        let Some(original) = self.archive.sample_entry(Arc::clone(&self.rng)).await? else {
            return Ok(None);
        };

        self.enter(CuratorState::Searching);
        let query = if self.config.reembed {
            self.archive.embed(&original.content).await?
        } else {
            original.embedding.clone()
        };
        let params = SearchParams::new(self.config.related_threshold, self.config.related_limit)
            .excluding([original.id]);
        let related = self.archive.rank(query, params).await?;

        self.enter(CuratorState::Persisting);
        let reflection = self
            .archive
            .append_reflection(Reflection::new(original, related))
            .await?;
        Ok(Some(reflection))
    }
}

pub struct GhostCurator {
    context: TickContext,
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    ticks: Arc<AtomicU64>,
}

impl GhostCurator {
    /// Create a stopped curator. Sampling is seeded from `config.seed` when set.
    pub fn new(archive: Arc<Archive>, config: CuratorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            context: TickContext {
                archive,
                config,
                rng: Arc::new(Mutex::new(rng)),
                state: Arc::new(AtomicU8::new(CuratorState::Idle as u8)),
            },
            shutdown: Arc::new(Notify::new()),
            task: None,
            running: Arc::new(AtomicBool::new(false)),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Spawn the schedule. The first tick fires one full interval from now.
    pub fn start(&mut self) -> std::result::Result<(), CuratorError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(CuratorError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);
        self.shutdown = Arc::new(Notify::new());

        let context = self.context.clone();
        let shutdown = Arc::clone(&self.shutdown);
        let ticks = Arc::clone(&self.ticks);
        self.task = Some(tokio::spawn(curator_loop(context, shutdown, ticks)));

        tracing::info!(
            interval_secs = self.context.config.interval().as_secs(),
            "ghost curator started"
        );
        Ok(())
    }

    /// Signal the loop and wait for it. An in-flight tick is allowed to
    /// finish; past the grace period the task is aborted.
    pub async fn stop(&mut self) -> std::result::Result<(), CuratorError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(CuratorError::NotRunning);
        }
        self.shutdown.notify_one();

        if let Some(mut handle) = self.task.take() {
            match tokio::time::timeout(STOP_GRACE, &mut handle).await {
                Ok(Ok(())) => tracing::info!("ghost curator stopped"),
                Ok(Err(e)) => tracing::error!(error = %e, "ghost curator task failed"),
                Err(_) => {
                    tracing::warn!(grace = ?STOP_GRACE, "ghost curator did not stop in time, aborting");
                    handle.abort();
                }
            }
        }
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> CuratorState {
        CuratorState::from_u8(self.context.state.load(Ordering::SeqCst))
    }

    /// Number of scheduled ticks that have finished, successfully or not.
    pub fn ticks_completed(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Run one reflection now, outside the schedule. Errors are returned
    /// rather than swallowed. `Ok(None)` means the archive is empty.
    pub async fn tick(&self) -> Result<Option<Reflection>> {
        self.context.clone().run().await
    }
}

async fn curator_loop(context: TickContext, shutdown: Arc<Notify>, ticks: Arc<AtomicU64>) {
    let period = context.config.interval();
    let tick_timeout = context.config.tick_timeout();
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = shutdown.notified() => {
                tracing::debug!("ghost curator received shutdown signal");
                break;
            }

            _ = interval.tick() => {
                run_scheduled_tick(&context, tick_timeout).await;
                ticks.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

/// One isolated tick: its own task, its own deadline, every outcome logged.
async fn run_scheduled_tick(context: &TickContext, tick_timeout: Duration) {
    let mut handle = tokio::spawn(context.clone().run());

    match tokio::time::timeout(tick_timeout, &mut handle).await {
        Ok(Ok(Ok(Some(reflection)))) => tracing::info!(
            reflection = reflection.id,
            original = reflection.original.id,
            related = reflection.related.len(),
            "ghost reflection recorded"
        ),
        Ok(Ok(Ok(None))) => tracing::debug!("archive empty, nothing to reflect on"),
        Ok(Ok(Err(e))) => tracing::error!(error = %e, "ghost curator tick failed"),
        Ok(Err(e)) => tracing::error!(error = %e, "ghost curator tick panicked"),
        Err(_) => {
            handle.abort();
            context
                .state
                .store(CuratorState::Idle as u8, Ordering::SeqCst);
            tracing::warn!(timeout = ?tick_timeout, "ghost curator tick timed out");
        }
    }
}
