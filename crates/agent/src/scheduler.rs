//! Periodic task scheduling with session scoping.
//!
//! Every repeating activity in the agent runs as a task spawned through
//! [`Scheduler::spawn_periodic`]. Session-bound tasks get a child token
//! from a [`SessionScope`]; closing the scope bumps the session
//! generation and cancels the token in one step, so work that was
//! already in flight can check [`Scheduler::is_current`] before it
//! publishes anything.
//!
//! A tick body always runs to completion before the next tick is
//! considered. Ticks that fall due while a body is still running are
//! skipped rather than queued.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Monotonic session counter.
pub type Generation = u64;

/// How long [`Scheduler::shutdown`] waits for tasks to wind down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Handle on one monitoring session's lifetime.
#[derive(Debug, Clone)]
pub struct SessionScope {
    generation: Generation,
    cancel: CancellationToken,
}

impl SessionScope {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Token cancelled when the scope is closed or the scheduler shuts down.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Owns the root cancellation token, the session generation and every
/// task spawned on behalf of the agent.
#[derive(Debug)]
pub struct Scheduler {
    root: CancellationToken,
    generation: AtomicU64,
    tracker: TaskTracker,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            root: CancellationToken::new(),
            generation: AtomicU64::new(0),
            tracker: TaskTracker::new(),
        }
    }

    /// Token for tasks that live as long as the agent itself.
    pub fn global_token(&self) -> CancellationToken {
        self.root.child_token()
    }

    pub fn current_generation(&self) -> Generation {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current_generation() == generation
    }

    /// Start a new session, invalidating any earlier generation.
    pub fn open_session(&self) -> SessionScope {
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(generation, "Session scope opened");
        SessionScope {
            generation,
            cancel: self.root.child_token(),
        }
    }

    /// End a session: results tagged with its generation are stale from
    /// here on, and its tasks stop at their next cancellation check.
    pub fn close_session(&self, scope: &SessionScope) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        scope.cancel.cancel();
        tracing::debug!(generation = scope.generation, "Session scope closed");
    }

    /// Run `tick` every `period` until `cancel` fires. The first tick is
    /// immediate.
    pub fn spawn_periodic<F, Fut>(
        &self,
        name: &'static str,
        period: Duration,
        cancel: CancellationToken,
        mut tick: F,
    ) -> JoinHandle<()>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        self.tracker.spawn(async move {
            tracing::debug!(
                task = name,
                period_ms = period.as_millis() as u64,
                "Periodic task started"
            );

            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = interval.tick() => {}
                }
                tick().await;
            }

            tracing::debug!(task = name, "Periodic task stopped");
        })
    }

    /// Spawn a one-off task that shutdown will wait for.
    pub fn spawn<Fut>(&self, name: &'static str, task: Fut) -> JoinHandle<()>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        tracing::trace!(task = name, "Spawning task");
        self.tracker.spawn(task)
    }

    /// Number of tasks still running.
    pub fn running_tasks(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Cancel everything and wait (bounded) for tasks to finish.
    pub async fn shutdown(&self) {
        self.root.cancel();
        self.tracker.close();
        if tokio::time::timeout(SHUTDOWN_GRACE, self.tracker.wait())
            .await
            .is_err()
        {
            tracing::warn!(
                remaining = self.tracker.len(),
                "Tasks still running after shutdown grace period"
            );
        }
    }
}
