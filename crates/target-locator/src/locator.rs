//! Target discovery across time
//!
//! Three strategies run against one adapter:
//! 1. Immediate - a single scan at start
//! 2. Polling - one scan per interval until found or the attempt budget is spent
//! 3. Observation - one scan per batch of child-list mutations, for the page's lifetime
//!
//! Every hit goes through the [`InjectionGuard`], which makes the order in
//! which the strategies win irrelevant.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use omnitime_core_types::DebugLog;
use page_dom::{MutationRecord, NodeId, Page};
use site_adapter::SiteAdapter;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::errors::LocatorError;
use crate::guard::{InjectOutcome, InjectionGuard};

/// Poll period used by the content script.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Poll attempts before giving up on the timer.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 15;

/// Discovery state
///
/// `Searching` while the poll timer runs, `Found` once a target has been
/// handed to the guard, `Idle` when the poll budget ran out first. Only
/// observation is active in `Idle`; it can still move the state to `Found`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorState {
    Searching,
    Found,
    Idle,
}

/// Polling configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// How the poll timer ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Immediate scan hit; the timer never started
    FoundImmediately,

    /// A tick found the target
    Found { attempts: u32 },

    /// Budget spent without a hit
    Exhausted { attempts: u32 },
}

/// Drives discovery for one page and one adapter.
pub struct TargetLocator {
    page: Page,
    adapter: Arc<dyn SiteAdapter>,
    guard: InjectionGuard,
    policy: PollPolicy,
    log: DebugLog,
    state: watch::Sender<LocatorState>,
    poll_attempts: AtomicU32,
}

impl TargetLocator {
    pub fn new(
        page: Page,
        adapter: Arc<dyn SiteAdapter>,
        guard: InjectionGuard,
        log: DebugLog,
    ) -> Self {
        let (state, _) = watch::channel(LocatorState::Searching);
        Self {
            page,
            adapter,
            guard,
            policy: PollPolicy::default(),
            log,
            state,
            poll_attempts: AtomicU32::new(0),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    pub fn state(&self) -> LocatorState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<LocatorState> {
        self.state.subscribe()
    }

    /// Poll ticks run so far.
    pub fn poll_attempts(&self) -> u32 {
        self.poll_attempts.load(Ordering::SeqCst)
    }

    /// Scan once and hand any hit to the guard.
    ///
    /// Returns the target whether or not it was already injected.
    pub fn scan(&self) -> Option<NodeId> {
        let target = self.adapter.scan_for_target(&self.page)?;

        match self.guard.inject(&self.page, target) {
            Ok(InjectOutcome::Injected { trigger }) => {
                self.log
                    .info(format_args!("Click handler attached to {trigger}"));
            }
            Ok(InjectOutcome::AlreadyInjected) => {}
            Err(err) => {
                self.log
                    .warn(format_args!("Injection into {target} failed: {err}"));
            }
        }

        self.state.send_if_modified(|state| {
            if *state == LocatorState::Found {
                return false;
            }
            *state = LocatorState::Found;
            true
        });
        Some(target)
    }

    /// Run the immediate check and start polling and observation.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(self: &Arc<Self>) -> LocatorHandle {
        // Subscribe first so nothing between the immediate scan and the
        // observer task is missed.
        let mutations = self.page.document().subscribe();

        let found_now = self.scan().is_some();
        if !found_now {
            self.log
                .info("Target not found immediately. Starting Polling & Observer.");
        }

        let poll = if found_now {
            None
        } else {
            let locator = Arc::clone(self);
            Some(tokio::spawn(async move { locator.poll().await }))
        };

        let locator = Arc::clone(self);
        let observer = tokio::spawn(async move { locator.observe(mutations).await });

        LocatorHandle {
            locator: Arc::clone(self),
            poll,
            outcome: found_now.then_some(PollOutcome::FoundImmediately),
            observer,
        }
    }

    async fn poll(self: Arc<Self>) -> PollOutcome {
        if self.policy.max_attempts == 0 {
            self.mark_idle();
            return PollOutcome::Exhausted { attempts: 0 };
        }

        let period = self.policy.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let attempts = self.poll_attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if self.scan().is_some() {
                return PollOutcome::Found { attempts };
            }
            if attempts >= self.policy.max_attempts {
                self.log.info("Polling timed out. Target not found.");
                self.mark_idle();
                return PollOutcome::Exhausted { attempts };
            }
        }
    }

    async fn observe(self: Arc<Self>, mut mutations: broadcast::Receiver<MutationRecord>) {
        loop {
            match mutations.recv().await {
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    self.log
                        .info(format_args!("Missed {skipped} mutation records, rescanning"));
                }
                Err(RecvError::Closed) => break,
            }
            // Fold everything already queued into this batch.
            loop {
                match mutations.try_recv() {
                    Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                    Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                }
            }
            self.scan();
        }
    }

    fn mark_idle(&self) {
        self.state.send_if_modified(|state| {
            if *state != LocatorState::Searching {
                return false;
            }
            *state = LocatorState::Idle;
            true
        });
    }
}

/// Running discovery for one page.
///
/// Dropping the handle does not stop observation; it lives as long as the
/// page's document.
pub struct LocatorHandle {
    locator: Arc<TargetLocator>,
    poll: Option<JoinHandle<PollOutcome>>,
    outcome: Option<PollOutcome>,
    observer: JoinHandle<()>,
}

impl LocatorHandle {
    pub fn locator(&self) -> &Arc<TargetLocator> {
        &self.locator
    }

    pub fn state(&self) -> LocatorState {
        self.locator.state()
    }

    pub fn is_observing(&self) -> bool {
        !self.observer.is_finished()
    }

    /// Wait for the poll timer to stop.
    pub async fn poll_finished(&mut self) -> Result<PollOutcome, LocatorError> {
        if let Some(outcome) = self.outcome {
            return Ok(outcome);
        }
        let Some(task) = self.poll.take() else {
            return Err(LocatorError::Task("poll task missing".to_string()));
        };
        let outcome = task
            .await
            .map_err(|err| LocatorError::Task(err.to_string()))?;
        self.outcome = Some(outcome);
        Ok(outcome)
    }
}
