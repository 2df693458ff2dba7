use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::debug;

/// How an in-flight refresh ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefreshResolution {
    Refreshed(String),
    Failed,
}

enum State {
    Idle,
    Refreshing(watch::Receiver<Option<RefreshResolution>>),
}

struct Inner {
    state: State,
    latest: Option<String>,
    cycles: u64,
}

/// Single-flight coordination of credential refreshes.
///
/// All state changes happen under a short synchronous lock that is never held
/// across an await, so "is a refresh in flight" is decided before the caller
/// suspends. Clones share the same state; create one per session.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Mutex<Inner>>,
}

/// Result of [`RefreshCoordinator::acquire`].
pub enum Acquired {
    /// No refresh was running; the holder must perform the exchange and resolve the lease.
    Leader {
        lease: RefreshLease,
        ticket: RefreshTicket,
    },
    /// A refresh is already running; await the ticket.
    Follower(RefreshTicket),
    /// The rejected credential was already replaced by a completed refresh.
    Superseded(String),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: State::Idle,
                latest: None,
                cycles: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Decides, without suspending, how a caller whose `rejected` credential got a 401 proceeds.
    pub fn acquire(&self, rejected: &str) -> Acquired {
        let mut inner = self.lock();
        if let State::Refreshing(rx) = &inner.state {
            return Acquired::Follower(RefreshTicket { rx: rx.clone() });
        }
        if let Some(latest) = inner.latest.as_ref()
            && latest != rejected
        {
            return Acquired::Superseded(latest.clone());
        }
        let (tx, rx) = watch::channel(None);
        inner.state = State::Refreshing(rx.clone());
        inner.cycles += 1;
        debug!(cycle = inner.cycles, "refresh.cycle.open");
        Acquired::Leader {
            lease: RefreshLease {
                tx: Some(tx),
                coordinator: self.clone(),
            },
            ticket: RefreshTicket { rx },
        }
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self.lock().state, State::Refreshing(_))
    }

    /// Number of refresh cycles opened so far.
    pub fn cycles(&self) -> u64 {
        self.lock().cycles
    }

    /// The credential issued by the most recent successful refresh.
    pub fn latest_credential(&self) -> Option<String> {
        self.lock().latest.clone()
    }

    /// Forgets the last issued credential, e.g. on logout.
    pub fn reset(&self) {
        self.lock().latest = None;
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive right to resolve the current refresh cycle.
///
/// Dropping an unresolved lease resolves the cycle as failed.
pub struct RefreshLease {
    tx: Option<watch::Sender<Option<RefreshResolution>>>,
    coordinator: RefreshCoordinator,
}

impl RefreshLease {
    pub fn resolve(mut self, resolution: RefreshResolution) {
        self.finish(resolution);
    }

    fn finish(&mut self, resolution: RefreshResolution) {
        let Some(tx) = self.tx.take() else {
            return;
        };
        {
            let mut inner = self.coordinator.lock();
            inner.state = State::Idle;
            inner.latest = match &resolution {
                RefreshResolution::Refreshed(token) => Some(token.clone()),
                RefreshResolution::Failed => None,
            };
        }
        tx.send_replace(Some(resolution));
    }
}

impl Drop for RefreshLease {
    fn drop(&mut self) {
        self.finish(RefreshResolution::Failed);
    }
}

/// Awaitable handle on one refresh cycle. Every clone observes the same resolution.
#[derive(Clone)]
pub struct RefreshTicket {
    rx: watch::Receiver<Option<RefreshResolution>>,
}

impl RefreshTicket {
    pub async fn wait(mut self) -> RefreshResolution {
        let resolution = match self.rx.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };
        resolution.unwrap_or(RefreshResolution::Failed)
    }
}
