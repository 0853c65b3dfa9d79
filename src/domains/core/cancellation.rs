// src/domains/core/cancellation.rs
//
// Explicit cancellation capabilities passed into every asynchronous operation.
// A token is cancelled when its own flag flips or when any ancestor's does, so a
// view-scoped token can be combined with the per-request token the store issues.

use std::sync::{Arc, Mutex};
use futures::future::select_all;
use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct CancellationToken {
    own: Arc<watch::Sender<bool>>,
    ancestors: Vec<Arc<watch::Sender<bool>>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            own: Arc::new(tx),
            ancestors: Vec::new(),
        }
    }

    /// New token cancelled by either `self` or its own `cancel()`.
    /// Cancelling the child never affects the parent.
    pub fn child_token(&self) -> Self {
        let (tx, _rx) = watch::channel(false);
        let mut ancestors = self.ancestors.clone();
        ancestors.push(self.own.clone());
        Self {
            own: Arc::new(tx),
            ancestors,
        }
    }

    pub fn cancel(&self) {
        self.own.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.own.borrow() || self.ancestors.iter().any(|a| *a.borrow())
    }

    /// Resolves once this token or any ancestor is cancelled.
    pub async fn cancelled(&self) {
        let waiters = std::iter::once(&self.own)
            .chain(self.ancestors.iter())
            .map(|sender| {
                let mut rx = sender.subscribe();
                Box::pin(async move {
                    // The sender lives as long as this token, so this only errs on teardown
                    let _ = rx.wait_for(|cancelled| *cancelled).await;
                })
            })
            .collect::<Vec<_>>();
        select_all(waiters).await;
    }
}

/// Proof that a request was issued. Only the most recent ticket is current.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    pub generation: u64,
    pub token: CancellationToken,
}

#[derive(Debug, Default)]
struct TrackerState {
    generation: u64,
    in_flight: Option<CancellationToken>,
}

/// Last-issued-wins bookkeeping: starting a request cancels the previous one and
/// lets the caller check, after awaiting, whether its result may still be applied.
#[derive(Debug, Default)]
pub struct LatestRequestTracker {
    state: Mutex<TrackerState>,
}

impl LatestRequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede whatever is in flight and issue a ticket whose token is a child of `parent`.
    pub fn begin(&self, parent: &CancellationToken) -> RequestTicket {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = state.in_flight.take() {
            previous.cancel();
        }
        state.generation += 1;
        let token = parent.child_token();
        state.in_flight = Some(token.clone());
        RequestTicket {
            generation: state.generation,
            token,
        }
    }

    /// True while no later request was issued and the ticket was not cancelled.
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.generation == ticket.generation && !ticket.token.is_cancelled()
    }

    /// Release the in-flight slot if it still belongs to `ticket`.
    pub fn finish(&self, ticket: &RequestTicket) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.generation == ticket.generation {
            state.in_flight = None;
        }
    }

    pub fn has_in_flight(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.in_flight.is_some()
    }

    /// Cancel the in-flight request, if any (consumer unmounted).
    pub fn cancel_all(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(token) = state.in_flight.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_child_follows_parent_but_not_reverse() {
        let parent = CancellationToken::new();
        let child = parent.child_token();
        let grandchild = child.child_token();

        child.cancel();
        assert!(child.is_cancelled());
        assert!(grandchild.is_cancelled());
        assert!(!parent.is_cancelled());

        let other = parent.child_token();
        parent.cancel();
        assert!(other.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_on_ancestor_cancel() {
        let parent = CancellationToken::new();
        let child = parent.child_token();
        let waiter = tokio::spawn(async move { child.cancelled().await });

        tokio::time::sleep(Duration::from_millis(5)).await;
        parent.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("child should observe parent cancellation")
            .expect("waiter task panicked");
    }

    #[tokio::test]
    async fn test_cancelled_returns_immediately_when_already_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("already-cancelled token should resolve");
    }

    #[test]
    fn test_tracker_supersedes_previous_ticket() {
        let tracker = LatestRequestTracker::new();
        let root = CancellationToken::new();

        let first = tracker.begin(&root);
        assert!(tracker.is_current(&first));

        let second = tracker.begin(&root);
        assert!(first.token.is_cancelled());
        assert!(!tracker.is_current(&first));
        assert!(tracker.is_current(&second));

        // A stale finish must not release the newer request
        tracker.finish(&first);
        assert!(tracker.has_in_flight());
        tracker.finish(&second);
        assert!(!tracker.has_in_flight());
    }

    #[test]
    fn test_tracker_cancel_all() {
        let tracker = LatestRequestTracker::new();
        let ticket = tracker.begin(&CancellationToken::new());
        tracker.cancel_all();
        assert!(ticket.token.is_cancelled());
        assert!(!tracker.is_current(&ticket));
    }
}
