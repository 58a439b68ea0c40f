//! Single-flight guard for access token refresh.
//!
//! The first caller becomes the leader and runs the refresh; callers arriving
//! while it is outstanding are queued and receive the leader's outcome in
//! arrival order. The slot is cleared when the leader settles, including when
//! the leading future is dropped, in which case queued callers fail.

use crate::{
    error::{Error, Result},
    session::copy_secret,
};
use secrecy::SecretString;
use std::{
    collections::VecDeque,
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tokio::sync::oneshot;
use tracing::debug;

type Outcome = Result<SecretString>;

#[derive(Default)]
struct GateState {
    in_flight: bool,
    waiters: VecDeque<oneshot::Sender<Outcome>>,
}

#[derive(Default)]
pub(crate) struct RefreshGate {
    state: Mutex<GateState>,
}

enum Role {
    Leader,
    Follower(oneshot::Receiver<Outcome>),
}

impl RefreshGate {
    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn join(&self) -> Role {
        let mut state = self.lock();
        if state.in_flight {
            let (tx, rx) = oneshot::channel();
            state.waiters.push_back(tx);
            debug!(queued = state.waiters.len(), "refresh in flight, request queued");
            Role::Follower(rx)
        } else {
            state.in_flight = true;
            Role::Leader
        }
    }

    /// Takes the queued waiters and frees the slot.
    fn settle(&self) -> VecDeque<oneshot::Sender<Outcome>> {
        let mut state = self.lock();
        state.in_flight = false;
        std::mem::take(&mut state.waiters)
    }

    pub(crate) fn is_refreshing(&self) -> bool {
        self.lock().in_flight
    }

    #[cfg(test)]
    pub(crate) fn queued(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Runs `refresh` unless one is already outstanding, in which case the
    /// caller waits for that one's outcome.
    pub(crate) async fn run<F, Fut>(&self, refresh: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let rx = match self.join() {
            Role::Leader => {
                let settle = SettleOnDrop {
                    gate: self,
                    armed: true,
                };
                let outcome = refresh().await;
                settle.release(&outcome);
                return outcome;
            }
            Role::Follower(rx) => rx,
        };

        rx.await.unwrap_or_else(|_| {
            Err(Error::RefreshFailed(
                "token refresh was abandoned".to_string(),
            ))
        })
    }
}

struct SettleOnDrop<'a> {
    gate: &'a RefreshGate,
    armed: bool,
}

impl SettleOnDrop<'_> {
    fn release(mut self, outcome: &Outcome) {
        self.armed = false;
        let waiters = self.gate.settle();
        debug!(released = waiters.len(), ok = outcome.is_ok(), "refresh settled");

        for waiter in waiters {
            let copy = match outcome {
                Ok(token) => Ok(copy_secret(token)),
                Err(err) => Err(err.clone()),
            };
            // a waiter that went away no longer needs the token
            let _ = waiter.send(copy);
        }
    }
}

impl Drop for SettleOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            // dropping the senders fails every queued caller
            drop(self.gate.settle());
        }
    }
}
