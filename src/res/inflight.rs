//! Bookkeeping of the loads currently running, so that every `(path, type, options)` triple
//! is produced by at most one thread at a time.
//!
//! A thread that finds its key claimed by another thread parks on a condition variable until
//! that load finishes, and then looks into the cache table again. A thread that asks for a
//! key it already owns, directly or through a chain of threads waiting on each other, would
//! never wake up. Such requests fail with `Error::Cyclic` instead.

use std::path::PathBuf;
use std::sync::{Condvar, Mutex, PoisonError};
use std::thread::{self, ThreadId};

use crate::errors::*;
use crate::utils::FastHashMap;

use super::types::ResourceType;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadKey {
    pub path: PathBuf,
    pub ty: &'static ResourceType,
    pub options: u64,
}

#[derive(Default)]
struct State {
    owners: FastHashMap<LoadKey, ThreadId>,
    waiting: FastHashMap<ThreadId, LoadKey>,
}

impl State {
    // Follows the chain of "thread waits for key owned by thread" starting at `owner`.
    fn leads_to(&self, mut owner: ThreadId, me: ThreadId) -> bool {
        for _ in 0..=self.waiting.len() {
            if owner == me {
                return true;
            }

            owner = match self.waiting.get(&owner).and_then(|v| self.owners.get(v)) {
                Some(&v) => v,
                None => return false,
            };
        }

        false
    }
}

pub enum Claim<'a> {
    /// The caller owns the key until the guard is dropped.
    Owned(InFlightGuard<'a>),
    /// Another thread finished a load, the caller should look into the cache again.
    Waited,
}

#[derive(Default)]
pub struct InFlight {
    state: Mutex<State>,
    cond: Condvar,
}

impl InFlight {
    pub fn new() -> Self {
        InFlight::default()
    }

    /// Claims `key` for the current thread, or blocks until its current owner is done.
    pub fn claim(&self, key: &LoadKey) -> Result<Claim<'_>> {
        let me = thread::current().id();
        let mut state = self.state.lock().unwrap();

        let owner = match state.owners.get(key).cloned() {
            Some(v) => v,
            None => {
                state.owners.insert(key.clone(), me);
                return Ok(Claim::Owned(InFlightGuard {
                    inflight: self,
                    key: key.clone(),
                }));
            }
        };

        if state.leads_to(owner, me) {
            return Err(Error::Cyclic {
                path: key.path.clone(),
                ty: key.ty.name(),
            });
        }

        state.waiting.insert(me, key.clone());
        let mut state = self.cond.wait(state).unwrap();
        state.waiting.remove(&me);
        Ok(Claim::Waited)
    }

    /// The number of loads running right now.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases the claimed key and wakes up the waiting threads when dropped.
pub struct InFlightGuard<'a> {
    inflight: &'a InFlight,
    key: LoadKey,
}

impl<'a> Drop for InFlightGuard<'a> {
    fn drop(&mut self) {
        {
            let mut state = self
                .inflight
                .state
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            state.owners.remove(&self.key);
        }

        self.inflight.cond.notify_all();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use std::sync::{Arc, Barrier};
    use std::time::Duration;

    use crate::res::types::RESOURCE;

    fn key(path: &str) -> LoadKey {
        LoadKey {
            path: path.into(),
            ty: &RESOURCE,
            options: 0,
        }
    }

    #[test]
    fn reentrant_claim_is_cyclic() {
        let inflight = InFlight::new();
        let a = key("a.txt");

        let guard = match inflight.claim(&a).unwrap() {
            Claim::Owned(v) => v,
            Claim::Waited => unreachable!(),
        };

        assert_eq!(inflight.len(), 1);
        match inflight.claim(&a) {
            Err(Error::Cyclic { .. }) => {}
            _ => panic!("expects a cyclic error."),
        }

        // Other keys are independent.
        match inflight.claim(&key("b.txt")).unwrap() {
            Claim::Owned(_) => {}
            Claim::Waited => unreachable!(),
        }

        drop(guard);
        assert!(inflight.is_empty());
    }

    #[test]
    fn waits_for_owner() {
        let inflight = Arc::new(InFlight::new());
        let barrier = Arc::new(Barrier::new(2));

        let guard_inflight = inflight.clone();
        let guard_barrier = barrier.clone();
        let owner = thread::spawn(move || {
            let guard = match guard_inflight.claim(&key("a.txt")).unwrap() {
                Claim::Owned(v) => v,
                Claim::Waited => unreachable!(),
            };

            guard_barrier.wait();
            thread::sleep(Duration::from_millis(50));
            drop(guard);
        });

        barrier.wait();
        loop {
            match inflight.claim(&key("a.txt")).unwrap() {
                Claim::Owned(_) => break,
                Claim::Waited => continue,
            }
        }

        owner.join().unwrap();
        assert!(inflight.is_empty());
    }
}
