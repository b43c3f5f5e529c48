//! Live observation of the training environment.
//!
//! The learner publishes a copy of the current observation after every step
//! with [`StateMonitor::publish`], which never blocks: if a reader holds the
//! slot at that moment, the update is skipped. A [`StatePoller`] reads the
//! latest copy on its own fixed-period timer in a separate thread.
use crossbeam_channel::{bounded, select, tick, Sender};
use log::debug;
use std::{
    sync::{Arc, Mutex, TryLockError},
    thread::{self, JoinHandle},
    time::Duration,
};

/// A slot holding the latest published observation.
#[derive(Debug)]
pub struct StateMonitor<O> {
    slot: Arc<Mutex<Option<O>>>,
}

impl<O> Clone for StateMonitor<O> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<O> Default for StateMonitor<O> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }
}

impl<O: Clone> StateMonitor<O> {
    /// Constructs an empty monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a copy of `obs` unless a reader currently holds the slot.
    ///
    /// Returns `true` if the copy was stored.
    pub fn publish(&self, obs: &O) -> bool {
        match self.slot.try_lock() {
            Ok(mut guard) => {
                *guard = Some(obs.clone());
                true
            }
            Err(TryLockError::Poisoned(e)) => {
                *e.into_inner() = Some(obs.clone());
                true
            }
            Err(TryLockError::WouldBlock) => false,
        }
    }

    /// A copy of the latest published observation.
    pub fn snapshot(&self) -> Option<O> {
        match self.slot.lock() {
            Ok(guard) => guard.clone(),
            Err(e) => e.into_inner().clone(),
        }
    }
}

/// Polls a [`StateMonitor`] with a fixed period in a background thread.
///
/// The thread stops when [`StatePoller::stop`] is called or the poller is dropped.
pub struct StatePoller {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl StatePoller {
    /// Spawns a thread calling `f` with the latest observation every `period`.
    ///
    /// `f` is not called while nothing has been published.
    pub fn spawn<O, F>(monitor: StateMonitor<O>, period: Duration, mut f: F) -> Self
    where
        O: Clone + Send + 'static,
        F: FnMut(O) + Send + 'static,
    {
        let (stop_s, stop_r) = bounded::<()>(1);
        let ticker = tick(period);
        let handle = thread::spawn(move || loop {
            select! {
                recv(ticker) -> _ => {
                    if let Some(obs) = monitor.snapshot() {
                        f(obs);
                    }
                }
                recv(stop_r) -> _ => break,
            }
        });
        debug!("Started state polling every {:?}", period);

        Self {
            stop: Some(stop_s),
            handle: Some(handle),
        }
    }

    /// Stops the polling thread and waits for it.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Dropping the sender disconnects the channel and wakes the thread
        self.stop.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatePoller {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn snapshot_returns_latest_publication() {
        let monitor = StateMonitor::new();
        assert_eq!(monitor.snapshot(), None);
        assert!(monitor.publish(&1));
        assert!(monitor.publish(&2));
        assert_eq!(monitor.snapshot(), Some(2));
    }

    #[test]
    fn publish_does_not_block_while_read_is_in_progress() {
        let monitor = StateMonitor::new();
        monitor.publish(&1);
        let guard = monitor.slot.lock().unwrap();
        assert!(!monitor.publish(&2));
        drop(guard);
        assert_eq!(monitor.snapshot(), Some(1));
    }

    #[test]
    fn poller_reads_published_states() {
        let monitor = StateMonitor::new();
        let (s, r) = unbounded();
        let poller = StatePoller::spawn(monitor.clone(), Duration::from_millis(1), move |obs: usize| {
            let _ = s.send(obs);
        });
        monitor.publish(&7);
        let obs = r.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(obs, 7);
        poller.stop();
    }
}
