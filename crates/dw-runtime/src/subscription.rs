#![forbid(unsafe_code)]

//! Long-running message sources.
//!
//! A [`Subscription`] runs on its own thread and sends messages back over a
//! channel until its [`StopSignal`] fires. The model declares the
//! subscriptions it wants after every update; [`SubscriptionManager`]
//! starts the new ones and stops the ones no longer declared, matching them
//! by [`SubId`].

use std::collections::HashSet;
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Stable identity of a subscription across reconciliations.
pub type SubId = u64;

/// A background message source.
pub trait Subscription<M: Send + 'static>: Send {
    /// Two subscriptions with the same id are the same subscription.
    fn id(&self) -> SubId;

    /// Produce messages until `stop` fires or the receiver goes away.
    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal);
}

/// Cooperative stop flag shared between the manager and one subscription.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl StopSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let (lock, cvar) = &*self.inner;
        *lock.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep up to `timeout`. Returns `true` as soon as a stop is requested.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let mut stopped = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !*stopped {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            stopped = cvar
                .wait_timeout(stopped, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }
}

/// Sends `make()` every `interval`.
pub struct Every<M, F> {
    interval: Duration,
    make: F,
    _msg: std::marker::PhantomData<fn() -> M>,
}

impl<M, F> Every<M, F>
where
    F: Fn() -> M + Send + Sync + 'static,
{
    pub fn new(interval: Duration, make: F) -> Self {
        Self {
            interval,
            make,
            _msg: std::marker::PhantomData,
        }
    }
}

impl<M, F> Subscription<M> for Every<M, F>
where
    M: Send + 'static,
    F: Fn() -> M + Send + Sync + 'static,
{
    fn id(&self) -> SubId {
        0x4556_5259_0000_0000 ^ self.interval.as_nanos() as u64
    }

    fn run(&self, sender: mpsc::Sender<M>, stop: StopSignal) {
        while !stop.wait_timeout(self.interval) {
            if sender.send((self.make)()).is_err() {
                break;
            }
        }
    }
}

struct Running {
    id: SubId,
    stop: StopSignal,
    handle: JoinHandle<()>,
}

/// Starts, stops, and collects messages from subscriptions.
pub struct SubscriptionManager<M: Send + 'static> {
    running: Vec<Running>,
    sender: mpsc::Sender<M>,
    receiver: mpsc::Receiver<M>,
}

impl<M: Send + 'static> Default for SubscriptionManager<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Send + 'static> SubscriptionManager<M> {
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            running: Vec::new(),
            sender,
            receiver,
        }
    }

    /// Ids of the subscriptions currently running.
    #[must_use]
    pub fn active_ids(&self) -> Vec<SubId> {
        self.running.iter().map(|r| r.id).collect()
    }

    /// Make the running set match `declared`.
    pub fn reconcile(&mut self, declared: Vec<Box<dyn Subscription<M>>>) {
        let wanted: HashSet<SubId> = declared.iter().map(|s| s.id()).collect();

        let (keep, retire): (Vec<_>, Vec<_>) = self
            .running
            .drain(..)
            .partition(|r| wanted.contains(&r.id));
        self.running = keep;
        for running in retire {
            debug!(sub_id = running.id, "stopping subscription");
            running.stop.stop();
            join(running);
        }

        for sub in declared {
            let id = sub.id();
            if self.running.iter().any(|r| r.id == id) {
                continue;
            }
            let stop = StopSignal::new();
            let sender = self.sender.clone();
            let thread_stop = stop.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("sub-{id:x}"))
                .spawn(move || sub.run(sender, thread_stop));
            match spawned {
                Ok(handle) => {
                    debug!(sub_id = id, "started subscription");
                    self.running.push(Running { id, stop, handle });
                }
                Err(err) => warn!(sub_id = id, %err, "failed to spawn subscription"),
            }
        }
    }

    /// Messages received since the last drain, in arrival order.
    pub fn drain_messages(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }

    pub fn stop_all(&mut self) {
        for running in &self.running {
            running.stop.stop();
        }
        for running in self.running.drain(..) {
            join(running);
        }
    }
}

impl<M: Send + 'static> Drop for SubscriptionManager<M> {
    fn drop(&mut self) {
        self.stop_all();
    }
}

fn join(running: Running) {
    if running.handle.join().is_err() {
        warn!(sub_id = running.id, "subscription thread panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        id: SubId,
        runs: Arc<AtomicUsize>,
    }

    impl Subscription<u32> for Counter {
        fn id(&self) -> SubId {
            self.id
        }

        fn run(&self, sender: mpsc::Sender<u32>, stop: StopSignal) {
            self.runs.fetch_add(1, Ordering::SeqCst);
            let _ = sender.send(self.id as u32);
            let _ = stop.wait_timeout(Duration::from_secs(30));
        }
    }

    fn counter(id: SubId, runs: &Arc<AtomicUsize>) -> Box<dyn Subscription<u32>> {
        Box::new(Counter {
            id,
            runs: Arc::clone(runs),
        })
    }

    fn drain_until(manager: &SubscriptionManager<u32>, want: usize) -> Vec<u32> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut got = Vec::new();
        while got.len() < want && Instant::now() < deadline {
            got.extend(manager.drain_messages());
            std::thread::sleep(Duration::from_millis(5));
        }
        got
    }

    #[test]
    fn stop_signal_wakes_waiter() {
        let stop = StopSignal::new();
        let waiter = stop.clone();
        let handle = std::thread::spawn(move || waiter.wait_timeout(Duration::from_secs(30)));
        stop.stop();
        assert!(handle.join().expect("join"));
        assert!(stop.is_stopped());
    }

    #[test]
    fn wait_timeout_elapses_without_stop() {
        let stop = StopSignal::new();
        assert!(!stop.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn reconcile_starts_once_per_id() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut manager = SubscriptionManager::new();
        manager.reconcile(vec![counter(1, &runs), counter(2, &runs)]);
        manager.reconcile(vec![counter(1, &runs), counter(2, &runs)]);
        let mut got = drain_until(&manager, 2);
        got.sort_unstable();
        assert_eq!(got, vec![1, 2]);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
        manager.stop_all();
    }

    #[test]
    fn reconcile_stops_undeclared() {
        let runs = Arc::new(AtomicUsize::new(0));
        let mut manager = SubscriptionManager::new();
        manager.reconcile(vec![counter(1, &runs), counter(2, &runs)]);
        manager.reconcile(vec![counter(2, &runs)]);
        assert_eq!(manager.active_ids(), vec![2]);
        manager.reconcile(Vec::new());
        assert!(manager.active_ids().is_empty());
    }

    #[test]
    fn every_ticks_until_stopped() {
        let mut manager: SubscriptionManager<u32> = SubscriptionManager::new();
        let subs: Vec<Box<dyn Subscription<u32>>> =
            vec![Box::new(Every::new(Duration::from_millis(5), || 7u32))];
        manager.reconcile(subs);
        let got = drain_until(&manager, 3);
        assert!(got.len() >= 3);
        assert!(got.iter().all(|&m| m == 7));
        manager.stop_all();
    }

    #[test]
    fn every_id_depends_on_interval() {
        let a: Every<u32, _> = Every::new(Duration::from_millis(5), || 0u32);
        let b: Every<u32, _> = Every::new(Duration::from_millis(6), || 0u32);
        assert_ne!(a.id(), b.id());
    }
}
