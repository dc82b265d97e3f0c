//! Publish/subscribe registry for inbound stream frames.
//!
//! Dispatch iterates a snapshot taken under a read lock, and the lock is
//! released before any listener runs, so a listener may add or remove
//! listeners (itself included) without deadlocking. Each entry carries a
//! liveness flag cleared on removal and checked right before invocation: a
//! listener removed mid-dispatch is skipped for the rest of that dispatch,
//! and the other listeners are neither skipped nor invoked twice.
//!
//! Every invocation also holds a shared gate on its entry. `remove` clears
//! the flag and then takes the gate exclusively, so once it returns the
//! listener is neither running nor able to start on any thread. Called from
//! inside a listener, `remove` only clears the flag: waiting there could
//! deadlock against the dispatch that is running it.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Callback invoked with the text of every inbound frame.
pub type Listener = Arc<dyn Fn(&str) + Send + Sync>;

/// Handle returned by [`ListenerRegistry::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

thread_local! {
    /// Listener invocations currently on this thread's stack.
    static INVOKING: Cell<usize> = const { Cell::new(0) };
}

struct InvocationGuard;

impl InvocationGuard {
    fn enter() -> Self {
        INVOKING.with(|depth| depth.set(depth.get() + 1));
        InvocationGuard
    }

    fn active() -> bool {
        INVOKING.with(|depth| depth.get() > 0)
    }
}

impl Drop for InvocationGuard {
    fn drop(&mut self) {
        INVOKING.with(|depth| depth.set(depth.get() - 1));
    }
}

#[derive(Default)]
struct Liveness {
    removed: AtomicBool,
    gate: RwLock<()>,
}

struct Entry {
    id: ListenerId,
    liveness: Arc<Liveness>,
    callback: Listener,
}

#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    entries: RwLock<Vec<Entry>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, callback: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().push(Entry {
            id,
            liveness: Arc::default(),
            callback,
        });
        id
    }

    /// Unregisters `id`. Returns `false` if it was not registered.
    ///
    /// Outside a listener this blocks until any in-flight invocation of `id`
    /// has returned.
    pub fn remove(&self, id: ListenerId) -> bool {
        let liveness = {
            let mut entries = self.entries.write();
            match entries.iter().position(|e| e.id == id) {
                Some(index) => entries.remove(index).liveness,
                None => return false,
            }
        };
        liveness.removed.store(true, Ordering::Release);
        if !InvocationGuard::active() {
            drop(liveness.gate.write());
        }
        true
    }

    /// Delivers `text` to every live listener. Returns how many ran.
    pub fn dispatch(&self, text: &str) -> usize {
        let snapshot: Vec<(Arc<Liveness>, Listener)> = self
            .entries
            .read()
            .iter()
            .map(|e| (Arc::clone(&e.liveness), Arc::clone(&e.callback)))
            .collect();

        let mut invoked = 0;
        for (liveness, callback) in snapshot {
            let _gate = liveness.gate.read_recursive();
            if liveness.removed.load(Ordering::Acquire) {
                continue;
            }
            let _invoking = InvocationGuard::enter();
            callback(text);
            invoked += 1;
        }
        invoked
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let listener: Listener = Arc::new(move |_: &str| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, listener)
    }

    #[test]
    fn dispatches_to_all_listeners() {
        let registry = ListenerRegistry::new();
        let (a, la) = counter();
        let (b, lb) = counter();
        registry.add(la);
        registry.add(lb);

        assert_eq!(registry.dispatch("frame"), 2);
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removed_listener_never_fires() {
        let registry = ListenerRegistry::new();
        let (a, la) = counter();
        let id = registry.add(la);
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        registry.dispatch("frame");
        assert_eq!(a.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn self_removal_during_dispatch() {
        let registry = Arc::new(ListenerRegistry::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let (r, s, l) = (Arc::clone(&registry), Arc::clone(&slot), Arc::clone(&seen));
        let first = registry.add(Arc::new(move |text: &str| {
            l.lock().push(format!("first:{text}"));
            if let Some(id) = *s.lock() {
                r.remove(id);
            }
        }));
        *slot.lock() = Some(first);

        let l = Arc::clone(&seen);
        registry.add(Arc::new(move |text: &str| l.lock().push(format!("second:{text}"))));

        registry.dispatch("a");
        registry.dispatch("b");
        assert_eq!(*seen.lock(), vec!["first:a", "second:a", "second:b"]);
    }

    #[test]
    fn removing_a_later_listener_mid_dispatch_skips_it() {
        let registry = Arc::new(ListenerRegistry::new());
        let (late, late_listener) = counter();
        let late_id = Arc::new(Mutex::new(None));

        let (r, id_slot) = (Arc::clone(&registry), Arc::clone(&late_id));
        registry.add(Arc::new(move |_: &str| {
            if let Some(id) = *id_slot.lock() {
                r.remove(id);
            }
        }));
        *late_id.lock() = Some(registry.add(late_listener));

        assert_eq!(registry.dispatch("x"), 1);
        assert_eq!(late.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn remove_waits_for_an_invocation_on_another_thread() {
        let registry = Arc::new(ListenerRegistry::new());
        let finished = Arc::new(AtomicBool::new(false));
        let (started_tx, started_rx) = mpsc::channel();

        let done = Arc::clone(&finished);
        let started_tx = Mutex::new(started_tx);
        let id = registry.add(Arc::new(move |_: &str| {
            let _ = started_tx.lock().send(());
            thread::sleep(Duration::from_millis(50));
            done.store(true, Ordering::SeqCst);
        }));

        let dispatcher = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.dispatch("frame"))
        };
        started_rx.recv().unwrap();
        assert!(registry.remove(id));
        assert!(finished.load(Ordering::SeqCst));

        assert_eq!(dispatcher.join().unwrap(), 1);
        assert_eq!(registry.dispatch("frame"), 0);
    }

    #[test]
    fn no_invocation_starts_after_remove_returns() {
        let registry = Arc::new(ListenerRegistry::new());
        let removed = Arc::new(AtomicBool::new(false));
        let late_calls = Arc::new(AtomicUsize::new(0));

        let (flag, late) = (Arc::clone(&removed), Arc::clone(&late_calls));
        let id = registry.add(Arc::new(move |_: &str| {
            if flag.load(Ordering::SeqCst) {
                late.fetch_add(1, Ordering::SeqCst);
            }
        }));

        let dispatchers: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        registry.dispatch("frame");
                    }
                })
            })
            .collect();
        thread::sleep(Duration::from_millis(5));
        assert!(registry.remove(id));
        removed.store(true, Ordering::SeqCst);

        for handle in dispatchers {
            handle.join().unwrap();
        }
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
    }
}
