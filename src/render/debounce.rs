use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::instance::InstanceId;

struct PendingTimer {
    generation: u64,
    task: JoinHandle<()>,
}

#[derive(Default)]
struct TimerTable {
    next_generation: u64,
    pending: HashMap<InstanceId, PendingTimer>,
}

/// Per-instance trailing-edge debounce.
///
/// Scheduling replaces any pending timer for the same id, so a burst of
/// signals fires once, `window` after the last one.
pub(crate) struct ResizeDebouncer {
    window: Duration,
    table: Arc<Mutex<TimerTable>>,
}

impl ResizeDebouncer {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            table: Arc::new(Mutex::new(TimerTable::default())),
        }
    }

    pub(crate) fn window(&self) -> Duration {
        self.window
    }

    /// Outside a tokio runtime there is nothing to drive the timer, and
    /// `fire` runs immediately.
    pub(crate) fn schedule<F>(&self, id: &InstanceId, fire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            trace!(instance = %id, "no runtime for resize debounce; firing immediately");
            fire();
            return;
        };

        let mut table = self.table.lock();
        if let Some(previous) = table.pending.remove(id) {
            previous.task.abort();
        }
        table.next_generation += 1;
        let generation = table.next_generation;

        let window = self.window;
        let owned_id = id.clone();
        let shared = Arc::clone(&self.table);
        let task = runtime.spawn(async move {
            tokio::time::sleep(window).await;
            {
                let mut table = shared.lock();
                match table.pending.get(&owned_id) {
                    Some(timer) if timer.generation == generation => {
                        table.pending.remove(&owned_id);
                    }
                    _ => return,
                }
            }
            fire();
        });
        table
            .pending
            .insert(id.clone(), PendingTimer { generation, task });
    }

    /// Drops the pending timer for `id`. Returns `true` when one was pending.
    pub(crate) fn cancel(&self, id: &InstanceId) -> bool {
        match self.table.lock().pending.remove(id) {
            Some(timer) => {
                timer.task.abort();
                true
            }
            None => false,
        }
    }

    pub(crate) fn pending_count(&self) -> usize {
        self.table.lock().pending.len()
    }
}

impl Drop for ResizeDebouncer {
    fn drop(&mut self) {
        for (_, timer) in self.table.lock().pending.drain() {
            timer.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::ResizeDebouncer;
    use crate::instance::InstanceId;

    fn counting(counter: &Arc<AtomicUsize>) -> impl FnOnce() + Send + 'static {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn burst_fires_once_after_window() {
        let debouncer = ResizeDebouncer::new(Duration::from_millis(100));
        let id = InstanceId::generate();
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            debouncer.schedule(&id, counting(&fired));
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_fire() {
        let debouncer = ResizeDebouncer::new(Duration::from_millis(100));
        let id = InstanceId::generate();
        let fired = Arc::new(AtomicUsize::new(0));

        debouncer.schedule(&id, counting(&fired));
        assert!(debouncer.cancel(&id));
        assert!(!debouncer.cancel(&id));

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn timers_are_independent_per_instance() {
        let debouncer = ResizeDebouncer::new(Duration::from_millis(100));
        let first = InstanceId::generate();
        let second = InstanceId::generate();
        let fired = Arc::new(AtomicUsize::new(0));

        debouncer.schedule(&first, counting(&fired));
        debouncer.schedule(&second, counting(&fired));
        assert_eq!(debouncer.pending_count(), 2);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn fires_immediately_without_runtime() {
        let debouncer = ResizeDebouncer::new(Duration::from_millis(100));
        let fired = Arc::new(AtomicUsize::new(0));
        debouncer.schedule(&InstanceId::generate(), counting(&fired));
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(debouncer.pending_count(), 0);
    }
}
