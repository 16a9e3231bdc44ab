//! One-shot delayed commit of LaTeX edits.
//!
//! Every keystroke-burst ends in a single write: scheduling a commit for a
//! record cancels that record's previous pending commit and restarts the
//! delay. Only the last value scheduled within the quiet period is written.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

pub struct LatexDebouncer {
    delay: Duration,
    next_seq: AtomicU64,
    pending: Arc<Mutex<HashMap<i64, (u64, JoinHandle<()>)>>>,
}

impl LatexDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_seq: AtomicU64::new(0),
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Schedule `commit` to run after the quiet period, superseding any
    /// commit still pending for the same record.
    pub fn schedule(&self, record_id: i64, commit: impl FnOnce() + Send + 'static) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let delay = self.delay;
        let pending = Arc::clone(&self.pending);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            commit();

            // Clean up our own entry unless a newer edit replaced it.
            let mut map = pending.lock().unwrap();
            if map.get(&record_id).is_some_and(|(s, _)| *s == seq) {
                map.remove(&record_id);
            }
        });

        let mut map = self.pending.lock().unwrap();
        if let Some((_, old)) = map.insert(record_id, (seq, handle)) {
            old.abort();
        }
    }

    /// Number of records with an uncommitted edit.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI64;

    #[tokio::test(start_paused = true)]
    async fn commits_after_quiet_period() {
        let debouncer = LatexDebouncer::new(Duration::from_millis(500));
        let committed = Arc::new(AtomicI64::new(0));

        let c = Arc::clone(&committed);
        debouncer.schedule(1, move || c.store(42, Ordering::SeqCst));
        assert_eq!(committed.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(committed.load(Ordering::SeqCst), 42);
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_commit_only_the_last() {
        let debouncer = LatexDebouncer::new(Duration::from_millis(500));
        let committed = Arc::new(AtomicI64::new(0));
        let commits = Arc::new(AtomicI64::new(0));

        for value in 1..=5 {
            let c = Arc::clone(&committed);
            let n = Arc::clone(&commits);
            debouncer.schedule(7, move || {
                c.store(value, Ordering::SeqCst);
                n.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(committed.load(Ordering::SeqCst), 5);
        assert_eq!(commits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn distinct_records_do_not_cancel_each_other() {
        let debouncer = LatexDebouncer::new(Duration::from_millis(500));
        let commits = Arc::new(AtomicI64::new(0));

        for id in 0..3 {
            let n = Arc::clone(&commits);
            debouncer.schedule(id, move || {
                n.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(commits.load(Ordering::SeqCst), 3);
    }
}
