//! Scan job tracking and cancellation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

pub type JobId = u64;

/// Cancellation flag polled by a running scan; clones share the flag.
#[derive(Debug, Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    job_id: JobId,
}

impl CancelToken {
    pub fn new(job_id: JobId) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            job_id,
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }
}

/// Running scans, at most one per watch folder.
#[derive(Debug)]
pub struct ScanJobs {
    next_id: AtomicU64,
    jobs: RwLock<HashMap<i64, CancelToken>>,
}

impl Default for ScanJobs {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanJobs {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            jobs: RwLock::new(HashMap::new()),
        }
    }

    /// Register a scan of `folder_id`, cancelling any scan of it still running.
    pub fn begin(&self, folder_id: i64) -> CancelToken {
        let job_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancelToken::new(job_id);

        if let Ok(mut jobs) = self.jobs.write() {
            if let Some(stale) = jobs.insert(folder_id, token.clone()) {
                tracing::debug!(
                    "superseding scan job {} for folder {}",
                    stale.job_id(),
                    folder_id
                );
                stale.cancel();
            }
        }

        token
    }

    /// Forget a finished scan. A newer job for the same folder is left alone.
    pub fn finish(&self, folder_id: i64, token: &CancelToken) {
        if let Ok(mut jobs) = self.jobs.write() {
            if jobs.get(&folder_id).map(CancelToken::job_id) == Some(token.job_id()) {
                jobs.remove(&folder_id);
            }
        }
    }

    /// Cancel the scan of one folder. Returns true if one was running.
    pub fn cancel(&self, folder_id: i64) -> bool {
        if let Ok(jobs) = self.jobs.read() {
            if let Some(token) = jobs.get(&folder_id) {
                token.cancel();
                return true;
            }
        }
        false
    }

    pub fn cancel_all(&self) {
        if let Ok(jobs) = self.jobs.read() {
            for token in jobs.values() {
                token.cancel();
            }
        }
    }

    pub fn active_count(&self) -> usize {
        self.jobs.read().map(|j| j.len()).unwrap_or(0)
    }

    pub fn is_scanning(&self, folder_id: i64) -> bool {
        self.jobs
            .read()
            .map(|j| j.contains_key(&folder_id))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_clone() {
        let token1 = CancelToken::new(1);
        let token2 = token1.clone();

        token1.cancel();

        assert!(token1.is_cancelled());
        assert!(token2.is_cancelled());
    }

    #[test]
    fn test_new_scan_supersedes_stale_one() {
        let jobs = ScanJobs::new();

        let first = jobs.begin(7);
        let second = jobs.begin(7);
        let other = jobs.begin(8);

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(!other.is_cancelled());
        assert_eq!(jobs.active_count(), 2);

        // the stale job finishing must not unregister its replacement
        jobs.finish(7, &first);
        assert!(jobs.is_scanning(7));

        jobs.finish(7, &second);
        assert!(!jobs.is_scanning(7));
    }

    #[test]
    fn test_cancel_and_cancel_all() {
        let jobs = ScanJobs::new();

        let a = jobs.begin(1);
        assert!(jobs.cancel(1));
        assert!(a.is_cancelled());
        assert!(!jobs.cancel(99));

        let b = jobs.begin(2);
        let c = jobs.begin(3);
        jobs.cancel_all();
        assert!(b.is_cancelled());
        assert!(c.is_cancelled());
    }
}
