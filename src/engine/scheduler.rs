//! Cron scheduler for workflows started with the `auto` trigger.
//!
//! Each job is one tokio task sleeping until its next fire time. Jobs are keyed
//! by workflow id and replaced on re-registration.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use chrono::Utc;
use tokio::runtime::Runtime;
use tracing::{debug, trace};

use crate::{ShareLock, common::Shutdown, utils::schedule};

pub struct Scheduler {
    jobs: ShareLock<HashMap<String, Arc<Shutdown>>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Runs `job` at every fire time of `cron`, replacing the job registered under `key`.
    pub fn add(
        &self,
        runtime: &Runtime,
        key: &str,
        cron: ::cron::Schedule,
        job: impl Fn() + Send + Sync + 'static,
    ) {
        trace!("scheduler::add({})", key);
        let stop = Arc::new(Shutdown::new());
        if let Some(previous) = self.jobs.write().unwrap_or_else(PoisonError::into_inner).insert(key.to_string(), stop.clone()) {
            previous.shutdown();
        }

        let key = key.to_string();
        runtime.spawn(async move {
            let mut from = Utc::now();
            loop {
                let Some(next) = schedule::next_fire(&cron, from) else {
                    debug!("schedule {} has no further fire times", key);
                    break;
                };
                let delay = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::select! {
                    _ = stop.wait() => break,
                    _ = tokio::time::sleep(delay) => {
                        debug!("schedule {} fired", key);
                        job();
                    }
                }
                // the next fire time is computed from this one so a fire is never repeated
                from = next;
            }
        });
    }

    /// Stops the job under `key`. Returns whether one was registered.
    pub fn remove(
        &self,
        key: &str,
    ) -> bool {
        match self.jobs.write().unwrap_or_else(PoisonError::into_inner).remove(key) {
            Some(stop) => {
                stop.shutdown();
                true
            }
            None => false,
        }
    }

    pub fn contains(
        &self,
        key: &str,
    ) -> bool {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).contains_key(key)
    }

    /// Stops every job.
    pub fn stop(&self) {
        for (_, stop) in self.jobs.write().unwrap_or_else(PoisonError::into_inner).drain() {
            stop.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        thread,
        time::{Duration, Instant},
    };

    use super::*;

    fn wait_for(
        deadline: Duration,
        f: impl Fn() -> bool,
    ) -> bool {
        let until = Instant::now() + deadline;
        while Instant::now() < until {
            if f() {
                return true;
            }
            thread::sleep(Duration::from_millis(20));
        }
        f()
    }

    #[test]
    fn test_job_fires_until_removed() {
        let rt = Runtime::new().unwrap();
        let scheduler = Scheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        scheduler.add(&rt, "w1", schedule::parse_cron("* * * * * *").unwrap(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(scheduler.contains("w1"));
        assert!(wait_for(Duration::from_secs(5), || fired.load(Ordering::SeqCst) >= 2));

        assert!(scheduler.remove("w1"));
        assert!(!scheduler.remove("w1"));
        thread::sleep(Duration::from_millis(100));
        let after_remove = fired.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(1500));
        assert_eq!(fired.load(Ordering::SeqCst), after_remove);
    }

    #[test]
    fn test_replacing_a_job_stops_the_old_one() {
        let rt = Runtime::new().unwrap();
        let scheduler = Scheduler::new();
        let old = Arc::new(AtomicUsize::new(0));
        let new = Arc::new(AtomicUsize::new(0));

        let counter = old.clone();
        scheduler.add(&rt, "w1", schedule::parse_cron("* * * * * *").unwrap(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = new.clone();
        scheduler.add(&rt, "w1", schedule::parse_cron("* * * * * *").unwrap(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(wait_for(Duration::from_secs(5), || new.load(Ordering::SeqCst) >= 2));
        assert_eq!(old.load(Ordering::SeqCst), 0);

        scheduler.stop();
        assert!(!scheduler.contains("w1"));
    }
}
