//! Periodic task scheduling on plain threads.
//!
//! The engines expose synchronous `tick`/`on_new_tip` entry points; this
//! scheduler drives the tick side. One thread per task, a shared shutdown
//! flag, and sleeps chopped into short slices so shutdown is prompt.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::debug;

/// Granularity of shutdown checks while a task sleeps.
const SLEEP_SLICE: Duration = Duration::from_millis(250);

/// Runs closures on fixed intervals until stopped.
pub struct Scheduler {
    shutdown: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            shutdown: Arc::new(AtomicBool::new(false)),
            handles: Vec::new(),
        }
    }

    /// Run `task` every `interval`, starting one interval from now.
    pub fn schedule_every<F>(&mut self, name: &'static str, interval: Duration, task: F)
    where
        F: Fn() + Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        let handle = std::thread::Builder::new()
            .name(format!("keel-sched-{name}"))
            .spawn(move || {
                debug!(name, ?interval, "scheduled task started");
                loop {
                    let deadline = Instant::now() + interval;
                    loop {
                        if shutdown.load(Ordering::SeqCst) {
                            debug!(name, "scheduled task stopping");
                            return;
                        }
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        if remaining.is_zero() {
                            break;
                        }
                        std::thread::sleep(SLEEP_SLICE.min(remaining));
                    }
                    task();
                }
            })
            .expect("failed to spawn scheduler thread");
        self.handles.push(handle);
    }

    /// Signal every task to stop and wait for the threads to finish.
    pub fn stop(mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn task_fires_repeatedly_until_stopped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();

        let mut scheduler = Scheduler::new();
        scheduler.schedule_every("test", Duration::from_millis(20), move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        std::thread::sleep(Duration::from_millis(120));
        scheduler.stop();
        let fired = counter.load(Ordering::SeqCst);
        assert!(fired >= 2, "task fired {fired} times");

        // after stop, no more firings
        let settled = counter.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(counter.load(Ordering::SeqCst), settled);
    }

    #[test]
    fn stop_with_no_tasks_is_fine() {
        Scheduler::new().stop();
    }
}
