//! Serializes render runs triggered by filesystem events.
//!
//! At most one run executes at a time. Requests that arrive while a run is
//! in progress collapse into a single pending rerun, started as soon as the
//! current run finishes.

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Idle,
    Running,
    RunningWithPending,
}

/// Outcome of [`RenderScheduler::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// The caller owns the slot and must run, then call `finish`.
    Start,
    /// A run is in progress; a rerun was recorded.
    Queued,
    /// A run is in progress and a rerun was already recorded.
    AlreadyQueued,
}

#[derive(Debug)]
pub struct RenderScheduler {
    state: Mutex<SlotState>,
}

impl Default for RenderScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Idle),
        }
    }

    pub fn request(&self) -> Request {
        let mut state = self.state.lock();
        match *state {
            SlotState::Idle => {
                *state = SlotState::Running;
                Request::Start
            }
            SlotState::Running => {
                *state = SlotState::RunningWithPending;
                Request::Queued
            }
            SlotState::RunningWithPending => Request::AlreadyQueued,
        }
    }

    /// Mark the current run as done. Returns `true` when a pending rerun was
    /// recorded; the caller then keeps the slot and must run again.
    pub fn finish(&self) -> bool {
        let mut state = self.state.lock();
        match *state {
            SlotState::RunningWithPending => {
                *state = SlotState::Running;
                true
            }
            SlotState::Running | SlotState::Idle => {
                *state = SlotState::Idle;
                false
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        *self.state.lock() == SlotState::Idle
    }

    /// Request a run and, if the slot is free, execute `job` until no rerun
    /// is pending. Returns how many times `job` ran on this thread.
    pub fn run<F: FnMut()>(&self, mut job: F) -> usize {
        match self.request() {
            Request::Start => {}
            queued => {
                tracing::debug!("Render in progress, request {:?}", queued);
                return 0;
            }
        }

        let mut runs = 0;
        loop {
            job();
            runs += 1;
            if !self.finish() {
                break;
            }
            tracing::debug!("Starting queued rerun");
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread;

    #[test]
    fn test_state_transitions() {
        let scheduler = RenderScheduler::new();
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.request(), Request::Start);
        assert_eq!(scheduler.request(), Request::Queued);
        assert_eq!(scheduler.request(), Request::AlreadyQueued);
        assert!(scheduler.finish());
        assert!(!scheduler.is_idle());
        assert!(!scheduler.finish());
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_single_request_runs_once() {
        let scheduler = RenderScheduler::new();
        let mut count = 0;
        assert_eq!(scheduler.run(|| count += 1), 1);
        assert_eq!(count, 1);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_requests_during_run_coalesce_into_one_rerun() {
        let scheduler = Arc::new(RenderScheduler::new());
        let active = Arc::new(AtomicUsize::new(0));
        let total = Arc::new(AtomicUsize::new(0));
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let runner = {
            let scheduler = scheduler.clone();
            let active = active.clone();
            let total = total.clone();
            thread::spawn(move || {
                let mut first = true;
                scheduler.run(|| {
                    assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                    if first {
                        first = false;
                        started_tx.send(()).unwrap();
                        release_rx.recv().unwrap();
                    }
                    total.fetch_add(1, Ordering::SeqCst);
                    active.fetch_sub(1, Ordering::SeqCst);
                })
            })
        };

        started_rx.recv().unwrap();
        let others: Vec<_> = (0..4)
            .map(|_| {
                let scheduler = scheduler.clone();
                thread::spawn(move || scheduler.run(|| panic!("slot is taken")))
            })
            .collect();
        for handle in others {
            assert_eq!(handle.join().unwrap(), 0);
        }
        release_tx.send(()).unwrap();

        assert_eq!(runner.join().unwrap(), 2);
        assert_eq!(total.load(Ordering::SeqCst), 2);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_request_after_finish_starts_fresh() {
        let scheduler = RenderScheduler::new();
        assert_eq!(scheduler.run(|| {}), 1);
        assert_eq!(scheduler.run(|| {}), 1);
    }
}
