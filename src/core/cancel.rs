// src/core/cancel.rs
//! Cooperative cancellation shared by everything a refresh touches.
//!
//! A token is a shared flag plus an optional deadline. Clones share the flag;
//! `with_deadline` derives a token that additionally expires at a point in time,
//! so one refresh can be bounded without affecting the parent.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::error::{MenuError, Result};

#[derive(Default)]
struct Flag {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    cv: Condvar,
}

#[derive(Clone, Default)]
pub struct CancelToken {
    flag: Arc<Flag>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same flag, expiring at `deadline` (or the existing deadline if earlier).
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(d) if d < deadline => d,
            _ => deadline,
        };
        Self { flag: Arc::clone(&self.flag), deadline: Some(deadline) }
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn cancel(&self) {
        self.flag.cancelled.store(true, Ordering::SeqCst);
        let _guard = self.flag.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.flag.cv.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.cancelled.load(Ordering::SeqCst) || self.expired()
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Time left before the deadline; `None` when unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Clamp a per-call timeout to the remaining deadline.
    pub fn clamp(&self, timeout: Duration) -> Duration {
        match self.remaining() {
            Some(left) => timeout.min(left),
            None => timeout,
        }
    }

    /// `Err(Cancelled)` once the flag is set or the deadline passed.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() { Err(MenuError::Cancelled) } else { Ok(()) }
    }

    /// Sleep up to `timeout`, waking early on cancellation.
    /// Returns `true` if the token was cancelled.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let until = Instant::now() + self.clamp(timeout);
        let mut guard = self.flag.lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if self.is_cancelled() {
                return true;
            }
            let now = Instant::now();
            if now >= until {
                return self.is_cancelled();
            }
            guard = match self.flag.cv.wait_timeout(guard, until - now) {
                Ok((g, _)) => g,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.flag.cancelled.load(Ordering::SeqCst))
            .field("deadline", &self.deadline)
            .finish()
    }
}
