// src/schedule.rs
// Daily refresh trigger.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Days, Local, NaiveDateTime, NaiveTime, TimeZone};

use crate::core::cancel::CancelToken;
use crate::store::MenuCache;

/// Refresh `cache` every day at `at` (local time) until `token` is cancelled.
///
/// A failed refresh is logged and left for the next trigger or lookup.
pub fn spawn_daily(cache: Arc<MenuCache>, at: NaiveTime, token: CancelToken) -> JoinHandle<()> {
    thread::spawn(move || {
        loop {
            let now = Local::now();
            let wait = until_next(now, at);
            tracing::debug!(next_in_secs = wait.as_secs(), "daily refresh scheduled");
            if token.wait_timeout(wait) {
                break;
            }
            match cache.refresh() {
                Ok(()) => tracing::info!("scheduled refresh done"),
                Err(e) => {
                    tracing::warn!(error = %e, "scheduled refresh failed, retrying at next trigger");
                }
            }
        }
        tracing::debug!("daily refresh stopped");
    })
}

/// Time from `now` to the next `at`, never zero (a trigger at exactly `at` waits a day).
pub fn until_next<Tz: TimeZone>(now: DateTime<Tz>, at: NaiveTime) -> Duration {
    let tz = now.timezone();
    let today = now.date_naive();
    let next = [today, today + Days::new(1), today + Days::new(2)]
        .into_iter()
        .filter_map(|d| resolve(&tz, d.and_time(at)))
        .find(|t| *t > now);

    match next {
        Some(t) => (t - now).to_std().unwrap_or(Duration::from_secs(60)),
        None => Duration::from_secs(24 * 3600),
    }
}

// Skipped local times (DST gap) fall back to the hour after.
fn resolve<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + chrono::Duration::hours(1))).earliest())
}
