// src/store.rs
//! # Menu cache
//!
//! Owns the day index (calendar day → dishes served that day) and fronts every
//! lookup.
//!
//! - The index is replaced wholesale: a refresh builds a staging index and
//!   installs it with one pointer swap, only if every document succeeded. A
//!   failed refresh leaves the previous index in place.
//! - Readers clone an `Arc` under a short read lock and are never blocked by
//!   fetching or OCR.
//! - Concurrent refresh requests share one in-flight refresh and all receive
//!   its outcome.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Instant;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;

use crate::config::{CacheOptions, MenuOptions, SourceOptions};
use crate::core::cancel::CancelToken;
use crate::core::net::{Fetcher, HttpFetcher};
use crate::engine::pipeline::{DocumentParser, MenuPipeline};
use crate::engine::types::Dish;
use crate::error::{MenuError, Result};
use crate::scrape;

/// Calendar day → dishes, in document then row-major order.
pub type DayIndex = BTreeMap<NaiveDate, Vec<Dish>>;

/// Source of "today" for the refresh window.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Anything that names a calendar day. Times are truncated to their own
/// wall-clock date.
pub trait IntoDay {
    fn into_day(self) -> NaiveDate;
}

impl IntoDay for NaiveDate {
    fn into_day(self) -> NaiveDate {
        self
    }
}

impl IntoDay for NaiveDateTime {
    fn into_day(self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> IntoDay for DateTime<Tz> {
    fn into_day(self) -> NaiveDate {
        self.date_naive()
    }
}

/// Refresh bookkeeping, including unmatched joins of the last good refresh.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub refreshes: u64,
    pub failed_refreshes: u64,
    pub days: usize,
    pub last_matched: usize,
    pub last_unmatched: usize,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Flight {
    outcome: Mutex<Option<Result<()>>>,
    done: Condvar,
}

impl Flight {
    fn wait(&self) -> Result<()> {
        let mut outcome = lock(&self.outcome);
        loop {
            if let Some(res) = outcome.as_ref() {
                return res.clone();
            }
            outcome = self.done.wait(outcome).unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn complete(&self, res: Result<()>) {
        *lock(&self.outcome) = Some(res);
        self.done.notify_all();
    }
}

struct Staged {
    index: DayIndex,
    documents: usize,
    matched: usize,
    unmatched: usize,
}

pub struct MenuCache {
    index: RwLock<Arc<DayIndex>>,
    fetcher: Box<dyn Fetcher>,
    parser: Box<dyn DocumentParser>,
    clock: Box<dyn Clock>,
    source: SourceOptions,
    cache: CacheOptions,
    flight: Mutex<Option<Arc<Flight>>>,
    stats: Mutex<CacheStats>,
    shutdown: CancelToken,
}

impl MenuCache {
    /// Cache with an initial refresh; fails if that refresh fails.
    pub fn new(
        fetcher: Box<dyn Fetcher>,
        parser: Box<dyn DocumentParser>,
        opts: &MenuOptions,
    ) -> Result<Self> {
        let cache = Self::unprimed(fetcher, parser, opts);
        cache.refresh()?;
        Ok(cache)
    }

    /// HTTP fetcher + poppler/tesseract pipeline, primed.
    pub fn from_options(opts: &MenuOptions) -> Result<Self> {
        Self::new(
            Box::new(HttpFetcher::new(&opts.source)),
            Box::new(MenuPipeline::with_tools(opts)),
            opts,
        )
    }

    /// Empty cache; the first lookup or `refresh()` fills it.
    pub fn unprimed(
        fetcher: Box<dyn Fetcher>,
        parser: Box<dyn DocumentParser>,
        opts: &MenuOptions,
    ) -> Self {
        Self {
            index: RwLock::new(Arc::new(DayIndex::new())),
            fetcher,
            parser,
            clock: Box::new(SystemClock),
            source: opts.source.clone(),
            cache: opts.cache.clone(),
            flight: Mutex::new(None),
            stats: Mutex::new(CacheStats::default()),
            shutdown: CancelToken::new(),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Dishes served on `day`.
    ///
    /// Cached days are answered directly. A miss inside `[today, today + window]`
    /// triggers one refresh and one retry; a miss outside it is a range error.
    pub fn get_menu(&self, day: impl IntoDay) -> Result<Vec<Dish>> {
        let date = day.into_day();
        if let Some(dishes) = self.lookup(date) {
            return Ok(dishes);
        }

        let today = self.clock.today();
        if date < today {
            return Err(MenuError::range(date, format!("before today ({today})")));
        }
        let last = today
            .checked_add_days(chrono::Days::new(self.cache.window_days))
            .unwrap_or(NaiveDate::MAX);
        if date > last {
            return Err(MenuError::range(
                date,
                format!("more than {} days after today ({today})", self.cache.window_days),
            ));
        }

        tracing::debug!(%date, "cache miss, refreshing");
        self.refresh()?;
        self.lookup(date).ok_or(MenuError::NotYetPublished(date))
    }

    /// Rebuild the whole index from the source.
    ///
    /// Only one refresh runs at a time; callers arriving while one is in
    /// flight wait for it and get its result instead of starting another.
    pub fn refresh(&self) -> Result<()> {
        let (flight, leader) = {
            let mut slot = lock(&self.flight);
            match slot.as_ref() {
                Some(f) => (Arc::clone(f), false),
                None => {
                    let f = Arc::new(Flight::default());
                    *slot = Some(Arc::clone(&f));
                    (f, true)
                }
            }
        };
        if !leader {
            tracing::debug!("joining in-flight refresh");
            return flight.wait();
        }

        let res = panic::catch_unwind(AssertUnwindSafe(|| self.run_refresh()))
            .unwrap_or_else(|_| Err(MenuError::Internal("refresh panicked".into())));

        lock(&self.flight).take();
        flight.complete(res.clone());
        res
    }

    /// Snapshot of the current index.
    pub fn snapshot(&self) -> Arc<DayIndex> {
        Arc::clone(&self.index.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn stats(&self) -> CacheStats {
        lock(&self.stats).clone()
    }

    /// Cancel in-flight work and the daily trigger. Lookups of cached days keep working.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Token cancelled by `shutdown()`; hand it to background triggers.
    pub fn shutdown_token(&self) -> CancelToken {
        self.shutdown.clone()
    }

    fn lookup(&self, date: NaiveDate) -> Option<Vec<Dish>> {
        self.snapshot().get(&date).cloned()
    }

    fn run_refresh(&self) -> Result<()> {
        let started = Instant::now();
        let cancel = self.shutdown.with_timeout(self.cache.refresh_timeout);
        tracing::info!(site = %self.source.site_url, "refreshing menus");

        let res = self.stage(&cancel);
        let mut stats = lock(&self.stats);
        match res {
            Ok(staged) => {
                let days = staged.index.len();
                *self.index.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(staged.index);

                stats.refreshes += 1;
                stats.days = days;
                stats.last_matched = staged.matched;
                stats.last_unmatched = staged.unmatched;
                stats.last_refreshed_at = Some(Utc::now());
                tracing::info!(
                    documents = staged.documents,
                    days,
                    matched = staged.matched,
                    unmatched = staged.unmatched,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "refresh finished"
                );
                Ok(())
            }
            Err(e) => {
                stats.failed_refreshes += 1;
                tracing::error!(error = %e, "refresh failed, keeping previous menus");
                Err(e)
            }
        }
    }

    fn stage(&self, cancel: &CancelToken) -> Result<Staged> {
        let docs = scrape::collect_documents(self.fetcher.as_ref(), &self.source, cancel)?;

        let mut staged = Staged { index: DayIndex::new(), documents: docs.len(), matched: 0, unmatched: 0 };
        for doc in &docs {
            cancel.check()?;
            let parsed = self
                .parser
                .parse(&doc.bytes, cancel)
                .map_err(|e| e.context(&doc.url))?;
            staged.matched += parsed.report.matched;
            staged.unmatched += parsed.report.unmatched_count();
            for dish in parsed.dishes {
                staged.index.entry(dish.date).or_default().push(dish);
            }
        }
        Ok(staged)
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
