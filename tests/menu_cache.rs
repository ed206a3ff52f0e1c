// tests/menu_cache.rs
//
// Menu cache against an in-memory site and a scripted document parser.
//
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier, Condvar, Mutex};
use std::thread;
use std::time::Duration;

use chrono::NaiveDate;

use bistro_menu::core::net::Fetcher;
use bistro_menu::engine::{CellKey, DocumentParser, MergeReport, ParsedDocument};
use bistro_menu::parse::text_table;
use bistro_menu::{CancelToken, Clock, MenuCache, MenuError, MenuOptions, Result};

const PLAN: &str = include_str!("fixtures/plan_kw47.txt");

const SITE: &str = r#"<html><body>
<p><a class="pdf" href="/docs/bistro_kw47.pdf">Speiseplan Bistro KW 47</a></p>
<p><a class="pdf" href="/docs/bistro_kw48.pdf">Speiseplan Bistro KW 48</a></p>
</body></html>"#;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 11, d).unwrap()
}

#[derive(Default)]
struct SiteState {
    down: AtomicBool,
    hits: AtomicUsize,
}

struct FakeSite(Arc<SiteState>);

impl Fetcher for FakeSite {
    fn get(&self, url: &str, cancel: &CancelToken) -> Result<Vec<u8>> {
        cancel.check()?;
        self.0.hits.fetch_add(1, Ordering::SeqCst);
        if self.0.down.load(Ordering::SeqCst) {
            return Err(MenuError::network(format!("GET {url}: connection refused")));
        }
        match url {
            "http://bistro.test/speiseplan.html" => Ok(SITE.as_bytes().to_vec()),
            "http://bistro.test/docs/bistro_kw47.pdf" => Ok(b"kw47".to_vec()),
            "http://bistro.test/docs/bistro_kw48.pdf" => Ok(b"kw48".to_vec()),
            _ => Err(MenuError::network(format!("GET {url}: HTTP 404"))),
        }
    }
}

/// Gate that holds parsers until the test opens it.
#[derive(Default)]
struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
    }

    fn release(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }
}

#[derive(Default)]
struct ParserState {
    calls: AtomicUsize,
    /// Week 48 document fails to parse.
    broken_kw48: AtomicBool,
    gate: Option<Arc<Gate>>,
    entered: Option<Mutex<mpsc::Sender<()>>>,
}

struct ScriptedParser(Arc<ParserState>);

impl DocumentParser for ScriptedParser {
    fn parse(&self, pdf: &[u8], _cancel: &CancelToken) -> Result<ParsedDocument> {
        self.0.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(tx) = &self.0.entered {
            let _ = tx.lock().unwrap().send(());
        }
        if let Some(gate) = &self.0.gate {
            gate.wait();
        }
        match pdf {
            b"kw47" => {
                let dishes: Vec<_> = text_table(PLAN, 2020)?.into_values().collect();
                let report = MergeReport {
                    matched: dishes.len() - 1,
                    unmatched: vec![CellKey { row: 6, col: 2 }],
                };
                Ok(ParsedDocument { dishes, report })
            }
            b"kw48" if self.0.broken_kw48.load(Ordering::SeqCst) => {
                Err(MenuError::format("\"Wochentag\" line not found"))
            }
            b"kw48" => Ok(ParsedDocument::default()),
            other => Err(MenuError::format(format!("unexpected document {other:?}"))),
        }
    }
}

struct FixedClock(NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

fn options() -> MenuOptions {
    let mut opts = MenuOptions::default();
    opts.source.site_url = "http://bistro.test/speiseplan.html".into();
    opts.source.host_prefix = "http://bistro.test".into();
    opts
}

struct Harness {
    cache: Arc<MenuCache>,
    site: Arc<SiteState>,
    parser: Arc<ParserState>,
}

fn harness_with(today: NaiveDate, parser: ParserState) -> Harness {
    let site = Arc::new(SiteState::default());
    let parser = Arc::new(parser);
    let cache = MenuCache::unprimed(
        Box::new(FakeSite(Arc::clone(&site))),
        Box::new(ScriptedParser(Arc::clone(&parser))),
        &options(),
    )
    .with_clock(FixedClock(today));
    Harness { cache: Arc::new(cache), site, parser }
}

fn primed(today: NaiveDate) -> Harness {
    let h = harness_with(today, ParserState::default());
    h.cache.refresh().unwrap();
    h
}

#[test]
fn initial_refresh_must_succeed() {
    let site = Arc::new(SiteState::default());
    site.down.store(true, Ordering::SeqCst);
    let res = MenuCache::new(
        Box::new(FakeSite(site)),
        Box::new(ScriptedParser(Arc::new(ParserState::default()))),
        &options(),
    );
    assert!(matches!(res, Err(MenuError::Network(_))));
}

#[test]
fn cached_day_is_served_unchanged() {
    let h = primed(day(16));
    let calls = h.parser.calls.load(Ordering::SeqCst);

    let first = h.cache.get_menu(day(18)).unwrap();
    let again = h.cache.get_menu(day(18).and_hms_opt(12, 30, 0).unwrap()).unwrap();
    assert_eq!(first, again);
    assert_eq!(first.len(), 4);
    assert_eq!(first[3].title, "gebratenes Kabeljaufilet");

    // no refresh on a hit
    assert_eq!(h.parser.calls.load(Ordering::SeqCst), calls);
}

#[test]
fn days_keep_column_order() {
    let h = primed(day(16));
    let kinds: Vec<String> = h.cache.get_menu(day(16)).unwrap().into_iter().map(|d| d.kind).collect();
    assert_eq!(kinds, ["Wok Station", "Vegetarisch", "Gericht 2", "Gericht 3"]);

    // Saturday lacks the vegetarian dish
    assert_eq!(h.cache.get_menu(day(21)).unwrap().len(), 3);
}

#[test]
fn outside_the_window_is_a_range_error() {
    let h = primed(day(16));
    let hits = h.site.hits.load(Ordering::SeqCst);

    let past = h.cache.get_menu(day(15)).unwrap_err();
    assert!(past.is_range(), "{past:?}");

    let far = h.cache.get_menu(day(24)).unwrap_err();
    assert!(far.is_range(), "{far:?}");

    // the last day of the window is still refreshed for
    let edge = h.cache.get_menu(day(23)).unwrap_err();
    assert!(edge.is_not_yet_published(), "{edge:?}");

    // only the in-window miss went to the site
    assert!(h.site.hits.load(Ordering::SeqCst) > hits);
}

#[test]
fn in_window_miss_refreshes_then_reports_not_published() {
    let h = primed(day(20));
    let calls = h.parser.calls.load(Ordering::SeqCst);

    let err = h.cache.get_menu(day(23)).unwrap_err();
    assert_eq!(err, MenuError::NotYetPublished(day(23)));
    assert!(!err.is_range());
    // one refresh = both documents parsed again
    assert_eq!(h.parser.calls.load(Ordering::SeqCst), calls + 2);
}

#[test]
fn cached_past_day_is_still_served() {
    let h = primed(day(20));
    assert_eq!(h.cache.get_menu(day(16)).unwrap().len(), 4);
}

#[test]
fn unprimed_cache_fills_on_first_lookup() {
    let h = harness_with(day(16), ParserState::default());
    assert!(h.cache.snapshot().is_empty());

    let menu = h.cache.get_menu(day(22)).unwrap();
    assert!(menu.iter().any(|d| d.title == "Rumpsteak"));
    assert_eq!(h.cache.stats().refreshes, 1);
}

#[test]
fn failed_refresh_keeps_previous_menus() {
    let h = primed(day(16));
    let before = h.cache.snapshot();

    // second document breaks after the first one parsed fine
    h.parser.broken_kw48.store(true, Ordering::SeqCst);
    let err = h.cache.refresh().unwrap_err();
    assert!(matches!(&err, MenuError::Format(m) if m.contains("bistro_kw48.pdf")), "{err:?}");

    assert_eq!(h.cache.snapshot(), before);
    assert_eq!(h.cache.get_menu(day(16)).unwrap().len(), 4);

    // network failure behaves the same
    h.site.down.store(true, Ordering::SeqCst);
    assert!(matches!(h.cache.refresh(), Err(MenuError::Network(_))));
    assert_eq!(h.cache.get_menu(day(22)).unwrap().len(), 4);

    let stats = h.cache.stats();
    assert_eq!(stats.refreshes, 1);
    assert_eq!(stats.failed_refreshes, 2);
}

#[test]
fn stats_track_unmatched_joins() {
    let h = primed(day(16));
    let stats = h.cache.stats();
    assert_eq!(stats.days, 7);
    assert_eq!(stats.last_matched, 26);
    assert_eq!(stats.last_unmatched, 1);
    assert!(stats.last_refreshed_at.is_some());
}

#[test]
fn concurrent_refreshes_share_one_flight() {
    let gate = Arc::new(Gate::default());
    let (tx, rx) = mpsc::channel();
    let h = harness_with(
        day(16),
        ParserState { gate: Some(Arc::clone(&gate)), entered: Some(Mutex::new(tx)), ..Default::default() },
    );
    h.parser.broken_kw48.store(true, Ordering::SeqCst);

    let leader = {
        let cache = Arc::clone(&h.cache);
        thread::spawn(move || cache.refresh())
    };
    // leader is inside the parser now
    rx.recv_timeout(Duration::from_secs(5)).unwrap();

    let start = Arc::new(Barrier::new(4));
    let followers: Vec<_> = (0..3)
        .map(|_| {
            let cache = Arc::clone(&h.cache);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                cache.refresh()
            })
        })
        .collect();
    start.wait();
    thread::sleep(Duration::from_millis(200));
    gate.release();

    let expected = leader.join().unwrap().unwrap_err();
    assert!(matches!(expected, MenuError::Format(_)));
    for f in followers {
        assert_eq!(f.join().unwrap().unwrap_err(), expected);
    }

    // one refresh ran: kw47 + kw48 parsed once each
    assert_eq!(h.parser.calls.load(Ordering::SeqCst), 2);
    assert_eq!(h.cache.stats().failed_refreshes, 1);
}

#[test]
fn shutdown_cancels_refresh_but_keeps_menus() {
    let h = primed(day(16));
    h.cache.shutdown();

    assert_eq!(h.cache.refresh(), Err(MenuError::Cancelled));
    assert_eq!(h.cache.get_menu(day(17)).unwrap().len(), 4);
}
