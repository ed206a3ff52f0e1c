// src/config/options.rs
use std::time::Duration;

use chrono::NaiveTime;
use super::consts::*;

/// Fixed pixel geometry of the table in the rendered page.
///
/// Purely a property of the document template: nothing is detected, so a
/// template change yields tiles that no longer line up with the cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGeometry {
    pub x_anchor: u32,
    pub y_anchor: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub rows: usize,
    pub cols: usize,
}

impl Default for TileGeometry {
    fn default() -> Self {
        Self {
            x_anchor: TILE_X_ANCHOR,
            y_anchor: TILE_Y_ANCHOR,
            tile_width: TILE_WIDTH,
            tile_height: TILE_HEIGHT,
            rows: TILE_ROWS,
            cols: TILE_COLS,
        }
    }
}

impl TileGeometry {
    /// Bottom-right corner of the grid (exclusive).
    pub fn extent(&self) -> (u64, u64) {
        let w = self.x_anchor as u64 + self.tile_width as u64 * self.cols as u64;
        let h = self.y_anchor as u64 + self.tile_height as u64 * self.rows as u64;
        (w, h)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolOptions {
    pub pdftotext: String,
    pub pdftoppm: String,
    pub tesseract: String,
    pub ocr_language: String,
    pub timeout: Duration,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            pdftotext: PDFTOTEXT.into(),
            pdftoppm: PDFTOPPM.into(),
            tesseract: TESSERACT.into(),
            ocr_language: OCR_LANGUAGE.into(),
            timeout: Duration::from_secs(TOOL_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceOptions {
    pub site_url: String,
    pub host_prefix: String,
    pub link_label: String,
    pub max_links: usize,
    pub request_timeout: Duration,
    pub max_body_bytes: u64,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            site_url: MENU_SITE_URL.into(),
            host_prefix: HOST_PREFIX.into(),
            link_label: LINK_LABEL.into(),
            max_links: MAX_LINKS,
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheOptions {
    /// Days after today that still trigger an on-demand refresh.
    pub window_days: u64,
    /// Upper bound for one whole refresh (fetch + every document).
    pub refresh_timeout: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            window_days: REFRESH_WINDOW_DAYS,
            refresh_timeout: Duration::from_secs(REFRESH_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuOptions {
    pub source: SourceOptions,
    pub tools: ToolOptions,
    pub geometry: TileGeometry,
    pub cache: CacheOptions,
    pub workers: usize,
    pub daily_refresh_at: NaiveTime,
}

impl Default for MenuOptions {
    fn default() -> Self {
        Self {
            source: SourceOptions::default(),
            tools: ToolOptions::default(),
            geometry: TileGeometry::default(),
            cache: CacheOptions::default(),
            workers: WORKERS,
            daily_refresh_at: NaiveTime::from_hms_opt(DAILY_REFRESH_HOUR, 0, 0)
                .unwrap_or(NaiveTime::MIN),
        }
    }
}

impl MenuOptions {
    /// Defaults overlaid with `MENU_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source; malformed numbers are skipped.
    pub fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("MENU_SITE_URL").filter(|v| !v.trim().is_empty()) {
            self.source.site_url = url.trim().to_string();
        }
        if let Some(lang) = lookup("MENU_OCR_LANG").filter(|v| !v.trim().is_empty()) {
            self.tools.ocr_language = lang.trim().to_string();
        }
        if let Some(d) = secs(&lookup, "MENU_TOOL_TIMEOUT_SECS") {
            self.tools.timeout = d;
        }
        if let Some(d) = secs(&lookup, "MENU_REQUEST_TIMEOUT_SECS") {
            self.source.request_timeout = d;
        }
        if let Some(d) = secs(&lookup, "MENU_REFRESH_TIMEOUT_SECS") {
            self.cache.refresh_timeout = d;
        }
        self
    }
}

fn secs<F>(lookup: &F, key: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Some(Duration::from_secs(n)),
        _ => {
            tracing::warn!("ignoring {key}={raw:?}: expected a positive number of seconds");
            None
        }
    }
}
