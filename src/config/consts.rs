// src/config/consts.rs

// Source site
pub const MENU_SITE_URL: &str = "https://www.uksh.de/servicesternnord/Unser+Speisenangebot/Speisepl%C3%A4ne+L%C3%BCbeck/UKSH_Bistro+L%C3%BCbeck-p-346.html";
// No trailing slash: extracted paths start with '/'
pub const HOST_PREFIX: &str = "https://www.uksh.de";
pub const LINK_LABEL: &str = "Speiseplan Bistro";
pub const MAX_LINKS: usize = 2;
pub const MAX_BODY_BYTES: u64 = 32 * 1024 * 1024;
pub const USER_AGENT: &str = "bistro_menu/0.1";

// Layout text template
pub const WEEK_PREFIX: &str = "Speiseplan Bistro";
pub const HEADER_PREFIX: &str = "Wochentag";
pub const COLUMN_HEADERS: [&str; 4] = ["Wok Station", "Vegetarisch", "Gericht 2", "Gericht 3"];
pub const WEEKDAY_PREFIXES: [&str; 7] =
    ["Montag", "Dienstag", "Mittwoch", "Donnerstag", "Freitag", "Samstag", "Sonntag"];
pub const KCAL_MARKER: &str = "kcal";
pub const MIN_LINES: usize = 4;
pub const TOKEN_GAP: usize = 3;

// Recognized tile text
pub const CURRENCY_MARKER: char = '€';
pub const NUTRITION_LETTER: char = 'k';

// Raster template (pdftoppm default 150 dpi)
pub const TILE_X_ANCHOR: u32 = 303;
pub const TILE_Y_ANCHOR: u32 = 330;
pub const TILE_WIDTH: u32 = 338;
pub const TILE_HEIGHT: u32 = 119;
pub const TILE_ROWS: usize = 7;
pub const TILE_COLS: usize = 4;

// External tools
pub const PDFTOTEXT: &str = "pdftotext";
pub const PDFTOPPM: &str = "pdftoppm";
pub const TESSERACT: &str = "tesseract";
pub const OCR_LANGUAGE: &str = "deu";
pub const TOOL_TIMEOUT_SECS: u64 = 60;

// Cache
pub const REFRESH_WINDOW_DAYS: u64 = 7;
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
pub const REFRESH_TIMEOUT_SECS: u64 = 600;
pub const DAILY_REFRESH_HOUR: u32 = 1;

// Concurrency
pub const WORKERS: usize = 4;

// Logging
pub const LOG_FILE: &str = ".store/debug.log";
pub const LOG_ENV: &str = "MENU_LOG";
