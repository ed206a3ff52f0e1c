// src/cli.rs
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};

use crate::config::MenuOptions;
use crate::core::cancel::CancelToken;
use crate::engine::pipeline::{DocumentParser, MenuPipeline};
use crate::error::MenuError;
use crate::log::{self, LogOptions};
use crate::parse::text_table;
use crate::schedule;
use crate::store::MenuCache;

#[derive(Parser, Debug)]
#[command(name = "menu", version, about = "Weekly bistro menu: parse plans, serve dishes by day")]
pub struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log to .store/debug.log instead of stderr
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Page listing the menu documents
    #[arg(long, global = true, value_name = "URL")]
    pub site_url: Option<String>,

    /// Timeout for each external tool run
    #[arg(long, global = true, value_name = "SECS")]
    pub tool_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the full pipeline on a local menu PDF
    Parse {
        pdf: PathBuf,
        /// Year the week number belongs to (default: current year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Run only the text channel on saved `pdftotext -layout` output
    Text {
        txt: PathBuf,
        #[arg(long)]
        year: Option<i32>,
    },
    /// Fetch the published menus and print one day as JSON
    Show {
        /// YYYY-MM-DD (default: today)
        date: Option<NaiveDate>,
    },
    /// Serve dates read from stdin, one JSON line per date, refreshing daily
    Watch,
}

impl Cli {
    fn options(&self) -> MenuOptions {
        let mut opts = MenuOptions::from_env();
        if let Some(url) = &self.site_url {
            opts.source.site_url = url.clone();
        }
        if let Some(secs) = self.tool_timeout.filter(|s| *s > 0) {
            opts.tools.timeout = Duration::from_secs(secs);
        }
        opts
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut log_opts = LogOptions::default().verbose(cli.verbose);
    if cli.log_file {
        log_opts = log_opts.to_file();
    }
    log::init(&log_opts)?;

    let opts = cli.options();
    match &cli.command {
        Command::Parse { pdf, year } => parse_pdf(&opts, pdf, *year),
        Command::Text { txt, year } => parse_text(txt, *year),
        Command::Show { date } => show(&opts, *date),
        Command::Watch => watch(&opts),
    }
}

fn parse_pdf(opts: &MenuOptions, path: &Path, year: Option<i32>) -> Result<()> {
    let bytes = std::fs::read(path).wrap_err_with(|| format!("reading {}", path.display()))?;
    let pipeline = MenuPipeline::with_tools(opts);
    let cancel = CancelToken::new();
    let doc = match year {
        Some(y) => pipeline.parse_in_year(&bytes, y, &cancel)?,
        None => pipeline.parse(&bytes, &cancel)?,
    };

    for dish in &doc.dishes {
        println!("{} {dish}", dish.date);
    }
    eprintln!(
        "{} dishes, {} without price",
        doc.dishes.len(),
        doc.report.unmatched_count()
    );
    Ok(())
}

fn parse_text(path: &Path, year: Option<i32>) -> Result<()> {
    let text = std::fs::read_to_string(path).wrap_err_with(|| format!("reading {}", path.display()))?;
    let year = year.unwrap_or_else(|| Local::now().year());
    let table = text_table(&text, year)?;
    for (key, dish) in &table {
        println!("{key} {} {dish}", dish.date);
    }
    Ok(())
}

fn show(opts: &MenuOptions, date: Option<NaiveDate>) -> Result<()> {
    let cache = MenuCache::from_options(opts).wrap_err("initial refresh")?;
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let dishes = cache.get_menu(date)?;
    println!("{}", serde_json::to_string_pretty(&dishes)?);
    Ok(())
}

fn watch(opts: &MenuOptions) -> Result<()> {
    let cache = Arc::new(MenuCache::from_options(opts).wrap_err("initial refresh")?);
    let trigger = schedule::spawn_daily(Arc::clone(&cache), opts.daily_refresh_at, cache.shutdown_token());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in io::stdin().lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = match line.parse::<NaiveDate>() {
            Ok(date) => match cache.get_menu(date) {
                Ok(dishes) => serde_json::to_string(&dishes)?,
                Err(e) => error_line(&e),
            },
            Err(e) => serde_json::json!({ "error": format!("bad date {line:?}: {e}"), "kind": "bad_request" })
                .to_string(),
        };
        writeln!(out, "{reply}")?;
        out.flush()?;
    }

    cache.shutdown();
    if trigger.join().is_err() {
        tracing::warn!("daily refresh thread panicked");
    }
    Ok(())
}

fn error_line(e: &MenuError) -> String {
    serde_json::json!({ "error": e.to_string(), "kind": error_kind(e) }).to_string()
}

/// Presentation class of a lookup error.
pub fn error_kind(e: &MenuError) -> &'static str {
    if e.is_range() {
        "bad_request"
    } else if e.is_not_yet_published() {
        "not_found"
    } else {
        "internal"
    }
}
