// src/lib.rs
//! Weekly bistro menu scraper.
//!
//! One menu document carries the same table twice: as layout text (titles,
//! descriptions, nutrition) and as a rendered page whose cells can only be read
//! by OCR (prices). `parse` reads both channels, `engine` joins them per cell,
//! `store` serves the merged dishes by calendar day.

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod log;
pub mod parse;
pub mod schedule;
pub mod scrape;
pub mod store;

#[cfg(feature = "cli")]
pub mod cli;

pub use config::MenuOptions;
pub use crate::core::cancel::CancelToken;
pub use engine::{CellKey, Dish, DocumentParser, MenuPipeline, MergeReport, ParsedDocument};
pub use error::{MenuError, Result};
pub use store::{CacheStats, Clock, DayIndex, IntoDay, MenuCache, SystemClock};
