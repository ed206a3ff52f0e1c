// src/engine/pipeline.rs
// Full per-document pipeline: text channel + image channel + join.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use chrono::{Datelike, Local};

use crate::config::{MenuOptions, TileGeometry};
use crate::config::consts::WORKERS;
use crate::core::cancel::CancelToken;
use crate::core::tools::{Poppler, Rasterizer, Recognizer, Tesseract, TextExtractor};
use crate::engine::merge::merge;
use crate::engine::types::{CellKey, ParsedDocument, PriceFragment, PriceTable};
use crate::error::{MenuError, Result};
use crate::parse::{price, text_table, tiles};
use crate::parse::tiles::Tile;

/// Turns the bytes of one menu document into dishes.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, pdf: &[u8], cancel: &CancelToken) -> Result<ParsedDocument>;
}

pub struct MenuPipeline {
    text: Box<dyn TextExtractor>,
    raster: Box<dyn Rasterizer>,
    ocr: Box<dyn Recognizer>,
    geometry: TileGeometry,
    workers: usize,
    year: Option<i32>,
}

impl MenuPipeline {
    pub fn new(
        text: Box<dyn TextExtractor>,
        raster: Box<dyn Rasterizer>,
        ocr: Box<dyn Recognizer>,
    ) -> Self {
        Self { text, raster, ocr, geometry: TileGeometry::default(), workers: WORKERS, year: None }
    }

    /// poppler-utils + tesseract as configured.
    pub fn with_tools(opts: &MenuOptions) -> Self {
        Self::new(
            Box::new(Poppler::new(&opts.tools)),
            Box::new(Poppler::new(&opts.tools)),
            Box::new(Tesseract::new(&opts.tools)),
        )
        .geometry(opts.geometry)
        .workers(opts.workers)
    }

    pub fn geometry(mut self, geometry: TileGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Resolve week numbers against a fixed year instead of the current one.
    pub fn year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn parse_in_year(&self, pdf: &[u8], year: i32, cancel: &CancelToken) -> Result<ParsedDocument> {
        // text channel first: cheap, and rejects foreign documents before any OCR
        let text = self.text.extract_text(pdf, cancel)?;
        let table = text_table(&text, year)?;
        cancel.check()?;

        let prices = self.price_table(pdf, cancel)?;
        let (dishes, report) = merge(table, &prices);
        tracing::debug!(
            dishes = dishes.len(),
            matched = report.matched,
            unmatched = report.unmatched_count(),
            "parsed document"
        );
        Ok(ParsedDocument { dishes, report })
    }

    /// Image channel: render, cut, recognize every tile.
    pub fn price_table(&self, pdf: &[u8], cancel: &CancelToken) -> Result<PriceTable> {
        let png = self.raster.rasterize(pdf, cancel)?;
        let page = tiles::decode_page(&png)?;
        let tiles = tiles::cut_tiles(&page, &self.geometry)?;
        recognize_tiles(&tiles, self.ocr.as_ref(), self.workers, cancel)
    }
}

impl DocumentParser for MenuPipeline {
    fn parse(&self, pdf: &[u8], cancel: &CancelToken) -> Result<ParsedDocument> {
        let year = self.year.unwrap_or_else(|| Local::now().year());
        self.parse_in_year(pdf, year, cancel)
    }
}

type TileResult = std::result::Result<(CellKey, PriceFragment), MenuError>;

/// Recognize tiles on a small worker pool; the first failure stops the pool.
fn recognize_tiles(
    tiles: &[Tile],
    ocr: &dyn Recognizer,
    workers: usize,
    cancel: &CancelToken,
) -> Result<PriceTable> {
    let next = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<TileResult>();
    let workers = workers.min(tiles.len()).max(1);

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let (next, failed) = (&next, &failed);
            scope.spawn(move || {
                loop {
                    if failed.load(Ordering::Relaxed) {
                        break;
                    }
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    let Some(tile) = tiles.get(i) else { break };
                    let res = recognize_one(tile, ocr, cancel);
                    if res.is_err() {
                        failed.store(true, Ordering::Relaxed);
                    }
                    if tx.send(res).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx); // receiver ends once every worker is done

        let mut table = PriceTable::with_capacity(tiles.len());
        let mut first_err = None;
        for res in rx {
            match res {
                Ok((key, fragment)) => {
                    table.insert(key, fragment);
                }
                Err(e) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(table),
        }
    })
}

fn recognize_one(tile: &Tile, ocr: &dyn Recognizer, cancel: &CancelToken) -> TileResult {
    cancel.check()?;
    let png = tile.to_png()?;
    let text = ocr
        .recognize(&png, cancel)
        .map_err(|e| e.context(&format!("tile {}", tile.key)))?;
    let parsed = price::parse_tile_text(&text);
    tracing::debug!(
        cell = %tile.key,
        title = %parsed.title,
        price = %parsed.fragment.price,
        "recognized tile"
    );
    Ok((tile.key, parsed.fragment))
}
