// src/parse/price.rs
// Reads price and nutrition out of the recognized text of one tile.
//
//   line 0                  → title (OCR quality, not used for the join)
//   lines until a '€' line  → description
//   first '€' line          → "<price> k<nutrition>", split at the first 'k'
// Anything after the first price line is noise.

use crate::config::consts::{CURRENCY_MARKER, NUTRITION_LETTER};
use crate::engine::types::PriceFragment;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TileText {
    pub title: String,
    pub description: String,
    pub fragment: PriceFragment,
}

pub fn parse_tile_text(text: &str) -> TileText {
    let mut lines = text.lines();
    let mut out = TileText { title: lines.next().unwrap_or_default().trim().to_string(), ..Default::default() };

    for line in lines.map(str::trim) {
        if line.contains(CURRENCY_MARKER) {
            let (price, nutrition) = match line.find(NUTRITION_LETTER) {
                Some(i) => (&line[..i], &line[i..]),
                None => (line, ""),
            };
            out.fragment.price = price.trim().to_string();
            out.fragment.nutrition = nutrition.trim().to_string();
            break;
        }
        if !line.is_empty() {
            if !out.description.is_empty() {
                out.description.push(' ');
            }
            out.description.push_str(line);
        }
    }
    out
}
