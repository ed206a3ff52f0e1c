// src/parse/mod.rs
//! # Document readers
//!
//! Everything here knows how to read *one* menu document and nothing else:
//!
//! - **text channel**: `tokens` → `columns` → `rows` → `dishes` turn layout text
//!   into dishes keyed by table cell (titles, descriptions, nutrition, date).
//! - **image channel**: `tiles` cuts the rendered page into cell images, `price`
//!   reads the recognized text of one tile (price, nutrition).
//!
//! No I/O and no caching: the engine runs the external tools and joins the
//! channels, the store decides when to do it.

pub mod columns;
pub mod dishes;
pub mod price;
pub mod rows;
pub mod tiles;
pub mod tokens;

pub use columns::{Column, Columns};
pub use dishes::text_table;
pub use price::{TileText, parse_tile_text};
pub use rows::{Layout, RowBlock, segment, week_anchor};
pub use tiles::{Tile, cut_tiles};
pub use tokens::{Token, tokenize};
