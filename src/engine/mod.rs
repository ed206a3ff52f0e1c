// src/engine/mod.rs
pub mod merge;
pub mod pipeline;
pub mod types;

pub use merge::merge;
pub use pipeline::{DocumentParser, MenuPipeline};
pub use types::{CellKey, Dish, MergeReport, ParsedDocument, PriceFragment, PriceTable, TextTable};
