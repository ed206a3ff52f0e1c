// src/engine/merge.rs
// Equi-join of the two channels on the cell key.
//
// Every text-channel dish is kept. A dish whose key has no price fragment keeps
// an empty price and is listed in the report instead of being dropped.

use crate::engine::types::{Dish, MergeReport, PriceTable, TextTable};

pub fn merge(text: TextTable, prices: &PriceTable) -> (Vec<Dish>, MergeReport) {
    let mut report = MergeReport::default();
    let mut dishes = Vec::with_capacity(text.len());

    for (key, mut dish) in text {
        match prices.get(&key) {
            Some(fragment) => {
                dish.price = fragment.price.clone();
                report.matched += 1;
            }
            None => {
                tracing::warn!(cell = %key, title = %dish.title, "no price tile for dish");
                report.unmatched.push(key);
            }
        }
        dishes.push(dish);
    }
    (dishes, report)
}
