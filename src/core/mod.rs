// src/core/mod.rs

pub mod cancel;
pub mod html;
pub mod net;
pub mod tools;

pub use cancel::CancelToken;
pub use net::{Fetcher, HttpFetcher};
pub use tools::{Poppler, Rasterizer, Recognizer, Tesseract, TextExtractor};
