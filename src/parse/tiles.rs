// src/parse/tiles.rs
// Cuts the rendered page into one image per table cell.
//
// Pure arithmetic on the fixed template geometry: tile (row, col) starts at
// anchor + (col * width, row * height). Nothing is detected, so a changed
// template produces tiles that no longer match the cells.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::config::TileGeometry;
use crate::engine::types::CellKey;
use crate::error::{MenuError, Result};

pub struct Tile {
    pub key: CellKey,
    pub image: DynamicImage,
}

impl Tile {
    pub fn to_png(&self) -> Result<Vec<u8>> {
        encode_png(&self.image).map_err(|e| e.context(&format!("tile {}", self.key)))
    }
}

/// Decode the raster produced by the rendering tool.
pub fn decode_page(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| MenuError::tool("rasterizer", format!("unusable page image: {e}")))
}

pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| MenuError::Internal(format!("png encode failed: {e}")))?;
    Ok(buf)
}

/// Row-major list of `rows × cols` tiles.
pub fn cut_tiles(page: &DynamicImage, g: &TileGeometry) -> Result<Vec<Tile>> {
    let (need_w, need_h) = g.extent();
    if (page.width() as u64) < need_w || (page.height() as u64) < need_h {
        return Err(MenuError::format(format!(
            "page raster {}x{} is smaller than the tile grid {need_w}x{need_h}",
            page.width(),
            page.height()
        )));
    }

    let mut tiles = Vec::with_capacity(g.rows * g.cols);
    for row in 0..g.rows {
        for col in 0..g.cols {
            let x = g.x_anchor + col as u32 * g.tile_width;
            let y = g.y_anchor + row as u32 * g.tile_height;
            tiles.push(Tile {
                key: CellKey { row, col },
                image: page.crop_imm(x, y, g.tile_width, g.tile_height),
            });
        }
    }
    Ok(tiles)
}
