use anyhow::{bail, Context};
use serde::Deserialize;
use std::rc::Rc;

use crate::physics::GridOccupancy;
use crate::texture::Texture;

// Tile id 0 is an empty cell. Non-zero ids index the tileset starting at 1.
pub type TileId = u32;

// Tiled stores horizontal, vertical and diagonal flips in the top three bits of a gid.
const FLIP_FLAGS: TileId = 0xE000_0000;

#[derive(Debug, Deserialize)]
struct MapFile {
    width: u32,
    height: u32,
    tile_width: u32,
    tile_height: u32,
    tileset: Option<String>,
    #[serde(default)]
    layers: Vec<LayerFile>,
}

#[derive(Debug, Deserialize)]
struct LayerFile {
    name: String,
    data: String,
}

#[derive(Debug, Clone)]
pub struct TileLayer {
    pub name: String,
    width: u32,
    height: u32,
    // Row major, row 0 is the bottom row.
    cells: Vec<TileId>,
}

impl TileLayer {
    pub fn new(name: &str, width: u32, height: u32) -> Self {
        TileLayer {
            name: name.to_string(),
            width,
            height,
            cells: vec![0; (width * height) as usize],
        }
    }

    // Parses Tiled style CSV: one line per row, top row first.
    fn from_csv(name: &str, width: u32, height: u32, data: &str) -> anyhow::Result<Self> {
        let lines: Vec<&str> = data
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect();
        if lines.len() != height as usize {
            bail!(
                "layer '{}' has {} rows, expected {}",
                name,
                lines.len(),
                height
            );
        }
        let mut layer = TileLayer::new(name, width, height);
        for (line_index, line) in lines.iter().enumerate() {
            let row = height - 1 - line_index as u32;
            let ids = line
                .split(',')
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(|v| v.parse::<TileId>().map(|id| id & !FLIP_FLAGS))
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("layer '{}' row {}", name, line_index))?;
            if ids.len() != width as usize {
                bail!(
                    "layer '{}' row {} has {} cells, expected {}",
                    name,
                    line_index,
                    ids.len(),
                    width
                );
            }
            for (column, id) in ids.into_iter().enumerate() {
                layer.set(column as u32, row, id);
            }
        }
        Ok(layer)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn offset(&self, column: i32, row: i32) -> Option<usize> {
        if column < 0 || row < 0 || column as u32 >= self.width || row as u32 >= self.height {
            return None;
        }
        Some(row as usize * self.width as usize + column as usize)
    }

    // Returns None for empty cells and for coordinates outside the layer.
    pub fn cell(&self, column: i32, row: i32) -> Option<TileId> {
        self.offset(column, row)
            .map(|i| self.cells[i])
            .filter(|&id| id != 0)
    }

    pub fn set(&mut self, column: u32, row: u32, id: TileId) {
        if let Some(i) = self.offset(column as i32, row as i32) {
            self.cells[i] = id;
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&id| id != 0).count()
    }
}

impl GridOccupancy for TileLayer {
    fn is_occupied(&self, column: i32, row: i32) -> bool {
        self.cell(column, row).is_some()
    }
}

#[derive(Debug)]
pub struct TileMap {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tileset_name: Option<String>,
    pub tileset: Option<Rc<Texture>>,
    layers: Vec<TileLayer>,
}

impl TileMap {
    pub fn new(width: u32, height: u32, tile_size: u32, layers: Vec<TileLayer>) -> Self {
        TileMap {
            width,
            height,
            tile_width: tile_size,
            tile_height: tile_size,
            tileset_name: None,
            tileset: None,
            layers,
        }
    }

    pub fn parse(serialized: &str) -> anyhow::Result<Self> {
        let file: MapFile = toml::from_str(serialized)?;
        if file.tile_width != file.tile_height || file.tile_width == 0 {
            bail!(
                "tiles must be square, got {}x{}",
                file.tile_width,
                file.tile_height
            );
        }
        let layers = file
            .layers
            .iter()
            .map(|l| TileLayer::from_csv(&l.name, file.width, file.height, &l.data))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(TileMap {
            width: file.width,
            height: file.height,
            tile_width: file.tile_width,
            tile_height: file.tile_height,
            tileset_name: file.tileset,
            tileset: None,
            layers,
        })
    }

    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&TileLayer> {
        self.layers.get(index)
    }

    // World size in world units.
    pub fn world_size(&self) -> (f32, f32) {
        (
            (self.width * self.tile_width) as f32,
            (self.height * self.tile_height) as f32,
        )
    }
}
