//! Tile map asset, read only by the renderer

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to read map: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse map: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("map width is zero")]
    ZeroWidth,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TileLayer {
    pub name: String,
    /// Row-major tile ids; 0 means empty. Object layers carry none.
    #[serde(default)]
    pub data: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TileMap {
    pub tilewidth: u32,
    pub tileheight: u32,
    /// Width in tiles.
    pub width: u32,
    #[serde(default)]
    pub height: Option<u32>,
    pub layers: Vec<TileLayer>,
}

impl TileMap {
    pub fn from_json(text: &str) -> Result<Self, MapError> {
        let map: TileMap = serde_json::from_str(text)?;
        if map.width == 0 {
            return Err(MapError::ZeroWidth);
        }
        Ok(map)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn layer(&self, name: &str) -> Option<&TileLayer> {
        self.layers.iter().find(|layer| layer.name == name)
    }

    /// Pixel origins of every non-empty tile in `layer`.
    pub fn filled_tiles<'a>(&self, layer: &'a TileLayer) -> impl Iterator<Item = (f32, f32)> + 'a {
        let (width, tile_w, tile_h) = (self.width as usize, self.tilewidth, self.tileheight);
        layer
            .data
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile != 0)
            .map(move |(index, _)| {
                let column = (index % width) as u32;
                let row = (index / width) as u32;
                ((column * tile_w) as f32, (row * tile_h) as f32)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAP: &str = r#"{
        "tilewidth": 32, "tileheight": 16, "width": 3, "height": 2,
        "layers": [
            {"name": "Ground", "data": [1, 1, 1, 1, 1, 1]},
            {"name": "Collision", "data": [0, 5, 0, 0, 0, 7]},
            {"name": "Spawns", "type": "objectgroup"}
        ]
    }"#;

    #[test]
    fn test_parse_map() {
        let map = TileMap::from_json(MAP).unwrap();
        assert_eq!(map.tilewidth, 32);
        assert_eq!(map.height, Some(2));
        assert_eq!(map.layers.len(), 3);
        assert!(map.layer("Spawns").unwrap().data.is_empty());
    }

    #[test]
    fn test_filled_tiles_positions() {
        let map = TileMap::from_json(MAP).unwrap();
        let collision = map.layer("Collision").unwrap();
        let tiles: Vec<(f32, f32)> = map.filled_tiles(collision).collect();
        assert_eq!(tiles, vec![(32.0, 0.0), (64.0, 16.0)]);
    }

    #[test]
    fn test_rejects_zero_width() {
        let text = r#"{"tilewidth": 32, "tileheight": 32, "width": 0, "layers": []}"#;
        assert!(matches!(TileMap::from_json(text), Err(MapError::ZeroWidth)));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            TileMap::load("/nonexistent/map.json"),
            Err(MapError::Io(_))
        ));
    }
}
