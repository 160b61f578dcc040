/// Tile edge in pixels. 64×64 × 8 bytes of escape values = 32 KB per tile.
pub const TILE_SIZE: u32 = 64;

/// A rectangular block of the canvas rendered as one unit of parallel work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// Pixel x of the top-left corner.
    pub x: u32,
    /// Pixel y of the top-left corner.
    pub y: u32,
    /// May be smaller than [`TILE_SIZE`] at the right edge.
    pub width: u32,
    /// May be smaller than [`TILE_SIZE`] at the bottom edge.
    pub height: u32,
}

impl Tile {
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Cover a `width × height` canvas with row-major tiles.
pub fn build_tile_grid(width: u32, height: u32) -> Vec<Tile> {
    let mut tiles = Vec::new();
    let mut y = 0;
    while y < height {
        let th = TILE_SIZE.min(height - y);
        let mut x = 0;
        while x < width {
            let tw = TILE_SIZE.min(width - x);
            tiles.push(Tile {
                x,
                y,
                width: tw,
                height: th,
            });
            x += tw;
        }
        y += th;
    }
    tiles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_covers_canvas_exactly_once() {
        let (w, h) = (200, 150);
        let tiles = build_tile_grid(w, h);
        let mut covered = vec![false; (w * h) as usize];
        for tile in &tiles {
            assert!(tile.width <= TILE_SIZE && tile.height <= TILE_SIZE);
            for py in tile.y..tile.y + tile.height {
                for px in tile.x..tile.x + tile.width {
                    let idx = (py * w + px) as usize;
                    assert!(!covered[idx], "pixel ({px}, {py}) covered twice");
                    covered[idx] = true;
                }
            }
        }
        assert!(covered.iter().all(|&c| c));
    }

    #[test]
    fn edge_tiles_are_clipped() {
        let tiles = build_tile_grid(70, 64);
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[1], Tile { x: 64, y: 0, width: 6, height: 64 });
    }

    #[test]
    fn empty_canvas_has_no_tiles() {
        assert!(build_tile_grid(0, 100).is_empty());
        assert!(build_tile_grid(100, 0).is_empty());
    }
}
