use fractour_core::INTERIOR;

use crate::tile::Tile;

/// Per-pixel normalized escape values for a full frame.
///
/// This is the renderer's raw output. Keeping it separate from colored pixels
/// lets the palette change without evaluating the fractal again.
#[derive(Debug, Clone, PartialEq)]
pub struct EscapeBuffer {
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
    /// Row-major, one value in `[0, 1]` per pixel.
    pub data: Vec<f64>,
}

impl EscapeBuffer {
    /// A buffer where every pixel is interior.
    pub fn new(width: u32, height: u32, max_iterations: u32) -> Self {
        Self {
            width,
            height,
            max_iterations,
            data: vec![INTERIOR; width as usize * height as usize],
        }
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get((y * self.width + x) as usize).copied()
    }

    /// Copy tile values into their region of the buffer.
    pub fn blit_tile(&mut self, tile: &Tile, tile_data: &[f64]) {
        debug_assert_eq!(tile_data.len(), tile.pixel_count());
        for py in 0..tile.height {
            let buf_y = tile.y + py;
            if buf_y >= self.height {
                break;
            }
            let dst_start = (buf_y * self.width + tile.x) as usize;
            let src_start = (py * tile.width) as usize;
            let copy_w = tile.width.min(self.width - tile.x) as usize;
            self.data[dst_start..dst_start + copy_w]
                .copy_from_slice(&tile_data[src_start..src_start + copy_w]);
        }
    }

    /// Move the content by a pixel offset, keeping what still overlaps.
    ///
    /// Positive `dx` moves content right and positive `dy` moves it down.
    /// Exposed pixels become interior.
    pub fn shift(&mut self, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 {
            return;
        }
        let w = self.width as i32;
        let h = self.height as i32;
        let mut shifted = vec![INTERIOR; self.data.len()];

        let x_start = dx.max(0) as usize;
        let x_end = (w + dx).min(w).max(0) as usize;
        if x_start >= x_end {
            self.data = shifted;
            return;
        }
        let count = x_end - x_start;
        let src_x_start = (x_start as i32 - dx) as usize;

        for dst_y in 0..h {
            let src_y = dst_y - dy;
            if src_y < 0 || src_y >= h {
                continue;
            }
            let dst_row = dst_y as usize * self.width as usize;
            let src_row = src_y as usize * self.width as usize;
            shifted[dst_row + x_start..dst_row + x_end]
                .copy_from_slice(&self.data[src_row + src_x_start..src_row + src_x_start + count]);
        }

        self.data = shifted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(w: u32, h: u32) -> EscapeBuffer {
        let mut buf = EscapeBuffer::new(w, h, 100);
        for (i, v) in buf.data.iter_mut().enumerate() {
            *v = i as f64 / 100.0;
        }
        buf
    }

    #[test]
    fn new_buffer_is_interior() {
        let buf = EscapeBuffer::new(3, 2, 50);
        assert_eq!(buf.data, vec![INTERIOR; 6]);
        assert_eq!(buf.get(3, 0), None);
    }

    #[test]
    fn blit_places_tile() {
        let mut buf = EscapeBuffer::new(8, 8, 10);
        let tile = Tile { x: 2, y: 1, width: 3, height: 2 };
        buf.blit_tile(&tile, &[0.25; 6]);
        assert_eq!(buf.get(2, 1), Some(0.25));
        assert_eq!(buf.get(4, 2), Some(0.25));
        assert_eq!(buf.get(5, 2), Some(INTERIOR));
        assert_eq!(buf.get(0, 0), Some(INTERIOR));
    }

    #[test]
    fn shift_right_and_down() {
        let mut buf = ramp(4, 3);
        let before = buf.clone();
        buf.shift(1, 1);
        assert_eq!(buf.get(0, 0), Some(INTERIOR));
        assert_eq!(buf.get(1, 1), before.get(0, 0));
        assert_eq!(buf.get(3, 2), before.get(2, 1));
    }

    #[test]
    fn shift_past_edge_clears() {
        let mut buf = ramp(4, 3);
        buf.shift(-10, 0);
        assert!(buf.data.iter().all(|v| *v == INTERIOR));
    }
}
