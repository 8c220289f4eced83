use bitvec::{BitArr, array::BitArray};

pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;

/// Receives screen changes so a renderer can keep its own frame in sync.
pub trait ScreenObserver: Send {
    /// A pixel was drawn. `is_set` is its new state.
    fn on_pixel_changed(&mut self, x: usize, y: usize, is_set: bool);

    /// Every pixel was cleared.
    fn on_reset(&mut self);
}

/// The 64x32 monochrome frame.
pub struct Screen {
    pixels: BitArr!(for DISPLAY_WIDTH * DISPLAY_HEIGHT),
    observer: Option<Box<dyn ScreenObserver>>,
}

impl Screen {
    pub fn new() -> Self {
        Screen {
            pixels: BitArray::ZERO,
            observer: None,
        }
    }

    pub fn set_observer(&mut self, observer: Box<dyn ScreenObserver>) {
        self.observer = Some(observer);
    }

    pub fn reset(&mut self) {
        self.pixels.fill(false);
        if let Some(observer) = self.observer.as_mut() {
            observer.on_reset();
        }
    }

    /// XORs sprite `rows` onto the frame with its top-left corner at (`x`, `y`),
    /// wrapping around both edges. Zero bits leave the frame alone. Returns
    /// true if any drawn bit landed on a pixel that was already set.
    pub fn draw(&mut self, x: usize, y: usize, rows: &[u8]) -> bool {
        let mut collision = false;

        for (j, &row) in rows.iter().enumerate() {
            for i in 0..8 {
                if (row >> (7 - i)) & 1 == 0 {
                    continue;
                }

                let px = (x + i) % DISPLAY_WIDTH;
                let py = (y + j) % DISPLAY_HEIGHT;
                let index = py * DISPLAY_WIDTH + px;

                let existing = self.pixels[index];
                collision |= existing;
                self.pixels.set(index, !existing);

                if let Some(observer) = self.observer.as_mut() {
                    observer.on_pixel_changed(px, py, !existing);
                }
            }
        }
        collision
    }

    /// # Panics
    ///
    /// Panics if the coordinate is off screen.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        assert!(x < DISPLAY_WIDTH && y < DISPLAY_HEIGHT, "pixel ({x}, {y}) off screen");
        self.pixels[y * DISPLAY_WIDTH + x]
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.count_ones()
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new()
    }
}
