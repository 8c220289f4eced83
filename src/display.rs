use std::sync::{Arc, Mutex, MutexGuard};

use bitvec::{BitArr, array::BitArray};
use chip8::ScreenObserver;
use chip8::screen::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Flex, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
};

use crate::input::KEYMAP;

const LIT: char = '█';
const UNLIT: char = ' ';

/// The renderer's copy of the frame, kept in sync through screen callbacks.
pub struct TerminalDisplay {
    pixels: BitArr!(for DISPLAY_WIDTH * DISPLAY_HEIGHT),
}

impl TerminalDisplay {
    pub fn new() -> Self {
        TerminalDisplay {
            pixels: BitArray::ZERO,
        }
    }

    /// One line of block characters per pixel row.
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(DISPLAY_WIDTH * DISPLAY_HEIGHT + DISPLAY_HEIGHT);
        for row in self.pixels.chunks(DISPLAY_WIDTH) {
            text.extend(row.iter().map(|pixel| if *pixel { LIT } else { UNLIT }));
            text.push('\n');
        }
        text
    }
}

/// Handle given to the CPU as its screen observer while the render loop
/// keeps a clone to draw from.
#[derive(Clone)]
pub struct SharedDisplay(Arc<Mutex<TerminalDisplay>>);

impl SharedDisplay {
    pub fn new() -> Self {
        SharedDisplay(Arc::new(Mutex::new(TerminalDisplay::new())))
    }

    /// A panic while holding the lock cannot leave the bits half-written, so
    /// a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, TerminalDisplay> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn to_text(&self) -> String {
        self.lock().to_text()
    }

    /// Draws the frame, centered and titled, above the keypad legend.
    pub fn render(&self, frame: &mut Frame, title: &str) {
        let [screen_row, legend_row] = Layout::vertical([
            Constraint::Length(DISPLAY_HEIGHT as u16 + 2),
            Constraint::Length(KEYPAD_ROWS as u16 + 3),
        ])
        .areas(frame.area());

        let screen = Paragraph::new(self.to_text())
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(Style::default().fg(Color::White));
        frame.render_widget(screen, centered(screen_row, DISPLAY_WIDTH as u16 + 2));

        let legend = Paragraph::new(keypad_legend())
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Keypad"))
            .style(Style::default().fg(Color::Yellow));
        frame.render_widget(legend, legend_row);
    }
}

const KEYPAD_ROWS: usize = 4;

fn centered(area: Rect, width: u16) -> Rect {
    let [middle] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    middle
}

/// Host keys next to the keypad keys they press, one keypad row per line.
fn keypad_legend() -> String {
    let mut legend = String::from("Key Mapping:");
    for row in KEYMAP.chunks(KEYMAP.len() / KEYPAD_ROWS) {
        let host: Vec<String> = row
            .iter()
            .map(|(c, _)| c.to_ascii_uppercase().to_string())
            .collect();
        let pad: Vec<String> = row.iter().map(|(_, key)| format!("{key:X}")).collect();
        legend.push_str(&format!("\n{}    →    {}", host.join(" "), pad.join(" ")));
    }
    legend
}

impl ScreenObserver for SharedDisplay {
    fn on_pixel_changed(&mut self, x: usize, y: usize, is_set: bool) {
        self.lock().pixels.set(y * DISPLAY_WIDTH + x, is_set);
    }

    fn on_reset(&mut self) {
        self.lock().pixels.fill(false);
    }
}

#[cfg(test)]
mod tests {
    use chip8::Cpu;

    use super::*;

    fn row(text: &str, y: usize) -> String {
        text.lines().nth(y).unwrap().to_string()
    }

    #[test]
    fn test_blank_frame() {
        let text = SharedDisplay::new().to_text();
        assert_eq!(text.lines().count(), DISPLAY_HEIGHT);
        assert!(text.lines().all(|line| line == " ".repeat(DISPLAY_WIDTH)));
    }

    #[test]
    fn test_mirrors_cpu_screen() {
        let display = SharedDisplay::new();
        let mut cpu = Cpu::default();
        cpu.set_screen_observer(Box::new(display.clone()));
        // Draw the "1" glyph at (0, 0).
        cpu.load(&[0x60, 0x01, 0xF0, 0x29, 0x61, 0x00, 0xD1, 0x15])
            .unwrap();
        for _ in 0..4 {
            cpu.next().unwrap();
        }

        let text = display.to_text();
        assert_eq!(row(&text, 0), format!("  █{}", " ".repeat(DISPLAY_WIDTH - 3)));
        assert_eq!(row(&text, 4), format!(" ███{}", " ".repeat(DISPLAY_WIDTH - 4)));

        for y in 0..DISPLAY_HEIGHT {
            for (x, c) in row(&text, y).chars().enumerate() {
                assert_eq!(c == LIT, cpu.screen().pixel(x, y));
            }
        }
    }

    #[test]
    fn test_reset_blanks() {
        let mut display = SharedDisplay::new();
        display.on_pixel_changed(63, 31, true);
        assert!(row(&display.to_text(), 31).ends_with(LIT));

        display.on_reset();
        assert!(!display.to_text().contains(LIT));
    }

    #[test]
    fn test_updates_survive_poisoned_lock() {
        let mut display = SharedDisplay::new();
        let shared = display.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.0.lock().unwrap();
            panic!("renderer crashed");
        })
        .join();
        assert!(display.0.is_poisoned());

        display.on_pixel_changed(0, 0, true);
        assert!(row(&display.to_text(), 0).starts_with(LIT));
        display.on_reset();
        assert!(!display.to_text().contains(LIT));
    }

    #[test]
    fn test_keypad_legend_rows() {
        let legend = keypad_legend();
        let lines: Vec<&str> = legend.lines().collect();
        assert_eq!(lines.len(), KEYPAD_ROWS + 1);
        assert_eq!(lines[1], "1 2 3 4    →    1 2 3 C");
        assert_eq!(lines[4], "Z X C V    →    A 0 B F");
    }
}
