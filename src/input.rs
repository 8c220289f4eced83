use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use chip8::KeyEvent;
use chip8::keyboard::NUM_KEYS;
use crossterm::event::{KeyCode, KeyEventKind};

/// Left-hand 4x4 block of a QWERTY keyboard onto the hex keypad:
///
/// ```text
/// 1 2 3 4        1 2 3 C
/// Q W E R   ->   4 5 6 D
/// A S D F        7 8 9 E
/// Z X C V        A 0 B F
/// ```
pub const KEYMAP: [(char, u8); NUM_KEYS] = [
    ('1', 0x1),
    ('2', 0x2),
    ('3', 0x3),
    ('4', 0xC),
    ('q', 0x4),
    ('w', 0x5),
    ('e', 0x6),
    ('r', 0xD),
    ('a', 0x7),
    ('s', 0x8),
    ('d', 0x9),
    ('f', 0xE),
    ('z', 0xA),
    ('x', 0x0),
    ('c', 0xB),
    ('v', 0xF),
];

/// Without release events a key counts as held this long after its last
/// press or auto-repeat.
const HOLD: Duration = Duration::from_millis(150);

pub fn key_index(c: char) -> Option<u8> {
    let c = c.to_ascii_lowercase();
    KEYMAP.iter().find(|(key, _)| *key == c).map(|&(_, index)| index)
}

#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Turns host key presses into keypad events for the CPU.
pub struct Input {
    events: Sender<KeyEvent>,
    held: [Option<Instant>; NUM_KEYS],
    reports_release: bool,
    quit: Arc<AtomicBool>,
    hooked: bool,
}

impl Input {
    /// Keys come from terminal events. `reports_release` says whether the
    /// terminal sends key release events.
    pub fn terminal(events: Sender<KeyEvent>, reports_release: bool) -> Self {
        Input {
            events,
            held: [None; NUM_KEYS],
            reports_release,
            quit: Arc::new(AtomicBool::new(false)),
            hooked: false,
        }
    }

    /// Keys come from a global keyboard hook thread. Terminal events are only
    /// checked for Esc.
    #[cfg(feature = "global-keys")]
    pub fn global(events: Sender<KeyEvent>) -> Self {
        let input = Input {
            hooked: true,
            ..Input::terminal(events.clone(), true)
        };
        hook::spawn(events, input.quit.clone());
        input
    }

    pub fn quit_requested(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    pub fn handle(&mut self, event: crossterm::event::KeyEvent, now: Instant) -> Flow {
        let key = match event.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char(c) if !self.hooked => key_index(c),
            _ => None,
        };
        let Some(key) = key else {
            return Flow::Continue;
        };

        let held = &mut self.held[usize::from(key)];
        match event.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if held.replace(now).is_none() {
                    let _ = self.events.send(KeyEvent::Down(key));
                }
            }
            KeyEventKind::Release => {
                if held.take().is_some() {
                    let _ = self.events.send(KeyEvent::Up(key));
                }
            }
        }
        Flow::Continue
    }

    /// Releases keys whose hold time ran out. Does nothing when the terminal
    /// reports releases itself.
    pub fn expire(&mut self, now: Instant) {
        if self.reports_release {
            return;
        }
        for (key, held) in self.held.iter_mut().enumerate() {
            if held.is_some_and(|since| now.duration_since(since) >= HOLD) {
                *held = None;
                let _ = self.events.send(KeyEvent::Up(key as u8));
            }
        }
    }
}

#[cfg(feature = "global-keys")]
mod hook {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::mpsc::Sender;

    use chip8::KeyEvent;
    use rdev::{EventType, Key};

    fn key_index(key: Key) -> Option<u8> {
        let c = match key {
            Key::Num1 => '1',
            Key::Num2 => '2',
            Key::Num3 => '3',
            Key::Num4 => '4',
            Key::KeyQ => 'q',
            Key::KeyW => 'w',
            Key::KeyE => 'e',
            Key::KeyR => 'r',
            Key::KeyA => 'a',
            Key::KeyS => 's',
            Key::KeyD => 'd',
            Key::KeyF => 'f',
            Key::KeyZ => 'z',
            Key::KeyX => 'x',
            Key::KeyC => 'c',
            Key::KeyV => 'v',
            _ => return None,
        };
        super::key_index(c)
    }

    pub fn spawn(events: Sender<KeyEvent>, quit: Arc<AtomicBool>) {
        std::thread::spawn(move || {
            let result = rdev::listen(move |event| match event.event_type {
                EventType::KeyPress(Key::Escape) => quit.store(true, Ordering::SeqCst),
                EventType::KeyPress(key) => {
                    if let Some(index) = key_index(key) {
                        let _ = events.send(KeyEvent::Down(index));
                    }
                }
                EventType::KeyRelease(key) => {
                    if let Some(index) = key_index(key) {
                        let _ = events.send(KeyEvent::Up(index));
                    }
                }
                _ => {}
            });
            if let Err(err) = result {
                log::error!("keyboard hook stopped: {err:?}");
            }
        });
    }
}
