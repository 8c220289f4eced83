use std::sync::mpsc::{Receiver, TryRecvError};

pub const NUM_KEYS: usize = 16;

/// A key transition on the hex keypad, already mapped to its index 0x0-0xF.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyEvent {
    Down(u8),
    Up(u8),
}

/// Key-down state of the 16-key hex keypad.
///
/// State is changed either directly or through a connected event channel.
/// The keyboard is the only consumer of that channel; queued events are
/// applied by [`Keyboard::poll`].
pub struct Keyboard {
    keys: [bool; NUM_KEYS],
    input: Option<Receiver<KeyEvent>>,
}

impl Keyboard {
    pub fn new() -> Self {
        Keyboard {
            keys: [false; NUM_KEYS],
            input: None,
        }
    }

    pub fn connect(&mut self, input: Receiver<KeyEvent>) {
        self.input = Some(input);
    }

    /// Applies every queued event without blocking.
    pub fn poll(&mut self) {
        let Some(input) = self.input.as_ref() else {
            return;
        };

        let mut events = Vec::new();
        let disconnected = loop {
            match input.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break false,
                Err(TryRecvError::Disconnected) => break true,
            }
        };
        if disconnected {
            log::debug!("keyboard input disconnected");
            self.input = None;
        }

        for event in events {
            self.apply(event);
        }
    }

    pub fn apply(&mut self, event: KeyEvent) {
        log::debug!("keyboard event: {event:?}");
        match event {
            KeyEvent::Down(key) => self.key_down(key),
            KeyEvent::Up(key) => self.key_up(key),
        }
    }

    pub fn key_down(&mut self, key: u8) {
        if let Some(state) = self.keys.get_mut(usize::from(key)) {
            *state = true;
        }
    }

    pub fn key_up(&mut self, key: u8) {
        if let Some(state) = self.keys.get_mut(usize::from(key)) {
            *state = false;
        }
    }

    pub fn pressed(&self, key: u8) -> bool {
        self.keys.get(usize::from(key)).copied().unwrap_or(false)
    }

    /// Lowest-numbered key currently held down.
    pub fn first_pressed(&self) -> Option<u8> {
        self.keys.iter().position(|&down| down).map(|key| key as u8)
    }

    pub fn reset(&mut self) {
        self.keys = [false; NUM_KEYS];
    }
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;

    #[test]
    fn test_down_and_up() {
        let mut keyboard = Keyboard::new();
        keyboard.key_down(0xA);
        assert!(keyboard.pressed(0xA));
        assert!(!keyboard.pressed(0xB));

        keyboard.key_up(0xA);
        assert!(!keyboard.pressed(0xA));
    }

    #[test]
    fn test_out_of_range_keys_are_ignored() {
        let mut keyboard = Keyboard::new();
        keyboard.key_down(16);
        keyboard.key_down(0xFF);
        keyboard.key_up(200);

        assert_eq!(keyboard.first_pressed(), None);
        assert!(!keyboard.pressed(16));
    }

    #[test]
    fn test_first_pressed_is_lowest() {
        let mut keyboard = Keyboard::new();
        assert_eq!(keyboard.first_pressed(), None);

        keyboard.key_down(0xC);
        keyboard.key_down(0x3);
        assert_eq!(keyboard.first_pressed(), Some(0x3));

        keyboard.key_up(0x3);
        assert_eq!(keyboard.first_pressed(), Some(0xC));
    }

    #[test]
    fn test_reset_clears_keys() {
        let mut keyboard = Keyboard::new();
        keyboard.key_down(0x0);
        keyboard.key_down(0xF);
        keyboard.reset();
        assert_eq!(keyboard.first_pressed(), None);
    }

    #[test]
    fn test_poll_applies_events_in_order() {
        let (tx, rx) = mpsc::channel();
        let mut keyboard = Keyboard::new();
        keyboard.connect(rx);

        tx.send(KeyEvent::Down(0x5)).unwrap();
        tx.send(KeyEvent::Down(0x7)).unwrap();
        tx.send(KeyEvent::Up(0x5)).unwrap();
        assert_eq!(keyboard.first_pressed(), None);

        keyboard.poll();
        assert!(!keyboard.pressed(0x5));
        assert!(keyboard.pressed(0x7));
    }

    #[test]
    fn test_poll_from_another_thread() {
        let (tx, rx) = mpsc::channel();
        let mut keyboard = Keyboard::new();
        keyboard.connect(rx);

        std::thread::spawn(move || {
            tx.send(KeyEvent::Down(0x9)).unwrap();
        })
        .join()
        .unwrap();

        keyboard.poll();
        assert!(keyboard.pressed(0x9));
        // The sender was dropped with the thread.
        assert!(keyboard.input.is_none());

        keyboard.poll();
        assert!(keyboard.pressed(0x9));
    }
}
