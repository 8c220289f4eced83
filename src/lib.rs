//! CHIP-8 interpreter core.
//!
//! [`Cpu`] owns the machine: memory, registers, timers, call stack, screen
//! and keyboard. A driver calls [`Cpu::next`] at the instruction rate and
//! [`Cpu::ticker`] at [`clock::TIMER_HZ`]. Presentation stays outside: the
//! screen reports changes to a [`ScreenObserver`], sound timer expiry goes
//! to a [`Speaker`], and key events arrive as [`KeyEvent`]s.

pub mod clock;
pub mod cpu;
pub mod error;
pub mod instruction;
pub mod keyboard;
pub mod memory;
pub mod opcode;
pub mod screen;

pub use cpu::{Config, Cpu, Speaker};
pub use error::{Chip8Error, Result};
pub use keyboard::KeyEvent;
pub use screen::ScreenObserver;
