use thiserror::Error;

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// Errors raised while loading or executing a CHIP-8 program.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), at most {max} bytes fit in memory")]
    RomTooLarge { size: usize, max: usize },

    #[error("failed to read ROM")]
    Io(#[from] std::io::Error),

    #[error("memory access out of bounds: {len} byte(s) at {addr:#05X}")]
    MemoryOutOfBounds { addr: usize, len: usize },

    #[error("unknown opcode: {0:#06X}")]
    UnknownOpcode(u16),

    #[error("stack underflow: return with an empty call stack")]
    StackUnderflow,

    #[error("stack overflow: call depth exceeds {depth}")]
    StackOverflow { depth: usize },
}

impl Chip8Error {
    /// Execution errors leave the machine in an undefined state. Load errors
    /// do not, the caller may reset and try another ROM.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Chip8Error::RomTooLarge { .. } | Chip8Error::Io(_))
    }
}
