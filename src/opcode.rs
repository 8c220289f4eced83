use std::fmt;

/// One 16-bit instruction word, split into the fields instructions use.
///
/// For an opcode `0xOXYN`:
/// - `op` is the family selector `O`
/// - `x`, `y` are register operands
/// - `n` is a 4-bit immediate
/// - `nn` is the low byte
/// - `nnn` is a 12-bit address, `X` followed by the low byte
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    /// Combines two consecutive memory bytes, big-endian.
    pub fn from_bytes(high: u8, low: u8) -> Self {
        Opcode(u16::from(high) << 8 | u16::from(low))
    }

    pub fn high(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn low(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    pub fn op(self) -> u8 {
        self.high() >> 4
    }

    pub fn x(self) -> usize {
        usize::from(self.high() & 0x0F)
    }

    pub fn y(self) -> usize {
        usize::from(self.low() >> 4)
    }

    pub fn n(self) -> u8 {
        self.low() & 0x0F
    }

    pub fn nn(self) -> u8 {
        self.low()
    }

    pub fn nnn(self) -> u16 {
        (self.x() as u16) << 8 | u16::from(self.low())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06X}", self.0)
    }
}
