use crate::error::{Chip8Error, Result};
use crate::opcode::Opcode;

/// A decoded CHIP-8 instruction. `x`/`y` are register indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1NNN
    Jump(u16),
    /// 2NNN
    Call(u16),
    /// 3XNN
    SkipEqImmediate { x: usize, nn: u8 },
    /// 4XNN
    SkipNeqImmediate { x: usize, nn: u8 },
    /// 5XY0
    SkipEqRegister { x: usize, y: usize },
    /// 6XNN
    SetImmediate { x: usize, nn: u8 },
    /// 7XNN
    AddImmediate { x: usize, nn: u8 },
    /// 8XY0
    SetXToY { x: usize, y: usize },
    /// 8XY1
    Or { x: usize, y: usize },
    /// 8XY2
    And { x: usize, y: usize },
    /// 8XY3
    Xor { x: usize, y: usize },
    /// 8XY4
    AddRegister { x: usize, y: usize },
    /// 8XY5
    SubtractYFromX { x: usize, y: usize },
    /// 8XY6
    ShiftRight { x: usize },
    /// 8XY7
    SubtractXFromY { x: usize, y: usize },
    /// 8XYE
    ShiftLeft { x: usize },
    /// 9XY0
    SkipNeqRegister { x: usize, y: usize },
    /// ANNN
    SetIndex(u16),
    /// BNNN
    JumpWithOffset(u16),
    /// CXNN
    Random { x: usize, nn: u8 },
    /// DXYN
    Draw { x: usize, y: usize, n: u8 },
    /// EX9E
    SkipIfKeyPressed { x: usize },
    /// EXA1
    SkipIfKeyNotPressed { x: usize },
    /// FX07
    ReadDelayTimer { x: usize },
    /// FX0A
    WaitForKey { x: usize },
    /// FX15
    SetDelayTimer { x: usize },
    /// FX18
    SetSoundTimer { x: usize },
    /// FX1E
    AddToIndex { x: usize },
    /// FX29
    FontChar { x: usize },
    /// FX33
    BinaryCodedDecimal { x: usize },
    /// FX55
    Store { x: usize },
    /// FX65
    Load { x: usize },
}

pub fn decode(opcode: Opcode) -> Result<Instruction> {
    use Instruction::*;

    let (x, y, n, nn, nnn) = (opcode.x(), opcode.y(), opcode.n(), opcode.nn(), opcode.nnn());

    let instruction = match opcode.op() {
        0x0 => match nnn {
            0x0E0 => ClearScreen,
            0x0EE => Return,
            _ => return Err(Chip8Error::UnknownOpcode(opcode.0)),
        },
        0x1 => Jump(nnn),
        0x2 => Call(nnn),
        0x3 => SkipEqImmediate { x, nn },
        0x4 => SkipNeqImmediate { x, nn },
        0x5 if n == 0 => SkipEqRegister { x, y },
        0x6 => SetImmediate { x, nn },
        0x7 => AddImmediate { x, nn },
        0x8 => match n {
            0x0 => SetXToY { x, y },
            0x1 => Or { x, y },
            0x2 => And { x, y },
            0x3 => Xor { x, y },
            0x4 => AddRegister { x, y },
            0x5 => SubtractYFromX { x, y },
            0x6 => ShiftRight { x },
            0x7 => SubtractXFromY { x, y },
            0xE => ShiftLeft { x },
            _ => return Err(Chip8Error::UnknownOpcode(opcode.0)),
        },
        0x9 if n == 0 => SkipNeqRegister { x, y },
        0xA => SetIndex(nnn),
        0xB => JumpWithOffset(nnn),
        0xC => Random { x, nn },
        0xD => Draw { x, y, n },
        0xE => match nn {
            0x9E => SkipIfKeyPressed { x },
            0xA1 => SkipIfKeyNotPressed { x },
            _ => return Err(Chip8Error::UnknownOpcode(opcode.0)),
        },
        0xF => match nn {
            0x07 => ReadDelayTimer { x },
            0x0A => WaitForKey { x },
            0x15 => SetDelayTimer { x },
            0x18 => SetSoundTimer { x },
            0x1E => AddToIndex { x },
            0x29 => FontChar { x },
            0x33 => BinaryCodedDecimal { x },
            0x55 => Store { x },
            0x65 => Load { x },
            _ => return Err(Chip8Error::UnknownOpcode(opcode.0)),
        },
        _ => return Err(Chip8Error::UnknownOpcode(opcode.0)),
    };
    Ok(instruction)
}
