use std::fs::File;
use std::path::Path;
use std::sync::mpsc::{self, Sender};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Chip8Error, Result};
use crate::instruction::{Instruction, decode};
use crate::keyboard::{KeyEvent, Keyboard};
use crate::memory::{FONT_ADDR, FONT_HEIGHT, Memory, PROGRAM_START};
use crate::opcode::Opcode;
use crate::screen::{Screen, ScreenObserver};

pub const NUM_REGISTERS: usize = 16;
pub const DEFAULT_STACK_DEPTH: usize = 16;

const FLAG: usize = 0xF;

/// Plays a tone when the sound timer runs out.
pub trait Speaker: Send {
    fn on_sound_trigger(&mut self);
}

/// Behavior that varies between CHIP-8 interpreters.
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of nested subroutine calls.
    pub stack_depth: usize,
    /// Whether FX55/FX65 leave I pointing past the last register transferred.
    pub load_store_increments_index: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            stack_depth: DEFAULT_STACK_DEPTH,
            load_store_increments_index: false,
        }
    }
}

/// The interpreter: registers, timers and call stack, plus the memory,
/// screen and keyboard they act on.
pub struct Cpu {
    config: Config,
    memory: Memory,
    screen: Screen,
    keyboard: Keyboard,
    speaker: Option<Box<dyn Speaker>>,
    registers: [u8; NUM_REGISTERS],
    index: u16,
    pc: u16,
    stack: Vec<u16>,
    delay_timer: u8,
    sound_timer: u8,
    rng: StdRng,
}

impl Cpu {
    pub fn new(config: Config) -> Self {
        Cpu {
            stack: Vec::new(),
            config,
            memory: Memory::new(),
            screen: Screen::new(),
            keyboard: Keyboard::new(),
            speaker: None,
            registers: [0; NUM_REGISTERS],
            index: 0,
            pc: PROGRAM_START as u16,
            delay_timer: 0,
            sound_timer: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn set_screen_observer(&mut self, observer: Box<dyn ScreenObserver>) {
        self.screen.set_observer(observer);
    }

    pub fn set_speaker(&mut self, speaker: Box<dyn Speaker>) {
        self.speaker = Some(speaker);
    }

    /// Connects a fresh key event channel and returns its sending half.
    pub fn key_sender(&mut self) -> Sender<KeyEvent> {
        let (tx, rx) = mpsc::channel();
        self.keyboard.connect(rx);
        tx
    }

    /// Makes CXNN reproducible.
    pub fn seed_rng(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn reset(&mut self) {
        log::debug!("cpu reset");
        self.registers = [0; NUM_REGISTERS];
        self.index = 0;
        self.pc = PROGRAM_START as u16;
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.stack.clear();
        self.memory.reset();
        self.screen.reset();
        self.keyboard.reset();
    }

    /// Copies a ROM image to the program area. A failed load writes nothing,
    /// but a successful one does not clear what a previous ROM left behind,
    /// so reset first.
    pub fn load(&mut self, rom: &[u8]) -> Result<()> {
        self.memory.load(rom)?;
        log::debug!("loaded {} byte ROM", rom.len());
        Ok(())
    }

    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        log::debug!("load {}", path.display());
        let size = self.memory.load_from(File::open(path)?)?;
        log::debug!("loaded {size} byte ROM");
        Ok(size)
    }

    /// Executes one instruction. Queued key events are applied first.
    ///
    /// Any error is fatal: the program is malformed and the machine state is
    /// no longer meaningful.
    pub fn next(&mut self) -> Result<()> {
        self.keyboard.poll();
        self.step()
            .inspect_err(|err| log::error!("halted at {:#05X}: {err}", self.pc))
    }

    /// Counts both timers down by one. Called at 60 Hz.
    pub fn ticker(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        if self.sound_timer == 1 {
            log::debug!("sound trigger");
            if let Some(speaker) = self.speaker.as_mut() {
                speaker.on_sound_trigger();
            }
        }
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.registers
    }

    pub fn index(&self) -> u16 {
        self.index
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn keyboard(&self) -> &Keyboard {
        &self.keyboard
    }

    pub fn keyboard_mut(&mut self) -> &mut Keyboard {
        &mut self.keyboard
    }

    fn step(&mut self) -> Result<()> {
        let opcode = self.fetch()?;
        log::trace!("{:#05X}: {opcode}", self.pc);
        self.execute(decode(opcode)?)
    }

    fn fetch(&self) -> Result<Opcode> {
        let bytes = self.memory.slice(usize::from(self.pc), 2)?;
        Ok(Opcode::from_bytes(bytes[0], bytes[1]))
    }

    fn advance(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }

    fn skip_if(&mut self, condition: bool) {
        self.pc = self.pc.wrapping_add(if condition { 4 } else { 2 });
    }

    /// Writes a result register, then VF. When `x` is VF the flag wins.
    fn set_with_flag(&mut self, x: usize, value: u8, flag: bool) {
        self.registers[x] = value;
        self.registers[FLAG] = u8::from(flag);
    }

    fn execute(&mut self, instruction: Instruction) -> Result<()> {
        use Instruction::*;

        let v = self.registers;

        match instruction {
            ClearScreen => {
                self.screen.reset();
                self.advance();
            }
            Return => {
                self.pc = self.stack.pop().ok_or(Chip8Error::StackUnderflow)?;
            }
            Jump(nnn) => self.pc = nnn,
            Call(nnn) => {
                if self.stack.len() >= self.config.stack_depth {
                    return Err(Chip8Error::StackOverflow {
                        depth: self.config.stack_depth,
                    });
                }
                self.stack.push(self.pc.wrapping_add(2));
                self.pc = nnn;
            }
            SkipEqImmediate { x, nn } => self.skip_if(v[x] == nn),
            SkipNeqImmediate { x, nn } => self.skip_if(v[x] != nn),
            SkipEqRegister { x, y } => self.skip_if(v[x] == v[y]),
            SkipNeqRegister { x, y } => self.skip_if(v[x] != v[y]),
            SetImmediate { x, nn } => {
                self.registers[x] = nn;
                self.advance();
            }
            AddImmediate { x, nn } => {
                self.registers[x] = v[x].wrapping_add(nn);
                self.advance();
            }
            SetXToY { x, y } => {
                self.registers[x] = v[y];
                self.advance();
            }
            Or { x, y } => {
                self.registers[x] = v[x] | v[y];
                self.advance();
            }
            And { x, y } => {
                self.registers[x] = v[x] & v[y];
                self.advance();
            }
            Xor { x, y } => {
                self.registers[x] = v[x] ^ v[y];
                self.advance();
            }
            AddRegister { x, y } => {
                let (sum, carry) = v[x].overflowing_add(v[y]);
                self.set_with_flag(x, sum, carry);
                self.advance();
            }
            SubtractYFromX { x, y } => {
                self.set_with_flag(x, v[x].wrapping_sub(v[y]), v[x] > v[y]);
                self.advance();
            }
            ShiftRight { x } => {
                self.set_with_flag(x, v[x] >> 1, v[x] & 0x01 != 0);
                self.advance();
            }
            SubtractXFromY { x, y } => {
                self.set_with_flag(x, v[y].wrapping_sub(v[x]), v[y] > v[x]);
                self.advance();
            }
            ShiftLeft { x } => {
                self.set_with_flag(x, v[x] << 1, v[x] & 0x80 != 0);
                self.advance();
            }
            SetIndex(nnn) => {
                self.index = nnn;
                self.advance();
            }
            JumpWithOffset(nnn) => self.pc = nnn + u16::from(v[0]),
            Random { x, nn } => {
                self.registers[x] = self.rng.random::<u8>() & nn;
                self.advance();
            }
            Draw { x, y, n } => {
                let rows = self.memory.slice(usize::from(self.index), usize::from(n))?;
                let collision = self
                    .screen
                    .draw(usize::from(v[x]), usize::from(v[y]), rows);
                self.registers[FLAG] = u8::from(collision);
                self.advance();
            }
            SkipIfKeyPressed { x } => self.skip_if(self.keyboard.pressed(v[x])),
            SkipIfKeyNotPressed { x } => self.skip_if(!self.keyboard.pressed(v[x])),
            ReadDelayTimer { x } => {
                self.registers[x] = self.delay_timer;
                self.advance();
            }
            WaitForKey { x } => {
                // PC stays put until a key is down, so this instruction repeats.
                if let Some(key) = self.keyboard.first_pressed() {
                    self.registers[x] = key;
                    self.advance();
                }
            }
            SetDelayTimer { x } => {
                self.delay_timer = v[x];
                self.advance();
            }
            SetSoundTimer { x } => {
                self.sound_timer = v[x];
                self.advance();
            }
            AddToIndex { x } => {
                self.index = self.index.wrapping_add(u16::from(v[x]));
                self.registers[FLAG] = u8::from(self.index > 0x0FFF);
                self.advance();
            }
            FontChar { x } => {
                self.index = (FONT_ADDR + FONT_HEIGHT * usize::from(v[x])) as u16;
                self.advance();
            }
            BinaryCodedDecimal { x } => {
                let digits = self.memory.slice_mut(usize::from(self.index), 3)?;
                digits.copy_from_slice(&[v[x] / 100, v[x] / 10 % 10, v[x] % 10]);
                self.advance();
            }
            Store { x } => {
                self.memory
                    .slice_mut(usize::from(self.index), x + 1)?
                    .copy_from_slice(&v[..=x]);
                self.finish_block_transfer(x);
            }
            Load { x } => {
                let values = self.memory.slice(usize::from(self.index), x + 1)?;
                self.registers[..=x].copy_from_slice(values);
                self.finish_block_transfer(x);
            }
        }
        Ok(())
    }

    fn finish_block_transfer(&mut self, x: usize) {
        if self.config.load_store_increments_index {
            self.index = self.index.wrapping_add(x as u16 + 1);
        }
        self.advance();
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
