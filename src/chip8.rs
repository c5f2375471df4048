use log::{debug, trace, warn};
use rand::prelude::*;
use rand::rngs::StdRng;
use std::fs;
use std::path::Path;

mod config;
mod display;
mod error;
mod keypad;
mod memory;

pub use config::{Config, ParseTimerModeError, TimerMode, DEFAULT_MEMORY_SIZE};
pub use display::{Framebuffer, HEIGHT, WIDTH};
pub use error::{ConfigError, Error, Fault};
pub use keypad::Keypad;
pub use memory::{Layout, FONTSET, PROGRAM_START, STACK_SLOTS};

use memory::{Memory, GLYPH_SIZE};

/// Both timers start here rather than at zero.
const TIMER_START: u8 = 60;

/// VF doubles as the carry/borrow/collision flag.
const FLAG: usize = 0xF;

/// Outcome of a single [`Chip8::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Continue,
    /// The program returned from its outermost routine.
    Halted,
    /// FX0A is waiting for a key; the same instruction runs again next step.
    AwaitingKey,
    Faulted(Fault),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
    Faulted(Fault),
}

// what an opcode handler asks the engine to do next
enum Flow {
    Next,
    Halt,
    Wait,
}

type OpcodeFn = fn(&mut Chip8) -> Result<Flow, Fault>;

/// A CHIP-8 VM.
///
/// VF is an ordinary register, but every flag-setting opcode (8XY4-8XYE,
/// DXYN, FX1E) overwrites it. Read it right after the opcode that set it.
pub struct Chip8 {
    opcode: u16, // current opcode
    memory: Memory,
    v: [u8; 16], // registers V0-VE (VF is flag for some instructions)
    i: u16,      // address register
    pc: u16,
    sp: usize, // call stack depth
    delay_timer: u8,
    sound_timer: u8,
    keys: Keypad, // sampled at the start of each step

    draw_flag: bool,
    state: State,
    timer_mode: TimerMode,
    rng: StdRng,
    opcode_fns: [OpcodeFn; 16],
}

impl Chip8 {
    /// Canonical 4K machine with `rom` loaded at 0x200.
    pub fn new(rom: &[u8]) -> Result<Self, ConfigError> {
        Self::with_config(Config::default(), rom)
    }

    pub fn with_config(config: Config, rom: &[u8]) -> Result<Self, ConfigError> {
        let layout = Layout::new(config.memory_size)?;
        let memory = Memory::new(layout, rom)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            opcode: 0,
            memory,
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START as u16,
            sp: 0,
            delay_timer: TIMER_START,
            sound_timer: TIMER_START,
            keys: Keypad::new(),

            draw_flag: false,
            state: State::Running,
            timer_mode: config.timer_mode,
            rng,
            opcode_fns: [
                Self::cls_ret, // 00E0, 00EE
                Self::jmp,     // 1NNN
                Self::call,    // 2NNN
                Self::eb,      // 3XNN
                Self::neb,     // 4XNN
                Self::er,      // 5XY0
                Self::ld,      // 6XNN
                Self::addb,    // 7XNN
                Self::alu,     // 8XY*
                Self::ner,     // 9XY0
                Self::si,      // ANNN
                Self::jmpo,    // BNNN
                Self::rng,     // CXNN
                Self::draw,    // DXYN
                Self::key,     // EX9E, EXA1
                Self::ex,      // FX**
            ],
        })
    }

    /// Read a raw ROM image from disk and build a VM around it.
    pub fn load_game<P: AsRef<Path>>(config: Config, path: P) -> Result<Self, Error> {
        let rom = fs::read(path)?;
        Ok(Self::with_config(config, &rom)?)
    }

    /// Execute one instruction. `keys` is the keypad as of this step; `None`
    /// means nothing is held.
    pub fn step(&mut self, keys: Option<&Keypad>) -> Status {
        match &self.state {
            State::Running => {}
            State::Halted => return Status::Halted,
            State::Faulted(fault) => return Status::Faulted(fault.clone()),
        }

        self.keys = keys.copied().unwrap_or_default();

        match self.execute() {
            Ok(Flow::Next) => {
                self.tick_per_instruction();
                Status::Continue
            }
            Ok(Flow::Wait) => {
                self.tick_per_instruction();
                Status::AwaitingKey
            }
            Ok(Flow::Halt) => {
                debug!("halted at {:03X}", self.pc);
                self.state = State::Halted;
                Status::Halted
            }
            Err(fault) => {
                warn!("{} (opcode {:04X} at {:03X})", fault, self.opcode, self.pc);
                self.state = State::Faulted(fault.clone());
                Status::Faulted(fault)
            }
        }
    }

    /// Step until the VM halts or faults, asking `keys` for the keypad before
    /// every step.
    pub fn run_to_completion<F>(&mut self, mut keys: F) -> Status
    where
        F: FnMut() -> Option<Keypad>,
    {
        loop {
            let pressed = keys();
            match self.step(pressed.as_ref()) {
                Status::Continue | Status::AwaitingKey => {}
                done => return done,
            }
        }
    }

    /// Count both timers down by one, stopping at zero.
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    fn tick_per_instruction(&mut self) {
        if self.timer_mode == TimerMode::PerInstruction {
            self.tick_timers();
        }
    }

    fn execute(&mut self) -> Result<Flow, Fault> {
        // two-byte opcodes
        self.opcode = self.memory.read_word(self.pc)?;
        trace!("{:03X}: {:04X}", self.pc, self.opcode);

        // running off the end of the program into zeroed memory
        if self.opcode == 0 {
            return Ok(Flow::Halt);
        }

        let f = self.opcode_fns[usize::from(self.opcode >> 12)];
        f(self)
    }

    pub fn draw_flag(&self) -> bool {
        self.draw_flag
    }

    /// Whether the screen changed since the last call.
    pub fn take_draw_flag(&mut self) -> bool {
        std::mem::replace(&mut self.draw_flag, false)
    }

    pub fn framebuffer(&self) -> Framebuffer {
        Framebuffer::from_slice(self.memory.framebuffer())
    }

    pub fn is_pixel_set(&self, x: usize, y: usize) -> bool {
        display::is_set(self.memory.framebuffer(), x, y)
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn sound_flag(&self) -> bool {
        self.sound_timer > 0
    }

    pub fn registers(&self) -> [u8; 16] {
        self.v
    }

    pub fn address_register(&self) -> u16 {
        self.i
    }

    pub fn program_counter(&self) -> u16 {
        self.pc
    }

    pub fn stack_depth(&self) -> usize {
        self.sp
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn memory(&self) -> &[u8] {
        self.memory.as_bytes()
    }

    pub fn layout(&self) -> Layout {
        self.memory.layout()
    }

    fn x(&self) -> usize {
        usize::from((self.opcode & 0xF00) >> 8)
    }

    fn y(&self) -> usize {
        usize::from((self.opcode & 0xF0) >> 4)
    }

    fn nn(&self) -> u8 {
        (self.opcode & 0xFF) as u8
    }

    fn nnn(&self) -> u16 {
        self.opcode & 0xFFF
    }

    fn advance(&mut self, by: u16) -> Result<Flow, Fault> {
        self.pc = self
            .pc
            .checked_add(by)
            .ok_or(Fault::MemoryOutOfBounds {
                address: usize::from(self.pc) + usize::from(by),
            })?;
        Ok(Flow::Next)
    }

    fn skip_if(&mut self, cond: bool) -> Result<Flow, Fault> {
        self.advance(if cond { 4 } else { 2 })
    }

    fn reserved(&mut self) -> Result<Flow, Fault> {
        debug!("ignoring reserved opcode {:04X} at {:03X}", self.opcode, self.pc);
        self.advance(2)
    }

    fn push(&mut self, addr: u16) -> Result<(), Fault> {
        if self.sp == STACK_SLOTS {
            return Err(Fault::StackOverflow {
                pc: self.pc,
                depth: self.sp,
            });
        }
        self.memory.set_stack_slot(self.sp, addr);
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Result<u16, Fault> {
        if self.sp == 0 {
            return Err(Fault::StackUnderflow { pc: self.pc });
        }
        self.sp -= 1;
        Ok(self.memory.stack_slot(self.sp))
    }

    // the framebuffer is plain memory, so stores through I can redraw it
    fn store(&mut self, addr: usize, data: &[u8]) -> Result<(), Fault> {
        self.memory.write(addr, data)?;
        if self.memory.layout().overlaps_display(addr, data.len()) {
            self.draw_flag = true;
        }
        Ok(())
    }

    fn cls_ret(&mut self) -> Result<Flow, Fault> {
        match self.opcode {
            0x00E0 => {
                // 00E0
                // clear screen
                display::clear(self.memory.framebuffer_mut());
                self.draw_flag = true;
                self.advance(2)
            }
            0x00EE => {
                // 00EE
                // return from subroutine; returning from the entry routine ends the program
                if self.sp == 0 {
                    return Ok(Flow::Halt);
                }
                self.pc = self.pop()?;
                Ok(Flow::Next)
            }
            _ => self.reserved(),
        }
    }

    fn jmp(&mut self) -> Result<Flow, Fault> {
        // 1NNN
        // jump to NNN
        self.pc = self.nnn();
        Ok(Flow::Next)
    }

    fn call(&mut self) -> Result<Flow, Fault> {
        // 2NNN
        // call subroutine at NNN
        let ret = self.pc.checked_add(2).ok_or(Fault::MemoryOutOfBounds {
            address: usize::from(self.pc) + 2,
        })?;
        self.push(ret)?;
        self.pc = self.nnn();
        Ok(Flow::Next)
    }

    fn eb(&mut self) -> Result<Flow, Fault> {
        // 3XNN
        // skip if VX == NN
        let cond = self.v[self.x()] == self.nn();
        self.skip_if(cond)
    }

    fn neb(&mut self) -> Result<Flow, Fault> {
        // 4XNN
        // skip if VX != NN
        let cond = self.v[self.x()] != self.nn();
        self.skip_if(cond)
    }

    fn er(&mut self) -> Result<Flow, Fault> {
        // 5XY0
        // skip if VX == VY
        let cond = self.v[self.x()] == self.v[self.y()];
        self.skip_if(cond)
    }

    fn ld(&mut self) -> Result<Flow, Fault> {
        // 6XNN
        // set VX to NN
        let x = self.x();
        self.v[x] = self.nn();
        self.advance(2)
    }

    fn addb(&mut self) -> Result<Flow, Fault> {
        // 7XNN
        // add NN to VX (no carry)
        let x = self.x();
        self.v[x] = self.v[x].wrapping_add(self.nn());
        self.advance(2)
    }

    fn alu(&mut self) -> Result<Flow, Fault> {
        let x = self.x();
        // operands are read up front so VF can be either of them
        let vx = self.v[x];
        let vy = self.v[self.y()];
        let (result, flag) = match self.opcode & 0xF {
            // 8XY0
            // set VX to VY
            0x0 => (vy, None),
            // 8XY1
            // set VX to VX OR VY
            0x1 => (vx | vy, None),
            // 8XY2
            // set VX to VX AND VY
            0x2 => (vx & vy, None),
            // 8XY3
            // set VX to VX XOR VY
            0x3 => (vx ^ vy, None),
            0x4 => {
                // 8XY4
                // add VY to VX (set VF = 1 if there's a carry)
                let (sum, carry) = vx.overflowing_add(vy);
                (sum, Some(u8::from(carry)))
            }
            0x5 => {
                // 8XY5
                // sub VY from VX (set VF = 0 if there's a borrow and 1 if not)
                let (diff, borrow) = vx.overflowing_sub(vy);
                (diff, Some(u8::from(!borrow)))
            }
            0x6 => {
                // 8XY6
                // store the LSB of VX in VF and shift VX one to the right
                // VF goes first, so 8FY6 shifts the flag
                self.v[FLAG] = vx & 0x1;
                self.v[x] >>= 1;
                return self.advance(2);
            }
            0x7 => {
                // 8XY7
                // set VX to VY - VX (set VF = 0 if there's a borrow and 1 if not)
                let (diff, borrow) = vy.overflowing_sub(vx);
                (diff, Some(u8::from(!borrow)))
            }
            0xE => {
                // 8XYE
                // store the MSB of VX in VF and shift VX one to the left
                self.v[FLAG] = vx >> 7;
                self.v[x] <<= 1;
                return self.advance(2);
            }
            _ => return self.reserved(),
        };

        self.v[x] = result;
        if let Some(flag) = flag {
            self.v[FLAG] = flag;
        }
        self.advance(2)
    }

    fn ner(&mut self) -> Result<Flow, Fault> {
        // 9XY0
        // skip if VX != VY
        let cond = self.v[self.x()] != self.v[self.y()];
        self.skip_if(cond)
    }

    fn si(&mut self) -> Result<Flow, Fault> {
        // ANNN
        // set I to NNN
        self.i = self.nnn();
        self.advance(2)
    }

    fn jmpo(&mut self) -> Result<Flow, Fault> {
        // BNNN
        // jump to NNN + V0
        self.pc = self.nnn() + u16::from(self.v[0]);
        Ok(Flow::Next)
    }

    fn rng(&mut self) -> Result<Flow, Fault> {
        // CXNN
        // Set VX = RNG[0, 256) & NN
        let x = self.x();
        self.v[x] = self.rng.gen::<u8>() & self.nn();
        self.advance(2)
    }

    fn draw(&mut self) -> Result<Flow, Fault> {
        // DXYN
        // draw a sprite at VX,VY with a width of 8 pixels and a height of N pixels
        // each row of 8 pixels is bit-coded in memory starting at I
        // VF is set to 1 if any currently drawn pixels are unset during this
        let vx = usize::from(self.v[self.x()]) % WIDTH;
        let vy = usize::from(self.v[self.y()]) % HEIGHT;
        let height = usize::from(self.opcode & 0xF);

        let mut rows = [0; 15];
        rows[..height].copy_from_slice(self.memory.read(usize::from(self.i), height)?);

        let fb = self.memory.framebuffer_mut();
        let collision = display::draw_sprite(fb, vx, vy, &rows[..height]);
        self.v[FLAG] = u8::from(collision);
        self.draw_flag = true;
        self.advance(2)
    }

    fn key(&mut self) -> Result<Flow, Fault> {
        let pressed = self.keys.is_pressed(self.v[self.x()]);
        match self.opcode & 0xFF {
            // EX9E
            // skip if key stored in VX is pressed
            0x9E => self.skip_if(pressed),
            // EXA1
            // skip if key stored in VX isn't pressed
            0xA1 => self.skip_if(!pressed),
            _ => self.reserved(),
        }
    }

    fn ex(&mut self) -> Result<Flow, Fault> {
        let x = self.x();
        let i = usize::from(self.i);
        match self.opcode & 0xFF {
            0x07 => {
                // FX07
                // set VX to delay timer
                self.v[x] = self.delay_timer;
            }
            0x0A => {
                // FX0A
                // store next key press in VX; repeat this instruction until one arrives
                match self.keys.first_pressed() {
                    Some(key) => self.v[x] = key,
                    None => return Ok(Flow::Wait),
                }
            }
            0x15 => {
                // FX15
                // set delay timer to VX
                self.delay_timer = self.v[x];
            }
            0x18 => {
                // FX18
                // set sound timer to VX
                self.sound_timer = self.v[x];
            }
            0x1E => {
                // FX1E
                // add VX to I, VF = 1 if I leaves the address space
                let sum = usize::from(self.i) + usize::from(self.v[x]);
                self.v[FLAG] = u8::from(sum >= self.memory.layout().size());
                self.i = self.i.wrapping_add(u16::from(self.v[x]));
            }
            0x29 => {
                // FX29
                // set I to location in memory of sprite for character in VX
                self.i = u16::from(self.v[x]) * GLYPH_SIZE;
            }
            0x33 => {
                // FX33
                // store the BCD representation of VX at I
                // so 193 becomes [1, 9, 3] in memory at I
                let vx = self.v[x];
                self.store(i, &[vx / 100, (vx / 10) % 10, vx % 10])?;
            }
            0x55 => {
                // FX55
                // store V0 to VX (inclusive) in memory at I
                let regs = self.v;
                self.store(i, &regs[..=x])?;
            }
            0x65 => {
                // FX65
                // fill V0 to VX (inclusive) from memory at I
                let bytes = self.memory.read(i, x + 1)?;
                self.v[..=x].copy_from_slice(bytes);
            }
            _ => return self.reserved(),
        }
        self.advance(2)
    }
}
