use super::display::FRAMEBUFFER_SIZE;
use super::error::{ConfigError, Fault};

pub const FONTSET: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Bytes per font glyph; FX29 multiplies by this.
pub const GLYPH_SIZE: u16 = 5;

/// CHIP-8 systems had the interpreter in the first 512 bytes of memory, so
/// programs start at 0x200.
pub const PROGRAM_START: usize = 0x200;

/// Call stack depth.
pub const STACK_SLOTS: usize = 12;

/// Bytes set aside for the call stack between program and display.
pub const RESERVED_SIZE: usize = 96;

/// PC and I are 16 bits wide.
pub const MAX_MEMORY_SIZE: usize = 0x10000;

/// Region boundaries, all derived from the memory size.
///
/// ```text
/// [0, 80)                      font
/// [0x200, call_stack_start)    program
/// [call_stack_start, +96)      call stack (reserved)
/// [display_start, size)        framebuffer
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    size: usize,
    call_stack_start: usize,
    display_start: usize,
}

impl Layout {
    pub fn new(size: usize) -> Result<Self, ConfigError> {
        let min = PROGRAM_START + RESERVED_SIZE + FRAMEBUFFER_SIZE;
        if size <= min {
            return Err(ConfigError::MemoryTooSmall { size, min });
        }
        if size > MAX_MEMORY_SIZE {
            return Err(ConfigError::MemoryTooLarge {
                size,
                max: MAX_MEMORY_SIZE,
            });
        }

        let display_start = size - FRAMEBUFFER_SIZE;
        Ok(Self {
            size,
            call_stack_start: display_start - RESERVED_SIZE,
            display_start,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn program_start(&self) -> usize {
        PROGRAM_START
    }

    pub fn program_end(&self) -> usize {
        self.call_stack_start
    }

    pub fn max_rom_size(&self) -> usize {
        self.program_end() - PROGRAM_START
    }

    pub fn call_stack_start(&self) -> usize {
        self.call_stack_start
    }

    pub fn display_start(&self) -> usize {
        self.display_start
    }

    fn overlaps_reserved(&self, addr: usize, len: usize) -> bool {
        len > 0 && addr < self.display_start && addr + len > self.call_stack_start
    }

    /// Whether `[addr, addr + len)` lands on any framebuffer byte.
    pub fn overlaps_display(&self, addr: usize, len: usize) -> bool {
        len > 0 && addr + len > self.display_start && addr < self.size
    }
}

/// Flat system memory laid out according to a [`Layout`].
pub struct Memory {
    bytes: Box<[u8]>,
    layout: Layout,
}

impl Memory {
    /// Font at 0, `rom` at 0x200, everything else zeroed.
    pub fn new(layout: Layout, rom: &[u8]) -> Result<Self, ConfigError> {
        if rom.len() > layout.max_rom_size() {
            return Err(ConfigError::RomTooLarge {
                size: rom.len(),
                max_size: layout.max_rom_size(),
            });
        }

        let mut bytes = vec![0; layout.size()].into_boxed_slice();
        bytes[..FONTSET.len()].copy_from_slice(&FONTSET);
        bytes[PROGRAM_START..PROGRAM_START + rom.len()].copy_from_slice(rom);

        Ok(Self { bytes, layout })
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Big-endian instruction word at `addr`.
    pub fn read_word(&self, addr: u16) -> Result<u16, Fault> {
        let a = usize::from(addr);
        if a + 2 > self.layout.size() {
            return Err(Fault::MemoryOutOfBounds { address: a });
        }
        Ok(u16::from(self.bytes[a]) << 8 | u16::from(self.bytes[a + 1]))
    }

    /// Program-visible read through the address register.
    pub fn read(&self, addr: usize, len: usize) -> Result<&[u8], Fault> {
        self.check_access(addr, len)?;
        Ok(&self.bytes[addr..addr + len])
    }

    /// Program-visible write through the address register. Nothing is
    /// written unless the whole range is accessible.
    pub fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), Fault> {
        self.check_access(addr, data.len())?;
        self.bytes[addr..addr + data.len()].copy_from_slice(data);
        Ok(())
    }

    fn check_access(&self, addr: usize, len: usize) -> Result<(), Fault> {
        if addr + len > self.layout.size() {
            return Err(Fault::MemoryOutOfBounds { address: addr });
        }
        if self.layout.overlaps_reserved(addr, len) {
            return Err(Fault::ReservedMemory { address: addr });
        }
        Ok(())
    }

    pub fn stack_slot(&self, slot: usize) -> u16 {
        let a = self.layout.call_stack_start() + slot * 2;
        u16::from(self.bytes[a]) << 8 | u16::from(self.bytes[a + 1])
    }

    pub fn set_stack_slot(&mut self, slot: usize, addr: u16) {
        let a = self.layout.call_stack_start() + slot * 2;
        self.bytes[a..a + 2].copy_from_slice(&addr.to_be_bytes());
    }

    pub fn framebuffer(&self) -> &[u8] {
        &self.bytes[self.layout.display_start()..]
    }

    pub fn framebuffer_mut(&mut self) -> &mut [u8] {
        let start = self.layout.display_start();
        &mut self.bytes[start..]
    }
}
