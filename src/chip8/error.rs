use std::io;
use thiserror::Error;

/// Problems detected while building a VM, before any instruction runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("memory size {size} is too small, need more than {min} bytes")]
    MemoryTooSmall { size: usize, min: usize },

    #[error("memory size {size} exceeds the 16-bit address space ({max} bytes)")]
    MemoryTooLarge { size: usize, max: usize },

    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    RomTooLarge { size: usize, max_size: usize },
}

/// Terminal run-time conditions. The VM stops executing once one is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("call stack overflow at {pc:#05X} ({depth} nested calls)")]
    StackOverflow { pc: u16, depth: usize },

    #[error("call stack underflow at {pc:#05X}")]
    StackUnderflow { pc: u16 },

    #[error("memory access out of bounds at address {address:#06X}")]
    MemoryOutOfBounds { address: usize },

    #[error("access to reserved memory at address {address:#06X}")]
    ReservedMemory { address: usize },
}

/// Errors from loading a ROM off disk.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read ROM: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
