//! A CHIP-8 virtual machine.
//!
//! The VM owns memory, registers, the call stack and both timers, and
//! advances one instruction per [`Chip8::step`]. It never touches a window,
//! an audio device or the wall clock: callers feed it a [`Keypad`], read back
//! a [`Framebuffer`] and decide how fast to step.
//!
//! ```
//! use chip8::{Chip8, Status};
//!
//! // V0 = 0x2A, then return from the entry routine
//! let mut vm = Chip8::new(&[0x60, 0x2A, 0x00, 0xEE]).unwrap();
//! assert_eq!(vm.run_to_completion(|| None), Status::Halted);
//! assert_eq!(vm.registers()[0], 0x2A);
//! ```

pub mod chip8;
pub mod settings;

pub use crate::chip8::{
    Chip8, Config, ConfigError, Error, Fault, Framebuffer, Keypad, Layout, State, Status,
    TimerMode, HEIGHT, WIDTH,
};
