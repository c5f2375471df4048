use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_MEMORY_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    PerInstruction,
    /// `step` leaves the timers alone; the caller invokes `tick_timers` at 60Hz.
    External,
}

impl Default for TimerMode {
    fn default() -> Self {
        TimerMode::PerInstruction
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimerMode::PerInstruction => write!(f, "instruction"),
            TimerMode::External => write!(f, "external"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown timer mode {0:?}, expected `instruction` or `external`")]
pub struct ParseTimerModeError(String);

impl FromStr for TimerMode {
    type Err = ParseTimerModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instruction" => Ok(TimerMode::PerInstruction),
            "external" => Ok(TimerMode::External),
            other => Err(ParseTimerModeError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub memory_size: usize,
    pub timer_mode: TimerMode,
    /// Seed for CXNN; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            timer_mode: TimerMode::default(),
            seed: None,
        }
    }
}

impl Config {
    pub fn with_memory_size(mut self, memory_size: usize) -> Self {
        self.memory_size = memory_size;
        self
    }

    pub fn with_timer_mode(mut self, timer_mode: TimerMode) -> Self {
        self.timer_mode = timer_mode;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_mode_parses_both_names() {
        assert_eq!("instruction".parse::<TimerMode>(), Ok(TimerMode::PerInstruction));
        assert_eq!("external".parse::<TimerMode>(), Ok(TimerMode::External));
        assert!("60hz".parse::<TimerMode>().is_err());
    }

    #[test]
    fn timer_mode_display_round_trips() {
        for mode in [TimerMode::PerInstruction, TimerMode::External].iter() {
            assert_eq!(mode.to_string().parse::<TimerMode>(), Ok(*mode));
        }
    }

    #[test]
    fn builder_sets_fields() {
        let config = Config::default()
            .with_memory_size(2048)
            .with_timer_mode(TimerMode::External)
            .with_seed(7);
        assert_eq!(config.memory_size, 2048);
        assert_eq!(config.timer_mode, TimerMode::External);
        assert_eq!(config.seed, Some(7));
    }
}
