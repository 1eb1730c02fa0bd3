//! Driver configuration

use crate::geometry::{FlashGeometry, KNOWN_CHIPS};

/// Status polling parameters for `wait_idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Maximum number of status register reads
    pub max_attempts: u32,
    /// Delay between two status register reads, in microseconds
    pub delay_us: u32,
}

impl PollConfig {
    /// Default number of status polls per wait
    pub const DEFAULT_ATTEMPTS: u32 = 500;

    /// Create a poll configuration
    pub const fn new(max_attempts: u32, delay_us: u32) -> Self {
        Self {
            max_attempts,
            delay_us,
        }
    }

    /// Upper bound of the time spent sleeping between polls, in microseconds
    pub const fn budget_us(&self) -> u64 {
        self.max_attempts as u64 * self.delay_us as u64
    }
}

/// What `FlashDriver::init` does when the JEDEC ID matches no table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownChipPolicy {
    /// Fail initialization with `Error::UnsupportedChip`
    #[default]
    Reject,
    /// Log a warning and assume the geometry of table entry 0
    FallbackToFirst,
}

/// Configuration for a `FlashDriver`
#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    /// Polling used around page program
    pub program_poll: PollConfig,
    /// Polling used around sector and block erase
    pub erase_poll: PollConfig,
    /// Polling used around chip erase
    pub chip_erase_poll: PollConfig,
    /// Timeout passed to the transport lock hook, in milliseconds
    pub lock_timeout_ms: u32,
    /// Behaviour on an unrecognised JEDEC ID
    pub unknown_chip: UnknownChipPolicy,
    /// Geometry table used for detection
    pub chips: &'static [FlashGeometry],
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            // Page program: typ. 0.4-3ms -> 500 x 20us = 10ms
            program_poll: PollConfig::new(PollConfig::DEFAULT_ATTEMPTS, 20),
            // 4K/32K/64K erase: typ. 45-2000ms -> 500 x 5ms = 2.5s
            erase_poll: PollConfig::new(PollConfig::DEFAULT_ATTEMPTS, 5_000),
            // Chip erase: typ. 40-200s -> 500 x 400ms = 200s
            chip_erase_poll: PollConfig::new(PollConfig::DEFAULT_ATTEMPTS, 400_000),
            lock_timeout_ms: 1_000,
            unknown_chip: UnknownChipPolicy::Reject,
            chips: KNOWN_CHIPS,
        }
    }
}

impl DriverConfig {
    /// Set the page program polling parameters
    pub fn with_program_poll(mut self, poll: PollConfig) -> Self {
        self.program_poll = poll;
        self
    }

    /// Set the sector/block erase polling parameters
    pub fn with_erase_poll(mut self, poll: PollConfig) -> Self {
        self.erase_poll = poll;
        self
    }

    /// Set the chip erase polling parameters
    pub fn with_chip_erase_poll(mut self, poll: PollConfig) -> Self {
        self.chip_erase_poll = poll;
        self
    }

    /// Use the same polling parameters for every write-class operation
    pub fn with_poll(self, poll: PollConfig) -> Self {
        self.with_program_poll(poll)
            .with_erase_poll(poll)
            .with_chip_erase_poll(poll)
    }

    /// Set the transport lock timeout
    pub fn with_lock_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.lock_timeout_ms = timeout_ms;
        self
    }

    /// Set the unknown chip policy
    pub fn with_unknown_chip(mut self, policy: UnknownChipPolicy) -> Self {
        self.unknown_chip = policy;
        self
    }

    /// Use a custom geometry table
    pub fn with_chips(mut self, chips: &'static [FlashGeometry]) -> Self {
        self.chips = chips;
        self
    }
}
