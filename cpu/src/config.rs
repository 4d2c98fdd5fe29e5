//! Configuration of the emulated system.
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

/// The most processors a system can have; UPI numbers must fit in
/// the status word of a UPI interrupt.
pub const MAX_PROCESSORS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessorConfiguration {
    /// How many basic mode indirect references one operand may make
    /// before the chain is cut short.
    pub indirect_chain_limit: usize,
    /// The jump history entry count at which a JumpHistoryFull
    /// interrupt becomes due.
    pub jump_history_threshold: usize,
    pub jump_history_full_interrupt_enabled: bool,
    /// Quantum timer units charged for each instruction.
    pub quantum_charge_per_instruction: u64,
    /// Stop a runaway processor after this many cycles.
    pub cycle_limit: Option<u64>,
}

impl Default for ProcessorConfiguration {
    fn default() -> ProcessorConfiguration {
        ProcessorConfiguration {
            indirect_chain_limit: 64,
            jump_history_threshold: 120,
            jump_history_full_interrupt_enabled: false,
            quantum_charge_per_instruction: 1,
            cycle_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemConfiguration {
    pub storage_words: usize,
    pub processor_count: usize,
    pub processor: ProcessorConfiguration,
}

impl Default for SystemConfiguration {
    fn default() -> SystemConfiguration {
        SystemConfiguration {
            storage_words: 0o1_000_000,
            processor_count: 1,
            processor: ProcessorConfiguration::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    NoStorage,
    NoProcessors,
    TooManyProcessors(usize),
}

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            ConfigurationError::NoStorage => f.write_str("main storage size must be nonzero"),
            ConfigurationError::NoProcessors => f.write_str("at least one processor is needed"),
            ConfigurationError::TooManyProcessors(n) => write!(
                f,
                "{n} processors were requested but at most {MAX_PROCESSORS} are supported"
            ),
        }
    }
}

impl Error for ConfigurationError {}

impl SystemConfiguration {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.storage_words == 0 {
            Err(ConfigurationError::NoStorage)
        } else if self.processor_count == 0 {
            Err(ConfigurationError::NoProcessors)
        } else if self.processor_count > MAX_PROCESSORS {
            Err(ConfigurationError::TooManyProcessors(self.processor_count))
        } else {
            Ok(())
        }
    }
}
