//! Program images: the banks to load into storage and the state the
//! processors start in.
//!
//! An image is a list of banks, each with its contents, limits and
//! access control, optionally naming the base register it should be
//! based on at initial program load.  Banks are placed in storage one
//! after another in the order given.
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use base::prelude::*;

use super::basereg::{
    AccessPermissions, BankTableError, BankType, BASE_REGISTER_COUNT, ICS_BASE_REGISTER,
    INTERRUPT_VECTOR_BASE_REGISTER, RCS_BASE_REGISTER,
};
use super::config::ConfigurationError;
use super::grs::{register_index, RegisterName};
use super::interrupt::InterruptClass;
use super::memory::MemoryOpFailure;
use super::registers::{AccessKey, AccessLock, LevelBdi};
use super::upi::SignalError;

pub const INTERRUPT_VECTOR_BANK: LevelBdi = LevelBdi::new(0, 0o1);
pub const INTERRUPT_HANDLER_BANK: LevelBdi = LevelBdi::new(0, 0o2);
pub const ICS_BANK: LevelBdi = LevelBdi::new(0, 0o3);
pub const RCS_BANK: LevelBdi = LevelBdi::new(0, 0o4);

/// Words in one interrupt control stack frame.
pub const ICS_FRAME_SIZE: u32 = 6;
const ICS_FRAMES: u32 = 16;
const RCS_WORDS: u32 = 256;
const INTERRUPT_VECTORS: u32 = 0o40;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankImage {
    pub level_bdi: LevelBdi,
    pub bank_type: BankType,
    pub lower_limit: u32,
    pub access_lock: AccessLock,
    pub general_permissions: AccessPermissions,
    pub special_permissions: AccessPermissions,
    pub large_size: bool,
    pub base_register: Option<usize>,
    pub words: Vec<Word36>,
}

impl BankImage {
    /// An extended mode bank which anyone may read, write and enter.
    pub fn extended(level_bdi: LevelBdi, lower_limit: u32, words: Vec<Word36>) -> BankImage {
        BankImage {
            level_bdi,
            bank_type: BankType::Extended,
            lower_limit,
            access_lock: AccessKey::default(),
            general_permissions: AccessPermissions::ALL,
            special_permissions: AccessPermissions::ALL,
            large_size: false,
            base_register: None,
            words,
        }
    }

    pub fn basic(level_bdi: LevelBdi, lower_limit: u32, words: Vec<Word36>) -> BankImage {
        BankImage {
            bank_type: BankType::Basic,
            ..BankImage::extended(level_bdi, lower_limit, words)
        }
    }

    pub fn based_on(self, base_register: usize) -> BankImage {
        BankImage {
            base_register: Some(base_register),
            ..self
        }
    }

    pub fn large(self) -> BankImage {
        BankImage {
            large_size: true,
            ..self
        }
    }

    pub fn with_access(
        self,
        lock: AccessLock,
        general: AccessPermissions,
        special: AccessPermissions,
    ) -> BankImage {
        BankImage {
            access_lock: lock,
            general_permissions: general,
            special_permissions: special,
            ..self
        }
    }

    /// The relative address of the last word of the bank.  Only
    /// meaningful for a non-empty bank.
    pub fn upper_limit(&self) -> u32 {
        self.lower_limit + self.words.len().saturating_sub(1) as u32
    }
}

/// Where and how execution begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramStart {
    pub level_bdi: LevelBdi,
    pub offset: u32,
    pub mode: AddressingMode,
    pub processor_privilege: u8,
}

impl ProgramStart {
    pub fn extended(level_bdi: LevelBdi, offset: u32) -> ProgramStart {
        ProgramStart {
            level_bdi,
            offset,
            mode: AddressingMode::Extended,
            processor_privilege: 0,
        }
    }

    pub fn basic(level_bdi: LevelBdi, offset: u32) -> ProgramStart {
        ProgramStart {
            mode: AddressingMode::Basic,
            ..ProgramStart::extended(level_bdi, offset)
        }
    }

    pub fn with_privilege(self, processor_privilege: u8) -> ProgramStart {
        ProgramStart {
            processor_privilege: processor_privilege & 0o3,
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    banks: Vec<BankImage>,
    registers: Vec<(usize, Word36)>,
    start: ProgramStart,
}

impl ProgramImage {
    pub fn new(start: ProgramStart) -> ProgramImage {
        ProgramImage {
            banks: Vec::new(),
            registers: Vec::new(),
            start,
        }
    }

    pub fn with_bank(mut self, bank: BankImage) -> ProgramImage {
        self.banks.push(bank);
        self
    }

    /// Set a general register (by GRS index) at initial program load.
    pub fn with_register(mut self, index: usize, value: Word36) -> ProgramImage {
        self.registers.push((index, value));
        self
    }

    pub fn banks(&self) -> &[BankImage] {
        &self.banks
    }

    pub fn registers(&self) -> &[(usize, Word36)] {
        &self.registers
    }

    pub fn start(&self) -> &ProgramStart {
        &self.start
    }

    pub fn set_start(&mut self, start: ProgramStart) {
        self.start = start;
    }

    /// Add what a program needs for interrupts and procedure calls to
    /// work: the interrupt vector bank on B16, a handler bank in which
    /// the handler for class c is `HALT 01000+c`, the interrupt
    /// control stack on B26 (pointer in EX1) and the return control
    /// stack on B25 (pointer in EX0).
    pub fn with_interrupt_environment(self) -> ProgramImage {
        let vectors: Vec<Word36> = (0..INTERRUPT_VECTORS)
            .map(|class| join_halves(INTERRUPT_HANDLER_BANK.to_half(), class))
            .collect();
        let handlers: Vec<Word36> = (0..INTERRUPT_VECTORS)
            .map(|class| {
                let detail = InterruptClass::from_code(class as u8)
                    .map(InterruptClass::stop_detail)
                    .unwrap_or(0o1000 + u64::from(class));
                InstructionWord::extended(0o77, 0o17, 0o17, 0, false, false, 0, detail as u16)
                    .word()
            })
            .collect();
        let ics_words = ICS_FRAME_SIZE * ICS_FRAMES;
        self.with_bank(
            BankImage::extended(INTERRUPT_VECTOR_BANK, 0, vectors)
                .based_on(INTERRUPT_VECTOR_BASE_REGISTER),
        )
        .with_bank(BankImage::extended(INTERRUPT_HANDLER_BANK, 0, handlers))
        .with_bank(
            BankImage::extended(ICS_BANK, 0, vec![Word36::ZERO; ics_words as usize])
                .based_on(ICS_BASE_REGISTER),
        )
        .with_bank(
            BankImage::extended(RCS_BANK, 0, vec![Word36::ZERO; RCS_WORDS as usize])
                .based_on(RCS_BASE_REGISTER),
        )
        .with_register(
            register_index(RegisterName::EX(1), true),
            join_halves(ICS_FRAME_SIZE, ics_words),
        )
        .with_register(
            register_index(RegisterName::EX(0), true),
            Word36::from(RCS_WORDS),
        )
    }

    /// Check the parts of the image which don't depend on the
    /// configuration.
    pub fn validate(&self) -> Result<(), LoadError> {
        for bank in &self.banks {
            if bank.words.is_empty() {
                return Err(LoadError::BankTable(BankTableError::EmptyBank(bank.level_bdi)));
            }
            if let Some(index) = bank.base_register {
                let allowed = match bank.bank_type {
                    BankType::Basic => (12..=15).contains(&index),
                    BankType::Extended => index < BASE_REGISTER_COUNT,
                };
                if !allowed {
                    return Err(LoadError::InvalidBaseRegister {
                        bank: bank.level_bdi,
                        index,
                    });
                }
            }
        }
        if !self.banks.iter().any(|b| b.level_bdi == self.start.level_bdi) {
            return Err(LoadError::UndefinedStartBank(self.start.level_bdi));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    Configuration(ConfigurationError),
    BankTable(BankTableError),
    InsufficientStorage { needed: usize, available: usize },
    InvalidBaseRegister { bank: LevelBdi, index: usize },
    UndefinedStartBank(LevelBdi),
    /// A processor was asked to base a bank which is not in the bank
    /// descriptor table.
    UnknownBank(LevelBdi),
    Memory(MemoryOpFailure),
    Processor(SignalError),
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            LoadError::Configuration(e) => write!(f, "bad configuration: {e}"),
            LoadError::BankTable(e) => write!(f, "bad bank: {e}"),
            LoadError::InsufficientStorage { needed, available } => write!(
                f,
                "the image needs {needed} words of storage but only {available} are configured"
            ),
            LoadError::InvalidBaseRegister { bank, index } => {
                write!(f, "bank {bank} cannot be based on B{index}")
            }
            LoadError::UndefinedStartBank(lb) => {
                write!(f, "the starting bank {lb} is not part of the image")
            }
            LoadError::UnknownBank(lb) => write!(f, "bank {lb} has no bank descriptor"),
            LoadError::Memory(e) => write!(f, "failed to load storage: {e}"),
            LoadError::Processor(e) => write!(f, "failed to set up processor: {e}"),
        }
    }
}

impl Error for LoadError {}

impl From<ConfigurationError> for LoadError {
    fn from(e: ConfigurationError) -> LoadError {
        LoadError::Configuration(e)
    }
}

impl From<BankTableError> for LoadError {
    fn from(e: BankTableError) -> LoadError {
        LoadError::BankTable(e)
    }
}

impl From<MemoryOpFailure> for LoadError {
    fn from(e: MemoryOpFailure) -> LoadError {
        LoadError::Memory(e)
    }
}

impl From<SignalError> for LoadError {
    fn from(e: SignalError) -> LoadError {
        LoadError::Processor(e)
    }
}
