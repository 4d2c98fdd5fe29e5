//! Small programs for exercising the processor.
//!
//! Extended mode programs run from the code bank based on B0 and keep
//! their data in a bank based on B2.  Basic mode programs run from a
//! bank based on B12 and keep their data in one based on B13.
use base::prelude::*;

use super::InstructionProcessor;
use crate::config::{ProcessorConfiguration, SystemConfiguration};
use crate::grs::{register_index, RegisterName};
use crate::image::{BankImage, ProgramImage, ProgramStart, ICS_BANK, ICS_FRAME_SIZE};
use crate::registers::LevelBdi;
use crate::system::System;

pub(super) const CODE_BANK: LevelBdi = LevelBdi::new(0, 0o100);
pub(super) const DATA_BANK: LevelBdi = LevelBdi::new(0, 0o101);
pub(super) const CODE_START: u32 = 0o1000;
/// Where the data bank starts in extended mode programs.
pub(super) const DATA_START: u32 = 0;
/// Where the data bank starts in basic mode programs.
pub(super) const BASIC_DATA_START: u32 = 0o22000;
const DATA_WORDS: usize = 0o100;
const CYCLE_LIMIT: u64 = 10_000;
/// The interrupt control stack frame pushed by the first interrupt.
const FIRST_ICS_FRAME: u32 = 96 - ICS_FRAME_SIZE;

macro_rules! assert_octal_eq {
    ($left:expr, $right:expr $(,)?) => {{
        match (&$left, &$right) {
            (left_val, right_val) => {
                if !(*left_val == *right_val) {
                    panic!(
                        "Assertion failed: {:>#014o} != {:>#014o}",
                        left_val, right_val
                    );
                }
            }
        }
    }};
}
pub(super) use assert_octal_eq;

/// An extended mode instruction without indexing flags.
pub(super) fn op(f: u8, j: u8, a: u8, x: u8, b: u8, d: u16) -> Word36 {
    InstructionWord::extended(f, j, a, x, false, false, b, d).word()
}

/// An extended mode instruction which increments its index register.
pub(super) fn op_h(f: u8, j: u8, a: u8, x: u8, b: u8, d: u16) -> Word36 {
    InstructionWord::extended(f, j, a, x, true, false, b, d).word()
}

/// An instruction with an 18-bit immediate operand.
pub(super) fn imm(f: u8, j: u8, a: u8, value: u32) -> Word36 {
    InstructionWord::immediate(f, j, a, 0, value).word()
}

pub(super) fn basic_op(f: u8, j: u8, a: u8, x: u8, i: bool, u: u32) -> Word36 {
    InstructionWord::basic(f, j, a, x, false, i, u).word()
}

pub(super) fn halt(detail: u16) -> Word36 {
    op(0o77, 0o17, 0o17, 0, 0, detail)
}

pub(super) fn w(bits: u64) -> Word36 {
    Word36::truncate(bits)
}

pub(super) fn user(name: RegisterName) -> usize {
    register_index(name, false)
}

pub(super) struct TestProgram {
    start: ProgramStart,
    banks: Vec<BankImage>,
    registers: Vec<(usize, Word36)>,
    interrupt_environment: bool,
    processors: usize,
    cycle_limit: u64,
}

impl TestProgram {
    pub(super) fn extended(code: Vec<Word36>) -> TestProgram {
        TestProgram {
            start: ProgramStart::extended(CODE_BANK, CODE_START),
            banks: vec![BankImage::extended(CODE_BANK, CODE_START, code).based_on(0)],
            registers: Vec::new(),
            interrupt_environment: true,
            processors: 1,
            cycle_limit: CYCLE_LIMIT,
        }
    }

    pub(super) fn basic(code: Vec<Word36>) -> TestProgram {
        TestProgram {
            start: ProgramStart::basic(CODE_BANK, CODE_START),
            banks: vec![BankImage::basic(CODE_BANK, CODE_START, code).based_on(12)],
            ..TestProgram::extended(Vec::new())
        }
    }

    /// Supply the start of the data bank; the rest of it is zero.
    pub(super) fn with_data(mut self, mut words: Vec<Word36>) -> TestProgram {
        words.resize(words.len().max(DATA_WORDS), Word36::ZERO);
        let bank = match self.start.mode {
            AddressingMode::Extended => {
                BankImage::extended(DATA_BANK, DATA_START, words).based_on(2)
            }
            AddressingMode::Basic => {
                BankImage::basic(DATA_BANK, BASIC_DATA_START, words).based_on(13)
            }
        };
        self.banks.push(bank);
        self
    }

    pub(super) fn with_bank(mut self, bank: BankImage) -> TestProgram {
        self.banks.push(bank);
        self
    }

    pub(super) fn with_register(mut self, name: RegisterName, value: Word36) -> TestProgram {
        self.registers.push((register_index(name, false), value));
        self
    }

    pub(super) fn with_privilege(mut self, pp: u8) -> TestProgram {
        self.start = self.start.with_privilege(pp);
        self
    }

    pub(super) fn with_processors(mut self, count: usize) -> TestProgram {
        self.processors = count;
        self
    }

    pub(super) fn with_cycle_limit(mut self, limit: u64) -> TestProgram {
        self.cycle_limit = limit;
        self
    }

    pub(super) fn without_interrupt_environment(mut self) -> TestProgram {
        self.interrupt_environment = false;
        self
    }

    pub(super) fn image(&self) -> ProgramImage {
        let mut image = ProgramImage::new(self.start);
        for bank in &self.banks {
            image = image.with_bank(bank.clone());
        }
        if self.interrupt_environment {
            image = image.with_interrupt_environment();
        }
        for (index, value) in &self.registers {
            image = image.with_register(*index, *value);
        }
        image
    }

    pub(super) fn load(&self) -> System {
        let config = SystemConfiguration {
            processor_count: self.processors,
            processor: ProcessorConfiguration {
                cycle_limit: Some(self.cycle_limit),
                ..ProcessorConfiguration::default()
            },
            ..SystemConfiguration::default()
        };
        System::load(&config, &self.image()).expect("test program should load")
    }

    /// Load the program and run processor 0 until it stops.
    pub(super) fn run(&self) -> System {
        let mut system = self.load();
        system.start(0);
        system.run();
        system
    }
}

pub(super) fn first(system: &System) -> &InstructionProcessor {
    system.processor(0).expect("processor 0 exists")
}

pub(super) fn register(system: &System, name: RegisterName) -> Word36 {
    first(system).general_register(user(name))
}

pub(super) fn data_word(system: &System, offset: u32) -> Word36 {
    system
        .read_bank_word(DATA_BANK, DATA_START + offset)
        .expect("offset is within the data bank")
}

/// The words saved by the first interrupt taken: PAR, DR, IKR,
/// quantum timer, ISW0 and ISW1.
pub(super) fn first_interrupt_frame(system: &System) -> Vec<Word36> {
    (FIRST_ICS_FRAME..FIRST_ICS_FRAME + ICS_FRAME_SIZE)
        .map(|relative| {
            system
                .read_bank_word(ICS_BANK, relative)
                .expect("the frame is within the interrupt control stack")
        })
        .collect()
}
