//! The general register set.
//!
//! The 128 general registers are held in a single flat array.  The
//! named registers (index registers, accumulators and R registers,
//! in user and executive flavours) are views onto that array, and
//! the mapping from a register name to its index is a pure function
//! of the name and of the register-set designator.  The user index
//! and accumulator ranges overlap (X12-X15 are A0-A3), as do the
//! executive ones.
//!
//! | Registers  | GRS indices |
//! |------------|-------------|
//! | X0-X15     | 000-017     |
//! | A0-A15     | 014-033     |
//! | R0-R15     | 100-117     |
//! | ER0-ER15   | 120-137     |
//! | EX0-EX15   | 140-157     |
//! | EA0-EA15   | 154-173     |
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use base::prelude::*;

pub const GRS_SIZE: usize = 0o200;

const X_BASE: usize = 0o000;
const A_BASE: usize = 0o014;
const R_BASE: usize = 0o100;
const ER_BASE: usize = 0o120;
const EX_BASE: usize = 0o140;
const EA_BASE: usize = 0o154;

/// Registers which nothing but privileged software may touch start
/// here.
const EXEC_RANGE_START: usize = 0o120;

/// Names a register.  X, A and R name the user or executive register
/// according to the register-set designator; EX, EA and ER always
/// name the executive one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RegisterName {
    X(u8),
    A(u8),
    R(u8),
    EX(u8),
    EA(u8),
    ER(u8),
}

impl Display for RegisterName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            RegisterName::X(n) => write!(f, "X{n}"),
            RegisterName::A(n) => write!(f, "A{n}"),
            RegisterName::R(n) => write!(f, "R{n}"),
            RegisterName::EX(n) => write!(f, "EX{n}"),
            RegisterName::EA(n) => write!(f, "EA{n}"),
            RegisterName::ER(n) => write!(f, "ER{n}"),
        }
    }
}

/// Map a register name to its GRS index.  Register numbers beyond 15
/// are allowed (for example A(a+2) of a double-word instruction) and
/// continue into the following registers; the result wraps around
/// the register set.
pub const fn register_index(name: RegisterName, exec_register_set_selected: bool) -> usize {
    let (base, n) = match name {
        RegisterName::X(n) => (if exec_register_set_selected { EX_BASE } else { X_BASE }, n),
        RegisterName::A(n) => (if exec_register_set_selected { EA_BASE } else { A_BASE }, n),
        RegisterName::R(n) => (if exec_register_set_selected { ER_BASE } else { R_BASE }, n),
        RegisterName::EX(n) => (EX_BASE, n),
        RegisterName::EA(n) => (EA_BASE, n),
        RegisterName::ER(n) => (ER_BASE, n),
    };
    (base + n as usize) % GRS_SIZE
}

/// Decide whether an instruction running at processor privilege `pp`
/// may read (or, if `write` is set, write) the register at `index`.
pub const fn is_access_allowed(index: usize, pp: u8, write: bool) -> bool {
    if index < 0o40 {
        true
    } else if index < R_BASE {
        false
    } else if index < EXEC_RANGE_START {
        true
    } else if write {
        pp == 0
    } else {
        pp <= 2
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct GeneralRegisterSet {
    registers: [Word36; GRS_SIZE],
}

impl Default for GeneralRegisterSet {
    fn default() -> GeneralRegisterSet {
        GeneralRegisterSet::new()
    }
}

impl GeneralRegisterSet {
    pub fn new() -> GeneralRegisterSet {
        GeneralRegisterSet {
            registers: [Word36::ZERO; GRS_SIZE],
        }
    }

    pub fn read(&self, index: usize) -> Word36 {
        self.registers[index % GRS_SIZE]
    }

    pub fn write(&mut self, index: usize, value: Word36) {
        self.registers[index % GRS_SIZE] = value;
    }

    pub fn read_field(&self, index: usize, designator: PartialWord) -> Word36 {
        extract_field(self.read(index), designator)
    }

    pub fn write_field(&mut self, index: usize, designator: PartialWord, value: Word36) {
        let updated = insert_field(self.read(index), designator, value);
        self.write(index, updated);
    }

    pub fn clear(&mut self) {
        self.registers = [Word36::ZERO; GRS_SIZE];
    }
}

impl std::fmt::Debug for GeneralRegisterSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.registers
                    .iter()
                    .enumerate()
                    .filter(|(_, w)| !w.is_positive_zero())
                    .map(|(i, w)| (format!("{i:03o}"), *w)),
            )
            .finish()
    }
}

/// An index register is an ordinary word with two interpretations:
/// normally an 18-bit increment (XI, H1) and an 18-bit modifier (XM,
/// H2), but with 24-bit executive indexing a 12-bit increment (bits
/// 0-11) and a 24-bit modifier (bits 12-35).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexRegister(pub Word36);

impl IndexRegister {
    pub fn xi(&self) -> u32 {
        left_half(self.0)
    }

    pub fn xm(&self) -> u32 {
        right_half(self.0)
    }

    pub fn xi12(&self) -> u32 {
        ((self.0.bits() >> 24) & 0o7777) as u32
    }

    pub fn xm24(&self) -> u32 {
        (self.0.bits() & 0o77_777_777) as u32
    }

    pub fn with_xm(&self, xm: u32) -> IndexRegister {
        IndexRegister(join_halves(self.xi(), xm))
    }

    pub fn with_xi(&self, xi: u32) -> IndexRegister {
        IndexRegister(join_halves(xi, self.xm()))
    }

    pub fn with_xm24(&self, xm: u32) -> IndexRegister {
        IndexRegister(Word36::truncate(
            (self.0.bits() & !0o77_777_777) | (u64::from(xm) & 0o77_777_777),
        ))
    }

    pub fn with_xi12(&self, xi: u32) -> IndexRegister {
        IndexRegister(Word36::truncate(
            (self.0.bits() & 0o77_777_777) | ((u64::from(xi) & 0o7777) << 24),
        ))
    }

    /// The modifier as a signed quantity, for address arithmetic.
    pub fn signed_xm(&self, indexing_24: bool) -> i64 {
        if indexing_24 {
            Word36::sign_extend(u64::from(self.xm24()), 24).to_i64()
        } else {
            Word36::sign_extend(u64::from(self.xm()), 18).to_i64()
        }
    }

    /// Add the increment to the modifier, as auto-incrementing
    /// indexing does.
    pub fn incremented(&self, indexing_24: bool) -> IndexRegister {
        if indexing_24 {
            let xi = Word36::sign_extend(u64::from(self.xi12()), 12).bits();
            self.with_xm24(add_narrow(u64::from(self.xm24()), xi, 24) as u32)
        } else {
            self.with_xm(add_narrow(u64::from(self.xm()), u64::from(self.xi()), 18) as u32)
        }
    }

    /// Subtract the increment from the modifier.
    pub fn decremented(&self, indexing_24: bool) -> IndexRegister {
        if indexing_24 {
            let xi = Word36::sign_extend(u64::from(self.xi12()), 12).negate().bits();
            self.with_xm24(add_narrow(u64::from(self.xm24()), xi, 24) as u32)
        } else {
            let xi = !u64::from(self.xi()) & 0o777_777;
            self.with_xm(add_narrow(u64::from(self.xm()), xi, 18) as u32)
        }
    }
}
