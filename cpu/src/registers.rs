//! The smaller special-purpose registers: the program address
//! register, the indicator/key register and the access key it holds.
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use base::prelude::*;

/// Names a bank: a 3-bit level and a 15-bit bank descriptor index.
/// Together they fit in a half-word, which is how they appear in
/// storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LevelBdi {
    pub level: u8,
    pub bdi: u16,
}

impl LevelBdi {
    pub const VOID: LevelBdi = LevelBdi { level: 0, bdi: 0 };

    pub const fn new(level: u8, bdi: u16) -> LevelBdi {
        LevelBdi {
            level: level & 0o7,
            bdi: bdi & 0o77_777,
        }
    }

    pub const fn from_half(half: u32) -> LevelBdi {
        LevelBdi::new(((half >> 15) & 0o7) as u8, (half & 0o77_777) as u16)
    }

    pub const fn to_half(self) -> u32 {
        ((self.level as u32) << 15) | self.bdi as u32
    }

    /// L,BDI 0,0 designates no bank at all.
    pub const fn is_void(self) -> bool {
        self.level == 0 && self.bdi == 0
    }
}

impl Display for LevelBdi {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{:o},{:05o}", self.level, self.bdi)
    }
}

/// An access key (held by the processor) or access lock (held by a
/// bank): a 2-bit ring and a 16-bit domain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct AccessKey {
    pub ring: u8,
    pub domain: u16,
}

pub type AccessLock = AccessKey;

impl AccessKey {
    pub const fn new(ring: u8, domain: u16) -> AccessKey {
        AccessKey {
            ring: ring & 0o3,
            domain,
        }
    }

    pub const fn from_half(half: u32) -> AccessKey {
        AccessKey::new(((half >> 16) & 0o3) as u8, (half & 0o177_777) as u16)
    }

    pub const fn to_half(self) -> u32 {
        ((self.ring as u32) << 16) | self.domain as u32
    }
}

/// The program address register: the bank currently executing and
/// the relative address of the current instruction within it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProgramAddressRegister {
    pub level_bdi: LevelBdi,
    pub program_counter: u32,
}

impl ProgramAddressRegister {
    pub const fn new(level_bdi: LevelBdi, program_counter: u32) -> ProgramAddressRegister {
        ProgramAddressRegister {
            level_bdi,
            program_counter: program_counter & 0o777_777,
        }
    }

    pub fn to_word(self) -> Word36 {
        join_halves(self.level_bdi.to_half(), self.program_counter)
    }

    pub fn from_word(w: Word36) -> ProgramAddressRegister {
        let (h1, h2) = split_halves(w);
        ProgramAddressRegister::new(LevelBdi::from_half(h1), h2)
    }

    pub fn advanced(self, count: u32) -> ProgramAddressRegister {
        ProgramAddressRegister::new(self.level_bdi, self.program_counter.wrapping_add(count))
    }
}

impl Display for ProgramAddressRegister {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}:{:06o}", self.level_bdi, self.program_counter)
    }
}

/// The indicator/key register.  S1 holds the short status of the
/// most recent interrupt, S2 its class, and H2 the access key.
/// Bits 12 and 13 record a breakpoint match and a pending software
/// break.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndicatorKeyRegister {
    pub short_status: u8,
    pub interrupt_class: u8,
    pub breakpoint_register_match: bool,
    pub software_break: bool,
    pub access_key: AccessKey,
}

impl IndicatorKeyRegister {
    pub fn to_word(self) -> Word36 {
        Word36::truncate(
            (u64::from(self.short_status & 0o77) << 30)
                | (u64::from(self.interrupt_class & 0o77) << 24)
                | (u64::from(self.breakpoint_register_match) << 23)
                | (u64::from(self.software_break) << 22)
                | u64::from(self.access_key.to_half()),
        )
    }

    pub fn from_word(w: Word36) -> IndicatorKeyRegister {
        let b = w.bits();
        IndicatorKeyRegister {
            short_status: ((b >> 30) & 0o77) as u8,
            interrupt_class: ((b >> 24) & 0o77) as u8,
            breakpoint_register_match: (b >> 23) & 1 != 0,
            software_break: (b >> 22) & 1 != 0,
            access_key: AccessKey::from_half(right_half(w)),
        }
    }
}
