//! Banks, bank descriptors and base registers.
//!
//! A bank is a contiguous region of main storage.  Its bank
//! descriptor says where it lives, which relative addresses are
//! valid and who may use it.  Loading a base register from a bank
//! descriptor makes the bank addressable; the processor has 32 base
//! registers, B0 being the code bank in extended mode.
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use super::registers::{AccessKey, AccessLock, LevelBdi};

pub const BASE_REGISTER_COUNT: usize = 32;

/// Interrupt vectors.
pub const INTERRUPT_VECTOR_BASE_REGISTER: usize = 16;
/// Return control stack.
pub const RCS_BASE_REGISTER: usize = 25;
/// Interrupt control stack.
pub const ICS_BASE_REGISTER: usize = 26;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct AccessPermissions {
    pub enter: bool,
    pub read: bool,
    pub write: bool,
}

impl AccessPermissions {
    pub const ALL: AccessPermissions = AccessPermissions {
        enter: true,
        read: true,
        write: true,
    };
    pub const NONE: AccessPermissions = AccessPermissions {
        enter: false,
        read: false,
        write: false,
    };
    pub const READ_ONLY: AccessPermissions = AccessPermissions {
        enter: false,
        read: true,
        write: false,
    };
}

/// Basic mode banks can only be based on B12-B15 and executed in
/// basic mode; extended mode banks are based on any register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BankType {
    Basic,
    Extended,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BankDescriptor {
    pub level_bdi: LevelBdi,
    pub bank_type: BankType,
    /// Absolute address of relative address `lower_limit`.
    pub base_address: usize,
    pub lower_limit: u32,
    pub upper_limit: u32,
    pub access_lock: AccessLock,
    pub general_permissions: AccessPermissions,
    pub special_permissions: AccessPermissions,
    /// Limits are counted in 512-word blocks rather than words.  Only
    /// carried; storage here is never large enough to need it.
    pub large_size: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankTableError {
    DuplicateBank(LevelBdi),
    VoidBankDesignation,
    EmptyBank(LevelBdi),
}

impl Display for BankTableError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            BankTableError::DuplicateBank(lb) => write!(f, "bank {lb} is defined more than once"),
            BankTableError::VoidBankDesignation => {
                f.write_str("L,BDI 0,0 cannot be used for a bank")
            }
            BankTableError::EmptyBank(lb) => {
                write!(f, "bank {lb} has an upper limit below its lower limit")
            }
        }
    }
}

impl Error for BankTableError {}

/// All the banks in the system, keyed by L,BDI.  Built when a
/// program is loaded and shared by every processor thereafter.
#[derive(Clone, Debug, Default)]
pub struct BankDescriptorTable {
    banks: BTreeMap<LevelBdi, BankDescriptor>,
}

impl BankDescriptorTable {
    pub fn new() -> BankDescriptorTable {
        BankDescriptorTable::default()
    }

    pub fn insert(&mut self, descriptor: BankDescriptor) -> Result<(), BankTableError> {
        if descriptor.level_bdi.is_void() {
            return Err(BankTableError::VoidBankDesignation);
        }
        if descriptor.upper_limit < descriptor.lower_limit {
            return Err(BankTableError::EmptyBank(descriptor.level_bdi));
        }
        if self.banks.contains_key(&descriptor.level_bdi) {
            return Err(BankTableError::DuplicateBank(descriptor.level_bdi));
        }
        self.banks.insert(descriptor.level_bdi, descriptor);
        Ok(())
    }

    pub fn lookup(&self, level_bdi: LevelBdi) -> Option<&BankDescriptor> {
        self.banks.get(&level_bdi)
    }

    pub fn len(&self) -> usize {
        self.banks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BankDescriptor> {
        self.banks.values()
    }
}

/// The processor's view of a bank.  A void base register makes no
/// relative address valid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BaseRegister {
    pub void: bool,
    pub base_address: usize,
    pub lower_limit: u32,
    pub upper_limit: u32,
    pub access_lock: AccessLock,
    pub general_permissions: AccessPermissions,
    pub special_permissions: AccessPermissions,
    pub large_size: bool,
}

impl Default for BaseRegister {
    fn default() -> BaseRegister {
        BaseRegister::void()
    }
}

impl BaseRegister {
    pub const fn void() -> BaseRegister {
        BaseRegister {
            void: true,
            base_address: 0,
            lower_limit: 0,
            upper_limit: 0,
            access_lock: AccessKey { ring: 0, domain: 0 },
            general_permissions: AccessPermissions::NONE,
            special_permissions: AccessPermissions::NONE,
            large_size: false,
        }
    }

    pub fn from_descriptor(bd: &BankDescriptor) -> BaseRegister {
        BaseRegister {
            void: false,
            base_address: bd.base_address,
            lower_limit: bd.lower_limit,
            upper_limit: bd.upper_limit,
            access_lock: bd.access_lock,
            general_permissions: bd.general_permissions,
            special_permissions: bd.special_permissions,
            large_size: bd.large_size,
        }
    }

    pub fn contains(&self, relative: u32) -> bool {
        !self.void && relative >= self.lower_limit && relative <= self.upper_limit
    }

    /// Translate a relative address to an absolute one, if the
    /// relative address is within the limits.
    pub fn absolute(&self, relative: u32) -> Option<usize> {
        if self.contains(relative) {
            Some(self.base_address + (relative - self.lower_limit) as usize)
        } else {
            None
        }
    }

    /// The permissions which apply to a program holding `key`.  Special
    /// permissions apply when the key's ring is more privileged than
    /// the lock's or the domains match.
    pub fn effective_permissions(&self, key: AccessKey) -> AccessPermissions {
        if key.ring < self.access_lock.ring || key.domain == self.access_lock.domain {
            self.special_permissions
        } else {
            self.general_permissions
        }
    }
}
