//! Debugging aids: the jump history and the breakpoint register.
use std::collections::VecDeque;

use serde::Serialize;

use crate::registers::ProgramAddressRegister;

pub const JUMP_HISTORY_SIZE: usize = 128;

/// The program address of each of the most recent transfers of
/// control, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JumpHistory {
    entries: VecDeque<ProgramAddressRegister>,
    /// Entries recorded since the last acknowledgement.
    recorded: usize,
    threshold: usize,
}

impl JumpHistory {
    pub fn new(threshold: usize) -> JumpHistory {
        JumpHistory {
            entries: VecDeque::with_capacity(JUMP_HISTORY_SIZE),
            recorded: 0,
            threshold,
        }
    }

    pub fn record(&mut self, par: ProgramAddressRegister) {
        if self.entries.len() == JUMP_HISTORY_SIZE {
            self.entries.pop_front();
        }
        self.entries.push_back(par);
        self.recorded += 1;
    }

    pub fn threshold_reached(&self) -> bool {
        self.recorded > self.threshold
    }

    pub fn acknowledge(&mut self) {
        self.recorded = 0;
    }

    pub fn entries(&self) -> impl Iterator<Item = &ProgramAddressRegister> {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&ProgramAddressRegister> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recorded = 0;
    }
}

/// Compares each storage reference with an absolute address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakpointRegister {
    pub address: usize,
    pub fetch: bool,
    pub read: bool,
    pub write: bool,
    /// Stop the processor on a match instead of raising a Breakpoint
    /// interrupt.
    pub halt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StorageAccess {
    Fetch,
    Read,
    Write,
}

impl BreakpointRegister {
    pub(super) fn matches(&self, address: usize, access: StorageAccess) -> bool {
        address == self.address
            && match access {
                StorageAccess::Fetch => self.fetch,
                StorageAccess::Read => self.read,
                StorageAccess::Write => self.write,
            }
    }
}
