//! Main storage.
//!
//! Storage is a single array of words indexed by absolute address,
//! shared by every processor.  Each word is an atomic so that
//! processors running on separate threads can read and write it
//! without a lock; word-level atomicity is all the hardware promises
//! too.
use std::error;
use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

use base::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryOpFailure {
    NotMapped(usize),
}

impl Display for MemoryOpFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            MemoryOpFailure::NotMapped(addr) => {
                write!(f, "absolute address {addr:o} is beyond the end of storage")
            }
        }
    }
}

impl error::Error for MemoryOpFailure {}

#[derive(Debug)]
pub struct MainStorage {
    words: Vec<AtomicU64>,
}

impl MainStorage {
    pub fn new(size: usize) -> MainStorage {
        MainStorage {
            words: (0..size).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn read(&self, address: usize) -> Result<Word36, MemoryOpFailure> {
        match self.words.get(address) {
            Some(cell) => Ok(Word36::truncate(cell.load(Ordering::Relaxed))),
            None => Err(MemoryOpFailure::NotMapped(address)),
        }
    }

    pub fn write(&self, address: usize, value: Word36) -> Result<(), MemoryOpFailure> {
        match self.words.get(address) {
            Some(cell) => {
                cell.store(value.bits(), Ordering::Relaxed);
                Ok(())
            }
            None => Err(MemoryOpFailure::NotMapped(address)),
        }
    }

    /// Copy `words` into storage starting at `address`.
    pub fn load(&self, address: usize, words: &[Word36]) -> Result<(), MemoryOpFailure> {
        for (offset, w) in words.iter().enumerate() {
            self.write(address + offset, *w)?;
        }
        Ok(())
    }
}
