//! Interrupts which have been raised but not yet taken wait here.
//!
//! Pending interrupts are ordered by class (lower classes first) and
//! then by the order in which they were raised.  Deferrable
//! interrupts stay queued while deferrable interrupts are disabled;
//! nothing is ever discarded.
use std::cmp::Reverse;
use std::fmt::{self, Debug, Formatter};

use keyed_priority_queue::KeyedPriorityQueue;
use tracing::{event, Level};

use super::interrupt::{InterruptClass, MachineInterrupt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PendingInterrupt {
    sequence: u64,
    interrupt: MachineInterrupt,
}

type Priority = Reverse<(InterruptClass, u64)>;

pub struct InterruptUnit {
    pending: KeyedPriorityQueue<PendingInterrupt, Priority>,
    next_sequence: u64,
}

impl Default for InterruptUnit {
    fn default() -> InterruptUnit {
        InterruptUnit::new()
    }
}

impl Debug for InterruptUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterruptUnit")
            .field("pending", &self.pending.len())
            .field("next_sequence", &self.next_sequence)
            .finish()
    }
}

impl InterruptUnit {
    pub fn new() -> InterruptUnit {
        InterruptUnit {
            pending: KeyedPriorityQueue::new(),
            next_sequence: 0,
        }
    }

    pub fn raise(&mut self, interrupt: MachineInterrupt) {
        event!(Level::DEBUG, "interrupt raised: {interrupt}");
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.pending.push(
            PendingInterrupt {
                sequence,
                interrupt,
            },
            Reverse((interrupt.class, sequence)),
        );
    }

    /// Remove and return the most urgent interrupt which may be taken
    /// now.  Deferrable interrupts are passed over (but kept) unless
    /// `deferrable_enabled` is set.
    pub fn take_next(&mut self, deferrable_enabled: bool) -> Option<MachineInterrupt> {
        let mut held: Vec<(PendingInterrupt, Priority)> = Vec::new();
        let mut found: Option<MachineInterrupt> = None;
        while let Some((pending, priority)) = self.pending.pop() {
            if deferrable_enabled || !pending.interrupt.is_deferrable() {
                found = Some(pending.interrupt);
                break;
            }
            held.push((pending, priority));
        }
        for (pending, priority) in held {
            self.pending.push(pending, priority);
        }
        found
    }

    pub fn is_pending(&self, class: InterruptClass) -> bool {
        self.pending.iter().any(|(p, _)| p.interrupt.class == class)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending = KeyedPriorityQueue::new();
    }
}
