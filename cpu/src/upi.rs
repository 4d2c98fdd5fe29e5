//! Inter-processor signalling.
//!
//! Each processor has a Universal Processor Interface (UPI) number
//! and a port holding the interrupts other processors have sent it.
//! A port is the only part of a processor another thread may touch:
//! the inbound queue sits behind a mutex and the running flag is an
//! atomic.  The owning processor moves queued messages into its own
//! interrupt unit at the start of each cycle.
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{event, Level};

use super::interrupt::MachineInterrupt;

#[derive(Debug, Default)]
pub struct UpiPort {
    inbound: Mutex<VecDeque<MachineInterrupt>>,
    running: AtomicBool,
}

impl UpiPort {
    pub fn new() -> UpiPort {
        UpiPort::default()
    }

    pub fn deliver(&self, interrupt: MachineInterrupt) {
        self.inbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(interrupt);
    }

    /// Remove every queued message, oldest first.
    pub fn drain(&self) -> Vec<MachineInterrupt> {
        self.inbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.inbound
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalError {
    NoSuchProcessor(u8),
}

impl Display for SignalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        match self {
            SignalError::NoSuchProcessor(upi) => write!(f, "there is no processor with UPI {upi}"),
        }
    }
}

impl Error for SignalError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// A processor addressed itself; nothing happens.
    SelfAddressed,
    Delivered,
}

/// The ports of every processor in the system, indexed by UPI.
#[derive(Debug, Clone)]
pub struct SignalChannel {
    ports: Arc<[UpiPort]>,
}

impl SignalChannel {
    pub fn new(processor_count: usize) -> SignalChannel {
        SignalChannel {
            ports: (0..processor_count).map(|_| UpiPort::new()).collect(),
        }
    }

    pub fn port(&self, upi: u8) -> Option<&UpiPort> {
        self.ports.get(usize::from(upi))
    }

    pub fn len(&self) -> usize {
        self.ports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }

    /// Send a UPI interrupt from processor `from` to processor `to`.
    /// The target need not be running; if it is stopped the message
    /// waits until it is started again.
    pub fn send(&self, from: u8, to: u8) -> Result<SendOutcome, SignalError> {
        if self.port(from).is_none() {
            return Err(SignalError::NoSuchProcessor(from));
        }
        let target = self.port(to).ok_or(SignalError::NoSuchProcessor(to))?;
        if from == to {
            event!(Level::DEBUG, "UPI {from} signalled itself; ignored");
            return Ok(SendOutcome::SelfAddressed);
        }
        event!(Level::DEBUG, "UPI {from} signals UPI {to}");
        target.deliver(MachineInterrupt::upi_normal(from));
        Ok(SendOutcome::Delivered)
    }
}
