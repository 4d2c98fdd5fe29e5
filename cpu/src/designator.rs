//! The designator register.
//!
//! Each bit of the designator register controls some aspect of
//! processor behaviour.  Bits are numbered from the most significant
//! end, so bit n has the value `1 << (35 - n)`.
use std::fmt::{self, Debug, Formatter};

use serde::Serialize;

use base::prelude::*;

#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DesignatorRegister(Word36);

const fn mask(bit: u32) -> u64 {
    1 << (35 - bit)
}

macro_rules! designator_bit {
    ($bit:expr, $getter:ident, $setter:ident) => {
        pub fn $getter(&self) -> bool {
            self.0.bits() & mask($bit) != 0
        }

        pub fn $setter(&mut self, value: bool) {
            self.set_bit($bit, value);
        }
    };
}

impl DesignatorRegister {
    pub const ACTIVITY_LEVEL_QUEUE_MONITOR: u32 = 0;
    pub const FAULT_HANDLING_IN_PROGRESS: u32 = 6;
    pub const EXECUTIVE_24BIT_INDEXING: u32 = 11;
    pub const QUANTUM_TIMER_ENABLED: u32 = 12;
    pub const DEFERRABLE_INTERRUPT_ENABLED: u32 = 13;
    pub const BASIC_MODE_ENABLED: u32 = 16;
    pub const EXEC_REGISTER_SET_SELECTED: u32 = 17;
    pub const CARRY: u32 = 18;
    pub const OVERFLOW: u32 = 19;
    pub const CHARACTERISTIC_UNDERFLOW: u32 = 21;
    pub const CHARACTERISTIC_OVERFLOW: u32 = 22;
    pub const DIVIDE_CHECK: u32 = 23;
    pub const OPERATION_TRAP_ENABLED: u32 = 27;
    pub const ARITHMETIC_EXCEPTION_ENABLED: u32 = 29;
    pub const BASIC_MODE_BASE_REGISTER_SELECTION: u32 = 31;
    pub const QUARTER_WORD_MODE_ENABLED: u32 = 32;

    pub const fn new(value: Word36) -> DesignatorRegister {
        DesignatorRegister(value)
    }

    pub fn word(&self) -> Word36 {
        self.0
    }

    pub fn bit(&self, bit: u32) -> bool {
        self.0.bits() & mask(bit) != 0
    }

    pub fn set_bit(&mut self, bit: u32, value: bool) {
        let bits = if value {
            self.0.bits() | mask(bit)
        } else {
            self.0.bits() & !mask(bit)
        };
        self.0 = Word36::truncate(bits);
    }

    designator_bit!(0, activity_level_queue_monitor_enabled, set_activity_level_queue_monitor_enabled);
    designator_bit!(6, fault_handling_in_progress, set_fault_handling_in_progress);
    designator_bit!(11, executive_24bit_indexing_enabled, set_executive_24bit_indexing_enabled);
    designator_bit!(12, quantum_timer_enabled, set_quantum_timer_enabled);
    designator_bit!(13, deferrable_interrupt_enabled, set_deferrable_interrupt_enabled);
    designator_bit!(16, basic_mode_enabled, set_basic_mode_enabled);
    designator_bit!(17, exec_register_set_selected, set_exec_register_set_selected);
    designator_bit!(18, carry, set_carry);
    designator_bit!(19, overflow, set_overflow);
    designator_bit!(21, characteristic_underflow, set_characteristic_underflow);
    designator_bit!(22, characteristic_overflow, set_characteristic_overflow);
    designator_bit!(23, divide_check, set_divide_check);
    designator_bit!(27, operation_trap_enabled, set_operation_trap_enabled);
    designator_bit!(29, arithmetic_exception_enabled, set_arithmetic_exception_enabled);
    designator_bit!(31, basic_mode_base_register_selection, set_basic_mode_base_register_selection);
    designator_bit!(32, quarter_word_mode_enabled, set_quarter_word_mode_enabled);

    /// The processor privilege (bits 14-15); 0 is the most
    /// privileged, 3 the least.
    pub fn processor_privilege(&self) -> u8 {
        ((self.0.bits() >> (35 - 15)) & 0o3) as u8
    }

    pub fn set_processor_privilege(&mut self, pp: u8) {
        let m: u64 = 0o3 << (35 - 15);
        self.0 = Word36::truncate((self.0.bits() & !m) | ((u64::from(pp) & 0o3) << (35 - 15)));
    }

    pub fn addressing_mode(&self) -> AddressingMode {
        if self.basic_mode_enabled() {
            AddressingMode::Basic
        } else {
            AddressingMode::Extended
        }
    }

    /// Bits 12 through 17, which a return control stack frame
    /// preserves.
    pub fn bits_12_through_17(&self) -> u8 {
        ((self.0.bits() >> (35 - 17)) & 0o77) as u8
    }

    pub fn set_bits_12_through_17(&mut self, value: u8) {
        let m: u64 = 0o77 << (35 - 17);
        self.0 = Word36::truncate((self.0.bits() & !m) | ((u64::from(value) & 0o77) << (35 - 17)));
    }
}

impl From<Word36> for DesignatorRegister {
    fn from(w: Word36) -> DesignatorRegister {
        DesignatorRegister(w)
    }
}

impl Debug for DesignatorRegister {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DesignatorRegister{{{:012o} pp={} {}}}",
            self.0.bits(),
            self.processor_privilege(),
            if self.basic_mode_enabled() {
                "basic"
            } else {
                "extended"
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_positions() {
        let mut dr = DesignatorRegister::default();
        dr.set_basic_mode_enabled(true);
        assert_eq!(dr.word().bits(), 0o000_002_000_000);
        dr.set_basic_mode_enabled(false);
        dr.set_quarter_word_mode_enabled(true);
        assert_eq!(dr.word().bits(), 0o000_000_000_010);
        dr.set_quarter_word_mode_enabled(false);
        dr.set_activity_level_queue_monitor_enabled(true);
        assert_eq!(dr.word().bits(), 0o400_000_000_000);
    }

    #[test]
    fn test_processor_privilege() {
        let mut dr = DesignatorRegister::default();
        dr.set_processor_privilege(3);
        assert_eq!(dr.processor_privilege(), 3);
        assert_eq!(dr.word().bits(), 0o000_014_000_000);
        dr.set_processor_privilege(1);
        assert_eq!(dr.processor_privilege(), 1);
        assert!(!dr.basic_mode_enabled());
    }

    #[test]
    fn test_bits_12_through_17() {
        let mut dr = DesignatorRegister::default();
        dr.set_deferrable_interrupt_enabled(true);
        dr.set_exec_register_set_selected(true);
        dr.set_carry(true);
        assert_eq!(dr.bits_12_through_17(), 0o21);
        let mut other = DesignatorRegister::default();
        other.set_bits_12_through_17(dr.bits_12_through_17());
        assert!(other.deferrable_interrupt_enabled());
        assert!(other.exec_register_set_selected());
        assert!(!other.carry());
    }
}
