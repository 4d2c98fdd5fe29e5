//! Implementations of the load and store instructions.
//!
//! - LA, LNA, LMA, LNMA: [`InstructionProcessor::op_la`] and friends
//! - LR, LX, LXM, LXI, LXSI, LXLM
//! - LAQW, SAQW: quarter words selected by an index register
//! - DL, DS: double words
//! - LRS, SRS: register strings
//! - SA, SNA, SMA, SR, SX
//! - SZ, SNZ, SP1, SN1, SFS, SFZ, SAS, SAZ: [`InstructionProcessor::op_store_constant`]
use base::prelude::*;

use super::address::OperandLocation;
use super::{InstructionProcessor, OpResult, ProgramCounterChange};
use crate::grs::{IndexRegister, GRS_SIZE};

/// The fields of an LRS or SRS descriptor: two areas of the general
/// register set, each a starting index and a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RegisterStringDescriptor {
    first_area: usize,
    first_count: usize,
    second_area: usize,
    second_count: usize,
}

impl RegisterStringDescriptor {
    fn from_word(w: Word36) -> RegisterStringDescriptor {
        let field = |shift: u32| ((w.bits() >> shift) & 0o177) as usize;
        RegisterStringDescriptor {
            first_area: field(0),
            first_count: field(9),
            second_area: field(18),
            second_count: field(27),
        }
    }

    /// The GRS indices covered, in transfer order.
    fn registers(&self) -> Vec<usize> {
        (0..self.first_count)
            .map(|k| (self.first_area + k) % GRS_SIZE)
            .chain((0..self.second_count).map(|k| (self.second_area + k) % GRS_SIZE))
            .collect()
    }
}

fn store_constant_value(function: Function) -> Word36 {
    match function {
        Function::Snz => Word36::NEGATIVE_ZERO,
        Function::Sp1 => Word36::ONE,
        Function::Sn1 => Word36::NEGATIVE_ONE,
        Function::Sfs => Word36::truncate(0o050_505_050_505),
        Function::Sfz => Word36::truncate(0o060_606_060_606),
        Function::Sas => Word36::truncate(0o040_040_040_040),
        Function::Saz => Word36::truncate(0o060_060_060_060),
        _ => Word36::ZERO,
    }
}

impl InstructionProcessor {
    fn load_register(&mut self, index: usize, transform: fn(Word36) -> Word36) -> OpResult {
        let operand = self.fetch_operand(true, true, true, true)?;
        self.set_grs(index, transform(operand));
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements LA (load A).
    pub(super) fn op_la(&mut self) -> OpResult {
        let index = self.a_register(self.current.a());
        self.load_register(index, |w| w)
    }

    /// Implements LNA (load negative A).
    pub(super) fn op_lna(&mut self) -> OpResult {
        let index = self.a_register(self.current.a());
        self.load_register(index, Word36::negate)
    }

    /// Implements LMA (load magnitude A).
    pub(super) fn op_lma(&mut self) -> OpResult {
        let index = self.a_register(self.current.a());
        self.load_register(index, Word36::magnitude)
    }

    /// Implements LNMA (load negative magnitude A).
    pub(super) fn op_lnma(&mut self) -> OpResult {
        let index = self.a_register(self.current.a());
        self.load_register(index, |w| w.magnitude().negate())
    }

    pub(super) fn op_lr(&mut self) -> OpResult {
        let index = self.r_register(self.current.a());
        self.load_register(index, |w| w)
    }

    pub(super) fn op_lx(&mut self) -> OpResult {
        let index = self.x_register(self.current.a());
        self.load_register(index, |w| w)
    }

    fn load_index_field<F>(&mut self, allow_immediate: bool, allow_partial: bool, update: F) -> OpResult
    where
        F: FnOnce(IndexRegister, u32) -> IndexRegister,
    {
        let operand = self.fetch_operand(false, true, allow_immediate, allow_partial)?;
        let index = self.x_register(self.current.a());
        let xreg = IndexRegister(self.get_grs(index));
        let field = (operand.bits() & 0o77_777_777) as u32;
        self.set_grs(index, update(xreg, field).0);
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements LXM (load index modifier): the low 18 bits of the
    /// operand replace XM.
    pub(super) fn op_lxm(&mut self) -> OpResult {
        self.load_index_field(true, true, |x, v| x.with_xm(v & 0o777_777))
    }

    /// Implements LXI (load index increment).
    pub(super) fn op_lxi(&mut self) -> OpResult {
        self.load_index_field(true, true, |x, v| x.with_xi(v & 0o777_777))
    }

    /// Implements LXSI (load index short increment), which sets the
    /// 12-bit increment used by 24-bit indexing.
    pub(super) fn op_lxsi(&mut self) -> OpResult {
        self.load_index_field(true, true, |x, v| x.with_xi12(v & 0o7777))
    }

    /// Implements LXLM (load index long modifier).  The j field is
    /// part of the function code, so the whole operand word is used.
    pub(super) fn op_lxlm(&mut self) -> OpResult {
        self.load_index_field(false, false, |x, v| x.with_xm24(v))
    }

    /// The quarter word (0-3) selected by bits 4-5 of X(x).
    fn index_selected_quarter(&self) -> u32 {
        let index = self.x_register(self.current.x());
        ((self.get_grs(index).bits() >> 30) & 0o3) as u32
    }

    /// Implements LAQW (load A quarter word).
    pub(super) fn op_laqw(&mut self) -> OpResult {
        let quarter = self.index_selected_quarter();
        let word = self.fetch_operand(false, true, false, false)?;
        let value = (word.bits() >> (27 - 9 * quarter)) & 0o777;
        let index = self.a_register(self.current.a());
        self.set_grs(index, Word36::truncate(value));
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements SAQW (store A quarter word).
    pub(super) fn op_saqw(&mut self) -> OpResult {
        let quarter = self.index_selected_quarter();
        let value = self.get_grs(self.a_register(self.current.a())).bits() & 0o777;
        let shift = 27 - 9 * quarter;
        self.update_operand(true, false, |word| {
            Ok(Word36::truncate(
                (word.bits() & !(0o777 << shift)) | (value << shift),
            ))
        })?;
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements DL (double load).
    pub(super) fn op_dl(&mut self) -> OpResult {
        let words = self.fetch_consecutive(true, 2)?;
        let a = self.current.a();
        for (k, word) in (0_u8..).zip(words) {
            let index = self.a_register(a + k);
            self.set_grs(index, word);
        }
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements DS (double store).
    pub(super) fn op_ds(&mut self) -> OpResult {
        let a = self.current.a();
        let values = [
            self.get_grs(self.a_register(a)),
            self.get_grs(self.a_register(a + 1)),
        ];
        self.store_consecutive(true, &values)?;
        Ok(ProgramCounterChange::Advance)
    }

    fn register_string_descriptor(&self) -> RegisterStringDescriptor {
        RegisterStringDescriptor::from_word(self.get_grs(self.a_register(self.current.a())))
    }

    /// Implements LRS (load register set).  A(a) describes up to two
    /// areas of the register set, which are loaded from consecutive
    /// words of storage.
    pub(super) fn op_lrs(&mut self) -> OpResult {
        let registers = self.register_string_descriptor().registers();
        if registers.is_empty() {
            return Ok(ProgramCounterChange::Advance);
        }
        for index in &registers {
            self.check_access(OperandLocation::Grs(*index), true)?;
        }
        let words = self.fetch_consecutive(false, registers.len())?;
        for (index, word) in registers.into_iter().zip(words) {
            self.set_grs(index, word);
        }
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements SRS (store register set), the inverse of LRS.
    pub(super) fn op_srs(&mut self) -> OpResult {
        let registers = self.register_string_descriptor().registers();
        if registers.is_empty() {
            return Ok(ProgramCounterChange::Advance);
        }
        let mut values = Vec::with_capacity(registers.len());
        for index in registers {
            values.push(self.read_location(OperandLocation::Grs(index))?);
        }
        self.store_consecutive(false, &values)?;
        Ok(ProgramCounterChange::Advance)
    }

    fn store_register(&mut self, value: Word36) -> OpResult {
        self.store_operand(true, true, true, value)?;
        Ok(ProgramCounterChange::Advance)
    }

    /// Implements SA (store A).
    pub(super) fn op_sa(&mut self) -> OpResult {
        let value = self.get_grs(self.a_register(self.current.a()));
        self.store_register(value)
    }

    /// Implements SNA (store negative A).
    pub(super) fn op_sna(&mut self) -> OpResult {
        let value = self.get_grs(self.a_register(self.current.a()));
        self.store_register(value.negate())
    }

    /// Implements SMA (store magnitude A).
    pub(super) fn op_sma(&mut self) -> OpResult {
        let value = self.get_grs(self.a_register(self.current.a()));
        self.store_register(value.magnitude())
    }

    pub(super) fn op_sr(&mut self) -> OpResult {
        let value = self.get_grs(self.r_register(self.current.a()));
        self.store_register(value)
    }

    pub(super) fn op_sx(&mut self) -> OpResult {
        let value = self.get_grs(self.x_register(self.current.a()));
        self.store_register(value)
    }

    /// Implements the store-constant instructions (function 005 with a
    /// selecting the constant).
    pub(super) fn op_store_constant(&mut self, function: Function) -> OpResult {
        self.store_operand(false, true, true, store_constant_value(function))?;
        Ok(ProgramCounterChange::Advance)
    }
}
