//! Operand address resolution.
//!
//! The steps, for an instruction which refers to storage, are:
//!
//! 1. Form the relative address: the displacement (u in basic mode,
//!    d in extended mode) plus the modifier of the index register
//!    named by x.  If h is set the index register is incremented.
//! 2. In basic mode, while i is set, read the word at that address
//!    and take new x, h, i and u fields from it (indirection).
//! 3. Decide whether the address refers to a general register (GRS
//!    shadowing) or to storage, and if storage which base register
//!    maps it.
//! 4. Check limits and access permissions.
//!
//! Immediate operands (j = U or XU) skip all of this; see
//! [`InstructionProcessor::immediate_operand`].
use base::prelude::*;

use super::history::StorageAccess;
use super::InstructionProcessor;
use crate::grs::{is_access_allowed, IndexRegister, GRS_SIZE};
use crate::interrupt::{MachineInterrupt, ReferenceViolationKind};

/// Relative addresses below this refer to the general register set
/// when GRS shadowing applies.
const GRS_SHADOW_LIMIT: u32 = 0o200;

/// Where an operand lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandLocation {
    Grs(usize),
    Storage {
        base_register: usize,
        relative: u32,
        absolute: usize,
    },
}

fn reference_violation(kind: ReferenceViolationKind) -> MachineInterrupt {
    MachineInterrupt::reference_violation(kind, false)
}

impl InstructionProcessor {
    pub(super) fn indexing_24bit(&self) -> bool {
        self.designator.processor_privilege() < 2
            && self.designator.executive_24bit_indexing_enabled()
    }

    /// Form the relative address of `inst`, auto-incrementing its index
    /// register if h is set.  Only the modifier takes part; the
    /// increment is added afterwards.
    pub(super) fn relative_address_of(&mut self, inst: InstructionWord) -> u32 {
        let displacement = match self.designator.addressing_mode() {
            AddressingMode::Basic => inst.u(),
            AddressingMode::Extended => u32::from(inst.d()),
        };
        if inst.x() == 0 {
            return displacement;
        }
        let wide = self.indexing_24bit();
        let index = self.x_register(inst.x());
        let xreg = IndexRegister(self.get_grs(index));
        let (modifier, width) = if wide {
            (xreg.xm24(), 24)
        } else {
            (xreg.xm(), 18)
        };
        let relative = add_narrow(u64::from(displacement), u64::from(modifier), width) as u32;
        if inst.h() {
            self.set_grs(index, xreg.incremented(wide).0);
        }
        relative
    }

    /// The relative address of the current instruction without any
    /// indirection; used where the address is itself the operand (a
    /// shift count, a UPI number, a halt code).
    pub(super) fn plain_relative_address(&mut self) -> u32 {
        self.relative_address_of(self.current)
    }

    /// The value of a U or XU operand.
    pub(super) fn immediate_operand(&mut self, designator: PartialWord) -> Word36 {
        let inst = self.current;
        let pp = self.designator.processor_privilege();
        let wide = (pp < 2 && self.designator.executive_24bit_indexing_enabled())
            || (pp > 1 && inst.i());
        let width = if wide { 24 } else { 18 };
        let value: u64 = if inst.x() == 0 {
            match inst.hiu() {
                0o777_777 => 0,
                hiu => u64::from(hiu),
            }
        } else {
            let u = match inst.u() {
                0o177_777 => 0,
                u => u64::from(u),
            };
            let index = self.x_register(inst.x());
            let xreg = IndexRegister(self.get_grs(index));
            let indexing_24 = self.indexing_24bit();
            let modifier = if indexing_24 { xreg.xm24() } else { xreg.xm() };
            if inst.h() {
                self.set_grs(index, xreg.incremented(indexing_24).0);
            }
            add_narrow(u, u64::from(modifier), width)
        };
        match designator {
            PartialWord::XU => Word36::sign_extend(value, width).normalize_zero(),
            _ => Word36::truncate(value & ((1 << width) - 1)),
        }
    }

    /// The base register used by an extended mode instruction: one of
    /// B0-B15 selected by b, or (for privileged programs) one of
    /// B0-B31 selected by i and b together.
    pub(super) fn extended_base_register_index(&self, inst: InstructionWord) -> usize {
        if self.designator.processor_privilege() < 2 {
            usize::from(inst.ib())
        } else {
            usize::from(inst.b())
        }
    }

    /// Look for the basic mode bank (B12-B15) which contains `relative`.
    /// Finding it in one of the last two places searched flips the
    /// search order, if `update` is set.
    pub(super) fn find_basic_mode_bank(&mut self, relative: u32, update: bool) -> Option<usize> {
        let order: [usize; 4] = if self.designator.basic_mode_base_register_selection() {
            [13, 15, 12, 14]
        } else {
            [12, 14, 13, 15]
        };
        let position = order
            .iter()
            .position(|&index| self.base_registers[index].contains(relative))?;
        if update && position >= 2 {
            let selection = self.designator.basic_mode_base_register_selection();
            self.designator
                .set_basic_mode_base_register_selection(!selection);
        }
        Some(order[position])
    }

    /// Read the instruction addressed by the program address register:
    /// through B0 in extended mode, through the basic mode bank search
    /// in basic mode.  Executing needs read permission.
    pub(super) fn fetch_instruction(&mut self) -> Result<InstructionWord, MachineInterrupt> {
        let violation = |kind| MachineInterrupt::reference_violation(kind, true);
        let pc = self.par.program_counter;
        let base_register = if self.designator.basic_mode_enabled() {
            self.find_basic_mode_bank(pc, true)
                .ok_or_else(|| violation(ReferenceViolationKind::StorageLimits))?
        } else {
            0
        };
        let br = self.base_registers[base_register];
        let absolute = br
            .absolute(pc)
            .ok_or_else(|| violation(ReferenceViolationKind::StorageLimits))?;
        if !br.effective_permissions(self.indicator_key.access_key).read {
            return Err(violation(ReferenceViolationKind::ExecuteAccess));
        }
        self.check_breakpoint(absolute, StorageAccess::Fetch);
        self.storage
            .read(absolute)
            .map(InstructionWord::from)
            .map_err(|_| MachineInterrupt::hardware_check(absolute))
    }

    /// Decide where relative address `relative` of `inst` lives.
    pub(super) fn locate(
        &mut self,
        inst: InstructionWord,
        relative: u32,
        grs_check: bool,
    ) -> Result<OperandLocation, MachineInterrupt> {
        let basic = self.designator.basic_mode_enabled();
        if grs_check
            && relative < GRS_SHADOW_LIMIT
            && (basic || self.extended_base_register_index(inst) == 0)
        {
            return Ok(OperandLocation::Grs(relative as usize));
        }
        let base_register = if basic {
            self.find_basic_mode_bank(relative, true)
                .ok_or_else(|| reference_violation(ReferenceViolationKind::StorageLimits))?
        } else {
            self.extended_base_register_index(inst)
        };
        let absolute = self.base_registers[base_register]
            .absolute(relative)
            .ok_or_else(|| reference_violation(ReferenceViolationKind::StorageLimits))?;
        Ok(OperandLocation::Storage {
            base_register,
            relative,
            absolute,
        })
    }

    /// Form the relative address of the current instruction, following
    /// basic mode indirection.  Returns the final relative address and
    /// the instruction whose fields produced it.
    fn follow_indirection(
        &mut self,
        grs_check: bool,
    ) -> Result<(InstructionWord, u32), MachineInterrupt> {
        let mut inst = self.current;
        let mut depth = 0;
        loop {
            let relative = self.relative_address_of(inst);
            if !(self.designator.basic_mode_enabled()
                && inst.i()
                && depth < self.config.indirect_chain_limit)
            {
                return Ok((inst, relative));
            }
            let location = self.locate(inst, relative, grs_check)?;
            let pointer = self.read_location(location)?;
            inst = inst.with_xhiu_of(pointer);
            depth += 1;
        }
    }

    pub(super) fn resolve_operand(
        &mut self,
        grs_check: bool,
    ) -> Result<OperandLocation, MachineInterrupt> {
        let (inst, relative) = self.follow_indirection(grs_check)?;
        self.locate(inst, relative, grs_check)
    }

    /// The target of a jump.  Nothing is read from the target itself.
    pub(super) fn jump_operand(&mut self) -> Result<u32, MachineInterrupt> {
        self.follow_indirection(true).map(|(_, relative)| relative)
    }

    pub(super) fn check_access(
        &mut self,
        location: OperandLocation,
        write: bool,
    ) -> Result<(), MachineInterrupt> {
        match location {
            OperandLocation::Grs(index) => {
                if is_access_allowed(index, self.designator.processor_privilege(), write) {
                    Ok(())
                } else {
                    Err(reference_violation(
                        ReferenceViolationKind::GeneralRegisterSet,
                    ))
                }
            }
            OperandLocation::Storage {
                base_register,
                absolute,
                ..
            } => {
                let permissions = self.base_registers[base_register]
                    .effective_permissions(self.indicator_key.access_key);
                if write && !permissions.write {
                    Err(reference_violation(ReferenceViolationKind::WriteAccess))
                } else if !write && !permissions.read {
                    Err(reference_violation(ReferenceViolationKind::ReadAccess))
                } else {
                    self.check_breakpoint(
                        absolute,
                        if write {
                            StorageAccess::Write
                        } else {
                            StorageAccess::Read
                        },
                    );
                    Ok(())
                }
            }
        }
    }

    pub(super) fn check_breakpoint(&mut self, absolute: usize, access: StorageAccess) {
        if self
            .breakpoint
            .is_some_and(|bp| bp.matches(absolute, access))
        {
            self.indicator_key.breakpoint_register_match = true;
            self.breakpoint_hit = Some(absolute);
        }
    }

    /// Read a location without any access check.
    pub(super) fn load_raw(&self, location: OperandLocation) -> Result<Word36, MachineInterrupt> {
        match location {
            OperandLocation::Grs(index) => Ok(self.get_grs(index)),
            OperandLocation::Storage { absolute, .. } => self
                .storage
                .read(absolute)
                .map_err(|_| MachineInterrupt::hardware_check(absolute)),
        }
    }

    /// Write a location without any access check.
    pub(super) fn store_raw(
        &mut self,
        location: OperandLocation,
        value: Word36,
    ) -> Result<(), MachineInterrupt> {
        match location {
            OperandLocation::Grs(index) => {
                self.set_grs(index, value);
                Ok(())
            }
            OperandLocation::Storage { absolute, .. } => self
                .storage
                .write(absolute, value)
                .map_err(|_| MachineInterrupt::hardware_check(absolute)),
        }
    }

    pub(super) fn read_location(
        &mut self,
        location: OperandLocation,
    ) -> Result<Word36, MachineInterrupt> {
        self.check_access(location, false)?;
        self.load_raw(location)
    }

    pub(super) fn write_location(
        &mut self,
        location: OperandLocation,
        value: Word36,
    ) -> Result<(), MachineInterrupt> {
        self.check_access(location, true)?;
        self.store_raw(location, value)
    }

    /// The partial word designator selected by the j field of the
    /// current instruction.
    pub(super) fn partial_word_designator(&self) -> PartialWord {
        PartialWord::from_j(
            self.current.j(),
            self.designator.quarter_word_mode_enabled(),
        )
    }

    /// Fetch the operand of the current instruction.
    ///
    /// - `grs_destination`: the operand is going into a register, so a
    ///   GRS-resident operand is transferred whole.
    /// - `grs_check`: low relative addresses refer to the GRS.
    /// - `allow_immediate`: j = U or XU gives an immediate operand.
    /// - `allow_partial`: j selects a field of the operand word.
    pub(super) fn fetch_operand(
        &mut self,
        grs_destination: bool,
        grs_check: bool,
        allow_immediate: bool,
        allow_partial: bool,
    ) -> Result<Word36, MachineInterrupt> {
        let designator = if allow_partial {
            self.partial_word_designator()
        } else {
            PartialWord::W
        };
        if allow_immediate && designator.is_immediate() {
            return Ok(self.immediate_operand(designator));
        }
        let location = self.resolve_operand(grs_check)?;
        let word = self.read_location(location)?;
        if grs_destination && matches!(location, OperandLocation::Grs(_)) {
            Ok(word)
        } else {
            Ok(extract_field(word, designator))
        }
    }

    /// Store `value` into the operand of the current instruction,
    /// through the partial word designator if `allow_partial` is set.
    /// With j = U or XU the instruction completes without storing.
    pub(super) fn store_operand(
        &mut self,
        grs_source: bool,
        grs_check: bool,
        allow_partial: bool,
        value: Word36,
    ) -> Result<(), MachineInterrupt> {
        let designator = if allow_partial {
            self.partial_word_designator()
        } else {
            PartialWord::W
        };
        if designator.is_immediate() {
            return Ok(());
        }
        self.store_field(grs_source, grs_check, designator, value)
    }

    pub(super) fn store_field(
        &mut self,
        grs_source: bool,
        grs_check: bool,
        designator: PartialWord,
        value: Word36,
    ) -> Result<(), MachineInterrupt> {
        let location = self.resolve_operand(grs_check)?;
        let whole_word = designator == PartialWord::W
            || (grs_source && matches!(location, OperandLocation::Grs(_)));
        if whole_word {
            return self.write_location(location, value);
        }
        self.check_access(location, true)?;
        let merged = insert_field(self.load_raw(location)?, designator, value);
        self.store_raw(location, merged)
    }

    /// Read, modify and write back the operand of the current
    /// instruction.  `update` is given the (partial word) operand and
    /// returns its replacement; the result is the field as stored.
    pub(super) fn update_operand<F>(
        &mut self,
        grs_check: bool,
        allow_partial: bool,
        update: F,
    ) -> Result<Word36, MachineInterrupt>
    where
        F: FnOnce(Word36) -> Result<Word36, MachineInterrupt>,
    {
        let designator = if allow_partial {
            self.partial_word_designator()
        } else {
            PartialWord::W
        };
        if designator.is_immediate() {
            let operand = self.immediate_operand(designator);
            return update(operand);
        }
        let location = self.resolve_operand(grs_check)?;
        self.check_access(location, false)?;
        self.check_access(location, true)?;
        let word = self.load_raw(location)?;
        let updated = insert_field(word, designator, update(extract_field(word, designator))?);
        self.store_raw(location, updated)?;
        Ok(extract_field(updated, designator))
    }

    /// Fetch `count` consecutive words starting at the operand.  In
    /// the GRS the words wrap from 0177 to 0; in storage they must all
    /// lie within the same bank.
    pub(super) fn fetch_consecutive(
        &mut self,
        grs_check: bool,
        count: usize,
    ) -> Result<Vec<Word36>, MachineInterrupt> {
        let first = self.resolve_operand(grs_check)?;
        let locations = self.consecutive_locations(first, count)?;
        let mut words = Vec::with_capacity(count);
        for location in locations {
            words.push(self.read_location(location)?);
        }
        Ok(words)
    }

    /// Store `values` into consecutive locations starting at the
    /// operand.  Every location is checked before any is written.
    pub(super) fn store_consecutive(
        &mut self,
        grs_check: bool,
        values: &[Word36],
    ) -> Result<(), MachineInterrupt> {
        let first = self.resolve_operand(grs_check)?;
        let locations = self.consecutive_locations(first, values.len())?;
        for location in &locations {
            self.check_access(*location, true)?;
        }
        for (location, value) in locations.into_iter().zip(values) {
            self.store_raw(location, *value)?;
        }
        Ok(())
    }

    fn consecutive_locations(
        &self,
        first: OperandLocation,
        count: usize,
    ) -> Result<Vec<OperandLocation>, MachineInterrupt> {
        (0..count)
            .map(|k| match first {
                OperandLocation::Grs(index) => Ok(OperandLocation::Grs((index + k) % GRS_SIZE)),
                OperandLocation::Storage {
                    base_register,
                    relative,
                    ..
                } => {
                    let relative = relative + k as u32;
                    self.base_registers[base_register]
                        .absolute(relative)
                        .map(|absolute| OperandLocation::Storage {
                            base_register,
                            relative,
                            absolute,
                        })
                        .ok_or_else(|| {
                            reference_violation(ReferenceViolationKind::StorageLimits)
                        })
                }
            })
            .collect()
    }
}
