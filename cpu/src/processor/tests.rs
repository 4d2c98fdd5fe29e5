use base::prelude::*;

use super::testing::{
    assert_octal_eq, basic_op, data_word, first, first_interrupt_frame, halt, imm, op, op_h,
    register, user, w, TestProgram, BASIC_DATA_START, CODE_BANK, CODE_START,
};
use super::BreakpointRegister;
use crate::designator::DesignatorRegister;
use crate::grs::{register_index, IndexRegister, RegisterName};
use crate::image::BankImage;
use crate::interrupt::InterruptClass;
use crate::registers::{LevelBdi, ProgramAddressRegister};
use crate::stop::StopReason;
use crate::system::System;

use RegisterName::{A, EX, X};

fn assert_stopped(system: &System, reason: StopReason, detail: u64) {
    let ip = first(system);
    assert!(!ip.is_running());
    assert_eq!(ip.latest_stop_reason(), reason);
    assert_octal_eq!(ip.latest_stop_detail(), detail);
}

/// Check that the program was stopped by the handler for `class`
/// and that the interrupt carried `short_status`.
fn assert_interrupted(system: &System, class: InterruptClass, short_status: u8) {
    assert_stopped(system, StopReason::Debug, class.stop_detail());
    let ip = first(system);
    assert_eq!(ip.last_interrupt().map(|i| i.class), Some(class));
    assert_eq!(ip.indicator_key_register().short_status, short_status);
}

#[test]
fn test_halt_reports_its_operand() {
    let system = TestProgram::extended(vec![halt(0o17)]).run();
    assert_stopped(&system, StopReason::Debug, 0o17);
    assert_eq!(
        first(&system).program_address_register(),
        ProgramAddressRegister::new(CODE_BANK, CODE_START + 1)
    );
}

#[test]
fn test_load_immediate() {
    let system = TestProgram::extended(vec![
        imm(0o10, 0o16, 0, 0o1000),      // LA,U A0,01000
        imm(0o10, 0o17, 1, 0o777_776),   // LA,XU A1,-1
        imm(0o10, 0o17, 2, 0o400_000),   // LA,XU A2,0400000
        imm(0o10, 0o17, 3, 0o777_777),   // LA,XU A3,-0
        imm(0o11, 0o16, 4, 0o5),         // LNA,U A4,5
        halt(0),
    ])
    .run();
    assert_stopped(&system, StopReason::Debug, 0);
    assert_octal_eq!(register(&system, A(0)), w(0o1000));
    assert_eq!(register(&system, A(1)), Word36::NEGATIVE_ONE);
    assert_octal_eq!(register(&system, A(2)), w(0o777_777_400_000));
    assert_eq!(register(&system, A(3)), Word36::ZERO);
    assert_octal_eq!(register(&system, A(4)), w(0o777_777_777_772));
}

#[test]
fn test_index_register_auto_increment() {
    let system = TestProgram::extended(vec![
        op_h(0o10, 0, 0, 1, 2, 0o10), // LA A0,010,*X1,B2
        halt(0),
    ])
    .with_data({
        let mut data = vec![Word36::ZERO; 0o20];
        data[0o16] = w(0o555);
        data
    })
    .with_register(X(1), join_halves(2, 6))
    .run();
    assert_stopped(&system, StopReason::Debug, 0);
    assert_octal_eq!(register(&system, A(0)), w(0o555));
    assert_octal_eq!(register(&system, X(1)), w(0o000_002_000_010));
}

#[test]
fn test_index_register_auto_increment_through_registers() {
    let system = TestProgram::extended(vec![
        imm(0o26, 0o16, 1, 4),                // LXM,U X1,4
        imm(0o46, 0o16, 1, 2),                // LXI,U X1,2
        op_h(0o10, 0, 0, 1, 0, 0o101),        // LA A0,R1,*X1
        halt(0),
    ])
    .with_register(RegisterName::R(5), w(0o5555))
    .run();
    assert_stopped(&system, StopReason::Debug, 0);
    assert_octal_eq!(register(&system, X(1)), w(0o000_002_000_006));
    assert_octal_eq!(register(&system, A(0)), w(0o5555));
}

#[test]
fn test_faulting_instruction_does_not_increment() {
    // B5 is void, so the operand cannot be found.
    let system = TestProgram::extended(vec![op_h(0o10, 0, 0, 1, 5, 0o10), halt(0)])
        .with_register(X(1), join_halves(2, 6))
        .run();
    assert_interrupted(&system, InterruptClass::ReferenceViolation, 1);
    assert_octal_eq!(register(&system, X(1)), w(0o000_002_000_006));
    let frame = first_interrupt_frame(&system);
    assert_eq!(
        ProgramAddressRegister::from_word(frame[0]).program_counter,
        CODE_START
    );
}

#[test]
fn test_low_addresses_refer_to_registers() {
    let system = TestProgram::extended(vec![
        op(0o10, 0, 0, 0, 0, 0o20),  // LA A0,020 (A4)
        op(0o01, 0, 0, 0, 0, 0o100), // SA A0,0100 (R0)
        halt(0),
    ])
    .with_register(A(4), w(0o4444))
    .run();
    assert_stopped(&system, StopReason::Debug, 0);
    assert_octal_eq!(register(&system, A(0)), w(0o4444));
    assert_octal_eq!(register(&system, RegisterName::R(0)), w(0o4444));
}

#[test]
fn test_executive_registers_are_protected() {
    let system = TestProgram::extended(vec![op(0o01, 0, 0, 0, 0, 0o140), halt(0)])
        .with_privilege(3)
        .run();
    assert_interrupted(&system, InterruptClass::ReferenceViolation, 0);
}

#[test]
fn test_basic_mode_indirection() {
    let mut data = vec![Word36::ZERO; 6];
    data[0] = basic_op(0, 0, 0, 0, false, BASIC_DATA_START + 5);
    data[5] = w(0o777);
    let system = TestProgram::basic(vec![
        basic_op(0o10, 0, 0, 0, true, BASIC_DATA_START), // LA A0,*022000
        basic_op(0o10, 0, 1, 0, false, 0o20),            // LA A1,020 (A4)
        basic_op(0o77, 0o17, 0o17, 0, false, 0o11),      // HALT 011
    ])
    .with_data(data)
    .with_register(A(4), w(0o321))
    .run();
    assert_stopped(&system, StopReason::Debug, 0o11);
    assert_octal_eq!(register(&system, A(0)), w(0o777));
    assert_octal_eq!(register(&system, A(1)), w(0o321));
    assert!(first(&system).designator_register().basic_mode_enabled());
}

#[test]
fn test_basic_mode_rejects_extended_only_functions() {
    let system = TestProgram::basic(vec![basic_op(0o07, 0o16, 0o13, 0, false, 0)]).run();
    assert_interrupted(&system, InterruptClass::InvalidInstruction, 0);
}

#[test]
fn test_basic_mode_jump() {
    let system = TestProgram::basic(vec![
        basic_op(0o74, 0o04, 0, 0, false, CODE_START + 2), // J 01002
        basic_op(0o77, 0o17, 0o17, 0, false, 1),
        basic_op(0o77, 0o17, 0o17, 0, false, 2),
    ])
    .run();
    assert_stopped(&system, StopReason::Debug, 2);
    assert_eq!(first(&system).jump_history().len(), 1);
}

#[test]
fn test_partial_word_stores() {
    let mut code = vec![imm(0o10, 0o17, 0, 0o444_444)]; // LA,XU A0,0444444
    for j in 0..=0o15 {
        code.push(op(0o01, j, 0, 0, 2, u16::from(j))); // SA,j A0,j,,B2
    }
    code.push(halt(0));
    let program = TestProgram::extended(code).with_data(Vec::new());

    // Third-word mode.
    let system = program.run();
    assert_stopped(&system, StopReason::Debug, 0);
    let expected: [u64; 4] = [
        0o444_444_000_000,
        0o000_000_004_444,
        0o000_044_440_000,
        0o444_400_000_000,
    ];
    for (offset, value) in (4..).zip(expected) {
        assert_octal_eq!(data_word(&system, offset), w(value));
    }

    // Quarter-word mode.
    let mut system = program.load();
    let ip = system.processor_mut(0).expect("processor 0 exists");
    let mut dr = ip.designator_register();
    dr.set_quarter_word_mode_enabled(true);
    ip.set_designator_register(dr);
    system.start(0);
    system.run();
    assert_stopped(&system, StopReason::Debug, 0);
    let expected: [u64; 14] = [
        0o777_777_444_444,
        0o000_000_444_444,
        0o444_444_000_000,
        0o000_000_444_444,
        0o000_444_000_000,
        0o000_000_000_444,
        0o000_000_444_000,
        0o444_000_000_000,
        0o000_000_000_044,
        0o000_000_004_400,
        0o000_000_440_000,
        0o000_044_000_000,
        0o004_400_000_000,
        0o440_000_000_000,
    ];
    for (offset, value) in (0..).zip(expected) {
        assert_octal_eq!(data_word(&system, offset), w(value));
    }
}

#[test]
fn test_immediate_store_does_nothing() {
    let system = TestProgram::extended(vec![
        op(0o01, 0o16, 1, 0, 2, 2), // SA,U A1,2,,B2
        halt(0),
    ])
    .with_data(Vec::new())
    .with_register(A(1), w(0o123_456))
    .run();
    assert_stopped(&system, StopReason::Debug, 0);
    assert_eq!(data_word(&system, 2), Word36::ZERO);
}

#[test]
fn test_double_load_and_store() {
    let system = TestProgram::extended(vec![
        op(0o71, 0o13, 0, 0, 2, 0), // DL A0,0,,B2
        op(0o71, 0o12, 0, 0, 2, 4), // DS A0,4,,B2
        halt(0),
    ])
    .with_data(vec![w(1), w(2)])
    .run();
    assert_stopped(&system, StopReason::Debug, 0);
    assert_octal_eq!(register(&system, A(0)), w(1));
    assert_octal_eq!(register(&system, A(1)), w(2));
    assert_octal_eq!(data_word(&system, 4), w(1));
    assert_octal_eq!(data_word(&system, 5), w(2));
}

#[test]
fn test_increment_skips_on_zero() {
    let system = TestProgram::extended(vec![
        op(0o05, 0, 0o10, 0, 2, 0), // INC 0,,B2
        halt(1),
        halt(2),
    ])
    .with_data(vec![Word36::NEGATIVE_ONE])
    .run();
    assert_stopped(&system, StopReason::Debug, 2);
    assert!(data_word(&system, 0).is_zero());
}

#[test]
fn test_add_sets_overflow() {
    let system = TestProgram::extended(vec![
        imm(0o14, 0o16, 0, 1),              // AA,U A0,1
        op(0o74, 0o14, 0, 0, 0, 0o1004),    // JO 01004
        halt(1),
        halt(2),
        halt(4),
    ])
    .with_register(A(0), Word36::MAX_POSITIVE)
    .run();
    assert_stopped(&system, StopReason::Debug, 4);
    assert_octal_eq!(register(&system, A(0)), w(0o400_000_000_000));
    let dr = first(&system).designator_register();
    assert!(dr.overflow());
    assert!(!dr.carry());
}

#[test]
fn test_shifts() {
    let system = TestProgram::extended(vec![
        op(0o73, 0o02, 0, 0, 0, 3),     // SSL A0,3
        op(0o73, 0o01, 1, 0, 0, 36),    // DSC A1,36
        op(0o73, 0o06, 4, 0, 0, 0o17),  // LSC A4,017 (A3)
        halt(0),
    ])
    .with_register(A(0), w(0o770))
    .with_register(A(1), w(0o111))
    .with_register(A(2), w(0o222))
    .with_register(A(3), w(0o777))
    .run();
    assert_stopped(&system, StopReason::Debug, 0);
    assert_octal_eq!(register(&system, A(0)), w(0o77));
    assert_octal_eq!(register(&system, A(1)), w(0o222));
    assert_octal_eq!(register(&system, A(2)), w(0o111));
    assert_octal_eq!(register(&system, A(4)), w(0o377_400_000_000));
    assert_octal_eq!(register(&system, A(5)), w(26));
}

#[test]
fn test_jump_greater_and_decrement() {
    let system = TestProgram::extended(vec![
        op(0o70, 0, 0o14, 0, 0, 0o1000), // JGD A0,01000
        halt(0),
    ])
    .with_register(A(0), w(2))
    .run();
    assert_stopped(&system, StopReason::Debug, 0);
    assert_eq!(register(&system, A(0)), Word36::NEGATIVE_ONE);
    assert_eq!(first(&system).cycles(), 4);
}

#[test]
fn test_load_modifier_and_jump() {
    let system = TestProgram::extended(vec![
        op(0o74, 0o13, 11, 0, 0, 0o1005), // LMJ X11,01005
        halt(1),
        halt(2),
        halt(3),
        halt(4),
        halt(5),
    ])
    .run();
    assert_stopped(&system, StopReason::Debug, 5);
    assert_eq!(IndexRegister(register(&system, X(11))).xm(), CODE_START + 1);
}

#[test]
fn test_halt_jump() {
    let system = TestProgram::extended(vec![op(0o74, 0o15, 0o05, 0, 0, 0o1003)]).run();
    assert_stopped(&system, StopReason::HaltJumpExecuted, 0);
    assert_eq!(
        first(&system).program_address_register().program_counter,
        0o1003
    );
}

#[test]
fn test_allow_interrupts_and_jump() {
    let system = TestProgram::extended(vec![
        op(0o74, 0o14, 0o06, 0, 0, 0o1002), // AAIJ 01002
        halt(1),
        halt(2),
    ])
    .run();
    assert_stopped(&system, StopReason::Debug, 2);
    assert!(first(&system)
        .designator_register()
        .deferrable_interrupt_enabled());
}

#[test]
fn test_interrupt_control_jumps_need_privilege() {
    for allow in [0o06, 0o07] {
        let system = TestProgram::extended(vec![op(0o74, 0o14, allow, 0, 0, 0o1001), halt(0)])
            .with_privilege(3)
            .run();
        assert_interrupted(&system, InterruptClass::InvalidInstruction, 1);
        let saved = DesignatorRegister::from(first_interrupt_frame(&system)[1]);
        assert!(!saved.deferrable_interrupt_enabled());
        assert_eq!(saved.processor_privilege(), 3);
    }
}

#[test]
fn test_call_and_return() {
    let subroutine = LevelBdi::new(0, 0o103);
    let system = TestProgram::extended(vec![
        op(0o07, 0o16, 0o13, 0, 2, 0), // CALL 0,,B2
        halt(1),
    ])
    .with_data(vec![join_halves(subroutine.to_half(), 0o2000)])
    .with_bank(BankImage::extended(
        subroutine,
        0o2000,
        vec![
            imm(0o10, 0o16, 0, 0o42),    // LA,U A0,042
            op(0o73, 0o17, 0o03, 0, 0, 0), // RTN
        ],
    ))
    .run();
    assert_stopped(&system, StopReason::Debug, 1);
    let ip = first(&system);
    assert_octal_eq!(register(&system, A(0)), w(0o42));
    assert_eq!(ip.active_base_table_entry(0), Some(CODE_BANK));
    assert_eq!(
        ip.general_register(register_index(EX(0), true)),
        Word36::from(256_u32)
    );
    assert_eq!(ip.jump_history().len(), 2);
}

#[test]
fn test_return_with_empty_stack() {
    let system = TestProgram::extended(vec![op(0o73, 0o17, 0o03, 0, 0, 0), halt(0)]).run();
    assert_interrupted(&system, InterruptClass::RcsGenericStackUnderOverflow, 1);
}

#[test]
fn test_call_to_undefined_bank() {
    let system = TestProgram::extended(vec![op(0o07, 0o16, 0o13, 0, 2, 0), halt(1)])
        .with_data(vec![join_halves(LevelBdi::new(0, 0o777).to_half(), 0)])
        .run();
    assert_interrupted(&system, InterruptClass::AddressingException, 0);
    // Nothing was pushed.
    assert_eq!(
        first(&system).general_register(register_index(EX(0), true)),
        Word36::from(256_u32)
    );
}

#[test]
fn test_buy_and_sell() {
    let buy = op(0o73, 0o14, 0o02, 2, 2, 0);
    let sell = op(0o73, 0o14, 0o03, 2, 2, 0);
    let system = TestProgram::extended(vec![buy, halt(1)])
        .with_data(Vec::new())
        .with_register(X(2), join_halves(0o10, 0o100))
        .run();
    assert_stopped(&system, StopReason::Debug, 1);
    assert_octal_eq!(register(&system, X(2)), join_halves(0o10, 0o70));

    // Selling a frame which was never bought runs off the top.
    let system = TestProgram::extended(vec![buy, sell, sell, halt(1)])
        .with_data(Vec::new())
        .with_register(X(2), join_halves(0o10, 0o100))
        .run();
    assert_interrupted(&system, InterruptClass::RcsGenericStackUnderOverflow, 1);
    assert_octal_eq!(register(&system, X(2)), join_halves(0o10, 0o100));
}

#[test]
fn test_buy_overflow() {
    let system = TestProgram::extended(vec![op(0o73, 0o14, 0o02, 2, 2, 0), halt(1)])
        .with_data(Vec::new())
        .with_register(X(2), join_halves(0o10, 4))
        .run();
    assert_interrupted(&system, InterruptClass::RcsGenericStackUnderOverflow, 0);
    assert_octal_eq!(register(&system, X(2)), join_halves(0o10, 4));
}

#[test]
fn test_executive_request_and_signal() {
    // ER only exists in basic mode.
    let programs = [
        (TestProgram::basic(vec![basic_op(0o72, 0o11, 0, 0, false, 0o123)]), 0),
        (TestProgram::extended(vec![op(0o73, 0o15, 0o17, 0, 0, 0o123)]), 1),
    ];
    for (program, short_status) in programs {
        let system = program.run();
        assert_interrupted(&system, InterruptClass::Signal, short_status);
        let frame = first_interrupt_frame(&system);
        // The instruction completed before the interrupt was taken.
        assert_eq!(
            ProgramAddressRegister::from_word(frame[0]),
            ProgramAddressRegister::new(CODE_BANK, CODE_START + 1)
        );
        assert_octal_eq!(frame[5], w(0o123));
    }
}

#[test]
fn test_illegal_instruction() {
    let system = TestProgram::extended(vec![Word36::ZERO]).run();
    assert_interrupted(&system, InterruptClass::InvalidInstruction, 0);
    let frame = first_interrupt_frame(&system);
    assert_eq!(
        ProgramAddressRegister::from_word(frame[0]).program_counter,
        CODE_START
    );
    // The handler runs with the executive register set.
    assert!(first(&system)
        .designator_register()
        .exec_register_set_selected());
}

#[test]
fn test_test_and_set() {
    let system = TestProgram::extended(vec![
        op(0o73, 0o17, 0, 0, 2, 0), // TS 0,,B2
        op(0o73, 0o17, 0, 0, 2, 0), // TS 0,,B2
        halt(0),
    ])
    .with_data(Vec::new())
    .run();
    assert_interrupted(&system, InterruptClass::TestAndSet, 0);
    assert_octal_eq!(data_word(&system, 0), w(0o010_000_000_000));
}

#[test]
fn test_test_and_skip() {
    let system = TestProgram::extended(vec![
        op(0o73, 0o17, 1, 0, 2, 1), // TSS 1,,B2
        halt(1),
        op(0o73, 0o17, 2, 0, 2, 1), // TCS 1,,B2
        halt(3),
        halt(4),
    ])
    .with_data(Vec::new())
    .run();
    assert_stopped(&system, StopReason::Debug, 4);
    assert_eq!(data_word(&system, 1), Word36::ZERO);
}

#[test]
fn test_send_to_self_is_ignored() {
    let system = TestProgram::extended(vec![
        op(0o73, 0o15, 0o07, 0, 0, 0), // SEND 0
        halt(2),
    ])
    .run();
    assert_stopped(&system, StopReason::Debug, 2);
    assert_eq!(first(&system).pending_interrupt_count(), 0);
    assert!(first(&system).last_interrupt().is_none());
}

#[test]
fn test_send_to_missing_processor() {
    let system = TestProgram::extended(vec![op(0o73, 0o15, 0o07, 0, 0, 5), halt(2)]).run();
    assert_interrupted(&system, InterruptClass::AddressingException, 3);
}

#[test]
fn test_send_interrupts_another_processor() {
    let program = TestProgram::extended(vec![
        op(0o73, 0o15, 0o07, 0, 0, 1),      // 01000 SEND 1
        halt(0),                            // 01001
        op(0o74, 0o14, 0o06, 0, 0, 0o1003), // 01002 AAIJ 01003
        op(0o74, 0o15, 0o04, 0, 0, 0o1003), // 01003 J 01003
    ])
    .with_processors(2)
    .with_cycle_limit(10_000_000);
    let mut system = program.load();
    system
        .processor_mut(1)
        .expect("processor 1 exists")
        .set_program_address_register(ProgramAddressRegister::new(CODE_BANK, 0o1002));
    system.start_all();
    system.run();

    assert_stopped(&system, StopReason::Debug, 0);
    let target = system.processor(1).expect("processor 1 exists");
    assert_eq!(target.latest_stop_reason(), StopReason::Debug);
    assert_octal_eq!(
        target.latest_stop_detail(),
        InterruptClass::UpiNormal.stop_detail()
    );
    let interrupt = target.last_interrupt().expect("an interrupt was taken");
    assert_eq!(interrupt.class, InterruptClass::UpiNormal);
    assert_eq!(interrupt.status_word_0, Word36::ZERO);
}

#[test]
fn test_interrupt_without_control_stack_stops() {
    let system = TestProgram::extended(vec![op(0o73, 0o15, 0o17, 0, 0, 0)]) // SGNL
        .without_interrupt_environment()
        .run();
    assert_stopped(
        &system,
        StopReason::ICSBaseRegisterInvalid,
        InterruptClass::Signal.stop_detail(),
    );
}

#[test]
fn test_interrupt_control_stack_overflow_stops() {
    let system = TestProgram::extended(vec![Word36::ZERO])
        .with_register(EX(1), join_halves(6, 3))
        .run();
    assert_stopped(
        &system,
        StopReason::ICSOverflow,
        InterruptClass::InvalidInstruction.stop_detail(),
    );
}

#[test]
fn test_fetch_outside_code_bank() {
    // Falling off the end of the code bank.
    let system = TestProgram::extended(vec![imm(0o10, 0o16, 0, 1)]).run();
    assert_interrupted(&system, InterruptClass::ReferenceViolation, 1);
    assert_octal_eq!(first(&system).general_register(user(A(0))), w(1));
}

#[test]
fn test_runaway_program_reaches_cycle_limit() {
    let system = TestProgram::extended(vec![op(0o74, 0o15, 0o04, 0, 0, 0o1000)])
        .with_cycle_limit(100)
        .run();
    assert_stopped(&system, StopReason::Development, 100);
    assert_eq!(first(&system).cycles(), 100);
}

#[test]
fn test_quantum_timer_expiry_interrupts() {
    let program = TestProgram::extended(vec![
        op(0o74, 0o15, 0o4, 0, 0, CODE_START as u16), // J 01000
    ]);
    let mut system = program.load();
    let ip = system.processor_mut(0).expect("processor 0 exists");
    let mut dr = ip.designator_register();
    dr.set_bit(DesignatorRegister::QUANTUM_TIMER_ENABLED, true);
    dr.set_bit(DesignatorRegister::DEFERRABLE_INTERRUPT_ENABLED, true);
    ip.set_designator_register(dr);
    ip.set_quantum_timer(Word36::ONE);
    system.start(0);
    system.run();
    assert_interrupted(&system, InterruptClass::QuantumTimer, 0);
    assert!(first(&system).quantum_timer().is_negative());
}

#[test]
fn test_read_breakpoint_halts() {
    let program = TestProgram::extended(vec![
        op(0o10, 0, 0, 0, 2, 3), // LA A0,3,,B2
        halt(0),
    ])
    .with_data(vec![w(0o17)]);
    let mut system = program.load();
    let ip = system.processor_mut(0).expect("processor 0 exists");
    let address = ip
        .base_register(2)
        .and_then(|br| br.absolute(3))
        .expect("data bank is based on B2");
    ip.set_breakpoint(Some(BreakpointRegister {
        address,
        fetch: false,
        read: true,
        write: false,
        halt: true,
    }));
    system.start(0);
    system.run();
    assert_stopped(&system, StopReason::Breakpoint, address as u64);
    assert_eq!(
        first(&system).program_address_register(),
        ProgramAddressRegister::new(CODE_BANK, CODE_START + 1)
    );
}

#[test]
fn test_basic_mode_indirection_through_registers() {
    let system = TestProgram::basic(vec![
        basic_op(0o10, 0, 0, 0, true, 0o20),        // LA A0,*020 (A4)
        basic_op(0o77, 0o17, 0o17, 0, false, 0),    // HALT 0
    ])
    .with_register(A(4), basic_op(0, 0, 0, 0, false, 0o21))
    .with_register(A(5), w(0o5151))
    .run();
    assert_stopped(&system, StopReason::Debug, 0);
    assert_octal_eq!(register(&system, A(0)), w(0o5151));
}

#[test]
fn test_basic_mode_indirection_outside_every_bank() {
    let system = TestProgram::basic(vec![
        basic_op(0o10, 0, 0, 0, true, BASIC_DATA_START), // LA A0,*022000
        basic_op(0o77, 0o17, 0o17, 0, false, 0),
    ])
    .with_data(vec![basic_op(0, 0, 0, 0, false, 0o60000)])
    .with_register(A(0), w(0o17))
    .run();
    assert_stopped(
        &system,
        StopReason::Debug,
        InterruptClass::ReferenceViolation.stop_detail(),
    );
    assert_octal_eq!(register(&system, A(0)), w(0o17));
}

#[test]
fn test_nested_calls_return_in_order() {
    let call = |entry: u16| op(0o07, 0o16, 0o13, 0, 2, entry); // CALL entry,,B2
    let rtn = op(0o73, 0o17, 0o03, 0, 0, 0);
    let banks = [
        (LevelBdi::new(0, 0o103), 0o2000),
        (LevelBdi::new(0, 0o104), 0o3000),
        (LevelBdi::new(0, 0o105), 0o4000),
    ];
    let system = TestProgram::extended(vec![
        call(0),
        imm(0o10, 0o16, 2, 3), // LA,U A2,3
        rtn,                   // nothing left to return to
    ])
    .with_data(
        banks
            .iter()
            .map(|(bank, start)| join_halves(bank.to_half(), *start))
            .collect(),
    )
    .with_bank(BankImage::extended(
        banks[0].0,
        banks[0].1,
        vec![call(1), imm(0o10, 0o16, 1, 2), rtn],
    ))
    .with_bank(BankImage::extended(
        banks[1].0,
        banks[1].1,
        vec![call(2), imm(0o10, 0o16, 0, 1), rtn],
    ))
    .with_bank(BankImage::extended(banks[2].0, banks[2].1, vec![rtn]))
    .run();
    assert_interrupted(&system, InterruptClass::RcsGenericStackUnderOverflow, 1);
    assert_octal_eq!(register(&system, A(0)), w(1));
    assert_octal_eq!(register(&system, A(1)), w(2));
    assert_octal_eq!(register(&system, A(2)), w(3));
    let frame = first_interrupt_frame(&system);
    assert_eq!(
        ProgramAddressRegister::from_word(frame[0]),
        ProgramAddressRegister::new(CODE_BANK, CODE_START + 2)
    );
    assert_eq!(
        first(&system).general_register(register_index(EX(0), true)),
        Word36::from(256_u32)
    );
}

#[test]
fn test_call_with_corrupt_stack_pointer_overflows() {
    let system = TestProgram::extended(vec![op(0o07, 0o16, 0o13, 0, 2, 0), halt(1)])
        .with_data(vec![join_halves(CODE_BANK.to_half(), CODE_START + 1)])
        .with_register(EX(0), Word36::MAX_POSITIVE)
        .run();
    assert_interrupted(&system, InterruptClass::RcsGenericStackUnderOverflow, 0);
}

#[test]
fn test_partial_stores_merge_into_one_word() {
    let program = TestProgram::extended(vec![
        imm(0o10, 0o17, 0, 0o444_444), // LA,XU A0,0444444
        op(0o01, 0o02, 0, 0, 2, 0),    // SA,H1 A0,0,,B2
        op(0o01, 0o06, 0, 0, 2, 0),    // SA,Q3 A0,0,,B2
        op(0o01, 0o10, 0, 0, 2, 0),    // SA,S6 A0,0,,B2
        halt(0),
    ])
    .with_data(vec![w(0o123_456_701_234)]);
    let mut system = program.load();
    let ip = system.processor_mut(0).expect("processor 0 exists");
    let mut dr = ip.designator_register();
    dr.set_quarter_word_mode_enabled(true);
    ip.set_designator_register(dr);
    system.start(0);
    system.run();
    assert_stopped(&system, StopReason::Debug, 0);
    assert_octal_eq!(data_word(&system, 0), w(0o444_444_444_244));
}

#[test]
fn test_prevent_interrupts_and_jump() {
    let program = TestProgram::extended(vec![
        op(0o74, 0o14, 0o07, 0, 0, 0o1002), // PAIJ 01002
        halt(1),
        halt(2),
    ])
    .with_privilege(0);
    let mut system = program.load();
    let ip = system.processor_mut(0).expect("processor 0 exists");
    let mut dr = ip.designator_register();
    dr.set_deferrable_interrupt_enabled(true);
    ip.set_designator_register(dr);
    system.start(0);
    system.run();
    assert_stopped(&system, StopReason::Debug, 2);
    assert!(!first(&system)
        .designator_register()
        .deferrable_interrupt_enabled());
}
