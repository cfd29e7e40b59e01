//! Wide profile execution on the fixed console map.

use proptest::prelude::*;
use retro_core::memory::map::{EWRAM_START, ROM_START};
use retro_core::state::status::STATUS_RESET;
use retro_core::{
    Cartridge, Condition, CoreConfig, CoreError, Cpu, DecodeReason, DispatchPolicy, LoopDetection,
    Machine, StatusRegister, StopReason, WideCpu,
};
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const BRANCH_TO_SELF: u32 = 0xEAFF_FFFE;

fn boot(program: &[u32], config: CoreConfig) -> Machine<WideCpu> {
    let (mut machine, map) = Machine::<WideCpu>::wide(config).expect("fixed layout");
    let image: Vec<u8> = program.iter().flat_map(|word| word.to_le_bytes()).collect();
    Cartridge::from_bytes(image)
        .expect("non-empty image")
        .mount_into(machine.bus_mut(), map.rom)
        .expect("rom handle");
    machine
}

fn strict() -> CoreConfig {
    CoreConfig {
        dispatch_policy: DispatchPolicy::Strict,
        ..CoreConfig::default()
    }
}

fn status_with(nzcv: u32) -> StatusRegister {
    StatusRegister::from_bits((nzcv << 28) | STATUS_RESET)
}

#[test]
fn reset_state_points_at_cartridge_rom() {
    let machine = boot(&[BRANCH_TO_SELF], strict());
    let regs = machine.cpu().registers();
    assert_eq!(regs.pc(), ROM_START);
    assert_eq!(regs.status().bits(), STATUS_RESET);
    assert_eq!(regs.visible_pc(), ROM_START + 8);
}

#[rstest]
#[case::eq(Condition::Eq, |_: bool, z: bool, _: bool, _: bool| z)]
#[case::ne(Condition::Ne, |_: bool, z: bool, _: bool, _: bool| !z)]
#[case::cs(Condition::Cs, |_: bool, _: bool, c: bool, _: bool| c)]
#[case::cc(Condition::Cc, |_: bool, _: bool, c: bool, _: bool| !c)]
#[case::mi(Condition::Mi, |n: bool, _: bool, _: bool, _: bool| n)]
#[case::pl(Condition::Pl, |n: bool, _: bool, _: bool, _: bool| !n)]
#[case::vs(Condition::Vs, |_: bool, _: bool, _: bool, v: bool| v)]
#[case::vc(Condition::Vc, |_: bool, _: bool, _: bool, v: bool| !v)]
#[case::hi(Condition::Hi, |_: bool, z: bool, c: bool, _: bool| c && !z)]
#[case::ls(Condition::Ls, |_: bool, z: bool, c: bool, _: bool| !c || z)]
#[case::ge(Condition::Ge, |n: bool, _: bool, _: bool, v: bool| n == v)]
#[case::lt(Condition::Lt, |n: bool, _: bool, _: bool, v: bool| n != v)]
#[case::gt(Condition::Gt, |n: bool, z: bool, _: bool, v: bool| !z && n == v)]
#[case::le(Condition::Le, |n: bool, z: bool, _: bool, v: bool| z || n != v)]
#[case::al(Condition::Al, |_: bool, _: bool, _: bool, _: bool| true)]
#[case::nv(Condition::Nv, |_: bool, _: bool, _: bool, _: bool| true)]
fn conditional_move_follows_condition_table(
    #[case] condition: Condition,
    #[case] expected: fn(bool, bool, bool, bool) -> bool,
) {
    let code = u32::try_from(
        Condition::ALL
            .iter()
            .position(|&c| c == condition)
            .expect("listed condition"),
    )
    .expect("four-bit code");
    // MOV<cond> r0, #1
    let word = (code << 28) | 0x03A0_0001;
    let mut machine = boot(&[word], strict());

    for nzcv in 0..16_u32 {
        machine.reset(ROM_START);
        machine.cpu_mut().registers_mut().set(0, 0);
        machine
            .cpu_mut()
            .registers_mut()
            .set_status(status_with(nzcv));

        let (n, z, c, v) = (nzcv & 8 != 0, nzcv & 4 != 0, nzcv & 2 != 0, nzcv & 1 != 0);
        let cycles = machine.step().expect("step");
        let taken = expected(n, z, c, v);

        assert_eq!(machine.cpu().registers().get(0), u32::from(taken), "nzcv {nzcv:04b}");
        assert_eq!(machine.cpu().pc(), ROM_START + 4);
        assert_eq!(cycles, 1);
        assert_eq!(machine.cpu().registers().status(), status_with(nzcv));
    }
}

#[rstest]
#[case::signed_overflow(0x7FFF_FFFF, 1, 0x8000_0000, 0b1001)]
#[case::unsigned_wrap(0xFFFF_FFFF, 1, 0, 0b0110)]
#[case::plain(2, 3, 5, 0b0000)]
fn adds_sets_nzcv(#[case] a: u32, #[case] b: u32, #[case] sum: u32, #[case] nzcv: u32) {
    // ADDS r2, r0, r1
    let mut machine = boot(&[0xE090_2001], strict());
    machine.cpu_mut().registers_mut().set(0, a);
    machine.cpu_mut().registers_mut().set(1, b);

    assert_eq!(machine.step(), Ok(1));
    let regs = machine.cpu().registers();
    assert_eq!(regs.get(2), sum);
    assert_eq!(regs.status(), status_with(nzcv));
}

#[test]
fn subs_borrow_clears_carry() {
    // SUBS r2, r0, r1
    let mut machine = boot(&[0xE050_2001], strict());
    machine.cpu_mut().registers_mut().set(1, 1);
    machine.step().expect("subs");
    let status = machine.cpu().registers().status();
    assert_eq!(machine.cpu().registers().get(2), u32::MAX);
    assert!(status.negative());
    assert!(!status.carry());
    assert!(!status.zero());
}

#[test]
fn branch_to_self_runs_to_bound_when_detection_is_off() {
    let config = CoreConfig {
        loop_detection: LoopDetection::Off,
        ..strict()
    };
    let mut machine = boot(&[BRANCH_TO_SELF], config);
    let outcome = machine.run(Some(100)).expect("runs");
    assert_eq!(outcome.reason, StopReason::BoundReached);
    assert_eq!(outcome.steps, 100);
    assert_eq!(outcome.cycles, 300);
    assert_eq!(machine.cpu().pc(), ROM_START);
}

#[test]
fn branch_to_self_stops_at_first_repeat_by_default() {
    let mut machine = boot(&[BRANCH_TO_SELF], CoreConfig::default());
    let outcome = machine.run(Some(100)).expect("runs");
    assert_eq!(outcome.reason, StopReason::LoopDetected { pc: ROM_START });
    assert_eq!(outcome.steps, 2);
    assert_eq!(outcome.cycles, 6);
}

#[test]
fn branch_with_link_and_exchange_return() {
    // BL +0 ; B . ; BX lr
    let mut machine = boot(&[0xEB00_0000, BRANCH_TO_SELF, 0xE12F_FF1E], strict());
    let outcome = machine.run(Some(10)).expect("runs");

    assert_eq!(outcome.steps, 3);
    assert_eq!(outcome.cycles, 9);
    assert_eq!(outcome.reason, StopReason::LoopDetected { pc: ROM_START + 4 });
    assert_eq!(machine.cpu().registers().get(14), ROM_START + 4);
}

#[test]
fn store_then_load_through_work_ram() {
    // MOV r3,#0x02000000 ; MOV r2,#0xAB ; STR r2,[r3] ; LDR r4,[r3,#0]
    let mut machine = boot(
        &[0xE3A0_3402, 0xE3A0_20AB, 0xE583_2000, 0xE593_4000],
        strict(),
    );
    let outcome = machine.run(Some(4)).expect("runs");
    assert_eq!(outcome.cycles, 1 + 1 + 2 + 3);

    assert_eq!(machine.cpu().registers().get(3), EWRAM_START);
    assert_eq!(machine.cpu().registers().get(4), 0xAB);
    assert_eq!(machine.bus_mut().read32(EWRAM_START), Ok(0xAB));
}

#[test]
fn unsupported_class_is_fatal_only_when_strict() {
    // SWI 0
    let mut machine = boot(&[0xEF00_0000], strict());
    assert_eq!(
        machine.step(),
        Err(CoreError::Decode {
            word: 0xEF00_0000,
            pc: ROM_START,
            reason: DecodeReason::UnsupportedClass("software interrupt"),
        })
    );
    assert_eq!(machine.cpu().pc(), ROM_START);

    let permissive = CoreConfig {
        dispatch_policy: DispatchPolicy::Permissive,
        ..CoreConfig::default()
    };
    let mut machine = boot(&[0xEF00_0000], permissive);
    assert_eq!(machine.step(), Ok(1));
    assert_eq!(machine.cpu().pc(), ROM_START + 4);
}

#[test]
fn failed_condition_skips_undecodable_word() {
    // MOVSEQ pc,#0 with Z clear, then the same word unconditionally.
    let mut machine = boot(&[0x03B0_F000, 0xE3B0_F000], strict());
    assert_eq!(machine.step(), Ok(1));
    assert_eq!(
        machine.step(),
        Err(CoreError::Decode {
            word: 0xE3B0_F000,
            pc: ROM_START + 4,
            reason: DecodeReason::StatusRestoreUnsupported,
        })
    );
    assert_eq!(machine.cpu().pc(), ROM_START + 4);
}

#[test]
fn fetch_from_unmapped_address_faults_without_moving_pc() {
    let mut machine = boot(&[BRANCH_TO_SELF], strict());
    machine.reset(0x1000_0000);
    let before = machine.cpu().registers().clone();
    assert!(matches!(machine.step(), Err(CoreError::BusFault(_))));
    assert_eq!(machine.cpu().registers(), &before);
}

proptest! {
    #[test]
    fn data_processing_never_touches_unnamed_status_bits(
        a in any::<u32>(),
        b in any::<u32>(),
        nzcv in 0_u32..16,
    ) {
        // ADDS r2, r0, r1
        let mut machine = boot(&[0xE090_2001], strict());
        let regs = machine.cpu_mut().registers_mut();
        regs.set(0, a);
        regs.set(1, b);
        regs.set_status(status_with(nzcv));

        machine.step().expect("adds");
        let status = machine.cpu().registers().status();
        let (sum, carry) = a.overflowing_add(b);
        prop_assert_eq!(machine.cpu().registers().get(2), sum);
        prop_assert_eq!(status.bits() & 0x0FFF_FFFF, STATUS_RESET);
        prop_assert_eq!(status.carry(), carry);
        prop_assert_eq!(status.zero(), sum == 0);
        prop_assert_eq!(status.negative(), sum >> 31 == 1);
        prop_assert_eq!(status.overflow(), ((a ^ sum) & (b ^ sum)) >> 31 == 1);
    }
}
