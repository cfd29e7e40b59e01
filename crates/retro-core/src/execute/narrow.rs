//! Narrow profile instruction handlers and the standard opcode table.
//!
//! Handlers receive `PC` already past the opcode byte. Opcodes that share a
//! layout share a handler and pick their operands from the opcode bits.

use crate::decoder::{InstructionDef, OpcodeTable};
use crate::execute::flags::{add16, add8, dec8, inc8, logic8, sub8};
use crate::execute::helpers::{
    condition_holds, fetch16, fetch8, pop16, push16, read8, stack_pair, write8, Operand16,
    Operand8,
};
use crate::fault::CoreError;
use crate::memory::Bus;
use crate::state::{NarrowFlagsUpdate, NarrowRegisters, Reg16, Reg8, RunState};
use crate::timing::CycleCostKind;

type HandlerResult = Result<u32, CoreError>;

const ALU_MNEMONICS: [&str; 8] = ["ADD", "ADC", "SUB", "SBC", "AND", "XOR", "OR", "CP"];

const fn cost(kind: CycleCostKind) -> HandlerResult {
    Ok(kind.cycles())
}

/// Populates `table` with every implemented narrow opcode.
pub fn install(table: &mut OpcodeTable) {
    let mut put = |opcode: u8, def: InstructionDef| {
        table.register(opcode, def);
    };

    put(0x00, InstructionDef::new("NOP", nop));
    put(0x10, InstructionDef::suspending("STOP", stop, RunState::Stopped));
    put(0x76, InstructionDef::suspending("HALT", nop, RunState::Halted));
    put(0x08, InstructionDef::new("LD (a16),SP", ld_a16_sp));
    put(0x18, InstructionDef::new("JR e8", jr));
    put(0x27, InstructionDef::new("DAA", daa));
    put(0x2F, InstructionDef::new("CPL", cpl));
    put(0x37, InstructionDef::new("SCF", scf));
    put(0x3F, InstructionDef::new("CCF", ccf));
    put(0xC3, InstructionDef::new("JP a16", jp));
    put(0xC9, InstructionDef::new("RET", ret));
    put(0xCD, InstructionDef::new("CALL a16", call));
    put(0xE0, InstructionDef::new("LDH (a8),A", ldh_a8_a));
    put(0xF0, InstructionDef::new("LDH A,(a8)", ldh_a_a8));
    put(0xE9, InstructionDef::new("JP HL", jp_hl));
    put(0xEA, InstructionDef::new("LD (a16),A", ld_a16_a));
    put(0xFA, InstructionDef::new("LD A,(a16)", ld_a_a16));

    for row in 0_u8..4 {
        let high = row << 4;
        put(high | 0x01, InstructionDef::new("LD rr,n16", ld_rr_n16));
        put(high | 0x02, InstructionDef::new("LD (rr),A", ld_indirect_a));
        put(high | 0x03, InstructionDef::new("INC rr", inc_rr));
        put(high | 0x09, InstructionDef::new("ADD HL,rr", add_hl_rr));
        put(high | 0x0A, InstructionDef::new("LD A,(rr)", ld_a_indirect));
        put(high | 0x0B, InstructionDef::new("DEC rr", dec_rr));
        put(0xC1 | high, InstructionDef::new("POP rr", pop));
        put(0xC5 | high, InstructionDef::new("PUSH rr", push));
    }

    for cc in 0_u8..4 {
        let bits = cc << 3;
        put(0x20 | bits, InstructionDef::new("JR cc,e8", jr_cc));
        put(0xC0 | bits, InstructionDef::new("RET cc", ret_cc));
        put(0xC2 | bits, InstructionDef::new("JP cc,a16", jp_cc));
        put(0xC4 | bits, InstructionDef::new("CALL cc,a16", call_cc));
    }

    for (field, mnemonic) in (0_u8..).zip(["RLCA", "RRCA", "RLA", "RRA"]) {
        let bits = field << 3;
        put(0x07 | bits, InstructionDef::new(mnemonic, rotate_a));
    }

    for field in 0_u8..8 {
        let bits = field << 3;
        put(0x04 | bits, InstructionDef::new("INC r", inc_r));
        put(0x05 | bits, InstructionDef::new("DEC r", dec_r));
        put(0x06 | bits, InstructionDef::new("LD r,n8", ld_r_n8));
    }

    for (field, mnemonic) in (0_u8..).zip(ALU_MNEMONICS) {
        let bits = field << 3;
        for source in 0_u8..8 {
            put(0x80 | bits | source, InstructionDef::new(mnemonic, alu_r));
        }
        put(0xC6 | bits, InstructionDef::new(mnemonic, alu_n8));
    }

    for opcode in 0x40_u8..=0x7F {
        if opcode != 0x76 {
            put(opcode, InstructionDef::new("LD r,r'", ld_r_r));
        }
    }
}

fn nop(_: &mut NarrowRegisters, _: &mut Bus, _: u8) -> HandlerResult {
    cost(CycleCostKind::NarrowSimple)
}

fn stop(regs: &mut NarrowRegisters, bus: &mut Bus, _: u8) -> HandlerResult {
    // Two-byte encoding; the padding byte is skipped.
    fetch8(regs, bus)?;
    cost(CycleCostKind::NarrowSimple)
}

fn ld_rr_n16(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    let value = fetch16(regs, bus)?;
    Operand16::from_u2(opcode >> 4).set(regs, value);
    cost(CycleCostKind::NarrowLoadImmediate16)
}

/// Address for `LD (rr),A` / `LD A,(rr)`, applying the `HL+`/`HL-` step.
fn indirect_address(regs: &mut NarrowRegisters, opcode: u8) -> u32 {
    match (opcode >> 4) & 0x03 {
        0 => u32::from(regs.pair(Reg16::BC)),
        1 => u32::from(regs.pair(Reg16::DE)),
        step => {
            let hl = regs.pair(Reg16::HL);
            let next = if step == 2 {
                hl.wrapping_add(1)
            } else {
                hl.wrapping_sub(1)
            };
            regs.set_pair(Reg16::HL, next);
            u32::from(hl)
        }
    }
}

fn ld_indirect_a(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    let address = indirect_address(regs, opcode);
    bus.write8(address, regs.get(Reg8::A))?;
    cost(CycleCostKind::NarrowIndirectTransfer)
}

fn ld_a_indirect(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    let address = indirect_address(regs, opcode);
    let value = bus.read8(address)?;
    regs.set(Reg8::A, value);
    cost(CycleCostKind::NarrowIndirectTransfer)
}

fn inc_rr(regs: &mut NarrowRegisters, _: &mut Bus, opcode: u8) -> HandlerResult {
    let operand = Operand16::from_u2(opcode >> 4);
    operand.set(regs, operand.get(regs).wrapping_add(1));
    cost(CycleCostKind::NarrowWideArithmetic)
}

fn dec_rr(regs: &mut NarrowRegisters, _: &mut Bus, opcode: u8) -> HandlerResult {
    let operand = Operand16::from_u2(opcode >> 4);
    operand.set(regs, operand.get(regs).wrapping_sub(1));
    cost(CycleCostKind::NarrowWideArithmetic)
}

fn add_hl_rr(regs: &mut NarrowRegisters, _: &mut Bus, opcode: u8) -> HandlerResult {
    let rhs = Operand16::from_u2(opcode >> 4).get(regs);
    let (result, flags) = add16(regs.pair(Reg16::HL), rhs);
    regs.set_pair(Reg16::HL, result);
    regs.update_flags(flags);
    cost(CycleCostKind::NarrowWideArithmetic)
}

fn step_r(
    regs: &mut NarrowRegisters,
    bus: &mut Bus,
    opcode: u8,
    op: fn(u8) -> (u8, NarrowFlagsUpdate),
) -> HandlerResult {
    let operand = Operand8::from_u3(opcode >> 3);
    let (result, flags) = op(read8(regs, bus, operand)?);
    write8(regs, bus, operand, result)?;
    regs.update_flags(flags);
    if operand.is_memory() {
        cost(CycleCostKind::NarrowIndirectModify)
    } else {
        cost(CycleCostKind::NarrowSimple)
    }
}

fn inc_r(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    step_r(regs, bus, opcode, inc8)
}

fn dec_r(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    step_r(regs, bus, opcode, dec8)
}

fn ld_r_n8(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    let value = fetch8(regs, bus)?;
    let operand = Operand8::from_u3(opcode >> 3);
    write8(regs, bus, operand, value)?;
    if operand.is_memory() {
        cost(CycleCostKind::NarrowIndirectModify)
    } else {
        cost(CycleCostKind::NarrowIndirect)
    }
}

fn rotate_a(regs: &mut NarrowRegisters, _: &mut Bus, opcode: u8) -> HandlerResult {
    let a = regs.get(Reg8::A);
    let carry_in = u8::from(regs.flags().carry());
    let (result, carry_out) = match (opcode >> 3) & 0x03 {
        0 => (a.rotate_left(1), a >> 7),
        1 => (a.rotate_right(1), a & 0x01),
        2 => ((a << 1) | carry_in, a >> 7),
        _ => ((a >> 1) | (carry_in << 7), a & 0x01),
    };
    regs.set(Reg8::A, result);
    regs.update_flags(
        NarrowFlagsUpdate::new()
            .zero(false)
            .subtract(false)
            .half_carry(false)
            .carry(carry_out != 0),
    );
    cost(CycleCostKind::NarrowSimple)
}

fn ld_a16_sp(regs: &mut NarrowRegisters, bus: &mut Bus, _: u8) -> HandlerResult {
    let address = fetch16(regs, bus)?;
    let [low, high] = regs.sp().to_le_bytes();
    bus.write8(u32::from(address), low)?;
    bus.write8(u32::from(address.wrapping_add(1)), high)?;
    cost(CycleCostKind::NarrowStoreStackPointer)
}

fn jump_relative(regs: &mut NarrowRegisters, offset: u8) {
    let offset = i16::from(offset as i8);
    regs.set_pc(regs.pc().wrapping_add_signed(offset));
}

fn jr(regs: &mut NarrowRegisters, bus: &mut Bus, _: u8) -> HandlerResult {
    let offset = fetch8(regs, bus)?;
    jump_relative(regs, offset);
    cost(CycleCostKind::NarrowJumpRelativeTaken)
}

fn jr_cc(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    let offset = fetch8(regs, bus)?;
    if condition_holds(opcode >> 3, regs.flags()) {
        jump_relative(regs, offset);
        cost(CycleCostKind::NarrowJumpRelativeTaken)
    } else {
        cost(CycleCostKind::NarrowJumpRelativeSkipped)
    }
}

fn daa(regs: &mut NarrowRegisters, _: &mut Bus, _: u8) -> HandlerResult {
    let flags = regs.flags();
    let mut a = regs.get(Reg8::A);
    let mut carry = flags.carry();
    if flags.subtract() {
        if carry {
            a = a.wrapping_sub(0x60);
        }
        if flags.half_carry() {
            a = a.wrapping_sub(0x06);
        }
    } else {
        if carry || a > 0x99 {
            a = a.wrapping_add(0x60);
            carry = true;
        }
        if flags.half_carry() || a & 0x0F > 0x09 {
            a = a.wrapping_add(0x06);
        }
    }
    regs.set(Reg8::A, a);
    regs.update_flags(
        NarrowFlagsUpdate::new()
            .zero(a == 0)
            .half_carry(false)
            .carry(carry),
    );
    cost(CycleCostKind::NarrowSimple)
}

fn cpl(regs: &mut NarrowRegisters, _: &mut Bus, _: u8) -> HandlerResult {
    regs.set(Reg8::A, !regs.get(Reg8::A));
    regs.update_flags(NarrowFlagsUpdate::new().subtract(true).half_carry(true));
    cost(CycleCostKind::NarrowSimple)
}

fn scf(regs: &mut NarrowRegisters, _: &mut Bus, _: u8) -> HandlerResult {
    regs.update_flags(
        NarrowFlagsUpdate::new()
            .subtract(false)
            .half_carry(false)
            .carry(true),
    );
    cost(CycleCostKind::NarrowSimple)
}

fn ccf(regs: &mut NarrowRegisters, _: &mut Bus, _: u8) -> HandlerResult {
    let carry = regs.flags().carry();
    regs.update_flags(
        NarrowFlagsUpdate::new()
            .subtract(false)
            .half_carry(false)
            .carry(!carry),
    );
    cost(CycleCostKind::NarrowSimple)
}

fn ld_r_r(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    let source = Operand8::from_u3(opcode);
    let target = Operand8::from_u3(opcode >> 3);
    let value = read8(regs, bus, source)?;
    write8(regs, bus, target, value)?;
    if source.is_memory() || target.is_memory() {
        cost(CycleCostKind::NarrowIndirect)
    } else {
        cost(CycleCostKind::NarrowRegister)
    }
}

/// Applies the ALU operation selected by bits 3..=5 of `opcode` to `A`.
fn alu(regs: &mut NarrowRegisters, opcode: u8, value: u8) {
    let a = regs.get(Reg8::A);
    let carry = regs.flags().carry();
    let (result, flags) = match (opcode >> 3) & 0x07 {
        0 => add8(a, value, false),
        1 => add8(a, value, carry),
        2 | 7 => sub8(a, value, false),
        3 => sub8(a, value, carry),
        4 => {
            let result = a & value;
            (result, logic8(result, true))
        }
        5 => {
            let result = a ^ value;
            (result, logic8(result, false))
        }
        _ => {
            let result = a | value;
            (result, logic8(result, false))
        }
    };
    // CP only compares.
    if (opcode >> 3) & 0x07 != 7 {
        regs.set(Reg8::A, result);
    }
    regs.update_flags(flags);
}

fn alu_r(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    let source = Operand8::from_u3(opcode);
    let value = read8(regs, bus, source)?;
    alu(regs, opcode, value);
    if source.is_memory() {
        cost(CycleCostKind::NarrowIndirect)
    } else {
        cost(CycleCostKind::NarrowRegister)
    }
}

fn alu_n8(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    let value = fetch8(regs, bus)?;
    alu(regs, opcode, value);
    cost(CycleCostKind::NarrowIndirect)
}

fn jp(regs: &mut NarrowRegisters, bus: &mut Bus, _: u8) -> HandlerResult {
    let target = fetch16(regs, bus)?;
    regs.set_pc(target);
    cost(CycleCostKind::NarrowJumpTaken)
}

fn jp_cc(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    let target = fetch16(regs, bus)?;
    if condition_holds(opcode >> 3, regs.flags()) {
        regs.set_pc(target);
        cost(CycleCostKind::NarrowJumpTaken)
    } else {
        cost(CycleCostKind::NarrowJumpSkipped)
    }
}

fn jp_hl(regs: &mut NarrowRegisters, _: &mut Bus, _: u8) -> HandlerResult {
    regs.set_pc(regs.pair(Reg16::HL));
    cost(CycleCostKind::NarrowJumpRegister)
}

fn call(regs: &mut NarrowRegisters, bus: &mut Bus, _: u8) -> HandlerResult {
    let target = fetch16(regs, bus)?;
    push16(regs, bus, regs.pc())?;
    regs.set_pc(target);
    cost(CycleCostKind::NarrowCallTaken)
}

fn call_cc(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    let target = fetch16(regs, bus)?;
    if condition_holds(opcode >> 3, regs.flags()) {
        push16(regs, bus, regs.pc())?;
        regs.set_pc(target);
        cost(CycleCostKind::NarrowCallTaken)
    } else {
        cost(CycleCostKind::NarrowCallSkipped)
    }
}

fn ret(regs: &mut NarrowRegisters, bus: &mut Bus, _: u8) -> HandlerResult {
    let target = pop16(regs, bus)?;
    regs.set_pc(target);
    cost(CycleCostKind::NarrowReturn)
}

fn ret_cc(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    if condition_holds(opcode >> 3, regs.flags()) {
        let target = pop16(regs, bus)?;
        regs.set_pc(target);
        cost(CycleCostKind::NarrowReturnTaken)
    } else {
        cost(CycleCostKind::NarrowReturnSkipped)
    }
}

fn push(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    let value = regs.pair(stack_pair(opcode >> 4));
    push16(regs, bus, value)?;
    cost(CycleCostKind::NarrowPush)
}

fn pop(regs: &mut NarrowRegisters, bus: &mut Bus, opcode: u8) -> HandlerResult {
    let pair = stack_pair(opcode >> 4);
    let value = pop16(regs, bus)?;
    // The low nibble of F does not exist in hardware.
    let value = if pair == Reg16::AF { value & 0xFFF0 } else { value };
    regs.set_pair(pair, value);
    cost(CycleCostKind::NarrowPop)
}

const fn high_page(offset: u8) -> u32 {
    0xFF00 | offset as u32
}

fn ldh_a8_a(regs: &mut NarrowRegisters, bus: &mut Bus, _: u8) -> HandlerResult {
    let offset = fetch8(regs, bus)?;
    bus.write8(high_page(offset), regs.get(Reg8::A))?;
    cost(CycleCostKind::NarrowHighPage)
}

fn ldh_a_a8(regs: &mut NarrowRegisters, bus: &mut Bus, _: u8) -> HandlerResult {
    let offset = fetch8(regs, bus)?;
    let value = bus.read8(high_page(offset))?;
    regs.set(Reg8::A, value);
    cost(CycleCostKind::NarrowHighPage)
}

fn ld_a16_a(regs: &mut NarrowRegisters, bus: &mut Bus, _: u8) -> HandlerResult {
    let address = fetch16(regs, bus)?;
    bus.write8(u32::from(address), regs.get(Reg8::A))?;
    cost(CycleCostKind::NarrowAbsolute)
}

fn ld_a_a16(regs: &mut NarrowRegisters, bus: &mut Bus, _: u8) -> HandlerResult {
    let address = fetch16(regs, bus)?;
    let value = bus.read8(u32::from(address))?;
    regs.set(Reg8::A, value);
    cost(CycleCostKind::NarrowAbsolute)
}

#[cfg(test)]
mod tests {
    use crate::decoder::OpcodeTable;
    use crate::memory::{Bus, MemoryRegion};
    use crate::state::{NarrowRegisters, Reg16, Reg8, RunState};

    /// Flat 64 KiB RAM with `program` at `0x0100`.
    fn setup(program: &[u8]) -> (NarrowRegisters, Bus) {
        let mut bus = Bus::new();
        let mut ram = MemoryRegion::new("RAM", 0x1_0000);
        let mut image = vec![0; 0x0100];
        image.extend_from_slice(program);
        ram.load(&image);
        bus.map(0, 0x1_0000, ram, 0).expect("flat map");
        (NarrowRegisters::reset(0x0100), bus)
    }

    /// Executes one instruction the way the CPU does.
    fn exec(table: &OpcodeTable, regs: &mut NarrowRegisters, bus: &mut Bus) -> u32 {
        let opcode = bus.read8(u32::from(regs.pc())).expect("fetch");
        regs.set_pc(regs.pc().wrapping_add(1));
        let def = table.lookup(opcode, regs.pc()).expect("implemented");
        (def.handler)(regs, bus, opcode).expect("executes")
    }

    #[test]
    fn halt_and_stop_suspend() {
        let table = OpcodeTable::standard();
        assert_eq!(
            table.lookup(0x76, 0).map(|def| def.suspends),
            Ok(Some(RunState::Halted))
        );
        assert_eq!(
            table.lookup(0x10, 0).map(|def| def.suspends),
            Ok(Some(RunState::Stopped))
        );
        assert_eq!(table.lookup(0x00, 0).map(|def| def.suspends), Ok(None));
    }

    #[test]
    fn ld_rr_n16_is_little_endian() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0x21, 0x34, 0x12, 0x31, 0xFE, 0xDF]);
        assert_eq!(exec(&table, &mut regs, &mut bus), 12);
        assert_eq!(regs.pair(Reg16::HL), 0x1234);
        exec(&table, &mut regs, &mut bus);
        assert_eq!(regs.sp(), 0xDFFE);
        assert_eq!(regs.pc(), 0x0106);
    }

    #[test]
    fn hl_increment_and_decrement_stores() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0x22, 0x32]);
        regs.set_pair(Reg16::HL, 0xC000);
        regs.set(Reg8::A, 0x5A);
        exec(&table, &mut regs, &mut bus);
        assert_eq!(regs.pair(Reg16::HL), 0xC001);
        exec(&table, &mut regs, &mut bus);
        assert_eq!(regs.pair(Reg16::HL), 0xC000);
        assert_eq!(bus.read8(0xC000), Ok(0x5A));
        assert_eq!(bus.read8(0xC001), Ok(0x5A));
    }

    #[test]
    fn inc_through_hl_updates_memory_and_flags() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0x34]);
        regs.set_pair(Reg16::HL, 0xC000);
        bus.write8(0xC000, 0xFF).expect("ram");
        assert_eq!(exec(&table, &mut regs, &mut bus), 12);
        assert_eq!(bus.read8(0xC000), Ok(0x00));
        assert!(regs.flags().zero());
        assert!(regs.flags().half_carry());
        assert!(!regs.flags().subtract());
    }

    #[test]
    fn add_a_immediate_sets_half_carry() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0xC6, 0x01, 0xC6, 0xF0]);
        regs.set(Reg8::A, 0x0F);
        exec(&table, &mut regs, &mut bus);
        assert_eq!(regs.get(Reg8::A), 0x10);
        assert!(regs.flags().half_carry());
        assert!(!regs.flags().carry());

        exec(&table, &mut regs, &mut bus);
        assert_eq!(regs.get(Reg8::A), 0x00);
        assert!(regs.flags().zero());
        assert!(regs.flags().carry());
    }

    #[test]
    fn cp_leaves_accumulator() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0xB8]);
        regs.set(Reg8::A, 0x42);
        regs.set(Reg8::B, 0x42);
        exec(&table, &mut regs, &mut bus);
        assert_eq!(regs.get(Reg8::A), 0x42);
        assert!(regs.flags().zero());
        assert!(regs.flags().subtract());
    }

    #[test]
    fn rlca_moves_bit_seven_into_carry_and_clears_zero() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0x07, 0x1F]);
        regs.set(Reg8::A, 0x80);
        regs.set(Reg8::F, 0x80);
        exec(&table, &mut regs, &mut bus);
        assert_eq!(regs.get(Reg8::A), 0x01);
        assert!(regs.flags().carry());
        assert!(!regs.flags().zero());

        // RRA rotates the carry back in at bit 7.
        exec(&table, &mut regs, &mut bus);
        assert_eq!(regs.get(Reg8::A), 0x80);
        assert!(regs.flags().carry());
    }

    #[test]
    fn daa_adjusts_bcd_addition() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0xC6, 0x27, 0x27]);
        regs.set(Reg8::A, 0x15);
        exec(&table, &mut regs, &mut bus);
        assert_eq!(regs.get(Reg8::A), 0x3C);
        exec(&table, &mut regs, &mut bus);
        assert_eq!(regs.get(Reg8::A), 0x42);
        assert!(!regs.flags().carry());
    }

    #[test]
    fn jr_back_to_itself() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0x18, 0xFE]);
        assert_eq!(exec(&table, &mut regs, &mut bus), 12);
        assert_eq!(regs.pc(), 0x0100);
    }

    #[test]
    fn conditional_jump_not_taken_skips_operand() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0xCA, 0x00, 0x20]);
        assert_eq!(exec(&table, &mut regs, &mut bus), 12);
        assert_eq!(regs.pc(), 0x0103);
    }

    #[test]
    fn call_and_ret_round_trip_through_stack() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0xCD, 0x00, 0x02]);
        bus.write8(0x0200, 0xC9).expect("ram");
        regs.set_sp(0xD000);

        assert_eq!(exec(&table, &mut regs, &mut bus), 24);
        assert_eq!(regs.pc(), 0x0200);
        assert_eq!(regs.sp(), 0xCFFE);
        assert_eq!(bus.read8(0xCFFE), Ok(0x03));
        assert_eq!(bus.read8(0xCFFF), Ok(0x01));

        exec(&table, &mut regs, &mut bus);
        assert_eq!(regs.pc(), 0x0103);
        assert_eq!(regs.sp(), 0xD000);
    }

    #[test]
    fn pop_af_drops_low_flag_nibble() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0xC5, 0xF1]);
        regs.set_sp(0xD000);
        regs.set_pair(Reg16::BC, 0x12FF);
        exec(&table, &mut regs, &mut bus);
        exec(&table, &mut regs, &mut bus);
        assert_eq!(regs.pair(Reg16::AF), 0x12F0);
    }

    #[test]
    fn ld_a16_sp_stores_low_byte_first() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0x08, 0x00, 0xC0]);
        regs.set_sp(0xBEEF);
        assert_eq!(exec(&table, &mut regs, &mut bus), 20);
        assert_eq!(bus.read8(0xC000), Ok(0xEF));
        assert_eq!(bus.read8(0xC001), Ok(0xBE));
    }

    #[test]
    fn ldh_uses_high_page() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0xE0, 0x80, 0xF0, 0x81]);
        regs.set(Reg8::A, 0x77);
        exec(&table, &mut regs, &mut bus);
        assert_eq!(bus.read8(0xFF80), Ok(0x77));
        bus.write8(0xFF81, 0x11).expect("ram");
        exec(&table, &mut regs, &mut bus);
        assert_eq!(regs.get(Reg8::A), 0x11);
    }

    #[test]
    fn ld_register_block_copies_between_registers() {
        let table = OpcodeTable::standard();
        let (mut regs, mut bus) = setup(&[0x78, 0x46]);
        regs.set(Reg8::B, 0x9C);
        regs.set_pair(Reg16::HL, 0xC010);
        bus.write8(0xC010, 0x3D).expect("ram");
        assert_eq!(exec(&table, &mut regs, &mut bus), 4);
        assert_eq!(regs.get(Reg8::A), 0x9C);
        assert_eq!(exec(&table, &mut regs, &mut bus), 8);
        assert_eq!(regs.get(Reg8::B), 0x3D);
    }
}
