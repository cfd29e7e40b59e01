//! Deterministic trace fingerprint for both profiles, used for cross-host comparison.

use std::cell::Cell;
use std::rc::Rc;

use proptest as _;
use retro_core::{
    Cartridge, CoreConfig, Cpu, DispatchPolicy, LoopDetection, Machine, NarrowCpu, StopReason,
    TraceEvent, TraceSink, WideCpu,
};
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

/// Folds every trace event into a shared FNV-1a hash.
struct Fingerprint(Rc<Cell<u64>>);

impl TraceSink for Fingerprint {
    fn on_event(&mut self, event: TraceEvent) {
        let mut hash = self.0.get();
        match event {
            TraceEvent::InstructionRetired { pc, word, cycles } => {
                hash_bytes(&mut hash, &[0x10]);
                hash_bytes(&mut hash, &pc.to_le_bytes());
                hash_bytes(&mut hash, &word.to_le_bytes());
                hash_bytes(&mut hash, &cycles.to_le_bytes());
            }
            TraceEvent::FaultRaised { class, pc } => {
                hash_bytes(&mut hash, &[0x11, class as u8]);
                hash_bytes(&mut hash, &pc.to_le_bytes());
            }
            TraceEvent::Stopped { pc, reason } => {
                let tag = match reason {
                    StopReason::Halted => 0,
                    StopReason::LoopDetected { .. } => 1,
                    StopReason::BoundReached => 2,
                };
                hash_bytes(&mut hash, &[0x12, tag]);
                hash_bytes(&mut hash, &pc.to_le_bytes());
            }
        }
        self.0.set(hash);
    }
}

// Countdown loops revisit their head, so they run with detection off.
const COUNTDOWN: CoreConfig = CoreConfig {
    dispatch_policy: DispatchPolicy::Strict,
    loop_detection: LoopDetection::Off,
};

fn narrow_countdown(hash: &Rc<Cell<u64>>) {
    // LD B,0x10 ; loop: DEC B ; JR NZ,loop ; HALT
    let mut image = vec![0_u8; 0x100];
    image.extend_from_slice(&[0x06, 0x10, 0x05, 0x20, 0xFD, 0x76]);

    let (machine, map) =
        Machine::<NarrowCpu>::narrow(COUNTDOWN).expect("fixed layout");
    let mut machine = machine.with_trace_sink(Box::new(Fingerprint(Rc::clone(hash))));
    Cartridge::from_bytes(image)
        .expect("non-empty image")
        .mount_into(machine.bus_mut(), map.rom)
        .expect("rom handle");

    machine.run(None).expect("countdown halts");
    let mut value = hash.get();
    hash_bytes(&mut value, &[machine.cpu().registers().flags().bits()]);
    hash.set(value);
}

fn wide_countdown(hash: &Rc<Cell<u64>>) {
    // MOV r0,#16 ; loop: SUBS r0,r0,#1 ; BNE loop ; B .
    let words = [0xE3A0_0010_u32, 0xE250_0001, 0x1AFF_FFFD, 0xEAFF_FFFE];
    let image: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();

    let (machine, map) = Machine::<WideCpu>::wide(COUNTDOWN).expect("fixed layout");
    let mut machine = machine.with_trace_sink(Box::new(Fingerprint(Rc::clone(hash))));
    Cartridge::from_bytes(image)
        .expect("non-empty image")
        .mount_into(machine.bus_mut(), map.rom)
        .expect("rom handle");

    machine.run(Some(64)).expect("countdown runs to bound");
    let mut value = hash.get();
    hash_bytes(&mut value, &machine.cpu().pc().to_le_bytes());
    hash_bytes(&mut value, &machine.cpu().registers().status().bits().to_le_bytes());
    hash.set(value);
}

fn main() {
    let hash = Rc::new(Cell::new(0xcbf2_9ce4_8422_2325_u64));
    narrow_countdown(&hash);
    wide_countdown(&hash);
    println!("{:016x}", hash.get());
}
