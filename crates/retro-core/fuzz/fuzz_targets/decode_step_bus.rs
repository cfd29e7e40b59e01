#![no_main]

use libfuzzer_sys::fuzz_target;
use retro_core::memory::map::ROM_START;
use retro_core::{
    decode, Cartridge, CoreConfig, Cpu, DispatchPolicy, Machine, NarrowCpu, WideCpu,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 8 {
        return;
    }

    let word = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let _ = decode(word);

    let Ok(cartridge) = Cartridge::from_bytes(data) else {
        return;
    };
    let config = CoreConfig {
        dispatch_policy: DispatchPolicy::Permissive,
        ..CoreConfig::default()
    };

    if let Ok((mut machine, map)) = Machine::<WideCpu>::wide(config) {
        if cartridge.mount_into(machine.bus_mut(), map.rom).is_ok() {
            for _ in 0..64 {
                let before = machine.cpu().registers().clone();
                if machine.step().is_err() {
                    assert_eq!(machine.cpu().registers(), &before);
                    break;
                }
            }
            let _ = machine.bus_mut().read32(ROM_START);
        }
    }

    if let Ok((mut machine, map)) = Machine::<NarrowCpu>::narrow(config) {
        let mut image = vec![0_u8; 0x100];
        image.extend_from_slice(data);
        if let Ok(cartridge) = Cartridge::from_bytes(image) {
            if cartridge.mount_into(machine.bus_mut(), map.rom).is_ok() {
                for _ in 0..64 {
                    let before = machine.cpu().registers().clone();
                    if machine.step().is_err() {
                        assert_eq!(machine.cpu().registers(), &before);
                        break;
                    }
                    if !machine.cpu().is_running() {
                        break;
                    }
                }
            }
        }
    }
});
