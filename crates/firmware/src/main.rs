// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! K21 demo: SWO on stimulus port 0 plus the ETM trace path, then a loop
//! that keeps both streams busy.
#![no_std]
#![no_main]

use core::sync::atomic::{AtomicU32, Ordering};
use cortex_m_rt::entry;
use labwired_swo::{etm_init, swo_init, swo_puts, Mmio, StimulusPort};
use panic_halt as _;

const CPU_SPEED: u32 = 21_004_050;
const SWO_SPEED: u32 = 3_000_000;
const PORT_MASK: u32 = 0x1;

// Backdoor key unused, FSEC = 0xFE (unsecured), FOPT = 0xFF.
#[link_section = ".flash_config"]
#[used]
static FLASH_CONFIG: [u8; 16] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFE, 0xFF, 0xFF,
    0xFF,
];

static CALLS: AtomicU32 = AtomicU32::new(0);

/// Out-of-line so every call shows up as a branch in the ETM stream.
#[inline(never)]
fn test_func() {
    CALLS.fetch_add(1, Ordering::Relaxed);
}

#[entry]
fn main() -> ! {
    // SAFETY: running on the K21 this crate's address map describes.
    let regs = unsafe { Mmio::new() };

    swo_init(&regs, CPU_SPEED, SWO_SPEED, PORT_MASK);
    etm_init(&regs);

    let message = b"You must construct additional pylons.";
    let mut counter: u32 = 0;

    loop {
        counter = counter.wrapping_add(1);
        swo_puts(&regs, StimulusPort::P0, message);
        if counter % 3 != 0 {
            test_func();
        }
        cortex_m::asm::nop();
    }
}
