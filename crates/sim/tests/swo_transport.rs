// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use labwired_swo::regs::{DEMCR, ITM_TCR, ITM_TER, TPIU_ACPR, TPIU_FFCR, TPIU_SPPR};
use labwired_swo::{
    itm_lock_status, swo_init, swo_putchar, swo_puts, LockStatus, PortMask, RegisterAccess,
    StimulusPort, Swo,
};
use labwired_swo_sim::{BusWrite, SimulatedChip};
use std::fmt::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const CPU_SPEED: u32 = 21_004_050;
const SWO_SPEED: u32 = 3_000_000;

fn ready_chip(port_mask: u32) -> SimulatedChip {
    let chip = SimulatedChip::new();
    swo_init(&chip, CPU_SPEED, SWO_SPEED, port_mask);
    chip.clear_writes();
    chip
}

#[test]
fn test_init_programs_trace_blocks() {
    let chip = SimulatedChip::new();
    swo_init(&chip, CPU_SPEED, SWO_SPEED, 0x1);

    assert_eq!(chip.peek(TPIU_ACPR), Some(6));
    assert_eq!(chip.peek(TPIU_SPPR), Some(0x2));
    assert_eq!(chip.peek(TPIU_FFCR), Some(0x100));
    assert_eq!(chip.peek(ITM_TCR), Some(0x0001_001F));
    assert_eq!(chip.peek(ITM_TER), Some(0x1));
    assert_eq!(chip.peek(DEMCR).map(|v| v & (1 << 24)), Some(1 << 24));
    // DWT NUMCOMP survives the OR.
    assert_eq!(chip.peek(0xE000_1000), Some(0x4000_03FE));
    assert_eq!(itm_lock_status(&chip), LockStatus::PRESENT);
}

#[test]
fn test_itm_config_ignored_without_unlock() {
    let chip = SimulatedChip::new();
    chip.set_bits(DEMCR, 1 << 24);
    chip.write(ITM_TCR, 0x0001_001F);
    chip.write(ITM_TER, 0x1);

    assert_eq!(chip.peek(ITM_TCR), Some(0));
    assert_eq!(chip.peek(ITM_TER), Some(0));
    assert_eq!(swo_putchar(&chip, StimulusPort::P0, b'x'), 0);
}

#[test]
fn test_putchar_enabled_port_single_store() {
    let chip = ready_chip(0x1);
    assert_eq!(swo_putchar(&chip, StimulusPort::P0, b'Z'), b'Z');
    assert_eq!(chip.writes(), vec![BusWrite::byte(0xE000_0000, b'Z')]);
    assert_eq!(chip.stream(StimulusPort::P0), b"Z");
}

#[test]
fn test_putchar_outside_mask_writes_nothing() {
    let chip = ready_chip(0x1);
    for port in StimulusPort::all().skip(1) {
        assert_eq!(swo_putchar(&chip, port, b'Z'), 0);
    }
    assert!(chip.writes().is_empty());
}

#[test]
fn test_putchar_trcena_clear() {
    let chip = ready_chip(PortMask::ALL.bits());
    chip.poke(DEMCR, 0);
    for port in StimulusPort::all() {
        assert_eq!(swo_putchar(&chip, port, b'Z'), 0);
    }
    assert!(chip.writes().is_empty());
}

#[test]
fn test_puts_two_bytes_in_order() {
    let chip = ready_chip(0x1);
    swo_puts(&chip, StimulusPort::P0, b"AB");
    assert_eq!(
        chip.writes(),
        vec![
            BusWrite::byte(0xE000_0000, b'A'),
            BusWrite::byte(0xE000_0000, b'B'),
        ]
    );
    assert_eq!(chip.stream(StimulusPort::P0), b"AB");
}

#[test]
fn test_putchar_waits_for_drain() {
    let chip = ready_chip(0x1);
    chip.set_busy_polls(5);

    swo_puts(&chip, StimulusPort::P0, b"ok");
    assert_eq!(chip.stream(StimulusPort::P0), b"ok");
    assert_eq!(chip.with_itm(|itm| itm.dropped()), Some(0));
    // One ready poll for 'o', then five busy + one ready for 'k'.
    assert_eq!(chip.with_itm(|itm| itm.polls()), Some(7));
}

#[test]
#[should_panic(expected = "Step budget")]
fn test_stalled_probe_blocks_writer() {
    let chip = ready_chip(0x1).with_step_budget(10_000);
    chip.set_fifo_stalled(true);
    swo_putchar(&chip, StimulusPort::P0, b'Z');
}

#[test]
fn test_stalled_probe_releases_writer() {
    let chip = Arc::new(ready_chip(0x1));
    chip.set_fifo_stalled(true);

    let writer = {
        let chip = Arc::clone(&chip);
        thread::spawn(move || swo_putchar(&*chip, StimulusPort::P0, b'Z'))
    };

    thread::sleep(Duration::from_millis(50));
    assert!(!writer.is_finished());
    assert!(chip.writes().is_empty());

    chip.set_fifo_stalled(false);
    assert_eq!(writer.join().unwrap(), b'Z');
    assert_eq!(chip.stream(StimulusPort::P0), b"Z");
}

#[test]
fn test_concurrent_writers_interleave_bytes() {
    let chip = Arc::new(ready_chip(0x1));
    let handles: Vec<_> = [b'a', b'b']
        .into_iter()
        .map(|byte| {
            let chip = Arc::clone(&chip);
            thread::spawn(move || {
                for _ in 0..64 {
                    swo_putchar(&*chip, StimulusPort::P0, byte);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let stream = chip.stream(StimulusPort::P0);
    assert_eq!(stream.len(), 128);
    assert_eq!(stream.iter().filter(|&&b| b == b'a').count(), 64);
    assert_eq!(stream.iter().filter(|&&b| b == b'b').count(), 64);
}

#[test]
fn test_ready_handle_and_writer() {
    let chip = SimulatedChip::new();
    let swo = Swo::init(
        &chip,
        CPU_SPEED,
        SWO_SPEED,
        PortMask::from_ports([StimulusPort::P0, StimulusPort::P3]),
    );

    writeln!(swo.writer(StimulusPort::P3), "tick {}", 7).unwrap();
    swo.puts(StimulusPort::P0, b"You must construct additional pylons.\0ignored");
    assert_eq!(swo.putchar(StimulusPort::P1, b'x'), 0);

    assert_eq!(chip.stream(StimulusPort::P3), b"tick 7\n");
    assert_eq!(
        chip.stream(StimulusPort::P0),
        b"You must construct additional pylons."
    );
    assert!(chip.stream(StimulusPort::P1).is_empty());
    assert_eq!(swo.registers().stream(StimulusPort::P3), b"tick 7\n");
}
