// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! SWO output through the ITM stimulus ports.
//!
//! [`swo_init`] runs once at startup. After that [`swo_putchar`] and
//! [`swo_puts`] may be called from thread mode and from any exception
//! handler. There is no locking: two contexts writing to the same port can
//! interleave their bytes. Give each context its own port, or serialize on
//! the caller side, when records must stay whole.

use core::fmt;

use bitflags::bitflags;

use crate::port::{PortMask, StimulusPort};
use crate::regs::{
    DEMCR, DEMCR_TRCENA, DWT_CTRL, DWT_CTRL_EXCEPTION_TRACE, ITM_LAR, ITM_LSR, ITM_STIM_FIFOREADY,
    ITM_TCR, ITM_TCR_ENABLE, ITM_TCR_ITMENA, ITM_TER, ITM_TPR, ITM_TPR_ALL_UNPRIVILEGED,
    TPIU_ACPR, TPIU_FFCR, TPIU_FFCR_TRIGIN, TPIU_SPPR, TPIU_SPPR_NRZ, UNLOCK_TOKEN,
};
use crate::RegisterAccess;

bitflags! {
    /// `ITM_LSR` contents.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LockStatus: u32 {
        /// A lock mechanism is implemented.
        const PRESENT = 1 << 0;
        /// Writes to the ITM are currently blocked.
        const LOCKED = 1 << 1;
        /// The lock register is 8 bits wide.
        const BYTE_ACCESS = 1 << 2;
    }
}

/// Value for `TPIU_ACPR`. The TPIU divides by `ACPR + 1`.
///
/// `swo_hz` should divide `core_clock_hz` evenly or close to it, otherwise
/// the probe sees a drifting baud rate. A zero speed, or one above the core
/// clock, yields `0` (SWO at core clock) instead of faulting.
pub const fn baud_prescaler(core_clock_hz: u32, swo_hz: u32) -> u32 {
    match core_clock_hz.checked_div(swo_hz) {
        Some(ratio) => ratio.saturating_sub(1),
        None => 0,
    }
}

/// Enables tracing and configures the ITM/TPIU for NRZ SWO.
///
/// Only the ports set in `port_mask` accept writes afterwards; everything
/// else written via [`swo_putchar`] is dropped.
pub fn swo_init<R: RegisterAccess + ?Sized>(
    regs: &R,
    core_clock_hz: u32,
    swo_hz: u32,
    port_mask: u32,
) {
    regs.set_bits(DEMCR, DEMCR_TRCENA);
    regs.write(ITM_LAR, UNLOCK_TOKEN);
    regs.write(TPIU_SPPR, TPIU_SPPR_NRZ);

    let prescaler = baud_prescaler(core_clock_hz, swo_hz);
    regs.write(TPIU_ACPR, prescaler);
    step!(core_clock_hz, swo_hz, prescaler, "swo: NRZ, prescaler set");

    regs.write(ITM_TPR, ITM_TPR_ALL_UNPRIVILEGED);
    regs.set_bits(DWT_CTRL, DWT_CTRL_EXCEPTION_TRACE);
    regs.write(ITM_TCR, ITM_TCR_ENABLE);
    regs.write(TPIU_FFCR, TPIU_FFCR_TRIGIN);
    regs.write(ITM_TER, port_mask);
    step!(port_mask, "swo: ITM enabled");
}

/// Writes `byte` to `port` and returns it, or returns `0` without touching
/// any register if tracing, the ITM, or the port is disabled.
///
/// Spins until the port FIFO has room. There is no timeout: if the probe
/// stops draining SWO, this never returns. Callers that need a bound must
/// add it outside.
pub fn swo_putchar<R: RegisterAccess + ?Sized>(regs: &R, port: StimulusPort, byte: u8) -> u8 {
    if regs.read(DEMCR) & DEMCR_TRCENA == 0 {
        return 0;
    }
    if regs.read(ITM_TCR) & ITM_TCR_ITMENA == 0 {
        return 0;
    }
    if regs.read(ITM_TER) & port.mask() == 0 {
        return 0;
    }

    let stim = port.address();
    while regs.read(stim) & ITM_STIM_FIFOREADY == 0 {
        core::hint::spin_loop();
    }
    regs.write_u8(stim, byte);
    byte
}

/// Writes `bytes` up to the first NUL, one [`swo_putchar`] per byte.
pub fn swo_puts<R: RegisterAccess + ?Sized>(regs: &R, port: StimulusPort, bytes: &[u8]) {
    for &byte in bytes.iter().take_while(|&&b| b != 0) {
        swo_putchar(regs, port, byte);
    }
}

pub fn itm_lock_status<R: RegisterAccess + ?Sized>(regs: &R) -> LockStatus {
    LockStatus::from_bits_truncate(regs.read(ITM_LSR))
}

/// An initialized SWO transport.
#[derive(Debug)]
pub struct Swo<R> {
    regs: R,
}

impl<R: RegisterAccess> Swo<R> {
    /// Runs [`swo_init`] and takes over `regs`.
    pub fn init(regs: R, core_clock_hz: u32, swo_hz: u32, ports: PortMask) -> Self {
        swo_init(&regs, core_clock_hz, swo_hz, ports.bits());
        Self { regs }
    }

    pub fn putchar(&self, port: StimulusPort, byte: u8) -> u8 {
        swo_putchar(&self.regs, port, byte)
    }

    pub fn puts(&self, port: StimulusPort, bytes: &[u8]) {
        swo_puts(&self.regs, port, bytes)
    }

    pub fn writer(&self, port: StimulusPort) -> StimulusWriter<'_, R> {
        StimulusWriter::new(&self.regs, port)
    }

    pub fn registers(&self) -> &R {
        &self.regs
    }
}

/// `core::fmt::Write` sink for one stimulus port.
///
/// Never reports an error. Bytes the ITM refuses are lost, same as with
/// [`swo_putchar`].
pub struct StimulusWriter<'a, R: ?Sized> {
    regs: &'a R,
    port: StimulusPort,
}

impl<'a, R: RegisterAccess + ?Sized> StimulusWriter<'a, R> {
    pub fn new(regs: &'a R, port: StimulusPort) -> Self {
        Self { regs, port }
    }

    pub fn port(&self) -> StimulusPort {
        self.port
    }
}

impl<R: RegisterAccess + ?Sized> fmt::Write for StimulusWriter<'_, R> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &byte in s.as_bytes() {
            swo_putchar(self.regs, self.port, byte);
        }
        Ok(())
    }
}
