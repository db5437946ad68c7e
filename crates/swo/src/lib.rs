// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Trace-output bring-up for Cortex-M debug silicon.
//!
//! Three independent pieces live here:
//!
//! * [`pins`]: clock gate and pin mux for the trace port (Kinetis K21, PORTE).
//! * [`etm`]: unlocks the ETM and opens the ETM → ETF → TPIU path.
//! * [`itm`]: configures the ITM/TPIU for SWO (NRZ) and writes bytes to
//!   stimulus ports.
//!
//! Every register access goes through [`RegisterAccess`], so the same
//! sequences drive real hardware via [`Mmio`] or a simulated register bank on
//! the host.
#![cfg_attr(not(test), no_std)]

#[macro_use]
mod log;

pub mod etm;
pub mod itm;
pub mod pins;
pub mod port;
pub mod regs;

#[cfg(test)]
mod mock;

pub use etm::{enable_trace_path, etm_init};
pub use itm::{
    baud_prescaler, itm_lock_status, swo_init, swo_putchar, swo_puts, LockStatus, StimulusWriter,
    Swo,
};
pub use pins::configure_trace_pins;
pub use port::{PortMask, StimulusPort};

/// Word-addressed access to the memory-mapped register space.
///
/// Methods take `&self`: the registers are global shared state and writers
/// in interrupt context must not need exclusive access.
pub trait RegisterAccess {
    fn read(&self, addr: u32) -> u32;
    fn write(&self, addr: u32, value: u32);

    /// Single byte store. Stimulus ports are written this way so the ITM
    /// emits a one-byte payload packet.
    fn write_u8(&self, addr: u32, value: u8);

    /// `reg |= mask`
    fn set_bits(&self, addr: u32, mask: u32) {
        let value = self.read(addr);
        self.write(addr, value | mask);
    }

    /// `reg &= !mask`
    fn clear_bits(&self, addr: u32, mask: u32) {
        let value = self.read(addr);
        self.write(addr, value & !mask);
    }
}

impl<R: RegisterAccess + ?Sized> RegisterAccess for &R {
    fn read(&self, addr: u32) -> u32 {
        (**self).read(addr)
    }

    fn write(&self, addr: u32, value: u32) {
        (**self).write(addr, value)
    }

    fn write_u8(&self, addr: u32, value: u8) {
        (**self).write_u8(addr, value)
    }
}

/// Volatile memory-mapped I/O on the running core.
#[derive(Debug, Clone, Copy)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// # Safety
    ///
    /// Only sound on a target where every address used by this crate maps
    /// to the documented Cortex-M debug and Kinetis system registers.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterAccess for Mmio {
    #[inline]
    fn read(&self, addr: u32) -> u32 {
        // SAFETY: `Mmio::new` requires the address map to be valid.
        unsafe { core::ptr::read_volatile(addr as usize as *const u32) }
    }

    #[inline]
    fn write(&self, addr: u32, value: u32) {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile(addr as usize as *mut u32, value) }
    }

    #[inline]
    fn write_u8(&self, addr: u32, value: u8) {
        // SAFETY: see `read`.
        unsafe { core::ptr::write_volatile(addr as usize as *mut u8, value) }
    }
}
