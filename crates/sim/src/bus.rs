// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::peripherals::etm::Etm;
use crate::peripherals::itm::Itm;
use crate::peripherals::register_file::RegisterFile;
use crate::{Peripheral, SimResult, SimulationError};

pub struct PeripheralEntry {
    pub name: String,
    pub base: u32,
    pub size: u32,
    pub dev: Box<dyn Peripheral>,
}

impl PeripheralEntry {
    fn contains(&self, addr: u32) -> bool {
        addr >= self.base && addr - self.base < self.size
    }
}

/// Peripherals report offsets; callers want bus addresses.
fn absolute(err: SimulationError, base: u32) -> SimulationError {
    match err {
        SimulationError::Locked(offset) => SimulationError::Locked(base + offset),
        SimulationError::MemoryViolation(offset) => SimulationError::MemoryViolation(base + offset),
        other => other,
    }
}

#[derive(Default)]
pub struct SystemBus {
    pub peripherals: Vec<PeripheralEntry>,
}

impl SystemBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Debug and trace blocks of a Kinetis K21 (Cortex-M4), plus the SIM and
    /// PORTE registers the trace pins need.
    pub fn k21() -> Self {
        let mut bus = Self::new();
        bus.attach("itm", 0xE000_0000, 0x1000, Box::new(Itm::new()));
        bus.attach(
            "dwt",
            0xE000_1000,
            0x1000,
            // NUMCOMP = 4, read-only.
            Box::new(RegisterFile::new().with_register(0x000, 0x4000_0000, 0xF000_0000)),
        );
        bus.attach(
            "dcb",
            0xE000_EDF0,
            0x10,
            Box::new(
                RegisterFile::new()
                    .with_register(0x0, 0, 0)
                    .with_register(0xC, 0, 0),
            ),
        );
        bus.attach(
            "tpiu",
            0xE004_0000,
            0x1000,
            Box::new(
                RegisterFile::new()
                    .with_register(0x010, 0, 0)
                    // Manchester after reset.
                    .with_register(0x0F0, 0x1, 0)
                    .with_register(0x304, 0x102, 0),
            ),
        );
        bus.attach("etm", 0xE004_1000, 0x1000, Box::new(Etm::new()));
        bus.attach(
            "etf",
            0xE004_3000,
            0x1000,
            Box::new(RegisterFile::new().with_register(0x000, 0, 0)),
        );
        bus.attach(
            "mcm",
            0xE008_0000,
            0x1000,
            Box::new(RegisterFile::new().with_register(0x014, 0, 0)),
        );
        bus.attach(
            "sim",
            0x4004_7000,
            0x2000,
            Box::new(
                RegisterFile::new()
                    .with_register(0x1004, 0, 0)
                    .with_register(0x1038, 0x0004_0182, 0),
            ),
        );
        let mut porte = RegisterFile::new();
        for pin in 0..32 {
            porte = porte.with_register(pin * 4, 0, 0);
        }
        bus.attach("porte", 0x4004_D000, 0x1000, Box::new(porte));
        bus
    }

    pub fn attach(&mut self, name: &str, base: u32, size: u32, dev: Box<dyn Peripheral>) {
        self.peripherals.push(PeripheralEntry {
            name: name.to_string(),
            base,
            size,
            dev,
        });
    }

    fn entry(&self, addr: u32) -> SimResult<&PeripheralEntry> {
        self.peripherals
            .iter()
            .find(|p| p.contains(addr))
            .ok_or(SimulationError::MemoryViolation(addr))
    }

    fn entry_mut(&mut self, addr: u32) -> SimResult<&mut PeripheralEntry> {
        self.peripherals
            .iter_mut()
            .find(|p| p.contains(addr))
            .ok_or(SimulationError::MemoryViolation(addr))
    }

    pub fn read_u32(&self, addr: u32) -> SimResult<u32> {
        let p = self.entry(addr & !3)?;
        p.dev.read((addr & !3) - p.base)
    }

    pub fn write_u32(&mut self, addr: u32, value: u32) -> SimResult<()> {
        let p = self.entry_mut(addr & !3)?;
        let offset = (addr & !3) - p.base;
        let base = p.base;
        p.dev.write(offset, value).map_err(|e| absolute(e, base))
    }

    pub fn write_u8(&mut self, addr: u32, value: u8) -> SimResult<()> {
        let p = self.entry_mut(addr)?;
        let offset = addr - p.base;
        let base = p.base;
        p.dev.write_u8(offset, value).map_err(|e| absolute(e, base))
    }

    pub fn find<T: 'static>(&self, name: &str) -> Option<&T> {
        self.peripherals
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.dev.as_any())
            .and_then(|any| any.downcast_ref::<T>())
    }

    pub fn find_mut<T: 'static>(&mut self, name: &str) -> Option<&mut T> {
        self.peripherals
            .iter_mut()
            .find(|p| p.name == name)
            .and_then(|p| p.dev.as_any_mut())
            .and_then(|any| any.downcast_mut::<T>())
    }
}
