// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::bus::SystemBus;
use crate::peripherals::etm::Etm;
use crate::peripherals::itm::Itm;
use crate::snapshot::ChipSnapshot;
use crate::SimulationError;
use labwired_swo::{etm_init, RegisterAccess, StimulusPort, Swo};
use labwired_swo_config::{ConfigError, TraceConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Width {
    Byte,
    Word,
}

/// One store as issued by the code under test, whether or not the target
/// register accepted it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BusWrite {
    pub addr: u32,
    pub value: u32,
    pub width: Width,
}

impl BusWrite {
    pub fn word(addr: u32, value: u32) -> Self {
        Self {
            addr,
            value,
            width: Width::Word,
        }
    }

    pub fn byte(addr: u32, value: u8) -> Self {
        Self {
            addr,
            value: value as u32,
            width: Width::Byte,
        }
    }
}

/// K21 trace block behind [`RegisterAccess`], with a write log.
///
/// Safe to share between threads, which is how tests play "interrupt
/// context" and "probe" against a spinning writer.
pub struct SimulatedChip {
    bus: Mutex<SystemBus>,
    writes: Mutex<Vec<BusWrite>>,
    reads: AtomicU64,
    step_budget: Option<u64>,
}

impl Default for SimulatedChip {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedChip {
    pub fn new() -> Self {
        Self::with_bus(SystemBus::k21())
    }

    pub fn with_bus(bus: SystemBus) -> Self {
        Self {
            bus: Mutex::new(bus),
            writes: Mutex::new(Vec::new()),
            reads: AtomicU64::new(0),
            step_budget: None,
        }
    }

    /// Panics once more than `budget` register reads have been issued.
    ///
    /// `swo_putchar` has no error path out of its spin, so this is the only
    /// way a bounded test can observe that it would block forever.
    pub fn with_step_budget(mut self, budget: u64) -> Self {
        self.step_budget = Some(budget);
        self
    }

    /// Chip with the FIFO behaviour from `config`.
    pub fn from_config(config: &TraceConfig) -> Self {
        let mut chip = Self::new();
        chip.step_budget = config.fifo.poll_budget;
        chip.set_busy_polls(config.fifo.busy_polls);
        chip.set_fifo_stalled(config.fifo.stalled);
        chip
    }

    /// Runs the bring-up described by `config`: pins and ETM path when
    /// `etm` is set, then SWO.
    pub fn bring_up(&self, config: &TraceConfig) -> Result<Swo<&Self>, ConfigError> {
        config.validate()?;
        let mask = config.port_mask()?;
        if config.etm {
            etm_init(self);
        }
        tracing::info!(
            "SWO {} Hz from {} Hz core clock, prescaler {}, ports {:#010x}",
            config.swo_hz,
            config.core_clock_hz,
            config.prescaler(),
            mask.bits()
        );
        Ok(Swo::init(
            self,
            config.core_clock_hz,
            config.swo_hz,
            mask,
        ))
    }

    fn bus(&self) -> MutexGuard<'_, SystemBus> {
        self.bus.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn log(&self, write: BusWrite) {
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(write);
    }

    pub fn writes(&self) -> Vec<BusWrite> {
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear_writes(&self) {
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Current value of a register, without counting as a read.
    pub fn peek(&self, addr: u32) -> Option<u32> {
        self.bus().read_u32(addr).ok()
    }

    pub fn poke(&self, addr: u32, value: u32) {
        if let Err(e) = self.bus().write_u32(addr, value) {
            tracing::warn!("poke: {}", e);
        }
    }

    pub fn with_itm<T>(&self, f: impl FnOnce(&mut Itm) -> T) -> Option<T> {
        self.bus().find_mut::<Itm>("itm").map(f)
    }

    pub fn with_etm<T>(&self, f: impl FnOnce(&mut Etm) -> T) -> Option<T> {
        self.bus().find_mut::<Etm>("etm").map(f)
    }

    pub fn set_busy_polls(&self, polls: u32) {
        self.with_itm(|itm| itm.set_busy_polls(polls));
    }

    pub fn set_fifo_stalled(&self, stalled: bool) {
        self.with_itm(|itm| itm.set_stalled(stalled));
    }

    /// Bytes the simulated probe drained from `port`.
    pub fn stream(&self, port: StimulusPort) -> Vec<u8> {
        self.with_itm(|itm| itm.stream(port.index()).to_vec())
            .unwrap_or_default()
    }

    pub fn snapshot(&self) -> ChipSnapshot {
        let bus = self.bus();
        ChipSnapshot {
            peripherals: bus
                .peripherals
                .iter()
                .map(|p| (p.name.clone(), p.dev.snapshot()))
                .collect(),
            writes: self.writes().len(),
            reads: self.reads(),
        }
    }
}

impl RegisterAccess for SimulatedChip {
    fn read(&self, addr: u32) -> u32 {
        let n = self.reads.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(budget) = self.step_budget {
            if n > budget {
                panic!("{}", SimulationError::StepBudgetExhausted(budget));
            }
        }
        match self.bus().read_u32(addr) {
            Ok(value) => {
                tracing::trace!("read  {:#010x} -> {:#010x}", addr, value);
                value
            }
            Err(e) => {
                tracing::warn!("read: {}", e);
                0
            }
        }
    }

    fn write(&self, addr: u32, value: u32) {
        self.log(BusWrite::word(addr, value));
        tracing::trace!("write {:#010x} <- {:#010x}", addr, value);
        if let Err(e) = self.bus().write_u32(addr, value) {
            tracing::warn!("write: {}", e);
        }
    }

    fn write_u8(&self, addr: u32, value: u8) {
        self.log(BusWrite::byte(addr, value));
        tracing::trace!("write {:#010x} <- {:#04x} (byte)", addr, value);
        if let Err(e) = self.bus().write_u8(addr, value) {
            tracing::warn!("write: {}", e);
        }
    }
}
