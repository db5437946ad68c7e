// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod bus;
pub mod chip;
pub mod peripherals;
pub mod snapshot;

use std::any::Any;

pub use chip::{BusWrite, SimulatedChip, Width};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimulationError {
    #[error("Memory access violation at {0:#x}")]
    MemoryViolation(u32),
    #[error("Write to {0:#x} ignored: register block is locked")]
    Locked(u32),
    #[error("Step budget of {0} register reads exhausted")]
    StepBudgetExhausted(u64),
}

pub type SimResult<T> = Result<T, SimulationError>;

/// Trait representing a memory-mapped peripheral.
///
/// Offsets are relative to the peripheral base. `read` and `write` are
/// always word aligned; byte stores go through `write_u8`.
pub trait Peripheral: std::fmt::Debug + Send {
    fn read(&self, offset: u32) -> SimResult<u32>;
    fn write(&mut self, offset: u32, value: u32) -> SimResult<()>;

    fn write_u8(&mut self, offset: u32, value: u8) -> SimResult<()> {
        let reg_offset = offset & !3;
        let byte_shift = (offset & 3) * 8;
        let mut reg_val = self.read(reg_offset)?;

        let mask = 0xFF << byte_shift;
        reg_val &= !mask;
        reg_val |= (value as u32) << byte_shift;

        self.write(reg_offset, reg_val)
    }

    fn as_any(&self) -> Option<&dyn Any> {
        None
    }
    fn as_any_mut(&mut self) -> Option<&mut dyn Any> {
        None
    }
    fn snapshot(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}
