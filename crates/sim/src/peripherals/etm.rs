// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::lock::{SoftwareLock, LAR_OFFSET, LSR_OFFSET};
use crate::{SimResult, SimulationError};

const ETM_CR: u32 = 0x000;
const ETM_CR_POWER_DOWN: u32 = 1 << 0;

/// ETMv3.5 control register behind a software lock. Reset value has the
/// power-down bit set.
#[derive(Debug, serde::Serialize)]
pub struct Etm {
    cr: u32,
    lock: SoftwareLock,
}

impl Default for Etm {
    fn default() -> Self {
        Self::new()
    }
}

impl Etm {
    pub fn new() -> Self {
        Self {
            cr: 0x0000_0411,
            lock: SoftwareLock::default(),
        }
    }

    pub fn is_powered(&self) -> bool {
        self.cr & ETM_CR_POWER_DOWN == 0
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }
}

impl crate::Peripheral for Etm {
    fn read(&self, offset: u32) -> SimResult<u32> {
        Ok(match offset {
            ETM_CR => self.cr,
            LSR_OFFSET => self.lock.status().bits(),
            _ => 0,
        })
    }

    fn write(&mut self, offset: u32, value: u32) -> SimResult<()> {
        match offset {
            LAR_OFFSET => self.lock.write_lar(value),
            ETM_CR if self.lock.is_locked() => return Err(SimulationError::Locked(offset)),
            ETM_CR => self.cr = value,
            _ => {}
        }
        Ok(())
    }

    fn as_any(&self) -> Option<&dyn std::any::Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn std::any::Any> {
        Some(self)
    }

    fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
