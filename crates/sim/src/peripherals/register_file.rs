// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::SimResult;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, serde::Serialize)]
struct Register {
    value: u32,
    #[serde(skip)]
    read_only: u32,
}

/// Plain read/write registers with reset values. Offsets that were not
/// declared read as zero and drop writes.
#[derive(Debug, Default, serde::Serialize)]
pub struct RegisterFile {
    registers: BTreeMap<u32, Register>,
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a register. Bits in `read_only` keep their reset value.
    pub fn with_register(mut self, offset: u32, reset: u32, read_only: u32) -> Self {
        self.registers.insert(
            offset,
            Register {
                value: reset,
                read_only,
            },
        );
        self
    }

    pub fn value(&self, offset: u32) -> Option<u32> {
        self.registers.get(&offset).map(|r| r.value)
    }
}

impl crate::Peripheral for RegisterFile {
    fn read(&self, offset: u32) -> SimResult<u32> {
        Ok(self.value(offset).unwrap_or(0))
    }

    fn write(&mut self, offset: u32, value: u32) -> SimResult<()> {
        if let Some(reg) = self.registers.get_mut(&offset) {
            reg.value = (reg.value & reg.read_only) | (value & !reg.read_only);
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
        let regs: BTreeMap<String, u32> = self
            .registers
            .iter()
            .map(|(offset, reg)| (format!("{:#05x}", offset), reg.value))
            .collect();
        serde_json::to_value(regs).unwrap_or(serde_json::Value::Null)
    }
}
