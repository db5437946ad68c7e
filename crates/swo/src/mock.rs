// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::RegisterAccess;
use std::cell::RefCell;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Word(u32, u32),
    Byte(u32, u8),
}

/// Flat register bank that records every store. Byte stores are logged but
/// not kept, so stimulus port status reads stay whatever was preset.
#[derive(Debug, Default)]
pub struct MockRegisters {
    values: RefCell<HashMap<u32, u32>>,
    writes: RefCell<Vec<Access>>,
}

impl MockRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preset(&self, addr: u32, value: u32) {
        self.values.borrow_mut().insert(addr, value);
    }

    pub fn value(&self, addr: u32) -> u32 {
        self.values.borrow().get(&addr).copied().unwrap_or(0)
    }

    pub fn writes(&self) -> Vec<Access> {
        self.writes.borrow().clone()
    }

    pub fn clear_log(&self) {
        self.writes.borrow_mut().clear();
    }
}

impl RegisterAccess for MockRegisters {
    fn read(&self, addr: u32) -> u32 {
        self.value(addr)
    }

    fn write(&self, addr: u32, value: u32) {
        self.values.borrow_mut().insert(addr, value);
        self.writes.borrow_mut().push(Access::Word(addr, value));
    }

    fn write_u8(&self, addr: u32, value: u8) {
        self.writes.borrow_mut().push(Access::Byte(addr, value));
    }
}
