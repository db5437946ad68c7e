// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use labwired_swo::regs::UNLOCK_TOKEN;
use labwired_swo::LockStatus;

pub const LAR_OFFSET: u32 = 0xFB0;
pub const LSR_OFFSET: u32 = 0xFB4;

/// CoreSight software lock (LAR/LSR pair).
///
/// Locked out of reset. The unlock token opens the block, any other value
/// written to LAR closes it again.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct SoftwareLock {
    locked: bool,
}

impl Default for SoftwareLock {
    fn default() -> Self {
        Self { locked: true }
    }
}

impl SoftwareLock {
    pub fn write_lar(&mut self, value: u32) {
        self.locked = value != UNLOCK_TOKEN;
        tracing::trace!(locked = self.locked, "LAR <- {:#010x}", value);
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn status(&self) -> LockStatus {
        if self.locked {
            LockStatus::PRESENT | LockStatus::LOCKED
        } else {
            LockStatus::PRESENT
        }
    }
}
