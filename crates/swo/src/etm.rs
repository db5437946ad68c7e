// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! ETM → ETF → TPIU signal path.
//!
//! None of these registers report failure. Calling [`enable_trace_path`]
//! before [`crate::configure_trace_pins`], or writing the steps in another
//! order, leaves instruction trace silently dead.

use crate::pins::configure_trace_pins;
use crate::regs::{
    ETF_FCR, ETF_FCR_ETM_ENABLE, ETM_CR, ETM_CR_POWER_DOWN, ETM_LAR, MCM_ETBCC, MCM_ETBCC_ETDIS,
    UNLOCK_TOKEN,
};
use crate::RegisterAccess;

/// Unlocks `lar` and clears `mask` in the register it guards.
///
/// The two stores must be back to back: any other value landing in `lar`
/// in between re-locks the block and the clear is dropped.
fn privileged_clear<R: RegisterAccess + ?Sized>(regs: &R, lar: u32, reg: u32, mask: u32) {
    regs.write(lar, UNLOCK_TOKEN);
    regs.clear_bits(reg, mask);
}

/// Powers up the ETM and opens its path to the trace port.
pub fn enable_trace_path<R: RegisterAccess + ?Sized>(regs: &R) {
    privileged_clear(regs, ETM_LAR, ETM_CR, ETM_CR_POWER_DOWN);
    step!("etm: unlocked, power-down cleared");

    regs.set_bits(ETF_FCR, ETF_FCR_ETM_ENABLE);
    step!("etm: ETF path enabled");

    regs.clear_bits(MCM_ETBCC, MCM_ETBCC_ETDIS);
    step!("etm: ETM to TPIU signal path enabled");
}

/// Pin mux followed by the ETM path, in the order the hardware needs.
pub fn etm_init<R: RegisterAccess + ?Sized>(regs: &R) {
    configure_trace_pins(regs);
    enable_trace_path(regs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Access, MockRegisters};

    #[test]
    fn test_trace_path_write_order() {
        let regs = MockRegisters::new();
        // Reset values: ETM powered down, other bits set to check RMW.
        regs.preset(ETM_CR, 0x0000_0411);
        regs.preset(ETF_FCR, 0x0000_0300);
        regs.preset(MCM_ETBCC, 0x0000_0013);

        enable_trace_path(&regs);

        assert_eq!(
            regs.writes(),
            vec![
                Access::Word(ETM_LAR, 0xC5AC_CE55),
                Access::Word(ETM_CR, 0x0000_0410),
                Access::Word(ETF_FCR, 0x0000_0301),
                Access::Word(MCM_ETBCC, 0x0000_0003),
            ]
        );
    }

    #[test]
    fn test_etm_init_runs_pins_first() {
        let regs = MockRegisters::new();
        etm_init(&regs);

        let writes = regs.writes();
        assert_eq!(writes.len(), 7 + 4);
        assert_eq!(writes[0], Access::Word(0x4004_8038, 1 << 13));
        assert_eq!(writes[7], Access::Word(ETM_LAR, UNLOCK_TOKEN));
    }
}
