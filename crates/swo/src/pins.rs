// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::regs::{
    porte_pcr, PORT_PCR_TRACE, SIM_SCGC5, SIM_SCGC5_PORTE, SIM_SOPT2, SIM_SOPT2_TRACECLKSEL,
    TRACE_PIN_COUNT,
};
use crate::RegisterAccess;

/// Routes the trace port to PTE0..=PTE4.
///
/// Clock writes are issued before the pin mux writes; store order on the
/// core is all the sequencing this needs.
pub fn configure_trace_pins<R: RegisterAccess + ?Sized>(regs: &R) {
    regs.set_bits(SIM_SCGC5, SIM_SCGC5_PORTE);
    regs.set_bits(SIM_SOPT2, SIM_SOPT2_TRACECLKSEL);
    step!("trace: PORTE clock gated on, trace clock = core clock");

    for pin in 0..TRACE_PIN_COUNT {
        regs.write(porte_pcr(pin), PORT_PCR_TRACE);
    }
    step!(pins = TRACE_PIN_COUNT, "trace: PTE pins muxed to ALT5, high drive");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Access, MockRegisters};

    #[test]
    fn test_clock_before_pin_mux() {
        let regs = MockRegisters::new();
        regs.preset(SIM_SOPT2, 0x0000_0004);

        configure_trace_pins(&regs);

        let writes = regs.writes();
        assert_eq!(writes.len(), 7);
        assert_eq!(writes[0], Access::Word(SIM_SCGC5, 1 << 13));
        assert_eq!(writes[1], Access::Word(SIM_SOPT2, 0x1004));
        for (i, w) in writes[2..].iter().enumerate() {
            assert_eq!(*w, Access::Word(0x4004_D000 + 4 * i as u32, 0x540));
        }
    }
}
