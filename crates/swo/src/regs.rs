// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Register addresses and bit patterns.
//!
//! Everything under `0xE000_0000` is ARM CoreSight (ARMv7-M debug). `MCM`,
//! `SIM` and `PORTE` are Kinetis K21 system registers.

/// Written to a lock access register to allow writes to the block it guards.
/// Any other value re-locks.
pub const UNLOCK_TOKEN: u32 = 0xC5AC_CE55;

// Debug Exception and Monitor Control Register.
pub const DEMCR: u32 = 0xE000_EDFC;
/// Global enable for DWT, ITM, ETM and TPIU.
pub const DEMCR_TRCENA: u32 = 1 << 24;

// Instrumentation Trace Macrocell.
pub const ITM_BASE: u32 = 0xE000_0000;
pub const ITM_TER: u32 = 0xE000_0E00;
pub const ITM_TPR: u32 = 0xE000_0E40;
pub const ITM_TCR: u32 = 0xE000_0E80;
// Architecturally standard location; confirm against the K21 reference manual.
pub const ITM_LAR: u32 = 0xE000_0FB0;
pub const ITM_LSR: u32 = 0xE000_0FB4;

pub const ITM_TCR_ITMENA: u32 = 1 << 0;
/// ITMENA, TSENA, SYNCENA, TXENA, SWOENA and ATB ID 1.
pub const ITM_TCR_ENABLE: u32 = 0x0001_001F;
/// Every port range accessible from unprivileged code.
pub const ITM_TPR_ALL_UNPRIVILEGED: u32 = 0x0000_0000;
/// Read side of a stimulus port: FIFO can accept a write.
pub const ITM_STIM_FIFOREADY: u32 = 1 << 0;

// Data Watchpoint and Trace.
pub const DWT_CTRL: u32 = 0xE000_1000;
/// Exception trace and exception overhead counters.
pub const DWT_CTRL_EXCEPTION_TRACE: u32 = 0x4000_03FE;

// Trace Port Interface Unit.
pub const TPIU_ACPR: u32 = 0xE004_0010;
pub const TPIU_SPPR: u32 = 0xE004_00F0;
pub const TPIU_FFCR: u32 = 0xE004_0304;

pub const TPIU_SPPR_MANCHESTER: u32 = 0x1;
pub const TPIU_SPPR_NRZ: u32 = 0x2;
/// TrigIn: indicate triggers in the formatted stream.
pub const TPIU_FFCR_TRIGIN: u32 = 0x0000_0100;

// Embedded Trace Macrocell.
pub const ETM_CR: u32 = 0xE004_1000;
pub const ETM_LAR: u32 = 0xE004_1FB0;
pub const ETM_CR_POWER_DOWN: u32 = 1 << 0;

// Embedded Trace FIFO.
pub const ETF_FCR: u32 = 0xE004_3000;
pub const ETF_FCR_ETM_ENABLE: u32 = 1 << 0;

// Kinetis Miscellaneous Control Module, ETB counter control.
pub const MCM_ETBCC: u32 = 0xE008_0014;
pub const MCM_ETBCC_ETDIS: u32 = 1 << 4;

// Kinetis System Integration Module.
pub const SIM_SOPT2: u32 = 0x4004_8004;
pub const SIM_SCGC5: u32 = 0x4004_8038;
/// Trace clock = core/system clock.
pub const SIM_SOPT2_TRACECLKSEL: u32 = 0x1000;
pub const SIM_SCGC5_PORTE: u32 = 1 << 13;

// PORTE pin control registers. PTE0 is TRACE_CLKOUT, PTE1..=PTE4 TRACE_D3..D0.
pub const PORTE_BASE: u32 = 0x4004_D000;
pub const TRACE_PIN_COUNT: u32 = 5;
pub const PORT_PCR_DSE: u32 = 1 << 6;
pub const PORT_PCR_MUX_ALT5: u32 = 5 << 8;
pub const PORT_PCR_TRACE: u32 = PORT_PCR_DSE | PORT_PCR_MUX_ALT5;

pub const fn porte_pcr(pin: u32) -> u32 {
    PORTE_BASE + 4 * pin
}
