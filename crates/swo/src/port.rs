// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::regs::ITM_BASE;

pub const NUM_STIMULUS_PORTS: u8 = 32;

/// One of the 32 ITM stimulus ports.
///
/// The index is always below 32, so masks and addresses derived from it
/// cannot overflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StimulusPort(u8);

impl StimulusPort {
    pub const P0: Self = Self(0);
    pub const P1: Self = Self(1);
    pub const P2: Self = Self(2);
    pub const P3: Self = Self(3);
    pub const P4: Self = Self(4);
    pub const P5: Self = Self(5);
    pub const P6: Self = Self(6);
    pub const P7: Self = Self(7);
    pub const P8: Self = Self(8);
    pub const P9: Self = Self(9);
    pub const P10: Self = Self(10);
    pub const P11: Self = Self(11);
    pub const P12: Self = Self(12);
    pub const P13: Self = Self(13);
    pub const P14: Self = Self(14);
    pub const P15: Self = Self(15);
    pub const P16: Self = Self(16);
    pub const P17: Self = Self(17);
    pub const P18: Self = Self(18);
    pub const P19: Self = Self(19);
    pub const P20: Self = Self(20);
    pub const P21: Self = Self(21);
    pub const P22: Self = Self(22);
    pub const P23: Self = Self(23);
    pub const P24: Self = Self(24);
    pub const P25: Self = Self(25);
    pub const P26: Self = Self(26);
    pub const P27: Self = Self(27);
    pub const P28: Self = Self(28);
    pub const P29: Self = Self(29);
    pub const P30: Self = Self(30);
    pub const P31: Self = Self(31);

    pub const fn new(index: u8) -> Option<Self> {
        if index < NUM_STIMULUS_PORTS {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn index(self) -> u8 {
        self.0
    }

    /// This port's bit in `ITM_TER`.
    pub const fn mask(self) -> u32 {
        1 << self.0
    }

    /// Address of the port's stimulus register. Reads return the FIFO
    /// status, writes emit a payload packet.
    pub const fn address(self) -> u32 {
        ITM_BASE + 4 * self.0 as u32
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (0..NUM_STIMULUS_PORTS).map(Self)
    }
}

impl TryFrom<u8> for StimulusPort {
    type Error = u8;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index).ok_or(index)
    }
}

/// Set of stimulus ports, laid out like `ITM_TER`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PortMask(u32);

impl PortMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn from_ports<I: IntoIterator<Item = StimulusPort>>(ports: I) -> Self {
        ports
            .into_iter()
            .fold(Self::NONE, |acc, port| acc.with(port))
    }

    #[must_use]
    pub const fn with(self, port: StimulusPort) -> Self {
        Self(self.0 | port.mask())
    }

    pub const fn contains(self, port: StimulusPort) -> bool {
        self.0 & port.mask() != 0
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn ports(self) -> impl Iterator<Item = StimulusPort> {
        StimulusPort::all().filter(move |port| self.contains(*port))
    }
}

impl From<StimulusPort> for PortMask {
    fn from(port: StimulusPort) -> Self {
        Self(port.mask())
    }
}
