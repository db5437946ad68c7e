// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use super::lock::{SoftwareLock, LAR_OFFSET, LSR_OFFSET};
use crate::{SimResult, SimulationError};
use labwired_swo::regs::{ITM_STIM_FIFOREADY, ITM_TCR_ITMENA};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

const STIM_END: u32 = 0x080;
const ITM_TER: u32 = 0xE00;
const ITM_TPR: u32 = 0xE40;
const ITM_TCR: u32 = 0xE80;

/// Instrumentation Trace Macrocell with a simulated probe on the far end.
///
/// Each stimulus port has a one-entry FIFO. After a byte is accepted the
/// port reads "full" for `busy_polls` status reads, which stands in for the
/// time the probe takes to drain it. A stalled probe never drains.
#[derive(Debug)]
pub struct Itm {
    ter: u32,
    tpr: u32,
    tcr: u32,
    lock: SoftwareLock,
    busy_polls: u32,
    stalled: bool,
    countdown: Vec<AtomicU32>,
    polls: AtomicU64,
    streams: Vec<Vec<u8>>,
    dropped: u64,
}

impl Default for Itm {
    fn default() -> Self {
        Self::new()
    }
}

impl Itm {
    pub fn new() -> Self {
        Self {
            ter: 0,
            tpr: 0,
            tcr: 0,
            lock: SoftwareLock::default(),
            busy_polls: 0,
            stalled: false,
            countdown: (0..32).map(|_| AtomicU32::new(0)).collect(),
            polls: AtomicU64::new(0),
            streams: vec![Vec::new(); 32],
            dropped: 0,
        }
    }

    pub fn set_busy_polls(&mut self, polls: u32) {
        self.busy_polls = polls;
    }

    pub fn set_stalled(&mut self, stalled: bool) {
        self.stalled = stalled;
    }

    /// Bytes the probe received on `port`, in order.
    pub fn stream(&self, port: u8) -> &[u8] {
        self.streams
            .get(port as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn take_stream(&mut self, port: u8) -> Vec<u8> {
        self.streams
            .get_mut(port as usize)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Stimulus status reads so far.
    pub fn polls(&self) -> u64 {
        self.polls.load(Ordering::Relaxed)
    }

    /// Payload writes the ITM discarded.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    fn fifo_ready(&self, port: usize) -> bool {
        if self.stalled {
            return false;
        }
        let slot = &self.countdown[port];
        let left = slot.load(Ordering::Relaxed);
        if left > 0 {
            slot.store(left - 1, Ordering::Relaxed);
            return false;
        }
        true
    }

    fn emit(&mut self, port: usize, payload: &[u8]) {
        if self.tcr & ITM_TCR_ITMENA == 0 || self.ter & (1 << port) == 0 {
            tracing::trace!(port, "ITM: stimulus write ignored, port disabled");
            self.dropped += 1;
            return;
        }
        if self.stalled || self.countdown[port].load(Ordering::Relaxed) > 0 {
            tracing::warn!(port, "ITM: stimulus write while FIFO full, payload lost");
            self.dropped += 1;
            return;
        }
        self.streams[port].extend_from_slice(payload);
        self.countdown[port].store(self.busy_polls, Ordering::Relaxed);
    }

    fn write_config(&mut self, offset: u32, value: u32) -> SimResult<()> {
        if self.lock.is_locked() {
            return Err(SimulationError::Locked(offset));
        }
        match offset {
            ITM_TER => self.ter = value,
            ITM_TPR => self.tpr = value,
            ITM_TCR => self.tcr = value,
            _ => {}
        }
        Ok(())
    }
}

impl crate::Peripheral for Itm {
    fn read(&self, offset: u32) -> SimResult<u32> {
        let val = match offset {
            o if o < STIM_END => {
                self.polls.fetch_add(1, Ordering::Relaxed);
                if self.fifo_ready((o / 4) as usize) {
                    ITM_STIM_FIFOREADY
                } else {
                    0
                }
            }
            ITM_TER => self.ter,
            ITM_TPR => self.tpr,
            ITM_TCR => self.tcr,
            LSR_OFFSET => self.lock.status().bits(),
            _ => 0,
        };
        Ok(val)
    }

    fn write(&mut self, offset: u32, value: u32) -> SimResult<()> {
        match offset {
            o if o < STIM_END => {
                self.emit((o / 4) as usize, &value.to_le_bytes());
                Ok(())
            }
            LAR_OFFSET => {
                self.lock.write_lar(value);
                Ok(())
            }
            ITM_TER | ITM_TPR | ITM_TCR => self.write_config(offset, value),
            _ => Ok(()),
        }
    }

    fn write_u8(&mut self, offset: u32, value: u8) -> SimResult<()> {
        if offset < STIM_END {
            self.emit((offset / 4) as usize, &[value]);
            return Ok(());
        }
        let reg_offset = offset & !3;
        let byte_shift = (offset & 3) * 8;
        let mut reg_val = self.read(reg_offset)?;
        reg_val &= !(0xFF << byte_shift);
        reg_val |= (value as u32) << byte_shift;
        self.write(reg_offset, reg_val)
    }

    fn as_any(&self) -> Option<&dyn std::any::Any> {
        Some(self)
    }

    fn as_any_mut(&mut self) -> Option<&mut dyn std::any::Any> {
        Some(self)
    }

    fn snapshot(&self) -> serde_json::Value {
        let streams: serde_json::Map<String, serde_json::Value> = self
            .streams
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_empty())
            .map(|(port, s)| (port.to_string(), String::from_utf8_lossy(s).into()))
            .collect();
        serde_json::json!({
            "ter": self.ter,
            "tpr": self.tpr,
            "tcr": self.tcr,
            "lock": self.lock,
            "busy_polls": self.busy_polls,
            "stalled": self.stalled,
            "polls": self.polls(),
            "dropped": self.dropped,
            "streams": streams,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Peripheral;
    use labwired_swo::regs::UNLOCK_TOKEN;

    fn enabled_itm(ter: u32) -> Itm {
        let mut itm = Itm::new();
        itm.write(LAR_OFFSET, UNLOCK_TOKEN).unwrap();
        itm.write(ITM_TCR, 0x0001_001F).unwrap();
        itm.write(ITM_TER, ter).unwrap();
        itm
    }

    #[test]
    fn test_config_writes_need_unlock() {
        let mut itm = Itm::new();
        assert_eq!(itm.read(LSR_OFFSET).unwrap(), 0x3);
        assert_eq!(
            itm.write(ITM_TER, 1),
            Err(SimulationError::Locked(ITM_TER))
        );
        assert_eq!(itm.read(ITM_TER).unwrap(), 0);

        itm.write(LAR_OFFSET, UNLOCK_TOKEN).unwrap();
        assert_eq!(itm.read(LSR_OFFSET).unwrap(), 0x1);
        itm.write(ITM_TER, 1).unwrap();
        assert_eq!(itm.read(ITM_TER).unwrap(), 1);
    }

    #[test]
    fn test_byte_payload_captured() {
        let mut itm = enabled_itm(0b10);
        itm.write_u8(0x4, b'h').unwrap();
        itm.write_u8(0x4, b'i').unwrap();
        assert_eq!(itm.stream(1), b"hi");
        assert_eq!(itm.dropped(), 0);
    }

    #[test]
    fn test_take_stream_drains_capture() {
        let mut itm = enabled_itm(0b01);
        itm.write_u8(0x0, b'o').unwrap();
        itm.write_u8(0x0, b'k').unwrap();
        assert_eq!(itm.take_stream(0), b"ok");
        assert!(itm.stream(0).is_empty());
        assert!(itm.take_stream(40).is_empty());
    }

    #[test]
    fn test_disabled_port_drops() {
        let mut itm = enabled_itm(0b01);
        itm.write_u8(0x8, b'x').unwrap();
        assert!(itm.stream(2).is_empty());
        assert_eq!(itm.dropped(), 1);
    }

    #[test]
    fn test_busy_polls_countdown() {
        let mut itm = enabled_itm(0b01);
        itm.set_busy_polls(2);
        assert_eq!(itm.read(0x0).unwrap(), 1);
        itm.write_u8(0x0, b'a').unwrap();
        assert_eq!(itm.read(0x0).unwrap(), 0);
        assert_eq!(itm.read(0x0).unwrap(), 0);
        assert_eq!(itm.read(0x0).unwrap(), 1);
        assert_eq!(itm.polls(), 4);
    }

    #[test]
    fn test_stalled_fifo_never_ready() {
        let mut itm = enabled_itm(0b01);
        itm.set_stalled(true);
        for _ in 0..100 {
            assert_eq!(itm.read(0x0).unwrap(), 0);
        }
        itm.write_u8(0x0, b'a').unwrap();
        assert!(itm.stream(0).is_empty());
        assert_eq!(itm.dropped(), 1);
    }
}
