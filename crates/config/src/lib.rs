// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{Context, Result};
use labwired_swo::{baud_prescaler, PortMask, StimulusPort};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default schema version for YAML configs
fn default_schema_version() -> String {
    "1.0".to_string()
}

fn default_max_drift_ppm() -> u32 {
    // Typical probes tolerate roughly 3% on an async line.
    30_000
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("core clock must be non-zero")]
    ZeroCoreClock,
    #[error("SWO speed must be non-zero")]
    ZeroSwoSpeed,
    #[error("SWO speed {swo_hz} Hz exceeds core clock {core_clock_hz} Hz")]
    SwoFasterThanCore { swo_hz: u32, core_clock_hz: u32 },
    #[error("stimulus port {0} out of range (0..32)")]
    PortOutOfRange(u8),
    #[error(
        "SWO speed {requested_hz} Hz is not reachable from the core clock: \
         effective {effective_hz} Hz, drift {drift_ppm} ppm (max {max_drift_ppm})"
    )]
    BaudDrift {
        requested_hz: u32,
        effective_hz: u32,
        drift_ppm: u32,
        max_drift_ppm: u32,
    },
}

/// Simulated probe behaviour for the stimulus FIFO.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct FifoConfig {
    /// Status polls that read "full" before each byte is accepted.
    #[serde(default)]
    pub busy_polls: u32,
    /// The probe never drains; every status poll reads "full".
    #[serde(default)]
    pub stalled: bool,
    /// Upper bound on register reads, bring-up included, before the
    /// simulation gives up.
    #[serde(default)]
    pub poll_budget: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub core_clock_hz: u32,
    pub swo_hz: u32,
    /// Enabled stimulus ports by index. Merged with `port_mask`.
    #[serde(default)]
    pub ports: Vec<u8>,
    #[serde(default)]
    pub port_mask: Option<u32>,
    /// Also bring up the trace pins and the ETM path.
    #[serde(default)]
    pub etm: bool,
    #[serde(default = "default_max_drift_ppm")]
    pub max_drift_ppm: u32,
    #[serde(default)]
    pub fifo: FifoConfig,
}

impl TraceConfig {
    pub fn new(core_clock_hz: u32, swo_hz: u32, port_mask: u32) -> Self {
        Self {
            schema_version: default_schema_version(),
            core_clock_hz,
            swo_hz,
            ports: Vec::new(),
            port_mask: Some(port_mask),
            etm: false,
            max_drift_ppm: default_max_drift_ppm(),
            fifo: FifoConfig::default(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace config {:?}", path))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).context("Failed to parse Trace Config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.core_clock_hz == 0 {
            return Err(ConfigError::ZeroCoreClock);
        }
        if self.swo_hz == 0 {
            return Err(ConfigError::ZeroSwoSpeed);
        }
        if self.swo_hz > self.core_clock_hz {
            return Err(ConfigError::SwoFasterThanCore {
                swo_hz: self.swo_hz,
                core_clock_hz: self.core_clock_hz,
            });
        }
        self.port_mask()?;

        let drift_ppm = self.drift_ppm();
        if drift_ppm > self.max_drift_ppm {
            return Err(ConfigError::BaudDrift {
                requested_hz: self.swo_hz,
                effective_hz: self.effective_swo_hz(),
                drift_ppm,
                max_drift_ppm: self.max_drift_ppm,
            });
        }
        if drift_ppm > 0 {
            tracing::debug!(
                "SWO {} Hz requested, {} Hz effective ({} ppm)",
                self.swo_hz,
                self.effective_swo_hz(),
                drift_ppm
            );
        }
        Ok(())
    }

    pub fn port_mask(&self) -> Result<PortMask, ConfigError> {
        let mut mask = PortMask::from_bits(self.port_mask.unwrap_or(0));
        for &index in &self.ports {
            let port = StimulusPort::new(index).ok_or(ConfigError::PortOutOfRange(index))?;
            mask = mask.with(port);
        }
        Ok(mask)
    }

    pub fn prescaler(&self) -> u32 {
        baud_prescaler(self.core_clock_hz, self.swo_hz)
    }

    /// Baud rate the TPIU actually produces for this prescaler.
    pub fn effective_swo_hz(&self) -> u32 {
        self.core_clock_hz / (self.prescaler() + 1)
    }

    /// Distance between requested and effective SWO speed, parts per million.
    pub fn drift_ppm(&self) -> u32 {
        if self.swo_hz == 0 {
            return 0;
        }
        let requested = u64::from(self.swo_hz);
        let effective = u64::from(self.effective_swo_hz());
        (requested.abs_diff(effective) * 1_000_000 / requested) as u32
    }
}
