// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use labwired_swo_config::{ConfigError, TraceConfig};

#[test]
fn test_minimal_yaml_parses() {
    let yaml = r#"
core_clock_hz: 21004050
swo_hz: 3000000
ports: [0]
"#;
    let config = TraceConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.schema_version, "1.0");
    assert_eq!(config.port_mask().unwrap().bits(), 0x1);
    assert!(!config.etm);
    assert_eq!(config.fifo.busy_polls, 0);
    assert!(!config.fifo.stalled);
    assert_eq!(config.fifo.poll_budget, None);
}

#[test]
fn test_ports_merge_with_mask() {
    let yaml = r#"
core_clock_hz: 72000000
swo_hz: 2000000
port_mask: 0x80000000
ports: [1, 3]
etm: true
fifo:
  busy_polls: 2
  poll_budget: 1000
"#;
    let config = TraceConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.port_mask().unwrap().bits(), 0x8000_000A);
    assert_eq!(config.prescaler(), 35);
    assert!(config.etm);
    assert_eq!(config.fifo.busy_polls, 2);
    assert_eq!(config.fifo.poll_budget, Some(1000));
}

#[test]
fn test_port_out_of_range() {
    let mut config = TraceConfig::new(21_004_050, 3_000_000, 0);
    config.ports = vec![0, 32];
    assert_eq!(config.validate(), Err(ConfigError::PortOutOfRange(32)));

    let yaml = r#"
core_clock_hz: 21004050
swo_hz: 3000000
ports: [40]
"#;
    let err = TraceConfig::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("out of range"), "{}", err);
}

#[test]
fn test_swo_faster_than_core() {
    let config = TraceConfig::new(8_000_000, 16_000_000, 1);
    assert_eq!(
        config.validate(),
        Err(ConfigError::SwoFasterThanCore {
            swo_hz: 16_000_000,
            core_clock_hz: 8_000_000,
        })
    );
}

#[test]
fn test_zero_speeds() {
    assert_eq!(
        TraceConfig::new(0, 1, 1).validate(),
        Err(ConfigError::ZeroCoreClock)
    );
    assert_eq!(
        TraceConfig::new(1, 0, 1).validate(),
        Err(ConfigError::ZeroSwoSpeed)
    );
}

#[test]
fn test_relaxed_drift_tolerance() {
    let yaml = r#"
core_clock_hz: 16000000
swo_hz: 6000000
max_drift_ppm: 400000
ports: [0]
"#;
    let config = TraceConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.effective_swo_hz(), 8_000_000);
}
