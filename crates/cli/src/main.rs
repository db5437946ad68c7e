// LabWired - Firmware Simulation Platform
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::Context;
use clap::{Parser, Subcommand};
use labwired_swo::{baud_prescaler, PortMask, StimulusPort};
use labwired_swo_config::{ConfigError, TraceConfig};
use labwired_swo_sim::SimulatedChip;
use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{error, info};

const EXIT_PASS: u8 = 0;
const EXIT_CONFIG_ERROR: u8 = 2;
const EXIT_RUNTIME_ERROR: u8 = 3;

const REPORT_SCHEMA_VERSION: &str = "1.0";

fn parse_u32(s: &str) -> Result<u32, String> {
    let trimmed = s.trim().replace('_', "");
    if let Some(hex) = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value '{}': {}", s, e))
    } else {
        u32::from_str(&trimmed).map_err(|e| format!("Invalid value '{}': {}", s, e))
    }
}

fn parse_port(s: &str) -> Result<StimulusPort, String> {
    let index = u8::from_str(s.trim()).map_err(|e| format!("Invalid port '{}': {}", s, e))?;
    StimulusPort::new(index).ok_or_else(|| format!("Stimulus port {} out of range (0..32)", index))
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "SWO/ITM trace bring-up on a simulated Kinetis K21",
    long_about = None
)]
struct Cli {
    /// Log every bring-up step and register access
    #[arg(short, long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Bring up the trace blocks from a config and write a message over SWO.
    Run(RunArgs),

    /// Print the TPIU prescaler for a core clock / SWO speed pair.
    Prescaler(PrescalerArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the trace config (YAML)
    #[arg(short, long)]
    config: PathBuf,

    /// Stimulus port to write the message to
    #[arg(short, long, value_parser = parse_port, default_value = "0")]
    port: StimulusPort,

    /// Message written with swo_puts
    #[arg(short, long, default_value = "You must construct additional pylons.")]
    message: String,

    /// Override the config's port mask
    #[arg(long, value_parser = parse_u32)]
    port_mask: Option<u32>,

    /// Print a JSON report instead of text
    #[arg(long)]
    json: bool,

    /// Write a chip snapshot (JSON) after the run
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct PrescalerArgs {
    /// Core clock in Hz (decimal or 0x-hex)
    #[arg(long, value_parser = parse_u32)]
    core_clock: u32,

    /// Target SWO speed in Hz
    #[arg(long, value_parser = parse_u32)]
    swo: u32,
}

#[derive(Debug, Serialize)]
struct PortReport {
    port: u8,
    bytes: usize,
    text: String,
}

#[derive(Debug, Serialize)]
struct RunReport {
    schema_version: &'static str,
    status: &'static str,
    prescaler: u32,
    effective_swo_hz: u32,
    drift_ppm: u32,
    port_mask: u32,
    written: usize,
    register_writes: usize,
    ports: Vec<PortReport>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.trace {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::Prescaler(args) => prescaler(args),
    }
}

fn load_config(path: &Path, port_mask: Option<u32>) -> anyhow::Result<TraceConfig> {
    let mut config = TraceConfig::from_file(path)?;
    if let Some(mask) = port_mask {
        config.ports.clear();
        config.port_mask = Some(mask);
    }
    config
        .validate()
        .with_context(|| format!("Invalid trace config {:?}", path))?;
    Ok(config)
}

fn run(args: RunArgs) -> ExitCode {
    let config = match load_config(&args.config, args.port_mask) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };
    if config.fifo.stalled && config.fifo.poll_budget.is_none() {
        error!("fifo.stalled needs fifo.poll_budget, the writer would spin forever");
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }

    let chip = SimulatedChip::from_config(&config);

    // The poll budget covers every register read, bring-up included.
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let swo = chip.bring_up(&config)?;
        info!("Writing {} bytes to port {}", args.message.len(), args.port.index());
        swo.puts(args.port, args.message.as_bytes());
        Ok::<(), ConfigError>(())
    }));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("{}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
        Err(_) => {
            error!(
                "Poll budget exhausted after {} register reads (port {})",
                chip.reads(),
                args.port.index()
            );
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    let mask = config.port_mask().unwrap_or(PortMask::NONE);
    let ports: Vec<PortReport> = mask
        .ports()
        .map(|port| {
            let bytes = chip.stream(port);
            PortReport {
                port: port.index(),
                bytes: bytes.len(),
                text: String::from_utf8_lossy(&bytes).into_owned(),
            }
        })
        .collect();

    let report = RunReport {
        schema_version: REPORT_SCHEMA_VERSION,
        status: "finished",
        prescaler: config.prescaler(),
        effective_swo_hz: config.effective_swo_hz(),
        drift_ppm: config.drift_ppm(),
        port_mask: mask.bits(),
        written: ports.iter().map(|p| p.bytes).sum(),
        register_writes: chip.writes().len(),
        ports,
    };

    if args.json {
        match serde_json::to_string(&report) {
            Ok(line) => println!("{}", line),
            Err(e) => {
                error!("Failed to encode report: {}", e);
                return ExitCode::from(EXIT_RUNTIME_ERROR);
            }
        }
    } else {
        println!(
            "prescaler {} -> {} Hz ({} ppm)",
            report.prescaler, report.effective_swo_hz, report.drift_ppm
        );
        for p in &report.ports {
            println!("port {:>2}: {:?}", p.port, p.text);
        }
    }

    if let Some(path) = &args.snapshot {
        if let Err(e) = write_snapshot(path, &chip) {
            error!("{:#}", e);
            return ExitCode::from(EXIT_RUNTIME_ERROR);
        }
    }

    ExitCode::from(EXIT_PASS)
}

fn write_snapshot(path: &Path, chip: &SimulatedChip) -> anyhow::Result<()> {
    let f = std::fs::File::create(path)
        .with_context(|| format!("Failed to create snapshot {:?}", path))?;
    serde_json::to_writer_pretty(f, &chip.snapshot())
        .with_context(|| format!("Failed to write snapshot {:?}", path))?;
    info!("Snapshot written to {:?}", path);
    Ok(())
}

fn prescaler(args: PrescalerArgs) -> ExitCode {
    let config = TraceConfig::new(args.core_clock, args.swo, 0);
    if let Err(e) = config.validate() {
        error!("{}", e);
        return ExitCode::from(EXIT_CONFIG_ERROR);
    }
    println!(
        "prescaler {} -> {} Hz ({} ppm)",
        baud_prescaler(args.core_clock, args.swo),
        config.effective_swo_hz(),
        config.drift_ppm()
    );
    ExitCode::from(EXIT_PASS)
}
