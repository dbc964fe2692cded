// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Relay impulse-response probe.
//!
//! Builds the ganglion → relay ⇄ cortical (centre, surround) circuit on the
//! configured grid, computes the relay impulse response for the requested
//! feedback weights and prints the centre excitation, the strongest surround
//! inhibition and any instability warning.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use lgn::config::{load_config, validate_config, ConfigError, LgnConfig};
use lgn::observability::{debug_flags_help, init_logging, parse_debug_flags, LogFormat};
use lgn::prelude::*;
use ndarray::s;
use serde_json::json;
use tracing::{info, warn};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: irf_probe [--surround-weight <w>] [--center-weight <w>] [--surround-amplitude <a>] \
         [--center-amplitude <a>] [--config <path>] \
         [--nt <exp>] [--nr <exp>] [--dt <step>] [--dr <step>] [--tolerance <t>] [--serial] [--json]\n\n\
         Defaults:\n\
         - surround-weight: -0.6\n\
         - center-weight: 0\n\
         - surround-amplitude: 2 (Gaussian width 0.9)\n\
         - center-amplitude: 1 (Gaussian width 0.1)\n\
         - config: lgn_configuration.toml (searched), built-in defaults if absent\n\n{}",
        debug_flags_help()
    );
    process::exit(2);
}

struct ProbeArgs {
    center: Branch,
    surround: Branch,
    config_path: Option<PathBuf>,
    overrides: HashMap<String, String>,
    json: bool,
}

/// Cortical feedback branch: `gauss(amplitude, width) × expDecay(1, 0)` scaled by `weight`
#[derive(Debug, Clone, Copy)]
struct Branch {
    amplitude: f64,
    width: f64,
    weight: f64,
}

impl Branch {
    fn kernel(&self) -> lgn::neural::Result<KernelPair> {
        gauss_decay(self.amplitude, self.width)
    }
}

fn parse_number(flag: &str, value: Option<String>) -> f64 {
    let value = value.unwrap_or_else(|| usage_and_exit());
    value.parse().unwrap_or_else(|_| {
        eprintln!("{flag}: not a number: {value}");
        usage_and_exit();
    })
}

fn parse_args(mut args: impl Iterator<Item = String>) -> ProbeArgs {
    let mut parsed = ProbeArgs {
        center: Branch {
            amplitude: 1.0,
            width: 0.1,
            weight: 0.0,
        },
        surround: Branch {
            amplitude: 2.0,
            width: 0.9,
            weight: -0.6,
        },
        config_path: None,
        overrides: HashMap::new(),
        json: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--surround-weight" | "--weight" => {
                parsed.surround.weight = parse_number(&arg, args.next());
            }
            "--center-weight" => parsed.center.weight = parse_number(&arg, args.next()),
            "--surround-amplitude" => parsed.surround.amplitude = parse_number(&arg, args.next()),
            "--center-amplitude" => parsed.center.amplitude = parse_number(&arg, args.next()),
            "--config" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.config_path = Some(PathBuf::from(v));
            }
            "--nt" | "--nr" | "--dt" | "--dr" | "--tolerance" => {
                let v = args.next().unwrap_or_else(|| usage_and_exit());
                parsed.overrides.insert(arg.trim_start_matches("--").to_string(), v);
            }
            "--serial" => {
                parsed.overrides.insert("parallel".to_string(), "false".to_string());
            }
            "--json" => parsed.json = true,
            "-h" | "--help" => usage_and_exit(),
            debug if debug.starts_with("--debug-") => {}
            other => {
                eprintln!("Unknown argument: {other}");
                usage_and_exit();
            }
        }
    }

    parsed
}

fn load_configuration(args: &ProbeArgs) -> Result<LgnConfig> {
    let config = match load_config(args.config_path.as_deref(), Some(&args.overrides)) {
        Ok(config) => config,
        Err(ConfigError::FileNotFound(_)) if args.config_path.is_none() => {
            let mut config = LgnConfig::default();
            lgn::config::apply_environment_overrides(&mut config);
            lgn::config::apply_cli_overrides(&mut config, &args.overrides);
            config
        }
        Err(e) => return Err(e).context("Failed to load configuration"),
    };
    validate_config(&config).context("Invalid configuration")?;
    Ok(config)
}

fn gauss_decay(amplitude: f64, width: f64) -> lgn::neural::Result<KernelPair> {
    Ok(KernelPair::new(
        SpatialKernel::gaussian(amplitude, width)?,
        TemporalKernel::exponential_decay(1.0, 0.0)?,
    ))
}

/// Canonical circuit; returns the relay handle.
fn build_circuit(network: &mut Network, center: Branch, surround: Branch) -> Result<NodeId> {
    let ganglion = network.create_ganglion_cell(KernelPair::new(
        SpatialKernel::difference_of_gaussians(1.0, 0.62, 0.85, 1.26)?,
        TemporalKernel::biphasic(42.5, 0.38, 0.0)?,
    ))?;
    let relay = network.create_relay_cell()?;
    let center_cell = network.create_cortical_cell()?;
    let surround_cell = network.create_cortical_cell()?;
    network.set_label(ganglion, "ganglion")?;
    network.set_label(relay, "relay")?;
    network.set_label(center_cell, "cortex-centre")?;
    network.set_label(surround_cell, "cortex-surround")?;

    network.connect(ganglion, relay, gauss_decay(1.0, 0.1)?, 1.0)?;
    network.connect(relay, center_cell, KernelPair::identity(), 1.0)?;
    network.connect(relay, surround_cell, KernelPair::identity(), 1.0)?;
    network.connect(center_cell, relay, center.kernel()?, center.weight)?;
    network.connect(surround_cell, relay, surround.kernel()?, surround.weight)?;
    Ok(relay)
}

fn main() -> Result<()> {
    let args = parse_args(env::args().skip(1));
    let config = load_configuration(&args)?;

    let flags = parse_debug_flags();
    let format: LogFormat = config.logging.format.parse()?;
    init_logging(&flags, format, &config.logging.level)?;

    let mut network = Network::from_config(&config)?;
    let relay = build_circuit(&mut network, args.center, args.surround)?;
    info!(
        center_weight = args.center.weight,
        surround_weight = args.surround.weight,
        surround_amplitude = args.surround.amplitude,
        "Computing relay impulse response"
    );
    let irf = network.compute_irf(relay)?;

    let grid = network
        .integrator()
        .context("network lost its integrator")?;
    let c = grid.center_index();
    let frame = irf.irf().slice(s![0, .., ..]);
    let center_excitation = frame[[c, c]];
    let surround_inhibition = frame.iter().copied().fold(f64::INFINITY, f64::min);
    let warning = irf.warning();
    if let Some(w) = &warning {
        warn!(warning = %w, "Relay response is numerically unstable");
    }

    if args.json {
        let report = json!({
            "center": {
                "amplitude": args.center.amplitude,
                "width": args.center.width,
                "weight": args.center.weight,
            },
            "surround": {
                "amplitude": args.surround.amplitude,
                "width": args.surround.width,
                "weight": args.surround.weight,
            },
            "grid": {
                "nt": grid.nt(),
                "nr": grid.nr(),
                "dt": grid.dt(),
                "dr": grid.dr(),
            },
            "center_excitation": center_excitation,
            "surround_inhibition": surround_inhibition,
            "center_time_course": irf.center_irf().to_vec(),
            "max_imaginary": irf.max_imaginary(),
            "warning": warning.map(|w| w.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "grid {}x{}x{} (dt={}, dr={})",
            grid.nt(),
            grid.nr(),
            grid.nr(),
            grid.dt(),
            grid.dr()
        );
        println!(
            "centre {:+.3} x gauss({}, {}), surround {:+.3} x gauss({}, {})",
            args.center.weight,
            args.center.amplitude,
            args.center.width,
            args.surround.weight,
            args.surround.amplitude,
            args.surround.width
        );
        println!("centre excitation   {center_excitation:+.6e}");
        println!("surround inhibition {surround_inhibition:+.6e}");
        match warning {
            Some(w) => println!("WARNING: {w}"),
            None => println!("solve stable"),
        }
    }

    Ok(())
}
