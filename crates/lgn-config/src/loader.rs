// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later tiers win:
//! 1. TOML file (base defaults)
//! 2. Environment variables (runtime overrides)
//! 3. CLI arguments (explicit user overrides)

use crate::{ConfigError, ConfigResult, LgnConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "lgn_configuration.toml";

/// Find the LGN configuration file
///
/// Search order:
/// 1. `LGN_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("LGN_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by LGN_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        let mut current = cwd.as_path();
        for _ in 0..5 {
            match current.parent() {
                Some(parent) => {
                    search_paths.push(parent.join(CONFIG_FILE_NAME));
                    current = parent;
                }
                None => break,
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{CONFIG_FILE_NAME}' not found in any of these locations:\n{search_list}\n\nSet LGN_CONFIG_PATH to specify a custom location."
    )))
}

/// Load configuration from a TOML file
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the file is not found or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<LgnConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: LgnConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `LGN_INTEGRATOR_NT` -> `integrator.nt`
/// - `LGN_INTEGRATOR_NR` -> `integrator.nr`
/// - `LGN_INTEGRATOR_DT` -> `integrator.dt`
/// - `LGN_INTEGRATOR_DR` -> `integrator.dr`
/// - `LGN_SOLVER_TOLERANCE` -> `solver.singularity_tolerance`
/// - `LGN_SOLVER_PARALLEL` -> `solver.parallel`
/// - `LGN_LOG_LEVEL` -> `logging.level`
///
/// Values that fail to parse are ignored.
pub fn apply_environment_overrides(config: &mut LgnConfig) {
    let lookup = |key: &str| env::var(key).ok();
    apply_overrides(
        config,
        lookup,
        [
            ("LGN_INTEGRATOR_NT", Field::Nt),
            ("LGN_INTEGRATOR_NR", Field::Nr),
            ("LGN_INTEGRATOR_DT", Field::Dt),
            ("LGN_INTEGRATOR_DR", Field::Dr),
            ("LGN_SOLVER_TOLERANCE", Field::Tolerance),
            ("LGN_SOLVER_PARALLEL", Field::Parallel),
            ("LGN_LOG_LEVEL", Field::LogLevel),
        ],
    );
}

/// Apply CLI argument overrides to configuration
///
/// Recognised keys: `nt`, `nr`, `dt`, `dr`, `tolerance`, `parallel`,
/// `log_level`, `log_format`.
pub fn apply_cli_overrides(config: &mut LgnConfig, cli_args: &HashMap<String, String>) {
    let lookup = |key: &str| cli_args.get(key).cloned();
    apply_overrides(
        config,
        lookup,
        [
            ("nt", Field::Nt),
            ("nr", Field::Nr),
            ("dt", Field::Dt),
            ("dr", Field::Dr),
            ("tolerance", Field::Tolerance),
            ("parallel", Field::Parallel),
            ("log_level", Field::LogLevel),
            ("log_format", Field::LogFormat),
        ],
    );
}

#[derive(Clone, Copy)]
enum Field {
    Nt,
    Nr,
    Dt,
    Dr,
    Tolerance,
    Parallel,
    LogLevel,
    LogFormat,
}

fn apply_overrides<F, const N: usize>(config: &mut LgnConfig, lookup: F, keys: [(&str, Field); N])
where
    F: Fn(&str) -> Option<String>,
{
    for (key, field) in keys {
        if let Some(value) = lookup(key) {
            set_field(config, field, &value);
        }
    }
}

fn set_field(config: &mut LgnConfig, field: Field, value: &str) {
    match field {
        Field::Nt => {
            if let Ok(v) = value.parse() {
                config.integrator.nt = v;
            }
        }
        Field::Nr => {
            if let Ok(v) = value.parse() {
                config.integrator.nr = v;
            }
        }
        Field::Dt => {
            if let Ok(v) = value.parse() {
                config.integrator.dt = v;
            }
        }
        Field::Dr => {
            if let Ok(v) = value.parse() {
                config.integrator.dr = v;
            }
        }
        Field::Tolerance => {
            if let Ok(v) = value.parse() {
                config.solver.singularity_tolerance = v;
            }
        }
        Field::Parallel => {
            if let Some(v) = parse_bool(value) {
                config.solver.parallel = v;
            }
        }
        Field::LogLevel => config.logging.level = value.to_string(),
        Field::LogFormat => config.logging.format = value.to_string(),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
