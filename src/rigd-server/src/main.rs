// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tracing::{debug, error, info, warn};

use rigd_app::{
    init_logging, init_logging_filter, level_from_debug, parse_number, ConfigError, ConfigFile,
};
use rigd_backend::{TransportRegistry, DUMMY_MODEL_ID};
use rigd_core::rig::OpenParams;
use rigd_core::{
    DynResult, FieldControl, RigError, RigField, RigResult, RigState, SignalMeter, TransportError,
};
use rigd_server::config::{MeterConfig, ServerConfig};
use rigd_server::{DaemonConfig, RigHandle};

const PKG_DESCRIPTION: &str = concat!(env!("CARGO_PKG_NAME"), " - rig control daemon");

#[derive(Debug, Parser)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = PKG_DESCRIPTION,
    disable_version_flag = true,
)]
struct Cli {
    /// Show version and exit
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    #[allow(dead_code)]
    version: Option<bool>,
    /// Rig model id or backend name (default: dummy)
    #[arg(short = 'm', long = "model")]
    model: Option<String>,
    /// Rig device path (e.g. /dev/ttyUSB0)
    #[arg(short = 'r', long = "rig-file", value_name = "DEVICE")]
    rig_file: Option<String>,
    /// Serial speed
    #[arg(short = 's', long = "speed", value_name = "BAUD")]
    speed: Option<u32>,
    /// CI-V address, decimal or 0x hex
    #[arg(short = 'c', long = "civaddr", value_parser = parse_civaddr)]
    civaddr: Option<u8>,
    /// Debug level 0..5 (none, bug, err, warn, verbose, trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL")]
    debug: Option<u8>,
    /// List supported rig models and exit
    #[arg(short = 'l', long = "list")]
    list: bool,
    /// Path to configuration file
    #[arg(long = "config", short = 'C', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print example configuration and exit
    #[arg(long = "print-config")]
    print_config: bool,
    /// Print one state snapshot as JSON and exit
    #[arg(long = "once")]
    once: bool,
}

fn parse_civaddr(text: &str) -> Result<u8, String> {
    parse_number(text)
        .and_then(|n| u8::try_from(n).ok())
        .ok_or_else(|| format!("invalid CI-V address '{}'", text))
}

fn print_backends(registry: &TransportRegistry) {
    println!(
        "{:>6}  {:<16}{:<24}{:<10}Status",
        "ID", "Manufacturer", "Model", "Ver."
    );
    for entry in registry.entries() {
        let info = &entry.info;
        println!(
            "{:>6}  {:<16}{:<24}{:<10}{}",
            info.model_id, info.manufacturer, info.model, info.version, info.status
        );
    }
}

fn resolve_open_params(
    cli: &Cli,
    cfg: &ServerConfig,
    registry: &TransportRegistry,
) -> RigResult<OpenParams> {
    let model = cli.model.as_deref().or(cfg.rig.model.as_deref());
    let model_id = match model {
        None => DUMMY_MODEL_ID,
        Some(model) => registry.resolve(model).ok_or_else(|| {
            RigError::fatal_startup(model, TransportError::UnknownModel(model.to_string()))
        })?,
    };
    Ok(OpenParams {
        model_id,
        port: cli.rig_file.clone().or_else(|| cfg.rig.port.clone()),
        speed: cli.speed.or(cfg.rig.speed),
        civ_address: cli.civaddr.or(cfg.rig.civaddr),
    })
}

fn render(controls: &mut [FieldControl], state: &RigState) {
    for control in controls.iter_mut() {
        let field = control.field();
        if let Some(value) = control.refresh(state) {
            info!("{}: {}", field, value);
        }
    }
}

/// Display and meter consumers, driven from the cache until Ctrl+C.
async fn run_consumers(handle: &RigHandle, meter_cfg: &MeterConfig) -> DynResult<()> {
    let mut reader = handle.reader();
    let mut controls = [
        FieldControl::new(RigField::Frequency),
        FieldControl::new(RigField::Mode),
    ];
    let mut meter = SignalMeter::new(
        meter_cfg.curve,
        meter_cfg.falloff_deg_per_s,
        meter_cfg.tval_ms,
    );
    let meter_active = SignalMeter::is_active(&reader.read());
    if !meter_active {
        info!("Rig has no signal strength readback, meter disabled");
    }
    let mut meter_tick = tokio::time::interval(Duration::from_millis(meter_cfg.tval_ms.into()));

    render(&mut controls, &reader.read());

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            res = &mut ctrl_c => {
                res?;
                info!("Ctrl+C received, shutting down");
                break;
            }
            changed = reader.changed() => {
                if !changed {
                    warn!("Daemon went away");
                    break;
                }
                render(&mut controls, &reader.read());
            }
            _ = meter_tick.tick(), if meter_active => {
                if let Some(angle) = meter.tick(&reader.read()) {
                    debug!("Meter needle at {:.1} deg", angle);
                }
            }
        }
    }
    Ok(())
}

fn main() -> DynResult<()> {
    let cli = Cli::parse();

    if cli.print_config {
        println!("{}", ServerConfig::example_toml());
        return Ok(());
    }

    let registry = TransportRegistry::with_builtin_backends();
    if cli.list {
        print_backends(&registry);
        return Ok(());
    }

    let (cfg, config_path) = ServerConfig::load(cli.config.as_deref())?;
    cfg.validate().map_err(ConfigError::Invalid)?;

    match cli.debug {
        Some(level) => init_logging_filter(level_from_debug(level)),
        None => init_logging(cfg.general.log_level.as_deref()),
    }
    if let Some(ref path) = config_path {
        info!("Loaded configuration from {}", path.display());
    }

    let started = resolve_open_params(&cli, &cfg, &registry).and_then(|open| {
        info!("Starting rigd ({})", open);
        RigHandle::start(DaemonConfig {
            registry: Arc::new(registry),
            open,
            polling: Box::new(cfg.polling.policy()),
            call_timeout: cfg.polling.call_timeout(),
            prebuilt_transport: None,
        })
    });
    let mut handle = match started {
        Ok(handle) => handle,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if cli.once {
        let state = handle.read_state();
        handle.stop();
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = rt.block_on(run_consumers(&handle, &cfg.meter));
    handle.stop();
    result
}
