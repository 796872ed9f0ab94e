//! Entry points for the `capture-frame` and `monitor-serial` binaries.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use super::args::{CaptureArgs, MonitorArgs};
use crate::config::{Config, CAPTURE_READ_TIMEOUT, MONITOR_READ_TIMEOUT};
use crate::frame::{capture_to_file, show_image, CaptureError, CaptureSettings};
use crate::monitor::{ctrlc_flag, setup_ctrlc_handler, Monitor, MonitorError, MonitorStats};
use crate::ports::{self, PortMatcher};
use crate::transport::{SerialConnector, SerialSettings, SerialTransport};

/// Explicit port if one was given, otherwise the first port `matcher` accepts.
pub fn resolve_port<M: PortMatcher + ?Sized>(
    explicit: Option<&str>,
    matcher: &M,
) -> Result<Option<String>, serialport::Error> {
    match explicit {
        Some(port) => Ok(Some(port.to_string())),
        None => ports::detect_port(matcher),
    }
}

/// Merge command-line overrides into the configured capture settings.
pub fn capture_settings(args: &CaptureArgs, config: &Config) -> CaptureSettings {
    let mut settings = config.capture.capture_settings();
    if let Some(secs) = args.header_timeout {
        settings.header_timeout = Duration::from_secs(secs);
    }
    if let Some(secs) = args.payload_timeout {
        settings.payload_timeout = Duration::from_secs(secs);
    }
    settings
}

/// Capture one frame and save it. Returns the output path.
pub fn run_capture(args: &CaptureArgs, config: &Config) -> Result<PathBuf, CaptureError> {
    let cfg = &config.capture;
    let explicit = args.port.as_deref().or(cfg.port.as_deref());
    let port = resolve_port(explicit, &cfg.matcher())?.ok_or(CaptureError::NoDevice)?;
    let baud_rate = args.baud.unwrap_or(cfg.baud_rate);
    let output = args.output.clone().unwrap_or_else(|| cfg.output.clone());

    println!("Connecting to {}...", port);
    let transport = SerialTransport::open(&SerialSettings::new(
        port,
        baud_rate,
        CAPTURE_READ_TIMEOUT,
    ))?;

    let frame = capture_to_file(transport, capture_settings(args, config), &output)?;
    println!("Saved {} frame to {}", frame.header(), output.display());

    if cfg.show && !args.no_show {
        show_image(&output);
    }
    Ok(output)
}

/// Serial settings for the monitor after applying overrides.
pub fn monitor_serial_settings(
    port: String,
    args: &MonitorArgs,
    config: &Config,
) -> SerialSettings {
    let cfg = &config.monitor;
    SerialSettings::new(port, args.baud.unwrap_or(cfg.baud_rate), MONITOR_READ_TIMEOUT)
        .with_suppress_reset(cfg.suppress_reset && !args.allow_reset)
}

/// Print every enumerated port with its description.
pub fn list_ports() -> Result<(), serialport::Error> {
    let ports = ports::list_ports()?;
    println!("Available ports:");
    ports::print_ports(&ports);
    Ok(())
}

/// Relay serial output to stdout until Ctrl+C.
///
/// Returns `Ok(None)` when no port was found; the available ports are listed
/// instead.
pub fn run_monitor(
    args: &MonitorArgs,
    config: &Config,
) -> Result<Option<MonitorStats>, MonitorError> {
    if args.list_ports {
        list_ports()?;
        return Ok(None);
    }

    let cfg = &config.monitor;
    let explicit = args.port.as_deref().or(cfg.port.as_deref());
    let port = match resolve_port(explicit, &cfg.matcher())? {
        Some(port) => port,
        None => {
            let ports = ports::list_ports()?;
            println!("No Pico found. Available ports:");
            ports::print_ports(&ports);
            return Ok(None);
        }
    };

    if let Err(e) = setup_ctrlc_handler() {
        log::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    println!("Connecting to {}...", port);
    let serial = monitor_serial_settings(port, args, config);
    let mut monitor = Monitor::new(SerialConnector, serial, cfg.monitor_settings());

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stats = monitor.run(&mut out, ctrlc_flag())?;

    eprintln!("\nStopped.");
    log::debug!(
        "Relayed {} bytes, {} reconnect(s), {} error(s)",
        stats.bytes_relayed,
        stats.reconnects,
        stats.errors
    );
    Ok(Some(stats))
}
