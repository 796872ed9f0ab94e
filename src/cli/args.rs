//! CLI argument parsing with clap.

use clap::Parser;
use std::path::PathBuf;

/// Capture a single frame from the SuperPico camera over serial
#[derive(Parser, Debug)]
#[command(name = "capture-frame")]
#[command(version, about = "Capture one frame from SuperPico Digital", long_about = None)]
#[command(after_help = "EXAMPLES:
    capture-frame                       # auto-detect board, write frame.png
    capture-frame shot.bmp              # write a BMP instead
    capture-frame -p /dev/ttyACM0 --no-show")]
pub struct CaptureArgs {
    /// Output image path (format follows the extension)
    pub output: Option<PathBuf>,

    /// Serial port (default: auto-detect)
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Seconds to wait for the FRAME_START header
    #[arg(long, value_name = "SECS")]
    pub header_timeout: Option<u64>,

    /// Seconds allowed for the image payload
    #[arg(long, value_name = "SECS")]
    pub payload_timeout: Option<u64>,

    /// Do not open the saved image in a viewer
    #[arg(long)]
    pub no_show: bool,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Serial console for the SuperPico with auto-reconnect
#[derive(Parser, Debug)]
#[command(name = "monitor-serial")]
#[command(version, about = "Monitor SuperPico serial output", long_about = None)]
#[command(after_help = "EXAMPLES:
    monitor-serial                      # auto-detect board
    monitor-serial /dev/ttyACM0 -b 9600
    monitor-serial --list-ports")]
pub struct MonitorArgs {
    /// Serial port (default: auto-detect)
    pub port: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    pub baud: Option<u32>,

    /// Leave DTR/RTS alone (the board may reset on connect)
    #[arg(long)]
    pub allow_reset: bool,

    /// List available serial ports and exit
    #[arg(short, long)]
    pub list_ports: bool,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
