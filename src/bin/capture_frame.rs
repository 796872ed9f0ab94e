use clap::Parser;

use superpico_tools::cli::{run_capture, CaptureArgs};
use superpico_tools::config::Config;
use superpico_tools::logging;

fn main() {
    let args = CaptureArgs::parse();
    logging::init(args.verbose);

    let config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_capture(&args, &config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
