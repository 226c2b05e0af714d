// src/main.rs

//! Opens one puzzle window on the X display and plays the built-in test
//! card in it.

use log::{error, info};

use puzzle_frontend::color::Rgb16;
use puzzle_frontend::platform::backends::x11::XDriver;
use puzzle_frontend::testcard::TestCard;
use puzzle_frontend::{Config, Frontend, FrontendError};

fn run() -> Result<(), FrontendError> {
    let config = Config::default();
    let driver = XDriver::new(Rgb16::from_rgb8(config.window.background))?;
    let mut frontend = Frontend::new(driver, TestCard::default(), config)?;
    frontend.run()
}

fn main() {
    // Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    info!("Starting puzzle front end...");
    if let Err(e) = run() {
        error!("{:?}", e);
        eprintln!("fatal error: {}", e);
        std::process::exit(1);
    }
    info!("Puzzle front end exited successfully.");
}
