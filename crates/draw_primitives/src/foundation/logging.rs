//! Logging utilities and structured logging support

pub use log::{debug, info, warn, error, trace};

/// Initialize the logging system
pub fn init() {
    env_logger::init();
}

/// Initialize logging, ignoring the error if a logger is already installed
///
/// Safe to call from every test.
pub fn try_init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
