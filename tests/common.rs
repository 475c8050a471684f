//! Test utilities & fixtures.
//! Each test gets its own temp data directory so snapshots never collide.

use tempfile::TempDir;
use wardbot::bot::CommandHandler;
use wardbot::config::Config;

/// Default config pointed at a fresh temp data directory. Keep the TempDir
/// alive for as long as the handler is in use.
pub fn temp_config() -> (TempDir, Config) {
    let dir = TempDir::new().expect("tempdir");
    let mut config = Config::default();
    config.storage.data_dir = dir.path().to_string_lossy().into_owned();
    (dir, config)
}

#[allow(dead_code)] // Not every integration file goes through the handler.
pub fn handler(config: &Config) -> CommandHandler {
    CommandHandler::open(config).expect("handler")
}
