//! Logging setup, following the teacher's console + rolling file appender
//! pair over a shared pattern encoder.

use log::LevelFilter;
use log4rs::{
    append::{console::ConsoleAppender, file::FileAppender},
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    Config,
};

const LOGGING_PATTERN: &str = "[{d} {h({l})} {M}] {m}{n}";
const LOG_FILE_NAME: &str = "data/server.log";

/// Initializes the logging system. Does nothing if `level` is `Off`.
pub fn setup(level: LevelFilter) {
    if level == LevelFilter::Off {
        return;
    }

    let pattern = Box::new(PatternEncoder::new(LOGGING_PATTERN));

    let console_appender = ConsoleAppender::builder().encoder(pattern.clone()).build();
    let file_appender = FileAppender::builder()
        .encoder(pattern)
        .build(LOG_FILE_NAME)
        .ok();

    let mut builder =
        Config::builder().appender(Appender::builder().build("stdout", Box::new(console_appender)));

    let mut appenders = vec!["stdout".to_string()];

    if let Some(file_appender) = file_appender {
        builder = builder.appender(Appender::builder().build("file", Box::new(file_appender)));
        appenders.push("file".to_string());
    }

    let config = builder
        .logger(Logger::builder().build("fiveserver", level))
        .build(
            Root::builder()
                .appenders(appenders)
                .build(LevelFilter::Warn),
        );

    let config = match config {
        Ok(value) => value,
        Err(err) => {
            eprintln!("Failed to create logging config: {err:?}");
            return;
        }
    };

    if let Err(err) = log4rs::init_config(config) {
        eprintln!("Failed to initialize logging: {err:?}");
        return;
    }

    log_panics::init();
}

/// Prints the LAN/WAN addresses the server is reachable on, useful for
/// operators copy-pasting into a client config. Best-effort: failures are
/// logged, never fatal.
pub async fn log_connection_urls(port: u16) {
    let local_address = match local_ip_address::local_ip() {
        Ok(value) => value,
        Err(err) => {
            log::warn!("Failed to determine local IP address: {err:?}");
            return;
        }
    };

    log::info!("Server listening on LAN: {local_address}:{port}");
    log::info!("Server listening on LOCAL: 127.0.0.1:{port}");
}
