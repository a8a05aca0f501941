use chrono::Local;
use colored::*;
use env_logger::{Builder, Env};
use std::io::Write;

/// Installs the process-wide logger, `info` by default, `debug` with `verbose`.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };

    // Initialize the logger with a custom format and colors
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            let timestamp = buf.timestamp().to_string();
            let level = match record.level() {
                log::Level::Error => record.level().to_string().red(),
                log::Level::Warn => record.level().to_string().yellow(),
                log::Level::Info => record.level().to_string().green(),
                log::Level::Debug => record.level().to_string().blue(),
                log::Level::Trace => record.level().to_string().white(),
            };
            writeln!(buf, "[{}] [{}] {}", timestamp, level, record.args())
        })
        .init();
}

/// Formats a status line the way the host displays it.
pub fn format_status_line(message: &str) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    format!("[{}] {}", timestamp, message)
}

pub fn log_message(message: &str) {
    println!("{}", format_status_line(message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_has_timestamp_prefix() {
        let line = format_status_line("Client connected");
        assert!(line.starts_with('['));
        assert!(line.ends_with("] Client connected"));
        // "[YYYY-MM-DD HH:MM:SS] "
        assert_eq!(line.find(']'), Some(20));
    }
}
