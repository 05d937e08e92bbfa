// src/utils/logger.rs

use std::io::Write;

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

static LOGGER: ConsoleLogger = ConsoleLogger;

/// Diagnostics go to stderr so stdout stays clean for results.
struct ConsoleLogger;

pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
  log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

fn prefix(level: Level) -> &'static str {
  match level {
    Level::Error => "🔴", // Red Circle
    Level::Warn => "🟠",  // Orange Circle
    Level::Info => "🔵",  // Blue Circle
    Level::Debug => "⚪", // White/Gray Circle
    Level::Trace => "▫️", // Small dot
  }
}

/// "🔵  message", as written to the console
pub fn format_line(record: &Record) -> String {
  format!("{}  {}", prefix(record.level()), record.args())
}

impl log::Log for ConsoleLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= log::max_level()
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      let line = format_line(record);
      let mut err = std::io::stderr().lock();
      let _ = writeln!(err, "{}", line);
    }
  }

  fn flush(&self) {
    let _ = std::io::stderr().flush();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_line() {
    let line = format_line(
      &Record::builder()
        .args(format_args!("File not found"))
        .level(Level::Error)
        .build(),
    );
    assert_eq!(line, "🔴  File not found");
  }
}
