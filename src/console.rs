//! 日志输出
//!
//! 日志经由 `Platform::console_write` 输出，级别由编译期环境变量 `LOG` 决定。

use core::fmt::{self, Write};

use log::{Level, Log, Metadata, Record, SetLoggerError};

use crate::config;
use crate::hal::try_platform;

struct Stdout;

impl Write for Stdout {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if let Some(platform) = try_platform() {
            platform.console_write(s);
        }
        Ok(())
    }
}

pub fn print(args: fmt::Arguments) {
    let _ = Stdout.write_fmt(args);
}

macro_rules! print {
    ($fmt: literal $(, $($arg: tt)+)?) => {
        $crate::console::print(format_args!($fmt $(, $($arg)+)?))
    }
}

/// 安装全局 logger
///
/// ## Errors
/// - 已经安装过 logger
pub fn init() -> Result<(), SetLoggerError> {
    static LOGGER: Logger = Logger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(config::log_level(option_env!("LOG")));
    Ok(())
}

struct Logger;

impl Log for Logger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        print!("\x1b[{}m", level_to_color_code(record.level()));
        match try_platform() {
            Some(platform) => print!(
                "[{:>5}][{}] {}",
                record.level(),
                platform.current_thread(),
                record.args()
            ),
            None => print!("[{:>5}][kernel] {}", record.level(), record.args()),
        }
        print!("\x1b[0m\n");
    }

    fn flush(&self) {}
}

fn level_to_color_code(level: Level) -> u8 {
    match level {
        Level::Error => 31, // Red
        Level::Warn => 93,  // BrightYellow
        Level::Info => 34,  // Blue
        Level::Debug => 32, // Green
        Level::Trace => 90, // BrightBlack
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn test_log_line_reaches_platform_console() {
        testutil::init();
        Logger.log(
            &Record::builder()
                .level(Level::Warn)
                .args(format_args!("semaphore {} created", "console-test"))
                .build(),
        );
        let out = testutil::console_output();
        assert!(out.contains("\x1b[93m[ WARN]["));
        assert!(out.contains("] semaphore console-test created\x1b[0m\n"));
    }

    #[test]
    fn test_second_init_fails() {
        let _ = init();
        assert!(init().is_err());
    }
}
