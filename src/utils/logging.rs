//! Logging setup: colored, timestamped lines on stderr so JSON results on
//! stdout stay machine-readable.

use std::io::Write;

use chrono::Local;
use env_logger::{Builder, Env, Target};
use log::{debug, Level};
#[cfg(test)]
use log::LevelFilter;

/// Overrides the configured level, e.g. `ENSEMBLE_LOG=ensemble_combiner::engine=debug`.
const FILTER_ENV: &str = "ENSEMBLE_LOG";
const STYLE_ENV: &str = "ENSEMBLE_LOG_STYLE";
const RESET: &str = "\x1b[0m";

fn level_color(level: Level) -> &'static str {
    match level {
        | Level::Error => "\x1b[31m",
        | Level::Warn => "\x1b[33m",
        | Level::Info => "\x1b[32m",
        | Level::Debug => "\x1b[36m",
        | Level::Trace => "\x1b[35m",
    }
}

/// One log line without the trailing newline.
fn render_line(stamp: &str, level: Level, target: &str, message: &std::fmt::Arguments<'_>) -> String {
    format!("{} {}{:5}{} [{}] {}", stamp, level_color(level), level, RESET, target, message)
}

/// Install the global logger at `level` unless `ENSEMBLE_LOG` says otherwise.
/// Later calls are no-ops.
pub fn init_logging(level: &str) {
    let env = Env::default().filter_or(FILTER_ENV, level).write_style_or(STYLE_ENV, "auto");

    let installed = Builder::from_env(env)
        .format(|buf, record| {
            let stamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            writeln!(buf, "{}", render_line(&stamp, record.level(), record.target(), record.args()))
        })
        .target(Target::Stderr)
        .try_init()
        .is_ok();

    if installed {
        debug!("logger installed, default level {}", level);
    }
}

/// Debug-level logger captured by the test harness.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).filter_level(LevelFilter::Debug).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_carries_stamp_level_and_target() {
        let line = render_line(
            "2024-01-01 00:00:00",
            Level::Warn,
            "ensemble_combiner::engine",
            &format_args!("dropping method {}", "iqr"),
        );
        assert_eq!(
            line,
            "2024-01-01 00:00:00 \x1b[33mWARN \x1b[0m [ensemble_combiner::engine] dropping method iqr"
        );
    }

    #[test]
    fn each_level_has_its_own_color() {
        let levels = [Level::Error, Level::Warn, Level::Info, Level::Debug, Level::Trace];
        let colors: std::collections::BTreeSet<_> = levels.iter().map(|l| level_color(*l)).collect();
        assert_eq!(colors.len(), levels.len());
    }

    #[test]
    fn repeated_init_is_harmless() {
        init_test_logging();
        init_logging("debug");
        init_logging("off");
        log::info!("still logging after a second init");
    }
}
