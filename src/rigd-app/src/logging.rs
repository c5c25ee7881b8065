// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::FmtSubscriber;

/// Map a hamlib debug level (NONE, BUG, ERR, WARN, VERBOSE, TRACE) onto a
/// tracing filter. Out of range levels fall back to WARN.
pub fn level_from_debug(level: u8) -> LevelFilter {
    match level {
        0 => LevelFilter::OFF,
        1 | 2 => LevelFilter::ERROR,
        3 => LevelFilter::WARN,
        4 => LevelFilter::DEBUG,
        5 => LevelFilter::TRACE,
        _ => LevelFilter::WARN,
    }
}

/// Initialize logging with optional level from config.
/// Falls back to INFO if level is None or invalid.
pub fn init_logging(log_level: Option<&str>) {
    let filter = log_level
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO);
    init_logging_filter(filter);
}

pub fn init_logging_filter(filter: LevelFilter) {
    FmtSubscriber::builder()
        .with_target(false)
        .with_max_level(filter)
        .init();
}
