// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod config;
pub mod logging;
pub mod util;

pub use config::{ConfigError, ConfigFile};
pub use logging::{init_logging, init_logging_filter, level_from_debug};
pub use util::{normalize_name, parse_number};
