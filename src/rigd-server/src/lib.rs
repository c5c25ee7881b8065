// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

pub mod config;
pub mod daemon;
pub mod handle;

pub use config::ServerConfig;
pub use daemon::{DaemonConfig, DaemonLoop};
pub use handle::RigHandle;
