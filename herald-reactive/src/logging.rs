/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Tracing setup for hosts that do not install their own subscriber.

use herald_core::prelude::HeraldConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Installs a global fmt subscriber configured from `config`.
///
/// The filter comes from `RUST_LOG` when set, otherwise from
/// `config.tracing.level`. With file logging enabled, output goes to a daily
/// rolling file in the configured log directory and the returned guard must be
/// kept alive to flush it. Returns `None` when tracing is disabled, when file
/// logging is off, or when a subscriber was already installed.
#[must_use]
pub fn init_tracing(config: &HeraldConfig) -> Option<WorkerGuard> {
    if !config.behavior.enable_tracing {
        return None;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.tracing.level));

    let builder = tracing_subscriber::fmt()
        .with_span_events(FmtSpan::NONE)
        .with_target(true)
        .with_line_number(true)
        .compact()
        .with_env_filter(filter);

    if config.behavior.enable_file_logging {
        let directory = config.paths.log_directory();
        if let Err(e) = std::fs::create_dir_all(&directory) {
            eprintln!("could not create log directory {}: {e}", directory.display());
            return None;
        }
        let appender =
            RollingFileAppender::new(Rotation::DAILY, directory, &config.tracing.log_file_name);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        builder.with_ansi(false).with_writer(writer).try_init().ok().map(|()| guard)
    } else {
        let _ = builder.with_writer(std::io::stderr).try_init();
        None
    }
}
