// Melvin - emergent associative graph engine.
// Copyright (C) 2024-2025 Melvin Engine Team
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Structured logging helpers, consistent across the engine.

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Initialize logging with a custom filter (e.g. "info", "debug").
pub fn init_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(filter.parse().unwrap_or(tracing::Level::INFO.into())),
        )
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Initialize compact production logging, better suited to log aggregation.
pub fn init_production_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .compact()
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

/// Log a `process_input` call's outcome.
pub fn log_process_input(port_id: u8, input_len: usize, output_len: usize, readiness: f32) {
    info!(
        port_id,
        input_len,
        output_len,
        readiness,
        "process_input complete"
    );
}

/// Log resource usage against an optional ceiling (brain file size, etc).
pub fn log_resource_usage(resource: &str, current: usize, max: Option<usize>) {
    match max {
        Some(max_val) => {
            let percent = (current as f64 / max_val as f64) * 100.0;
            info!(resource, current, max = max_val, percent = format!("{:.1}%", percent), "resource usage");
        }
        None => info!(resource, current, "resource usage (unbounded)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_helpers_do_not_panic() {
        log_process_input(1, 10, 0, 0.0);
        log_resource_usage("brain_file_bytes", 10, Some(100));
        log_resource_usage("brain_file_bytes", 10, None);
    }
}
