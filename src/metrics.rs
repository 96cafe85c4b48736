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

//! Prometheus metrics export for the engine's own operation counts.
//!
//! This is instrumentation of the engine, not the "statistics analysis"
//! collaborator the spec keeps out of scope — it counts nodes, edges and
//! calls, it does not interpret graph structure for a human.

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_gauge, Encoder, Histogram, IntCounter,
    IntGauge, TextEncoder,
};

lazy_static! {
    pub static ref NODES_CREATED: IntCounter = register_int_counter!(
        "melvin_nodes_created_total",
        "Total number of nodes created"
    )
    .unwrap();

    pub static ref EDGES_CREATED: IntCounter = register_int_counter!(
        "melvin_edges_created_total",
        "Total number of edges created"
    )
    .unwrap();

    pub static ref HIERARCHY_NODES_CREATED: IntCounter = register_int_counter!(
        "melvin_hierarchy_nodes_created_total",
        "Total number of emergent hierarchy nodes created"
    )
    .unwrap();

    pub static ref BLANK_NODES_CREATED: IntCounter = register_int_counter!(
        "melvin_blank_nodes_created_total",
        "Total number of blank nodes created"
    )
    .unwrap();

    pub static ref WAVE_STEPS_RUN: IntCounter = register_int_counter!(
        "melvin_wave_steps_total",
        "Total number of wave propagation steps run"
    )
    .unwrap();

    pub static ref OUTPUTS_EMITTED: IntCounter = register_int_counter!(
        "melvin_outputs_emitted_total",
        "Total number of process_input calls that emitted non-empty output"
    )
    .unwrap();

    pub static ref BRAIN_FILE_SAVES: IntCounter = register_int_counter!(
        "melvin_brain_file_saves_total",
        "Total number of brain file saves"
    )
    .unwrap();

    pub static ref BRAIN_FILE_OPENS: IntCounter = register_int_counter!(
        "melvin_brain_file_opens_total",
        "Total number of brain file opens"
    )
    .unwrap();

    pub static ref NODES_ACTIVE: IntGauge = register_int_gauge!(
        "melvin_nodes_active",
        "Current number of nodes in the graph"
    )
    .unwrap();

    pub static ref EDGES_ACTIVE: IntGauge = register_int_gauge!(
        "melvin_edges_active",
        "Current number of edges in the graph"
    )
    .unwrap();

    pub static ref PROCESS_INPUT_DURATION: Histogram = register_histogram!(
        "melvin_process_input_duration_seconds",
        "Time taken by a single process_input call",
        vec![0.000001, 0.00001, 0.0001, 0.001, 0.01, 0.1, 1.0]
    )
    .unwrap();
}

/// Export all metrics in Prometheus text format.
pub fn export_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("failed to encode metrics: {e}"))?;
    String::from_utf8(buffer).map_err(|e| format!("metrics are not valid utf-8: {e}"))
}

/// Force lazy_static initialization so `/metrics` always has these series.
pub fn init() {
    let _ = &*NODES_CREATED;
    let _ = &*EDGES_CREATED;
    let _ = &*NODES_ACTIVE;
    let _ = &*EDGES_ACTIVE;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_increment() {
        let before = NODES_CREATED.get();
        NODES_CREATED.inc();
        assert_eq!(NODES_CREATED.get(), before + 1);
    }

    #[test]
    fn export_contains_known_series() {
        init();
        NODES_CREATED.inc();
        let text = export_metrics().unwrap();
        assert!(text.contains("melvin_nodes_created_total"));
    }
}
