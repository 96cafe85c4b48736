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

//! # Architecture
//!
//! [`Engine`] wires the pipeline a single `process_input` call runs:
//! ingest (§ [`crate::ingest`]) produces an activation set, the four
//! creation laws (§ [`crate::edge_formation`]) run over it, a wave
//! (§ [`crate::wave`]) propagates from it unioned with the previous
//! call's residual activation, and finally the output stage
//! (§ [`crate::output`]) decides whether anything is ready to emit.
//!
//! A port driver is expected to decode its own wire frame (see
//! [`crate::frame::PortFrame`]) down to a `[port_id][data]` pair before
//! calling `process_input` — the full CAN-style frame with its timestamp
//! and size fields is a port-manager-to-port concern, not something the
//! engine's own pattern matching needs to see byte-for-byte.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::brainfile;
use crate::config::EngineConfig;
use crate::edge_formation;
use crate::error::{EngineError, EngineResult};
use crate::graph::Graph;
use crate::ingest;
use crate::logging;
use crate::metrics;
use crate::output;
use crate::rng::seed_for;
use crate::wave;

/// Outcome of a single `process_input` call.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub output: Vec<u8>,
    pub last_input_port_id: u8,
}

pub struct Engine {
    pub graph: Graph,
    config: EngineConfig,
    input_buffer: Vec<u8>,
    output_buffer: Vec<u8>,
    last_input_port_id: u8,
    dirty: bool,
    adaptation_count: u64,
    calls_since_save: u64,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let graph = Graph::with_capacity(config.initial_node_capacity, config.initial_edge_capacity);
        Self {
            graph,
            config,
            input_buffer: Vec::with_capacity(1),
            output_buffer: Vec::with_capacity(1),
            last_input_port_id: 0,
            dirty: false,
            adaptation_count: 0,
            calls_since_save: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn adaptation_count(&self) -> u64 {
        self.adaptation_count
    }

    /// Write bytes into the universal input buffer without processing
    /// them yet.
    pub fn universal_input_write(&mut self, bytes: &[u8]) {
        self.input_buffer = bytes.to_vec();
    }

    /// Read the universal output buffer left by the last `process_input`.
    pub fn universal_output_read(&self) -> &[u8] {
        &self.output_buffer
    }

    /// Process whatever is currently in the universal input buffer.
    pub fn process_buffered_input(&mut self) -> EngineResult<ProcessOutcome> {
        let input = std::mem::take(&mut self.input_buffer);
        let result = self.process_input(&input);
        self.input_buffer = input;
        result
    }

    /// Ingest `input_buffer` (`[port_id][payload...]`), form edges, run a
    /// wave, and decide whether to emit output. The first byte is always
    /// read as the routing port-id and, per the byte-stream model, also
    /// remains part of what gets pattern-matched.
    pub fn process_input(&mut self, input_buffer: &[u8]) -> EngineResult<ProcessOutcome> {
        let start = Instant::now();

        if input_buffer.is_empty() {
            self.output_buffer.clear();
            return Err(EngineError::MalformedFrame(
                "input buffer must contain at least a port-id byte".into(),
            ));
        }

        self.input_buffer = input_buffer.to_vec();
        self.last_input_port_id = input_buffer[0];

        let context_seed = self.graph.last_activated().to_vec();
        let initial_set = ingest::sequential_ingest(&mut self.graph, input_buffer);

        edge_formation::apply_initial_laws(&mut self.graph, &initial_set);

        let mut seed_front = Vec::with_capacity(initial_set.len() + context_seed.len());
        let mut seen = std::collections::HashSet::new();
        for &n in initial_set.iter().chain(context_seed.iter()) {
            if seen.insert(n) {
                seed_front.push(n);
            }
        }

        let wave_result = wave::propagate(&mut self.graph, &seed_front);
        self.graph.set_last_activated(wave_result.all_fronted);

        let seed = seed_for(self.graph.node_count() as u64, input_buffer);
        let mut rng = StdRng::seed_from_u64(seed);
        let (out, readiness) = output::collect_output(&mut self.graph, &initial_set, &mut rng);

        self.output_buffer = out.clone();
        self.dirty = true;
        self.adaptation_count += 1;
        self.calls_since_save += 1;

        metrics::PROCESS_INPUT_DURATION.observe(start.elapsed().as_secs_f64());
        if !out.is_empty() {
            metrics::OUTPUTS_EMITTED.inc();
        }
        metrics::NODES_ACTIVE.set(self.graph.node_count() as i64);
        metrics::EDGES_ACTIVE.set(self.graph.edge_count() as i64);

        logging::log_process_input(self.last_input_port_id, input_buffer.len(), out.len(), readiness);

        self.maybe_autosave()?;

        Ok(ProcessOutcome {
            output: out,
            last_input_port_id: self.last_input_port_id,
        })
    }

    fn maybe_autosave(&mut self) -> EngineResult<()> {
        if !self.dirty {
            return Ok(());
        }
        let Some(interval) = self.config.autosave_interval else {
            return Ok(());
        };
        if self.calls_since_save > interval {
            if let Some(path) = self.config.brain_file_path.clone() {
                self.save_to_path(path)?;
            }
        }
        Ok(())
    }

    pub fn save_to_path(&mut self, path: impl AsRef<Path>) -> EngineResult<()> {
        let file = std::fs::File::create(path.as_ref())?;
        let mut writer = std::io::BufWriter::new(file);
        brainfile::save(
            &self.graph,
            &self.input_buffer,
            &self.output_buffer,
            self.adaptation_count,
            &mut writer,
        )?;
        use std::io::Write;
        writer.flush()?;
        self.dirty = false;
        self.calls_since_save = 0;
        metrics::BRAIN_FILE_SAVES.inc();

        if let Ok(meta) = std::fs::metadata(path.as_ref()) {
            logging::log_resource_usage("brain_file_bytes", meta.len() as usize, None);
        }

        Ok(())
    }

    pub fn open_from_path(path: impl AsRef<Path>, config: EngineConfig) -> EngineResult<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let mut reader = std::io::BufReader::new(file);
        let loaded = brainfile::open(&mut reader)?;
        metrics::BRAIN_FILE_OPENS.inc();
        Ok(Self {
            graph: loaded.graph,
            config,
            input_buffer: loaded.input_buf,
            output_buffer: loaded.output_buf,
            last_input_port_id: 0,
            dirty: false,
            adaptation_count: loaded.adaptation_count,
            calls_since_save: 0,
        })
    }
}

/// Thread-safe wrapper a host process may use to share one engine across
/// several port drivers, matching the way the teacher's storage layer
/// wraps long-lived shared state behind a single lock.
pub struct SharedEngine(parking_lot::Mutex<Engine>);

impl SharedEngine {
    pub fn new(engine: Engine) -> Self {
        Self(parking_lot::Mutex::new(engine))
    }

    pub fn process_input(&self, input_buffer: &[u8]) -> EngineResult<ProcessOutcome> {
        self.0.lock().process_input(input_buffer)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> EngineResult<()> {
        self.0.lock().save_to_path(path)
    }

    pub fn node_count(&self) -> usize {
        self.0.lock().graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.0.lock().graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_with_path(path: PathBuf) -> EngineConfig {
        EngineConfig {
            initial_node_capacity: 1,
            initial_edge_capacity: 1,
            brain_file_path: Some(path),
            autosave_interval: None,
        }
    }

    #[test]
    fn empty_input_is_rejected_without_mutating_the_graph() {
        let mut engine = Engine::new(EngineConfig::default());
        let before = engine.graph.node_count();
        let err = engine.process_input(&[]).unwrap_err();
        assert!(matches!(err, EngineError::MalformedFrame(_)));
        assert_eq!(engine.graph.node_count(), before);
    }

    #[test]
    fn single_byte_input_creates_exactly_one_node() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.process_input(&[1]).unwrap();
        assert_eq!(engine.graph.node_count(), 1);
    }

    #[test]
    fn repeated_input_does_not_keep_creating_new_nodes_forever() {
        let mut engine = Engine::new(EngineConfig::default());
        engine.process_input(&[1, b'h', b'e', b'l', b'l', b'o']).unwrap();
        let after_first = engine.graph.node_count();
        for _ in 0..4 {
            engine.process_input(&[1, b'h', b'e', b'l', b'l', b'o']).unwrap();
        }
        // New hierarchy/blank nodes may still appear, but it must not
        // grow by a fresh byte-node every single call.
        assert!(engine.graph.node_count() >= after_first);
        assert!(engine.graph.node_count() < after_first + 6 * 4);
    }

    #[test]
    fn determinism_same_brain_same_input_same_output() {
        let mut a = Engine::new(EngineConfig::default());
        let mut b = Engine::new(EngineConfig::default());
        for _ in 0..3 {
            a.process_input(&[1, b'h', b'e', b'l', b'l', b'o']).unwrap();
            b.process_input(&[1, b'h', b'e', b'l', b'l', b'o']).unwrap();
        }
        let out_a = a.process_input(&[1, b'h', b'e', b'l', b'l', b'o']).unwrap();
        let out_b = b.process_input(&[1, b'h', b'e', b'l', b'l', b'o']).unwrap();
        assert_eq!(out_a.output, out_b.output);
    }

    #[test]
    fn save_and_open_round_trip_preserves_node_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("brain.melvin");
        let mut engine = Engine::new(config_with_path(path.clone()));
        engine.process_input(&[1, b'h', b'e', b'l', b'l', b'o']).unwrap();
        let node_count = engine.graph.node_count();
        engine.save_to_path(&path).unwrap();

        let reopened = Engine::open_from_path(&path, config_with_path(path.clone())).unwrap();
        assert_eq!(reopened.graph.node_count(), node_count);
    }

    #[test]
    fn autosave_zero_saves_after_every_dirty_call() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("brain.melvin");
        let mut config = config_with_path(path.clone());
        config.autosave_interval = Some(0);
        let mut engine = Engine::new(config);
        engine.process_input(&[1, b'x']).unwrap();
        assert!(path.exists());
    }
}
